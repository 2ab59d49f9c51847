//! Device fixtures for populating a simulation
//!
//! Fixtures describe a set of attached devices in JSON so test suites can
//! share hardware layouts:
//!
//! ```json
//! { "devices": [ { "id": 10, "uid": "BuiltInSpeakerDevice", "name": "MacBook Speakers" } ] }
//! ```

use std::path::Path;

use hal_protocol::AudioObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading a fixture
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture file could not be read
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),

    /// The fixture is not valid JSON or has the wrong shape
    #[error("invalid fixture: {0}")]
    Json(#[from] serde_json::Error),
}

/// One device in a fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFixture {
    /// Object id of the device
    pub id: AudioObjectId,
    /// Output buffers in the stream configuration
    #[serde(default = "default_buffer_count")]
    pub buffer_count: u32,
    /// Channels per output buffer; 0 makes an input-only device
    #[serde(default = "default_channels_per_buffer")]
    pub channels_per_buffer: u32,
    /// Persistent unique identifier
    pub uid: String,
    /// Display name
    pub name: String,
}

fn default_buffer_count() -> u32 {
    1
}

fn default_channels_per_buffer() -> u32 {
    2
}

/// A set of devices attached in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareFixture {
    #[serde(default)]
    pub devices: Vec<DeviceFixture>,
}

impl HardwareFixture {
    /// Parse a fixture from JSON text
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a fixture file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, FixtureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
