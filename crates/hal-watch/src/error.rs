//! Error types for the device watcher

use hal_protocol::{HalError, PropertySelector};
use thiserror::Error;

/// Errors that can occur while watching devices
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WatchError {
    /// The property directory rejected a request
    #[error("audio hardware error: {0}")]
    Hal(#[from] HalError),

    /// The directory answered with a value of the wrong kind
    #[error("unexpected value for property {0}")]
    UnexpectedValue(PropertySelector),
}
