//! Simulated device registry
//!
//! Holds the attached devices in insertion order. Removal compacts the list.
//! Device ids are caller-assigned and not checked for uniqueness; with
//! duplicates, lookup and removal act on the first match.

use hal_protocol::{AudioBuffer, AudioBufferList, AudioObjectId};
use tracing::debug;

/// Capacity of the UID and name fields in bytes
///
/// The platform struct stores them in 32-byte C strings, one byte of which is
/// the terminator.
pub const STRING_CAPACITY: usize = 31;

/// Truncate `s` to [`STRING_CAPACITY`] bytes without splitting a character
pub fn truncate_field(s: &str) -> String {
    if s.len() <= STRING_CAPACITY {
        return s.to_string();
    }
    let mut end = STRING_CAPACITY;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// One simulated output device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedDevice {
    /// Object id of the device
    pub id: AudioObjectId,
    /// Number of output buffers in the stream configuration
    pub buffer_count: u32,
    /// Channels carried by each output buffer
    pub channels_per_buffer: u32,
    /// Persistent unique identifier string
    pub uid: String,
    /// Display name
    pub name: String,
}

impl SimulatedDevice {
    /// Create a device record, truncating `uid` and `name` to capacity
    pub fn new(
        id: AudioObjectId,
        buffer_count: u32,
        channels_per_buffer: u32,
        uid: &str,
        name: &str,
    ) -> Self {
        Self {
            id,
            buffer_count,
            channels_per_buffer,
            uid: truncate_field(uid),
            name: truncate_field(name),
        }
    }

    /// Stream configuration reported for the output scope
    ///
    /// Sample data is never materialized: every buffer has no data and a
    /// placeholder byte size of 1.
    pub fn stream_configuration(&self) -> AudioBufferList {
        AudioBufferList {
            buffers: (0..self.buffer_count)
                .map(|_| AudioBuffer {
                    number_channels: self.channels_per_buffer,
                    data_byte_size: 1,
                    data: None,
                })
                .collect(),
        }
    }

    /// Byte size of [`stream_configuration`](Self::stream_configuration)
    ///
    /// `None` when the layout is too large for the 32-bit size field.
    pub fn stream_configuration_size(&self) -> Option<u32> {
        AudioBufferList::byte_size_for(self.buffer_count)
    }

    /// Total output channels
    pub fn output_channels(&self) -> u32 {
        self.buffer_count.saturating_mul(self.channels_per_buffer)
    }
}

/// Ordered collection of live devices
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<SimulatedDevice>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a device
    pub fn add(&mut self, device: SimulatedDevice) {
        debug!(
            "Adding simulated device {} ({:?}, {} x {} channels)",
            device.id, device.uid, device.buffer_count, device.channels_per_buffer
        );
        self.devices.push(device);
    }

    /// Remove the device with `id`, returning it if it was present
    pub fn remove(&mut self, id: AudioObjectId) -> Option<SimulatedDevice> {
        let index = self.devices.iter().position(|d| d.id == id)?;
        let device = self.devices.remove(index);
        debug!("Removed simulated device {} ({:?})", device.id, device.uid);
        Some(device)
    }

    /// Look up a device by id
    pub fn find(&self, id: AudioObjectId) -> Option<&SimulatedDevice> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Ids of all live devices in registry order
    pub fn ids(&self) -> Vec<AudioObjectId> {
        self.devices.iter().map(|d| d.id).collect()
    }

    /// Byte size of the device-list value
    pub fn ids_byte_size(&self) -> Option<u32> {
        u32::try_from(self.devices.len())
            .ok()
            .and_then(|count| AudioObjectId::BYTE_SIZE.checked_mul(count))
    }

    /// Number of live devices
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if no devices are attached
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Drop every device
    pub fn clear(&mut self) {
        self.devices.clear();
    }
}
