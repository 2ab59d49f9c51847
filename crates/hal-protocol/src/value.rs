//! Property values returned by the directory
//!
//! Sizes reported for each value follow the platform's C struct layout on a
//! 64-bit target, so callers negotiating buffer sizes see the same numbers
//! they would against the real service.

use std::fmt;
use std::sync::Arc;

use crate::address::AudioObjectId;

/// One buffer entry of a stream configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    /// Interleaved channels carried by this buffer
    pub number_channels: u32,
    /// Size of the data region in bytes
    pub data_byte_size: u32,
    /// Sample data; never materialized by the directory
    pub data: Option<Vec<u8>>,
}

impl AudioBuffer {
    /// Size of one entry: channels (4) + byte size (4) + data pointer (8)
    pub const BYTE_SIZE: u32 = 16;
}

/// Variable-length buffer list describing a stream configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioBufferList {
    pub buffers: Vec<AudioBuffer>,
}

impl AudioBufferList {
    /// Size of the list header: buffer count (4) padded to pointer alignment
    pub const HEADER_SIZE: u32 = 8;

    /// Largest entry count whose byte size fits in a `u32`
    pub const MAX_BUFFERS: u32 = (u32::MAX - Self::HEADER_SIZE) / AudioBuffer::BYTE_SIZE;

    /// Byte size of a list holding `buffer_count` entries
    ///
    /// `None` when the size does not fit the 32-bit size field.
    pub fn byte_size_for(buffer_count: u32) -> Option<u32> {
        AudioBuffer::BYTE_SIZE
            .checked_mul(buffer_count)?
            .checked_add(Self::HEADER_SIZE)
    }

    /// Number of buffers in the list
    pub fn number_buffers(&self) -> u32 {
        u32::try_from(self.buffers.len()).unwrap_or(u32::MAX)
    }

    /// Total channel count across all buffers, saturating at `u32::MAX`
    pub fn total_channels(&self) -> u32 {
        self.buffers
            .iter()
            .fold(0u32, |total, b| total.saturating_add(b.number_channels))
    }

    /// Byte size of this list
    pub fn byte_size(&self) -> Option<u32> {
        u32::try_from(self.buffers.len())
            .ok()
            .and_then(Self::byte_size_for)
    }
}

/// Immutable string handle handed out by the directory
///
/// The caller owns the handle once returned; cloning shares the same storage.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CfString(Arc<str>);

impl CfString {
    /// Size of a string handle in a property payload (one pointer)
    pub const BYTE_SIZE: u32 = 8;

    /// Create a handle holding `s`
    pub fn new(s: &str) -> Self {
        CfString(Arc::from(s))
    }

    /// Borrow the string contents
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for CfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CfString> for String {
    fn from(s: CfString) -> Self {
        s.0.to_string()
    }
}

/// A value produced by a property read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyData {
    /// A single object id (default device selectors)
    ObjectId(AudioObjectId),
    /// An ordered list of object ids (device list)
    ObjectIds(Vec<AudioObjectId>),
    /// A stream configuration
    BufferList(AudioBufferList),
    /// A string handle (UID, name)
    String(CfString),
}

impl PropertyData {
    /// Number of bytes this value occupies in a caller buffer
    ///
    /// `None` when the size does not fit the 32-bit size field.
    pub fn byte_size(&self) -> Option<u32> {
        match self {
            PropertyData::ObjectId(_) => Some(AudioObjectId::BYTE_SIZE),
            PropertyData::ObjectIds(ids) => u32::try_from(ids.len())
                .ok()
                .and_then(|count| AudioObjectId::BYTE_SIZE.checked_mul(count)),
            PropertyData::BufferList(list) => list.byte_size(),
            PropertyData::String(_) => Some(CfString::BYTE_SIZE),
        }
    }

    /// Get the id if this is an `ObjectId` value
    pub fn as_object_id(&self) -> Option<AudioObjectId> {
        match self {
            PropertyData::ObjectId(id) => Some(*id),
            _ => None,
        }
    }

    /// Consume into an id list if this is an `ObjectIds` value
    pub fn into_object_ids(self) -> Option<Vec<AudioObjectId>> {
        match self {
            PropertyData::ObjectIds(ids) => Some(ids),
            _ => None,
        }
    }

    /// Consume into a buffer list if this is a `BufferList` value
    pub fn into_buffer_list(self) -> Option<AudioBufferList> {
        match self {
            PropertyData::BufferList(list) => Some(list),
            _ => None,
        }
    }

    /// Consume into a string handle if this is a `String` value
    pub fn into_string(self) -> Option<CfString> {
        match self {
            PropertyData::String(s) => Some(s),
            _ => None,
        }
    }
}
