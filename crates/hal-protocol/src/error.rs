//! Status codes and error types for property-directory requests

use thiserror::Error;

use crate::address::{fourcc, AudioObjectId, PropertyAddress};

/// Status code returned to callers of the property directory
///
/// Values match the platform's four-character status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HalStatus {
    /// No error
    Ok,
    /// Unsupported request, undersized buffer, or listener state conflict (`'nope'`)
    IllegalOperation,
    /// Request against an object id that is not a live device (`'!dev'`)
    BadDevice,
}

impl HalStatus {
    /// Get the raw status code
    pub fn code(&self) -> i32 {
        match self {
            HalStatus::Ok => 0,
            HalStatus::IllegalOperation => fourcc(b"nope") as i32,
            HalStatus::BadDevice => fourcc(b"!dev") as i32,
        }
    }

    /// Collapse a request result into its status code
    pub fn from_result<T>(result: &Result<T, HalError>) -> Self {
        match result {
            Ok(_) => HalStatus::Ok,
            Err(e) => e.status(),
        }
    }
}

/// Errors returned by property-directory requests
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HalError {
    /// The request targets an object the operation does not support
    #[error("{operation}: object {object} is not supported")]
    UnsupportedObject {
        operation: &'static str,
        object: AudioObjectId,
    },

    /// The selector/scope/element triple is not supported for this object
    #[error("{operation}: unsupported {field} in address {address}")]
    UnsupportedAddress {
        operation: &'static str,
        /// Which part of the address was rejected
        field: &'static str,
        address: PropertyAddress,
    },

    /// A qualifier was passed where none is accepted
    #[error("{operation}: qualifier data is not supported")]
    QualifierNotSupported { operation: &'static str },

    /// Input payload has the wrong size
    #[error("{operation}: expected {expected} bytes of data, got {actual}")]
    InvalidDataSize {
        operation: &'static str,
        expected: u32,
        actual: u32,
    },

    /// Caller-provided output capacity is smaller than the value
    #[error("output buffer too small: need {required} bytes, have {provided}")]
    BufferTooSmall { required: u32, provided: u32 },

    /// The value's byte size does not fit the 32-bit size field
    #[error("{operation}: value size exceeds the 32-bit size range")]
    SizeOverflow { operation: &'static str },

    /// The object id is not a live device
    #[error("unknown device object {0}")]
    BadDevice(AudioObjectId),

    /// A listener is already installed
    #[error("only one property listener is supported")]
    ListenerAlreadyRegistered,

    /// No listener is installed
    #[error("no property listener is registered")]
    NoListenerRegistered,

    /// Listener registration without a task queue
    #[error("a task queue is required to register a listener")]
    MissingQueue,

    /// Listener removal with a queue other than the one registered
    #[error("task queue does not match the registered listener")]
    QueueMismatch,

    /// Listener removal with an address other than the one registered
    #[error("address {0} does not match the registered listener")]
    AddressMismatch(PropertyAddress),
}

impl HalError {
    /// Status code reported for this error
    pub fn status(&self) -> HalStatus {
        match self {
            HalError::BadDevice(_) => HalStatus::BadDevice,
            _ => HalStatus::IllegalOperation,
        }
    }
}
