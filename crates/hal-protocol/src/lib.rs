//! Audio Hardware Property Directory Protocol
//!
//! This crate provides the shared vocabulary for talking to an audio hardware
//! property directory: the platform service that enumerates attached devices
//! and exposes their properties.
//!
//! - **Addresses**: object ids and (selector, scope, element) triples
//! - **Status codes**: `OK`, `ILLEGAL_OPERATION`, `BAD_DEVICE` and the
//!   [`HalError`] values that map to them
//! - **Values**: device lists, stream configurations, string handles, with the
//!   byte sizes the platform reports for them
//! - **Directory trait**: [`PropertyDirectory`], the five request kinds client
//!   code depends on, and the [`TaskQueue`] callbacks are delivered on
//!
//! # Example
//!
//! ```rust
//! use hal_protocol::{AudioBufferList, PropertyAddress, PropertySelector, PropertyScope};
//!
//! let address = PropertyAddress::output(PropertySelector::StreamConfiguration);
//! assert_eq!(address.scope, PropertyScope::Output);
//!
//! // Two stereo buffers: header plus two entries
//! assert_eq!(AudioBufferList::byte_size_for(2), Some(40));
//! ```

pub mod address;
pub mod directory;
pub mod error;
pub mod value;

pub use address::{
    fourcc, AudioObjectId, PropertyAddress, PropertyElement, PropertyScope, PropertySelector,
};
pub use directory::{PropertyDirectory, PropertyListener, QueueHandle, Task, TaskQueue};
pub use error::{HalError, HalStatus};
pub use value::{AudioBuffer, AudioBufferList, CfString, PropertyData};
