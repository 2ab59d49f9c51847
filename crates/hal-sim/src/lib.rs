//! Simulated Audio Hardware Library
//!
//! This crate provides an in-process stand-in for the platform's audio
//! hardware property directory, for testing device discovery and default
//! device switching without physical hardware. It includes:
//!
//! - **SimulatedHardware**: the directory itself, answering property requests
//!   exactly as the platform does and recording which calls were made
//! - **ManualQueue / TokioQueue**: task queues for listener delivery
//! - **HardwareFixture**: JSON-described device sets
//!
//! # Example
//!
//! ```rust
//! use hal_protocol::{AudioObjectId, PropertyAddress, PropertyData, PropertyDirectory};
//! use hal_sim::{ManualQueue, MockStatus, SimulatedHardware};
//! use std::sync::Arc;
//!
//! let hardware = SimulatedHardware::new();
//! hardware.add_device(10u32, 2, 2, "BuiltInSpeakerDevice", "Speakers");
//!
//! // Watch the device list
//! let queue = ManualQueue::new();
//! hardware
//!     .add_property_listener(
//!         AudioObjectId::SYSTEM_OBJECT,
//!         &PropertyAddress::DEVICES,
//!         Some(queue.handle()),
//!         Arc::new(|count: u32, address: &PropertyAddress| {
//!             println!("{} change(s) on {}", count, address);
//!         }),
//!     )
//!     .unwrap();
//!
//! hardware.add_device(11u32, 1, 2, "Headphones", "Headphones");
//! assert_eq!(queue.run_pending(), 1);
//!
//! let mut size = 64;
//! let devices = hardware
//!     .get_property_data(AudioObjectId::SYSTEM_OBJECT, &PropertyAddress::DEVICES, None, &mut size)
//!     .unwrap();
//! assert_eq!(devices, PropertyData::ObjectIds(vec![AudioObjectId(10), AudioObjectId(11)]));
//! assert_eq!(hardware.status(), MockStatus::ADD_LISTENER_CALLED);
//!
//! hardware.reset();
//! ```

pub mod fixture;
pub mod hardware;
pub mod listener;
pub mod queue;
pub mod registry;
pub mod status;

pub use fixture::{DeviceFixture, FixtureError, HardwareFixture};
pub use hardware::SimulatedHardware;
pub use listener::{ListenerRegistration, ListenerRegistry};
pub use queue::{ManualQueue, TokioQueue};
pub use registry::{DeviceRegistry, SimulatedDevice, STRING_CAPACITY};
pub use status::MockStatus;
