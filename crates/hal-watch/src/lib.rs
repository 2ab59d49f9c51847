//! Audio Output Device Watcher
//!
//! This crate tracks the output devices attached to an audio hardware
//! property directory and switches the system's default output between them.
//!
//! - **DeviceWatcher**: listens to the device list and reports output devices
//!   coming and going to an [`AudioDeviceObserver`]
//! - **Switching**: [`DeviceWatcher::switch_to`] makes a device the default
//!   for both regular and system sounds
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hal_sim::{ManualQueue, SimulatedHardware};
//! use hal_watch::{AudioDeviceInfo, AudioDeviceObserver, DeviceWatcher};
//!
//! struct PrintObserver;
//!
//! impl AudioDeviceObserver for PrintObserver {
//!     fn device_added(&self, info: &AudioDeviceInfo) {
//!         println!("+ {}", info);
//!     }
//!     fn device_removed(&self, info: &AudioDeviceInfo) {
//!         println!("- {}", info);
//!     }
//! }
//!
//! let hardware = SimulatedHardware::new();
//! hardware.add_device(10u32, 1, 2, "BuiltInSpeakerDevice", "Speakers");
//!
//! let queue = ManualQueue::new();
//! let watcher = DeviceWatcher::activate(
//!     Arc::new(hardware.clone()),
//!     Arc::new(PrintObserver),
//!     queue.handle(),
//! )
//! .unwrap();
//! queue.run_pending();
//!
//! assert!(watcher.switch_to("BuiltInSpeakerDevice").unwrap());
//! watcher.deactivate().unwrap();
//! ```

pub mod error;
pub mod watcher;

pub use error::WatchError;
pub use watcher::{AudioDeviceInfo, AudioDeviceObserver, DeviceWatcher};
