//! Output device watcher
//!
//! [`DeviceWatcher`] listens to the system device list, keeps track of which
//! online devices have outputs and reports arrivals and departures of output
//! devices to an [`AudioDeviceObserver`]. It can also make any known output
//! device the default for both regular and system sounds.
//!
//! Scans run on the task queue given at activation, never on the caller's
//! thread. Devices without outputs are remembered so they are not queried
//! again, but never reported.

use std::fmt;
use std::sync::{Arc, Weak};

use hal_protocol::{
    AudioObjectId, CfString, PropertyAddress, PropertyDirectory, PropertyListener,
    PropertySelector, QueueHandle,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::WatchError;

const SYSTEM: AudioObjectId = AudioObjectId::SYSTEM_OBJECT;

/// Information about an output device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioDeviceInfo {
    /// Persistent unique identifier
    pub uid: String,
    /// Display name
    pub name: String,
}

impl AudioDeviceInfo {
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for AudioDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Receives output device arrivals and departures
///
/// Callbacks run on the watcher's task queue. Devices already online at
/// activation are reported through `device_added` by the first scan.
pub trait AudioDeviceObserver: Send + Sync {
    /// An output device came online
    fn device_added(&self, info: &AudioDeviceInfo);

    /// An output device went away
    fn device_removed(&self, info: &AudioDeviceInfo);
}

#[derive(Debug)]
enum DeviceEvent {
    Added(AudioDeviceInfo),
    Removed(AudioDeviceInfo),
}

/// Devices seen by the last successful scan, in discovery order
///
/// `None` marks a device without outputs.
#[derive(Debug, Default)]
struct OnlineDevices {
    devices: Vec<(AudioObjectId, Option<AudioDeviceInfo>)>,
}

impl OnlineDevices {
    fn contains(&self, id: AudioObjectId) -> bool {
        self.devices.iter().any(|(known, _)| *known == id)
    }

    fn id_for_uid(&self, uid: &str) -> Option<AudioObjectId> {
        self.devices.iter().find_map(|(id, info)| match info {
            Some(info) if info.uid == uid => Some(*id),
            _ => None,
        })
    }

    fn outputs(&self) -> Vec<AudioDeviceInfo> {
        self.devices
            .iter()
            .filter_map(|(_, info)| info.clone())
            .collect()
    }
}

struct WatcherShared {
    directory: Arc<dyn PropertyDirectory>,
    observer: Mutex<Option<Arc<dyn AudioDeviceObserver>>>,
    online: Mutex<OnlineDevices>,
}

impl WatcherShared {
    /// Rescan the device list and report the differences
    fn handle_devices_changed(&self) {
        let events = {
            let mut online = self.online.lock();
            match self.scan(&online) {
                Ok((next, events)) => {
                    *online = next;
                    events
                }
                Err(e) => {
                    warn!("Failed to scan audio devices: {}", e);
                    return;
                }
            }
        };

        for event in events {
            // Re-checked per event so a deactivation mid-delivery takes effect
            let Some(observer) = self.observer.lock().clone() else {
                debug!("Watcher deactivated, dropping {:?}", event);
                return;
            };
            match event {
                DeviceEvent::Added(info) => {
                    info!("Output device added: {} ({})", info, info.uid);
                    observer.device_added(&info);
                }
                DeviceEvent::Removed(info) => {
                    info!("Output device removed: {} ({})", info, info.uid);
                    observer.device_removed(&info);
                }
            }
        }
    }

    /// Diff the directory against `previous` without touching it
    fn scan(
        &self,
        previous: &OnlineDevices,
    ) -> Result<(OnlineDevices, Vec<DeviceEvent>), WatchError> {
        let ids = self.device_ids()?;
        let mut next = OnlineDevices::default();
        let mut events = Vec::new();

        for (id, info) in &previous.devices {
            if ids.contains(id) {
                next.devices.push((*id, info.clone()));
            } else if let Some(info) = info {
                events.push(DeviceEvent::Removed(info.clone()));
            }
        }

        for id in ids {
            if next.contains(id) {
                continue;
            }
            let info = self.device_info(id)?;
            match &info {
                Some(info) => events.push(DeviceEvent::Added(info.clone())),
                None => debug!("Device {} has no outputs", id),
            }
            next.devices.push((id, info));
        }

        Ok((next, events))
    }

    fn device_ids(&self) -> Result<Vec<AudioObjectId>, WatchError> {
        let address = PropertyAddress::DEVICES;
        let mut size = self
            .directory
            .get_property_data_size(SYSTEM, &address, None)?;
        self.directory
            .get_property_data(SYSTEM, &address, None, &mut size)?
            .into_object_ids()
            .ok_or(WatchError::UnexpectedValue(address.selector))
    }

    /// `None` for devices without output channels
    fn device_info(&self, id: AudioObjectId) -> Result<Option<AudioDeviceInfo>, WatchError> {
        if self.output_channels(id)? == 0 {
            return Ok(None);
        }
        Ok(Some(AudioDeviceInfo {
            uid: self.string_property(id, PropertySelector::DeviceUid)?,
            name: self.string_property(id, PropertySelector::DeviceName)?,
        }))
    }

    fn output_channels(&self, id: AudioObjectId) -> Result<u32, WatchError> {
        let address = PropertyAddress::output(PropertySelector::StreamConfiguration);
        let mut size = self.directory.get_property_data_size(id, &address, None)?;
        let config = self
            .directory
            .get_property_data(id, &address, None, &mut size)?
            .into_buffer_list()
            .ok_or(WatchError::UnexpectedValue(address.selector))?;
        Ok(config.total_channels())
    }

    fn string_property(
        &self,
        id: AudioObjectId,
        selector: PropertySelector,
    ) -> Result<String, WatchError> {
        let address = PropertyAddress::output(selector);
        let mut size = CfString::BYTE_SIZE;
        self.directory
            .get_property_data(id, &address, None, &mut size)?
            .into_string()
            .map(String::from)
            .ok_or(WatchError::UnexpectedValue(selector))
    }
}

/// Run a scan if the watcher is still alive
fn rescan(shared: &Weak<WatcherShared>) {
    if let Some(shared) = shared.upgrade() {
        shared.handle_devices_changed();
    }
}

/// Watches online output devices and switches the default output
///
/// Dropping the watcher deactivates it.
pub struct DeviceWatcher {
    shared: Arc<WatcherShared>,
    queue: QueueHandle,
    listener: PropertyListener,
}

impl DeviceWatcher {
    /// Start watching `directory`
    ///
    /// Installs a device-list listener delivered on `queue` and schedules an
    /// initial scan on the same queue, which reports every output device
    /// already online.
    pub fn activate(
        directory: Arc<dyn PropertyDirectory>,
        observer: Arc<dyn AudioDeviceObserver>,
        queue: QueueHandle,
    ) -> Result<Self, WatchError> {
        let shared = Arc::new(WatcherShared {
            directory,
            observer: Mutex::new(Some(observer)),
            online: Mutex::new(OnlineDevices::default()),
        });

        // The directory keeps the listener alive, so it only holds a weak
        // reference back to the watcher.
        let weak = Arc::downgrade(&shared);
        let listener: PropertyListener =
            Arc::new(move |_: u32, _: &PropertyAddress| rescan(&weak));

        shared.directory.add_property_listener(
            SYSTEM,
            &PropertyAddress::DEVICES,
            Some(queue.clone()),
            listener.clone(),
        )?;
        info!("Watching audio devices on {:?}", queue);

        let weak = Arc::downgrade(&shared);
        queue.submit(Box::new(move || rescan(&weak)));

        Ok(Self {
            shared,
            queue,
            listener,
        })
    }

    /// Make the output device with `uid` the default output
    ///
    /// Sets both the default output device and the default system output
    /// device. Returns `Ok(false)` without touching the directory if no
    /// known output device has that UID.
    pub fn switch_to(&self, uid: &str) -> Result<bool, WatchError> {
        let Some(id) = self.shared.online.lock().id_for_uid(uid) else {
            debug!("No output device with UID {}", uid);
            return Ok(false);
        };

        let data = id.as_u32().to_ne_bytes();
        for selector in [
            PropertySelector::DefaultOutputDevice,
            PropertySelector::DefaultSystemOutputDevice,
        ] {
            self.shared.directory.set_property_data(
                SYSTEM,
                &PropertyAddress::global(selector),
                None,
                &data,
            )?;
        }

        info!("Switched default output to {} (device {})", uid, id);
        Ok(true)
    }

    /// Output devices found by the last scan, in discovery order
    pub fn known_outputs(&self) -> Vec<AudioDeviceInfo> {
        self.shared.online.lock().outputs()
    }

    /// Whether the observer is still attached
    pub fn is_active(&self) -> bool {
        self.shared.observer.lock().is_some()
    }

    /// Stop watching
    ///
    /// Detaches the observer, so no further callbacks are made even by scans
    /// already scheduled, and removes the listener. Calling it again does
    /// nothing.
    pub fn deactivate(&self) -> Result<(), WatchError> {
        if self.shared.observer.lock().take().is_none() {
            return Ok(());
        }

        self.shared.directory.remove_property_listener(
            SYSTEM,
            &PropertyAddress::DEVICES,
            Some(self.queue.clone()),
            self.listener.clone(),
        )?;
        info!("Stopped watching audio devices");
        Ok(())
    }
}

impl fmt::Debug for DeviceWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceWatcher")
            .field("queue", &self.queue)
            .field("active", &self.is_active())
            .field("outputs", &self.known_outputs())
            .finish_non_exhaustive()
    }
}

impl Drop for DeviceWatcher {
    fn drop(&mut self) {
        if let Err(e) = self.deactivate() {
            warn!("Failed to deactivate device watcher: {}", e);
        }
    }
}
