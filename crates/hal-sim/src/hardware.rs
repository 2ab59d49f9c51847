//! Simulated property directory
//!
//! [`SimulatedHardware`] owns the whole simulated audio subsystem: device
//! registry, default-device selectors, the listener slot and the mock status
//! flags. It answers the same five request kinds as the platform service
//! through [`PropertyDirectory`], and exposes control methods that test setup
//! uses to attach and detach devices.
//!
//! Requests run synchronously on the caller's thread. The only asynchronous
//! part is listener delivery, which is handed to the listener's task queue.
//! The state sits behind a mutex so the handle can be shared with queue
//! workers; callers are still expected to mutate from a single thread.

use std::sync::Arc;

use hal_protocol::{
    AudioObjectId, CfString, HalError, PropertyAddress, PropertyData, PropertyDirectory,
    PropertyElement, PropertyListener, PropertyScope, PropertySelector, QueueHandle,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::fixture::HardwareFixture;
use crate::listener::{ListenerRegistry, PendingNotification};
use crate::registry::{DeviceRegistry, SimulatedDevice};
use crate::status::MockStatus;

const ADD_LISTENER: &str = "add_property_listener";
const REMOVE_LISTENER: &str = "remove_property_listener";
const SET_DATA: &str = "set_property_data";
const GET_DATA_SIZE: &str = "get_property_data_size";
const GET_DATA: &str = "get_property_data";

#[derive(Debug)]
struct HardwareState {
    devices: DeviceRegistry,
    listener: ListenerRegistry,
    default_output: AudioObjectId,
    default_system_output: AudioObjectId,
    status: MockStatus,
}

impl Default for HardwareState {
    fn default() -> Self {
        Self {
            devices: DeviceRegistry::new(),
            listener: ListenerRegistry::new(),
            default_output: AudioObjectId::UNKNOWN,
            default_system_output: AudioObjectId::UNKNOWN,
            status: MockStatus::IDLE,
        }
    }
}

/// Handle to one simulated audio subsystem
///
/// Cloning yields another handle to the same state. Each test creates its own
/// instance, so independent simulations never interfere.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHardware {
    state: Arc<Mutex<HardwareState>>,
}

impl SimulatedHardware {
    /// Create an empty simulation: no devices, no listener, idle status
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a simulation populated from a fixture
    pub fn from_fixture(fixture: &HardwareFixture) -> Self {
        let hardware = Self::new();
        hardware.load_fixture(fixture);
        hardware
    }

    // -------------------------------------------------------------------------
    // Mock control surface
    // -------------------------------------------------------------------------

    /// Calls observed since the last reset
    pub fn status(&self) -> MockStatus {
        self.state.lock().status
    }

    /// Return to the initial state
    ///
    /// Drops the listener without a matching check, clears both default
    /// device selectors, detaches every device and clears the status flags.
    /// No notification is raised.
    pub fn reset(&self) {
        let released = {
            let mut state = self.state.lock();
            state.devices.clear();
            state.default_output = AudioObjectId::UNKNOWN;
            state.default_system_output = AudioObjectId::UNKNOWN;
            state.status = MockStatus::IDLE;
            state.listener.clear()
        };
        // Dropped unlocked: the callback may own handles to this directory
        drop(released);
        info!("Simulated audio hardware reset");
    }

    /// Attach a device and notify the listener
    ///
    /// `uid` and `name` are truncated to 31 bytes. Ids are not checked for
    /// uniqueness; attaching a duplicate id is a caller error.
    pub fn add_device(
        &self,
        id: impl Into<AudioObjectId>,
        buffer_count: u32,
        channels_per_buffer: u32,
        uid: &str,
        name: &str,
    ) {
        let device = SimulatedDevice::new(id.into(), buffer_count, channels_per_buffer, uid, name);
        let pending = {
            let mut state = self.state.lock();
            state.devices.add(device);
            state.listener.devices_changed()
        };
        Self::deliver(pending);
    }

    /// Detach a device and notify the listener; unknown ids are ignored
    pub fn remove_device(&self, id: impl Into<AudioObjectId>) {
        let id = id.into();
        let pending = {
            let mut state = self.state.lock();
            match state.devices.remove(id) {
                Some(_) => state.listener.devices_changed(),
                None => {
                    debug!("Ignoring removal of unknown device {}", id);
                    None
                }
            }
        };
        Self::deliver(pending);
    }

    /// Attach every device of a fixture in order
    pub fn load_fixture(&self, fixture: &HardwareFixture) {
        for device in &fixture.devices {
            self.add_device(
                device.id,
                device.buffer_count,
                device.channels_per_buffer,
                &device.uid,
                &device.name,
            );
        }
    }

    /// Current value of the default output device selector
    pub fn default_output_device(&self) -> AudioObjectId {
        self.state.lock().default_output
    }

    /// Current value of the default system output device selector
    pub fn default_system_output_device(&self) -> AudioObjectId {
        self.state.lock().default_system_output
    }

    /// Number of attached devices
    pub fn device_count(&self) -> usize {
        self.state.lock().devices.len()
    }

    /// Snapshot of an attached device
    pub fn device(&self, id: impl Into<AudioObjectId>) -> Option<SimulatedDevice> {
        self.state.lock().devices.find(id.into()).cloned()
    }

    /// Whether a listener is installed
    pub fn has_listener(&self) -> bool {
        self.state.lock().listener.is_active()
    }

    fn deliver(pending: Option<PendingNotification>) {
        if let Some(notification) = pending {
            notification.submit();
        }
    }
}

/// Log a rejected request and pass the error through
fn reject(err: HalError) -> HalError {
    warn!("Simulated audio hardware rejected request: {}", err);
    err
}

fn require_no_qualifier(operation: &'static str, qualifier: Option<&[u8]>) -> Result<(), HalError> {
    match qualifier {
        None => Ok(()),
        Some(_) => Err(reject(HalError::QualifierNotSupported { operation })),
    }
}

/// Check scope and element exactly, naming the first field that differs
fn require_scope_element(
    operation: &'static str,
    address: &PropertyAddress,
    scope: PropertyScope,
) -> Result<(), HalError> {
    let field = if address.scope != scope {
        "scope"
    } else if address.element != PropertyElement::MAIN {
        "element"
    } else {
        return Ok(());
    };
    Err(reject(HalError::UnsupportedAddress {
        operation,
        field,
        address: *address,
    }))
}

fn require_system_object(operation: &'static str, object: AudioObjectId) -> Result<(), HalError> {
    if object.is_system() {
        Ok(())
    } else {
        Err(reject(HalError::UnsupportedObject { operation, object }))
    }
}

/// Listeners may only watch the system device list
fn require_devices_address(
    operation: &'static str,
    address: &PropertyAddress,
) -> Result<(), HalError> {
    if address.selector != PropertySelector::Devices {
        return Err(reject(HalError::UnsupportedAddress {
            operation,
            field: "selector",
            address: *address,
        }));
    }
    require_scope_element(operation, address, PropertyScope::Global)
}

fn unsupported_selector(operation: &'static str, address: &PropertyAddress) -> HalError {
    reject(HalError::UnsupportedAddress {
        operation,
        field: "selector",
        address: *address,
    })
}

fn size_overflow(operation: &'static str) -> HalError {
    reject(HalError::SizeOverflow { operation })
}

fn require_capacity(required: u32, provided: u32) -> Result<(), HalError> {
    if provided < required {
        return Err(reject(HalError::BufferTooSmall { required, provided }));
    }
    Ok(())
}

/// Length of caller data, saturated to the 32-bit size range
fn byte_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl PropertyDirectory for SimulatedHardware {
    fn add_property_listener(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        queue: Option<QueueHandle>,
        listener: PropertyListener,
    ) -> Result<(), HalError> {
        let mut state = self.state.lock();

        if state.listener.is_active() {
            return Err(reject(HalError::ListenerAlreadyRegistered));
        }
        require_system_object(ADD_LISTENER, object)?;
        require_devices_address(ADD_LISTENER, address)?;
        let queue = queue.ok_or_else(|| reject(HalError::MissingQueue))?;

        state.listener.install(queue, listener, *address)?;
        state.status |= MockStatus::ADD_LISTENER_CALLED;
        Ok(())
    }

    fn remove_property_listener(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        queue: Option<QueueHandle>,
        _listener: PropertyListener,
    ) -> Result<(), HalError> {
        let removed = {
            let mut state = self.state.lock();

            if !state.listener.is_active() {
                return Err(reject(HalError::NoListenerRegistered));
            }
            require_system_object(REMOVE_LISTENER, object)?;
            require_devices_address(REMOVE_LISTENER, address)?;
            // The callback cannot be compared, so the registration is matched
            // on queue and address only.
            let queue = queue.ok_or_else(|| reject(HalError::QueueMismatch))?;
            let removed = state.listener.uninstall(&queue, address).map_err(reject)?;

            state.status |= MockStatus::REMOVE_LISTENER_CALLED;
            removed
        };
        drop(removed);
        Ok(())
    }

    fn set_property_data(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        qualifier: Option<&[u8]>,
        data: &[u8],
    ) -> Result<(), HalError> {
        require_system_object(SET_DATA, object)?;
        if !matches!(
            address.selector,
            PropertySelector::DefaultOutputDevice | PropertySelector::DefaultSystemOutputDevice
        ) {
            return Err(unsupported_selector(SET_DATA, address));
        }
        require_scope_element(SET_DATA, address, PropertyScope::Global)?;
        require_no_qualifier(SET_DATA, qualifier)?;

        let bytes: [u8; 4] = data.try_into().map_err(|_| {
            reject(HalError::InvalidDataSize {
                operation: SET_DATA,
                expected: AudioObjectId::BYTE_SIZE,
                actual: byte_len(data.len()),
            })
        })?;
        let device = AudioObjectId(u32::from_ne_bytes(bytes));

        let mut state = self.state.lock();
        if address.selector == PropertySelector::DefaultOutputDevice {
            debug!("Default output device set to {}", device);
            state.default_output = device;
            state.status |= MockStatus::DEFAULT_OUTPUT_SET;
        } else {
            debug!("Default system output device set to {}", device);
            state.default_system_output = device;
            state.status |= MockStatus::SYSTEM_OUTPUT_SET;
        }
        Ok(())
    }

    fn get_property_data_size(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        qualifier: Option<&[u8]>,
    ) -> Result<u32, HalError> {
        require_no_qualifier(GET_DATA_SIZE, qualifier)?;
        let state = self.state.lock();

        if object.is_system() {
            if address.selector != PropertySelector::Devices {
                return Err(unsupported_selector(GET_DATA_SIZE, address));
            }
            require_scope_element(GET_DATA_SIZE, address, PropertyScope::Global)?;
            return state
                .devices
                .ids_byte_size()
                .ok_or_else(|| size_overflow(GET_DATA_SIZE));
        }

        let device = state
            .devices
            .find(object)
            .ok_or_else(|| reject(HalError::BadDevice(object)))?;

        if address.selector != PropertySelector::StreamConfiguration {
            return Err(unsupported_selector(GET_DATA_SIZE, address));
        }
        require_scope_element(GET_DATA_SIZE, address, PropertyScope::Output)?;
        device
            .stream_configuration_size()
            .ok_or_else(|| size_overflow(GET_DATA_SIZE))
    }

    fn get_property_data(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        qualifier: Option<&[u8]>,
        io_data_size: &mut u32,
    ) -> Result<PropertyData, HalError> {
        require_no_qualifier(GET_DATA, qualifier)?;
        let state = self.state.lock();

        let data = if object.is_system() {
            require_scope_element(GET_DATA, address, PropertyScope::Global)?;
            match address.selector {
                PropertySelector::DefaultOutputDevice => {
                    PropertyData::ObjectId(state.default_output)
                }
                PropertySelector::Devices => PropertyData::ObjectIds(state.devices.ids()),
                _ => return Err(unsupported_selector(GET_DATA, address)),
            }
        } else {
            let device = state
                .devices
                .find(object)
                .ok_or_else(|| reject(HalError::BadDevice(object)))?;
            require_scope_element(GET_DATA, address, PropertyScope::Output)?;
            match address.selector {
                PropertySelector::StreamConfiguration => {
                    // Sized before building so a short buffer never pays for
                    // a large layout
                    let required = device
                        .stream_configuration_size()
                        .ok_or_else(|| size_overflow(GET_DATA))?;
                    require_capacity(required, *io_data_size)?;
                    PropertyData::BufferList(device.stream_configuration())
                }
                PropertySelector::DeviceUid => PropertyData::String(CfString::new(&device.uid)),
                PropertySelector::DeviceName => PropertyData::String(CfString::new(&device.name)),
                _ => return Err(unsupported_selector(GET_DATA, address)),
            }
        };

        let required = data.byte_size().ok_or_else(|| size_overflow(GET_DATA))?;
        require_capacity(required, *io_data_size)?;
        *io_data_size = required;
        Ok(data)
    }
}
