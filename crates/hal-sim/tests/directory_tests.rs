//! Integration tests for the simulated property directory
//!
//! These tests drive the simulator through the same `PropertyDirectory`
//! surface client code uses and verify:
//! - Device list contents and ordering across add/remove sequences
//! - Listener registration state and notification delivery
//! - Default device selectors
//! - Buffer size negotiation
//! - Reset semantics

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hal_protocol::{
    AudioBufferList, AudioObjectId, HalError, HalStatus, PropertyAddress, PropertyData,
    PropertyDirectory, PropertyListener, PropertySelector, QueueHandle,
};
use hal_sim::{HardwareFixture, ManualQueue, MockStatus, SimulatedHardware, TokioQueue};
use parking_lot::Mutex;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub const SYSTEM: AudioObjectId = AudioObjectId::SYSTEM_OBJECT;

    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();
    }

    /// Read the device list the way a client does: size first, then data
    pub fn device_list(hw: &dyn PropertyDirectory) -> Vec<AudioObjectId> {
        let mut size = hw
            .get_property_data_size(SYSTEM, &PropertyAddress::DEVICES, None)
            .unwrap();
        hw.get_property_data(SYSTEM, &PropertyAddress::DEVICES, None, &mut size)
            .unwrap()
            .into_object_ids()
            .unwrap()
    }

    /// Write a default-device selector
    pub fn set_default(
        hw: &dyn PropertyDirectory,
        selector: PropertySelector,
        id: u32,
    ) -> Result<(), HalError> {
        hw.set_property_data(
            SYSTEM,
            &PropertyAddress::global(selector),
            None,
            &id.to_ne_bytes(),
        )
    }

    /// Read the default output device
    pub fn default_output(hw: &dyn PropertyDirectory) -> AudioObjectId {
        let mut size = AudioObjectId::BYTE_SIZE;
        hw.get_property_data(
            SYSTEM,
            &PropertyAddress::global(PropertySelector::DefaultOutputDevice),
            None,
            &mut size,
        )
        .unwrap()
        .as_object_id()
        .unwrap()
    }

    /// Listener recording every delivery
    pub fn recording_listener() -> (PropertyListener, Calls) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let listener: PropertyListener = Arc::new(move |count: u32, address: &PropertyAddress| {
            sink.lock().push((count, *address));
        });
        (listener, calls)
    }

    /// Register on the device list through `queue`
    pub fn register(
        hw: &SimulatedHardware,
        queue: QueueHandle,
        listener: PropertyListener,
    ) -> Result<(), HalError> {
        hw.add_property_listener(SYSTEM, &PropertyAddress::DEVICES, Some(queue), listener)
    }

    /// Unregister from the device list through `queue`
    pub fn unregister(
        hw: &SimulatedHardware,
        queue: QueueHandle,
        listener: PropertyListener,
    ) -> Result<(), HalError> {
        hw.remove_property_listener(SYSTEM, &PropertyAddress::DEVICES, Some(queue), listener)
    }

    pub type Calls = Arc<Mutex<Vec<(u32, PropertyAddress)>>>;

    /// Install a recording listener on the device list
    pub fn listen(hw: &SimulatedHardware, queue: &Arc<ManualQueue>) -> Calls {
        let (listener, calls) = recording_listener();
        register(hw, queue.handle(), listener).unwrap();
        calls
    }
}

use helpers::SYSTEM;

// ============================================================================
// End-to-End Tests
// ============================================================================

mod end_to_end_tests {
    use super::*;

    #[test]
    fn single_device_layout_and_uid() {
        helpers::init_tracing();
        let hw = SimulatedHardware::new();
        hw.add_device(1u32, 2, 2, "A", "Dev A");

        let address = PropertyAddress::output(PropertySelector::StreamConfiguration);
        let size = hw
            .get_property_data_size(AudioObjectId(1), &address, None)
            .unwrap();
        assert_eq!(size, AudioBufferList::HEADER_SIZE + 2 * 16);

        let mut io_size = size;
        let config = hw
            .get_property_data(AudioObjectId(1), &address, None, &mut io_size)
            .unwrap()
            .into_buffer_list()
            .unwrap();
        assert_eq!(io_size, size);
        assert_eq!(config.number_buffers(), 2);
        assert!(config.buffers.iter().all(|b| b.number_channels == 2));

        let mut io_size = 8;
        let uid = hw
            .get_property_data(
                AudioObjectId(1),
                &PropertyAddress::output(PropertySelector::DeviceUid),
                None,
                &mut io_size,
            )
            .unwrap();
        assert_eq!(uid, PropertyData::String(hal_protocol::CfString::new("A")));
        assert_eq!(io_size, 8);
    }

    #[test]
    fn status_codes_match_platform() {
        helpers::init_tracing();
        let hw = SimulatedHardware::new();
        let address = PropertyAddress::output(PropertySelector::StreamConfiguration);

        let result = hw.get_property_data_size(AudioObjectId(77), &address, None);
        assert_eq!(HalStatus::from_result(&result).code(), 0x2164_6576);

        let result = hw.get_property_data_size(SYSTEM, &address, None);
        assert_eq!(HalStatus::from_result(&result).code(), 0x6E6F_7065);

        let result = hw.get_property_data_size(SYSTEM, &PropertyAddress::DEVICES, None);
        assert_eq!(HalStatus::from_result(&result), HalStatus::Ok);
    }

    #[test]
    fn fixture_populates_devices_in_order() {
        let fixture = HardwareFixture::from_json(
            r#"{ "devices": [
                { "id": 40, "uid": "spk", "name": "Speakers" },
                { "id": 41, "channels_per_buffer": 0, "uid": "mic", "name": "Microphone" },
                { "id": 42, "buffer_count": 2, "uid": "hdmi", "name": "HDMI" }
            ] }"#,
        )
        .unwrap();

        let hw = SimulatedHardware::from_fixture(&fixture);
        assert_eq!(
            helpers::device_list(&hw),
            vec![AudioObjectId(40), AudioObjectId(41), AudioObjectId(42)]
        );
        assert_eq!(hw.device(41u32).unwrap().output_channels(), 0);
        assert_eq!(hw.device(42u32).unwrap().stream_configuration_size(), Some(40));
    }

    #[test]
    fn long_strings_are_truncated() {
        let hw = SimulatedHardware::new();
        let uid = "u".repeat(64);
        hw.add_device(1u32, 1, 2, &uid, "Name");

        let mut size = 8;
        let value = hw
            .get_property_data(
                AudioObjectId(1),
                &PropertyAddress::output(PropertySelector::DeviceUid),
                None,
                &mut size,
            )
            .unwrap()
            .into_string()
            .unwrap();
        assert_eq!(value.as_str(), "u".repeat(31));
    }
}

// ============================================================================
// Default Device Tests
// ============================================================================

mod default_device_tests {
    use super::*;

    #[test]
    fn default_output_roundtrips_for_absent_device() {
        let hw = SimulatedHardware::new();
        hw.add_device(1u32, 1, 2, "A", "Dev A");

        helpers::set_default(&hw, PropertySelector::DefaultOutputDevice, 999).unwrap();
        assert_eq!(helpers::default_output(&hw), AudioObjectId(999));

        helpers::set_default(&hw, PropertySelector::DefaultOutputDevice, 1).unwrap();
        assert_eq!(helpers::default_output(&hw), AudioObjectId(1));
    }

    #[test]
    fn selectors_are_independent() {
        let hw = SimulatedHardware::new();

        helpers::set_default(&hw, PropertySelector::DefaultSystemOutputDevice, 5).unwrap();
        assert_eq!(helpers::default_output(&hw), AudioObjectId::UNKNOWN);
        assert_eq!(hw.default_system_output_device(), AudioObjectId(5));
        assert_eq!(hw.status(), MockStatus::SYSTEM_OUTPUT_SET);

        helpers::set_default(&hw, PropertySelector::DefaultOutputDevice, 6).unwrap();
        assert_eq!(
            hw.status(),
            MockStatus::SYSTEM_OUTPUT_SET | MockStatus::DEFAULT_OUTPUT_SET
        );
    }

    #[test]
    fn selectors_not_derived_from_registry() {
        let hw = SimulatedHardware::new();
        hw.add_device(1u32, 1, 2, "A", "Dev A");
        assert_eq!(helpers::default_output(&hw), AudioObjectId::UNKNOWN);

        helpers::set_default(&hw, PropertySelector::DefaultOutputDevice, 1).unwrap();
        hw.remove_device(1u32);
        assert_eq!(helpers::default_output(&hw), AudioObjectId(1));
    }
}

// ============================================================================
// Listener Tests
// ============================================================================

mod listener_tests {
    use super::*;

    #[test]
    fn one_notification_per_mutation() {
        helpers::init_tracing();
        let hw = SimulatedHardware::new();
        let queue = ManualQueue::new();
        let calls = helpers::listen(&hw, &queue);

        hw.add_device(1u32, 1, 2, "A", "Dev A");
        hw.add_device(2u32, 1, 2, "B", "Dev B");
        hw.remove_device(1u32);

        assert_eq!(queue.run_pending(), 3);
        let calls = calls.lock();
        assert_eq!(calls.len(), 3);
        assert!(calls
            .iter()
            .all(|(count, address)| *count == 1 && *address == PropertyAddress::DEVICES));
    }

    #[test]
    fn removing_unknown_device_does_not_notify() {
        let hw = SimulatedHardware::new();
        let queue = ManualQueue::new();
        let _calls = helpers::listen(&hw, &queue);

        hw.remove_device(123u32);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn reset_never_notifies() {
        let hw = SimulatedHardware::new();
        let queue = ManualQueue::new();
        let calls = helpers::listen(&hw, &queue);
        hw.add_device(1u32, 1, 2, "A", "Dev A");
        queue.run_pending();

        hw.reset();

        assert_eq!(queue.run_pending(), 0);
        assert_eq!(calls.lock().len(), 1);
        assert_eq!(hw.status(), MockStatus::IDLE);
        assert!(helpers::device_list(&hw).is_empty());
    }

    #[test]
    fn listener_can_be_reinstalled_after_removal() {
        let hw = SimulatedHardware::new();
        let queue = ManualQueue::new();
        let (listener, _) = helpers::recording_listener();

        helpers::register(&hw, queue.handle(), listener.clone()).unwrap();
        helpers::unregister(&hw, queue.handle(), listener.clone()).unwrap();
        helpers::register(&hw, queue.handle(), listener).unwrap();

        assert!(hw.has_listener());
        assert_eq!(
            hw.status(),
            MockStatus::ADD_LISTENER_CALLED | MockStatus::REMOVE_LISTENER_CALLED
        );
    }

    #[test]
    fn remove_listener_rejects_wrong_object_and_address() {
        let hw = SimulatedHardware::new();
        let queue = ManualQueue::new();
        let (listener, _) = helpers::recording_listener();
        helpers::register(&hw, queue.handle(), listener.clone()).unwrap();

        let result = hw.remove_property_listener(
            AudioObjectId(9),
            &PropertyAddress::DEVICES,
            Some(queue.handle()),
            listener.clone(),
        );
        assert_eq!(HalStatus::from_result(&result), HalStatus::IllegalOperation);

        let result = hw.remove_property_listener(
            SYSTEM,
            &PropertyAddress::global(PropertySelector::DefaultOutputDevice),
            Some(queue.handle()),
            listener,
        );
        assert_eq!(HalStatus::from_result(&result), HalStatus::IllegalOperation);
        assert!(hw.has_listener());
    }

    #[test]
    fn scheduled_delivery_not_retracted_by_unregister() {
        let hw = SimulatedHardware::new();
        let queue = ManualQueue::new();
        let (listener, calls) = helpers::recording_listener();
        helpers::register(&hw, queue.handle(), listener.clone()).unwrap();

        hw.add_device(1u32, 1, 2, "A", "Dev A");
        helpers::unregister(&hw, queue.handle(), listener).unwrap();
        hw.add_device(2u32, 1, 2, "B", "Dev B");

        queue.run_pending();
        assert_eq!(calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn tokio_queue_delivers_asynchronously_in_order() {
        let hw = SimulatedHardware::new();
        let queue = TokioQueue::spawn("devices");
        let seen = Arc::new(Mutex::new(Vec::new()));

        // Each delivery snapshots the device count at the time it runs
        let reader = hw.clone();
        let sink = seen.clone();
        let listener: PropertyListener = Arc::new(move |_: u32, _: &PropertyAddress| {
            sink.lock().push(reader.device_count());
        });
        helpers::register(&hw, queue.handle(), listener).unwrap();

        for id in 1..=4u32 {
            hw.add_device(id, 1, 2, &format!("uid-{id}"), "Device");
        }

        tokio::time::timeout(Duration::from_secs(1), queue.drain())
            .await
            .unwrap();
        assert_eq!(seen.lock().len(), 4);

        hw.reset();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tokio_queue_delivery_from_worker_thread() {
        let hw = SimulatedHardware::new();
        let queue = TokioQueue::spawn("mt");
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let listener: PropertyListener = Arc::new(move |n: u32, _: &PropertyAddress| {
            c.fetch_add(n, Ordering::SeqCst);
        });
        helpers::register(&hw, queue.handle(), listener).unwrap();

        hw.add_device(1u32, 1, 2, "A", "Dev A");
        hw.remove_device(1u32);

        tokio::time::timeout(Duration::from_secs(1), queue.drain())
            .await
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add(u32),
        Remove(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0u32..16).prop_map(Op::Add), (0u32..16).prop_map(Op::Remove)]
    }

    proptest! {
        #[test]
        fn device_list_tracks_live_set(ops in prop::collection::vec(op(), 0..40)) {
            let hw = SimulatedHardware::new();
            let mut model: Vec<AudioObjectId> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(id) => {
                        // Ids must be unique among live devices
                        if !model.contains(&AudioObjectId(id)) {
                            hw.add_device(id, 1, 2, "uid", "name");
                            model.push(AudioObjectId(id));
                        }
                    }
                    Op::Remove(id) => {
                        hw.remove_device(id);
                        model.retain(|d| *d != AudioObjectId(id));
                    }
                }
            }

            prop_assert_eq!(helpers::device_list(&hw), model);
        }

        #[test]
        fn notifications_match_mutations(ops in prop::collection::vec(op(), 0..30)) {
            let hw = SimulatedHardware::new();
            let queue = ManualQueue::new();
            let calls = helpers::listen(&hw, &queue);
            let mut live: Vec<u32> = Vec::new();
            let mut expected = 0usize;

            for op in ops {
                match op {
                    Op::Add(id) => {
                        if !live.contains(&id) {
                            hw.add_device(id, 1, 2, "uid", "name");
                            live.push(id);
                            expected += 1;
                        }
                    }
                    Op::Remove(id) => {
                        if live.contains(&id) {
                            expected += 1;
                        }
                        hw.remove_device(id);
                        live.retain(|d| *d != id);
                    }
                }
            }

            prop_assert_eq!(queue.run_pending(), expected);
            prop_assert_eq!(calls.lock().len(), expected);
        }

        #[test]
        fn stream_configuration_size_increases(
            n in prop_oneof![0u32..256, 0u32..AudioBufferList::MAX_BUFFERS]
        ) {
            let hw = SimulatedHardware::new();
            hw.add_device(1u32, n, 2, "a", "A");
            hw.add_device(2u32, n + 1, 2, "b", "B");
            let address = PropertyAddress::output(PropertySelector::StreamConfiguration);

            let small = hw.get_property_data_size(AudioObjectId(1), &address, None).unwrap();
            let again = hw.get_property_data_size(AudioObjectId(1), &address, None).unwrap();
            let large = hw.get_property_data_size(AudioObjectId(2), &address, None).unwrap();

            prop_assert_eq!(small, again);
            prop_assert!(large > small);
        }

        #[test]
        fn stream_configuration_size_past_limit_rejected(
            n in (AudioBufferList::MAX_BUFFERS + 1)..=u32::MAX
        ) {
            let hw = SimulatedHardware::new();
            hw.add_device(1u32, n, 2, "a", "A");
            let address = PropertyAddress::output(PropertySelector::StreamConfiguration);

            let result = hw.get_property_data_size(AudioObjectId(1), &address, None);
            prop_assert_eq!(HalStatus::from_result(&result), HalStatus::IllegalOperation);

            let mut size = u32::MAX;
            let result = hw.get_property_data(AudioObjectId(1), &address, None, &mut size);
            prop_assert!(
                matches!(result, Err(HalError::SizeOverflow { .. })),
                "expected SizeOverflow, got {:?}",
                result
            );
        }

        #[test]
        fn default_output_roundtrips(id: u32) {
            let hw = SimulatedHardware::new();
            helpers::set_default(&hw, PropertySelector::DefaultOutputDevice, id).unwrap();
            prop_assert_eq!(helpers::default_output(&hw), AudioObjectId(id));
        }

        #[test]
        fn second_listener_always_rejected(extra in 1usize..4) {
            let hw = SimulatedHardware::new();
            let queue = ManualQueue::new();
            let _calls = helpers::listen(&hw, &queue);
            let status = hw.status();

            for _ in 0..extra {
                let other = ManualQueue::new();
                let (listener, _) = helpers::recording_listener();
                let result = hw.add_property_listener(
                    SYSTEM,
                    &PropertyAddress::DEVICES,
                    Some(other.handle()),
                    listener,
                );
                prop_assert_eq!(result, Err(HalError::ListenerAlreadyRegistered));
            }
            prop_assert_eq!(hw.status(), status);
        }

        #[test]
        fn reset_always_returns_to_idle(adds in 0u32..8, listen: bool, write: bool) {
            let hw = SimulatedHardware::new();
            let queue = ManualQueue::new();
            if listen {
                let _ = helpers::listen(&hw, &queue);
            }
            for id in 0..adds {
                hw.add_device(id + 100, 1, 2, "uid", "name");
            }
            if write {
                helpers::set_default(&hw, PropertySelector::DefaultOutputDevice, 100).unwrap();
            }
            queue.clear();

            hw.reset();

            prop_assert_eq!(hw.status(), MockStatus::IDLE);
            prop_assert!(helpers::device_list(&hw).is_empty());
            prop_assert_eq!(queue.pending(), 0);
        }
    }
}
