//! Accumulated mock status flags

use bitflags::bitflags;

bitflags! {
    /// Calls observed by the simulator since the last reset
    ///
    /// Flags only accumulate; [`SimulatedHardware::reset`](crate::SimulatedHardware::reset)
    /// is the only way to clear them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MockStatus: u8 {
        /// A property listener was installed
        const ADD_LISTENER_CALLED = 0x1;
        /// A property listener was removed
        const REMOVE_LISTENER_CALLED = 0x2;
        /// The default output device was written
        const DEFAULT_OUTPUT_SET = 0x4;
        /// The default system output device was written
        const SYSTEM_OUTPUT_SET = 0x8;
    }
}

impl MockStatus {
    /// No calls observed
    pub const IDLE: MockStatus = MockStatus::empty();
}
