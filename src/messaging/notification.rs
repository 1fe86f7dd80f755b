// Notifications - Communication engine → observers

/// Event pushed by the scheduler toward mixing graph and UI observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineNotification {
    /// The musical note offset advanced to the given value.
    OffsetChanged(u64),
    /// The rotating buffer switched; carries the new active slot index.
    BufferSwitched(usize),
    /// The attached device failed a read and was detached.
    DeviceLost,
}
