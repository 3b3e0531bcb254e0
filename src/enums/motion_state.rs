use std::fmt;

/// The motion state machine owned by the mount. Transitions happen only
/// through the mount's own operations.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum MotionState {
    Idle,
    Slewing,
    Tracking,
    Parking,
    Parked,
}

impl MotionState {
    /// True for the states in which a new slew request must be rejected.
    pub fn blocks_goto(&self) -> bool {
        matches!(
            self,
            MotionState::Slewing | MotionState::Parking | MotionState::Parked
        )
    }
}

impl fmt::Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MotionState::Idle => "idle",
            MotionState::Slewing => "slewing",
            MotionState::Tracking => "tracking",
            MotionState::Parking => "parking",
            MotionState::Parked => "parked",
        };
        f.write_str(s)
    }
}
