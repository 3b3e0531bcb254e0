use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// Axis ids as they appear on the wire in GETAXISSTATUS/MOVE/STOP arguments.
#[derive(
    Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum Axis {
    /// RA/HA axis
    Primary = 0,
    /// Declination axis
    Secondary = 1,
}
