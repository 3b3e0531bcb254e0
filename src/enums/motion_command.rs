use serde::{Deserialize, Serialize};

/// Start or stop a manual jog.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum MotionCommand {
    Start,
    Stop,
}
