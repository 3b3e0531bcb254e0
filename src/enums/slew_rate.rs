use serde::{Deserialize, Serialize};

/// Manual-jog rate presets, slowest to fastest.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum SlewRate {
    Guide,
    Centering,
    Find,
    Max,
}
