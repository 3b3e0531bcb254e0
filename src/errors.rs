use crate::enums::MotionState;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::{fmt, io, result};

pub type Result<T> = result::Result<T, MountError>;

/// Everything that can go wrong between a command request and the motor
/// controller acting on it.
#[derive(Debug)]
pub enum MountError {
    /// Write/read failure or timeout at the byte-stream level.
    Transport(io::Error),
    /// A syntactically valid reply carrying the error sentinel, or a reply
    /// whose payload could not be parsed.
    Protocol(String),
    /// An operation requested while the state machine is in an incompatible
    /// state. No transport call was attempted and the state is unchanged.
    StateConflict {
        operation: &'static str,
        state: MotionState,
    },
    /// Invalid geometry or com settings. Fatal at startup.
    Configuration(String),
}

impl Display for MountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MountError::Transport(e) => write!(f, "transport error: {}", e),
            MountError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            MountError::StateConflict { operation, state } => {
                write!(f, "{} not allowed while {}", operation, state)
            }
            MountError::Configuration(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl Error for MountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MountError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MountError {
    fn from(e: io::Error) -> Self {
        MountError::Transport(e)
    }
}
