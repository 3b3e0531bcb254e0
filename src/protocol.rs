//! Wire protocol spoken by the stepper controller firmware.
//!
//! Every command is a one-byte opcode, optional space-separated numeric
//! arguments, and a single stop byte. Replies echo the opcode (or carry the
//! error sentinel as their first byte) followed by space-separated numbers.

use crate::errors::{MountError, Result};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum frame size in either direction, stop byte included.
pub const MAX_FRAME: usize = 64;

#[derive(Debug, Eq, PartialEq, Copy, Clone, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// "A <raSteps> <deSteps>"
    Goto = b'A',
    /// "B" or "B <rate>"
    Track = b'B',
    /// "C"
    Park = b'C',
    /// "D"
    SetParkPos = b'D',
    /// "E <axis>"
    GetAxisStatus = b'E',
    /// "F"
    Handshake = b'F',
    /// "G <raRate> <deRate>"
    SetTrackRate = b'G',
    /// "H"
    Abort = b'H',
    /// "I"
    SetIdle = b'I',
    /// "J <axis> <rate>"
    Move = b'J',
    /// "K <axis>"
    Stop = b'K',
}

/// Framing bytes that differ across firmware revisions. The stop character
/// and the error sentinel are configuration, not constants baked into the
/// codec; the revisions are never merged.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct ProtocolVariant {
    pub stop_char: u8,
    pub error_sentinel: u8,
}

impl ProtocolVariant {
    /// The firmware's `ERROR = -1` enum value, seen on the wire as a byte.
    pub const DEFAULT_ERROR_SENTINEL: u8 = 0xFF;

    /// Canonical revision: newline-terminated frames.
    pub fn newline_framed() -> Self {
        Self {
            stop_char: b'\n',
            error_sentinel: Self::DEFAULT_ERROR_SENTINEL,
        }
    }

    /// Revision used by '#'-terminated firmware builds.
    pub fn hash_framed() -> Self {
        Self {
            stop_char: b'#',
            error_sentinel: Self::DEFAULT_ERROR_SENTINEL,
        }
    }

    /// Revision used by NUL-terminated firmware builds.
    pub fn nul_framed() -> Self {
        Self {
            stop_char: 0,
            error_sentinel: Self::DEFAULT_ERROR_SENTINEL,
        }
    }
}

impl Default for ProtocolVariant {
    fn default() -> Self {
        Self::newline_framed()
    }
}

/// An outgoing command frame under construction.
#[derive(Debug, Clone)]
pub struct Command {
    opcode: Opcode,
    args: Vec<String>,
}

impl Command {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            args: Vec::new(),
        }
    }

    pub fn arg<T: fmt::Display>(mut self, value: T) -> Self {
        self.args.push(value.to_string());
        self
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Encodes the frame, stop byte included. Length-checked against
    /// [`MAX_FRAME`].
    pub fn encode(&self, variant: &ProtocolVariant) -> Result<Vec<u8>> {
        let mut frame = Vec::with_capacity(MAX_FRAME);
        frame.push(self.opcode.into());
        for arg in &self.args {
            frame.push(b' ');
            frame.extend_from_slice(arg.as_bytes());
        }
        frame.push(variant.stop_char);
        if frame.len() > MAX_FRAME {
            return Err(MountError::Protocol(format!(
                "command frame is {} bytes, limit is {}",
                frame.len(),
                MAX_FRAME
            )));
        }
        Ok(frame)
    }
}

/// A received reply frame, stop byte stripped.
#[derive(Debug, Clone)]
pub struct Reply {
    bytes: Vec<u8>,
}

impl Reply {
    /// Validates the error-sentinel convention: any non-sentinel first byte
    /// is success.
    pub fn parse(raw: &[u8], variant: &ProtocolVariant) -> Result<Self> {
        let bytes = match raw.last() {
            Some(&b) if b == variant.stop_char => &raw[..raw.len() - 1],
            _ => raw,
        };
        if bytes.is_empty() {
            return Err(MountError::Protocol("empty reply".into()));
        }
        if bytes[0] == variant.error_sentinel {
            return Err(MountError::Protocol("device reported error".into()));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn first_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// Numeric payload value at `index`, counting from the first argument
    /// after the opcode echo.
    pub fn int_arg(&self, index: usize) -> Result<i32> {
        let payload = std::str::from_utf8(&self.bytes[1..])
            .map_err(|_| MountError::Protocol("non-ASCII reply payload".into()))?;
        let token = payload.split_ascii_whitespace().nth(index).ok_or_else(|| {
            MountError::Protocol(format!("reply has no argument {}", index))
        })?;
        token
            .parse()
            .map_err(|_| MountError::Protocol(format!("bad numeric argument '{}'", token)))
    }
}
