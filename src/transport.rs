//! Synchronous framed request/response over the serial link.
//!
//! One command is in flight at a time; every call blocks for up to the
//! port's configured timeout. No retries happen here — a failed command is
//! reported once and retry policy, if any, belongs to the caller.

use crate::errors::{MountError, Result};
use crate::protocol::{Command, ProtocolVariant, Reply, MAX_FRAME};
use std::fmt::Write as _;
use std::io;
use tracing::debug;

/// Byte stream the transport drives. Production code wraps a serial port;
/// tests inject scripted channels.
pub trait Channel: io::Read + io::Write + Send {
    /// Drops any stale bytes sitting in the driver buffers.
    fn purge(&mut self) -> io::Result<()>;
}

impl Channel for Box<dyn serialport::SerialPort> {
    fn purge(&mut self) -> io::Result<()> {
        self.clear(serialport::ClearBuffer::All)
            .map_err(io::Error::from)
    }
}

/// How much of a reply to consume.
#[derive(Debug, Copy, Clone)]
pub enum ReadMode {
    /// Exactly this many bytes.
    Exact(usize),
    /// Scan for the stop character, up to [`MAX_FRAME`] bytes.
    UntilStop,
}

pub struct SerialTransport<C: Channel> {
    channel: C,
    variant: ProtocolVariant,
}

impl<C: Channel> SerialTransport<C> {
    pub fn new(channel: C, variant: ProtocolVariant) -> Self {
        Self { channel, variant }
    }

    pub fn variant(&self) -> &ProtocolVariant {
        &self.variant
    }

    /// Fire-and-forget write. The caller must not assume the command was
    /// acted on unless it also reads a reply.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        let frame = command.encode(&self.variant)?;
        self.write_frame(&frame)?;
        Ok(())
    }

    /// Writes the command and blocks for the reply. A reply whose first
    /// byte is the error sentinel fails parsing; any other first byte is
    /// success.
    pub fn send_and_receive(&mut self, command: &Command, mode: ReadMode) -> Result<Reply> {
        let frame = command.encode(&self.variant)?;
        self.write_frame(&frame)?;
        let raw = self.read_frame(mode)?;
        debug!("RES <{}>", hex_dump(&raw));
        debug!("RES <{}>", String::from_utf8_lossy(&raw).trim_end());
        self.channel.purge()?;
        Reply::parse(&raw, &self.variant)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.channel.purge()?;
        debug!("CMD <{}>", hex_dump(frame));
        debug!("CMD <{}>", String::from_utf8_lossy(frame).trim_end());
        self.channel.write_all(frame)?;
        Ok(())
    }

    fn read_frame(&mut self, mode: ReadMode) -> Result<Vec<u8>> {
        match mode {
            ReadMode::Exact(len) => {
                let mut buf = vec![0u8; len.min(MAX_FRAME)];
                self.channel.read_exact(&mut buf)?;
                Ok(buf)
            }
            ReadMode::UntilStop => {
                let mut buf = Vec::with_capacity(MAX_FRAME);
                let mut byte = [0u8; 1];
                loop {
                    self.channel.read_exact(&mut byte)?;
                    if byte[0] == self.variant.stop_char {
                        return Ok(buf);
                    }
                    buf.push(byte[0]);
                    if buf.len() >= MAX_FRAME {
                        return Err(MountError::Protocol(format!(
                            "no stop character within {} bytes",
                            MAX_FRAME
                        )));
                    }
                }
            }
        }
    }
}

fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02X}", b);
    }
    out
}
