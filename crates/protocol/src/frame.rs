//! The 7-byte Somfy RTS frame
//!
//! Layout:
//!   [0]    0xA1 key byte
//!   [1]    command nibble (high) | checksum nibble (low)
//!   [2..4] rolling code, big-endian
//!   [4..7] device id, big-endian 24-bit

use std::fmt;
use std::str::FromStr;

use crate::{ProtocolError, Result};

/// Somfy RTS command vocabulary. Single-command values, not a bitmask,
/// despite the nibble positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    My = 0x10,
    Up = 0x20,
    Down = 0x40,
    Prog = 0x80,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::My, Command::Up, Command::Down, Command::Prog];
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::My => "MY",
            Command::Up => "UP",
            Command::Down => "DOWN",
            Command::Prog => "PROG",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MY" => Ok(Command::My),
            "UP" => Ok(Command::Up),
            "DOWN" => Ok(Command::Down),
            "PROG" => Ok(Command::Prog),
            _ => Err(ProtocolError::UnknownCommand { name: s.to_string() }),
        }
    }
}

/// A Somfy RTS frame as a fixed 7-byte record with named accessors.
///
/// The checksum invariant holds only on the unobfuscated form; a frame
/// handed to the transport is always checksummed first, obfuscated
/// second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SomfyFrame([u8; 7]);

impl SomfyFrame {
    pub const LEN: usize = 7;
    const KEY_BYTE: u8 = 0xA1;

    /// Build a command frame with its checksum nibble filled in.
    pub fn build(command: Command, rolling_code: u16, device_id: u32) -> Self {
        let mut bytes = [0u8; 7];
        bytes[0] = Self::KEY_BYTE;
        bytes[1] = command as u8 & 0xF0;
        bytes[2] = (rolling_code >> 8) as u8;
        bytes[3] = rolling_code as u8;
        bytes[4] = (device_id >> 16) as u8;
        bytes[5] = (device_id >> 8) as u8;
        bytes[6] = device_id as u8;

        let mut frame = Self(bytes);
        frame.0[1] |= frame.checksum();
        frame
    }

    /// Reassemble a frame from the 56-bit value the decoder produced,
    /// most-significant byte first.
    pub fn from_bits(value: u64) -> Self {
        let mut bytes = [0u8; 7];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (value >> (48 - 8 * i)) as u8;
        }
        Self(bytes)
    }

    /// The frame as a 56-bit value, most-significant byte first.
    pub fn to_bits(&self) -> u64 {
        self.0
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }

    pub fn as_bytes(&self) -> &[u8; 7] {
        &self.0
    }

    /// XOR-fold checksum nibble: every byte XORed with itself shifted
    /// right four bits, accumulated across all seven bytes. Computed
    /// over the frame with the checksum nibble treated as zero.
    pub fn checksum(&self) -> u8 {
        let mut checksum = 0u8;
        for (i, &byte) in self.0.iter().enumerate() {
            let byte = if i == 1 { byte & 0xF0 } else { byte };
            checksum ^= byte ^ (byte >> 4);
        }
        checksum & 0x0F
    }

    /// Whether the stored checksum nibble matches the frame contents.
    pub fn checksum_valid(&self) -> bool {
        self.0[1] & 0x0F == self.checksum()
    }

    /// Command nibble, mapped back to the vocabulary when it matches.
    pub fn command(&self) -> Option<Command> {
        Command::ALL
            .into_iter()
            .find(|&c| c as u8 == self.0[1] & 0xF0)
    }

    pub fn rolling_code(&self) -> u16 {
        u16::from_be_bytes([self.0[2], self.0[3]])
    }

    pub fn device_id(&self) -> u32 {
        u32::from_be_bytes([0, self.0[4], self.0[5], self.0[6]])
    }

    /// Obfuscate in place: each byte except the first is XORed with
    /// the already-obfuscated byte before it. Applied after the
    /// checksum, before transmission.
    pub fn obfuscate(&mut self) {
        for i in 1..Self::LEN {
            self.0[i] ^= self.0[i - 1];
        }
    }

    /// Exact inverse of [`SomfyFrame::obfuscate`], walking from byte 6
    /// down to byte 1 so each XOR sees the still-obfuscated
    /// predecessor.
    pub fn deobfuscate(&mut self) {
        for i in (1..Self::LEN).rev() {
            self.0[i] ^= self.0[i - 1];
        }
    }
}

impl fmt::Display for SomfyFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}
