//! Bridge packet framing
//!
//! Every host/bridge exchange is one packet:
//!
//! ```text
//! offset 0: command        (4 bytes, little-endian)
//! offset 4: data length N  (4 bytes, little-endian)
//! offset 8: payload        (N bytes, raw)
//! ```
//!
//! The header is host-protocol framing and is little-endian; anything inside
//! the payload (flash addresses for instance) keeps its own byte order.

use core::fmt;

use crate::error::{Error, Result};

/// Size of the command + length header
pub const HEADER_LEN: usize = 8;

/// Bridge command words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Command {
    /// Load the register block (plus write payload) and start the transfer
    SetRegister = 0x0002_0000,
    /// Read back the register block
    ReadRegister = 0x0002_0001,
    /// Read the bytes clocked in by the last transfer
    ReadData = 0x0002_0002,
}

impl Command {
    /// Command word as sent on the wire
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Decode a command word
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x0002_0000 => Some(Self::SetRegister),
            0x0002_0001 => Some(Self::ReadRegister),
            0x0002_0002 => Some(Self::ReadData),
            _ => None,
        }
    }

    /// Protocol name of the command
    pub const fn name(self) -> &'static str {
        match self {
            Self::SetRegister => "SET_REGISTER",
            Self::ReadRegister => "READ_REGISTER",
            Self::ReadData => "READ_DATA",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Frame `payload` behind a command/length header
pub fn encode(command: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&command.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Split a received packet into its command word and payload
pub fn decode(raw: &[u8]) -> Result<(u32, &[u8])> {
    if raw.len() < HEADER_LEN {
        return Err(Error::MalformedPacket { len: raw.len() });
    }

    let command = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let declared = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    let payload = &raw[HEADER_LEN..];

    if payload.len() as u64 != declared as u64 {
        return Err(Error::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    Ok((command, payload))
}

/// Owned packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Command word
    pub command: u32,
    /// Payload bytes
    pub payload: Vec<u8>,
}

impl Packet {
    /// Packet with a payload
    pub fn new(command: Command, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            command: command.code(),
            payload: payload.into(),
        }
    }

    /// Packet without payload
    pub fn bare(command: Command) -> Self {
        Self::new(command, Vec::new())
    }

    /// Payload length as carried in the header
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True when the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Serialize the packet
    pub fn encode(&self) -> Vec<u8> {
        encode(self.command, &self.payload)
    }

    /// Parse a packet
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let (command, payload) = decode(raw)?;
        Ok(Self {
            command,
            payload: payload.to_vec(),
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Command::from_code(self.command) {
            Some(cmd) => write!(f, "{} (0x{:08X})", cmd, self.command)?,
            None => write!(f, "UNKNOWN_CMD(0x{:08X})", self.command)?,
        }
        write!(f, " len={}", self.payload.len())?;
        if !self.payload.is_empty() {
            f.write_str(" data=")?;
            for b in &self.payload {
                write!(f, "{:02x}", b)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_set_register() {
        let raw = encode(Command::SetRegister.code(), &[0x11, 0x22, 0x33]);
        assert_eq!(
            raw,
            [0x00, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00, 0x11, 0x22, 0x33]
        );
    }

    #[test]
    fn test_encode_empty_payload() {
        let raw = Packet::bare(Command::ReadRegister).encode();
        assert_eq!(raw, [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_roundtrip() {
        for len in [0usize, 1, 3, 4, 40, 300] {
            let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
            for cmd in [Command::SetRegister, Command::ReadRegister, Command::ReadData] {
                let raw = encode(cmd.code(), &payload);
                let (command, body) = decode(&raw).unwrap();
                assert_eq!(command, cmd.code());
                assert_eq!(body, payload.as_slice());
            }
        }
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(
            decode(&[0x00, 0x00, 0x02, 0x00, 0x05, 0x00]),
            Err(Error::MalformedPacket { len: 6 })
        );
        assert_eq!(decode(&[]), Err(Error::MalformedPacket { len: 0 }));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let raw = [0x00, 0x00, 0x02, 0x00, 0x05, 0x00, 0x00, 0x00, 0xAA, 0xBB];
        assert_eq!(
            decode(&raw),
            Err(Error::LengthMismatch {
                declared: 5,
                actual: 2
            })
        );

        // Trailing garbage is rejected too
        let raw = [0x02, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xAA];
        assert!(matches!(decode(&raw), Err(Error::LengthMismatch { .. })));
    }

    #[test]
    fn test_packet_display() {
        let pkt = Packet::new(Command::SetRegister, vec![0x11, 0x22, 0x33]);
        assert_eq!(
            pkt.to_string(),
            "SET_REGISTER (0x00020000) len=3 data=112233"
        );
        let pkt = Packet {
            command: 0x1234,
            payload: Vec::new(),
        };
        assert_eq!(pkt.to_string(), "UNKNOWN_CMD(0x00001234) len=0");
    }
}
