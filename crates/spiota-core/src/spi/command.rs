//! SPI command structure

use super::address::{addr_to_bytes, check_range};
use crate::error::Result;

/// A single flash command: opcode, optional 3-byte address, dummy cycles,
/// write data and the number of bytes to clock back in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// 24-bit address (if any)
    pub address: Option<u32>,

    /// Dummy cycles between the write and read phases
    pub dummy_cycles: u32,

    /// Data to write after opcode/address
    pub write_data: &'a [u8],

    /// Number of bytes to read
    pub read_len: usize,
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, WRDI)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            dummy_cycles: 0,
            write_data: &[],
            read_len: 0,
        }
    }

    /// Create a read register command with no address (e.g., RDSR, RDID)
    pub fn read_reg(opcode: u8, len: usize) -> Self {
        Self {
            read_len: len,
            ..Self::simple(opcode)
        }
    }

    /// Create a read command with 3-byte address (e.g., FAST_READ)
    pub fn read_3b(opcode: u8, addr: u32, len: usize) -> Self {
        Self {
            address: Some(addr),
            read_len: len,
            ..Self::simple(opcode)
        }
    }

    /// Create a write command with 3-byte address (e.g., PP)
    pub fn write_3b(opcode: u8, addr: u32, data: &'a [u8]) -> Self {
        Self {
            address: Some(addr),
            write_data: data,
            ..Self::simple(opcode)
        }
    }

    /// Create an erase command with 3-byte address
    pub fn erase_3b(opcode: u8, addr: u32) -> Self {
        Self {
            address: Some(addr),
            ..Self::simple(opcode)
        }
    }

    /// Set the number of dummy cycles
    pub fn with_dummy_cycles(mut self, cycles: u32) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Returns true if this command has a read phase
    pub fn has_read(&self) -> bool {
        self.read_len > 0
    }

    /// Bytes sent in the write phase: opcode, address, data
    pub fn write_len(&self) -> usize {
        1 + if self.address.is_some() { 3 } else { 0 } + self.write_data.len()
    }

    /// Serialize opcode, big-endian address and write data
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.write_len());
        out.push(self.opcode);
        if let Some(addr) = self.address {
            check_range(addr, self.write_data.len().max(self.read_len))?;
            out.extend_from_slice(&addr_to_bytes(addr));
        }
        out.extend_from_slice(self.write_data);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::spi::opcodes;

    #[test]
    fn test_encode_simple() {
        assert_eq!(SpiCommand::simple(opcodes::WREN).encode().unwrap(), [0x06]);
        let cmd = SpiCommand::read_reg(opcodes::RDID, 3);
        assert_eq!(cmd.encode().unwrap(), [0x9F]);
        assert!(cmd.has_read());
    }

    #[test]
    fn test_encode_addressed() {
        let cmd = SpiCommand::read_3b(opcodes::FAST_READ, 0x0A1B2C, 0x50).with_dummy_cycles(1);
        assert_eq!(cmd.encode().unwrap(), [0x0B, 0x0A, 0x1B, 0x2C]);
        assert_eq!(cmd.dummy_cycles, 1);

        let data = [0xDE, 0xAD];
        let cmd = SpiCommand::write_3b(opcodes::PP, 0x000100, &data);
        assert_eq!(cmd.encode().unwrap(), [0x02, 0x00, 0x01, 0x00, 0xDE, 0xAD]);
        assert_eq!(cmd.write_len(), 6);
    }

    #[test]
    fn test_encode_rejects_wide_address() {
        let cmd = SpiCommand::erase_3b(opcodes::BE_D8, 0x0100_0000);
        assert!(matches!(cmd.encode(), Err(Error::AddressOutOfRange { .. })));
    }
}
