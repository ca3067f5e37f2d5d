//! Register block of the bridge's SPI controller
//!
//! The bridge exposes its SPI controller as ten 32-bit registers that are
//! always transferred together as one 40-byte block, little-endian per
//! register. [`RegisterBlock`] owns those 40 bytes and offers two views on
//! them:
//!
//! - raw words, addressed by [`Register`]
//! - named bit-fields, described by [`Field`] constants in [`fields`]
//!
//! Both views read and write the same bytes, so setting a field and reading
//! the word (or the other way round) always agree bit for bit.
//!
//! A block is built fresh for every transaction: [`RegisterBlock::new`]
//! applies the per-register reset values, the transaction engine adjusts the
//! fields it needs, and the block is serialized once.

use core::fmt;

use crate::error::{Error, Result};

pub mod fields;

/// Number of registers in a block
pub const REGISTER_COUNT: usize = 10;

/// Serialized size of a block in bytes
pub const BLOCK_SIZE: usize = REGISTER_COUNT * 4;

/// Post-transaction Status value: both FIFOs empty, controller not active
pub const IDLE_STATUS: u32 = fields::status::DEFAULT;

/// One of the ten controller registers, numbered by its slot in the block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    /// Resets, DMA enables and FIFO thresholds
    Control = 0,
    /// Clocking, bit order, data unit and address length
    TransferFormat = 1,
    /// Transfer mode and phase lengths
    TransferControl = 2,
    /// Interrupt enables
    InterruptEnable = 3,
    /// SCLK divider and CS timing
    Timing = 4,
    /// Interrupt flags
    InterruptStatus = 5,
    /// FIFO depths and capabilities
    Configuration = 6,
    /// Activity and FIFO state
    Status = 7,
    /// SPI address phase value
    Address = 8,
    /// SPI command phase value
    Command = 9,
}

impl Register {
    /// All registers in serialized order
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::Control,
        Register::TransferFormat,
        Register::TransferControl,
        Register::InterruptEnable,
        Register::Timing,
        Register::InterruptStatus,
        Register::Configuration,
        Register::Status,
        Register::Address,
        Register::Command,
    ];

    /// Slot of this register in the block
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a register by its slot
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Hardware name of the register
    pub const fn name(self) -> &'static str {
        match self {
            Self::Control => "ControlRegister",
            Self::TransferFormat => "TransferFormatRegister",
            Self::TransferControl => "TransferControlRegister",
            Self::InterruptEnable => "InterruptEnableRegister",
            Self::Timing => "TimingRegister",
            Self::InterruptStatus => "InterruptStatusRegister",
            Self::Configuration => "ConfigurationRegister",
            Self::Status => "StatusRegister",
            Self::Address => "AddressRegister",
            Self::Command => "CommandRegister",
        }
    }

    /// Named fields of the register, lowest bit first
    pub const fn fields(self) -> &'static [Field] {
        match self {
            Self::Control => fields::control::FIELDS,
            Self::TransferFormat => fields::transfer_format::FIELDS,
            Self::TransferControl => fields::transfer_control::FIELDS,
            Self::InterruptEnable => fields::interrupt_enable::FIELDS,
            Self::Timing => fields::timing::FIELDS,
            Self::InterruptStatus => fields::interrupt_status::FIELDS,
            Self::Configuration => fields::configuration::FIELDS,
            Self::Status => fields::status::FIELDS,
            Self::Address => fields::address::FIELDS,
            Self::Command => fields::command::FIELDS,
        }
    }

    /// Reset value applied by [`RegisterBlock::new`]
    pub const fn default_value(self) -> u32 {
        match self {
            Self::Control => fields::control::DEFAULT,
            Self::TransferFormat => fields::transfer_format::DEFAULT,
            Self::TransferControl => fields::transfer_control::DEFAULT,
            Self::InterruptEnable => fields::interrupt_enable::DEFAULT,
            Self::Timing => fields::timing::DEFAULT,
            Self::InterruptStatus => fields::interrupt_status::DEFAULT,
            Self::Configuration => fields::configuration::DEFAULT,
            Self::Status => fields::status::DEFAULT,
            Self::Address => fields::address::DEFAULT,
            Self::Command => fields::command::DEFAULT,
        }
    }

    /// Look up a field of this register by its hardware name
    pub fn field(self, name: &str) -> Option<Field> {
        self.fields().iter().copied().find(|f| f.name == name)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bit-field inside one register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    /// Register holding the field
    pub register: Register,
    /// Hardware name of the field
    pub name: &'static str,
    /// Position of the lowest bit
    pub shift: u8,
    /// Width in bits (1..=32)
    pub width: u8,
}

impl Field {
    /// Describe a field of `width` bits starting at bit `shift`
    pub const fn new(register: Register, name: &'static str, shift: u8, width: u8) -> Self {
        Self {
            register,
            name,
            shift,
            width,
        }
    }

    /// Mask of the field value, unshifted
    pub const fn value_mask(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Mask of the field inside the register word
    pub const fn mask(&self) -> u32 {
        self.value_mask() << self.shift
    }

    /// Read the field out of a register word
    pub const fn extract(&self, word: u32) -> u32 {
        (word >> self.shift) & self.value_mask()
    }

    /// Return `word` with the field replaced by `value`, masked to the field width
    pub const fn insert(&self, word: u32, value: u32) -> u32 {
        (word & !self.mask()) | ((value & self.value_mask()) << self.shift)
    }
}

/// The 40-byte register block
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RegisterBlock {
    bytes: [u8; BLOCK_SIZE],
}

impl RegisterBlock {
    /// Create a block with every register at its reset value
    pub fn new() -> Self {
        let mut block = Self {
            bytes: [0; BLOCK_SIZE],
        };
        for reg in Register::ALL {
            block.set_word(reg, reg.default_value());
        }
        block
    }

    /// Serialize the block
    pub fn read(&self) -> [u8; BLOCK_SIZE] {
        self.bytes
    }

    /// Deserialize a block, failing unless `bytes` is exactly 40 bytes long
    pub fn write(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; BLOCK_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::RegisterBlockSize { len: bytes.len() })?;
        Ok(Self { bytes })
    }

    /// Borrow the serialized bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Raw value of a register
    pub fn word(&self, reg: Register) -> u32 {
        let off = reg.index() * 4;
        u32::from_le_bytes([
            self.bytes[off],
            self.bytes[off + 1],
            self.bytes[off + 2],
            self.bytes[off + 3],
        ])
    }

    /// Overwrite a register with a raw value
    pub fn set_word(&mut self, reg: Register, value: u32) {
        let off = reg.index() * 4;
        self.bytes[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Value of a field
    pub fn get(&self, field: Field) -> u32 {
        field.extract(self.word(field.register))
    }

    /// Set a field; `value` is masked to the field width
    pub fn set(&mut self, field: Field, value: u32) {
        let word = field.insert(self.word(field.register), value);
        self.set_word(field.register, word);
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, field: Field, value: u32) -> Self {
        self.set(field, value);
        self
    }
}

impl Default for RegisterBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegisterBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for reg in Register::ALL {
            map.entry(&reg.name(), &format_args!("{:#010x}", self.word(reg)));
        }
        map.finish()
    }
}

impl fmt::Display for RegisterBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for reg in Register::ALL {
            writeln!(f, "{}: {:08x}", reg.name(), self.word(reg))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::fields::*;
    use super::*;

    #[test]
    fn test_default_block_bytes() {
        let block = RegisterBlock::new();
        assert_eq!(block.word(Register::TransferFormat), 0x0002_0780);
        assert_eq!(block.word(Register::Timing), 0x0000_02FF);
        assert_eq!(block.word(Register::Configuration), 0x0000_0066);
        assert_eq!(block.word(Register::Status), 0x0040_4000);
        assert_eq!(block.word(Register::TransferControl), 0);

        let bytes = block.read();
        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[4..8], &[0x80, 0x07, 0x02, 0x00]);
        assert_eq!(&bytes[28..32], &[0x00, 0x40, 0x40, 0x00]);
    }

    #[test]
    fn test_idle_status_from_layout() {
        assert_eq!(IDLE_STATUS, 0x0040_4000);
        let block = RegisterBlock::new();
        assert_eq!(block.get(status::RX_EMPTY), 1);
        assert_eq!(block.get(status::TX_EMPTY), 1);
        assert_eq!(block.get(status::SPI_ACTIVE), 0);
    }

    #[test]
    fn test_field_and_word_agree() {
        let mut block = RegisterBlock::new();
        block.set(transfer_control::TRANS_MODE, 0x5);
        block.set(transfer_control::WR_TRAN_CNT, 3);
        block.set(transfer_control::RD_TRAN_CNT, 15);
        assert_eq!(block.word(Register::TransferControl), 0x0500_300F);

        block.set_word(Register::TransferControl, 0x0300_1002);
        assert_eq!(block.get(transfer_control::TRANS_MODE), 0x3);
        assert_eq!(block.get(transfer_control::WR_TRAN_CNT), 1);
        assert_eq!(block.get(transfer_control::RD_TRAN_CNT), 2);
        assert_eq!(block.get(transfer_control::DUMMY_CNT), 0);
    }

    #[test]
    fn test_set_masks_to_width() {
        let mut block = RegisterBlock::new();
        block.set(transfer_control::DUMMY_CNT, 0xFF);
        assert_eq!(block.get(transfer_control::DUMMY_CNT), 0x3);
        // Neighbours untouched
        assert_eq!(block.get(transfer_control::RD_TRAN_CNT), 0);
        assert_eq!(block.get(transfer_control::TOKEN_VALUE), 0);

        block.set(address::ADDR, 0xDEAD_BEEF);
        assert_eq!(block.word(Register::Address), 0xDEAD_BEEF);
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut block = RegisterBlock::new();
        block.set(control::SPIRST, 1);
        block.set(timing::CS2SCLK, 2);
        block.set(command::CMD, 0x9F);
        block.set(status::TXNUM_HIGH, 3);

        let copy = RegisterBlock::write(&block.read()).unwrap();
        assert_eq!(copy, block);
        for reg in Register::ALL {
            for field in reg.fields() {
                assert_eq!(copy.get(*field), block.get(*field), "{}", field.name);
            }
        }
    }

    #[test]
    fn test_write_rejects_wrong_length() {
        assert_eq!(
            RegisterBlock::write(&[0u8; 39]),
            Err(Error::RegisterBlockSize { len: 39 })
        );
        assert!(RegisterBlock::write(&[0u8; 41]).is_err());
    }

    #[test]
    fn test_parse_device_dump() {
        let raw = [
            0x00, 0x00, 0x00, 0x00, 0x80, 0x07, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x66, 0x00, 0x00, 0x00,
            0x00, 0x40, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let block = RegisterBlock::write(&raw).unwrap();
        assert_eq!(block.get(transfer_format::ADDR_LEN), 2);
        assert_eq!(block.get(transfer_format::DATA_LEN), 7);
        assert_eq!(block.get(configuration::RX_FIFO_SIZE), 6);
        assert_eq!(block.word(Register::Status), IDLE_STATUS);
        assert_eq!(block.word(Register::Timing), 0);
    }

    #[test]
    fn test_fields_do_not_overlap() {
        for reg in Register::ALL {
            let mut seen = 0u32;
            for field in reg.fields() {
                assert_eq!(field.register, reg);
                assert_eq!(seen & field.mask(), 0, "{} overlaps", field.name);
                seen |= field.mask();
            }
        }
    }

    #[test]
    fn test_register_lookup() {
        assert_eq!(Register::from_index(7), Some(Register::Status));
        assert_eq!(Register::from_index(10), None);
        assert_eq!(
            Register::TransferControl.field("WrTranCnt"),
            Some(transfer_control::WR_TRAN_CNT)
        );
        assert_eq!(Register::Command.field("Bogus"), None);
    }
}
