//! Bit-field layout of the bridge SPI controller registers
//!
//! Bit positions are the hardware's; a wrong shift or width here silently
//! misconfigures the controller. Reserved bits have no field and stay zero.
//!
//! Each register module also exports `DEFAULT`, its reset value composed
//! from the per-field defaults, and `FIELDS`, the fields in bit order.

use super::{Field, Register};

/// Control register: resets and DMA/FIFO thresholds
pub mod control {
    use super::*;

    /// SPI reset (auto-clearing)
    pub const SPIRST: Field = Field::new(Register::Control, "SPIRST", 0, 1);
    /// RX FIFO reset (auto-clearing)
    pub const RXFIFORST: Field = Field::new(Register::Control, "RXFIFORST", 1, 1);
    /// TX FIFO reset (auto-clearing)
    pub const TXFIFORST: Field = Field::new(Register::Control, "TXFIFORST", 2, 1);
    /// RX DMA enable
    pub const RXDMAEN: Field = Field::new(Register::Control, "RXDMAEN", 3, 1);
    /// TX DMA enable
    pub const TXDMAEN: Field = Field::new(Register::Control, "TXDMAEN", 4, 1);
    /// RX FIFO threshold
    pub const RXTHRES: Field = Field::new(Register::Control, "RXTHRES", 8, 8);
    /// TX FIFO threshold
    pub const TXTHRES: Field = Field::new(Register::Control, "TXTHRES", 16, 8);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[SPIRST, RXFIFORST, TXFIFORST, RXDMAEN, TXDMAEN, RXTHRES, TXTHRES];
    /// Reset value
    pub const DEFAULT: u32 = 0;
}

/// Transfer format register: frame shape of every SPI transfer
pub mod transfer_format {
    use super::*;

    /// Clock phase
    pub const CPHA: Field = Field::new(Register::TransferFormat, "CPHA", 0, 1);
    /// Clock polarity
    pub const CPOL: Field = Field::new(Register::TransferFormat, "CPOL", 1, 1);
    /// Slave mode
    pub const SLV_MODE: Field = Field::new(Register::TransferFormat, "SlvMode", 2, 1);
    /// LSB-first bit order
    pub const LSB: Field = Field::new(Register::TransferFormat, "LSB", 3, 1);
    /// Bidirectional MOSI
    pub const MOSI_BIDIR: Field = Field::new(Register::TransferFormat, "MOSIBiDir", 4, 1);
    /// Data merge mode
    pub const DATA_MERGE: Field = Field::new(Register::TransferFormat, "DataMerge", 7, 1);
    /// Data unit length minus one, in bits
    pub const DATA_LEN: Field = Field::new(Register::TransferFormat, "DataLen", 8, 5);
    /// Address length minus one, in bytes
    pub const ADDR_LEN: Field = Field::new(Register::TransferFormat, "AddrLen", 16, 2);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[
        CPHA, CPOL, SLV_MODE, LSB, MOSI_BIDIR, DATA_MERGE, DATA_LEN, ADDR_LEN,
    ];
    /// Merged 8-bit data units, 3-byte addresses
    pub const DEFAULT: u32 = ADDR_LEN.insert(DATA_LEN.insert(DATA_MERGE.insert(0, 1), 7), 2);
}

/// Transfer control register: shape and length of one transaction
pub mod transfer_control {
    use super::*;

    /// Read transfer count minus one
    pub const RD_TRAN_CNT: Field = Field::new(Register::TransferControl, "RdTranCnt", 0, 9);
    /// Dummy phase length minus one
    pub const DUMMY_CNT: Field = Field::new(Register::TransferControl, "DummyCnt", 9, 2);
    /// Token byte value select
    pub const TOKEN_VALUE: Field = Field::new(Register::TransferControl, "TokenValue", 11, 1);
    /// Write transfer count minus one
    pub const WR_TRAN_CNT: Field = Field::new(Register::TransferControl, "WrTranCnt", 12, 9);
    /// Token phase enable
    pub const TOKEN_EN: Field = Field::new(Register::TransferControl, "TokenEn", 21, 1);
    /// Dual/quad data phase
    pub const DUAL_QUAD: Field = Field::new(Register::TransferControl, "DualQuad", 22, 2);
    /// Transfer mode, see [`crate::engine::TransferMode`]
    pub const TRANS_MODE: Field = Field::new(Register::TransferControl, "TransMode", 24, 4);
    /// Address phase uses the data phase width
    pub const ADDR_FMT: Field = Field::new(Register::TransferControl, "AddrFmt", 28, 1);
    /// Address phase enable
    pub const ADDR_EN: Field = Field::new(Register::TransferControl, "AddrEn", 29, 1);
    /// Command phase enable
    pub const CMD_EN: Field = Field::new(Register::TransferControl, "CmdEn", 30, 1);
    /// Slave data-only mode
    pub const SLV_DATA_ONLY: Field = Field::new(Register::TransferControl, "SlvDataOnly", 31, 1);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[
        RD_TRAN_CNT,
        DUMMY_CNT,
        TOKEN_VALUE,
        WR_TRAN_CNT,
        TOKEN_EN,
        DUAL_QUAD,
        TRANS_MODE,
        ADDR_FMT,
        ADDR_EN,
        CMD_EN,
        SLV_DATA_ONLY,
    ];
    /// Reset value
    pub const DEFAULT: u32 = 0;
}

/// Interrupt enable register
pub mod interrupt_enable {
    use super::*;

    /// RX FIFO overrun interrupt enable
    pub const RX_FIFO_OR_INT_EN: Field = Field::new(Register::InterruptEnable, "RXFIFOORIntEn", 0, 1);
    /// TX FIFO underrun interrupt enable
    pub const TX_FIFO_UR_INT_EN: Field = Field::new(Register::InterruptEnable, "TXFIFOURIntEn", 1, 1);
    /// RX FIFO threshold interrupt enable
    pub const RX_FIFO_INT_EN: Field = Field::new(Register::InterruptEnable, "RXFIFOIntEn", 2, 1);
    /// TX FIFO threshold interrupt enable
    pub const TX_FIFO_INT_EN: Field = Field::new(Register::InterruptEnable, "TXFIFOIntEn", 3, 1);
    /// End of transfer interrupt enable
    pub const END_INT_EN: Field = Field::new(Register::InterruptEnable, "EndIntEn", 4, 1);
    /// Slave command interrupt enable
    pub const SLV_CMD_EN: Field = Field::new(Register::InterruptEnable, "SlvCmdEn", 5, 1);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[
        RX_FIFO_OR_INT_EN,
        TX_FIFO_UR_INT_EN,
        RX_FIFO_INT_EN,
        TX_FIFO_INT_EN,
        END_INT_EN,
        SLV_CMD_EN,
    ];
    /// Reset value
    pub const DEFAULT: u32 = 0;
}

/// Timing register: clock divider and chip-select timing
pub mod timing {
    use super::*;

    /// SCLK divider
    pub const SCLK_DIV: Field = Field::new(Register::Timing, "SCLK_DIV", 0, 8);
    /// CS hold time
    pub const CSHT: Field = Field::new(Register::Timing, "CSHT", 8, 4);
    /// CS to SCLK delay
    pub const CS2SCLK: Field = Field::new(Register::Timing, "CS2SCLK", 12, 2);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[SCLK_DIV, CSHT, CS2SCLK];
    /// Reset value
    pub const DEFAULT: u32 = CSHT.insert(SCLK_DIV.insert(0, 0xFF), 2);
}

/// Interrupt status register (write one to clear)
pub mod interrupt_status {
    use super::*;

    /// RX FIFO overrun
    pub const RX_FIFO_OR_INT: Field = Field::new(Register::InterruptStatus, "RXFIFOORInt", 0, 1);
    /// TX FIFO underrun
    pub const TX_FIFO_UR_INT: Field = Field::new(Register::InterruptStatus, "TXFIFOURInt", 1, 1);
    /// RX FIFO reached its threshold
    pub const RX_FIFO_INT: Field = Field::new(Register::InterruptStatus, "RXFIFOInt", 2, 1);
    /// TX FIFO reached its threshold
    pub const TX_FIFO_INT: Field = Field::new(Register::InterruptStatus, "TXFIFOInt", 3, 1);
    /// Transfer finished
    pub const END_INT: Field = Field::new(Register::InterruptStatus, "EndInt", 4, 1);
    /// Slave command received
    pub const SLV_CMD_INT: Field = Field::new(Register::InterruptStatus, "SlvCmdInt", 5, 1);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[
        RX_FIFO_OR_INT,
        TX_FIFO_UR_INT,
        RX_FIFO_INT,
        TX_FIFO_INT,
        END_INT,
        SLV_CMD_INT,
    ];
    /// Reset value
    pub const DEFAULT: u32 = 0;
}

/// Configuration register: controller capabilities (read-only on hardware)
pub mod configuration {
    use super::*;

    /// RX FIFO depth (log2 of words)
    pub const RX_FIFO_SIZE: Field = Field::new(Register::Configuration, "RxFIFOSize", 0, 4);
    /// TX FIFO depth (log2 of words)
    pub const TX_FIFO_SIZE: Field = Field::new(Register::Configuration, "TxFIFOSize", 4, 4);
    /// Dual SPI supported
    pub const DUAL_SPI: Field = Field::new(Register::Configuration, "DualSPI", 8, 1);
    /// Quad SPI supported
    pub const QUAD_SPI: Field = Field::new(Register::Configuration, "QuadSPI", 9, 1);
    /// Direct IO control supported
    pub const DIRECT_IO: Field = Field::new(Register::Configuration, "DirectIO", 11, 1);
    /// AHB memory-mapped interface present
    pub const AHB_MEM: Field = Field::new(Register::Configuration, "AHBMem", 12, 1);
    /// EILM memory-mapped interface present
    pub const EILM_MEM: Field = Field::new(Register::Configuration, "EILMMem", 13, 1);
    /// Slave mode supported
    pub const SLAVE: Field = Field::new(Register::Configuration, "Slave", 14, 1);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[
        RX_FIFO_SIZE,
        TX_FIFO_SIZE,
        DUAL_SPI,
        QUAD_SPI,
        DIRECT_IO,
        AHB_MEM,
        EILM_MEM,
        SLAVE,
    ];
    /// Reset value
    pub const DEFAULT: u32 = TX_FIFO_SIZE.insert(RX_FIFO_SIZE.insert(0, 6), 6);
}

/// Status register: controller activity and FIFO levels
pub mod status {
    use super::*;

    /// A transfer is in progress
    pub const SPI_ACTIVE: Field = Field::new(Register::Status, "SPIActive", 0, 1);
    /// RX FIFO entries, bits 5:0
    pub const RXNUM_LOW: Field = Field::new(Register::Status, "RXNUM_low", 8, 6);
    /// RX FIFO empty
    pub const RX_EMPTY: Field = Field::new(Register::Status, "RXEMPTY", 14, 1);
    /// RX FIFO full
    pub const RX_FULL: Field = Field::new(Register::Status, "RXFULL", 15, 1);
    /// TX FIFO entries, bits 5:0
    pub const TXNUM_LOW: Field = Field::new(Register::Status, "TXNUM_low", 16, 6);
    /// TX FIFO empty
    pub const TX_EMPTY: Field = Field::new(Register::Status, "TXEMPTY", 22, 1);
    /// TX FIFO full
    pub const TX_FULL: Field = Field::new(Register::Status, "TXFULL", 23, 1);
    /// RX FIFO entries, bits 7:6
    pub const RXNUM_HIGH: Field = Field::new(Register::Status, "RXNUM_high", 24, 2);
    /// TX FIFO entries, bits 7:6
    pub const TXNUM_HIGH: Field = Field::new(Register::Status, "TXNUM_high", 28, 2);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[
        SPI_ACTIVE, RXNUM_LOW, RX_EMPTY, RX_FULL, TXNUM_LOW, TX_EMPTY, TX_FULL, RXNUM_HIGH,
        TXNUM_HIGH,
    ];
    /// Both FIFOs empty, nothing active
    pub const DEFAULT: u32 = TX_EMPTY.insert(RX_EMPTY.insert(0, 1), 1);
}

/// Address register (master mode only)
pub mod address {
    use super::*;

    /// SPI address phase value
    pub const ADDR: Field = Field::new(Register::Address, "ADDR", 0, 32);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[ADDR];
    /// Reset value
    pub const DEFAULT: u32 = 0;
}

/// Command register
pub mod command {
    use super::*;

    /// SPI command phase value
    pub const CMD: Field = Field::new(Register::Command, "CMD", 0, 8);

    /// Fields in bit order
    pub const FIELDS: &[Field] = &[CMD];
    /// Reset value
    pub const DEFAULT: u32 = 0;
}
