//! SPI transaction engine
//!
//! Executes exactly one SPI bus transaction per call. The bridge controller
//! only knows a handful of transfer shapes, so a request of
//! (write bytes, read length, dummy cycles) is classified into one of them
//! by [`TransferPlan`], written into a fresh [`RegisterBlock`], and sent as a
//! `SET_REGISTER` packet together with the write bytes. Reads are collected
//! with `READ_DATA`, and every transaction ends with a `READ_REGISTER`
//! round trip to confirm the controller went back to idle.
//!
//! ## Cycle accounting
//!
//! The write path only takes multiples of 4 bytes, so write data is padded
//! with `0xFF`. When a read follows, those padding bytes are clocked out
//! anyway and double as dummy cycles:
//!
//! - `dummy <= padding`: plain write-then-read, the write counter is
//!   stretched by `dummy`
//! - `dummy > padding`: write-dummy-read, the write counter absorbs the
//!   padding and the explicit dummy phase covers the rest
//!
//! All counters are stored minus one.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::packet::{self, Command};
use crate::regs::fields::{control, transfer_control};
use crate::regs::{Register, RegisterBlock, BLOCK_SIZE, IDLE_STATUS};
use crate::spi::SpiCommand;
use crate::transport::Transport;

/// Default timeout for every USB transfer
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Fill byte used to align write payloads
pub const PAD_BYTE: u8 = 0xFF;

/// Largest byte count a 9-bit transfer counter can describe
pub const MAX_TRANSFER_COUNT: usize = 1 << 9;

/// Largest dummy phase (2-bit counter, stored minus one)
const MAX_DUMMY_CNT: u32 = 3;

/// Transfer shapes supported by the controller (TransMode field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransferMode {
    /// Write phase followed directly by read phase
    WriteRead = 0x3,
    /// Write phase only
    WriteOnly = 0x1,
    /// Read phase only
    ReadOnly = 0x2,
    /// Write phase, explicit dummy phase, read phase
    WriteDummyRead = 0x5,
    /// No data phase
    None = 0x7,
}

impl TransferMode {
    /// Value of the TransMode field
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Decode a TransMode field value
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x3 => Some(Self::WriteRead),
            0x1 => Some(Self::WriteOnly),
            0x2 => Some(Self::ReadOnly),
            0x5 => Some(Self::WriteDummyRead),
            0x7 => Some(Self::None),
            _ => None,
        }
    }
}

/// Classified shape and counters of one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    /// Transfer mode
    pub mode: TransferMode,
    /// WrTranCnt field (write cycles minus one)
    pub wr_tran_cnt: u32,
    /// RdTranCnt field (read bytes minus one)
    pub rd_tran_cnt: u32,
    /// DummyCnt field (explicit dummy phase minus one)
    pub dummy_cnt: u32,
    /// Fill bytes appended to reach 4-byte alignment
    pub padding: usize,
}

/// Counter field value (length minus one) for a non-empty phase
fn tran_cnt(phase: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len - 1).map_err(|_| Error::TransferTooLong {
        phase,
        len,
        max: MAX_TRANSFER_COUNT,
    })
}

impl TransferPlan {
    /// Classify a transaction
    ///
    /// Returns `Ok(None)` when there is nothing to transfer.
    pub fn new(wr_len: usize, rd_len: usize, dummy: u32) -> Result<Option<Self>> {
        let padding = padding_for(wr_len);

        if wr_len == 0 && rd_len == 0 {
            return Ok(None);
        }

        let mut plan = Self {
            mode: TransferMode::None,
            wr_tran_cnt: 0,
            rd_tran_cnt: 0,
            dummy_cnt: 0,
            padding,
        };

        if rd_len == 0 {
            plan.mode = TransferMode::WriteOnly;
            plan.wr_tran_cnt = tran_cnt("write", wr_len)?;
        } else if wr_len == 0 {
            plan.mode = TransferMode::ReadOnly;
            plan.rd_tran_cnt = tran_cnt("read", rd_len)?;
        } else {
            plan.wr_tran_cnt = tran_cnt("write", wr_len)?;
            plan.rd_tran_cnt = tran_cnt("read", rd_len)?;

            if dummy == 0 || dummy as usize <= padding {
                plan.mode = TransferMode::WriteRead;
                plan.wr_tran_cnt = plan.wr_tran_cnt.saturating_add(dummy);
            } else {
                plan.mode = TransferMode::WriteDummyRead;
                plan.dummy_cnt = dummy - 1 - padding as u32;
                plan.wr_tran_cnt = plan.wr_tran_cnt.saturating_add(padding as u32);
            }
        }

        plan.check_limits()?;
        Ok(Some(plan))
    }

    fn check_limits(&self) -> Result<()> {
        let max = MAX_TRANSFER_COUNT as u32;
        if self.wr_tran_cnt >= max {
            return Err(Error::TransferTooLong {
                phase: "write",
                len: self.wr_tran_cnt as usize + 1,
                max: MAX_TRANSFER_COUNT,
            });
        }
        if self.rd_tran_cnt >= max {
            return Err(Error::TransferTooLong {
                phase: "read",
                len: self.rd_tran_cnt as usize + 1,
                max: MAX_TRANSFER_COUNT,
            });
        }
        if self.dummy_cnt > MAX_DUMMY_CNT {
            return Err(Error::TransferTooLong {
                phase: "dummy",
                len: self.dummy_cnt as usize + 1,
                max: MAX_DUMMY_CNT as usize + 1,
            });
        }
        Ok(())
    }

    /// True when the transaction has a read phase
    pub fn reads(&self) -> bool {
        matches!(
            self.mode,
            TransferMode::ReadOnly | TransferMode::WriteRead | TransferMode::WriteDummyRead
        )
    }

    /// Number of bytes the read phase returns
    pub fn read_len(&self) -> usize {
        if self.reads() {
            self.rd_tran_cnt as usize + 1
        } else {
            0
        }
    }

    /// Write the plan into the TransferControl register
    pub fn apply(&self, block: &mut RegisterBlock) {
        block.set(transfer_control::TRANS_MODE, self.mode.code());
        block.set(transfer_control::WR_TRAN_CNT, self.wr_tran_cnt);
        block.set(transfer_control::RD_TRAN_CNT, self.rd_tran_cnt);
        block.set(transfer_control::DUMMY_CNT, self.dummy_cnt);
    }
}

/// Fill bytes needed to round `len` up to a multiple of 4
pub const fn padding_for(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Drives the bridge's SPI controller one transaction at a time
pub struct SpiEngine<T> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> SpiEngine<T> {
    /// Create an engine with the default 1 s transfer timeout
    pub fn new(transport: T) -> Self {
        Self::with_timeout(transport, DEFAULT_TIMEOUT)
    }

    /// Create an engine with a custom per-transfer timeout
    pub fn with_timeout(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Per-transfer timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the per-transfer timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Reset the controller and both FIFOs
    pub fn reset(&mut self) -> Result<()> {
        let block = RegisterBlock::new()
            .with(transfer_control::TRANS_MODE, TransferMode::None.code())
            .with(control::SPIRST, 1)
            .with(control::RXFIFORST, 1)
            .with(control::TXFIFORST, 1);
        log::debug!("Resetting SPI controller");
        self.set_register(&block, &[])
    }

    /// Run one flash command
    pub fn execute(&mut self, cmd: &SpiCommand<'_>) -> Result<Vec<u8>> {
        let write = cmd.encode()?;
        self.xfer(&write, cmd.read_len, cmd.dummy_cycles)
    }

    /// Run one SPI transaction: write `write`, wait `dummy` cycles, read
    /// `read_len` bytes
    pub fn xfer(&mut self, write: &[u8], read_len: usize, dummy: u32) -> Result<Vec<u8>> {
        let Some(plan) = TransferPlan::new(write.len(), read_len, dummy)? else {
            return Ok(Vec::new());
        };
        log::debug!(
            "SPI xfer: wr={} rd={} dummy={} -> {:?}",
            write.len(),
            read_len,
            dummy,
            plan
        );

        let mut payload = Vec::with_capacity(write.len() + plan.padding);
        payload.extend_from_slice(write);
        payload.resize(write.len() + plan.padding, PAD_BYTE);

        let mut block = RegisterBlock::new();
        plan.apply(&mut block);
        self.set_register(&block, &payload)?;

        let data = if plan.reads() {
            self.read_data(plan.read_len())?
        } else {
            Vec::new()
        };

        let status = self.read_register()?.word(Register::Status);
        if status != IDLE_STATUS {
            return Err(Error::StatusMismatch {
                expected: IDLE_STATUS,
                found: status,
            });
        }

        Ok(data)
    }

    /// Send a register block followed by `payload` as `SET_REGISTER`
    pub fn set_register(&mut self, block: &RegisterBlock, payload: &[u8]) -> Result<()> {
        let mut body = Vec::with_capacity(BLOCK_SIZE + payload.len());
        body.extend_from_slice(block.as_bytes());
        body.extend_from_slice(payload);
        log::trace!("SET_REGISTER:\n{}", block);
        self.send(Command::SetRegister, &body)
    }

    /// Read back the controller's register block
    pub fn read_register(&mut self) -> Result<RegisterBlock> {
        self.send(Command::ReadRegister, &[])?;
        let raw = self.transport.read(BLOCK_SIZE, self.timeout)?;
        let block = RegisterBlock::write(&raw)?;
        log::trace!("READ_REGISTER:\n{}", block);
        Ok(block)
    }

    /// Fetch `len` bytes captured by the last read phase
    pub fn read_data(&mut self, len: usize) -> Result<Vec<u8>> {
        self.send(Command::ReadData, &[])?;
        let data = self.transport.read(len, self.timeout)?;
        log::trace!("READ_DATA: {} of {} bytes", data.len(), len);
        Ok(data)
    }

    fn send(&mut self, command: Command, body: &[u8]) -> Result<()> {
        let raw = packet::encode(command.code(), body);
        let written = self.transport.write(&raw, self.timeout)?;
        if written != raw.len() {
            return Err(Error::ShortWrite {
                written,
                expected: raw.len(),
            });
        }
        Ok(())
    }
}
