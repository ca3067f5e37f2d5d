//! SPI NOR flash controller
//!
//! Flash command set layered on the [`SpiEngine`]: every operation is one or
//! more single-opcode transactions. Mutating commands (erase, page program)
//! run inside a write-enable scope, see [`SpiFlash::with_write_enable`].

use bitflags::bitflags;

use crate::engine::SpiEngine;
use crate::error::{Error, Result};
use crate::profile::FlashProfile;
use crate::spi::{check_range, opcodes, SpiCommand};
use crate::transport::Transport;

bitflags! {
    /// Status register 1 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status1: u8 {
        /// Write In Progress / Busy
        const WIP  = opcodes::SR1_WIP;
        /// Write Enable Latch
        const WEL  = opcodes::SR1_WEL;
        /// Block Protect bit 0
        const BP0  = 0x04;
        /// Block Protect bit 1
        const BP1  = 0x08;
        /// Block Protect bit 2
        const BP2  = 0x10;
        /// Top/Bottom Protect
        const TB   = 0x20;
        /// Sector/Block Protect
        const SEC  = 0x40;
        /// Status Register Protect 0
        const SRP0 = 0x80;
    }
}

/// Which status register to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRegister {
    /// Status register 1 (RDSR, 0x05)
    Sr1,
    /// Status register 2 (0x35)
    Sr2,
    /// Status register 3 (0x15)
    Sr3,
}

impl StatusRegister {
    /// Read opcode of the register
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Sr1 => opcodes::RDSR,
            Self::Sr2 => opcodes::RDSR2,
            Self::Sr3 => opcodes::RDSR3,
        }
    }
}

/// Outcome of [`SpiFlash::program`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramStats {
    /// Pages sent to the chip
    pub pages_programmed: usize,
    /// Pages skipped because they were entirely 0xFF
    pub pages_skipped: usize,
    /// Bytes actually programmed
    pub bytes_programmed: usize,
}

/// SPI NOR flash behind the bridge
pub struct SpiFlash<T> {
    engine: SpiEngine<T>,
    profile: FlashProfile,
}

impl<T: Transport> SpiFlash<T> {
    /// Create a flash controller with the default profile
    pub fn new(transport: T) -> Self {
        let profile = FlashProfile::default();
        Self {
            engine: SpiEngine::with_timeout(transport, profile.timeout),
            profile,
        }
    }

    /// Create a flash controller with a caller-supplied profile
    pub fn with_profile(transport: T, profile: FlashProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            engine: SpiEngine::with_timeout(transport, profile.timeout),
            profile,
        })
    }

    /// Active profile
    pub fn profile(&self) -> &FlashProfile {
        &self.profile
    }

    /// Change the program page size
    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        let profile = self.profile.clone().with_page_size(page_size);
        profile.validate()?;
        self.profile = profile;
        Ok(())
    }

    /// Borrow the transaction engine
    pub fn engine(&self) -> &SpiEngine<T> {
        &self.engine
    }

    /// Mutably borrow the transaction engine, for raw transactions
    pub fn engine_mut(&mut self) -> &mut SpiEngine<T> {
        &mut self.engine
    }

    /// Give back the transport
    pub fn into_inner(self) -> T {
        self.engine.into_inner()
    }

    /// Reset the bridge's SPI controller
    pub fn reset(&mut self) -> Result<()> {
        self.engine.reset()
    }

    /// Read the 3-byte JEDEC ID
    pub fn read_id(&mut self) -> Result<[u8; 3]> {
        let id = self
            .engine
            .execute(&SpiCommand::read_reg(opcodes::RDID, opcodes::RDID_LEN))?;
        fixed(id)
    }

    /// Read the 16-byte unique ID
    pub fn read_uid(&mut self) -> Result<[u8; 16]> {
        let cmd = SpiCommand::read_reg(opcodes::RDUID, opcodes::RDUID_LEN)
            .with_dummy_cycles(opcodes::RDUID_DUMMY);
        fixed(self.engine.execute(&cmd)?)
    }

    /// Read one status register
    pub fn read_status(&mut self, reg: StatusRegister) -> Result<u8> {
        let data = self
            .engine
            .execute(&SpiCommand::read_reg(reg.opcode(), 1))?;
        let [value] = fixed(data)?;
        Ok(value)
    }

    /// Read status register 1
    pub fn read_status1(&mut self) -> Result<Status1> {
        self.read_status(StatusRegister::Sr1)
            .map(Status1::from_bits_retain)
    }

    /// Read `len` bytes starting at `addr`
    pub fn read_data(&mut self, addr: u32, len: usize) -> Result<Vec<u8>> {
        self.read_data_cb(addr, len, |_| {})
    }

    /// Read `len` bytes starting at `addr`, reporting bytes read so far
    pub fn read_data_cb<F: FnMut(usize)>(
        &mut self,
        addr: u32,
        len: usize,
        mut progress: F,
    ) -> Result<Vec<u8>> {
        check_range(addr, len)?;

        let mut data = Vec::with_capacity(len);
        let mut got = 0usize;
        while got < len {
            let need = core::cmp::min(len - got, self.profile.read_chunk);
            let cmd = SpiCommand::read_3b(opcodes::FAST_READ, addr + got as u32, need)
                .with_dummy_cycles(opcodes::FAST_READ_DUMMY);
            let chunk = self.engine.execute(&cmd)?;
            data.extend_from_slice(&chunk);
            got += need;
            progress(got);
        }

        if data.len() != len {
            return Err(Error::LengthAccounting {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// Run `op` with the write enable latch set
    ///
    /// Sends WREN, runs `op`, then waits for the chip to finish (WIP clear)
    /// and sends WRDI. The wait and WRDI run whether or not `op` succeeded;
    /// an error from `op` takes precedence over one from the release.
    pub fn with_write_enable<R, F>(&mut self, op: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        self.engine.execute(&SpiCommand::simple(opcodes::WREN))?;

        let result = op(self);
        let release = self.release_write_enable();

        match (result, release) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_err)) => {
                log::warn!("write disable after failed operation also failed: {}", release_err);
                Err(e)
            }
        }
    }

    fn release_write_enable(&mut self) -> Result<()> {
        self.wait_idle()?;
        self.engine.execute(&SpiCommand::simple(opcodes::WRDI))?;
        Ok(())
    }

    /// Poll status register 1 until WIP clears, returning the number of polls
    ///
    /// Waits forever unless the profile sets `busy_poll_limit`.
    pub fn wait_idle(&mut self) -> Result<u32> {
        let mut polls = 0u32;
        loop {
            let status = self.read_status1()?;
            polls += 1;
            if !status.contains(Status1::WIP) {
                log::trace!("WIP cleared after {} polls", polls);
                return Ok(polls);
            }
            if let Some(limit) = self.profile.busy_poll_limit {
                if polls >= limit {
                    return Err(Error::BusyTimeout { polls });
                }
            }
        }
    }

    /// Erase the 64 KiB block containing `addr`
    pub fn erase_64kb(&mut self, addr: u32) -> Result<()> {
        log::info!("erase 64KB 0x{:06X}", addr);
        self.with_write_enable(|flash| {
            flash
                .engine
                .execute(&SpiCommand::erase_3b(opcodes::BE_D8, addr))
                .map(drop)
        })
    }

    /// Erase every 64 KiB block overlapping `addr..addr + len`
    pub fn erase_range(&mut self, addr: u32, len: usize) -> Result<()> {
        self.erase_range_cb(addr, len, |_| {})
    }

    /// Erase every 64 KiB block overlapping `addr..addr + len`, reporting
    /// blocks erased so far
    pub fn erase_range_cb<F: FnMut(usize)>(
        &mut self,
        addr: u32,
        len: usize,
        mut progress: F,
    ) -> Result<()> {
        check_range(addr, len)?;
        if len == 0 {
            return Ok(());
        }

        let start = addr & !(opcodes::BLOCK_64K - 1);
        let end = addr + len as u32;
        let mut erased = 0usize;
        for block in (start..end).step_by(opcodes::BLOCK_64K as usize) {
            self.erase_64kb(block)?;
            erased += 1;
            progress(erased);
        }
        Ok(())
    }

    /// Program at most one page at `addr`
    pub fn program_page(&mut self, addr: u32, payload: &[u8]) -> Result<()> {
        if payload.len() > self.profile.page_size {
            return Err(Error::PageOverflow {
                len: payload.len(),
                page_size: self.profile.page_size,
            });
        }
        check_range(addr, payload.len())?;

        self.with_write_enable(|flash| {
            flash
                .engine
                .execute(&SpiCommand::write_3b(opcodes::PP, addr, payload))
                .map(drop)
        })
    }

    /// Program `payload` at `addr`, page by page, skipping blank pages
    pub fn program(&mut self, addr: u32, payload: &[u8]) -> Result<ProgramStats> {
        self.program_cb(addr, payload, |_| {})
    }

    /// Program `payload` at `addr`, reporting bytes consumed so far
    ///
    /// Pages that are entirely `0xFF` are already in the erased state and
    /// are not sent.
    pub fn program_cb<F: FnMut(usize)>(
        &mut self,
        addr: u32,
        payload: &[u8],
        mut progress: F,
    ) -> Result<ProgramStats> {
        check_range(addr, payload.len())?;

        let length = payload.len();
        let mut stats = ProgramStats::default();
        let mut programmed = 0usize;

        for chunk in payload.chunks(self.profile.page_size) {
            let page_addr = addr + programmed as u32;
            if chunk.iter().all(|&b| b == 0xFF) {
                log::debug!("skip 0x{:06X}", page_addr);
                stats.pages_skipped += 1;
            } else {
                log::debug!(
                    "[{:.2}%] program 0x{:06X}",
                    100.0 * programmed as f64 / length as f64,
                    page_addr
                );
                self.program_page(page_addr, chunk)?;
                stats.pages_programmed += 1;
                stats.bytes_programmed += chunk.len();
            }
            programmed += chunk.len();
            progress(programmed);
        }

        if programmed != length {
            return Err(Error::LengthAccounting {
                expected: length,
                actual: programmed,
            });
        }
        Ok(stats)
    }

    /// Read back `expected.len()` bytes at `addr` and compare
    pub fn verify(&mut self, addr: u32, expected: &[u8]) -> Result<()> {
        self.verify_cb(addr, expected, |_| {})
    }

    /// Verify with progress reporting of bytes read
    pub fn verify_cb<F: FnMut(usize)>(
        &mut self,
        addr: u32,
        expected: &[u8],
        progress: F,
    ) -> Result<()> {
        let actual = self.read_data_cb(addr, expected.len(), progress)?;
        match expected.iter().zip(&actual).position(|(a, b)| a != b) {
            Some(i) => Err(Error::VerifyMismatch {
                addr: addr + i as u32,
                expected: expected[i],
                found: actual[i],
            }),
            None => Ok(()),
        }
    }
}

/// Convert a read result into a fixed-size array
fn fixed<const N: usize>(data: Vec<u8>) -> Result<[u8; N]> {
    data.try_into().map_err(|v: Vec<u8>| Error::LengthAccounting {
        expected: N,
        actual: v.len(),
    })
}
