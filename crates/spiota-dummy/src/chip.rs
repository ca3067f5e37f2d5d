//! NOR flash chip model
//!
//! The chip sees one chip-select cycle at a time as the raw MOSI byte
//! stream and answers with the MISO stream of the same length. Program and
//! erase take effect at the end of the cycle, the way a real part latches
//! them on CS# rising.

use spiota_core::spi::opcodes;

use crate::DummyConfig;

/// Page size of the page program wrap-around
const PAGE_SIZE: usize = 256;

/// Counters of what the chip has been asked to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChipStats {
    /// Page programs executed
    pub page_programs: usize,
    /// Sector and block erases executed
    pub erases: usize,
    /// Program/erase commands dropped because WEL was clear
    pub rejected_writes: usize,
    /// Status register 1 reads
    pub status_reads: usize,
}

pub(crate) struct DummyChip {
    config: DummyConfig,
    data: Vec<u8>,
    write_enabled: bool,
    busy_remaining: u32,
    status_reg2: u8,
    status_reg3: u8,
    stats: ChipStats,
}

impl DummyChip {
    pub(crate) fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            write_enabled: false,
            busy_remaining: 0,
            status_reg2: 0,
            status_reg3: 0,
            stats: ChipStats::default(),
        }
    }

    pub(crate) fn config(&self) -> &DummyConfig {
        &self.config
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub(crate) fn stats(&self) -> ChipStats {
        self.stats
    }

    fn status1(&self) -> u8 {
        let mut sr1 = 0;
        if self.busy_remaining > 0 {
            sr1 |= opcodes::SR1_WIP;
        }
        if self.write_enabled {
            sr1 |= opcodes::SR1_WEL;
        }
        sr1
    }

    /// Run one chip-select cycle
    pub(crate) fn exchange(&mut self, mosi: &[u8]) -> Vec<u8> {
        let mut miso = vec![0xFF; mosi.len()];
        let Some(&opcode) = mosi.first() else {
            return miso;
        };

        if self.busy_remaining > 0 && opcode != opcodes::RDSR {
            log::warn!("dummy: opcode 0x{:02X} ignored while busy", opcode);
            return miso;
        }

        match opcode {
            opcodes::RDID => {
                let id = self.config.jedec_id;
                fill_from(&mut miso, 1, &id);
            }
            opcodes::RDUID => {
                let uid = self.config.unique_id;
                fill_from(&mut miso, 1 + opcodes::RDUID_DUMMY as usize, &uid);
            }
            opcodes::RDSR => {
                let sr1 = self.status1();
                self.stats.status_reads += 1;
                miso[1..].fill(sr1);
                self.tick_busy();
            }
            opcodes::RDSR2 => miso[1..].fill(self.status_reg2),
            opcodes::RDSR3 => miso[1..].fill(self.status_reg3),
            opcodes::WREN => self.write_enabled = true,
            opcodes::WRDI => self.write_enabled = false,
            opcodes::READ => self.handle_read(mosi, &mut miso, 4),
            opcodes::FAST_READ => {
                self.handle_read(mosi, &mut miso, 4 + opcodes::FAST_READ_DUMMY as usize)
            }
            opcodes::PP => self.handle_page_program(mosi),
            opcodes::SE_20 => self.handle_erase(mosi, 4 * 1024),
            opcodes::BE_D8 => self.handle_erase(mosi, opcodes::BLOCK_64K as usize),
            _ => log::warn!("dummy: unsupported opcode 0x{:02X}", opcode),
        }

        miso
    }

    fn tick_busy(&mut self) {
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            if self.busy_remaining == 0 {
                self.write_enabled = false;
            }
        }
    }

    /// Start a program/erase cycle: busy for the configured number of polls,
    /// WEL drops when it ends
    fn start_busy(&mut self) {
        self.busy_remaining = self.config.busy_polls;
        if self.busy_remaining == 0 {
            self.write_enabled = false;
        }
    }

    fn address(&self, mosi: &[u8]) -> Option<usize> {
        let addr = mosi.get(1..4)?;
        let addr = (addr[0] as usize) << 16 | (addr[1] as usize) << 8 | addr[2] as usize;
        Some(addr % self.data.len())
    }

    fn handle_read(&self, mosi: &[u8], miso: &mut [u8], data_start: usize) {
        let Some(addr) = self.address(mosi) else {
            return;
        };
        let size = self.data.len();
        for (i, out) in miso.iter_mut().skip(data_start).enumerate() {
            *out = self.data[(addr + i) % size];
        }
    }

    fn handle_page_program(&mut self, mosi: &[u8]) {
        let Some(addr) = self.address(mosi) else {
            return;
        };
        if !self.write_enabled {
            log::warn!("dummy: page program at 0x{:06X} without WEL", addr);
            self.stats.rejected_writes += 1;
            return;
        }

        // Data wraps inside the addressed page; programming only clears bits.
        // A part smaller than a page wraps at its end.
        let page = addr & !(PAGE_SIZE - 1);
        let size = self.data.len();
        for (i, &byte) in mosi[4..].iter().enumerate() {
            let target = (page | ((addr + i) & (PAGE_SIZE - 1))) % size;
            self.data[target] &= byte;
        }

        self.stats.page_programs += 1;
        self.start_busy();
    }

    fn handle_erase(&mut self, mosi: &[u8], erase_size: usize) {
        let Some(addr) = self.address(mosi) else {
            return;
        };
        if !self.write_enabled {
            log::warn!("dummy: erase at 0x{:06X} without WEL", addr);
            self.stats.rejected_writes += 1;
            return;
        }

        let start = addr & !(erase_size - 1);
        let end = core::cmp::min(start + erase_size, self.data.len());
        self.data[start..end].fill(0xFF);

        self.stats.erases += 1;
        self.start_busy();
    }
}

/// Copy `src` into `dst` starting at `offset`, as far as it fits
fn fill_from(dst: &mut [u8], offset: usize, src: &[u8]) {
    for (out, &b) in dst.iter_mut().skip(offset).zip(src) {
        *out = b;
    }
}
