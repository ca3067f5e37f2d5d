//! spiota-dummy - In-memory bridge emulator for testing
//!
//! [`DummyBridge`] stands in for the USB bridge: it decodes the packets the
//! host sends, interprets the register block the way the bridge's SPI
//! controller does, and clocks the resulting byte stream through an
//! emulated NOR flash. It implements [`Transport`], so everything above
//! the USB layer runs unchanged against it.

mod chip;

use std::collections::VecDeque;
use std::time::Duration;

use spiota_core::engine::{TransferMode, PAD_BYTE};
use spiota_core::error::{Error, Result};
use spiota_core::packet::{self, Command};
use spiota_core::profile::parse_size;
use spiota_core::regs::fields::{control, transfer_control};
use spiota_core::regs::{Register, RegisterBlock, BLOCK_SIZE, IDLE_STATUS};
use spiota_core::transport::Transport;

pub use chip::ChipStats;
use chip::DummyChip;

/// Configuration for the emulated flash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyConfig {
    /// JEDEC ID returned by RDID
    pub jedec_id: [u8; 3],
    /// Unique ID returned by RDUID
    pub unique_id: [u8; 16],
    /// Flash size in bytes
    pub size: usize,
    /// RDSR polls reporting WIP after each program or erase
    pub busy_polls: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            jedec_id: [0xEF, 0x40, 0x18], // Winbond W25Q128
            unique_id: [
                0xD2, 0x65, 0x38, 0x41, 0x2F, 0x1B, 0x7C, 0x22, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00,
            ],
            size: 16 * 1024 * 1024,
            busy_polls: 2,
        }
    }
}

/// Errors from dummy programmer options
#[derive(Debug, thiserror::Error)]
pub enum DummyError {
    /// Option value could not be parsed
    #[error("Invalid dummy option {key}={value}: {reason}")]
    InvalidOption {
        /// Option name
        key: String,
        /// Offending value
        value: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Counters of bridge-level activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// SPI transactions started
    pub transactions: usize,
    /// Controller resets
    pub resets: usize,
    /// TX FIFO underruns (write counter larger than the payload)
    pub underruns: usize,
}

/// Emulated USB-to-SPI bridge with a NOR flash attached
pub struct DummyBridge {
    chip: DummyChip,
    regs: RegisterBlock,
    /// Bytes captured by the last read phase
    rx: Vec<u8>,
    /// Responses waiting for the host to read them
    responses: VecDeque<Vec<u8>>,
    stuck_status: Option<u32>,
    stats: BridgeStats,
}

impl DummyBridge {
    /// Create a bridge with an erased flash
    pub fn new(config: DummyConfig) -> Self {
        Self {
            chip: DummyChip::new(config),
            regs: RegisterBlock::new(),
            rx: Vec::new(),
            responses: VecDeque::new(),
            stuck_status: None,
            stats: BridgeStats::default(),
        }
    }

    /// Create a bridge with the default configuration (16 MiB W25Q128)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a bridge whose flash starts with `initial_data`
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut bridge = Self::new(config);
        let data = bridge.chip.data_mut();
        let len = core::cmp::min(initial_data.len(), data.len());
        data[..len].copy_from_slice(&initial_data[..len]);
        bridge
    }

    /// Flash contents
    pub fn data(&self) -> &[u8] {
        self.chip.data()
    }

    /// Mutable flash contents
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.chip.data_mut()
    }

    /// Flash configuration
    pub fn config(&self) -> &DummyConfig {
        self.chip.config()
    }

    /// Bridge counters
    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Flash counters
    pub fn chip_stats(&self) -> ChipStats {
        self.chip.stats()
    }

    /// Force the Status word reported by READ_REGISTER, `None` for normal
    /// behaviour
    pub fn set_stuck_status(&mut self, status: Option<u32>) {
        self.stuck_status = status;
    }

    fn set_register(&mut self, body: &[u8]) -> Result<()> {
        if body.len() < BLOCK_SIZE {
            return Err(Error::RegisterBlockSize { len: body.len() });
        }
        let (block, payload) = body.split_at(BLOCK_SIZE);
        let block = RegisterBlock::write(block)?;

        if block.get(control::SPIRST) != 0
            || block.get(control::RXFIFORST) != 0
            || block.get(control::TXFIFORST) != 0
        {
            log::debug!("dummy: controller reset");
            self.rx.clear();
            self.stats.resets += 1;
        }

        let mode = TransferMode::from_code(block.get(transfer_control::TRANS_MODE));
        let wr = block.get(transfer_control::WR_TRAN_CNT) as usize + 1;
        let rd = block.get(transfer_control::RD_TRAN_CNT) as usize + 1;
        let dummy = block.get(transfer_control::DUMMY_CNT) as usize + 1;

        let (write_len, idle_len, read_len) = match mode {
            Some(TransferMode::WriteOnly) => (wr, 0, 0),
            Some(TransferMode::ReadOnly) => (0, 0, rd),
            Some(TransferMode::WriteRead) => (wr, 0, rd),
            Some(TransferMode::WriteDummyRead) => (wr, dummy, rd),
            Some(TransferMode::None) | None => {
                self.regs = block;
                return Ok(());
            }
        };

        if payload.len() % 4 != 0 {
            log::warn!("dummy: unaligned write payload of {} bytes", payload.len());
        }
        if payload.len() < write_len {
            log::warn!(
                "dummy: TX underrun, counter says {} bytes but only {} sent",
                write_len,
                payload.len()
            );
            self.stats.underruns += 1;
        }

        let mut mosi = Vec::with_capacity(write_len + idle_len + read_len);
        mosi.extend_from_slice(&payload[..core::cmp::min(write_len, payload.len())]);
        mosi.resize(write_len + idle_len + read_len, PAD_BYTE);

        let miso = self.chip.exchange(&mosi);
        self.rx = miso[write_len + idle_len..].to_vec();
        self.regs = block;
        self.stats.transactions += 1;
        Ok(())
    }

    fn register_snapshot(&self) -> RegisterBlock {
        let mut block = self
            .regs
            .with(control::SPIRST, 0)
            .with(control::RXFIFORST, 0)
            .with(control::TXFIFORST, 0);
        match self.stuck_status {
            Some(word) => block.set_word(Register::Status, word),
            None => block.set_word(Register::Status, IDLE_STATUS),
        }
        block
    }
}

impl Transport for DummyBridge {
    fn write(&mut self, data: &[u8], _timeout: Duration) -> Result<usize> {
        let (command, body) = packet::decode(data)?;
        match Command::from_code(command) {
            Some(Command::SetRegister) => self.set_register(body)?,
            Some(Command::ReadRegister) => {
                let block = self.register_snapshot();
                self.responses.push_back(block.read().to_vec());
            }
            Some(Command::ReadData) => {
                let rx = std::mem::take(&mut self.rx);
                self.responses.push_back(rx);
            }
            None => log::warn!("dummy: ignoring unknown command 0x{:08X}", command),
        }
        Ok(data.len())
    }

    fn read(&mut self, max_len: usize, _timeout: Duration) -> Result<Vec<u8>> {
        let mut data = self.responses.pop_front().ok_or(Error::Timeout)?;
        data.truncate(max_len);
        Ok(data)
    }
}

/// Parse programmer options for the dummy bridge
///
/// Supported options:
/// - `size=<bytes>`: flash size, e.g. `16MiB` or `0x100000`
/// - `id=<hex>`: 3-byte JEDEC ID, e.g. `EF4018`
/// - `busy=<n>`: status polls reporting busy after each program or erase
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<DummyConfig, DummyError> {
    let mut config = DummyConfig::default();

    for &(key, value) in options {
        let invalid = |reason: String| DummyError::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };
        match key {
            "size" => {
                let size = parse_size(value).map_err(invalid)?;
                if size == 0 || size > (1 << 24) {
                    return Err(invalid("must be 1..=16MiB".into()));
                }
                config.size = size as usize;
            }
            "id" => {
                let hex = value.trim_start_matches("0x");
                let id = u32::from_str_radix(hex, 16).map_err(|e| invalid(e.to_string()))?;
                if hex.len() != 6 {
                    return Err(invalid("expected 3 bytes (6 hex digits)".into()));
                }
                let [_, a, b, c] = id.to_be_bytes();
                config.jedec_id = [a, b, c];
            }
            "busy" => {
                config.busy_polls = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            }
            _ => log::warn!("Unknown dummy option: {}={}", key, value),
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiota_core::flash::{SpiFlash, Status1};
    use spiota_core::profile::FlashProfile;
    use spiota_core::regs::fields::status;

    fn small() -> DummyConfig {
        DummyConfig {
            size: 0x40000,
            ..DummyConfig::default()
        }
    }

    #[test]
    fn test_probe() {
        let mut bridge = DummyBridge::new(small());
        let mut flash = SpiFlash::new(&mut bridge);
        flash.reset().unwrap();
        assert_eq!(flash.read_id().unwrap(), [0xEF, 0x40, 0x18]);
        assert_eq!(flash.read_uid().unwrap(), DummyConfig::default().unique_id);
        assert_eq!(bridge.stats().resets, 1);
    }

    #[test]
    fn test_erase_then_read_blank() {
        let mut bridge = DummyBridge::with_data(small(), &vec![0x00; 0x40000]);
        let mut flash = SpiFlash::new(&mut bridge);
        flash.erase_64kb(0x010000).unwrap();
        let data = flash.read_data(0x010000, 0x400).unwrap();
        assert!(data.iter().all(|&b| b == 0xFF));
        // Neighbouring blocks untouched
        assert_eq!(flash.read_data(0x00FFFF, 1).unwrap(), [0x00]);
        assert_eq!(flash.read_data(0x020000, 1).unwrap(), [0x00]);
        // WRDI ran after the erase
        assert_eq!(flash.read_status1().unwrap(), Status1::empty());
    }

    #[test]
    fn test_program_then_read_back() {
        let image: Vec<u8> = (0..0x333u32).map(|i| (i * 13 + 5) as u8).collect();
        let mut bridge = DummyBridge::new(small());
        let mut flash = SpiFlash::new(&mut bridge);
        flash.program(0x1000, &image).unwrap();
        assert_eq!(flash.read_data(0x1000, image.len()).unwrap(), image);
        flash.verify(0x1000, &image).unwrap();
        assert_eq!(bridge.chip_stats().page_programs, 4);
        assert_eq!(bridge.chip_stats().rejected_writes, 0);
    }

    #[test]
    fn test_blank_pages_not_programmed() {
        let mut image = vec![0xFF; 0x400];
        image[0x250] = 0x5A;
        let mut bridge = DummyBridge::new(small());
        let mut flash = SpiFlash::new(&mut bridge);
        let stats = flash.program(0, &image).unwrap();
        assert_eq!(stats.pages_programmed, 1);
        assert_eq!(stats.pages_skipped, 3);
        assert_eq!(bridge.chip_stats().page_programs, 1);
        assert_eq!(bridge.data()[0x250], 0x5A);
    }

    #[test]
    fn test_program_without_erase_ands_bits() {
        let mut bridge = DummyBridge::with_data(small(), &[0xF0; 4]);
        let mut flash = SpiFlash::new(&mut bridge);
        flash.program(0, &[0x3C; 4]).unwrap();
        assert_eq!(
            flash.verify(0, &[0x3C; 4]),
            Err(Error::VerifyMismatch {
                addr: 0,
                expected: 0x3C,
                found: 0x30
            })
        );
    }

    #[test]
    fn test_erase_range_covers_partial_blocks() {
        let mut bridge = DummyBridge::with_data(small(), &vec![0x00; 0x40000]);
        let mut flash = SpiFlash::new(&mut bridge);
        flash.erase_range(0x00F000, 0x2000).unwrap();
        assert_eq!(bridge.chip_stats().erases, 2);
        assert!(bridge.data()[..0x20000].iter().all(|&b| b == 0xFF));
        assert_eq!(bridge.data()[0x20000], 0x00);
    }

    #[test]
    fn test_busy_poll_limit_against_slow_chip() {
        let config = DummyConfig {
            busy_polls: 10,
            ..small()
        };
        let mut bridge = DummyBridge::new(config);
        let profile = FlashProfile::new().with_busy_poll_limit(Some(4));
        let mut flash = SpiFlash::with_profile(&mut bridge, profile).unwrap();
        assert_eq!(flash.erase_64kb(0), Err(Error::BusyTimeout { polls: 4 }));
    }

    #[test]
    fn test_busy_wait_counts_polls() {
        let config = DummyConfig {
            busy_polls: 3,
            ..small()
        };
        let mut bridge = DummyBridge::new(config);
        let mut flash = SpiFlash::new(&mut bridge);
        flash.erase_64kb(0).unwrap();
        // 3 busy answers then one idle
        assert_eq!(bridge.chip_stats().status_reads, 4);
    }

    #[test]
    fn test_stuck_status_is_reported() {
        let mut bridge = DummyBridge::new(small());
        bridge.set_stuck_status(Some(IDLE_STATUS | 1));
        let mut flash = SpiFlash::new(&mut bridge);
        assert_eq!(
            flash.read_id(),
            Err(Error::StatusMismatch {
                expected: IDLE_STATUS,
                found: IDLE_STATUS | 1
            })
        );
    }

    #[test]
    fn test_raw_packets() {
        let mut bridge = DummyBridge::new(small());
        let timeout = Duration::from_millis(10);

        // Nothing queued yet
        assert_eq!(bridge.read(BLOCK_SIZE, timeout), Err(Error::Timeout));

        let unknown = packet::encode(0x1234, &[]);
        assert_eq!(bridge.write(&unknown, timeout).unwrap(), unknown.len());

        let truncated = [0x00, 0x00, 0x02, 0x00, 0x08];
        assert_eq!(
            bridge.write(&truncated, timeout),
            Err(Error::MalformedPacket { len: 5 })
        );

        let rr = packet::encode(Command::ReadRegister.code(), &[]);
        bridge.write(&rr, timeout).unwrap();
        let block = RegisterBlock::write(&bridge.read(BLOCK_SIZE, timeout).unwrap()).unwrap();
        assert_eq!(block.word(Register::Status), IDLE_STATUS);
        assert_eq!(block.get(status::RX_EMPTY), 1);
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("size", "1MiB"), ("id", "C22017"), ("busy", "0")]).unwrap();
        assert_eq!(config.size, 0x100000);
        assert_eq!(config.jedec_id, [0xC2, 0x20, 0x17]);
        assert_eq!(config.busy_polls, 0);

        assert!(parse_options(&[("id", "EF40")]).is_err());
        assert!(parse_options(&[("size", "32MiB")]).is_err());
        assert!(parse_options(&[("busy", "-1")]).is_err());
    }

    #[test]
    fn test_odd_size_program_wraps() {
        let config = parse_options(&[("size", "100"), ("busy", "0")]).unwrap();
        assert_eq!(config.size, 100);
        let image: Vec<u8> = (0..100u8).map(|i| i ^ 0x5A).collect();
        let mut bridge = DummyBridge::new(config);
        let mut flash = SpiFlash::new(&mut bridge);
        flash.program(0x32, &image).unwrap();
        assert_eq!(flash.read_data(0x32, image.len()).unwrap(), image);
        assert_eq!(bridge.data()[0], 50 ^ 0x5A);
    }
}
