//! Erase command implementation

use spiota_core::flash::SpiFlash;
use spiota_core::spi::opcodes::BLOCK_64K;
use spiota_core::transport::Transport;

use super::block_bar;

/// Number of 64 KiB blocks overlapping `start..start + length`
pub fn blocks_covering(start: u32, length: usize) -> usize {
    if length == 0 {
        return 0;
    }
    let block = BLOCK_64K as usize;
    let first = start as usize / block;
    let last = (start as usize + length - 1) / block;
    last - first + 1
}

/// Run the erase command
pub fn run_erase<T: Transport>(
    flash: &mut SpiFlash<T>,
    start: u32,
    length: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if start % BLOCK_64K != 0 || length % BLOCK_64K as usize != 0 {
        log::warn!(
            "Range 0x{:06X}+0x{:X} is not 64 KiB aligned; whole blocks will be erased",
            start,
            length
        );
    }
    erase_with_progress(flash, start, length)?;
    println!("Erase complete");
    Ok(())
}

/// Erase the blocks covering a range with a progress bar
pub fn erase_with_progress<T: Transport>(
    flash: &mut SpiFlash<T>,
    start: u32,
    length: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = block_bar(blocks_covering(start, length) as u64);
    flash.erase_range_cb(start, length, |done| pb.set_position(done as u64))?;
    pb.finish_with_message("Erase complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiota_dummy::{DummyBridge, DummyConfig};

    #[test]
    fn test_blocks_covering() {
        assert_eq!(blocks_covering(0, 0), 0);
        assert_eq!(blocks_covering(0, 1), 1);
        assert_eq!(blocks_covering(0, 0x10000), 1);
        assert_eq!(blocks_covering(0xFFFF, 2), 2);
        assert_eq!(blocks_covering(0x10000, 0x30000), 3);
    }

    #[test]
    fn test_erase_range() {
        let config = DummyConfig {
            size: 0x40000,
            ..DummyConfig::default()
        };
        let mut bridge = DummyBridge::with_data(config, &vec![0x00; 0x40000]);
        let mut flash = SpiFlash::new(&mut bridge);
        run_erase(&mut flash, 0x10000, 0x10000).unwrap();

        assert_eq!(bridge.chip_stats().erases, 1);
        assert!(bridge.data()[0x10000..0x20000].iter().all(|&b| b == 0xFF));
        assert_eq!(bridge.data()[0xFFFF], 0x00);
        assert_eq!(bridge.data()[0x20000], 0x00);
    }
}
