//! Write command implementation
//!
//! Update flow: reset the bridge, erase the 64 KiB blocks the image
//! covers, program it page by page (blank pages are skipped), then read
//! it back and compare.

use spiota_core::flash::{ProgramStats, SpiFlash};
use spiota_core::spi::check_range;
use spiota_core::transport::Transport;
use std::path::Path;

use super::erase::erase_with_progress;
use super::verify::verify_with_progress;
use super::{byte_bar, read_input};

/// Run the write command
pub fn run_write<T: Transport>(
    flash: &mut SpiFlash<T>,
    input: &Path,
    start: u32,
    do_erase: bool,
    do_verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_input(input)?;
    let stats = write_image(flash, start, &data, do_erase, do_verify)?;

    println!(
        "Programmed {} pages ({} bytes), skipped {} blank pages",
        stats.pages_programmed, stats.bytes_programmed, stats.pages_skipped
    );
    Ok(())
}

/// Erase, program and verify `data` at `start`
pub fn write_image<T: Transport>(
    flash: &mut SpiFlash<T>,
    start: u32,
    data: &[u8],
    do_erase: bool,
    do_verify: bool,
) -> Result<ProgramStats, Box<dyn std::error::Error>> {
    check_range(start, data.len())?;

    flash.reset()?;

    if do_erase {
        erase_with_progress(flash, start, data.len())?;
    }

    let pb = byte_bar(data.len() as u64, "Writing");
    let stats = flash.program_cb(start, data, |done| pb.set_position(done as u64))?;
    pb.finish_with_message("Write complete");

    if do_verify {
        verify_with_progress(flash, start, data)?;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_util::scratch_path;
    use spiota_dummy::{DummyBridge, DummyConfig};

    fn config() -> DummyConfig {
        DummyConfig {
            size: 0x40000,
            ..DummyConfig::default()
        }
    }

    #[test]
    fn test_write_over_old_contents() {
        let mut bridge = DummyBridge::with_data(config(), &vec![0x00; 0x40000]);
        let mut flash = SpiFlash::new(&mut bridge);

        let mut image = vec![0xFF; 0x1800];
        image[..0x300].iter_mut().enumerate().for_each(|(i, b)| *b = i as u8);

        let path = scratch_path("write.bin");
        std::fs::write(&path, &image).unwrap();
        let result = run_write(&mut flash, &path, 0x10000, true, true);
        std::fs::remove_file(&path).unwrap();
        result.unwrap();

        assert_eq!(&bridge.data()[0x10000..0x11800], image.as_slice());
        // Rest of the erased block is blank, the block before is untouched
        assert_eq!(bridge.data()[0x1FFFF], 0xFF);
        assert_eq!(bridge.data()[0xFFFF], 0x00);
        assert_eq!(bridge.chip_stats().page_programs, 3);
    }

    #[test]
    fn test_write_without_erase_fails_verify() {
        let mut bridge = DummyBridge::with_data(config(), &[0x0F; 0x10]);
        let mut flash = SpiFlash::new(&mut bridge);
        let err = write_image(&mut flash, 0, &[0xF0; 0x10], false, true).unwrap_err();
        assert!(err.to_string().starts_with("Verification failed"), "{}", err);
    }

    #[test]
    fn test_write_without_verify() {
        let mut bridge = DummyBridge::new(config());
        let mut flash = SpiFlash::new(&mut bridge);
        let stats = write_image(&mut flash, 0x100, &[0xA5; 0x100], false, false).unwrap();
        assert_eq!(stats.pages_programmed, 1);
        assert_eq!(bridge.data()[0x100..0x200], [0xA5; 0x100]);
    }

    #[test]
    fn test_write_out_of_range() {
        let mut bridge = DummyBridge::new(config());
        let mut flash = SpiFlash::new(&mut bridge);
        assert!(write_image(&mut flash, 0xFFFF00, &[0u8; 0x200], true, true).is_err());
        assert_eq!(bridge.stats().transactions, 0);
    }
}
