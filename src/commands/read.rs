//! Read command implementation

use spiota_core::flash::SpiFlash;
use spiota_core::transport::Transport;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::byte_bar;

/// Run the read command
pub fn run_read<T: Transport>(
    flash: &mut SpiFlash<T>,
    output: &Path,
    start: u32,
    length: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_flash_with_progress(flash, start, length)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);

    Ok(())
}

/// Read a flash range with a progress bar
pub fn read_flash_with_progress<T: Transport>(
    flash: &mut SpiFlash<T>,
    start: u32,
    length: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let pb = byte_bar(length as u64, "Reading");
    let data = flash.read_data_cb(start, length, |done| pb.set_position(done as u64))?;
    pb.finish_with_message("Read complete");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_util::scratch_path;
    use spiota_dummy::{DummyBridge, DummyConfig};

    #[test]
    fn test_read_to_file() {
        let image: Vec<u8> = (0..0x200u32).map(|i| (i ^ 0x5A) as u8).collect();
        let mut bridge = DummyBridge::with_data(
            DummyConfig {
                size: 0x10000,
                ..DummyConfig::default()
            },
            &image,
        );
        let mut flash = SpiFlash::new(&mut bridge);

        let path = scratch_path("read.bin");
        run_read(&mut flash, &path, 0x80, 0x100).unwrap();
        let written = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, &image[0x80..0x180]);
    }
}
