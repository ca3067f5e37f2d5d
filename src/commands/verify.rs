//! Verify command implementation

use spiota_core::error::Error;
use spiota_core::flash::SpiFlash;
use spiota_core::transport::Transport;
use std::path::Path;

use super::{byte_bar, read_input};

/// Run the verify command
pub fn run_verify<T: Transport>(
    flash: &mut SpiFlash<T>,
    input: &Path,
    start: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected = read_input(input)?;
    verify_with_progress(flash, start, &expected)?;
    println!("Verification passed!");
    Ok(())
}

/// Compare a flash range against `expected` with a progress bar
pub fn verify_with_progress<T: Transport>(
    flash: &mut SpiFlash<T>,
    start: u32,
    expected: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = byte_bar(expected.len() as u64, "Verifying");
    match flash.verify_cb(start, expected, |done| pb.set_position(done as u64)) {
        Ok(()) => {
            pb.finish_with_message("Verification passed");
            Ok(())
        }
        Err(e @ Error::VerifyMismatch { .. }) => {
            pb.abandon_with_message("Verification failed!");
            Err(format!("Verification failed: {}", e).into())
        }
        Err(e) => {
            pb.abandon();
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_util::scratch_path;
    use spiota_dummy::{DummyBridge, DummyConfig};

    fn bridge_with(image: &[u8]) -> DummyBridge {
        let config = DummyConfig {
            size: 0x10000,
            ..DummyConfig::default()
        };
        DummyBridge::with_data(config, image)
    }

    #[test]
    fn test_verify_matches() {
        let image = [0x12u8; 0x90];
        let mut bridge = bridge_with(&image);
        let mut flash = SpiFlash::new(&mut bridge);

        let path = scratch_path("verify-ok.bin");
        std::fs::write(&path, &image[0x10..]).unwrap();
        let result = run_verify(&mut flash, &path, 0x10);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn test_verify_reports_mismatch() {
        let mut image = [0x12u8; 0x90];
        let mut bridge = bridge_with(&image);
        let mut flash = SpiFlash::new(&mut bridge);

        image[0x55] = 0x13;
        let err = verify_with_progress(&mut flash, 0, &image).unwrap_err();
        assert!(err.to_string().contains("0x000055"), "{}", err);
    }
}
