//! Probe command implementation

use spiota_core::flash::SpiFlash;
use spiota_core::transport::Transport;

/// Reset the bridge and print the flash IDs
pub fn run_probe<T: Transport>(flash: &mut SpiFlash<T>) -> Result<(), Box<dyn std::error::Error>> {
    flash.reset()?;

    let id = flash.read_id()?;
    let uid = flash.read_uid()?;

    println!("Found flash chip:");
    println!("  JEDEC ID:  {:02X} {:02X}{:02X}", id[0], id[1], id[2]);
    println!("  Unique ID: {}", hex_string(&uid));

    if id == [0x00; 3] || id == [0xFF; 3] {
        log::warn!("JEDEC ID {:02X?} looks like no chip is connected", id);
    }

    Ok(())
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiota_dummy::{DummyBridge, DummyConfig};

    #[test]
    fn test_hex_string() {
        assert_eq!(hex_string(&[0xDE, 0xAD, 0x01]), "DEAD01");
    }

    #[test]
    fn test_probe_dummy() {
        let mut bridge = DummyBridge::new(DummyConfig {
            size: 0x10000,
            ..DummyConfig::default()
        });
        let mut flash = SpiFlash::new(&mut bridge);
        run_probe(&mut flash).unwrap();
        assert_eq!(bridge.stats().resets, 1);
    }
}
