//! Status command implementation

use spiota_core::flash::{SpiFlash, Status1, StatusRegister};
use spiota_core::transport::Transport;

/// Print the three status registers
pub fn run_status<T: Transport>(flash: &mut SpiFlash<T>) -> Result<(), Box<dyn std::error::Error>> {
    let sr1 = flash.read_status1()?;
    let sr2 = flash.read_status(StatusRegister::Sr2)?;
    let sr3 = flash.read_status(StatusRegister::Sr3)?;

    println!("SR1: 0x{:02X} {:?}", sr1.bits(), sr1);
    println!("SR2: 0x{:02X}", sr2);
    println!("SR3: 0x{:02X}", sr3);

    if sr1.contains(Status1::WIP) {
        println!("Flash is busy (write in progress)");
    }
    if sr1.intersects(Status1::BP0 | Status1::BP1 | Status1::BP2) {
        println!("Block protection is enabled");
    }

    Ok(())
}
