//! CLI command implementations
//!
//! Every command takes an opened [`SpiFlash`](spiota_core::flash::SpiFlash)
//! over whatever transport the programmer string selected, so the same code
//! runs against real hardware and the dummy bridge.

pub mod erase;
mod list;
pub mod probe;
pub mod read;
pub mod status;
pub mod verify;
pub mod write;

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub use list::{list_devices, list_programmers};

/// Byte progress bar in the house style, labelled with `phase`
pub(crate) fn byte_bar(total: u64, phase: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Count progress bar for erase blocks
pub(crate) fn block_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} blocks Erasing")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Read a whole input file
pub(crate) fn read_input(input: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut file = File::open(input)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    println!("Read {} bytes from {:?}", data.len(), input);
    Ok(data)
}
