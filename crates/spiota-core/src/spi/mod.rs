//! SPI flash command building blocks
//!
//! Opcodes, 24-bit address encoding, and [`SpiCommand`], the
//! opcode/address/data description the flash controller hands to the
//! transaction engine.

mod address;
mod command;
pub mod opcodes;

pub use address::{addr_to_bytes, check_range, ADDRESS_SPACE};
pub use command::SpiCommand;
pub use opcodes::*;
