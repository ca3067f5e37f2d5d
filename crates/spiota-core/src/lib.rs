//! spiota-core - Host side of a register-programmed USB-to-SPI bridge
//!
//! The bridge exposes a block of ten 32-bit SPI controller registers. The
//! host describes a transfer by writing the whole block together with the
//! bytes to shift out, optionally fetches the bytes shifted in, then reads
//! the block back to confirm the controller went idle.
//!
//! Layers, bottom up:
//!
//! - [`regs`] - register block layout and bit fields
//! - [`packet`] - command/length framing of every USB exchange
//! - [`transport`] - the bulk endpoint pair the packets travel over
//! - [`engine`] - one SPI transaction (write, optional dummy, optional read)
//! - [`flash`] - SPI NOR command set: ID, read, erase, program
//!
//! # Example
//!
//! ```ignore
//! use spiota_core::flash::SpiFlash;
//!
//! fn dump<T: spiota_core::transport::Transport>(t: T) -> spiota_core::Result<Vec<u8>> {
//!     let mut flash = SpiFlash::new(t);
//!     flash.reset()?;
//!     let id = flash.read_id()?;
//!     log::info!("JEDEC ID {:02X}{:02X}{:02X}", id[0], id[1], id[2]);
//!     flash.read_data(0, 0x1000)
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod engine;
pub mod error;
pub mod flash;
pub mod packet;
pub mod profile;
pub mod regs;
pub mod spi;
pub mod transport;

pub use error::{Error, Result};
