//! spiota-usb - USB transport for the USB-to-SPI bridge
//!
//! Finds the bridge by VID/PID, claims its interface and exposes the bulk
//! OUT/IN endpoint pair as a [`spiota_core::transport::Transport`].
//!
//! # Example
//!
//! ```no_run
//! use spiota_core::flash::SpiFlash;
//! use spiota_usb::{UsbBridge, UsbConfig};
//!
//! let bridge = UsbBridge::open_with_config(UsbConfig::new().with_index(0))?;
//! let mut flash = SpiFlash::new(bridge);
//! flash.reset()?;
//! let id = flash.read_id()?;
//! println!("JEDEC ID: {:02X} {:02X} {:02X}", id[0], id[1], id[2]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod device;
mod error;
mod protocol;

pub use device::{parse_options, UsbBridge, UsbDeviceInfo};
pub use error::{Result, UsbError};
pub use protocol::{
    UsbConfig, BRIDGE_INTERFACE, BRIDGE_USB_PRODUCT, BRIDGE_USB_VENDOR, READ_EP, WRITE_EP,
};
