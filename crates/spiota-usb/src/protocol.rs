//! USB identifiers and transport settings of the bridge

use std::time::Duration;

use spiota_core::engine::DEFAULT_TIMEOUT;

/// Bridge USB vendor ID
pub const BRIDGE_USB_VENDOR: u16 = 0x359F;
/// Bridge USB product ID
pub const BRIDGE_USB_PRODUCT: u16 = 0x30F1;

/// Interface carrying the bulk endpoint pair
pub const BRIDGE_INTERFACE: u8 = 0;
/// Bulk OUT endpoint for packets to the bridge
pub const WRITE_EP: u8 = 0x01;
/// Bulk IN endpoint for responses
pub const READ_EP: u8 = 0x81;

/// How to find and talk to the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbConfig {
    /// Vendor ID to match
    pub vid: u16,
    /// Product ID to match
    pub pid: u16,
    /// Which of the matching devices to open
    pub index: usize,
    /// Interface number to claim
    pub interface: u8,
    /// Bulk OUT endpoint address
    pub out_ep: u8,
    /// Bulk IN endpoint address
    pub in_ep: u8,
    /// Default timeout of each transfer
    pub timeout: Duration,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vid: BRIDGE_USB_VENDOR,
            pid: BRIDGE_USB_PRODUCT,
            index: 0,
            interface: BRIDGE_INTERFACE,
            out_ep: WRITE_EP,
            in_ep: READ_EP,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl UsbConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a different VID/PID
    pub fn with_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = vid;
        self.pid = pid;
        self
    }

    /// Open the nth matching device
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Set the transfer timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UsbConfig::default();
        assert_eq!(config.vid, 0x359F);
        assert_eq!(config.pid, 0x30F1);
        assert_eq!(config.index, 0);
        assert_eq!(config.out_ep, 0x01);
        assert_eq!(config.in_ep, 0x81);
        assert_eq!(config.timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_builder() {
        let config = UsbConfig::new()
            .with_ids(0x1234, 0x5678)
            .with_index(2)
            .with_timeout(Duration::from_millis(250));
        assert_eq!((config.vid, config.pid, config.index), (0x1234, 0x5678, 2));
        assert_eq!(config.timeout, Duration::from_millis(250));
    }
}
