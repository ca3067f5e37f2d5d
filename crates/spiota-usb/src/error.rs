//! Error types for the USB bridge

use spiota_core::error::Error as CoreError;

/// Result type for USB bridge operations
pub type Result<T> = std::result::Result<T, UsbError>;

/// Errors that can occur while opening or configuring the bridge
#[derive(Debug, thiserror::Error)]
pub enum UsbError {
    /// No device with the requested VID/PID at the requested index
    #[error("Bridge not found (VID:{vid:04x} PID:{pid:04x} index {index})")]
    DeviceNotFound {
        /// Vendor ID searched for
        vid: u16,
        /// Product ID searched for
        pid: u16,
        /// Index among matching devices
        index: usize,
    },
    /// Failed to enumerate or open the device
    #[error("Failed to open bridge: {0}")]
    OpenFailed(String),
    /// Failed to claim the interface or its endpoints
    #[error("Failed to claim interface: {0}")]
    ClaimFailed(String),
    /// Bad programmer option
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<UsbError> for CoreError {
    fn from(e: UsbError) -> Self {
        CoreError::Transport(e.to_string())
    }
}
