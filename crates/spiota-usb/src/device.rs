//! Bridge device implementation
//!
//! `UsbBridge` owns the claimed interface's bulk endpoint pair and moves
//! raw packets over it. Packet framing and the SPI protocol live in
//! `spiota-core`; this is only the byte pipe.

use std::time::Duration;

use nusb::transfer::{Buffer, Bulk, In, Out, TransferError};
use nusb::{Endpoint, MaybeFuture};
use spiota_core::error::{Error as CoreError, Result as CoreResult};
use spiota_core::transport::Transport;

use crate::error::{Result, UsbError};
use crate::protocol::UsbConfig;

/// USB-to-SPI bridge reached over nusb
///
/// The interface is released when the value is dropped.
pub struct UsbBridge {
    /// Bulk OUT endpoint for packets
    out_ep: Endpoint<Bulk, Out>,
    /// Bulk IN endpoint for responses
    in_ep: Endpoint<Bulk, In>,
    config: UsbConfig,
}

impl UsbBridge {
    /// Open the first bridge with the default VID/PID
    pub fn open() -> Result<Self> {
        Self::open_with_config(UsbConfig::default())
    }

    /// Open a bridge as described by `config`
    pub fn open_with_config(config: UsbConfig) -> Result<Self> {
        let devices: Vec<_> = nusb::list_devices()
            .wait()
            .map_err(|e| UsbError::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == config.vid && d.product_id() == config.pid)
            .collect();

        let device_info = devices
            .get(config.index)
            .ok_or(UsbError::DeviceNotFound {
                vid: config.vid,
                pid: config.pid,
                index: config.index,
            })?;

        log::info!(
            "Opening bridge {:04X}:{:04X} at bus {} address {}",
            config.vid,
            config.pid,
            device_info.bus_id(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| UsbError::OpenFailed(e.to_string()))?;

        log::debug!("Using interface {}", config.interface);

        let interface = device
            .claim_interface(config.interface)
            .wait()
            .map_err(|e| UsbError::ClaimFailed(e.to_string()))?;

        let out_ep = interface
            .endpoint::<Bulk, Out>(config.out_ep)
            .map_err(|e| UsbError::ClaimFailed(e.to_string()))?;
        let in_ep = interface
            .endpoint::<Bulk, In>(config.in_ep)
            .map_err(|e| UsbError::ClaimFailed(e.to_string()))?;

        Ok(Self {
            out_ep,
            in_ep,
            config,
        })
    }

    /// List connected devices matching `vid`/`pid`
    pub fn list_devices(vid: u16, pid: u16) -> Result<Vec<UsbDeviceInfo>> {
        let devices = nusb::list_devices()
            .wait()
            .map_err(|e| UsbError::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == vid && d.product_id() == pid)
            .map(|d| UsbDeviceInfo {
                bus: d.bus_id().to_string(),
                address: d.device_address(),
                serial: d.serial_number().map(str::to_string),
            })
            .collect();

        Ok(devices)
    }

    /// Active configuration
    pub fn config(&self) -> &UsbConfig {
        &self.config
    }
}

impl Transport for UsbBridge {
    fn write(&mut self, data: &[u8], timeout: Duration) -> CoreResult<usize> {
        let mut buf = Buffer::new(data.len());
        buf.extend_from_slice(data);

        let completion = self.out_ep.transfer_blocking(buf, timeout);
        completion.status.map_err(transfer_error)?;

        log::trace!("USB write {}/{} bytes", completion.actual_len, data.len());
        Ok(completion.actual_len)
    }

    fn read(&mut self, max_len: usize, timeout: Duration) -> CoreResult<Vec<u8>> {
        let max_packet_size = self.in_ep.max_packet_size();
        // Request length must be multiple of max packet size
        let request_len = max_len.max(1).div_ceil(max_packet_size) * max_packet_size;
        let mut in_buf = Buffer::new(request_len);
        in_buf.set_requested_len(request_len);

        let completion = self.in_ep.transfer_blocking(in_buf, timeout);
        let data = completion.into_result().map_err(transfer_error)?;

        let received = std::cmp::min(data.len(), max_len);
        log::trace!("USB read {} bytes", received);
        Ok(data[..received].to_vec())
    }
}

fn transfer_error(e: TransferError) -> CoreError {
    match e {
        TransferError::Cancelled => CoreError::Timeout,
        e => CoreError::Transport(e.to_string()),
    }
}

/// Information about a connected bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbDeviceInfo {
    /// USB bus identifier
    pub bus: String,
    /// USB device address
    pub address: u8,
    /// Serial number string, if the device reports one
    pub serial: Option<String>,
}

impl std::fmt::Display for UsbDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bridge at bus {} address {}", self.bus, self.address)?;
        if let Some(serial) = &self.serial {
            write!(f, " (serial {})", serial)?;
        }
        Ok(())
    }
}

/// Parse programmer options for the USB bridge
///
/// Supported options:
/// - `vid=<hex>`, `pid=<hex>`: device IDs to match
/// - `index=<n>`: which matching device to open
/// - `timeout=<ms>`: per-transfer timeout
pub fn parse_options(options: &[(&str, &str)]) -> Result<UsbConfig> {
    let mut config = UsbConfig::default();

    for (key, value) in options {
        match *key {
            "vid" => {
                config.vid = parse_hex_u16(value)
                    .ok_or_else(|| UsbError::Config(format!("Invalid vid value: {}", value)))?;
            }
            "pid" => {
                config.pid = parse_hex_u16(value)
                    .ok_or_else(|| UsbError::Config(format!("Invalid pid value: {}", value)))?;
            }
            "index" => {
                config.index = value
                    .parse()
                    .map_err(|_| UsbError::Config(format!("Invalid index value: {}", value)))?;
            }
            "timeout" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| UsbError::Config(format!("Invalid timeout value: {}", value)))?;
                if ms == 0 {
                    return Err(UsbError::Config("timeout must be non-zero".into()));
                }
                config.timeout = Duration::from_millis(ms);
            }
            _ => {
                log::warn!("Unknown USB option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

fn parse_hex_u16(s: &str) -> Option<u16> {
    let s = s.trim();
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_defaults() {
        assert_eq!(parse_options(&[]).unwrap(), UsbConfig::default());
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("vid", "0x1209"),
            ("pid", "abcd"),
            ("index", "1"),
            ("timeout", "250"),
        ])
        .unwrap();
        assert_eq!(config.vid, 0x1209);
        assert_eq!(config.pid, 0xABCD);
        assert_eq!(config.index, 1);
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_parse_options_invalid() {
        assert!(matches!(
            parse_options(&[("vid", "12345")]),
            Err(UsbError::Config(_))
        ));
        assert!(parse_options(&[("index", "first")]).is_err());
        assert!(parse_options(&[("timeout", "0")]).is_err());
    }

    #[test]
    fn test_transfer_error_mapping() {
        assert_eq!(transfer_error(TransferError::Cancelled), CoreError::Timeout);
        assert!(matches!(
            transfer_error(TransferError::Stall),
            CoreError::Transport(_)
        ));
    }
}
