//! Programmer registration and dispatch
//!
//! A programmer is named on the command line as `name[:key=value,...]`,
//! e.g. `usb:vid=0x359f,pid=0x30f1,index=1` or `dummy:size=16MiB`.

use std::time::Duration;

use spiota_core::transport::BoxedTransport;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "usb")]
    programmers.push(ProgrammerInfo {
        name: "usb",
        description: "USB-to-SPI bridge (vid=<hex>,pid=<hex>,index=<n>,timeout=<ms>)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        description: "In-memory bridge and flash emulator (size=<bytes>,id=<hex>,busy=<n>)",
    });

    programmers
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Parsed programmer string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammerParams {
    /// Programmer name
    pub name: String,
    /// Options in command-line order
    pub params: Vec<(String, String)>,
}

impl ProgrammerParams {
    /// Options as borrowed pairs, the shape the drivers take
    pub fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Split `name:key=value,...` into its parts
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = Vec::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.push((key.trim().to_string(), value.trim().to_string()));
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// An opened programmer
pub struct OpenedProgrammer {
    /// Byte transport to the bridge
    pub transport: BoxedTransport,
    /// Transfer timeout requested through programmer options
    pub timeout: Option<Duration>,
}

/// Open the programmer described by `programmer`
pub fn open_programmer(programmer: &str) -> Result<OpenedProgrammer, Box<dyn std::error::Error>> {
    let params = parse_programmer_params(programmer)?;
    #[allow(unused_variables)]
    let options = params.options();

    match params.name.as_str() {
        #[cfg(feature = "usb")]
        "usb" => {
            let config = spiota_usb::parse_options(&options)?;
            let timeout = config.timeout;
            let bridge = spiota_usb::UsbBridge::open_with_config(config)?;
            Ok(OpenedProgrammer {
                transport: Box::new(bridge),
                timeout: Some(timeout),
            })
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            let config = spiota_dummy::parse_options(&options)?;
            log::info!(
                "Using dummy bridge ({} bytes, JEDEC ID {:02X}{:02X}{:02X})",
                config.size,
                config.jedec_id[0],
                config.jedec_id[1],
                config.jedec_id[2]
            );
            Ok(OpenedProgrammer {
                transport: Box::new(spiota_dummy::DummyBridge::new(config)),
                timeout: None,
            })
        }

        name => Err(format!(
            "Unknown programmer '{}' [available: {}]",
            name,
            programmer_names_short()
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_params() {
        let p = parse_programmer_params("usb:vid=0x359f,pid=30f1,index=1").unwrap();
        assert_eq!(p.name, "usb");
        assert_eq!(
            p.options(),
            [("vid", "0x359f"), ("pid", "30f1"), ("index", "1")]
        );

        let p = parse_programmer_params("dummy").unwrap();
        assert_eq!(p.name, "dummy");
        assert!(p.params.is_empty());
    }

    #[test]
    fn test_parse_programmer_params_invalid() {
        assert!(parse_programmer_params("usb:vid").is_err());
    }

    #[test]
    fn test_unknown_programmer() {
        let err = open_programmer("ch341a").err().map(|e| e.to_string());
        assert!(err.unwrap_or_default().starts_with("Unknown programmer 'ch341a'"));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy() {
        let opened = open_programmer("dummy:size=64KiB,id=C22017").unwrap();
        assert_eq!(opened.timeout, None);
        let mut flash = spiota_core::flash::SpiFlash::new(opened.transport);
        assert_eq!(flash.read_id().unwrap(), [0xC2, 0x20, 0x17]);
    }
}
