//! Flash geometry and timing profile
//!
//! Geometry is never probed from the chip; it comes from the caller, either
//! built in code or loaded from a TOML file:
//!
//! ```toml
//! [flash]
//! page_size = 0x100
//! read_chunk = 0x50
//! busy_poll_limit = 200000   # optional, unbounded when absent
//! timeout_ms = 1000
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::engine::{DEFAULT_TIMEOUT, MAX_TRANSFER_COUNT};
use crate::error::{Error, Result};

/// Default program page size
pub const DEFAULT_PAGE_SIZE: usize = 0x100;
/// Default bytes per read transaction
pub const DEFAULT_READ_CHUNK: usize = 0x50;

/// Opcode + 3 address bytes sent in front of page data
const PP_HEADER_LEN: usize = 4;

/// Caller-supplied flash parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashProfile {
    /// Largest payload of one page program
    pub page_size: usize,
    /// Largest payload of one read transaction
    pub read_chunk: usize,
    /// Status polls allowed while waiting for WIP to clear, `None` to wait forever
    pub busy_poll_limit: Option<u32>,
    /// Timeout of each USB transfer
    pub timeout: Duration,
}

impl Default for FlashProfile {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            read_chunk: DEFAULT_READ_CHUNK,
            busy_poll_limit: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FlashProfile {
    /// Profile with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the program page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the read chunk size
    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk;
        self
    }

    /// Cap the busy poll
    pub fn with_busy_poll_limit(mut self, limit: Option<u32>) -> Self {
        self.busy_poll_limit = limit;
        self
    }

    /// Set the USB transfer timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that every transfer the profile implies fits the controller
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidProfile("page_size must be non-zero".into()));
        }
        if self.page_size + PP_HEADER_LEN > MAX_TRANSFER_COUNT {
            return Err(Error::InvalidProfile(format!(
                "page_size {} exceeds the {}-byte write limit",
                self.page_size,
                MAX_TRANSFER_COUNT - PP_HEADER_LEN
            )));
        }
        if self.read_chunk == 0 || self.read_chunk > MAX_TRANSFER_COUNT {
            return Err(Error::InvalidProfile(format!(
                "read_chunk must be 1..={}, got {}",
                MAX_TRANSFER_COUNT, self.read_chunk
            )));
        }
        Ok(())
    }

    /// Load a profile from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::InvalidProfile(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse a profile from a TOML string; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlProfileFile =
            toml::from_str(content).map_err(|e| Error::InvalidProfile(e.to_string()))?;

        let mut profile = Self::default();
        if let Some(flash) = file.flash {
            if let Some(v) = flash.page_size {
                profile.page_size = v as usize;
            }
            if let Some(v) = flash.read_chunk {
                profile.read_chunk = v as usize;
            }
            if let Some(v) = flash.busy_poll_limit {
                profile.busy_poll_limit = Some(v);
            }
            if let Some(ms) = flash.timeout_ms {
                profile.timeout = Duration::from_millis(ms as u64);
            }
        }

        profile.validate()?;
        Ok(profile)
    }
}

/// TOML profile file structure
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlProfileFile {
    flash: Option<TomlFlash>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlFlash {
    #[serde(default, deserialize_with = "deserialize_size")]
    page_size: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_size")]
    read_chunk: Option<u32>,
    busy_poll_limit: Option<u32>,
    timeout_ms: Option<u32>,
}

/// Deserialize a size that can be an integer, hex string or "1 KiB"
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeOrStr {
        Int(u32),
        Str(String),
    }

    match SizeOrStr::deserialize(deserializer)? {
        SizeOrStr::Int(n) => Ok(Some(n)),
        SizeOrStr::Str(s) => parse_size(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parse a size like "4096", "0x1000", "4 KiB" or "16 MiB"
pub fn parse_size(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();

    if let Ok(n) = s.parse::<u32>() {
        return Ok(n);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex.trim(), 16).map_err(|e| format!("invalid hex: {}", e));
    }

    let lower = s.to_lowercase();
    let (num, multiplier) = if let Some(n) = lower.strip_suffix("mib") {
        (n.trim(), 1024 * 1024)
    } else if let Some(n) = lower.strip_suffix("kib") {
        (n.trim(), 1024)
    } else if let Some(n) = lower.strip_suffix('k') {
        (n.trim(), 1024)
    } else if let Some(n) = lower.strip_suffix('b') {
        (n.trim(), 1)
    } else {
        return Err(format!("invalid size: {}", s));
    };

    let n: u32 = num.parse().map_err(|_| format!("invalid size: {}", s))?;
    n.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflows: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("0x50").unwrap(), 0x50);
        assert_eq!(parse_size("64 KiB").unwrap(), 0x10000);
        assert_eq!(parse_size("64k").unwrap(), 0x10000);
        assert_eq!(parse_size("16MiB").unwrap(), 16 * 1024 * 1024);
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_default_profile() {
        let p = FlashProfile::default();
        assert_eq!(p.page_size, 0x100);
        assert_eq!(p.read_chunk, 0x50);
        assert_eq!(p.busy_poll_limit, None);
        assert_eq!(p.timeout, Duration::from_millis(1000));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[flash]
page_size = "0x20"
read_chunk = 64
busy_poll_limit = 1000
timeout_ms = 250
"#;
        let p = FlashProfile::from_toml_str(toml).unwrap();
        assert_eq!(p.page_size, 0x20);
        assert_eq!(p.read_chunk, 64);
        assert_eq!(p.busy_poll_limit, Some(1000));
        assert_eq!(p.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(
            FlashProfile::from_toml_str("").unwrap(),
            FlashProfile::default()
        );
    }

    #[test]
    fn test_rejects_oversized_page() {
        let err = FlashProfile::from_toml_str("[flash]\npage_size = 512\n").unwrap_err();
        assert!(matches!(err, Error::InvalidProfile(_)));
        assert!(FlashProfile::new().with_page_size(508).validate().is_ok());
        assert!(FlashProfile::new().with_read_chunk(0).validate().is_err());
        assert!(FlashProfile::new().with_read_chunk(513).validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_key() {
        assert!(FlashProfile::from_toml_str("[flash]\nsector = 4096\n").is_err());
    }
}
