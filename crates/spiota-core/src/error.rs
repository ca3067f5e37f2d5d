//! Error types for spiota-core
//!
//! Every failure the protocol stack can detect has its own variant so the
//! caller can tell a framing problem from a controller that did not finish
//! its transfer. None of them is retried inside the core.

use thiserror::Error;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Response shorter than the 8-byte packet header
    #[error("malformed packet: {len} bytes is shorter than the 8-byte header")]
    MalformedPacket {
        /// Bytes received
        len: usize,
    },

    /// Declared payload length differs from the bytes that follow the header
    #[error("packet length mismatch: header declares {declared} bytes, {actual} present")]
    LengthMismatch {
        /// Length field of the header
        declared: u32,
        /// Trailing bytes actually present
        actual: usize,
    },

    /// Transport accepted fewer bytes than the packet holds
    #[error("short write: {written} of {expected} bytes sent")]
    ShortWrite {
        /// Bytes the transport reported as written
        written: usize,
        /// Encoded packet length
        expected: usize,
    },

    /// Status register did not read back as idle after a transfer
    #[error("controller status 0x{found:08X} after transfer, expected 0x{expected:08X}")]
    StatusMismatch {
        /// Idle/complete status value
        expected: u32,
        /// Status value read back
        found: u32,
    },

    /// Chunked operation returned or consumed a different number of bytes
    #[error("length accounting mismatch: requested {expected} bytes, got {actual}")]
    LengthAccounting {
        /// Bytes requested
        expected: usize,
        /// Bytes returned or consumed
        actual: usize,
    },

    /// Register block buffer is not 40 bytes long
    #[error("register block must be 40 bytes, got {len}")]
    RegisterBlockSize {
        /// Buffer length
        len: usize,
    },

    /// Payload does not fit in one flash page
    #[error("page program of {len} bytes exceeds page size {page_size}")]
    PageOverflow {
        /// Payload length
        len: usize,
        /// Configured page size
        page_size: usize,
    },

    /// Address (or address + length) is outside the 24-bit address space
    #[error("address 0x{addr:X} is outside the 24-bit address space")]
    AddressOutOfRange {
        /// Offending address
        addr: u64,
    },

    /// Requested transfer does not fit the controller's transfer counters
    #[error("{phase} transfer of {len} bytes exceeds the controller limit of {max}")]
    TransferTooLong {
        /// "write" or "read"
        phase: &'static str,
        /// Requested byte count
        len: usize,
        /// Largest count the counter field can hold
        max: usize,
    },

    /// Write-in-progress never cleared within the configured poll limit
    #[error("flash still busy after {polls} status polls")]
    BusyTimeout {
        /// Number of status reads performed
        polls: u32,
    },

    /// Read-back data differs from the expected contents
    #[error("verify failed at 0x{addr:06X}: expected 0x{expected:02X}, found 0x{found:02X}")]
    VerifyMismatch {
        /// Flash address of the first difference
        addr: u32,
        /// Expected byte
        expected: u8,
        /// Byte read from flash
        found: u8,
    },

    /// Flash profile is unusable
    #[error("invalid flash profile: {0}")]
    InvalidProfile(String),

    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    Transport(String),

    /// USB transfer timed out
    #[error("USB transfer timed out")]
    Timeout,
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
