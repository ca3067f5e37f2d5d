//! 24-bit flash addressing
//!
//! Flash addresses travel in the SPI payload most significant byte first,
//! independent of the little-endian packet header around them.

use crate::error::{Error, Result};

/// Size of the 3-byte address space (16 MiB)
pub const ADDRESS_SPACE: u32 = 1 << 24;

/// Encode a 24-bit address big-endian
///
/// Bits above 23 are dropped; callers validate with [`check_range`].
pub const fn addr_to_bytes(addr: u32) -> [u8; 3] {
    [(addr >> 16) as u8, (addr >> 8) as u8, addr as u8]
}

/// Check that `len` bytes starting at `addr` fit in the 24-bit address space
pub fn check_range(addr: u32, len: usize) -> Result<()> {
    let end = addr as u64 + len as u64;
    if addr >= ADDRESS_SPACE || end > ADDRESS_SPACE as u64 {
        return Err(Error::AddressOutOfRange {
            addr: end.max(addr as u64),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_to_bytes() {
        assert_eq!(addr_to_bytes(0x0A1B2C), [0x0A, 0x1B, 0x2C]);
        assert_eq!(addr_to_bytes(0), [0, 0, 0]);
        assert_eq!(addr_to_bytes(0xFFFFFF), [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_check_range() {
        assert!(check_range(0, 0).is_ok());
        assert!(check_range(0xFF_FF00, 0x100).is_ok());
        assert!(check_range(0xFF_FF00, 0x101).is_err());
        assert_eq!(
            check_range(0x100_0000, 0),
            Err(Error::AddressOutOfRange { addr: 0x100_0000 })
        );
    }
}
