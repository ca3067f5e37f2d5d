//! SPI NOR flash opcodes used by the flash controller

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Read Status Register 3
pub const RDSR3: u8 = 0x15;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + device ID)
pub const RDID: u8 = 0x9F;
/// Read Unique ID (Winbond, others)
pub const RDUID: u8 = 0x4B;

// ============================================================================
// Read / program / erase, 3-byte address
// ============================================================================

/// Read Data (no dummy cycles)
pub const READ: u8 = 0x03;
/// Fast Read (with dummy cycles)
pub const FAST_READ: u8 = 0x0B;
/// Page Program
pub const PP: u8 = 0x02;
/// Sector Erase 4KB
pub const SE_20: u8 = 0x20;
/// Block Erase 64KB
pub const BE_D8: u8 = 0xD8;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register 1: Write In Progress / Busy
pub const SR1_WIP: u8 = 0x01;
/// Status Register 1: Write Enable Latch
pub const SR1_WEL: u8 = 0x02;

// ============================================================================
// Command shapes
// ============================================================================

/// JEDEC ID length in bytes
pub const RDID_LEN: usize = 3;
/// Unique ID length in bytes
pub const RDUID_LEN: usize = 16;
/// Dummy cycles between RDUID and its data
pub const RDUID_DUMMY: u32 = 4;
/// Dummy cycles between FAST_READ address and data
pub const FAST_READ_DUMMY: u32 = 1;
/// Size of the region erased by [`BE_D8`]
pub const BLOCK_64K: u32 = 64 * 1024;
