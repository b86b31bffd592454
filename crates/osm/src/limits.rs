//! Limits applied when encoding and decoding changes.
//!
//! Decoding accepts untrusted input, so allocations driven by the blob are
//! bounded here.

/// Maximum size of an encoded (or decompressed) change in bytes.
pub const MAX_CHANGE_SIZE: usize = 256 * 1024 * 1024;

/// Maximum number of distinct strings in one change.
pub const MAX_STRING_TABLE_SIZE: usize = 1 << 24;

/// Maximum number of elements in one partition (nodes + ways + relations).
pub const MAX_ELEMENTS_PER_PARTITION: usize = 10_000_000;

/// First four bytes of a zstd frame.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
