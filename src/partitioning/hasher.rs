//! Key hashing for ring placement.

use crc::{Crc, CRC_32_ISO_HDLC};

use crate::types::RingPosition;

/// CRC-32 calculator (IEEE polynomial, as used by zlib and Ethernet)
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Maps a key onto the 32-bit ring.
///
/// Implementations must be deterministic: the same key always yields the same
/// position. Distribution quality matters, since a poor hash leaves some
/// servers owning disproportionately large arcs of the ring.
pub trait RingHasher: Send + Sync + 'static {
    /// Hash `key` to a ring position.
    fn hash(&self, key: &str) -> RingPosition;
}

/// Default hasher: the standard CRC-32 checksum of the key's UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrcHasher;

impl CrcHasher {
    /// Create a new CRC hasher.
    pub fn new() -> Self {
        Self
    }
}

impl RingHasher for CrcHasher {
    fn hash(&self, key: &str) -> RingPosition {
        CRC32.checksum(key.as_bytes())
    }
}
