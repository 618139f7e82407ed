//! The 128-bit hash primitive behind ring positions.
//!
//! Every digest is sliced into four little-endian `u32` groups. Ring
//! construction uses all four groups (four virtual nodes per digest), key
//! lookup uses only the first one. With MD5 this is bit-for-bit the ketama
//! scheme used by memcached clients and Dubbo.

use std::fmt;
use std::str::FromStr;

use md5::{Digest, Md5};

use crate::RingError;

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 16;

/// Number of `u32` ring positions carried by one digest.
pub const POSITIONS_PER_DIGEST: usize = DIGEST_LEN / 4;

/// Raw 128-bit digest output.
pub type DigestBytes = [u8; DIGEST_LEN];

/// Hash function used to place virtual nodes and keys on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    /// MD5, compatible with ketama.
    #[default]
    Md5,
    /// BLAKE3 truncated to its first 16 bytes.
    Blake3,
}

impl DigestAlgorithm {
    /// Hash `data` into 16 bytes.
    pub fn digest(self, data: &[u8]) -> DigestBytes {
        match self {
            Self::Md5 => Md5::digest(data).into(),
            Self::Blake3 => {
                let hash = blake3::hash(data);
                let mut out = [0u8; DIGEST_LEN];
                out.copy_from_slice(&hash.as_bytes()[..DIGEST_LEN]);
                out
            }
        }
    }

    /// Position of `key` on the ring: first group of its digest.
    pub fn position(self, key: &str) -> u32 {
        slice_to_u32(&self.digest(key.as_bytes()), 0)
    }

    /// Configuration name of the algorithm.
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Blake3 => "blake3",
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = RingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "blake3" => Ok(Self::Blake3),
            _ => Err(RingError::UnknownDigest {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read 4-byte group `group` of `digest` as a little-endian `u32`.
///
/// # Panics
///
/// Panics if `group >= 4`.
pub fn slice_to_u32(digest: &DigestBytes, group: usize) -> u32 {
    let at = group * 4;
    u32::from_le_bytes([digest[at], digest[at + 1], digest[at + 2], digest[at + 3]])
}
