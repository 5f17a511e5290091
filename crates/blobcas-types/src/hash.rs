use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::content_id::{ContentId, DIGEST_LEN};
use crate::error::TypeError;

/// Digest function a [`ContentId`] was computed with.
///
/// The discriminant is the multihash code of the function, which is also
/// the leading tag byte of the encoded identifier.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum HashAlgorithm {
    /// SHA2-256 (multihash `0x12`).
    Sha256 = 0x12,
    /// BLAKE3 with a 256-bit output (multihash `0x1e`).
    #[default]
    Blake3 = 0x1e,
}

impl HashAlgorithm {
    /// The tag byte used in encoded identifiers.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Resolve a tag byte back to an algorithm.
    pub fn from_code(code: u8) -> Result<Self, TypeError> {
        match code {
            0x12 => Ok(Self::Sha256),
            0x1e => Ok(Self::Blake3),
            other => Err(TypeError::UnknownAlgorithm(other)),
        }
    }

    /// Short lowercase name, e.g. `"blake3"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha2-256",
            Self::Blake3 => "blake3",
        }
    }

    /// Hash `data` and return its content identifier.
    pub fn digest(self, data: &[u8]) -> ContentId {
        let digest: [u8; DIGEST_LEN] = match self {
            Self::Sha256 => Sha256::digest(data).into(),
            Self::Blake3 => *blake3::hash(data).as_bytes(),
        };
        ContentId::new(self, digest)
    }

    /// Check that `data` hashes to `expected` under this algorithm.
    pub fn verify(self, data: &[u8], expected: &ContentId) -> bool {
        expected.algorithm() == self && self.digest(data) == *expected
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
