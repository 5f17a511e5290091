use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::hash::HashAlgorithm;

/// Length of the digest carried by every [`ContentId`].
pub const DIGEST_LEN: usize = 32;

/// Length of the binary encoding: one tag byte followed by the digest.
pub const ENCODED_LEN: usize = DIGEST_LEN + 1;

/// Self-describing content identifier.
///
/// A `ContentId` names a block by the hash of its bytes, together with the
/// [`HashAlgorithm`] that produced the hash. Its canonical textual form is
/// the lowercase hex encoding of `tag ‖ digest`, which is also the name
/// suffix of the backend object storing the block.
///
/// Identifiers order by their binary encoding. Because hex preserves byte
/// order, this is the same as the lexicographic order of [`to_hex`].
///
/// [`to_hex`]: ContentId::to_hex
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId {
    algorithm: HashAlgorithm,
    digest: [u8; DIGEST_LEN],
}

impl ContentId {
    /// Build an identifier from a pre-computed digest.
    pub const fn new(algorithm: HashAlgorithm, digest: [u8; DIGEST_LEN]) -> Self {
        Self { algorithm, digest }
    }

    /// BLAKE3 identifier of `data`.
    pub fn blake3(data: &[u8]) -> Self {
        HashAlgorithm::Blake3.digest(data)
    }

    /// The algorithm that produced this identifier.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Binary encoding: tag byte followed by the digest.
    pub fn to_bytes(&self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        out[0] = self.algorithm.code();
        out[1..].copy_from_slice(&self.digest);
        out
    }

    /// Parse the binary encoding produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != ENCODED_LEN {
            return Err(TypeError::InvalidLength {
                expected: ENCODED_LEN,
                actual: bytes.len(),
            });
        }
        let algorithm = HashAlgorithm::from_code(bytes[0])?;
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&bytes[1..]);
        Ok(Self { algorithm, digest })
    }

    /// Lowercase hex encoding of [`to_bytes`](Self::to_bytes).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Short hex representation (tag plus the first 4 digest bytes).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.to_bytes()[..5])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl PartialOrd for ContentId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContentId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.algorithm
            .code()
            .cmp(&other.algorithm.code())
            .then_with(|| self.digest.cmp(&other.digest))
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.short_hex())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}
