//! # Content Hashing
//!
//! A file's identity is the SHA-256 digest of its bytes, rendered as 64
//! lowercase hex characters. Name and content type never feed the digest.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a rendered hash in hex characters
pub const HASH_HEX_LEN: usize = 64;

/// Content address of a payload
///
/// Every constructor, deserialization included, goes through the format
/// check, so `shard()` always has two characters to slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash a payload
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(format!("{:x}", hasher.finalize()))
    }

    /// Accept a candidate hash only if it is well formed.
    ///
    /// Uppercase hex is rejected: stored hashes are always lowercase, so an
    /// uppercase candidate can never match a record.
    pub fn parse(candidate: &str) -> Option<Self> {
        let well_formed = candidate.len() == HASH_HEX_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| ContentHash(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character prefix used for directory sharding
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = String;

    fn try_from(candidate: String) -> Result<Self, Self::Error> {
        ContentHash::parse(&candidate)
            .ok_or_else(|| format!("invalid content hash '{}'", candidate))
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
