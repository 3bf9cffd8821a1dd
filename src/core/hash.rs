//! Content digests (SHA-512, the OCFL default algorithm)

use crate::core::types::ContentDigest;
use sha2::{Digest, Sha512};

/// Name of the digest algorithm as recorded in inventories
pub const DIGEST_ALGORITHM: &str = "sha512";

/// Compute the SHA-512 digest of data
pub fn sha512(data: &[u8]) -> ContentDigest {
    let mut hasher = StreamingHasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Incremental SHA-512 hasher
pub struct StreamingHasher {
    hasher: Sha512,
}

impl StreamingHasher {
    pub fn new() -> Self {
        Self {
            hasher: Sha512::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn finalize(self) -> ContentDigest {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&self.hasher.finalize());
        ContentDigest::from_bytes(bytes)
    }
}

impl Default for StreamingHasher {
    fn default() -> Self {
        Self::new()
    }
}
