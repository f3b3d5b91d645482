//! Content hashing with SHA-1
//!
//! Change detection compares digests of file content only, so two files
//! with identical bytes always hash the same regardless of path or metadata.

use crate::Result;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Size of the read buffer used when streaming content into the digest
pub const HASH_BUFFER_SIZE: usize = 64_000;

/// Number of hex digits in a SHA-1 digest (160 bits)
pub const SHA1_HEX_LEN: usize = 40;

/// Lowercase hex encoded SHA-1 digest of some content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Get the hash as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compute the digest of an in-memory byte string
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(hex::encode(Sha1::digest(data)))
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the digest of everything readable from `reader`, one buffer at a time
pub fn hash_reader<R: Read>(mut reader: R) -> Result<ContentHash> {
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Compute the SHA-1 digest of a file in streaming fashion
pub fn hash_file<P: AsRef<Path>>(file_path: P) -> Result<ContentHash> {
    let file = File::open(file_path)?;
    hash_reader(file)
}

/// Compute the SHA-1 digest of a byte string
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    ContentHash::from_bytes(data)
}

/// Whether `hex_string` has the shape of a SHA-1 digest: exactly 40 hex digits.
///
/// Only the shape is checked, so digests with leading zero digits are accepted
/// and either letter case is fine.
pub fn is_sha1_hash(hex_string: &str) -> bool {
    hex_string.len() == SHA1_HEX_LEN && hex_string.chars().all(|c| c.is_ascii_hexdigit())
}
