//! Streaming SHA-256 content digests

use crate::error::{Error, Result};
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes read per call while streaming a file into the hasher
pub const CHUNK_SIZE: usize = 4 * 1024;

/// Digest of zero-length input
pub const EMPTY_DIGEST: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Lowercase hex SHA-256 of some content (always 64 characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Digest(String);

impl Digest {
    /// Hash a byte slice already in memory
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Stream a reader into the hasher in `CHUNK_SIZE` pieces
    pub fn of_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; CHUNK_SIZE];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Hash a file on disk without loading it into memory
    pub fn of_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io("open", path, e))?;
        Self::of_reader(file).map_err(|e| Error::io("read", path, e))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty_input(&self) -> bool {
        self.0 == EMPTY_DIGEST
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the digest of a single file
pub fn digest_file(path: &Path) -> Result<Digest> {
    Digest::of_file(path)
}
