//! Content hashing.

use sha2::{Digest, Sha256};

/// Hashes bytes with SHA-256 and returns the lowercase hex digest.
pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(bytes.as_ref()))
}

/// Hashes a file on disk. Returns `None` if the file cannot be read.
pub fn file_sha256_hex(path: &std::path::Path) -> Option<String> {
    std::fs::read(path).ok().map(sha256_hex)
}
