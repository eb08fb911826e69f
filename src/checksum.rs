//! File checksums.
//!
//! Digests are computed by streaming the file in fixed-size blocks, so
//! archives of any size can be verified without loading them into memory.

use crate::error::{Result, SrcInstallError};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Block size for reading files during hashing (64 KiB).
const BLOCK_SIZE: usize = 64 * 1024;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    Md5,
    Sha256,
}

impl ChecksumAlgorithm {
    /// Infer the algorithm from the length of a hex digest.
    ///
    /// Returns `None` for anything that is not 32 or 64 hex digits.
    pub fn from_hex(expected: &str) -> Option<Self> {
        if !expected.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match expected.len() {
            32 => Some(Self::Md5),
            64 => Some(Self::Sha256),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha256 => "SHA256",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute the lowercase hex digest of a file.
///
/// An unreadable or missing file is a [`SrcInstallError::Checksum`], never
/// the digest of empty input.
pub fn file_digest(path: &Path, algorithm: ChecksumAlgorithm) -> Result<String> {
    let wrap = |source| SrcInstallError::Checksum {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(wrap)?;
    match algorithm {
        ChecksumAlgorithm::Md5 => hash_reader::<Md5>(&mut file).map_err(wrap),
        ChecksumAlgorithm::Sha256 => hash_reader::<Sha256>(&mut file).map_err(wrap),
    }
}

/// Check whether a file matches `expected` (case-insensitive hex).
///
/// Returns `Ok(false)` on a mismatch and `Err` if the file cannot be read
/// or `expected` is not a recognized digest.
pub fn verify_file(path: &Path, expected: &str) -> Result<bool> {
    let algorithm =
        ChecksumAlgorithm::from_hex(expected).ok_or_else(|| SrcInstallError::ConfigValidation {
            message: format!("'{}' is not an MD5 or SHA256 hex digest", expected),
        })?;

    let actual = file_digest(path, algorithm)?;
    let matches = actual == expected.to_lowercase();
    if !matches {
        tracing::warn!(
            "{} mismatch for {}: expected {}, got {}",
            algorithm,
            path.display(),
            expected.to_lowercase(),
            actual
        );
    }
    Ok(matches)
}

fn hash_reader<D: Digest>(reader: &mut impl Read) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; BLOCK_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}
