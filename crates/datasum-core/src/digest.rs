//! Digest algorithms and tagged checksum strings.
//!
//! A checksum is always written as `"{algorithm}:{lowercase hex digest}"`.
//! Hashing reads in fixed-size chunks so memory stays bounded no matter how
//! large the input is.

use sha2::digest::DynDigest;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

const BUF_SIZE: usize = 64 * 1024;

/// Hash function used to fingerprint an artifact. The name doubles as the
/// tag prefix of the checksum string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

/// The algorithm name does not match any supported hash function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported checksum algorithm '{0}' (supported: sha224, sha256, sha384, sha512)")]
pub struct UnsupportedAlgorithm(pub String);

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        }
    }

    /// Length of the hex-encoded digest.
    pub fn hex_len(self) -> usize {
        match self {
            Algorithm::Sha224 => 56,
            Algorithm::Sha256 => 64,
            Algorithm::Sha384 => 96,
            Algorithm::Sha512 => 128,
        }
    }

    /// Fresh hasher state for this algorithm.
    pub fn hasher(self) -> Box<dyn DynDigest + Send> {
        match self {
            Algorithm::Sha224 => Box::new(Sha224::new()),
            Algorithm::Sha256 => Box::new(Sha256::new()),
            Algorithm::Sha384 => Box::new(Sha384::new()),
            Algorithm::Sha512 => Box::new(Sha512::new()),
        }
    }

    /// Tag a hex digest with this algorithm's name.
    pub fn tag(self, hex_digest: &str) -> String {
        format!("{}:{}", self.name(), hex_digest)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnsupportedAlgorithm(wanted.to_string()))
    }
}

/// Hash everything `reader` yields. Returns the lowercase hex digest and the
/// number of bytes consumed.
pub fn hash_reader<R: Read>(mut reader: R, algorithm: Algorithm) -> io::Result<(String, u64)> {
    let mut hasher = algorithm.hasher();
    let mut buf = vec![0u8; BUF_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((hex::encode(hasher.finalize()), total))
}

/// Tagged checksum of a local file, e.g. `sha256:e3b0...`.
pub fn hash_path(path: &Path, algorithm: Algorithm) -> Result<(String, u64)> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let (digest, size) =
        hash_reader(f, algorithm).with_context(|| format!("read {}", path.display()))?;
    Ok((algorithm.tag(&digest), size))
}

/// A checksum string split into its algorithm and digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedChecksum {
    pub algorithm: Algorithm,
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChecksumFormatError {
    #[error("checksum '{0}' has no '<algorithm>:' prefix")]
    MissingTag(String),
    #[error(transparent)]
    Algorithm(#[from] UnsupportedAlgorithm),
    #[error("checksum digest '{digest}' is not {expected} lowercase hex characters")]
    BadDigest { digest: String, expected: usize },
}

impl FromStr for TaggedChecksum {
    type Err = ChecksumFormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (tag, digest) = s
            .split_once(':')
            .ok_or_else(|| ChecksumFormatError::MissingTag(s.to_string()))?;
        let algorithm: Algorithm = tag.parse()?;
        let well_formed = digest.len() == algorithm.hex_len()
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(ChecksumFormatError::BadDigest {
                digest: digest.to_string(),
                expected: algorithm.hex_len(),
            });
        }
        Ok(TaggedChecksum {
            algorithm,
            digest: digest.to_string(),
        })
    }
}

impl fmt::Display for TaggedChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}
