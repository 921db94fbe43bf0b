//! Fetch-and-digest: download one object into a scratch buffer and hash it.
//!
//! Every call performs exactly one full download; nothing is cached between
//! calls. The scratch copy is gone by the time the call returns, whether it
//! succeeded or not.

use crate::digest::{hash_reader, Algorithm};
use crate::error::FetchError;
use crate::scratch::ScratchBuffer;
use crate::store::ObjectStore;
use std::path::Path;
use std::time::Instant;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Checksum and size of one fetched object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumResult {
    /// `"{algorithm}:{hex}"`.
    pub checksum: String,
    pub size_bytes: u64,
}

impl ChecksumResult {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MB
    }
}

/// Size of the object under `key`, from a HEAD request only.
pub fn fetch_size(store: &dyn ObjectStore, key: &str) -> Result<u64, FetchError> {
    store.head(key)?.size.ok_or_else(|| FetchError::MissingSize {
        key: key.to_string(),
    })
}

/// Download `key` into a scratch file in the system temp dir and hash it.
pub fn compute_checksum(
    store: &dyn ObjectStore,
    key: &str,
    algorithm: Algorithm,
) -> Result<ChecksumResult, FetchError> {
    compute_checksum_in(store, key, algorithm, None)
}

/// Like `compute_checksum` but places the scratch file in `scratch_dir`.
pub fn compute_checksum_in(
    store: &dyn ObjectStore,
    key: &str,
    algorithm: Algorithm,
    scratch_dir: Option<&Path>,
) -> Result<ChecksumResult, FetchError> {
    let started = Instant::now();
    let scratch_err = |source: std::io::Error| FetchError::Io {
        key: key.to_string(),
        source,
    };

    // Cheap existence check before any scratch space is allocated.
    let head = store.head(key)?;

    let mut buffer = ScratchBuffer::create(scratch_dir).map_err(scratch_err)?;
    let downloaded = store.download(key, buffer.writer().map_err(scratch_err)?)?;
    if let Some(expected) = head.size {
        if downloaded != expected {
            return Err(FetchError::Incomplete {
                key: key.to_string(),
                expected,
                received: downloaded,
            });
        }
    }

    let (digest, hashed) =
        hash_reader(buffer.rewind().map_err(scratch_err)?, algorithm).map_err(scratch_err)?;
    if hashed != downloaded {
        return Err(FetchError::Incomplete {
            key: key.to_string(),
            expected: downloaded,
            received: hashed,
        });
    }

    if let Err(e) = buffer.close() {
        tracing::warn!(key, "could not remove scratch file: {}", e);
    }

    tracing::debug!(
        key,
        backend = store.backend_name(),
        bytes = hashed,
        etag = head.etag.as_deref().unwrap_or("-"),
        last_modified = head.last_modified.as_deref().unwrap_or("-"),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "computed {}",
        algorithm
    );
    Ok(ChecksumResult {
        checksum: algorithm.tag(&digest),
        size_bytes: hashed,
    })
}
