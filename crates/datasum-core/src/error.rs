//! Per-object fetch failures.
//!
//! Everything that can go wrong while retrieving one remote object ends up as
//! a `FetchError`. The verifier records it against the dataset and moves on;
//! it is never allowed to abort a whole run.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The store has no object under this key.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The store refused the request (HTTP 401/403, filesystem permission).
    #[error("access denied for {key} ({detail})")]
    AccessDenied { key: String, detail: String },

    /// Any other non-2xx HTTP status.
    #[error("{method} {key} returned HTTP {status}")]
    Http {
        method: &'static str,
        key: String,
        status: u32,
    },

    /// Connection, DNS, TLS or timeout failure reported by the transport.
    #[error("transfer of {key} failed: {source}")]
    Transport {
        key: String,
        #[source]
        source: curl::Error,
    },

    /// Download ended before the advertised length was received.
    #[error("incomplete transfer of {key}: received {received} of {expected} bytes")]
    Incomplete {
        key: String,
        expected: u64,
        received: u64,
    },

    /// HEAD succeeded but carried no object size.
    #[error("store reported no size for {key}")]
    MissingSize { key: String },

    /// Reading the object (local backend) or writing the scratch copy failed.
    #[error("i/o error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub fn io(key: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return FetchError::NotFound {
                key: key.to_string(),
            };
        }
        if source.kind() == io::ErrorKind::PermissionDenied {
            return FetchError::AccessDenied {
                key: key.to_string(),
                detail: source.to_string(),
            };
        }
        FetchError::Io {
            key: key.to_string(),
            source,
        }
    }

    /// Map a non-2xx status code for `key`.
    pub fn from_status(method: &'static str, key: &str, status: u32) -> Self {
        match status {
            404 => FetchError::NotFound {
                key: key.to_string(),
            },
            401 | 403 => FetchError::AccessDenied {
                key: key.to_string(),
                detail: format!("HTTP {status}"),
            },
            _ => FetchError::Http {
                method,
                key: key.to_string(),
                status,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}
