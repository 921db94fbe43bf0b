//! Remote object store access.
//!
//! The verifier only needs two operations from a store: `head` (does the
//! object exist and how large is it) and `download` (stream every byte into a
//! sink). Backends are passed in explicitly as `ObjectStore` trait objects so
//! tests can swap in a fake store without touching the network.

mod http;
mod local;

pub use http::HttpStore;
pub use local::LocalStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::FetchError;
use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Metadata returned by `head`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHead {
    /// Object size in bytes, if the store reported one.
    pub size: Option<u64>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

pub trait ObjectStore: Send + Sync {
    /// Short backend label used in log lines.
    fn backend_name(&self) -> &'static str;

    /// Look up an object without transferring its content.
    fn head(&self, key: &str) -> Result<ObjectHead, FetchError>;

    /// Write the complete object into `sink`. Returns the number of bytes written.
    fn download(&self, key: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

/// Build the store described by the `[store]` config section.
pub fn from_config(cfg: &StoreConfig) -> Result<Arc<dyn ObjectStore>> {
    match cfg.backend {
        StoreBackend::Http => {
            let store = HttpStore::new(&cfg.endpoint, &cfg.bucket)
                .with_context(|| format!("invalid store endpoint '{}'", cfg.endpoint))?
                .with_bearer_token(cfg.bearer_token.clone())
                .with_timeouts(
                    Duration::from_secs(cfg.connect_timeout_secs),
                    Duration::from_secs(cfg.timeout_secs),
                );
            tracing::debug!(endpoint = %cfg.endpoint, bucket = %cfg.bucket, "using http store");
            Ok(Arc::new(store))
        }
        StoreBackend::Local => {
            let root = cfg
                .local_root
                .clone()
                .context("store.backend = \"local\" requires store.local_root")?;
            tracing::debug!(root = %root.display(), "using local store");
            Ok(Arc::new(LocalStore::new(root)))
        }
    }
}
