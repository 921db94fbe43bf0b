//! `datasum size <KEY>` – object size from a HEAD request.

use anyhow::{Context, Result};
use datasum_core::config::DatasumConfig;
use datasum_core::{fetch, store};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub async fn run_size(cfg: &DatasumConfig, key: &str) -> Result<()> {
    let store = store::from_config(&cfg.store)?;
    let owned_key = key.to_string();
    let size = tokio::task::spawn_blocking(move || fetch::fetch_size(store.as_ref(), &owned_key))
        .await
        .context("size task failed")??;
    println!(
        "{}: {} bytes ({:.1} MB)",
        key,
        size,
        size as f64 / BYTES_PER_MB
    );
    Ok(())
}
