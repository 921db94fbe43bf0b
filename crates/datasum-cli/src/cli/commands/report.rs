//! Shared setup for `print`, `verify` and `update`: resolve the algorithm,
//! load the catalog, build the store and fetch every selected dataset.

use crate::cli::ReportArgs;
use anyhow::{Context, Result};
use datasum_core::catalog::Catalog;
use datasum_core::config::DatasumConfig;
use datasum_core::digest::Algorithm;
use datasum_core::store;
use datasum_core::verify::{self, VerificationReport, VerifyOptions};
use std::path::Path;
use std::time::Instant;

/// Algorithm from the CLI flag, else from the config.
pub fn resolve_algorithm(cfg: &DatasumConfig, flag: Option<&str>) -> Result<Algorithm> {
    let name = flag.unwrap_or(&cfg.algorithm);
    let algorithm = name.parse::<Algorithm>()?;
    Ok(algorithm)
}

pub async fn build_report(
    cfg: &DatasumConfig,
    catalog_path: &Path,
    args: &ReportArgs,
) -> Result<VerificationReport> {
    // Configuration faults abort before any network traffic.
    let algorithm = resolve_algorithm(cfg, args.algorithm.as_deref())?;
    let catalog = Catalog::load(catalog_path)?
        .select(&args.datasets)
        .context("select datasets")?;
    let store = store::from_config(&cfg.store)?;
    let jobs = args.jobs.unwrap_or(cfg.jobs).max(1);

    let opts = VerifyOptions {
        algorithm,
        scratch_dir: cfg.scratch_dir.clone(),
    };
    tracing::info!(
        catalog = %catalog_path.display(),
        datasets = catalog.len(),
        jobs,
        "checking datasets with {}",
        algorithm
    );
    let started = Instant::now();
    let report = verify::verify_all_concurrent(store, &catalog, &opts, jobs).await;
    tracing::info!(
        failures = report.failures().count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "check finished"
    );
    Ok(report)
}
