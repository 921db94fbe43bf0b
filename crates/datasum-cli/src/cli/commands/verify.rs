//! `datasum verify` – compare remote checksums against the catalog.

use super::report::build_report;
use crate::cli::ReportArgs;
use anyhow::Result;
use datasum_core::config::DatasumConfig;
use datasum_core::render;
use std::io::Write;
use std::path::Path;

/// Returns true when every dataset matched.
pub async fn run_verify(
    cfg: &DatasumConfig,
    catalog_path: &Path,
    args: &ReportArgs,
) -> Result<bool> {
    let report = build_report(cfg, catalog_path, args).await?;
    let mut out = std::io::stdout().lock();
    let all_ok = render::write_verify_report(&mut out, &report)?;
    out.flush()?;
    if !all_ok {
        tracing::warn!(
            failed = report.failures().count(),
            total = report.len(),
            "verification failed"
        );
    }
    Ok(all_ok)
}
