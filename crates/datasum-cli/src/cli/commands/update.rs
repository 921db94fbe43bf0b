//! `datasum update` – print replacement catalog entries.

use super::report::build_report;
use crate::cli::ReportArgs;
use anyhow::Result;
use datasum_core::config::DatasumConfig;
use datasum_core::render;
use std::io::Write;
use std::path::Path;

pub async fn run_update(cfg: &DatasumConfig, catalog_path: &Path, args: &ReportArgs) -> Result<()> {
    let report = build_report(cfg, catalog_path, args).await?;
    let mut out = std::io::stdout().lock();
    render::write_update_template(&mut out, &report)?;
    out.flush()?;
    Ok(())
}
