//! Checksum command: tagged digest of a local file.

use super::report::resolve_algorithm;
use anyhow::Result;
use datasum_core::config::DatasumConfig;
use datasum_core::digest;
use std::path::Path;

/// Compute and print `"{algo}:{hex}  {path}"` for the given file.
pub fn run_checksum(cfg: &DatasumConfig, path: &Path, algorithm: Option<&str>) -> Result<()> {
    let algorithm = resolve_algorithm(cfg, algorithm)?;
    let (checksum, _size) = digest::hash_path(path, algorithm)?;
    println!("{}  {}", checksum, path.display());
    Ok(())
}
