//! Text renderers over a `VerificationReport`.
//!
//! All three views read the same report; none of them fetch anything.

use crate::verify::{DatasetVerification, Outcome, VerificationReport};
use std::io::{self, Write};

const RULE_WIDTH: usize = 60;

/// `print`: one line per dataset with the remote checksum and size.
pub fn write_print_report<W: Write>(out: &mut W, report: &VerificationReport) -> io::Result<()> {
    for d in report.iter() {
        match &d.outcome {
            Outcome::Ok { checksum }
            | Outcome::Mismatch {
                fetched_checksum: checksum,
                ..
            } => writeln!(
                out,
                "{}: {} ({:.1} MB)",
                d.name(),
                checksum,
                d.size_mb().unwrap_or_default()
            )?,
            Outcome::FetchError { message } => writeln!(out, "{}: ERROR - {}", d.name(), message)?,
        }
    }
    Ok(())
}

/// `verify`: pass/fail per dataset, then a summary line when everything matched.
/// Returns `report.all_ok()`.
pub fn write_verify_report<W: Write>(out: &mut W, report: &VerificationReport) -> io::Result<bool> {
    for d in report.iter() {
        match &d.outcome {
            Outcome::Ok { checksum } => writeln!(out, "[OK] {}: {}", d.name(), checksum)?,
            Outcome::Mismatch {
                fetched_checksum,
                expected_checksum,
            } => writeln!(
                out,
                "[FAIL] {}: S3={} != datasets.py={}",
                d.name(),
                fetched_checksum,
                expected_checksum
            )?,
            Outcome::FetchError { message } => writeln!(out, "[FAIL] {}: {}", d.name(), message)?,
        }
    }
    let all_ok = report.all_ok();
    if all_ok {
        writeln!(out, "All dataset checksums match.")?;
    }
    Ok(all_ok)
}

/// `update`: a replacement `[[dataset]]` table per dataset, built from the
/// fresh checksum and size. Existing catalog metadata is carried over.
pub fn write_update_template<W: Write>(out: &mut W, report: &VerificationReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Updated catalog entries:")?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    for d in report.iter() {
        match &d.outcome {
            Outcome::FetchError { message } => writeln!(out, "# {}: {}", d.name(), message)?,
            _ => write_entry(out, d)?,
        }
    }
    Ok(())
}

fn write_entry<W: Write>(out: &mut W, d: &DatasetVerification) -> io::Result<()> {
    let entry = &d.entry;
    let size_mb = d.size_mb().unwrap_or_default();
    let checksum = d.outcome.fetched_checksum().unwrap_or_default();

    writeln!(out, "[[dataset]]")?;
    writeln!(out, "name = {}", toml_str(&entry.name))?;
    writeln!(out, "key = {}", toml_str(&entry.storage_key))?;
    writeln!(out, "size_mb = {:.0}", size_mb)?;
    match &entry.description {
        Some(desc) => writeln!(out, "description = {}", toml_str(desc))?,
        None => writeln!(
            out,
            "description = {}",
            toml_str(&format!("Complete {} data", entry.name))
        )?,
    }
    writeln!(out, "checksum = {}", toml_str(checksum))?;
    match entry.extracted_size_mb {
        Some(mb) => writeln!(out, "extracted_size_mb = {:.0}", mb)?,
        None => writeln!(out, "extracted_size_mb = {:.0}  # estimate", size_mb * 2.0)?,
    }
    if entry.files.is_empty() {
        writeln!(out, "files = [\"...\"]  # update with actual files")?;
    } else {
        let files: Vec<String> = entry.files.iter().map(|f| toml_str(f)).collect();
        writeln!(out, "files = [{}]", files.join(", "))?;
    }
    match &entry.format {
        Some(format) => writeln!(out, "format = {}", toml_str(format))?,
        None => writeln!(out, "format = \"...\"  # update with actual format")?,
    }
    writeln!(out)?;
    Ok(())
}

/// Quoted, escaped TOML string literal.
fn toml_str(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}
