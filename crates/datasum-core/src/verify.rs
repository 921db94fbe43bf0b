//! Verification across a whole catalog.
//!
//! Every catalog entry produces exactly one `Outcome`, in catalog order. A
//! fetch failure on one dataset is recorded against that dataset and the run
//! continues with the next one.

use crate::catalog::{Catalog, DatasetEntry};
use crate::digest::Algorithm;
use crate::fetch::{compute_checksum_in, ChecksumResult};
use crate::store::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const SIZE_DRIFT_BYTES: u64 = 1024 * 1024;

/// Result of checking one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Remote checksum equals the recorded one.
    Ok { checksum: String },
    /// Fetch succeeded but the checksums differ (algorithm tag included).
    Mismatch {
        fetched_checksum: String,
        expected_checksum: String,
    },
    /// The object could not be retrieved.
    FetchError { message: String },
}

impl Outcome {
    /// Compare a fresh checksum against the catalog's expectation.
    pub fn compare(fetched: &ChecksumResult, expected_checksum: &str) -> Self {
        if fetched.checksum == expected_checksum {
            Outcome::Ok {
                checksum: fetched.checksum.clone(),
            }
        } else {
            Outcome::Mismatch {
                fetched_checksum: fetched.checksum.clone(),
                expected_checksum: expected_checksum.to_string(),
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }

    /// Checksum of the remote object, when it could be fetched.
    pub fn fetched_checksum(&self) -> Option<&str> {
        match self {
            Outcome::Ok { checksum } => Some(checksum),
            Outcome::Mismatch {
                fetched_checksum, ..
            } => Some(fetched_checksum),
            Outcome::FetchError { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Ok { .. } => "OK",
            Outcome::Mismatch { .. } => "MISMATCH",
            Outcome::FetchError { .. } => "FETCH_ERROR",
        }
    }
}

/// Outcome for one dataset plus what was learned about its remote object.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetVerification {
    pub entry: DatasetEntry,
    /// Size of the fetched object; `None` when the fetch failed.
    pub size_bytes: Option<u64>,
    pub outcome: Outcome,
}

impl DatasetVerification {
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn size_mb(&self) -> Option<f64> {
        self.size_bytes.map(|b| b as f64 / BYTES_PER_MB)
    }

    fn fetch_failed(entry: &DatasetEntry, message: String) -> Self {
        Self {
            entry: entry.clone(),
            size_bytes: None,
            outcome: Outcome::FetchError { message },
        }
    }
}

/// Ordered outcomes for a catalog run, keyed by dataset name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    datasets: Vec<DatasetVerification>,
}

impl VerificationReport {
    pub fn iter(&self) -> impl Iterator<Item = &DatasetVerification> {
        self.datasets.iter()
    }

    pub fn get(&self, name: &str) -> Option<&DatasetVerification> {
        self.datasets.iter().find(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// True iff every dataset's outcome is `Ok`.
    pub fn all_ok(&self) -> bool {
        self.datasets.iter().all(|d| d.outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &DatasetVerification> {
        self.datasets.iter().filter(|d| !d.outcome.is_ok())
    }
}

impl FromIterator<DatasetVerification> for VerificationReport {
    fn from_iter<I: IntoIterator<Item = DatasetVerification>>(iter: I) -> Self {
        Self {
            datasets: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub algorithm: Algorithm,
    /// Directory for scratch copies (None = system temp dir).
    pub scratch_dir: Option<PathBuf>,
}

/// Fetch, hash and classify a single dataset. Never fails: fetch problems
/// become `Outcome::FetchError`.
pub fn verify_entry(
    store: &dyn ObjectStore,
    entry: &DatasetEntry,
    opts: &VerifyOptions,
) -> DatasetVerification {
    let fetched = compute_checksum_in(
        store,
        &entry.storage_key,
        opts.algorithm,
        opts.scratch_dir.as_deref(),
    );
    let verification = match fetched {
        Ok(result) => {
            warn_on_size_drift(entry, result.size_bytes);
            DatasetVerification {
                entry: entry.clone(),
                size_bytes: Some(result.size_bytes),
                outcome: Outcome::compare(&result, &entry.expected_checksum),
            }
        }
        Err(e) => {
            tracing::warn!(dataset = %entry.name, key = %entry.storage_key, "fetch failed: {}", e);
            DatasetVerification::fetch_failed(entry, e.to_string())
        }
    };
    tracing::info!(
        dataset = %entry.name,
        outcome = verification.outcome.label(),
        "dataset checked"
    );
    verification
}

/// `size_mb` in the catalog is informational and rounded, so only a gross
/// difference is worth a warning. It never changes the outcome.
fn warn_on_size_drift(entry: &DatasetEntry, fetched_bytes: u64) {
    let Some(recorded) = entry.expected_size_bytes() else {
        return;
    };
    if recorded.abs_diff(fetched_bytes) > SIZE_DRIFT_BYTES {
        tracing::warn!(
            dataset = %entry.name,
            recorded_bytes = recorded,
            bytes = fetched_bytes,
            "object size differs from catalog size_mb"
        );
    }
}

/// Check every catalog entry one at a time, in catalog order.
pub fn verify_all(
    store: &dyn ObjectStore,
    catalog: &Catalog,
    opts: &VerifyOptions,
) -> VerificationReport {
    catalog
        .iter()
        .map(|entry| verify_entry(store, entry, opts))
        .collect()
}

/// Check the catalog with up to `max_concurrent` datasets in flight.
///
/// Fetches run on the blocking pool. The report keeps catalog order no matter
/// which fetch finishes first; a worker that dies still yields a
/// `FetchError` outcome for its dataset.
pub async fn verify_all_concurrent(
    store: Arc<dyn ObjectStore>,
    catalog: &Catalog,
    opts: &VerifyOptions,
    max_concurrent: usize,
) -> VerificationReport {
    let max_concurrent = max_concurrent.max(1);
    let entries = catalog.entries();
    let mut slots: Vec<Option<DatasetVerification>> = vec![None; entries.len()];
    let mut join_set = tokio::task::JoinSet::new();
    let mut next = 0usize;

    loop {
        while join_set.len() < max_concurrent && next < entries.len() {
            let index = next;
            let entry = entries[index].clone();
            let store = Arc::clone(&store);
            let opts = opts.clone();
            join_set.spawn_blocking(move || (index, verify_entry(&*store, &entry, &opts)));
            next += 1;
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok((index, verification)) => slots[index] = Some(verification),
            Err(e) => tracing::error!("verification task failed: {}", e),
        }
    }

    entries
        .iter()
        .zip(slots)
        .map(|(entry, slot)| {
            slot.unwrap_or_else(|| {
                DatasetVerification::fetch_failed(entry, "verification task failed".to_string())
            })
        })
        .collect()
}
