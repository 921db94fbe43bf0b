//! Dataset catalog: the recorded manifest of storage keys and expected checksums.
//!
//! Stored as TOML with one `[[dataset]]` table per entry; file order is the
//! order datasets are checked and reported in.
//!
//! ```toml
//! [[dataset]]
//! name = "bills"
//! key = "bills/bills.zip"
//! checksum = "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
//! size_mb = 120
//! ```

use crate::digest::TaggedChecksum;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One dataset as recorded in the catalog. Only `name` and `key` are required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    /// Object key in the remote store.
    #[serde(rename = "key")]
    pub storage_key: String,
    /// Tagged checksum, e.g. `sha256:ab12...`. Empty means not recorded yet.
    #[serde(rename = "checksum", default)]
    pub expected_checksum: String,
    /// Compressed artifact size in MiB.
    #[serde(default)]
    pub size_mb: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extracted_size_mb: Option<f64>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub format: Option<String>,
}

impl DatasetEntry {
    pub fn new(name: &str, storage_key: &str, expected_checksum: &str) -> Self {
        Self {
            name: name.to_string(),
            storage_key: storage_key.to_string(),
            expected_checksum: expected_checksum.to_string(),
            size_mb: None,
            description: None,
            extracted_size_mb: None,
            files: Vec::new(),
            format: None,
        }
    }

    pub fn expected_size_bytes(&self) -> Option<u64> {
        self.size_mb.map(|mb| (mb * BYTES_PER_MB).round() as u64)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed catalog {origin}: {message}")]
    Parse { origin: String, message: String },
    #[error("catalog {0} defines no datasets")]
    Empty(String),
    #[error("catalog entry #{index} has an empty '{field}'")]
    EmptyField { index: usize, field: &'static str },
    #[error("dataset '{0}' is defined more than once")]
    DuplicateName(String),
    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "dataset", default)]
    datasets: Vec<DatasetEntry>,
}

/// Ordered, validated set of dataset entries. Read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entries: Vec<DatasetEntry>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&raw, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), datasets = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        Self::parse(raw, "<inline>")
    }

    fn parse(raw: &str, origin: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw).map_err(|e| CatalogError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        if file.datasets.is_empty() {
            return Err(CatalogError::Empty(origin.to_string()));
        }
        Self::from_entries(file.datasets)
    }

    /// Validate entries: names and keys non-empty, names unique.
    ///
    /// A recorded checksum that is not a well-formed `algo:hex` string is kept
    /// as is. It can never equal a computed checksum, so that dataset alone
    /// reports a mismatch.
    pub fn from_entries(entries: Vec<DatasetEntry>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(CatalogError::EmptyField {
                    index,
                    field: "name",
                });
            }
            if entry.storage_key.trim().is_empty() {
                return Err(CatalogError::EmptyField { index, field: "key" });
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(CatalogError::DuplicateName(entry.name.clone()));
            }
            if !entry.expected_checksum.is_empty() {
                if let Err(e) = entry.expected_checksum.parse::<TaggedChecksum>() {
                    tracing::warn!(
                        dataset = %entry.name,
                        "recorded checksum will not match: {}",
                        e
                    );
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&DatasetEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restrict to the named datasets, keeping catalog order. An empty list keeps everything.
    pub fn select(&self, names: &[String]) -> Result<Catalog, CatalogError> {
        if names.is_empty() {
            return Ok(self.clone());
        }
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(CatalogError::UnknownDataset(unknown.clone()));
        }
        let entries = self
            .entries
            .iter()
            .filter(|e| names.contains(&e.name))
            .cloned()
            .collect();
        Ok(Catalog { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUM_A: &str = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn sample() -> String {
        format!(
            r#"
            [[dataset]]
            name = "bills"
            key = "bills/bills.zip"
            checksum = "{SUM_A}"
            size_mb = 1.5
            description = "Complete bills data"
            files = ["bills.csv", "bills.json"]

            [[dataset]]
            name = "amendments"
            key = "amendments.zip"
            "#
        )
    }

    #[test]
    fn parses_in_file_order() {
        let cat = Catalog::from_toml_str(&sample()).unwrap();
        let names: Vec<&str> = cat.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["bills", "amendments"]);
        let bills = cat.get("bills").unwrap();
        assert_eq!(bills.storage_key, "bills/bills.zip");
        assert_eq!(bills.expected_checksum, SUM_A);
        assert_eq!(bills.files.len(), 2);
        assert_eq!(bills.expected_size_bytes(), Some(1_572_864));
        let amendments = cat.get("amendments").unwrap();
        assert!(amendments.expected_checksum.is_empty());
        assert!(amendments.size_mb.is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let raw = r#"
            [[dataset]]
            name = "a"
            key = "a.zip"
            [[dataset]]
            name = "a"
            key = "b.zip"
        "#;
        assert!(matches!(
            Catalog::from_toml_str(raw),
            Err(CatalogError::DuplicateName(n)) if n == "a"
        ));
    }

    #[test]
    fn empty_key_rejected() {
        let raw = "[[dataset]]\nname = \"a\"\nkey = \" \"\n";
        assert!(matches!(
            Catalog::from_toml_str(raw),
            Err(CatalogError::EmptyField { index: 0, field: "key" })
        ));
    }

    #[test]
    fn foreign_checksums_are_loaded_verbatim() {
        let raw = format!(
            r#"
            [[dataset]]
            name = "bills"
            key = "bills.zip"
            checksum = "{SUM_A}"

            [[dataset]]
            name = "legacy"
            key = "legacy.zip"
            checksum = "md5:149603e6c03516362a8da23f624db945"

            [[dataset]]
            name = "untagged"
            key = "untagged.zip"
            checksum = "deadbeef"
            "#
        );
        let cat = Catalog::from_toml_str(&raw).unwrap();
        assert_eq!(cat.len(), 3);
        assert_eq!(
            cat.get("legacy").unwrap().expected_checksum,
            "md5:149603e6c03516362a8da23f624db945"
        );
        assert_eq!(cat.get("untagged").unwrap().expected_checksum, "deadbeef");
    }

    #[test]
    fn syntax_error_and_empty_catalog() {
        assert!(matches!(
            Catalog::from_toml_str("[[dataset]\nname="),
            Err(CatalogError::Parse { .. })
        ));
        assert!(matches!(
            Catalog::from_toml_str(""),
            Err(CatalogError::Empty(_))
        ));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.toml");
        fs::write(&path, sample()).unwrap();
        assert_eq!(Catalog::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn select_keeps_catalog_order() {
        let cat = Catalog::from_toml_str(&sample()).unwrap();
        let picked = cat
            .select(&["amendments".to_string(), "bills".to_string()])
            .unwrap();
        let names: Vec<&str> = picked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["bills", "amendments"]);
        assert_eq!(cat.select(&[]).unwrap().len(), 2);
        assert!(matches!(
            cat.select(&["votes".to_string()]),
            Err(CatalogError::UnknownDataset(n)) if n == "votes"
        ));
    }
}
