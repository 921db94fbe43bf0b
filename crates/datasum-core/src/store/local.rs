//! Directory mirror of a bucket: object `key` lives at `root/key`.

use super::{ObjectHead, ObjectStore};
use crate::error::FetchError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a key to a path under `root`. Keys that would escape the root
    /// (absolute paths, `..`) resolve to nothing.
    fn resolve(&self, key: &str) -> Option<PathBuf> {
        let rel = Path::new(key.trim_start_matches('/'));
        let mut out = self.root.clone();
        for comp in rel.components() {
            match comp {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        (out != self.root).then_some(out)
    }

    fn existing_file(&self, key: &str) -> Result<(PathBuf, fs::Metadata), FetchError> {
        let not_found = || FetchError::NotFound {
            key: key.to_string(),
        };
        let path = self.resolve(key).ok_or_else(not_found)?;
        let meta = fs::metadata(&path).map_err(|e| FetchError::io(key, e))?;
        if !meta.is_file() {
            return Err(not_found());
        }
        Ok((path, meta))
    }
}

impl ObjectStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    fn head(&self, key: &str) -> Result<ObjectHead, FetchError> {
        let (_, meta) = self.existing_file(key)?;
        Ok(ObjectHead {
            size: Some(meta.len()),
            etag: None,
            last_modified: None,
        })
    }

    fn download(&self, key: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let (path, meta) = self.existing_file(key)?;
        let mut src = File::open(&path).map_err(|e| FetchError::io(key, e))?;
        let copied = io::copy(&mut src, sink).map_err(|e| FetchError::io(key, e))?;
        if copied != meta.len() {
            return Err(FetchError::Incomplete {
                key: key.to_string(),
                expected: meta.len(),
                received: copied,
            });
        }
        Ok(copied)
    }
}
