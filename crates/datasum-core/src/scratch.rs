//! Scoped local copy of a remote object.
//!
//! The scratch file lives exactly as long as the `ScratchBuffer` value: it is
//! removed when the buffer is closed or dropped, including on early returns
//! from a failed download or digest.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const PREFIX: &str = "datasum-";
const SUFFIX: &str = ".part";

pub struct ScratchBuffer {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl ScratchBuffer {
    /// Create an empty scratch file in `dir`, or the system temp dir when `None`.
    pub fn create(dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX).suffix(SUFFIX);
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let path = file.path().to_path_buf();
        tracing::trace!(path = %path.display(), "scratch buffer created");
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sink for the download. Writes go to the end of what has been written so far.
    pub fn writer(&mut self) -> io::Result<&mut File> {
        self.file_mut()
    }

    /// Flush pending writes and position the file at offset 0 for reading.
    pub fn rewind(&mut self) -> io::Result<&mut File> {
        let f = self.file_mut()?;
        f.flush()?;
        f.seek(SeekFrom::Start(0))?;
        Ok(f)
    }

    /// Delete the scratch file now, reporting any error from the removal.
    pub fn close(mut self) -> io::Result<()> {
        match self.file.take() {
            Some(f) => f.close(),
            None => Ok(()),
        }
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .map(NamedTempFile::as_file_mut)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "scratch buffer already closed"))
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        // NamedTempFile removes the file on drop; only the log line is ours.
        if self.file.take().is_some() {
            tracing::trace!(path = %self.path.display(), "scratch buffer released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn write_rewind_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = ScratchBuffer::create(Some(dir.path())).unwrap();
        buf.writer().unwrap().write_all(b"abc").unwrap();
        buf.writer().unwrap().write_all(b"def").unwrap();
        let mut out = String::new();
        buf.rewind().unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "abcdef");
    }

    #[test]
    fn file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut buf = ScratchBuffer::create(Some(dir.path())).unwrap();
            buf.writer().unwrap().write_all(b"payload").unwrap();
            let p = buf.path().to_path_buf();
            assert!(p.exists());
            p
        };
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn file_removed_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let buf = ScratchBuffer::create(Some(dir.path())).unwrap();
        let path = buf.path().to_path_buf();
        buf.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn scratch_name_has_part_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let buf = ScratchBuffer::create(Some(dir.path())).unwrap();
        let name = buf.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(PREFIX));
        assert!(name.ends_with(SUFFIX));
    }
}
