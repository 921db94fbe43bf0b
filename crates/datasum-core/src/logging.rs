//! Tracing setup. Events go to `datasum.log` in the XDG state dir; the CLI
//! switches to stderr when that file cannot be opened.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,datasum=debug,datasum_core=debug";
const LOG_FILE_NAME: &str = "datasum.log";

/// Append-only log file. Each event gets its own handle; if the handle cannot
/// be duplicated the event goes to stderr.
struct LogFile(File);

enum LogSink {
    File(File),
    Stderr(io::Stderr),
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr(e) => e.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => LogSink::File(f),
            Err(_) => LogSink::Stderr(io::stderr()),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `$XDG_STATE_HOME/datasum/datasum.log` (usually `~/.local/state/...`).
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("datasum")?;
    Ok(xdg_dirs.get_state_home().join(LOG_FILE_NAME))
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Install the global subscriber writing to the state-dir log file.
/// Errors leave no subscriber installed, so the caller may try `init_logging_stderr`.
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = open_log_file(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(LogFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {e}"))?;

    tracing::info!("logging to {}", path.display());
    Ok(())
}

/// Install a stderr-only subscriber. A no-op if one is already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parents_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("datasum").join(LOG_FILE_NAME);

        let mut first = open_log_file(&path).unwrap();
        first.write_all(b"one\n").unwrap();
        let mut second = open_log_file(&path).unwrap();
        second.write_all(b"two\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn writers_share_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let log = LogFile(open_log_file(&path).unwrap());

        log.make_writer().write_all(b"a").unwrap();
        log.make_writer().write_all(b"b").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ab");
    }

    #[test]
    fn open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();
        let err = open_log_file(&blocker.join(LOG_FILE_NAME)).unwrap_err();
        assert!(format!("{err:#}").contains("not-a-dir"));
    }
}
