//! S3-compatible HTTP backend.
//!
//! Objects are addressed path-style as `{endpoint}/{bucket}/{key}` (leave the
//! bucket empty for virtual-host endpoints). Uses the curl crate (libcurl) for
//! both the HEAD probe and the GET; each call builds its own `Easy` handle and
//! runs on the current thread.

mod parse;

use super::{ObjectHead, ObjectStore};
use crate::error::FetchError;
use anyhow::{ensure, Result};
use std::cell::Cell;
use std::io::Write;
use std::str;
use std::time::Duration;
use url::Url;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct HttpStore {
    base: Url,
    bucket: String,
    bearer_token: Option<String>,
    connect_timeout: Duration,
    timeout: Duration,
}

impl HttpStore {
    pub fn new(endpoint: &str, bucket: &str) -> Result<Self> {
        let base = Url::parse(endpoint)?;
        ensure!(!base.cannot_be_a_base(), "endpoint cannot carry an object path");
        Ok(Self {
            base,
            bucket: bucket.trim_matches('/').to_string(),
            bearer_token: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, overall: Duration) -> Self {
        self.connect_timeout = connect;
        self.timeout = overall;
        self
    }

    /// Full URL for `key`; key segments are percent-encoded.
    pub fn object_url(&self, key: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            if !self.bucket.is_empty() {
                segments.push(&self.bucket);
            }
            segments.extend(key.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    fn easy_for(&self, key: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(self.object_url(key).as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        // Abort stalled transfers: below 1 KiB/s for a full minute.
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;
        if let Some(token) = &self.bearer_token {
            let mut list = curl::easy::List::new();
            list.append(&format!("Authorization: Bearer {}", token.trim()))?;
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

fn is_success(code: u32) -> bool {
    (200..300).contains(&code)
}

impl ObjectStore for HttpStore {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    fn head(&self, key: &str) -> Result<ObjectHead, FetchError> {
        let transport = |source: curl::Error| FetchError::Transport {
            key: key.to_string(),
            source,
        };
        let mut headers: Vec<String> = Vec::new();

        let mut easy = self.easy_for(key).map_err(transport)?;
        easy.nobody(true).map_err(transport)?;
        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        headers.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(transport)?;
            transfer.perform().map_err(transport)?;
        }

        let code = easy.response_code().map_err(transport)?;
        if !is_success(code) {
            return Err(FetchError::from_status("HEAD", key, code));
        }
        Ok(parse::parse_headers(&headers))
    }

    fn download(&self, key: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let transport = |source: curl::Error| FetchError::Transport {
            key: key.to_string(),
            source,
        };
        let mut headers: Vec<String> = Vec::new();
        let status = Cell::new(0u32);
        let mut written = 0u64;
        let mut sink_error = None;

        let mut easy = self.easy_for(key).map_err(transport)?;
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        if let Some(code) = parse::status_code(s) {
                            status.set(code);
                        }
                        headers.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(transport)?;
            transfer
                .write_function(|data| {
                    // Error bodies (S3 XML, redirect pages) never reach the sink.
                    if !is_success(status.get()) {
                        return Ok(data.len());
                    }
                    match sink.write_all(data) {
                        Ok(()) => {
                            written += data.len() as u64;
                            Ok(data.len())
                        }
                        Err(e) => {
                            sink_error = Some(e);
                            Ok(0) // abort transfer
                        }
                    }
                })
                .map_err(transport)?;
            transfer.perform()
        };

        if let Some(source) = sink_error {
            return Err(FetchError::Io {
                key: key.to_string(),
                source,
            });
        }
        performed.map_err(transport)?;

        let code = easy.response_code().map_err(transport)?;
        if !is_success(code) {
            return Err(FetchError::from_status("GET", key, code));
        }

        if let Some(expected) = parse::parse_headers(&headers).size {
            if written != expected {
                return Err(FetchError::Incomplete {
                    key: key.to_string(),
                    expected,
                    received: written,
                });
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_url_path_style() {
        let store = HttpStore::new("https://s3.amazonaws.com", "datasets").unwrap();
        assert_eq!(
            store.object_url("bills/bills.zip").as_str(),
            "https://s3.amazonaws.com/datasets/bills/bills.zip"
        );
    }

    #[test]
    fn object_url_trailing_slash_and_encoding() {
        let store = HttpStore::new("http://127.0.0.1:9000/", "/datasets/").unwrap();
        assert_eq!(
            store.object_url("/raw/a b.zip").as_str(),
            "http://127.0.0.1:9000/datasets/raw/a%20b.zip"
        );
    }

    #[test]
    fn object_url_virtual_host_style() {
        let store = HttpStore::new("https://datasets.s3.amazonaws.com", "").unwrap();
        assert_eq!(
            store.object_url("a.zip").as_str(),
            "https://datasets.s3.amazonaws.com/a.zip"
        );
    }

    #[test]
    fn blank_bearer_token_is_ignored() {
        let store = HttpStore::new("https://s3.amazonaws.com", "b")
            .unwrap()
            .with_bearer_token(Some("  ".into()));
        assert!(store.bearer_token.is_none());
    }

    #[test]
    fn rejects_non_base_endpoint() {
        assert!(HttpStore::new("mailto:ops@example.com", "b").is_err());
    }
}
