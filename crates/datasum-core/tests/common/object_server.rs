//! Minimal HTTP/1.1 object server for integration tests.
//!
//! Serves a fixed set of objects by path. HEAD returns Content-Length, ETag
//! and Last-Modified; GET returns the body. Unknown paths get 404 with an
//! S3-style XML error body.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// Sent with every successful HEAD.
pub const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";

#[derive(Debug, Clone, Default)]
pub struct ObjectServerOptions {
    /// Paths answered with 403 Forbidden.
    pub denied: HashSet<String>,
    /// Paths whose GET advertises more bytes than it sends, then hangs up.
    pub truncated: HashSet<String>,
    /// If set, requests without `Authorization: Bearer <token>` get 401.
    pub bearer_token: Option<String>,
}

pub struct ObjectServer {
    pub base_url: String,
    gets: Arc<AtomicUsize>,
}

impl ObjectServer {
    /// Number of GET requests served so far (any status).
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. `objects` maps paths such as
/// "datasets/a.zip" to bodies. The server runs until the process exits.
pub fn start(objects: HashMap<String, Vec<u8>>) -> ObjectServer {
    start_with_options(objects, ObjectServerOptions::default())
}

pub fn start_with_options(
    objects: HashMap<String, Vec<u8>>,
    opts: ObjectServerOptions,
) -> ObjectServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let objects = Arc::new(objects);
    let opts = Arc::new(opts);
    let gets = Arc::new(AtomicUsize::new(0));
    let gets_srv = Arc::clone(&gets);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let objects = Arc::clone(&objects);
            let opts = Arc::clone(&opts);
            let gets = Arc::clone(&gets_srv);
            thread::spawn(move || handle(stream, &objects, &opts, &gets));
        }
    });
    ObjectServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        gets,
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, length: usize, body: &[u8]) {
    respond_with(stream, status, length, "", body);
}

/// Like `respond`, with extra header lines (each ending in CRLF).
fn respond_with(
    stream: &mut std::net::TcpStream,
    status: &str,
    length: usize,
    extra_headers: &str,
    body: &[u8],
) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status, length, extra_headers
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn handle(
    mut stream: std::net::TcpStream,
    objects: &HashMap<String, Vec<u8>>,
    opts: &ObjectServerOptions,
    gets: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, auth) = parse_request(request);
    let is_head = method.eq_ignore_ascii_case("HEAD");
    if method.eq_ignore_ascii_case("GET") {
        gets.fetch_add(1, Ordering::SeqCst);
    } else if !is_head {
        respond(&mut stream, "405 Method Not Allowed", 0, b"");
        return;
    }

    if let Some(token) = &opts.bearer_token {
        if auth != Some(format!("Bearer {}", token)) {
            respond(&mut stream, "401 Unauthorized", 0, b"");
            return;
        }
    }
    if opts.denied.contains(&path) {
        respond(&mut stream, "403 Forbidden", 0, b"");
        return;
    }
    let Some(body) = objects.get(&path) else {
        let xml: &[u8] = b"<Error><Code>NoSuchKey</Code></Error>";
        let body = if is_head { &b""[..] } else { xml };
        respond(&mut stream, "404 Not Found", xml.len(), body);
        return;
    };

    if is_head {
        let meta = format!(
            "ETag: \"{:x}-{}\"\r\nLast-Modified: {}\r\n",
            body.iter().map(|&b| u64::from(b)).sum::<u64>(),
            body.len(),
            LAST_MODIFIED
        );
        respond_with(&mut stream, "200 OK", body.len(), &meta, b"");
    } else if opts.truncated.contains(&path) {
        let half = &body[..body.len() / 2];
        respond(&mut stream, "200 OK", body.len(), half);
    } else {
        respond(&mut stream, "200 OK", body.len(), body);
    }
}

/// Returns (method, path without leading slash, Authorization header value).
fn parse_request(request: &str) -> (&str, String, Option<String>) {
    let mut method = "";
    let mut path = String::new();
    let mut auth = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts
                .next()
                .unwrap_or("/")
                .trim_start_matches('/')
                .to_string();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("authorization") {
                auth = Some(value.trim().to_string());
            }
        }
    }
    (method, path, auth)
}
