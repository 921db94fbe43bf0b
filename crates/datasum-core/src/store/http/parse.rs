//! Parse HTTP response header lines into an `ObjectHead`.

use crate::store::ObjectHead;

/// Status code from a status line such as `HTTP/1.1 404 Not Found`.
pub(crate) fn status_code(line: &str) -> Option<u32> {
    let line = line.trim();
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Parse collected header lines into an `ObjectHead`.
///
/// When redirects were followed the lines cover several responses; each new
/// status line starts over so only the final response counts.
pub(crate) fn parse_headers(lines: &[String]) -> ObjectHead {
    let mut head = ObjectHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if status_code(line).is_some() {
            head = ObjectHead::default();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    head.size = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("etag") {
                head.etag = Some(value.trim_matches('"').to_string());
            }
            if name.eq_ignore_ascii_case("last-modified") {
                head.last_modified = Some(value.to_string());
            }
        }
    }

    head
}
