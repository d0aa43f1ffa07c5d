use thiserror::Error;

use crate::http::request::{Method, Request};
use crate::http::util::{normalize_header_name, trim};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty request")]
    Empty,
    #[error("malformed request line")]
    InvalidRequest,
    #[error("unsupported method {0:?}")]
    InvalidMethod(String),
    #[error("header block is not valid UTF-8")]
    InvalidEncoding,
}

/// Decodes one request from the bytes read off a connection.
///
/// Everything after the first `\r\n\r\n` becomes the body as-is; its length
/// is not checked against `Content-Length`. When the terminator is missing
/// (the peer closed early) the whole buffer is treated as the header block.
/// Header lines without a `:` are skipped.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    if buf.is_empty() {
        return Err(ParseError::Empty);
    }

    // Look for header/body separator
    let (header_bytes, body_bytes) = match find_headers_end(buf) {
        Some(end) => (&buf[..end], &buf[end + 4..]),
        None => (buf, &[][..]),
    };

    let headers_str =
        std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let target = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    let method =
        Method::parse(method_str).ok_or_else(|| ParseError::InvalidMethod(method_str.to_string()))?;

    let mut request = Request::new(method, target, version);

    // Headers
    for line in lines {
        let line = trim(line);
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            tracing::trace!(line, "skipping header line without ':'");
            continue;
        };

        request
            .headers
            .insert(normalize_header_name(trim(key)), trim(value).to_string());
    }

    // Body
    request.body = body_bytes.to_vec();
    request.parse_query_string();

    Ok(request)
}

/// Offset of the `\r\n\r\n` that ends the header block.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Whether `buf` holds the full header block plus `Content-Length` body bytes.
///
/// Only used when the server is configured to wait for the body.
pub fn is_body_complete(buf: &[u8], headers_end: usize) -> bool {
    let Ok(head) = std::str::from_utf8(&buf[..headers_end]) else {
        return true;
    };

    let content_length = head
        .split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| trim(name).eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| trim(value).parse::<usize>().ok())
        .unwrap_or(0);

    buf.len() - (headers_end + 4) >= content_length
}
