use std::collections::HashMap;
use std::path::Path;

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::http::mime;
use crate::http::util::normalize_header_name;
use crate::json::{self, Value};

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = concat!("Switchyard/", env!("CARGO_PKG_VERSION"));

/// An HTTP status code.
///
/// Any `u16` is accepted; codes outside the built-in table get the reason
/// phrase `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use switchyard::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use switchyard::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    /// assert_eq!(StatusCode(418).reason_phrase(), "Unknown");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            _ => "Unknown",
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

/// An outbound HTTP response, filled in by middleware and handlers.
///
/// Responses start as `200 OK` with `Content-Type: text/plain`, the `Server`
/// header and `Connection: close`. A terminal call (`send`, `json`,
/// `send_file`, `redirect`) ends the response; later terminal calls are
/// ignored so the body and `Content-Length` stay consistent.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers keyed by normalized name
    pub headers: HashMap<String, String>,
    /// Response body as bytes
    pub body: Vec<u8>,
    headers_finalized: bool,
    ended: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        let mut response = Self {
            status: StatusCode::OK,
            headers: HashMap::new(),
            body: Vec::new(),
            headers_finalized: false,
            ended: false,
        };
        response.set_default_headers();
        response
    }

    /// Sets the status code. The reason phrase follows from the code.
    ///
    /// Ignored once the response has ended.
    pub fn status(&mut self, code: u16) -> &mut Self {
        if self.ended {
            tracing::warn!(
                status = self.status.as_u16(),
                ignored = code,
                "response already ended, ignoring status"
            );
            return self;
        }

        self.status = StatusCode(code);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn status_text(&self) -> &'static str {
        self.status.reason_phrase()
    }

    /// Adds or replaces a header; the name is normalized.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> &mut Self {
        self.headers.insert(normalize_header_name(field), value.into());
        self
    }

    /// Alias of [`Response::set`].
    pub fn header(&mut self, field: &str, value: impl Into<String>) -> &mut Self {
        self.set(field, value)
    }

    pub fn get_header(&self, field: &str) -> Option<&str> {
        self.headers
            .get(&normalize_header_name(field))
            .map(|v| v.as_str())
    }

    /// Whether a terminal call has completed.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Whether `Content-Length` has been fixed.
    pub fn headers_finalized(&self) -> bool {
        self.headers_finalized
    }

    /// Sets the body and ends the response.
    pub fn send(&mut self, data: impl Into<Vec<u8>>) -> &mut Self {
        if self.ended {
            tracing::warn!(status = self.status.as_u16(), "response already ended, ignoring send");
            return self;
        }

        self.body = data.into();
        self.finalize_headers();
        self.ended = true;
        self
    }

    /// Serializes `value` as the body with `Content-Type: application/json`.
    pub fn json(&mut self, value: &Value) -> &mut Self {
        self.json_text(json::stringify(value))
    }

    /// Sends already-serialized JSON text.
    pub fn json_text(&mut self, text: impl Into<String>) -> &mut Self {
        if !self.ended {
            self.set("Content-Type", "application/json");
        }
        self.send(text.into())
    }

    /// Sends a file from disk with a Content-Type derived from its extension.
    ///
    /// Responds `404 File not found` when the file cannot be read. Handlers are
    /// synchronous, so the read blocks; on a multi-threaded runtime the worker
    /// hands its other tasks off first.
    pub fn send_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = path.as_ref();
        if self.ended {
            tracing::warn!(path = %path.display(), "response already ended, ignoring send_file");
            return self;
        }

        match read_file(path) {
            Ok(content) => {
                self.set("Content-Type", mime::from_path(path));
                self.send(content)
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "send_file failed");
                self.status(StatusCode::NOT_FOUND.as_u16()).send("File not found")
            }
        }
    }

    /// Responds `302 Found` with a `Location` header and an empty body.
    pub fn redirect(&mut self, url: &str) -> &mut Self {
        if !self.ended {
            self.status(StatusCode::FOUND.as_u16()).set("Location", url);
        }
        self.send(Vec::<u8>::new())
    }

    pub fn ok(&mut self) -> &mut Self {
        self.status(StatusCode::OK.as_u16())
    }

    pub fn created(&mut self) -> &mut Self {
        self.status(StatusCode::CREATED.as_u16())
    }

    pub fn no_content(&mut self) -> &mut Self {
        self.status(StatusCode::NO_CONTENT.as_u16())
    }

    pub fn bad_request(&mut self) -> &mut Self {
        self.status(StatusCode::BAD_REQUEST.as_u16())
    }

    pub fn unauthorized(&mut self) -> &mut Self {
        self.status(StatusCode::UNAUTHORIZED.as_u16())
    }

    pub fn forbidden(&mut self) -> &mut Self {
        self.status(StatusCode::FORBIDDEN.as_u16())
    }

    pub fn not_found(&mut self) -> &mut Self {
        self.status(StatusCode::NOT_FOUND.as_u16())
    }

    pub fn internal_server_error(&mut self) -> &mut Self {
        self.status(StatusCode::INTERNAL_SERVER_ERROR.as_u16())
    }

    /// Resets status, headers, body and flags to a fresh response.
    pub fn clear(&mut self) {
        *self = Response::new();
    }

    /// Fills in any default header that is missing and asserts `Connection: close`.
    pub fn set_default_headers(&mut self) {
        self.headers
            .entry("Content-Type".to_string())
            .or_insert_with(|| "text/plain".to_string());
        self.set("Server", SERVER_NAME);
        self.set("Connection", "close");
    }

    /// Computes `Content-Length` from the body, once.
    pub fn finalize_headers(&mut self) {
        if self.headers_finalized {
            return;
        }
        let len = self.body.len().to_string();
        self.set("Content-Length", len);
        self.headers_finalized = true;
    }

    /// Serializes the response for the wire.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        crate::http::writer::serialize_response(self)
    }

    /// Creates a 404 Not Found response.
    pub fn with_not_found() -> Self {
        let mut response = Response::new();
        response.not_found().send("Not Found");
        response
    }

    /// Creates a 400 Bad Request response.
    pub fn with_bad_request() -> Self {
        let mut response = Response::new();
        response.bad_request().send("Bad Request");
        response
    }
}

fn read_file(path: &Path) -> std::io::Result<Vec<u8>> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| std::fs::read(path))
        }
        _ => std::fs::read(path),
    }
}
