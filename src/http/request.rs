use std::collections::HashMap;
use std::fmt;

use crate::http::util::{normalize_header_name, percent_decode_path, split_target, url_decode};
use crate::json::{self, JsonError, Value};

/// HTTP request methods.
///
/// Method tokens are matched case-insensitively when a request is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses an HTTP method token, ignoring ASCII case.
    ///
    /// # Example
    ///
    /// ```
    /// # use switchyard::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Some(Method::GET));
    /// assert_eq!(Method::parse("delete"), Some(Method::DELETE));
    /// assert_eq!(Method::parse("BREW"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded HTTP request.
///
/// Everything except `params` and `query` is fixed once the request has been
/// decoded. The router fills `params`; `query` is filled from the query string.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target exactly as sent (e.g., "/search?q=a%20b")
    pub url: String,
    /// The percent-decoded path without the query string
    pub path: String,
    /// The raw query string, without the leading `?`
    pub query_string: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    /// Request headers keyed by normalized name
    pub headers: HashMap<String, String>,
    /// Whatever followed the header block in the buffered bytes
    pub body: Vec<u8>,
    /// Path parameters bound by the matching route
    pub params: HashMap<String, String>,
    /// Decoded query string parameters
    pub query: HashMap<String, String>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            url: None,
            version: None,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the request target; path and query string are derived from it.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(normalize_header_name(key), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let mut request = Request::new(
            self.method.ok_or("method missing")?,
            self.url.ok_or("url missing")?,
            self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
        );
        request.headers = self.headers;
        request.body = self.body;
        request.parse_query_string();
        Ok(request)
    }
}

impl Request {
    /// Creates a request with no headers, body or parameters.
    ///
    /// The path is the percent-decoded part of `url` before the first `?`.
    pub fn new(method: Method, url: impl Into<String>, version: impl Into<String>) -> Self {
        let url = url.into();
        let (path, query_string) = split_target(&url);
        let path = percent_decode_path(path);
        let query_string = query_string.to_string();

        Self {
            method,
            url,
            path,
            query_string,
            version: version.into(),
            headers: HashMap::new(),
            body: Vec::new(),
            params: HashMap::new(),
            query: HashMap::new(),
        }
    }

    /// Retrieves a header value by name; the name is normalized before lookup.
    ///
    /// # Example
    ///
    /// ```
    /// # use switchyard::http::request::{Method, RequestBuilder};
    /// let req = RequestBuilder::new()
    ///     .method(Method::GET)
    ///     .url("/")
    ///     .header("content-type", "text/html")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(req.header("CONTENT-TYPE"), Some("text/html"));
    /// ```
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&normalize_header_name(key))
            .map(|v| v.as_str())
    }

    /// Path parameter bound by the router.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|v| v.as_str())
    }

    /// Decoded query string parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|v| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Returns `true` when the Content-Type header contains `ty`.
    pub fn is(&self, ty: &str) -> bool {
        self.content_type().is_some_and(|ct| ct.contains(ty))
    }

    /// Retrieves the Content-Length header value and parses it as a usize.
    ///
    /// Returns 0 if the header is missing or not a valid number.
    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Parses the body as JSON. Invalid UTF-8 is replaced before parsing.
    pub fn json(&self) -> Result<Value, JsonError> {
        json::parse(&String::from_utf8_lossy(&self.body))
    }

    /// Fills `query` from `query_string`.
    ///
    /// Pairs are split on `&`, then on the first `=`; both halves are URL-decoded.
    /// Pairs without `=` are ignored and later duplicates win.
    pub fn parse_query_string(&mut self) {
        self.query = parse_pairs(&self.query_string);
    }

    /// Adds the fields of an `application/x-www-form-urlencoded` body to `params`.
    ///
    /// Does nothing for other content types.
    pub fn parse_form_body(&mut self) {
        if !self.is("application/x-www-form-urlencoded") {
            return;
        }

        for (name, value) in url::form_urlencoded::parse(&self.body) {
            self.params.insert(name.into_owned(), value.into_owned());
        }
    }
}

fn parse_pairs(s: &str) -> HashMap<String, String> {
    s.split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (url_decode(name), url_decode(value)))
        .collect()
}
