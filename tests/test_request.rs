use switchyard::http::request::{Method, Request, RequestBuilder};
use switchyard::json::Value;

#[test]
fn test_request_header_retrieval() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .url("/")
        .header("Host", "example.com")
        .header("content-type", "application/json")
        .build()
        .unwrap();

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
    assert_eq!(req.content_type(), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_content_length_parsing() {
    let mut req = Request::new(Method::POST, "/api", "HTTP/1.1");
    assert_eq!(req.content_length(), 0);

    req.headers.insert("Content-Length".to_string(), "42".to_string());
    assert_eq!(req.content_length(), 42);

    req.headers.insert("Content-Length".to_string(), "not-a-number".to_string());
    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_path_is_decoded_without_query() {
    let req = Request::new(Method::GET, "/files/my%20doc.txt?download=1", "HTTP/1.1");

    assert_eq!(req.path, "/files/my doc.txt");
    assert_eq!(req.query_string, "download=1");
    assert_eq!(req.url, "/files/my%20doc.txt?download=1");
}

#[test]
fn test_builder_requires_method_and_url() {
    assert!(RequestBuilder::new().url("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());

    let req = RequestBuilder::new().method(Method::GET).url("/").build().unwrap();
    assert_eq!(req.version, "HTTP/1.1");
}

#[test]
fn test_query_parameters_are_url_decoded() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .url("/search?q=caf%C3%A9+au+lait&tag=a%26b&empty=&page=1&page=2")
        .build()
        .unwrap();

    assert_eq!(req.query("q"), Some("café au lait"));
    assert_eq!(req.query("tag"), Some("a&b"));
    assert_eq!(req.query("empty"), Some(""));
    assert_eq!(req.query("page"), Some("2"));
    assert_eq!(req.query("missing"), None);
}

#[test]
fn test_is_checks_content_type_substring() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .url("/upload")
        .header("Content-Type", "multipart/form-data; boundary=xyz")
        .build()
        .unwrap();

    assert!(req.is("multipart/form-data"));
    assert!(!req.is("application/json"));

    let bare = Request::new(Method::POST, "/upload", "HTTP/1.1");
    assert!(!bare.is("multipart/form-data"));
}

#[test]
fn test_json_body() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .url("/api/users")
        .header("Content-Type", "application/json")
        .body(r#"{"name":"X","email":"y@z.com"}"#)
        .build()
        .unwrap();

    let body = req.json().unwrap();
    assert_eq!(body.get("name").and_then(Value::as_str), Some("X"));
    assert_eq!(req.text().unwrap(), r#"{"name":"X","email":"y@z.com"}"#);
}

#[test]
fn test_malformed_json_body_is_an_error() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .url("/api/users")
        .body("{\"name\":")
        .build()
        .unwrap();

    assert!(req.json().is_err());
}

#[test]
fn test_form_body_fills_params() {
    let mut req = RequestBuilder::new()
        .method(Method::POST)
        .url("/login")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("user=ada+l&pass=p%40ss")
        .build()
        .unwrap();

    req.parse_form_body();
    assert_eq!(req.param("user"), Some("ada l"));
    assert_eq!(req.param("pass"), Some("p@ss"));
}

#[test]
fn test_form_body_ignored_for_other_content_types() {
    let mut req = RequestBuilder::new()
        .method(Method::POST)
        .url("/login")
        .header("Content-Type", "text/plain")
        .body("user=ada")
        .build()
        .unwrap();

    req.parse_form_body();
    assert!(req.params.is_empty());
}

#[test]
fn test_method_display_and_parse() {
    assert_eq!(Method::PATCH.to_string(), "PATCH");
    assert_eq!(Method::parse("options"), Some(Method::OPTIONS));
    assert_eq!(Method::parse("CONNECT"), None);
}
