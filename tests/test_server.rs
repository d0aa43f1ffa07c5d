use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use switchyard::config::Config;
use switchyard::error::ServerError;
use switchyard::http::request::Method;
use switchyard::json::{self, Value};
use switchyard::server::{App, Server};

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

async fn send_raw(addr: SocketAddr, raw: &[u8]) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();

    let text = String::from_utf8(buf).unwrap();
    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split(' ').nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Reply {
        status,
        headers,
        body: body.to_string(),
    }
}

async fn request(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> Reply {
    let mut raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n");
    if let Some(body) = body {
        raw.push_str("Content-Type: application/json\r\n");
        raw.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
    } else {
        raw.push_str("\r\n");
    }
    send_raw(addr, raw.as_bytes()).await
}

fn test_app() -> App {
    let mut app = App::new();
    app.listen(0, "127.0.0.1");

    app.use_middleware(|req, res, next| {
        res.set("Access-Control-Allow-Origin", "*");
        if req.method == Method::OPTIONS {
            res.no_content().send("");
            return;
        }
        next.run(req, res);
    });

    app.get("/hello/:name", |req, res| {
        let name = req.param("name").unwrap_or_default();
        res.send(format!("Hello, {name}!"));
    });

    app.post("/api/users", |req, res| {
        let Ok(body) = req.json() else {
            res.bad_request()
                .json(&Value::object([("error", "Invalid JSON")]));
            return;
        };
        let name = body.get("name").cloned().unwrap_or_default();
        let email = body.get("email").cloned().unwrap_or_default();

        res.created().json(&Value::object([
            ("id", Value::from(4)),
            ("name", name),
            ("email", email),
        ]));
    });

    app.get("/search", |req, res| {
        res.json(&Value::object([
            ("q", req.query("q").unwrap_or_default()),
            ("page", req.query("page").unwrap_or("1")),
        ]));
    });

    app.get("/old-page", |_req, res| {
        res.redirect("/new-page");
    });

    app
}

async fn start(app: App) -> Server {
    app.start().await.unwrap()
}

#[tokio::test]
async fn test_get_with_path_parameter() {
    let server = start(test_app()).await;

    let reply = request(server.local_addr(), "GET", "/hello/Ada", None).await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "Hello, Ada!");
    assert_eq!(reply.header("Content-Length"), Some("11"));
    assert_eq!(reply.header("Connection"), Some("close"));
    assert_eq!(reply.header("Access-Control-Allow-Origin"), Some("*"));
    assert!(reply.header("Server").unwrap().starts_with("Switchyard/"));
}

#[tokio::test]
async fn test_post_json_creates_user() {
    let server = start(test_app()).await;

    let reply = request(
        server.local_addr(),
        "POST",
        "/api/users",
        Some(r#"{"name":"X","email":"y@z.com"}"#),
    )
    .await;

    assert_eq!(reply.status, 201);
    assert_eq!(reply.header("Content-Type"), Some("application/json"));
    assert!(reply.body.contains(r#""name":"X""#));

    let body = json::parse(&reply.body).unwrap();
    assert_eq!(body.get("email").and_then(Value::as_str), Some("y@z.com"));
}

#[tokio::test]
async fn test_malformed_json_is_handled_by_handler() {
    let server = start(test_app()).await;

    let reply = request(server.local_addr(), "POST", "/api/users", Some("{\"name\":")).await;

    assert_eq!(reply.status, 400);
    assert_eq!(reply.body, r#"{"error":"Invalid JSON"}"#);
}

#[tokio::test]
async fn test_deeply_nested_json_is_rejected_by_handler() {
    let server = start(test_app()).await;
    let addr = server.local_addr();

    let body = "[".repeat(2_000);
    let reply = request(addr, "POST", "/api/users", Some(&body)).await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body, r#"{"error":"Invalid JSON"}"#);

    let reply = request(addr, "GET", "/hello/still-up", None).await;
    assert_eq!(reply.body, "Hello, still-up!");
}

#[tokio::test]
async fn test_middleware_that_ends_response_keeps_its_status() {
    let mut app = App::new();
    app.listen(0, "127.0.0.1");
    app.use_middleware(|req, res, next| {
        if req.path == "/cached" {
            res.send("from cache");
        }
        next.run(req, res);
    });
    let server = start(app).await;

    let reply = request(server.local_addr(), "GET", "/cached", None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "from cache");
}

#[tokio::test]
async fn test_unregistered_path_is_404() {
    let server = start(test_app()).await;

    let reply = request(server.local_addr(), "GET", "/does/not/exist", None).await;

    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, "Not Found");
    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
}

#[tokio::test]
async fn test_wrong_method_is_404() {
    let server = start(test_app()).await;

    let reply = request(server.local_addr(), "DELETE", "/hello/Ada", None).await;
    assert_eq!(reply.status, 404);
}

#[tokio::test]
async fn test_middleware_short_circuits_preflight() {
    let server = start(test_app()).await;

    let reply = request(server.local_addr(), "OPTIONS", "/api/users", None).await;

    assert_eq!(reply.status, 204);
    assert_eq!(reply.header("Access-Control-Allow-Origin"), Some("*"));
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_query_parameters_reach_handler() {
    let server = start(test_app()).await;

    let reply = request(server.local_addr(), "GET", "/search?q=hello+world&page=2", None).await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, r#"{"q":"hello world","page":"2"}"#);
}

#[tokio::test]
async fn test_redirect_response() {
    let server = start(test_app()).await;

    let reply = request(server.local_addr(), "GET", "/old-page", None).await;

    assert_eq!(reply.status, 302);
    assert_eq!(reply.header("Location"), Some("/new-page"));
}

#[tokio::test]
async fn test_garbage_request_gets_400() {
    let server = start(test_app()).await;

    let reply = send_raw(server.local_addr(), b"NONSENSE\r\n\r\n").await;
    assert_eq!(reply.status, 400);

    let reply = send_raw(server.local_addr(), b"BREW /pot HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 400);
}

#[tokio::test]
async fn test_silent_client_does_not_stop_server() {
    let server = start(test_app()).await;
    let addr = server.local_addr();

    let stream = TcpStream::connect(addr).await.unwrap();
    drop(stream);

    let reply = request(addr, "GET", "/hello/again", None).await;
    assert_eq!(reply.body, "Hello, again!");
}

#[tokio::test]
async fn test_static_files_take_priority_over_routes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.css"), "h1 { color: red }").unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let mut app = App::new();
    app.listen(0, "127.0.0.1");
    app.static_files("/static", dir.path());
    app.use_middleware(move |req, res, next| {
        counter.fetch_add(1, Ordering::SeqCst);
        next.run(req, res);
    });
    app.get("/static/app.css", |_req, res| {
        res.send("from route");
    });
    app.get("/static/generated.css", |_req, res| {
        res.send("generated");
    });
    let server = start(app).await;

    let reply = request(server.local_addr(), "GET", "/static/app.css", None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("text/css"));
    assert_eq!(reply.body, "h1 { color: red }");
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let reply = request(server.local_addr(), "GET", "/static/generated.css", None).await;
    assert_eq!(reply.body, "generated");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let reply = request(server.local_addr(), "GET", "/static/../Cargo.toml", None).await;
    assert_eq!(reply.status, 404);
}

#[tokio::test]
async fn test_static_mounts_from_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<p>home</p>").unwrap();

    let yaml = format!(
        "server:\n  host: 127.0.0.1\n  port: 0\nstatic_files:\n  - prefix: /public\n    directory: {}\n",
        dir.path().display()
    );
    let config = Config::from_yaml_str(&yaml).unwrap();
    let server = start(App::with_config(config)).await;

    let reply = request(server.local_addr(), "GET", "/public/index.html", None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert_eq!(reply.body, "<p>home</p>");
}

#[tokio::test]
async fn test_wait_for_body_reads_split_body() {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.wait_for_body = true;

    let mut app = App::with_config(config);
    app.post("/echo", |req, res| {
        res.send(req.body.clone());
    });
    let server = start(app).await;

    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream
        .write_all(b"POST /echo HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    stream.write_all(b" world").await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.ends_with("\r\n\r\nhello world"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_send_file_from_handler_on_multi_thread_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");
    std::fs::write(&path, "quarterly numbers").unwrap();

    let mut app = App::new();
    app.listen(0, "127.0.0.1");
    app.get("/report", move |_req, res| {
        res.send_file(&path);
    });
    let server = start(app).await;

    let reply = request(server.local_addr(), "GET", "/report", None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
    assert_eq!(reply.body, "quarterly numbers");
}

#[tokio::test]
async fn test_bounded_concurrency_still_serves() {
    let config =
        Config::from_yaml_str("server:\n  host: 127.0.0.1\n  port: 0\n  max_connections: 1\n")
            .unwrap();

    let mut app = App::with_config(config);
    app.get("/ping", |_req, res| {
        res.send("pong");
    });
    let server = start(app).await;

    for _ in 0..3 {
        let reply = request(server.local_addr(), "GET", "/ping", None).await;
        assert_eq!(reply.body, "pong");
    }
}

#[tokio::test]
async fn test_bind_conflict_is_startup_error() {
    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = blocker.local_addr().unwrap().port();

    let mut app = App::new();
    app.listen(port, "127.0.0.1");

    let result = app.start().await;
    assert!(matches!(result, Err(ServerError::Bind { .. })));
}

#[tokio::test]
async fn test_unresolvable_host_is_startup_error() {
    let mut app = App::new();
    app.listen(0, "host.invalid");

    let result = app.start().await;
    assert!(matches!(result, Err(ServerError::InvalidAddress(_))));
}

#[tokio::test]
async fn test_stop_closes_listener() {
    let mut server = start(test_app()).await;
    let addr = server.local_addr();
    assert!(server.is_running());

    server.stop().await.unwrap();
    assert!(!server.is_running());
    assert!(matches!(server.stop().await, Err(ServerError::AlreadyStopped)));

    assert!(TcpStream::connect(addr).await.is_err());
}

#[test]
fn test_app_settings() {
    let mut app = App::new();
    app.set("view engine", "none").set("env", "test");

    assert_eq!(app.setting("env"), Some("test"));
    assert_eq!(app.setting("view engine"), Some("none"));
    assert_eq!(app.setting("missing"), None);
}
