use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use switchyard::http::request::{Method, Request, RequestBuilder};
use switchyard::http::response::Response;
use switchyard::middleware::{Middleware, MiddlewareChain, Next};

fn request(method: Method, url: &str) -> Request {
    RequestBuilder::new().method(method).url(url).build().unwrap()
}

fn trail(res: &Response) -> String {
    res.get_header("X-Trail").unwrap_or_default().to_string()
}

fn append_trail(res: &mut Response, step: &str) {
    let trail = format!("{}{}", trail(res), step);
    res.set("X-Trail", trail);
}

#[test]
fn test_middleware_runs_in_registration_order() {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(|req, res, next| {
        append_trail(res, "a");
        next.run(req, res);
    });
    chain.use_middleware(|req, res, next| {
        append_trail(res, "b");
        next.run(req, res);
    });

    let mut req = request(Method::GET, "/");
    let mut res = Response::new();
    chain.run(&mut req, &mut res, |_, res| append_trail(res, "!"));

    assert_eq!(trail(&res), "ab!");
}

#[test]
fn test_short_circuit_stops_chain_and_endpoint() {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(|_req, res, _next| {
        res.unauthorized().send("blocked");
    });
    chain.use_middleware(|req, res, next| {
        res.set("X-Second", "ran");
        next.run(req, res);
    });

    let mut req = request(Method::GET, "/anything");
    let mut res = Response::new();
    let mut endpoint_ran = false;
    chain.run(&mut req, &mut res, |_, _| endpoint_ran = true);

    assert!(!endpoint_ran);
    assert_eq!(res.get_header("X-Second"), None);
    assert_eq!(res.status_code(), 401);
    assert_eq!(res.body, b"blocked");
}

#[test]
fn test_prefix_scoped_middleware_only_sees_matching_paths() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut chain = MiddlewareChain::new();
    chain.use_at("/admin", move |req, res, next| {
        counter.fetch_add(1, Ordering::SeqCst);
        res.set("X-Admin", "yes");
        next.run(req, res);
    });

    let mut req = request(Method::GET, "/public");
    let mut res = Response::new();
    let mut reached = false;
    chain.run(&mut req, &mut res, |_, _| reached = true);
    assert!(reached);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(res.get_header("X-Admin"), None);

    let mut req = request(Method::GET, "/admin/users");
    let mut res = Response::new();
    chain.run(&mut req, &mut res, |_, _| {});
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(res.get_header("X-Admin"), Some("yes"));
}

#[test]
fn test_skipped_entry_does_not_break_the_chain() {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(|req, res, next| {
        append_trail(res, "1");
        next.run(req, res);
    });
    chain.use_at("/admin", |req, res, next| {
        append_trail(res, "x");
        next.run(req, res);
    });
    chain.use_middleware(|req, res, next| {
        append_trail(res, "3");
        next.run(req, res);
    });

    let mut req = request(Method::GET, "/home");
    let mut res = Response::new();
    chain.run(&mut req, &mut res, |_, res| append_trail(res, "!"));

    assert_eq!(trail(&res), "13!");
}

#[test]
fn test_middleware_can_mutate_request_for_endpoint() {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(|req, res, next| {
        req.params.insert("user".to_string(), "ada".to_string());
        next.run(req, res);
    });

    let mut req = request(Method::GET, "/");
    let mut res = Response::new();
    chain.run(&mut req, &mut res, |req, res| {
        let user = req.param("user").unwrap_or("nobody").to_string();
        res.send(user);
    });

    assert_eq!(res.body, b"ada");
}

struct RequireHeader(&'static str);

impl Middleware for RequireHeader {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        if req.header(self.0).is_none() {
            res.bad_request().send(format!("missing {}", self.0));
            return;
        }
        next.run(req, res);
    }
}

#[test]
fn test_trait_implementation_registers_with_prefix() {
    let mut chain = MiddlewareChain::new();
    chain.register("/api", RequireHeader("X-Token"));
    assert_eq!(chain.len(), 1);

    let mut req = request(Method::POST, "/api/things");
    let mut res = Response::new();
    chain.run(&mut req, &mut res, |_, res| {
        res.send("ok");
    });
    assert_eq!(res.status_code(), 400);
    assert_eq!(res.body, b"missing X-Token");

    let mut req = RequestBuilder::new()
        .method(Method::POST)
        .url("/api/things")
        .header("x-token", "t")
        .build()
        .unwrap();
    let mut res = Response::new();
    chain.run(&mut req, &mut res, |_, res| {
        res.send("ok");
    });
    assert_eq!(res.body, b"ok");

    chain.clear();
    assert!(chain.is_empty());
}
