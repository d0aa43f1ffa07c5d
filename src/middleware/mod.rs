//! Ordered middleware chain with explicit continuation.
//!
//! Each middleware receives a [`Next`] capability. Calling [`Next::run`]
//! advances the chain's cursor and enters the next applicable entry, or the
//! final endpoint once the chain is exhausted. Dropping `Next` without running
//! it ends the request there: later middleware and the router never run and
//! the response is sent as it stands.
//!
//! ```
//! use switchyard::http::request::{Method, RequestBuilder};
//! use switchyard::http::response::Response;
//! use switchyard::middleware::MiddlewareChain;
//!
//! let mut chain = MiddlewareChain::new();
//! chain.use_middleware(|req, res, next| {
//!     res.set("X-Seen", "1");
//!     if req.method == Method::OPTIONS {
//!         res.status(204).send("");
//!         return;
//!     }
//!     next.run(req, res);
//! });
//!
//! let mut req = RequestBuilder::new().method(Method::OPTIONS).url("/").build().unwrap();
//! let mut res = Response::new();
//! let mut reached = false;
//! chain.run(&mut req, &mut res, |_, _| reached = true);
//!
//! assert!(!reached);
//! assert_eq!(res.status_code(), 204);
//! ```

use std::sync::Arc;

use crate::http::request::Request;
use crate::http::response::Response;

/// A request interceptor that runs before routing.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>);
}

impl<F> Middleware for F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        self(req, res, next)
    }
}

#[derive(Clone)]
struct Entry {
    /// Empty means every path.
    prefix: String,
    middleware: Arc<dyn Middleware>,
}

impl Entry {
    fn applies_to(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Continuation handed to a middleware. Consumed by [`Next::run`].
pub struct Next<'a> {
    entries: &'a [Entry],
    cursor: usize,
    endpoint: &'a mut dyn FnMut(&mut Request, &mut Response),
}

impl Next<'_> {
    /// Continues with the next middleware whose prefix matches, or the endpoint.
    ///
    /// Entries whose prefix does not match are skipped without being called.
    pub fn run(mut self, req: &mut Request, res: &mut Response) {
        let entries = self.entries;

        while let Some(entry) = entries.get(self.cursor) {
            self.cursor += 1;

            if entry.applies_to(&req.path) {
                entry.middleware.handle(req, res, self);
                return;
            }

            tracing::trace!(prefix = %entry.prefix, path = %req.path, "middleware skipped");
        }

        (self.endpoint)(req, res);
    }
}

/// Middleware in registration order.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    entries: Vec<Entry>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends middleware scoped to paths starting with `prefix` (`""` for all).
    pub fn register(&mut self, prefix: &str, middleware: impl Middleware) -> &mut Self {
        self.entries.push(Entry {
            prefix: prefix.to_string(),
            middleware: Arc::new(middleware),
        });
        self
    }

    /// Appends middleware that sees every request.
    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync + 'static,
    {
        self.register("", middleware)
    }

    /// Appends middleware for requests whose path starts with `prefix`.
    pub fn use_at<F>(&mut self, prefix: &str, middleware: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync + 'static,
    {
        self.register(prefix, middleware)
    }

    /// Runs the chain from the first entry; `endpoint` runs only if every
    /// applicable middleware continues.
    pub fn run<F>(&self, req: &mut Request, res: &mut Response, mut endpoint: F)
    where
        F: FnMut(&mut Request, &mut Response),
    {
        Next {
            entries: &self.entries,
            cursor: 0,
            endpoint: &mut endpoint,
        }
        .run(req, res);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.prefix))
            .finish()
    }
}
