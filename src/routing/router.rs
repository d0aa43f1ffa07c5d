use std::sync::Arc;

use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::routing::pattern::{RouteError, RoutePattern};

/// A request handler registered on a route.
///
/// Handlers must leave a complete response behind; the router does not
/// recover from a handler that sets nothing.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: &Request, res: &mut Response);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) + Send + Sync + 'static,
{
    fn call(&self, req: &Request, res: &mut Response) {
        self(req, res)
    }
}

/// A method, a compiled path pattern and the handler they select.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: RoutePattern,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn new(method: Method, path: &str, handler: impl Handler) -> Result<Self, RouteError> {
        Ok(Self {
            method,
            pattern: RoutePattern::compile(path)?,
            handler: Arc::new(handler),
        })
    }

    pub fn matches(&self, method: Method, path: &str) -> bool {
        self.method == method && self.pattern.matches(path)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Ordered route table. The first route that matches wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route. Earlier registrations take priority.
    ///
    /// The method-named shortcuts accept closures directly; `register` also
    /// takes any [`Handler`] implementation.
    pub fn register(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
    ) -> Result<&mut Self, RouteError> {
        let route = Route::new(method, path, handler)?;
        tracing::debug!(method = %method, path, "route registered");
        self.routes.push(route);
        Ok(self)
    }

    pub fn get<F>(&mut self, path: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(Method::GET, path, handler)
    }

    pub fn post<F>(&mut self, path: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(Method::POST, path, handler)
    }

    pub fn put<F>(&mut self, path: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(Method::PUT, path, handler)
    }

    pub fn delete<F>(&mut self, path: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(Method::DELETE, path, handler)
    }

    pub fn patch<F>(&mut self, path: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(Method::PATCH, path, handler)
    }

    /// Runs the first route matching the request's method and path.
    ///
    /// Path parameters are bound into `req.params` before the handler runs.
    /// Returns `false` when nothing matched; the caller produces the 404.
    pub fn dispatch(&self, req: &mut Request, res: &mut Response) -> bool {
        for route in &self.routes {
            if route.method != req.method {
                continue;
            }
            let Some(params) = route.pattern.captures(&req.path) else {
                continue;
            };

            tracing::trace!(pattern = route.pattern.as_str(), path = %req.path, "route matched");
            req.params.extend(params);
            route.handler.call(req, res);
            return true;
        }

        false
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
