use crate::http::request::Request;
use crate::http::response::Response;
use crate::middleware::MiddlewareChain;
use crate::routing::Router;
use crate::static_files::StaticFiles;

/// The request pipeline every connection runs, frozen at startup.
///
/// Static files are checked first and short-circuit everything else. Then the
/// middleware chain runs with the router as its final step, and a request no
/// route claims gets a plain-text 404.
#[derive(Debug, Default)]
pub struct Dispatcher {
    statics: StaticFiles,
    middleware: MiddlewareChain,
    router: Router,
}

impl Dispatcher {
    pub fn new(statics: StaticFiles, middleware: MiddlewareChain, router: Router) -> Self {
        Self {
            statics,
            middleware,
            router,
        }
    }

    pub async fn dispatch(&self, mut req: Request) -> Response {
        let mut res = Response::new();

        if !self.statics.is_empty() {
            if let Some(file) = self.statics.try_serve(&req.path).await {
                res.status(file.status)
                    .set("Content-Type", file.content_type)
                    .send(file.content);
                return res;
            }
        }

        self.handle(&mut req, &mut res);
        res
    }

    /// Middleware and routing only; the synchronous part of [`Self::dispatch`].
    pub fn handle(&self, req: &mut Request, res: &mut Response) {
        let router = &self.router;

        self.middleware.run(req, res, |req, res| {
            if !router.dispatch(req, res) && !res.is_ended() {
                tracing::debug!(method = %req.method, path = %req.path, "no route matched");
                res.not_found().send("Not Found");
            }
        });
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    pub fn statics(&self) -> &StaticFiles {
        &self.statics
    }
}
