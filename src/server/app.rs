use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::error::ServerError;
use crate::http::connection::ReadOptions;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::middleware::{Middleware, MiddlewareChain, Next};
use crate::routing::{Handler, RouteError, Router};
use crate::server::dispatcher::Dispatcher;
use crate::server::listener;
use crate::static_files::StaticFiles;

/// An application under construction: routes, middleware, static mounts and
/// settings are registered here, then [`App::start`] freezes them and serves.
///
/// A route pattern that fails to compile does not stop registration; the
/// first such error is returned by `start`.
///
/// # Example
///
/// ```no_run
/// use switchyard::server::App;
///
/// # async fn demo() -> Result<(), switchyard::error::ServerError> {
/// let mut app = App::new();
/// app.listen(3000, "127.0.0.1");
/// app.get("/hello/:name", |req, res| {
///     let name = req.param("name").unwrap_or("world");
///     res.send(format!("Hello, {name}!"));
/// });
///
/// let server = app.start().await?;
/// server.wait().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct App {
    config: Config,
    settings: HashMap<String, String>,
    router: Router,
    middleware: MiddlewareChain,
    statics: StaticFiles,
    route_errors: Vec<RouteError>,
}

impl App {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Starts from `config`, mounting its configured static directories.
    pub fn with_config(config: Config) -> Self {
        let mut statics = StaticFiles::new();
        for mount in &config.static_files {
            statics.mount(mount.prefix.clone(), mount.directory.clone());
        }

        Self {
            config,
            statics,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sets the address `start` binds to.
    pub fn listen(&mut self, port: u16, host: &str) -> &mut Self {
        self.config.server.port = port;
        self.config.server.host = host.to_string();
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Registers a route for any method with any [`Handler`].
    pub fn route(&mut self, method: Method, path: &str, handler: impl Handler) -> &mut Self {
        if let Err(e) = self.router.register(method, path, handler) {
            tracing::error!(error = %e, "route rejected");
            self.route_errors.push(e);
        }
        self
    }

    pub fn get<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn put<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(Method::PUT, path, handler)
    }

    pub fn delete<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(Method::DELETE, path, handler)
    }

    pub fn patch<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(Method::PATCH, path, handler)
    }

    /// Adds middleware scoped to `prefix` (`""` for every path).
    pub fn middleware(&mut self, prefix: &str, middleware: impl Middleware) -> &mut Self {
        self.middleware.register(prefix, middleware);
        self
    }

    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync + 'static,
    {
        self.middleware.use_middleware(middleware);
        self
    }

    pub fn use_at<F>(&mut self, prefix: &str, middleware: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync + 'static,
    {
        self.middleware.use_at(prefix, middleware);
        self
    }

    /// Serves files from `directory` for paths starting with `prefix`.
    pub fn static_files(&mut self, prefix: &str, directory: impl Into<PathBuf>) -> &mut Self {
        self.statics.mount(prefix, directory);
        self
    }

    /// Freezes the pipeline without binding a socket.
    pub fn into_dispatcher(self) -> Result<Dispatcher, ServerError> {
        if let Some(e) = self.route_errors.into_iter().next() {
            return Err(e.into());
        }
        Ok(Dispatcher::new(self.statics, self.middleware, self.router))
    }

    /// Binds the configured address and starts accepting on a background task.
    pub async fn start(self) -> Result<Server, ServerError> {
        let addr = self.config.listen_addr();
        let options = ReadOptions {
            buffer_size: self.config.server.read_buffer_size(),
            wait_for_body: self.config.server.wait_for_body,
        };
        let policy = self.config.server.concurrency();

        let dispatcher = Arc::new(self.into_dispatcher()?);
        let tcp = listener::bind(&addr).await?;
        let local_addr = tcp
            .local_addr()
            .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;

        info!("Listening on {}", local_addr);
        tracing::debug!(
            routes = dispatcher.router().len(),
            middleware = dispatcher.middleware().len(),
            ?policy,
            "server started"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(listener::run(tcp, dispatcher, options, policy, shutdown_rx));

        Ok(Server {
            local_addr,
            shutdown: shutdown_tx,
            task: Some(task),
        })
    }
}

/// Handle to a running server.
///
/// Dropping the handle stops the accept loop as well.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl Server {
    /// The bound address; useful when listening on port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops accepting and waits for the accept loop to exit.
    ///
    /// Connections already accepted run to completion on their own tasks.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        let task = self.task.take().ok_or(ServerError::AlreadyStopped)?;

        self.shutdown.send_replace(true);
        if let Err(e) = task.await {
            tracing::error!(error = %e, "accept loop ended abnormally");
        }

        info!("Server on {} stopped", self.local_addr);
        Ok(())
    }

    /// Waits until the accept loop exits.
    pub async fn wait(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "accept loop ended abnormally");
            }
        }
    }
}
