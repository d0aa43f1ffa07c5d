//! Switchyard - a small Express-style HTTP server.
//!
//! Core library for routing, middleware, JSON and the connection engine.

pub mod config;
pub mod error;
pub mod http;
pub mod json;
pub mod middleware;
pub mod routing;
pub mod server;
pub mod static_files;

pub use config::Config;
pub use error::ServerError;
pub use http::request::{Method, Request};
pub use http::response::{Response, StatusCode};
pub use middleware::{Middleware, MiddlewareChain, Next};
pub use routing::{Handler, Router};
pub use server::{App, Server};
