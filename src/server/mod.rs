//! Server lifecycle: the application facade, the frozen request pipeline and
//! the accept loop.

pub mod app;
pub mod dispatcher;
pub mod listener;

pub use app::{App, Server};
pub use dispatcher::Dispatcher;
