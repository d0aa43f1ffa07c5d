use std::io;

use thiserror::Error;

use crate::routing::RouteError;

/// Failures that stop a server from starting, or from being stopped twice.
///
/// Errors on an individual connection never surface here; they are logged by
/// the connection's task and the accept loop carries on.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to create socket: {0}")]
    Socket(#[source] io::Error),

    #[error("failed to set socket option: {0}")]
    SocketOption(#[source] io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid listen address {0:?}")]
    InvalidAddress(String),

    #[error(transparent)]
    InvalidRoute(#[from] RouteError),

    #[error("server already stopped")]
    AlreadyStopped,
}
