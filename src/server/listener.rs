use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::{Semaphore, watch};
use tracing::info;

use crate::config::ConcurrencyPolicy;
use crate::error::ServerError;
use crate::http::connection::{Connection, ReadOptions};
use crate::server::dispatcher::Dispatcher;

const BACKLOG: u32 = 1024;

/// Pause after a failed accept, so persistent errors such as EMFILE do not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Resolves `addr` and opens a listening socket with `SO_REUSEADDR` set.
pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    let socket_addr = resolve(addr).await?;

    let socket = match socket_addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(ServerError::Socket)?;

    socket.set_reuseaddr(true).map_err(ServerError::SocketOption)?;

    socket.bind(socket_addr).map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    socket.listen(BACKLOG).map_err(|source| ServerError::Listen {
        addr: addr.to_string(),
        source,
    })
}

async fn resolve(addr: &str) -> Result<SocketAddr, ServerError> {
    if let Ok(parsed) = addr.parse::<SocketAddr>() {
        return Ok(parsed);
    }

    tokio::net::lookup_host(addr)
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| ServerError::InvalidAddress(addr.to_string()))
}

/// Accepts connections until `shutdown` flips to `true` or its sender is dropped.
///
/// Each connection runs on its own task. Accept errors are logged and the loop
/// keeps going after a short pause; connection errors are logged by the
/// connection's task.
pub async fn run(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    options: ReadOptions,
    policy: ConcurrencyPolicy,
    mut shutdown: watch::Receiver<bool>,
) {
    let limit = match policy {
        ConcurrencyPolicy::Unbounded => None,
        ConcurrencyPolicy::Bounded(n) => Some(Arc::new(Semaphore::new(n))),
    };

    loop {
        let permit = match &limit {
            Some(semaphore) => tokio::select! {
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => Some(permit),
                    Err(_) => break,
                },
                _ = shutdown.changed() => break,
            },
            None => None,
        };

        let (socket, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    if !pause_after_accept_error(&mut shutdown).await {
                        break;
                    }
                    continue;
                }
            },
            _ = shutdown.changed() => break,
        };

        tracing::debug!(%peer, "accepted connection");

        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, dispatcher, options);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
            drop(permit);
        });
    }

    info!("Accept loop stopped");
}

/// Waits out [`ACCEPT_ERROR_BACKOFF`]. Returns `false` if shutdown came first.
async fn pause_after_accept_error(shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => true,
        _ = shutdown.changed() => false,
    }
}
