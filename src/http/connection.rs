use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::http::parser::{find_headers_end, is_body_complete, parse_http_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::server::dispatcher::Dispatcher;

/// How a connection reads its single request.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub buffer_size: usize,
    pub wait_for_body: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            wait_for_body: false,
        }
    }
}

/// One accepted client: read a request, dispatch it, write the response, close.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    options: ReadOptions,
    dispatcher: Arc<Dispatcher>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Parsed(Request),
    Responded(ResponseWriter),
    Closed,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        dispatcher: Arc<Dispatcher>,
        options: ReadOptions,
    ) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(options.buffer_size),
            options,
            dispatcher,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    if !self.read_request().await? {
                        tracing::debug!(peer = %self.peer, "client closed before sending a request");
                        break;
                    }

                    self.state = match parse_http_request(&self.buffer) {
                        Ok(req) => ConnectionState::Parsed(req),
                        Err(e) => {
                            tracing::warn!(peer = %self.peer, error = %e, "rejecting malformed request");
                            let mut response = Response::with_bad_request();
                            ConnectionState::Responded(ResponseWriter::new(&mut response))
                        }
                    };
                }

                ConnectionState::Parsed(req) => {
                    let method = req.method;
                    let path = req.path.clone();

                    let mut response = self.dispatcher.dispatch(req).await;

                    tracing::info!(
                        peer = %self.peer,
                        method = %method,
                        path = %path,
                        status = response.status_code(),
                        "request handled"
                    );
                    self.state = ConnectionState::Responded(ResponseWriter::new(&mut response));
                }

                ConnectionState::Responded(mut writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    // Every exchange is Connection: close.
                    if let Err(e) = self.stream.shutdown().await {
                        tracing::trace!(peer = %self.peer, error = %e, "shutdown after write failed");
                    }
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    /// Fills the buffer until the header terminator arrives or the peer closes.
    ///
    /// With `wait_for_body` set, reading continues until `Content-Length`
    /// bytes of body are buffered. Returns `false` if nothing was read at all.
    async fn read_request(&mut self) -> anyhow::Result<bool> {
        loop {
            if let Some(end) = find_headers_end(&self.buffer) {
                if !self.options.wait_for_body || is_body_complete(&self.buffer, end) {
                    return Ok(true);
                }
            }

            self.buffer.reserve(self.options.buffer_size);
            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                return Ok(!self.buffer.is_empty());
            }
        }
    }
}
