//! HTTP protocol implementation.
//!
//! One request per connection: every response carries `Connection: close`
//! and the socket is shut down once it has been written.
//!
//! # Architecture
//!
//! - **`connection`**: Per-connection state machine driving read, dispatch and write
//! - **`parser`**: Decodes a request from the bytes read off the socket
//! - **`request`**: Request representation, query and form parsing
//! - **`response`**: Response representation with chaining setters
//! - **`writer`**: Serializes and writes responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//! - **`util`**: URL coding and header-name normalization
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for the header terminator (or EOF)
//!        └──────┬──────┘
//!               │ Bytes received        (nothing received → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │     Parsed       │ ← Static files → middleware → router → 404
//!        └──────┬───────────┘          (undecodable request → 400)
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Responded     │ ← Send response, shut down the socket
//!        └──────┬───────────┘
//!               ▼
//!            Closed
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod util;
pub mod writer;
