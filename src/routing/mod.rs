//! Method + path routing.
//!
//! Routes are tried in registration order and the first match wins; there is
//! no specificity ranking.

pub mod pattern;
pub mod router;

pub use pattern::{RouteError, RoutePattern};
pub use router::{Handler, Route, Router};
