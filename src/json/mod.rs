//! JSON value model and codec.
//!
//! A closed [`Value`] enum with a hand-written recursive-descent
//! [`parse`] and a compact [`stringify`].
//!
//! ```
//! use switchyard::json::{self, Value};
//!
//! let value = json::parse(r#"{"name":"Ada","tags":["x"]}"#).unwrap();
//! assert_eq!(value.get("name").and_then(Value::as_str), Some("Ada"));
//! assert_eq!(json::stringify(&value), r#"{"name":"Ada","tags":["x"]}"#);
//! ```

pub mod parser;
pub mod serializer;
pub mod value;

pub use parser::{JsonError, JsonErrorKind, MAX_DEPTH, is_valid, parse};
pub use serializer::{escape, stringify, unescape};
pub use value::{Map, Value};
