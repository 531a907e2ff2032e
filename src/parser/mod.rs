//! HTTP parser module.
//!
//! This module turns the byte stream of a connection into a [`Request`]:
//! request line, headers, query parameters and a `Content-Length` delimited
//! body. Parsing is split in two steps so that a caller can answer a
//! malformed request with the version it negotiated.

mod error;
mod query;
mod request;
mod tests;

// Re-export public items
pub use error::Error;
pub use query::split_target;
pub use request::{Request, RequestLine, DEFAULT_VERSION};

// Re-export the parsing functions
pub use request::{parse_request, read_request, read_request_line};
