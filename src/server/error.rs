//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A session operation was called out of order, or after `complete()`.
    #[error("Illegal session state: {0}")]
    IllegalState(&'static str),

    /// A body range lies outside the given buffer.
    #[error("Body range {offset}+{length} exceeds buffer of {len} bytes")]
    BodyRange {
        offset: usize,
        length: usize,
        len: usize,
    },

    /// A handler gave up on the request.
    #[error("Handler error: {0}")]
    HandlerError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
