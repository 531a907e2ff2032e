//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur during HTTP request parsing.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream ended before a request line was received.
    #[error("Empty request")]
    EmptyRequest,

    /// The request line does not consist of exactly three space separated tokens.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// A header line does not match `Name: value`.
    #[error("Invalid header format: {0}")]
    InvalidHeaderFormat(String),

    /// A query parameter is missing its `=` separator.
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParameter(String),

    /// The resource does not start with `/`.
    #[error("Invalid HTTP path: {0}")]
    InvalidPath(String),

    /// The Content-Length header is not a decimal number.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// Reading from the connection failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing JSON.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// Whether the client sent something we can answer with `400 Bad Request`.
    pub fn is_bad_request(&self) -> bool {
        !matches!(self, Error::EmptyRequest | Error::Io(_) | Error::JsonError(_))
    }
}
