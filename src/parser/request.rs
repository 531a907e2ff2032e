//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::io;

use log::debug;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::parser::error::Error;
use crate::parser::query::split_target;

/// Version used to answer requests whose request line could not be read.
pub const DEFAULT_VERSION: &str = "HTTP/1.1";

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method token, passed through unvalidated
    pub method: String,
    /// The request path, without its query string
    pub resource: String,
    /// The HTTP version token from the request line
    pub version: String,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
    /// Query parameters parsed from the request target
    pub query_params: HashMap<String, String>,
    /// The request body
    pub body: Vec<u8>,
}

impl Request {
    /// Create a new HTTP request with no query parameters and an empty body.
    pub fn new(
        method: impl Into<String>,
        resource: impl Into<String>,
        version: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            method: method.into(),
            resource: resource.into(),
            version: version.into(),
            headers,
            query_params: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Replace the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a header value.
    ///
    /// # Arguments
    ///
    /// * `name` - The header name
    ///
    /// # Returns
    ///
    /// The header value, if it exists
    pub fn get_header(&self, name: &str) -> Option<&String> {
        // Headers are case-insensitive, so we need to do a case-insensitive lookup
        self.headers
            .iter()
            .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v))
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the request body as JSON.
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or an error if the body is not valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    /// Check if the request declares a JSON body.
    pub fn is_json(&self) -> bool {
        self.get_header("Content-Type")
            .is_some_and(|content_type| content_type.starts_with("application/json"))
    }
}

/// The first line of a request: `METHOD SP TARGET SP VERSION`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    /// The raw request target, query string included
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Split a request line on single spaces. Exactly three tokens are
    /// accepted; trailing spaces are ignored.
    pub fn parse(line: &str) -> Result<Self, Error> {
        let parts: Vec<&str> = line.trim_end_matches(' ').split(' ').collect();
        match parts.as_slice() {
            [method, target, version] => Ok(Self {
                method: method.to_string(),
                target: target.to_string(),
                version: version.to_string(),
            }),
            _ => Err(Error::MalformedRequestLine(line.to_string())),
        }
    }
}

/// Read one line, without its `\n` or `\r\n` terminator.
///
/// Returns `None` once the stream is exhausted.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Read the request line.
///
/// Returns `Ok(None)` when the stream ends, or the first line is blank, before
/// any request was sent; nothing can be answered in that case.
pub async fn read_request_line<R>(reader: &mut R) -> Result<Option<RequestLine>, Error>
where
    R: AsyncBufRead + Unpin,
{
    match read_line(reader).await? {
        Some(line) if !line.trim().is_empty() => RequestLine::parse(&line).map(Some),
        _ => Ok(None),
    }
}

/// Validate a header line against `[A-Za-z-]+:.+` and split it at the first colon.
fn parse_header_line(line: &str) -> Result<(String, String), Error> {
    let invalid = || Error::InvalidHeaderFormat(line.to_string());

    let (name, value) = line.split_once(':').ok_or_else(invalid)?;
    if name.is_empty()
        || !name.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-')
        || value.is_empty()
    {
        return Err(invalid());
    }

    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn parse_content_length(value: &str) -> Result<u64, Error> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidContentLength(value.to_string()));
    }
    value
        .parse()
        .map_err(|_| Error::InvalidContentLength(value.to_string()))
}

/// Read exactly `len` bytes of body.
async fn read_body<R>(reader: &mut R, len: u64) -> Result<Vec<u8>, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = Vec::new();
    let read = (&mut *reader).take(len).read_to_end(&mut body).await?;
    if (read as u64) < len {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("body ended after {read} of {len} bytes"),
        )));
    }
    Ok(body)
}

/// Read the rest of a request whose request line has already been consumed.
///
/// Reads headers up to the blank line, decodes the query string, validates the
/// resource and reads a `Content-Length` delimited body. Bytes past the body
/// are left in the reader.
pub async fn read_request<R>(reader: &mut R, line: RequestLine) -> Result<Request, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = HashMap::new();
    while let Some(header) = read_line(reader).await? {
        if header.trim().is_empty() {
            break;
        }
        debug!("< {header}");

        let (name, value) = parse_header_line(&header)?;
        // Names differing only in case are the same header, the last one wins
        headers.retain(|existing: &String, _| !existing.eq_ignore_ascii_case(&name));
        headers.insert(name, value);
    }

    let (resource, query_params) = split_target(&line.target)?;
    if !resource.starts_with('/') {
        return Err(Error::InvalidPath(resource));
    }

    let mut request = Request {
        method: line.method,
        resource,
        version: line.version,
        headers,
        query_params,
        body: Vec::new(),
    };

    if let Some(value) = request.get_header("Content-Length") {
        let len = parse_content_length(value)?;
        request.body = read_body(reader, len).await?;
    }

    Ok(request)
}

/// Parse an HTTP request from a byte slice.
///
/// # Arguments
///
/// * `input` - A byte slice containing the HTTP request to parse
///
/// # Returns
///
/// The parsed HTTP request, or an error if the request is invalid
pub async fn parse_request(mut input: &[u8]) -> Result<Request, Error> {
    let line = read_request_line(&mut input)
        .await?
        .ok_or(Error::EmptyRequest)?;
    read_request(&mut input, line).await
}
