//! The per-request response writer.
//!
//! A [`Session`] enforces the framing of an HTTP/1.x response: one status
//! line, then any number of headers, then body data. The blank line that
//! separates headers from body is written exactly once, either by the first
//! body write or by [`Session::complete`] for headers-only responses.

use std::fmt;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::server::error::Error;
use crate::server::status::StatusCode;

type Writer = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

/// Writes one response to one connection.
///
/// Operations must follow `send_status`, then `send_header`*, then
/// `send_body`*, then `complete`. Calls out of order fail with
/// [`Error::IllegalState`] and write nothing.
pub struct Session {
    /// `None` once the session has been completed
    writer: Option<Writer>,
    version: String,
    status: Option<StatusCode>,
    sent_body_data: bool,
}

impl Session {
    /// Create a session writing responses tagged with `version`.
    pub fn new<W>(writer: W, version: impl Into<String>) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: Box<dyn AsyncWrite + Send + Unpin> = Box::new(writer);
        Self {
            writer: Some(BufWriter::new(writer)),
            version: version.into(),
            status: None,
            sent_body_data: false,
        }
    }

    /// The HTTP version echoed in the status line.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The status sent so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Whether body data has been written.
    pub fn has_sent_body(&self) -> bool {
        self.sent_body_data
    }

    pub fn is_disposed(&self) -> bool {
        self.writer.is_none()
    }

    fn writer(&mut self) -> Result<&mut Writer, Error> {
        self.writer
            .as_mut()
            .ok_or(Error::IllegalState("session is disposed"))
    }

    /// Send the status line.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalState`] if a status was already sent or the session is
    /// disposed; [`Error::IoError`] if the client went away.
    pub async fn send_status(&mut self, status: StatusCode) -> Result<(), Error> {
        self.writer()?;
        if self.status.is_some() {
            return Err(Error::IllegalState("status has already been set"));
        }

        self.status = Some(status);
        let line = format!("{} {}\r\n", self.version, status);
        self.writer()?.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Send a single header line.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalState`] if no status was sent, body data was already
    /// sent, or the session is disposed.
    pub async fn send_header(
        &mut self,
        key: impl fmt::Display,
        value: impl fmt::Display,
    ) -> Result<(), Error> {
        self.writer()?;
        if self.status.is_none() {
            return Err(Error::IllegalState("status has not been set"));
        }
        if self.sent_body_data {
            return Err(Error::IllegalState("body data has already been sent"));
        }

        let line = format!("{key}: {value}\r\n");
        self.writer()?.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Check that body data may be written and emit the header/body separator
    /// before the first chunk.
    async fn begin_body(&mut self) -> Result<(), Error> {
        self.writer()?;
        if self.status.is_none() {
            return Err(Error::IllegalState("status has not been set"));
        }
        if !self.sent_body_data {
            self.writer()?.write_all(b"\r\n").await?;
            self.sent_body_data = true;
        }
        Ok(())
    }

    /// Send body data, text or bytes.
    ///
    /// The first call also ends the header section.
    pub async fn send_body(&mut self, body: impl AsRef<[u8]>) -> Result<(), Error> {
        self.begin_body().await?;
        self.writer()?.write_all(body.as_ref()).await?;
        Ok(())
    }

    /// Send `length` bytes of `body` starting at `offset`, then flush.
    ///
    /// Meant for streaming large payloads chunk by chunk.
    pub async fn send_body_range(
        &mut self,
        body: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<(), Error> {
        let chunk = offset
            .checked_add(length)
            .and_then(|end| body.get(offset..end))
            .ok_or(Error::BodyRange {
                offset,
                length,
                len: body.len(),
            })?;

        self.begin_body().await?;
        let writer = self.writer()?;
        writer.write_all(chunk).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Send a JSON body with matching `Content-Type` and `Content-Length` headers.
    pub async fn send_json<T: Serialize>(&mut self, value: &T) -> Result<(), Error> {
        let json = serde_json::to_vec(value)?;
        self.send_header("Content-Type", "application/json").await?;
        self.send_header("Content-Length", json.len()).await?;
        self.send_body(json).await
    }

    /// Finish the response: write the terminating blank line, flush and close
    /// the output.
    ///
    /// The session is disposed afterwards even if the final write fails.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalState`] if the session was already completed.
    pub async fn complete(&mut self) -> Result<(), Error> {
        let mut writer = self
            .writer
            .take()
            .ok_or(Error::IllegalState("session is disposed"))?;
        self.status = None;

        writer.write_all(b"\r\n").await?;
        writer.flush().await?;
        writer.shutdown().await?;
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("version", &self.version)
            .field("status", &self.status)
            .field("sent_body_data", &self.sent_body_data)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
