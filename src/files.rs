//! Helpers for serving files through a [`Session`].
//!
//! None of these touch the protocol beyond the public session API.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::server::{Error, Session, StatusCode};

const CHUNK_SIZE: usize = 4096;

static UNSAFE_PATH: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn unsafe_path() -> &'static Regex {
    UNSAFE_PATH.get_or_init(|| {
        Regex::new(r"[^a-zA-Z0-9.\-/]|\.\.").expect("static path pattern is valid")
    })
}

fn placeholder() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([^}]*)\}").expect("static placeholder pattern is valid")
    })
}

/// Replace path-related special characters with underscores.
///
/// Every character outside `[a-zA-Z0-9.-/]` and every `..` becomes `_`, so
/// `public/../secret` turns into `public/_/secret`. Apply this to any path
/// derived from user input before touching the filesystem.
pub fn sanitize(path: &str) -> String {
    unsafe_path().replace_all(path, "_").into_owned()
}

/// Replace each `${key}` in `content` with its value from `vars`.
///
/// Substitution is a single pass over `content`: placeholders appearing in
/// substituted values are left as they are. Unknown keys stay untouched.
pub fn render_template(content: &str, vars: &HashMap<String, String>) -> String {
    placeholder()
        .replace_all(content, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Read a whole text file.
pub async fn read_file(path: impl AsRef<Path>) -> Result<String, Error> {
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Read a text file and render its template variables.
pub async fn load_template(
    path: impl AsRef<Path>,
    vars: &HashMap<String, String>,
) -> Result<String, Error> {
    let content = read_file(path).await?;
    Ok(render_template(&content, vars))
}

/// Send a file as a `200 OK` response with its `Content-Length` and any extra
/// headers.
///
/// The session must not have a status yet. The response is left open, the
/// caller (or the server) completes it. `path` must already be sanitized.
pub async fn send_file(
    path: impl AsRef<Path>,
    headers: &[(&str, &str)],
    session: &mut Session,
) -> Result<(), Error> {
    let mut file = File::open(path).await?;
    let len = file.metadata().await?.len();

    session.send_status(StatusCode::Ok).await?;
    session.send_header("Content-Length", len).await?;
    for (key, value) in headers {
        session.send_header(key, value).await?;
    }

    let mut buf = vec![0; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        session.send_body_range(&buf, 0, n).await?;
    }

    Ok(())
}
