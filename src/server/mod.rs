//! HTTP server implementation for microhttp-session.
//!
//! This module accepts connections, routes each parsed request to a handler
//! and gives the handler a [`Session`] to answer through.

mod config;
mod error;
mod http_server;
mod router;
mod session;
mod status;

// Re-export public items
pub use config::ServerConfig;
pub use error::Error;
pub use http_server::{HttpServer, ShutdownHandle};
pub use router::{handler_fn, HandlerFn, HandlerFuture, Route, Router};
pub use session::Session;
pub use status::StatusCode;
