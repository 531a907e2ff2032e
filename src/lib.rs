//! A minimal HTTP/1.x server core.
//!
//! This library accepts TCP connections, parses one request per connection,
//! dispatches it to a handler chosen by path and lets the handler write its
//! response through a [`Session`] that keeps the wire format well formed.
//!
//! # Features
//!
//! - Request parsing: request line, headers, `+`-decoded query parameters and
//!   `Content-Length` delimited bodies
//! - Routing by exact path first, then by regular expression in registration order
//! - A response session that enforces status, then headers, then body
//! - Malformed requests are always answered with `400 Bad Request`
//! - Helpers for sending files and rendering simple text templates
//!
//! # Examples
//!
//! ## Parsing a request
//!
//! ```
//! use microhttp_session::parse_request;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let request_bytes = b"GET /search?q=a+b HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let request = parse_request(request_bytes).await.unwrap();
//!
//! assert_eq!(request.method, "GET");
//! assert_eq!(request.resource, "/search");
//! assert_eq!(request.get_query_param("q").map(String::as_str), Some("a b"));
//! assert_eq!(request.get_header("host").map(String::as_str), Some("example.com"));
//! # }
//! ```
//!
//! ## Serving requests
//!
//! ```no_run
//! use microhttp_session::{HttpServer, StatusCode};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), microhttp_session::ServerError> {
//! let server = HttpServer::listen(8080).await?;
//!
//! server
//!     .route("/", |_req, session| {
//!         Box::pin(async move {
//!             session.send_status(StatusCode::Ok).await?;
//!             session.send_header("Content-Type", "text/plain").await?;
//!             session.send_body("Hello, World!").await
//!         })
//!     })
//!     .await;
//!
//! // Any resource matching the expression, e.g. /users/42
//! server
//!     .route(r"/users/\d+", |req, session| {
//!         Box::pin(async move {
//!             session.send_status(StatusCode::Ok).await?;
//!             session.send_body(format!("user {}", req.resource)).await
//!         })
//!     })
//!     .await;
//!
//! server.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! See the `demos` directory for a more complete server.

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Export the file helpers
pub mod files;

// Re-export commonly used items for convenience
pub use parser::{parse_request, Error as ParserError, Request};
pub use server::{
    Error as ServerError, HandlerFn, HttpServer, ServerConfig, Session, ShutdownHandle, StatusCode,
};
