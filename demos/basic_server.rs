//! A basic HTTP server demonstrating routes, query parameters, request
//! bodies and static files.
//!
//! Run with `RUST_LOG=info cargo run --example basic_server`.

use std::collections::HashMap;

use log::info;
use microhttp_session::files::{render_template, sanitize, send_file};
use microhttp_session::{HttpServer, ServerConfig, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger
    env_logger::init();

    let config = ServerConfig {
        addr: "127.0.0.1:8081".parse()?,
        ..ServerConfig::default()
    };
    let server = HttpServer::bind(config).await?;

    // A plain text greeting
    server
        .route("/", |_req, session| {
            Box::pin(async move {
                session.send_status(StatusCode::Ok).await?;
                session.send_header("Content-Type", "text/plain").await?;
                session.send_body("Hello, World!").await
            })
        })
        .await;

    // Query parameters: /hello?name=Jane+Doe
    server
        .route("/hello", |req, session| {
            Box::pin(async move {
                let mut vars = HashMap::new();
                vars.insert(
                    "name".to_string(),
                    req.get_query_param("name").cloned().unwrap_or_else(|| "World".to_string()),
                );

                session.send_status(StatusCode::Ok).await?;
                session.send_header("Content-Type", "text/html").await?;
                session
                    .send_body(render_template("<h1>Hello, ${name}!</h1>", &vars))
                    .await
            })
        })
        .await;

    // Echo the request body back
    server
        .route("/echo", |req, session| {
            Box::pin(async move {
                session.send_status(StatusCode::Ok).await?;
                session.send_header("Content-Length", req.body.len()).await?;
                if let Some(content_type) = req.get_header("Content-Type") {
                    session.send_header("Content-Type", content_type).await?;
                }
                session.send_body(&req.body).await
            })
        })
        .await;

    // Static files below ./public, e.g. /static/index.html
    server
        .route("/static/.+", |req, session| {
            Box::pin(async move {
                let path = format!("public/{}", sanitize(&req.resource["/static/".len()..]));
                if send_file(&path, &[], session).await.is_err() && session.status().is_none() {
                    session.send_status(StatusCode::NotFound).await?;
                }
                Ok::<(), microhttp_session::ServerError>(())
            })
        })
        .await;

    info!("Starting server on http://127.0.0.1:8081, press Ctrl+C to stop");

    // Start the server
    server.run().await?;

    Ok(())
}
