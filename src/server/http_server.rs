//! HTTP server implementation.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{mpsc, RwLock};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::parser::{read_request, read_request_line, Error as ParserError, Request, DEFAULT_VERSION};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::router::{handler_fn, HandlerFuture, Router};
use crate::server::session::Session;
use crate::server::status::StatusCode;

/// Requests a running server to stop accepting connections.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::Sender<()>,
}

impl ShutdownHandle {
    /// Ask the server to stop. Connections already accepted run to completion.
    pub fn shutdown(&self) {
        // A full channel means a shutdown is already pending, a closed one
        // that the server is gone.
        let _ = self.tx.try_send(());
    }
}

/// An HTTP server.
///
/// Each accepted connection is served by its own task: one request is parsed,
/// dispatched to the matching handler and answered, then the connection is
/// closed. There is no limit on concurrent connections and no read timeout,
/// so a client that never finishes its request keeps its task alive.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    /// The routes.
    ///
    /// Routes are meant to be registered before [`HttpServer::run`]. Routes
    /// added while serving become visible to later lookups only, a request
    /// being resolved concurrently may or may not see them.
    pub routes: Arc<RwLock<Router>>,
    listener: TcpListener,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl HttpServer {
    /// Bind a new HTTP server with the given configuration.
    ///
    /// # Errors
    ///
    /// [`Error::IoError`] if the address is unavailable.
    pub async fn bind(config: ServerConfig) -> Result<Self, Error> {
        let listener = TcpListener::bind(config.addr).await?;
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Ok(Self {
            config,
            routes: Arc::new(RwLock::new(Router::new())),
            listener,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Bind a new HTTP server on `port` on all interfaces.
    pub async fn listen(port: u16) -> Result<Self, Error> {
        Self::bind(ServerConfig::with_port(port)).await
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// A handle that stops [`HttpServer::run`].
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Add a route to the server.
    ///
    /// `pattern` is either a literal path or a regular expression matched
    /// against the whole resource. Registering the same pattern twice replaces
    /// the earlier handler.
    pub async fn route<F>(&self, pattern: impl Into<String>, handler: F)
    where
        F: for<'a> Fn(&'a Request, &'a mut Session) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        let pattern = pattern.into();
        debug!("Registering route {pattern}");
        self.routes.write().await.insert(pattern, handler_fn(handler));
    }

    /// Display the server banner and registered endpoints.
    async fn display_server_info(&self) -> Result<(), Error> {
        let banner = include_str!("../banner.txt");
        info!("\n{banner}");

        let routes = self.routes.read().await;
        info!("Registered routes:");
        for pattern in routes.patterns() {
            info!("  {pattern}");
        }

        info!("Serving HTTP on http://{addr}", addr = self.local_addr()?);
        Ok(())
    }

    /// Set up a Ctrl+C handler for graceful shutdown.
    fn setup_ctrl_c_handler(shutdown: ShutdownHandle) -> JoinHandle<()> {
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    shutdown.shutdown();
                }
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                }
            }
        })
    }

    /// Spawn the task serving a new connection.
    fn handle_new_connection<S>(
        socket: S,
        addr: SocketAddr,
        routes: Arc<RwLock<Router>>,
        read_buffer_size: usize,
        tasks: &mut JoinSet<()>,
    ) where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        info!("[{addr}] connected");

        tasks.spawn(async move {
            match Self::handle_connection(socket, routes, read_buffer_size).await {
                Ok(()) => info!("[{addr}] disconnected"),
                Err(Error::IoError(e)) | Err(Error::ParseError(ParserError::Io(e))) => {
                    warn!("[{addr}] I/O error: {e}");
                }
                Err(Error::ParseError(e)) => warn!("[{addr}] Bad request: {e}"),
                Err(e) => error!("[{addr}] Error handling connection: {e}"),
            }
        });
    }

    /// Log the outcome of a finished connection task.
    fn reap(result: Result<(), JoinError>) {
        if let Err(e) = result {
            if e.is_panic() {
                error!("Connection task panicked: {e}");
            }
        }
    }

    /// Whether an accept error means the listener itself is unusable.
    fn is_fatal_accept_error(e: &io::Error) -> bool {
        matches!(
            e.kind(),
            io::ErrorKind::BrokenPipe | io::ErrorKind::InvalidInput | io::ErrorKind::NotConnected
        )
    }

    /// Wait for in-flight connections.
    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let shutdown_timeout = tokio::time::Duration::from_secs(30);
        let drained = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = tasks.join_next().await {
                Self::reap(res);
            }
        })
        .await;

        if drained.is_err() {
            warn!("{len} connections still active, leaving them to finish", len = tasks.len());
            tasks.detach_all();
        }
    }

    /// Start accepting connections.
    ///
    /// Runs until a shutdown is requested through a [`ShutdownHandle`] (or
    /// Ctrl+C when enabled), then closes the listener.
    ///
    /// # Errors
    ///
    /// [`Error::IoError`] when the listener fails in a way that cannot be
    /// recovered from. Errors of individual connections are logged and never
    /// end the loop.
    pub async fn run(self) -> Result<(), Error> {
        self.display_server_info().await?;

        let HttpServer {
            config,
            routes,
            listener,
            shutdown_tx,
            mut shutdown_rx,
        } = self;

        let ctrl_c = config.ctrl_c_shutdown.then(|| {
            Self::setup_ctrl_c_handler(ShutdownHandle {
                tx: shutdown_tx.clone(),
            })
        });

        let mut tasks = JoinSet::new();

        let result = loop {
            tokio::select! {
                // Check for shutdown signal
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server...");
                    break Ok(());
                }

                // Reap finished connections
                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    Self::reap(res);
                }

                // Accept new connections
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_new_connection(
                                socket,
                                addr,
                                routes.clone(),
                                config.read_buffer_size,
                                &mut tasks,
                            );
                        }
                        Err(e) if Self::is_fatal_accept_error(&e) => {
                            error!("Critical error accepting connection, shutting down: {e}");
                            break Err(Error::IoError(e));
                        }
                        Err(e) => {
                            warn!("Error accepting connection: {e}");
                            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                        }
                    }
                }
            }
        };

        drop(listener);
        if let Some(handle) = ctrl_c {
            handle.abort();
        }

        Self::perform_shutdown(&mut tasks).await;
        info!("Server stopped");

        result
    }

    /// Answer a request that failed to parse with `400 Bad Request`.
    async fn reject<W>(writer: W, version: &str, e: ParserError) -> Result<(), Error>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        if e.is_bad_request() {
            let mut session = Session::new(writer, version);
            session.send_status(StatusCode::BadRequest).await?;
            session.complete().await?;
        }
        Err(Error::ParseError(e))
    }

    /// Handle a single connection: parse one request, dispatch it and finish
    /// the response.
    pub async fn handle_connection<S>(
        socket: S,
        routes: Arc<RwLock<Router>>,
        read_buffer_size: usize,
    ) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(socket);
        let mut reader = BufReader::with_capacity(read_buffer_size, read_half);

        let line = match read_request_line(&mut reader).await {
            Ok(Some(line)) => line,
            // Nothing was sent, nothing to answer
            Ok(None) => return Ok(()),
            Err(e) => return Self::reject(write_half, DEFAULT_VERSION, e).await,
        };
        info!("{} {} {}", line.method, line.target, line.version);

        let version = line.version.clone();
        let request = match read_request(&mut reader, line).await {
            Ok(request) => request,
            Err(e) => return Self::reject(write_half, &version, e).await,
        };

        let mut session = Session::new(write_half, version);
        let handler = routes.read().await.resolve(&request.resource);

        // A failed handler leaves the response as is; the connection is
        // closed when the session is dropped.
        handler(&request, &mut session).await?;

        if !session.is_disposed() {
            session.complete().await?;
        }

        Ok(())
    }
}
