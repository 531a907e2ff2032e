//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The read buffer size of each connection.
    pub read_buffer_size: usize,
    /// Stop accepting connections on Ctrl+C.
    pub ctrl_c_shutdown: bool,
}

impl ServerConfig {
    /// Listen on `port` on all interfaces, with default settings otherwise.
    pub fn with_port(port: u16) -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            read_buffer_size: 8192,
            ctrl_c_shutdown: true,
        }
    }
}
