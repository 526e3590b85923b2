//! TCP dialer implementation
//!
//! Default [`Dialer`] backed by the operating system's TCP stack.

use super::{BoundAddr, Dialed, Dialer, SocketOpts};
use crate::config::DialerConfig;
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP dialer for plain connections
#[derive(Debug, Clone)]
pub struct TcpDialer {
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
    /// Connection timeout; `None` leaves it to the OS
    connect_timeout: Option<Duration>,
}

impl TcpDialer {
    /// Create a new TCP dialer with default options and no timeout
    pub fn with_defaults() -> Self {
        TcpDialer {
            socket_opts: SocketOpts::default(),
            connect_timeout: None,
        }
    }

    /// Create a TCP dialer from configuration
    pub fn from_config(config: &DialerConfig) -> Self {
        TcpDialer {
            socket_opts: SocketOpts::from_dialer_config(config),
            connect_timeout: config.connect_timeout(),
        }
    }

    /// Set socket options
    pub fn with_socket_opts(mut self, opts: SocketOpts) -> Self {
        self.socket_opts = opts;
        self
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    async fn connect(&self, address: &str) -> io::Result<TcpStream> {
        match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, TcpStream::connect(address))
                .await
                .map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("connection to {} timed out", address),
                    )
                })?,
            None => TcpStream::connect(address).await,
        }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, network: &str, address: &str) -> io::Result<Dialed<TcpStream>> {
        if !matches!(network, "tcp" | "tcp4" | "tcp6") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported network: {}", network),
            ));
        }

        let stream = self.connect(address).await?;

        if let Err(e) = self.socket_opts.apply(&stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }

        let local_addr = BoundAddr::from(stream.local_addr()?);
        tracing::debug!("TCP connection established to {} from {}", address, local_addr);

        Ok(Dialed { stream, local_addr })
    }
}
