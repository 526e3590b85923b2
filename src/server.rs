//! Listener driver
//!
//! Accepts TCP clients and runs one [`Connection`] per client on its own
//! task. Per-connection failures stay inside that task; accept errors are
//! logged and the loop keeps going.

use crate::config::Config;
use crate::error::SocksgateError;
use crate::socks::{Connection, ConnectionOptions};
use crate::transport::{Dialer, TcpDialer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin the loop
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// SOCKS5 listener driver
#[derive(Debug)]
pub struct Server<D> {
    dialer: Arc<D>,
    options: ConnectionOptions,
}

impl<D> Clone for Server<D> {
    fn clone(&self) -> Self {
        Server {
            dialer: self.dialer.clone(),
            options: self.options,
        }
    }
}

impl Server<TcpDialer> {
    /// Create a server that dials with the OS TCP stack
    pub fn from_config(config: &Config) -> Self {
        Server::new(TcpDialer::from_config(&config.dialer)).with_options(ConnectionOptions {
            reply_on_dial_failure: config.dialer.reply_on_dial_failure,
        })
    }
}

impl<D: Dialer> Server<D> {
    /// Create a server around a dial capability
    pub fn new(dialer: D) -> Self {
        Self::with_dialer(Arc::new(dialer))
    }

    /// Create a server around a shared dial capability
    pub fn with_dialer(dialer: Arc<D>) -> Self {
        Server {
            dialer,
            options: ConnectionOptions::default(),
        }
    }

    /// Set per-connection options
    pub fn with_options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Bind `addr` and serve until `shutdown` fires
    pub async fn serve(
        &self,
        addr: &str,
        shutdown: broadcast::Receiver<bool>,
    ) -> Result<(), SocksgateError> {
        let listener = listen(addr).await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires
    pub async fn serve_listener(
        &self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<bool>,
    ) -> Result<(), SocksgateError> {
        if let Ok(addr) = listener.local_addr() {
            info!("SOCKS5 server listening on {}", addr);
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutdown signal received, stopping listener");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run one client on its own task
    pub fn spawn_connection<S>(&self, stream: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let dialer = self.dialer.clone();
        let options = self.options;
        tokio::spawn(
            handle_connection(stream, dialer, options).instrument(info_span!("conn", peer = %peer)),
        );
    }
}

/// Drive one client through the handshake and supervise its relay
async fn handle_connection<S, D>(stream: S, dialer: Arc<D>, options: ConnectionOptions)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    D: Dialer,
{
    debug!("Accepted connection");
    let mut conn = Connection::with_options(stream, dialer, options);

    match conn.run().await {
        Ok(relay) => {
            let stats = relay.wait().await;
            match (&stats.client_to_server, &stats.server_to_client) {
                (Ok(up), Ok(down)) => {
                    debug!("Relay finished: {} bytes up, {} bytes down", up, down)
                }
                _ => debug!("Relay finished with error: {:?}", stats),
            }
        }
        Err(e) => {
            if e.is_transport_error() {
                debug!("Connection dropped during handshake: {}", e);
            } else {
                warn!("SOCKS5 connection failed: {}", e);
            }
            conn.close();
        }
    }
}

/// Bind a listener on `addr`
pub async fn listen(addr: &str) -> Result<TcpListener, SocksgateError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| SocksgateError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Bind `addr` and serve forever with the default TCP dialer
///
/// Only returns if binding fails.
pub async fn listen_and_serve(addr: &str) -> SocksgateError {
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let server = Server::new(TcpDialer::with_defaults());

    match server.serve(addr, shutdown_rx).await {
        Err(e) => e,
        Ok(()) => SocksgateError::Config(format!("listener on {} stopped unexpectedly", addr)),
    }
}
