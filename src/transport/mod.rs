//! Outbound dialing for Socksgate
//!
//! The proxy never connects to destinations itself. It asks a [`Dialer`]
//! for a stream, so the OS TCP stack can be swapped for a userspace network
//! stack or an in-memory one in tests.

mod tcp;

pub use tcp::TcpDialer;

use crate::config::DialerConfig;
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Socket options applied to outbound TCP streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts {
            nodelay: true,
            keepalive_secs: Some(20),
            keepalive_interval: Some(8),
        }
    }
}

impl SocketOpts {
    /// Create socket options from dialer config
    ///
    /// A keepalive time of zero disables keepalive.
    pub fn from_dialer_config(config: &DialerConfig) -> Self {
        let keepalive = config.keepalive_secs > 0;
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: keepalive.then_some(config.keepalive_secs),
            keepalive_interval: keepalive.then_some(config.keepalive_interval),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// Local address of an outbound connection, as reported to the client
///
/// The host is kept as a string because userspace stacks may report names
/// rather than IP literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundAddr {
    /// Host part: an IP literal or a name
    pub host: String,
    /// Port
    pub port: u16,
}

impl BoundAddr {
    /// Create a bound address from parts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        BoundAddr {
            host: host.into(),
            port,
        }
    }
}

impl From<SocketAddr> for BoundAddr {
    fn from(addr: SocketAddr) -> Self {
        BoundAddr::new(addr.ip().to_string(), addr.port())
    }
}

impl fmt::Display for BoundAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::socks::join_host_port(&self.host, self.port))
    }
}

/// A connected outbound stream and its local address
pub struct Dialed<S> {
    /// The connected stream
    pub stream: S,
    /// Local end of the connection
    pub local_addr: BoundAddr,
}

impl<S> Debug for Dialed<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialed")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

/// Capability to open outbound streams
///
/// Given a network type (`"tcp"`) and a `host:port` address, return a
/// connected bidirectional stream or an error. No timeout is imposed by the
/// proxy; implementations enforce their own.
#[async_trait]
pub trait Dialer: Debug + Send + Sync + 'static {
    /// The stream type produced by this dialer
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to `address` over `network`
    async fn dial(&self, network: &str, address: &str) -> io::Result<Dialed<Self::Stream>>;
}

#[async_trait]
impl<D: Dialer> Dialer for Arc<D> {
    type Stream = D::Stream;

    async fn dial(&self, network: &str, address: &str) -> io::Result<Dialed<Self::Stream>> {
        (**self).dial(network, address).await
    }
}
