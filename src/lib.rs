//! # Socksgate - Embeddable SOCKS5 Proxy Core
//!
//! Socksgate accepts SOCKS5 clients, negotiates the "no authentication"
//! method, decodes a CONNECT request, dials the destination through a
//! pluggable dial capability and relays bytes in both directions.
//!
//! ## Features
//!
//! - **Wire codecs**: greeting, request and reply packets for all three
//!   address encodings (IPv4, domain name, IPv6)
//! - **Pluggable dialing**: the [`transport::Dialer`] trait lets an alternate
//!   network stack replace the OS TCP connect
//! - **Fragment-tolerant framing**: packets split across TCP segments are
//!   reassembled before decoding
//! - **Supervised relay**: the handshake returns as soon as the tunnel is up,
//!   while the relay tasks stay observable through a [`socks::Relay`] handle
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksgate::config::load_config;
//! use socksgate::Server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("socksgate.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     Server::from_config(&config)
//!         .serve(&config.server.listen, shutdown_rx)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SOCKS5 Client -> Server (listener) -> Connection (handshake) -> Dialer -> Target
//!                                              \-> Relay (two copy tasks)
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod server;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{Socks5Error, SocksgateError};
pub use server::{listen, listen_and_serve, Server};
pub use transport::{Dialer, TcpDialer};

/// Version of the Socksgate library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
