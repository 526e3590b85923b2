//! Error types for Socksgate
//!
//! This module defines the per-connection SOCKS5 error taxonomy and the
//! application-level error used by the listener and configuration layers.

use std::io;
use thiserror::Error;

/// Main error type for Socksgate operations
#[derive(Error, Debug)]
pub enum SocksgateError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The listener could not bind its address
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// SOCKS5 protocol error
    #[error("SOCKS5 error: {0}")]
    Socks5(#[from] Socks5Error),
}

/// Errors that terminate a single SOCKS5 connection
///
/// None of these are retried. Decode errors are answered with a best-effort
/// failure reply, dial and transport errors close the stream silently.
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Packet is structurally invalid (too short, bad method count)
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Packet is shorter than its address type requires
    #[error("Packet too small: expected at least {expected} bytes, got {actual}")]
    PacketTooSmall {
        /// Minimum length for the declared layout
        expected: usize,
        /// Length actually received
        actual: usize,
    },

    /// Address type not supported
    #[error("Address type not supported: {0}")]
    UnsupportedAddressType(u8),

    /// Bound address cannot be encoded for its address type
    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    /// The client offered no method we accept
    #[error("No acceptable authentication methods")]
    NoAcceptableAuthMethods,

    /// Outbound connection to the destination failed
    #[error("Failed to dial {target}: {source}")]
    Dial {
        /// The `host:port` that was dialed
        target: String,
        /// Error returned by the dialer
        #[source]
        source: io::Error,
    },

    /// Read or write failure on the client stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Socks5Error {
    /// True for errors raised while decoding or encoding a packet
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Socks5Error::MalformedPacket(_)
                | Socks5Error::UnsupportedVersion(_)
                | Socks5Error::PacketTooSmall { .. }
                | Socks5Error::UnsupportedAddressType(_)
                | Socks5Error::InvalidBindAddress(_)
        )
    }

    /// True for read/write failures on an established stream
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Socks5Error::Io(_))
    }
}

/// Result alias for connection-level operations
pub type Socks5Result<T> = std::result::Result<T, Socks5Error>;
