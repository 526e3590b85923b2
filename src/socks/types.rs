//! SOCKS5 type definitions
//!
//! The vocabulary shared by every codec: method, command, address type and
//! reply status bytes, plus the decoded request and the reply to encode.

use super::consts::*;
use crate::error::Socks5Error;
use std::fmt;
use std::io;
use std::net::IpAddr;

/// Authentication method offered by a client
///
/// This set is open: bytes outside the four known values are kept as
/// [`AuthMethod::Other`] so negotiation, not parsing, decides to reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    /// No authentication required
    NoAuthRequired,
    /// GSSAPI
    Gssapi,
    /// Username/password
    UsernamePassword,
    /// Sent by the server when nothing offered is acceptable
    NoAcceptableMethods,
    /// Any other method byte
    Other(u8),
}

impl AuthMethod {
    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::NoAuthRequired => SOCKS5_AUTH_METHOD_NONE,
            AuthMethod::Gssapi => SOCKS5_AUTH_METHOD_GSSAPI,
            AuthMethod::UsernamePassword => SOCKS5_AUTH_METHOD_PASSWORD,
            AuthMethod::NoAcceptableMethods => SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE,
            AuthMethod::Other(byte) => byte,
        }
    }
}

impl From<u8> for AuthMethod {
    fn from(byte: u8) -> Self {
        match byte {
            SOCKS5_AUTH_METHOD_NONE => AuthMethod::NoAuthRequired,
            SOCKS5_AUTH_METHOD_GSSAPI => AuthMethod::Gssapi,
            SOCKS5_AUTH_METHOD_PASSWORD => AuthMethod::UsernamePassword,
            SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE => AuthMethod::NoAcceptableMethods,
            other => AuthMethod::Other(other),
        }
    }
}

/// Command carried by a request
///
/// Only CONNECT is executed, but any byte is accepted when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// TCP CONNECT
    Connect,
    /// TCP BIND
    Bind,
    /// UDP ASSOCIATE
    UdpAssociate,
    /// Unknown command byte
    Other(u8),
}

impl Command {
    /// Convert to SOCKS5 command byte
    pub fn to_byte(self) -> u8 {
        match self {
            Command::Connect => SOCKS5_CMD_TCP_CONNECT,
            Command::Bind => SOCKS5_CMD_TCP_BIND,
            Command::UdpAssociate => SOCKS5_CMD_UDP_ASSOCIATE,
            Command::Other(byte) => byte,
        }
    }
}

impl From<u8> for Command {
    fn from(byte: u8) -> Self {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => Command::Connect,
            SOCKS5_CMD_TCP_BIND => Command::Bind,
            SOCKS5_CMD_UDP_ASSOCIATE => Command::UdpAssociate,
            other => Command::Other(other),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Connect => write!(f, "CONNECT"),
            Command::Bind => write!(f, "BIND"),
            Command::UdpAssociate => write!(f, "UDP ASSOCIATE"),
            Command::Other(byte) => write!(f, "UNKNOWN({:#04x})", byte),
        }
    }
}

/// Address type of a request or reply
///
/// Closed set: an unknown byte is a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddressType {
    /// 4-byte IPv4 address
    Ipv4 = SOCKS5_ADDR_TYPE_IPV4,
    /// Length-prefixed domain name
    DomainName = SOCKS5_ADDR_TYPE_DOMAIN,
    /// 16-byte IPv6 address
    Ipv6 = SOCKS5_ADDR_TYPE_IPV6,
}

impl AddressType {
    /// Classify a host string the way bound addresses are reported:
    /// IPv4 literal, any other IP literal, otherwise a domain name.
    pub fn classify(host: &str) -> Self {
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => AddressType::Ipv4,
            Ok(IpAddr::V6(v6)) if v6.to_ipv4_mapped().is_some() => AddressType::Ipv4,
            Ok(IpAddr::V6(_)) => AddressType::Ipv6,
            Err(_) => AddressType::DomainName,
        }
    }
}

impl From<AddressType> for u8 {
    fn from(atyp: AddressType) -> Self {
        atyp as u8
    }
}

impl TryFrom<u8> for AddressType {
    type Error = Socks5Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            SOCKS5_ADDR_TYPE_IPV4 => Ok(AddressType::Ipv4),
            SOCKS5_ADDR_TYPE_DOMAIN => Ok(AddressType::DomainName),
            SOCKS5_ADDR_TYPE_IPV6 => Ok(AddressType::Ipv6),
            other => Err(Socks5Error::UnsupportedAddressType(other)),
        }
    }
}

/// Reply status codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyStatus {
    /// Command succeeded
    Success = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<ReplyStatus> for u8 {
    fn from(status: ReplyStatus) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for ReplyStatus {
    type Error = Socks5Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ReplyStatus::Success),
            0x01 => Ok(ReplyStatus::GeneralFailure),
            0x02 => Ok(ReplyStatus::ConnectionNotAllowed),
            0x03 => Ok(ReplyStatus::NetworkUnreachable),
            0x04 => Ok(ReplyStatus::HostUnreachable),
            0x05 => Ok(ReplyStatus::ConnectionRefused),
            0x06 => Ok(ReplyStatus::TtlExpired),
            0x07 => Ok(ReplyStatus::CommandNotSupported),
            0x08 => Ok(ReplyStatus::AddressTypeNotSupported),
            other => Err(Socks5Error::MalformedPacket(format!(
                "unknown reply status {}",
                other
            ))),
        }
    }
}

impl From<&io::Error> for ReplyStatus {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => ReplyStatus::ConnectionRefused,
            io::ErrorKind::NetworkUnreachable => ReplyStatus::NetworkUnreachable,
            io::ErrorKind::HostUnreachable => ReplyStatus::HostUnreachable,
            io::ErrorKind::TimedOut => ReplyStatus::HostUnreachable,
            io::ErrorKind::AddrNotAvailable => ReplyStatus::HostUnreachable,
            io::ErrorKind::PermissionDenied => ReplyStatus::ConnectionNotAllowed,
            _ => ReplyStatus::GeneralFailure,
        }
    }
}

/// A decoded connection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Requested command
    pub command: Command,
    /// Destination host: IP literal or domain name
    pub destination_host: String,
    /// Destination port
    pub destination_port: u16,
    /// How the destination was encoded
    pub address_type: AddressType,
}

impl Request {
    /// `host:port` string handed to the dialer. IPv6 hosts are bracketed.
    pub fn target(&self) -> String {
        join_host_port(&self.destination_host, self.destination_port)
    }
}

/// A reply to encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Reply status
    pub status: ReplyStatus,
    /// Encoding of the bound address; `None` is written as a zero
    /// placeholder and is only valid on failure replies
    pub address_type: Option<AddressType>,
    /// Bound host
    pub bound_host: String,
    /// Bound port
    pub bound_port: u16,
}

impl Response {
    /// A success reply carrying the given bound address
    pub fn success(
        address_type: AddressType,
        bound_host: impl Into<String>,
        bound_port: u16,
    ) -> Self {
        Response {
            status: ReplyStatus::Success,
            address_type: Some(address_type),
            bound_host: bound_host.into(),
            bound_port,
        }
    }

    /// A failure reply; encodes to the 4-byte short form
    pub fn failure(status: ReplyStatus) -> Self {
        Response {
            status,
            address_type: None,
            bound_host: String::new(),
            bound_port: 0,
        }
    }
}

/// Join a host and port, bracketing IPv6 literals
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
