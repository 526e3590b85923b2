//! SOCKS5 protocol constants
//!
//! Raw byte values and packet size limits used by the codecs.

// +----+----------+----------+
// |VER | NMETHODS | METHODS  |
// +----+----------+----------+
// | 1  |    1     | 1 to 255 |
// +----+----------+----------+

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// GSSAPI authentication (recognized, never negotiated)
pub const SOCKS5_AUTH_METHOD_GSSAPI: u8 = 0x01;
/// Username/password authentication (recognized, never negotiated)
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
/// No acceptable methods
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xFF;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;
/// TCP BIND command
pub const SOCKS5_CMD_TCP_BIND: u8 = 0x02;
/// UDP ASSOCIATE command
pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

// Packet sizes
/// Largest greeting: version, count, 255 methods
pub const MAX_GREETING_SIZE: usize = 257;
/// Largest request: 4-byte header, length byte, 255-byte name, port
pub const MAX_REQUEST_SIZE: usize = 262;
/// Largest reply, same layout as the request
pub const MAX_RESPONSE_SIZE: usize = 262;
/// Header (VER CMD RSV ATYP) plus the 2-byte port
pub const MIN_REQUEST_SIZE: usize = 6;
/// Length of a reply that carries no address
pub const FAILURE_RESPONSE_SIZE: usize = 4;
/// Maximum domain name length
pub const MAX_DOMAIN_LEN: usize = 255;
