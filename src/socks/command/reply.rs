//! SOCKS5 reply builder
//!
//! Encodes [`Response`] values into reply packets and writes them.

use crate::error::{Socks5Error, Socks5Result};
use crate::socks::consts::*;
use crate::socks::types::{AddressType, ReplyStatus, Response};
use std::net::IpAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encode a SOCKS5 reply
///
/// # SOCKS5 Reply Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Non-success replies stop after ATYP and are always 4 bytes. Success
/// replies fail with `InvalidBindAddress` when the bound host does not fit
/// its address type.
pub fn build_response(response: &Response) -> Socks5Result<Vec<u8>> {
    let mut packet = Vec::with_capacity(MAX_RESPONSE_SIZE);
    packet.push(SOCKS5_VERSION);
    packet.push(response.status.into());
    packet.push(SOCKS5_RESERVED);
    packet.push(response.address_type.map(u8::from).unwrap_or(0));

    if response.status != ReplyStatus::Success {
        return Ok(packet);
    }

    let host = response.bound_host.as_str();
    match response.address_type {
        Some(AddressType::Ipv4) => {
            let ip = match host.parse::<IpAddr>() {
                Ok(IpAddr::V4(v4)) => Some(v4),
                Ok(IpAddr::V6(v6)) => v6.to_ipv4_mapped(),
                Err(_) => None,
            }
            .ok_or_else(|| {
                Socks5Error::InvalidBindAddress(format!("{:?} is not an IPv4 address", host))
            })?;
            packet.extend_from_slice(&ip.octets());
        }

        Some(AddressType::DomainName) => {
            if host.len() > MAX_DOMAIN_LEN {
                return Err(Socks5Error::InvalidBindAddress(format!(
                    "domain name of {} bytes exceeds {}",
                    host.len(),
                    MAX_DOMAIN_LEN
                )));
            }
            packet.push(host.len() as u8);
            packet.extend_from_slice(host.as_bytes());
        }

        Some(AddressType::Ipv6) => {
            let ip = match host.parse::<IpAddr>() {
                Ok(IpAddr::V6(v6)) => v6,
                Ok(IpAddr::V4(v4)) => v4.to_ipv6_mapped(),
                Err(_) => {
                    return Err(Socks5Error::InvalidBindAddress(format!(
                        "{:?} is not an IPv6 address",
                        host
                    )))
                }
            };
            packet.extend_from_slice(&ip.octets());
        }

        None => return Err(Socks5Error::UnsupportedAddressType(0)),
    }

    packet.extend_from_slice(&response.bound_port.to_be_bytes());
    Ok(packet)
}

/// Encode a reply, falling back to a bare `GeneralFailure` when the
/// success form cannot be encoded
///
/// Returns the packet and the encode error, if any, so the caller can still
/// fail the connection after sending.
pub fn build_response_or_failure(response: &Response) -> (Vec<u8>, Option<Socks5Error>) {
    match build_response(response) {
        Ok(packet) => (packet, None),
        Err(e) => (failure_packet(ReplyStatus::GeneralFailure), Some(e)),
    }
}

/// The 4-byte reply for a non-success status
pub fn failure_packet(status: ReplyStatus) -> Vec<u8> {
    vec![SOCKS5_VERSION, status.into(), SOCKS5_RESERVED, 0]
}

/// Write a failure reply, ignoring write errors
///
/// Used on paths that are already failing, where the client may be gone.
pub async fn send_failure_best_effort<S>(stream: &mut S, status: ReplyStatus)
where
    S: AsyncWrite + Unpin,
{
    let packet = failure_packet(status);
    if let Err(e) = stream.write_all(&packet).await {
        tracing::trace!("Failed to send failure reply: {}", e);
        return;
    }
    let _ = stream.flush().await;
}

/// Decode a reply packet; the reference decoder used by tests
#[cfg(test)]
pub(crate) fn parse_response_bytes(packet: &[u8]) -> Socks5Result<Response> {
    use std::net::{Ipv4Addr, Ipv6Addr};

    let status = ReplyStatus::try_from(packet[1])?;
    if status != ReplyStatus::Success {
        return Ok(Response::failure(status));
    }
    let address_type = AddressType::try_from(packet[3])?;
    let (host, port_at) = match address_type {
        AddressType::Ipv4 => {
            let octets: [u8; 4] = packet[4..8].try_into().unwrap();
            (Ipv4Addr::from(octets).to_string(), 8)
        }
        AddressType::DomainName => {
            let len = packet[4] as usize;
            (String::from_utf8(packet[5..5 + len].to_vec()).unwrap(), 5 + len)
        }
        AddressType::Ipv6 => {
            let octets: [u8; 16] = packet[4..20].try_into().unwrap();
            (Ipv6Addr::from(octets).to_string(), 20)
        }
    };
    let port = u16::from_be_bytes([packet[port_at], packet[port_at + 1]]);
    assert_eq!(packet.len(), port_at + 2);
    Ok(Response::success(address_type, host, port))
}
