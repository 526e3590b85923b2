//! SOCKS5 request parser
//!
//! Decodes a connection request packet into a [`Request`].

use crate::error::{Socks5Error, Socks5Result};
use crate::socks::consts::*;
use crate::socks::types::{AddressType, Command, Request};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Parse a SOCKS5 request packet
///
/// # SOCKS5 Request Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// The version byte was already checked during negotiation and the reserved
/// byte is ignored. The command is stored as received.
pub fn parse_request(packet: &[u8]) -> Socks5Result<Request> {
    if packet.len() < 4 {
        return Err(too_small(MIN_REQUEST_SIZE, packet));
    }

    let command = Command::from(packet[1]);
    let address_type = AddressType::try_from(packet[3])?;

    let (destination_host, port_at) = match address_type {
        AddressType::Ipv4 => {
            require(packet, MIN_REQUEST_SIZE + 4)?;
            let octets: [u8; 4] = [packet[4], packet[5], packet[6], packet[7]];
            (Ipv4Addr::from(octets).to_string(), 8)
        }

        AddressType::DomainName => {
            require(packet, MIN_REQUEST_SIZE + 1)?;
            let len = packet[4] as usize;
            require(packet, MIN_REQUEST_SIZE + 1 + len)?;
            let name = std::str::from_utf8(&packet[5..5 + len]).map_err(|e| {
                Socks5Error::MalformedPacket(format!("invalid UTF-8 in domain name: {}", e))
            })?;
            (name.to_string(), 5 + len)
        }

        AddressType::Ipv6 => {
            require(packet, MIN_REQUEST_SIZE + 16)?;
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&packet[4..20]);
            (Ipv6Addr::from(octets).to_string(), 20)
        }
    };

    let destination_port = u16::from_be_bytes([packet[port_at], packet[port_at + 1]]);

    Ok(Request {
        command,
        destination_host,
        destination_port,
        address_type,
    })
}

/// Total request length once enough of the header is known
///
/// Unknown address types report the header length so the parser sees the
/// packet and rejects it.
pub(crate) fn request_len(prefix: &[u8]) -> Option<usize> {
    match *prefix.get(3)? {
        SOCKS5_ADDR_TYPE_IPV4 => Some(MIN_REQUEST_SIZE + 4),
        SOCKS5_ADDR_TYPE_IPV6 => Some(MIN_REQUEST_SIZE + 16),
        SOCKS5_ADDR_TYPE_DOMAIN => prefix.get(4).map(|len| MIN_REQUEST_SIZE + 1 + *len as usize),
        _ => Some(4),
    }
}

fn require(packet: &[u8], expected: usize) -> Socks5Result<()> {
    if packet.len() < expected {
        Err(too_small(expected, packet))
    } else {
        Ok(())
    }
}

fn too_small(expected: usize, packet: &[u8]) -> Socks5Error {
    Socks5Error::PacketTooSmall {
        expected,
        actual: packet.len(),
    }
}

/// Encode a request; the inverse of [`parse_request`], used in tests
#[cfg(test)]
pub(crate) fn build_request_bytes(request: &Request) -> Vec<u8> {
    let mut packet = vec![
        SOCKS5_VERSION,
        request.command.to_byte(),
        SOCKS5_RESERVED,
        u8::from(request.address_type),
    ];
    match request.address_type {
        AddressType::Ipv4 => {
            let ip: Ipv4Addr = request.destination_host.parse().unwrap();
            packet.extend_from_slice(&ip.octets());
        }
        AddressType::DomainName => {
            packet.push(request.destination_host.len() as u8);
            packet.extend_from_slice(request.destination_host.as_bytes());
        }
        AddressType::Ipv6 => {
            let ip: Ipv6Addr = request.destination_host.parse().unwrap();
            packet.extend_from_slice(&ip.octets());
        }
    }
    packet.extend_from_slice(&request.destination_port.to_be_bytes());
    packet
}
