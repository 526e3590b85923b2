//! SOCKS5 method negotiation
//!
//! Decodes the client greeting and encodes the method-selection reply.
//! Only "no authentication required" is ever selected.

use super::consts::*;
use super::types::AuthMethod;
use crate::error::{Socks5Error, Socks5Result};

/// Parse the client greeting into the offered methods, in received order
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
///
/// Bytes past the declared method count are ignored.
pub fn parse_greeting(packet: &[u8]) -> Socks5Result<Vec<AuthMethod>> {
    match packet.first() {
        Some(&version) if version != SOCKS5_VERSION => {
            return Err(Socks5Error::UnsupportedVersion(version))
        }
        _ => {}
    }

    if packet.len() < 2 {
        return Err(Socks5Error::MalformedPacket(format!(
            "greeting of {} bytes is too short",
            packet.len()
        )));
    }

    let count = packet[1] as usize;
    let available = packet.len() - 2;
    if available < count {
        return Err(Socks5Error::MalformedPacket(format!(
            "incorrect nmethods specified: {} vs {}",
            count, available
        )));
    }

    Ok(packet[2..2 + count]
        .iter()
        .copied()
        .map(AuthMethod::from)
        .collect())
}

/// Build the 2-byte method-selection reply
pub fn build_greeting_reply(method: AuthMethod) -> [u8; 2] {
    [SOCKS5_VERSION, method.to_byte()]
}

/// Pick the method to use from those offered
///
/// Position in the list does not matter; only `NoAuthRequired` is accepted.
pub fn select_method(methods: &[AuthMethod]) -> Option<AuthMethod> {
    methods
        .iter()
        .copied()
        .find(|m| *m == AuthMethod::NoAuthRequired)
}

/// Total greeting length once the count byte is known
///
/// A wrong version byte ends the frame at whatever is already buffered, so
/// the greeting is rejected without waiting for more input.
pub(crate) fn greeting_len(prefix: &[u8]) -> Option<usize> {
    if *prefix.first()? != SOCKS5_VERSION {
        return Some(prefix.len());
    }
    prefix.get(1).map(|count| 2 + *count as usize)
}
