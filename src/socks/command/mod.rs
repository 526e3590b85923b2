//! SOCKS5 request and reply codecs
//!
//! Handles parsing SOCKS5 requests and building replies.

mod parser;
mod reply;

pub use parser::parse_request;
pub(crate) use parser::request_len;
pub use reply::{
    build_response, build_response_or_failure, failure_packet, send_failure_best_effort,
};

#[cfg(test)]
pub(crate) use parser::build_request_bytes;
#[cfg(test)]
pub(crate) use reply::parse_response_bytes;
