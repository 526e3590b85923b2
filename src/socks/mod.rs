//! SOCKS5 protocol support
//!
//! Codecs for the greeting, request and reply packets, the per-connection
//! state machine that drives them, and the byte relay that takes over once a
//! tunnel is established. Only the CONNECT flow with no authentication is
//! served; other commands decode but are dialed like CONNECT.

mod auth;
mod command;
mod conn;
mod consts;
mod framing;
mod relay;
mod types;

pub use auth::{build_greeting_reply, parse_greeting, select_method};
pub use command::{
    build_response, build_response_or_failure, failure_packet, parse_request,
    send_failure_best_effort,
};
pub use conn::{Connection, ConnectionOptions, Phase};
pub use consts::*;
pub use relay::{start_relay, Relay, RelayStats};
pub use types::{join_host_port, AddressType, AuthMethod, Command, ReplyStatus, Request, Response};
