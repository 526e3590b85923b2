//! Per-connection SOCKS5 state machine
//!
//! A [`Connection`] drives one client through
//! `Start -> Greeted -> AuthSelected -> RequestRead -> Relaying`, moving
//! strictly forward. Any failure moves it to `Failed`; closing it moves it
//! to `Closed`.

use crate::error::{Socks5Error, Socks5Result};
use crate::socks::auth::{build_greeting_reply, greeting_len, parse_greeting, select_method};
use crate::socks::command::{
    build_response_or_failure, parse_request, request_len, send_failure_best_effort,
};
use crate::socks::consts::*;
use crate::socks::framing::read_frame;
use crate::socks::relay::{start_relay, Relay};
use crate::socks::types::{AddressType, AuthMethod, ReplyStatus, Request, Response};
use crate::transport::Dialer;
use bytes::BytesMut;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Where a connection is in the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing read yet
    Start,
    /// Greeting decoded
    Greeted,
    /// Method selection sent
    AuthSelected,
    /// Request decoded
    RequestRead,
    /// Success reply sent, bytes flowing
    Relaying,
    /// Client stream released by the driver
    Closed,
    /// A phase failed
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Start => "start",
            Phase::Greeted => "greeted",
            Phase::AuthSelected => "auth-selected",
            Phase::RequestRead => "request-read",
            Phase::Relaying => "relaying",
            Phase::Closed => "closed",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Behavior switches for a connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Answer dial failures with a mapped failure reply instead of closing
    /// silently
    pub reply_on_dial_failure: bool,
}

/// One client's SOCKS5 session
pub struct Connection<S, D> {
    client: Option<S>,
    dialer: Arc<D>,
    options: ConnectionOptions,
    buf: BytesMut,
    methods: Vec<AuthMethod>,
    request: Option<Request>,
    phase: Phase,
}

impl<S, D> fmt::Debug for Connection<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("phase", &self.phase)
            .field("methods", &self.methods)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl<S, D> Connection<S, D>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    D: Dialer,
{
    /// Wrap an accepted client stream
    pub fn new(client: S, dialer: Arc<D>) -> Self {
        Self::with_options(client, dialer, ConnectionOptions::default())
    }

    /// Wrap an accepted client stream with explicit options
    pub fn with_options(client: S, dialer: Arc<D>, options: ConnectionOptions) -> Self {
        Connection {
            client: Some(client),
            dialer,
            options,
            buf: BytesMut::with_capacity(MAX_REQUEST_SIZE),
            methods: Vec::new(),
            request: None,
            phase: Phase::Start,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Methods offered by the client, in received order
    pub fn methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    /// The decoded request, once read
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// Run the handshake through to the relay
    ///
    /// Returns as soon as the success reply is written; the relay keeps
    /// running in the background. On error the connection is `Failed` and the
    /// caller should [`close`](Self::close) it.
    pub async fn run(&mut self) -> Socks5Result<Relay> {
        let result = self.handshake().await;
        if result.is_err() {
            self.phase = Phase::Failed;
        }
        result
    }

    async fn handshake(&mut self) -> Socks5Result<Relay> {
        self.read_greeting().await?;
        self.negotiate().await?;
        self.read_request().await?;
        self.connect().await
    }

    /// Release the client stream
    pub fn close(&mut self) {
        self.client = None;
        self.phase = Phase::Closed;
        debug!("Connection closed");
    }

    fn client(&mut self) -> Socks5Result<&mut S> {
        self.client.as_mut().ok_or_else(released)
    }

    async fn write_client(&mut self, packet: &[u8]) -> Socks5Result<()> {
        let client = self.client()?;
        client.write_all(packet).await?;
        client.flush().await?;
        Ok(())
    }

    /// Start -> Greeted
    pub(crate) async fn read_greeting(&mut self) -> Socks5Result<()> {
        let client = self.client.as_mut().ok_or_else(released)?;
        let packet = read_frame(client, &mut self.buf, MAX_GREETING_SIZE, greeting_len).await?;

        match parse_greeting(&packet) {
            Ok(methods) => {
                debug!("Greeting offered {} method(s): {:?}", methods.len(), methods);
                self.methods = methods;
                self.phase = Phase::Greeted;
                Ok(())
            }
            Err(e) => {
                let reply = build_greeting_reply(AuthMethod::NoAcceptableMethods);
                if let Ok(client) = self.client() {
                    let _ = client.write_all(&reply).await;
                    let _ = client.flush().await;
                }
                Err(e)
            }
        }
    }

    /// Greeted -> AuthSelected
    pub(crate) async fn negotiate(&mut self) -> Socks5Result<()> {
        match select_method(&self.methods) {
            Some(method) => {
                self.write_client(&build_greeting_reply(method)).await?;
                debug!("Selected authentication method {:?}", method);
                self.phase = Phase::AuthSelected;
                Ok(())
            }
            None => {
                self.write_client(&build_greeting_reply(AuthMethod::NoAcceptableMethods))
                    .await?;
                Err(Socks5Error::NoAcceptableAuthMethods)
            }
        }
    }

    /// AuthSelected -> RequestRead
    pub(crate) async fn read_request(&mut self) -> Socks5Result<()> {
        let client = self.client.as_mut().ok_or_else(released)?;
        let packet = read_frame(client, &mut self.buf, MAX_REQUEST_SIZE, request_len).await?;

        match parse_request(&packet) {
            Ok(request) => {
                debug!("SOCKS5 {} request to {}", request.command, request.target());
                self.request = Some(request);
                self.phase = Phase::RequestRead;
                Ok(())
            }
            Err(e) => {
                if let Ok(client) = self.client() {
                    send_failure_best_effort(client, ReplyStatus::GeneralFailure).await;
                }
                Err(e)
            }
        }
    }

    /// RequestRead -> Relaying
    pub(crate) async fn connect(&mut self) -> Socks5Result<Relay> {
        let target = match &self.request {
            Some(request) => request.target(),
            None => {
                return Err(Socks5Error::MalformedPacket(
                    "no request has been read".to_string(),
                ))
            }
        };

        let dialed = match self.dialer.dial("tcp", &target).await {
            Ok(dialed) => dialed,
            Err(source) => {
                if self.options.reply_on_dial_failure {
                    let status = ReplyStatus::from(&source);
                    if let Ok(client) = self.client() {
                        send_failure_best_effort(client, status).await;
                    }
                }
                return Err(Socks5Error::Dial { target, source });
            }
        };

        let bound = dialed.local_addr;
        let address_type = AddressType::classify(&bound.host);
        let response = Response::success(address_type, bound.host, bound.port);
        let (packet, encode_error) = build_response_or_failure(&response);
        self.write_client(&packet).await?;
        if let Some(e) = encode_error {
            return Err(e);
        }

        let client = self.client.take().ok_or_else(released)?;
        let pending = self.buf.split().freeze();

        info!("SOCKS5 tunnel established to {}", target);
        self.phase = Phase::Relaying;
        Ok(start_relay(client, dialed.stream, pending))
    }
}

fn released() -> Socks5Error {
    Socks5Error::Io(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "client stream already released",
    ))
}
