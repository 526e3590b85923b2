//! Test utilities and mocks for Socksgate
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use socksgate::transport::{BoundAddr, Dialed, Dialer};
use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Create a pair of connected duplex streams for testing
pub fn create_mock_stream_pair() -> (DuplexStream, DuplexStream) {
    duplex(8192)
}

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Spawn a TCP echo server and return its address
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });
    addr
}

/// A port on loopback with nothing listening on it
pub async fn closed_port() -> u16 {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr.port()
}

/// Dialer backed by in-memory pipes
///
/// Every successful dial hands the far end of a fresh duplex pipe to the
/// test through [`MockDialer::accept`], standing in for the destination.
#[derive(Debug)]
pub struct MockDialer {
    local_addr: BoundAddr,
    fail_with: Option<io::ErrorKind>,
    targets: Mutex<Vec<String>>,
    far_ends: mpsc::UnboundedSender<DuplexStream>,
    accepted: tokio::sync::Mutex<mpsc::UnboundedReceiver<DuplexStream>>,
}

impl MockDialer {
    /// Dialer whose connections report `local_addr` as their bound address
    pub fn new(local_addr: BoundAddr) -> Self {
        let (far_ends, accepted) = mpsc::unbounded_channel();
        MockDialer {
            local_addr,
            fail_with: None,
            targets: Mutex::new(Vec::new()),
            far_ends,
            accepted: tokio::sync::Mutex::new(accepted),
        }
    }

    /// Dialer that fails every dial with `kind`
    pub fn failing(kind: io::ErrorKind) -> Self {
        MockDialer {
            fail_with: Some(kind),
            ..Self::new(BoundAddr::new("127.0.0.1", 0))
        }
    }

    /// Addresses dialed so far
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }

    /// Destination side of the next dialed connection
    pub async fn accept(&self) -> DuplexStream {
        self.accepted.lock().await.recv().await.unwrap()
    }
}

#[async_trait]
impl Dialer for MockDialer {
    type Stream = DuplexStream;

    async fn dial(&self, network: &str, address: &str) -> io::Result<Dialed<DuplexStream>> {
        assert_eq!(network, "tcp");
        self.targets.lock().unwrap().push(address.to_string());
        if let Some(kind) = self.fail_with {
            return Err(io::Error::new(kind, "mock dial failure"));
        }

        let (near, far) = duplex(8192);
        let _ = self.far_ends.send(far);
        Ok(Dialed {
            stream: near,
            local_addr: self.local_addr.clone(),
        })
    }
}

/// Greeting packet offering `methods`
pub fn greeting(methods: &[u8]) -> Vec<u8> {
    let mut packet = vec![0x05, methods.len() as u8];
    packet.extend_from_slice(methods);
    packet
}

/// CONNECT request for an IPv4 destination
pub fn connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
    let mut packet = vec![0x05, 0x01, 0x00, 0x01];
    packet.extend_from_slice(&ip);
    packet.extend_from_slice(&port.to_be_bytes());
    packet
}

/// CONNECT request for a domain-name destination
pub fn connect_domain(name: &str, port: u16) -> Vec<u8> {
    let mut packet = vec![0x05, 0x01, 0x00, 0x03, name.len() as u8];
    packet.extend_from_slice(name.as_bytes());
    packet.extend_from_slice(&port.to_be_bytes());
    packet
}

/// CONNECT request for an IPv6 destination
pub fn connect_ipv6(ip: [u8; 16], port: u16) -> Vec<u8> {
    let mut packet = vec![0x05, 0x01, 0x00, 0x04];
    packet.extend_from_slice(&ip);
    packet.extend_from_slice(&port.to_be_bytes());
    packet
}

/// Read exactly `n` bytes
pub async fn read_n<S: AsyncReadExt + Unpin>(stream: &mut S, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    stream.read_exact(&mut buf).await.unwrap();
    buf
}

/// Read a full SOCKS5 reply, sized from its address type
pub async fn read_reply<S: AsyncReadExt + Unpin>(stream: &mut S) -> Vec<u8> {
    let mut reply = read_n(stream, 4).await;
    let rest = match reply[3] {
        0x01 => 4 + 2,
        0x04 => 16 + 2,
        0x03 => {
            let len = read_n(stream, 1).await;
            reply.extend_from_slice(&len);
            len[0] as usize + 2
        }
        _ => 0,
    };
    reply.extend(read_n(stream, rest).await);
    reply
}

/// Write `data` and flush
pub async fn send<S: AsyncWriteExt + Unpin>(stream: &mut S, data: &[u8]) {
    stream.write_all(data).await.unwrap();
    stream.flush().await.unwrap();
}
