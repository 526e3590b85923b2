//! Bidirectional byte relay
//!
//! Once the handshake succeeds, bytes are copied between client and
//! destination by two independent tasks, one per direction. The handshake
//! does not wait for them; the returned [`Relay`] lets a supervisor observe
//! completion and reap the tasks.

use bytes::Bytes;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::debug;

/// Handles to the two running copy tasks
#[derive(Debug)]
pub struct Relay {
    client_to_server: JoinHandle<io::Result<u64>>,
    server_to_client: JoinHandle<io::Result<u64>>,
}

/// Outcome of both relay directions
#[derive(Debug)]
pub struct RelayStats {
    /// Bytes copied from client to destination
    pub client_to_server: io::Result<u64>,
    /// Bytes copied from destination to client
    pub server_to_client: io::Result<u64>,
}

impl Relay {
    /// Wait for both directions to end
    pub async fn wait(self) -> RelayStats {
        let (up, down) = tokio::join!(self.client_to_server, self.server_to_client);
        RelayStats {
            client_to_server: flatten(up),
            server_to_client: flatten(down),
        }
    }

    /// Abort both copy tasks
    pub fn abort(&self) {
        self.client_to_server.abort();
        self.server_to_client.abort();
    }
}

fn flatten(joined: Result<io::Result<u64>, tokio::task::JoinError>) -> io::Result<u64> {
    joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

/// Start relaying between `client` and `server`
///
/// `pending` holds client bytes that arrived together with the request and
/// are forwarded before anything else. Each direction half-closes its
/// destination when its source reaches EOF.
pub fn start_relay<C, S>(client: C, server: S, pending: Bytes) -> Relay
where
    C: AsyncRead + AsyncWrite + Send + 'static,
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut server_read, mut server_write) = tokio::io::split(server);

    let client_to_server = tokio::spawn(async move {
        let mut total = pending.len() as u64;
        if !pending.is_empty() {
            server_write.write_all(&pending).await?;
        }
        let result = tokio::io::copy(&mut client_read, &mut server_write).await;
        let _ = server_write.shutdown().await;
        match &result {
            Ok(bytes) => debug!("client->server finished: {} bytes", total + bytes),
            Err(e) => debug!("client->server error: {}", e),
        }
        total += result?;
        Ok(total)
    });

    let server_to_client = tokio::spawn(async move {
        let result = tokio::io::copy(&mut server_read, &mut client_write).await;
        let _ = client_write.shutdown().await;
        match &result {
            Ok(bytes) => debug!("server->client finished: {} bytes", bytes),
            Err(e) => debug!("server->client error: {}", e),
        }
        result
    });

    Relay {
        client_to_server,
        server_to_client,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_relay_bidirectional() {
        let (mut client_a, server_a) = duplex(1024);
        let (mut client_b, server_b) = duplex(1024);

        let relay = start_relay(server_a, server_b, Bytes::new());

        client_a.write_all(b"message A->B").await.unwrap();
        let mut buf_b = vec![0u8; 12];
        client_b.read_exact(&mut buf_b).await.unwrap();
        assert_eq!(&buf_b, b"message A->B");

        client_b.write_all(b"message B->A").await.unwrap();
        let mut buf_a = vec![0u8; 12];
        client_a.read_exact(&mut buf_a).await.unwrap();
        assert_eq!(&buf_a, b"message B->A");

        drop(client_a);
        drop(client_b);

        let stats = tokio::time::timeout(Duration::from_secs(1), relay.wait())
            .await
            .unwrap();
        assert_eq!(stats.client_to_server.unwrap(), 12);
        assert_eq!(stats.server_to_client.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_relay_forwards_pending_bytes_first() {
        let (mut client_a, server_a) = duplex(1024);
        let (mut client_b, server_b) = duplex(1024);

        let relay = start_relay(server_a, server_b, Bytes::from_static(b"early "));

        client_a.write_all(b"late").await.unwrap();
        let mut buf = vec![0u8; 10];
        client_b.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"early late");

        drop(client_a);
        drop(client_b);
        let stats = relay.wait().await;
        assert_eq!(stats.client_to_server.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_relay_large_data() {
        let (mut client_a, server_a) = duplex(65536);
        let (mut client_b, server_b) = duplex(65536);

        let relay = start_relay(server_a, server_b, Bytes::new());

        let large_data = vec![0xAB; 50000];
        let writer = tokio::spawn(async move {
            client_a.write_all(&large_data).await.unwrap();
            client_a
        });

        let mut received = vec![0u8; 50000];
        client_b.read_exact(&mut received).await.unwrap();
        assert!(received.iter().all(|b| *b == 0xAB));

        drop(writer.await.unwrap());
        drop(client_b);
        let _ = tokio::time::timeout(Duration::from_secs(1), relay.wait()).await;
    }

    #[tokio::test]
    async fn test_relay_half_close_propagates_eof() {
        let (mut client_a, server_a) = duplex(1024);
        let (mut client_b, server_b) = duplex(1024);

        let relay = start_relay(server_a, server_b, Bytes::new());

        client_a.write_all(b"bye").await.unwrap();
        client_a.shutdown().await.unwrap();

        let mut received = Vec::new();
        client_b.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"bye");

        client_b.write_all(b"ack").await.unwrap();
        drop(client_b);

        let mut reply = Vec::new();
        client_a.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, b"ack");

        let stats = tokio::time::timeout(Duration::from_secs(1), relay.wait())
            .await
            .unwrap();
        assert_eq!(stats.client_to_server.unwrap(), 3);
        assert_eq!(stats.server_to_client.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_relay_abort() {
        let (_client_a, server_a) = duplex(1024);
        let (_client_b, server_b) = duplex(1024);

        let relay = start_relay(server_a, server_b, Bytes::new());
        relay.abort();

        let stats = tokio::time::timeout(Duration::from_secs(1), relay.wait())
            .await
            .unwrap();
        assert!(stats.client_to_server.is_err());
        assert!(stats.server_to_client.is_err());
    }
}
