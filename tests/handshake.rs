//! End-to-end handshake tests over in-memory streams

mod common;

use common::*;
use socksgate::socks::{Connection, ConnectionOptions, Phase};
use socksgate::transport::BoundAddr;
use socksgate::Socks5Error;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

#[tokio::test]
async fn test_connect_ipv4_and_relay_both_ways() {
    let dialer = Arc::new(MockDialer::new(BoundAddr::new("192.168.1.20", 51000)));
    let (mut client, server_side) = create_mock_stream_pair();
    let mut conn = Connection::new(server_side, dialer.clone());

    send(&mut client, &[0x05, 0x01, 0x00]).await;
    send(&mut client, &[0x05, 0x01, 0x00, 0x01, 93, 184, 216, 34, 0x00, 0x50]).await;

    let relay = conn.run().await.unwrap();
    assert_eq!(dialer.targets(), vec!["93.184.216.34:80"]);

    assert_eq!(read_n(&mut client, 2).await, vec![0x05, 0x00]);
    assert_eq!(
        read_reply(&mut client).await,
        vec![0x05, 0x00, 0x00, 0x01, 192, 168, 1, 20, 0xC7, 0x38]
    );

    let mut destination = dialer.accept().await;
    send(&mut client, b"ping from client").await;
    assert_eq!(read_n(&mut destination, 16).await, b"ping from client");
    send(&mut destination, b"pong from server").await;
    assert_eq!(read_n(&mut client, 16).await, b"pong from server");

    drop(client);
    drop(destination);
    let stats = tokio::time::timeout(Duration::from_secs(1), relay.wait())
        .await
        .unwrap();
    assert_eq!(stats.client_to_server.unwrap(), 16);
    assert_eq!(stats.server_to_client.unwrap(), 16);
}

#[tokio::test]
async fn test_no_auth_selected_regardless_of_position() {
    for methods in [vec![0x00], vec![0x02, 0x00], vec![0x01, 0x02, 0x80, 0x00]] {
        let dialer = Arc::new(MockDialer::new(BoundAddr::new("10.0.0.1", 1)));
        let (mut client, server_side) = create_mock_stream_pair();
        let mut conn = Connection::new(server_side, dialer);

        send(&mut client, &greeting(&methods)).await;
        send(&mut client, &connect_ipv4([10, 0, 0, 2], 22)).await;

        let relay = conn.run().await.unwrap();
        assert_eq!(conn.methods().len(), methods.len());
        assert_eq!(read_n(&mut client, 2).await, vec![0x05, 0x00]);
        relay.abort();
    }
}

#[tokio::test]
async fn test_empty_greeting_rejected() {
    let dialer = Arc::new(MockDialer::new(BoundAddr::new("10.0.0.1", 1)));
    let (mut client, server_side) = create_mock_stream_pair();
    let mut conn = Connection::new(server_side, dialer.clone());

    send(&mut client, &[0x05, 0x00]).await;

    let err = conn.run().await.unwrap_err();
    assert!(matches!(err, Socks5Error::NoAcceptableAuthMethods));
    assert!(conn.methods().is_empty());
    assert_eq!(read_n(&mut client, 2).await, vec![0x05, 0xFF]);
    assert!(dialer.targets().is_empty());
}

#[tokio::test]
async fn test_invalid_address_type_gets_general_failure() {
    let dialer = Arc::new(MockDialer::new(BoundAddr::new("10.0.0.1", 1)));
    let (mut client, server_side) = create_mock_stream_pair();
    let mut conn = Connection::new(server_side, dialer);

    send(&mut client, &[0x05, 0x01, 0x00]).await;
    send(&mut client, &[0x05, 0x01, 0x00, 0x07]).await;

    let err = conn.run().await.unwrap_err();
    assert!(matches!(err, Socks5Error::UnsupportedAddressType(7)));
    assert!(err.is_decode_error());
    conn.close();

    let mut received = Vec::new();
    client.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, vec![0x05, 0x00, 0x05, 0x01, 0x00, 0x00]);
}

#[tokio::test]
async fn test_connect_domain_name() {
    let dialer = Arc::new(MockDialer::new(BoundAddr::new("10.1.1.1", 3000)));
    let (mut client, server_side) = create_mock_stream_pair();
    let mut conn = Connection::new(server_side, dialer.clone());

    send(&mut client, &greeting(&[0x00])).await;
    send(&mut client, &connect_domain("example.com", 443)).await;

    let relay = conn.run().await.unwrap();
    assert_eq!(dialer.targets(), vec!["example.com:443"]);
    assert_eq!(conn.request().unwrap().destination_host, "example.com");
    relay.abort();
}

#[tokio::test]
async fn test_connect_ipv6_target_is_bracketed() {
    let dialer = Arc::new(MockDialer::new(BoundAddr::new("fe80::1", 4000)));
    let (mut client, server_side) = create_mock_stream_pair();
    let mut conn = Connection::new(server_side, dialer.clone());

    let mut ip = [0u8; 16];
    ip[0] = 0x20;
    ip[1] = 0x01;
    ip[2] = 0x0d;
    ip[3] = 0xb8;
    ip[15] = 0x01;

    send(&mut client, &greeting(&[0x00])).await;
    send(&mut client, &connect_ipv6(ip, 8080)).await;

    let relay = conn.run().await.unwrap();
    assert_eq!(dialer.targets(), vec!["[2001:db8::1]:8080"]);

    read_n(&mut client, 2).await;
    let reply = read_reply(&mut client).await;
    assert_eq!(reply.len(), 22);
    assert_eq!(reply[3], 0x04);
    assert_eq!(&reply[20..], &4000u16.to_be_bytes());
    relay.abort();
}

#[tokio::test]
async fn test_fragmented_handshake() {
    let dialer = Arc::new(MockDialer::new(BoundAddr::new("10.0.0.1", 1)));
    let (mut client, server_side) = create_mock_stream_pair();
    let mut conn = Connection::new(server_side, dialer.clone());

    let handshake = tokio::spawn(async move {
        let result = conn.run().await;
        (conn, result)
    });

    let mut bytes = greeting(&[0x00]);
    bytes.extend(connect_domain("fragmented.test", 80));
    for chunk in bytes.chunks(3) {
        send(&mut client, chunk).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let (conn, result) = handshake.await.unwrap();
    let relay = result.unwrap();
    assert_eq!(conn.phase(), Phase::Relaying);
    assert_eq!(dialer.targets(), vec!["fragmented.test:80"]);
    relay.abort();
}

#[tokio::test]
async fn test_dial_failure_silent_by_default() {
    let dialer = Arc::new(MockDialer::failing(io::ErrorKind::ConnectionRefused));
    let (mut client, server_side) = create_mock_stream_pair();
    let mut conn = Connection::new(server_side, dialer);

    send(&mut client, &greeting(&[0x00])).await;
    send(&mut client, &connect_ipv4([127, 0, 0, 1], 9)).await;

    let err = conn.run().await.unwrap_err();
    match err {
        Socks5Error::Dial { target, source } => {
            assert_eq!(target, "127.0.0.1:9");
            assert_eq!(source.kind(), io::ErrorKind::ConnectionRefused);
        }
        other => panic!("unexpected error: {other}"),
    }
    conn.close();

    let mut received = Vec::new();
    client.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, vec![0x05, 0x00]);
}

#[tokio::test]
async fn test_dial_failure_reply_opt_in() {
    let dialer = Arc::new(MockDialer::failing(io::ErrorKind::TimedOut));
    let (mut client, server_side) = create_mock_stream_pair();
    let options = ConnectionOptions {
        reply_on_dial_failure: true,
    };
    let mut conn = Connection::with_options(server_side, dialer, options);

    send(&mut client, &greeting(&[0x00])).await;
    send(&mut client, &connect_ipv4([127, 0, 0, 1], 9)).await;

    assert!(conn.run().await.is_err());
    conn.close();

    let mut received = Vec::new();
    client.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, vec![0x05, 0x00, 0x05, 0x04, 0x00, 0x00]);
}
