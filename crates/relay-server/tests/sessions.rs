// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Relay sessions over real TCP connections.

mod common;

use std::time::Duration;

use common::{eventually, spawn_test_server, test_builder};
use relay_client::relay;
use relay_server::protocol::{Mode, ReferenceId, Stratum, TimePacket, Version};
use relay_server::unix_time;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_clients_each_get_a_reply() {
    let (server, addr) = spawn_test_server(test_builder(0.0)).await;

    let mut queries = tokio::task::JoinSet::new();
    for _ in 0..8 {
        queries.spawn(relay::query(addr, TIMEOUT));
    }
    while let Some(joined) = queries.join_next().await {
        let reply = joined.unwrap().unwrap();
        assert_eq!(reply.packet.mode, Mode::Server);
        assert_eq!(reply.packet.version, Version::V3);
        assert_eq!(reply.packet.stratum, Stratum::UNSPECIFIED);
        assert_eq!(reply.packet.reference_id, ReferenceId::NTP1);
    }

    let stats = server.stats().clone();
    assert!(eventually(|| stats.snapshot().active_connections == 0).await);
    let snap = stats.snapshot();
    assert_eq!(snap.total_connections, 8);
    assert!(snap.last_client_time.is_some());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn reply_carries_corrected_time() {
    let (server, addr) = spawn_test_server(test_builder(1.5)).await;
    assert!(server.trigger_sync().await);

    let reply = relay::query(addr, TIMEOUT).await.unwrap();
    assert!(
        (reply.offset_seconds - 1.5).abs() < 0.1,
        "offset {}",
        reply.offset_seconds
    );

    let now = unix_time::now_secs();
    let transmit = reply.packet.transmit_timestamp.to_secs_f64();
    assert!((transmit - now - 1.5).abs() < 0.1);
    assert_eq!(reply.packet.origin_timestamp, reply.packet.reference_timestamp);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn malformed_request_keeps_connection_open() {
    let (server, addr) = spawn_test_server(test_builder(0.0)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(&[0x42; 10]).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let reply = relay::exchange(&mut stream).await.unwrap();
    assert_eq!(reply.packet.mode, Mode::Server);

    // Nothing was sent for the short read.
    stream.shutdown().await.unwrap();
    let mut rest = Vec::new();
    tokio::time::timeout(TIMEOUT, stream.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert!(rest.is_empty());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn several_requests_share_one_connection() {
    let (server, addr) = spawn_test_server(test_builder(0.0)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut last = 0.0;
    for _ in 0..3 {
        let reply = relay::exchange(&mut stream).await.unwrap();
        let transmit = reply.packet.transmit_timestamp.to_secs_f64();
        assert!(transmit >= last);
        last = transmit;
    }
    assert_eq!(server.status().client_stats.total_connections, 1);

    drop(stream);
    let stats = server.stats().clone();
    assert!(eventually(|| stats.snapshot().active_connections == 0).await);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn request_mode_is_not_checked() {
    let (server, addr) = spawn_test_server(test_builder(0.0)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let request = TimePacket {
        mode: Mode::Broadcast,
        ..TimePacket::default()
    };
    stream.write_all(&request.encode()).await.unwrap();
    let mut buf = [0u8; 48];
    tokio::time::timeout(TIMEOUT, stream.read_exact(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(buf[0], 0x1C);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn open_sessions_end_after_stop() {
    let (server, addr) = spawn_test_server(test_builder(0.0)).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    relay::exchange(&mut stream).await.unwrap();

    server.stop().await.unwrap();

    // The session notices within one read timeout and closes its side.
    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(TIMEOUT, stream.read(&mut buf))
        .await
        .unwrap();
    assert!(matches!(read, Ok(0) | Err(_)));
    let stats = server.stats().clone();
    assert!(eventually(|| stats.snapshot().active_connections == 0).await);
}

#[tokio::test]
async fn client_that_never_reads_is_released() {
    let (server, addr) = spawn_test_server(test_builder(0.0)).await;
    let socket = TcpSocket::new_v4().unwrap();
    socket.set_recv_buffer_size(4096).unwrap();
    let mut stream = socket.connect(addr).await.unwrap();

    // Keep asking without reading until the relay gives up on the connection
    // and our writes stall or fail.
    let request = TimePacket::default().encode();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(200), stream.write_all(&request)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) | Err(_) => break,
        }
    }

    // The stream is still held open on this side.
    let stats = server.stats().clone();
    assert!(eventually(|| stats.snapshot().active_connections == 0).await);
    assert_eq!(stats.snapshot().total_connections, 1);

    tokio::time::timeout(TIMEOUT, server.stop())
        .await
        .unwrap()
        .unwrap();
    drop(stream);
}
