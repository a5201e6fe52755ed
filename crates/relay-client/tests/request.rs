// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Upstream requests against a local UDP responder.

use relay_client::error::QueryError;
use relay_client::protocol::{KissOfDeath, Mode, ReferenceId, Stratum, TimePacket};
use relay_client::source::{NtpSource, TimeSource};
use relay_client::unix_time;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Answer one request with a reply built by `reply`, which receives the request.
async fn spawn_responder<F>(reply: F) -> SocketAddr
where
    F: FnOnce(TimePacket) -> Option<TimePacket> + Send + 'static,
{
    let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = sock.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        let (len, peer) = sock.recv_from(&mut buf).await.unwrap();
        let request = TimePacket::decode(&buf[..len]).unwrap();
        if let Some(response) = reply(request) {
            sock.send_to(&response.encode(), peer).await.unwrap();
        }
    });
    addr
}

fn server_reply(request: TimePacket, skew: f64) -> TimePacket {
    let now = unix_time::now_secs() + skew;
    TimePacket {
        mode: Mode::Server,
        stratum: Stratum(2),
        reference_id: ReferenceId([127, 0, 0, 1]),
        origin_timestamp: request.transmit_timestamp,
        receive_timestamp: unix_time::unix_to_ntp(now),
        transmit_timestamp: unix_time::unix_to_ntp(now),
        ..TimePacket::default()
    }
}

#[tokio::test]
async fn ntp_source_reports_server_offset() {
    let addr = spawn_responder(|req| {
        assert_eq!(req.mode, Mode::Client);
        assert_eq!(req.version.value(), 3);
        Some(server_reply(req, 2.0))
    })
    .await;

    let source = NtpSource::new(addr.to_string());
    let offset = source.query_offset(Duration::from_secs(2)).await.unwrap();
    assert!((offset - 2.0).abs() < 0.1, "offset {offset}");
}

#[tokio::test]
async fn request_returns_packet_and_delay() {
    let addr = spawn_responder(|req| Some(server_reply(req, -3.0))).await;
    let result = relay_client::request::request_with_timeout(&addr.to_string(), Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(result.mode, Mode::Server);
    assert!((result.offset_seconds + 3.0).abs() < 0.1);
    assert!(result.delay_seconds >= -0.01 && result.delay_seconds < 1.0);
}

#[tokio::test]
async fn kiss_of_death_is_refused() {
    let addr = spawn_responder(|req| {
        Some(TimePacket {
            stratum: Stratum::UNSPECIFIED,
            reference_id: ReferenceId(*b"RATE"),
            ..server_reply(req, 0.0)
        })
    })
    .await;

    let err = NtpSource::new(addr.to_string())
        .query_offset(Duration::from_secs(2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    let inner = err.get_ref().and_then(|e| e.downcast_ref::<QueryError>());
    assert_eq!(inner, Some(&QueryError::KissOfDeath(KissOfDeath::Rate)));
}

#[tokio::test]
async fn replayed_origin_is_refused() {
    let addr = spawn_responder(|req| {
        let mut reply = server_reply(req, 0.0);
        reply.origin_timestamp = unix_time::unix_to_ntp(1.0);
        Some(reply)
    })
    .await;

    let err = NtpSource::new(addr.to_string())
        .query_offset(Duration::from_secs(2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[tokio::test]
async fn silent_server_times_out() {
    let addr = spawn_responder(|_| None).await;
    let err = NtpSource::new(addr.to_string())
        .query_offset(Duration::from_millis(200))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);
}
