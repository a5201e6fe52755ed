// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Per-connection request handling.
//!
//! A session reads whatever the client sends, at most
//! [`MAX_REQUEST_BYTES`](crate::protocol::MAX_REQUEST_BYTES) at a time, and
//! treats each read as one request. Reads shorter than a packet are logged and
//! skipped without closing the connection. Reads are bounded by a timeout so
//! the session notices shutdown even while the client is idle. Writes share
//! that bound: a client that stops reading its replies loses the session
//! instead of pinning it.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::OffsetState;
use crate::protocol::{MAX_REQUEST_BYTES, TimePacket};
use crate::response::ResponseTemplate;

/// Why a session ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionEnd {
    /// The client closed its side of the connection.
    PeerClosed,
    /// The server stopped.
    Shutdown,
    /// A read or write failed, or a reply could not be written in time.
    Io(io::ErrorKind),
}

/// Everything a session needs besides its stream.
#[derive(Clone, Debug)]
pub struct SessionContext {
    /// The correction applied to every timestamp.
    pub offset: Arc<OffsetState>,
    /// Fixed response header fields.
    pub template: ResponseTemplate,
    /// Longest wait for client data before re-checking `running`, and the
    /// longest a reply may take to write.
    pub read_timeout: Duration,
}

/// Serve requests on `stream` until the client leaves, an I/O error occurs, or
/// `running` is cleared.
///
/// A reply that cannot be written within `read_timeout` ends the session with
/// `SessionEnd::Io(TimedOut)`; a partly written reply cannot be resumed.
pub async fn serve<S>(
    mut stream: S,
    peer: SocketAddr,
    ctx: &SessionContext,
    running: &AtomicBool,
) -> SessionEnd
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; MAX_REQUEST_BYTES];
    let mut answered = 0u64;

    let end = loop {
        if !running.load(Ordering::Acquire) {
            break SessionEnd::Shutdown;
        }

        let len = match tokio::time::timeout(ctx.read_timeout, stream.read(&mut buf)).await {
            Err(_) => continue,
            Ok(Ok(0)) => break SessionEnd::PeerClosed,
            Ok(Ok(len)) => len,
            Ok(Err(e)) => {
                debug!(%peer, error = %e, "session read failed");
                break SessionEnd::Io(e.kind());
            }
        };

        let request = match TimePacket::decode(&buf[..len]) {
            Ok(request) => request,
            Err(e) => {
                warn!(%peer, error = %e, "ignoring malformed request");
                continue;
            }
        };

        let response = ctx.template.respond(&ctx.offset);
        let bytes = response.encode();
        match tokio::time::timeout(ctx.read_timeout, stream.write_all(&bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(%peer, error = %e, "session write failed");
                break SessionEnd::Io(e.kind());
            }
            Err(_) => {
                warn!(%peer, timeout = ?ctx.read_timeout, "client is not reading replies");
                break SessionEnd::Io(io::ErrorKind::TimedOut);
            }
        }
        answered += 1;
        trace!(
            %peer,
            version = request.version.value(),
            mode = ?request.mode,
            "answered request"
        );
    };

    debug!(%peer, answered, reason = ?end, "session closed");
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Mode, TimestampFormat, Version};
    use tokio::io::DuplexStream;

    fn ctx() -> SessionContext {
        SessionContext {
            offset: Arc::new(OffsetState::new()),
            template: ResponseTemplate::default(),
            read_timeout: Duration::from_millis(50),
        }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn request() -> [u8; 48] {
        TimePacket {
            version: Version::V3,
            mode: Mode::Client,
            transmit_timestamp: TimestampFormat::from_secs_f64(1.0),
            ..TimePacket::default()
        }
        .encode()
    }

    async fn read_reply(client: &mut DuplexStream) -> TimePacket {
        let mut buf = [0u8; 48];
        client.read_exact(&mut buf).await.unwrap();
        TimePacket::decode(&buf).unwrap()
    }

    #[tokio::test]
    async fn answers_until_peer_closes() {
        let (mut client, server) = tokio::io::duplex(4096);
        let running = Arc::new(AtomicBool::new(true));
        let task = {
            let running = running.clone();
            tokio::spawn(async move { serve(server, peer(), &ctx(), &running).await })
        };

        for _ in 0..3 {
            client.write_all(&request()).await.unwrap();
            let reply = read_reply(&mut client).await;
            assert_eq!(reply.mode, Mode::Server);
            assert_eq!(reply.version, Version::V3);
            assert_ne!(reply.origin_timestamp, TimestampFormat::from_secs_f64(1.0));
        }

        drop(client);
        assert_eq!(task.await.unwrap(), SessionEnd::PeerClosed);
    }

    #[tokio::test]
    async fn short_read_is_skipped() {
        let (mut client, server) = tokio::io::duplex(4096);
        let running = Arc::new(AtomicBool::new(true));
        let task = {
            let running = running.clone();
            tokio::spawn(async move { serve(server, peer(), &ctx(), &running).await })
        };

        client.write_all(&[0xAB; 10]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        client.write_all(&request()).await.unwrap();
        let reply = read_reply(&mut client).await;
        assert_eq!(reply.mode, Mode::Server);

        drop(client);
        assert_eq!(task.await.unwrap(), SessionEnd::PeerClosed);
    }

    #[tokio::test]
    async fn idle_session_sees_shutdown() {
        let (_client, server) = tokio::io::duplex(4096);
        let running = Arc::new(AtomicBool::new(true));
        let task = {
            let running = running.clone();
            tokio::spawn(async move { serve(server, peer(), &ctx(), &running).await })
        };

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!task.is_finished());
        running.store(false, Ordering::Release);
        let end = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(end, SessionEnd::Shutdown);
    }

    #[tokio::test]
    async fn oversized_read_answers_once() {
        let (mut client, server) = tokio::io::duplex(4096);
        let running = Arc::new(AtomicBool::new(true));
        let task = {
            let running = running.clone();
            tokio::spawn(async move { serve(server, peer(), &ctx(), &running).await })
        };

        let mut big = vec![0u8; 200];
        big[..48].copy_from_slice(&request());
        client.write_all(&big).await.unwrap();
        let reply = read_reply(&mut client).await;
        assert_eq!(reply.mode, Mode::Server);

        client.shutdown().await.unwrap();
        assert_eq!(task.await.unwrap(), SessionEnd::PeerClosed);
        // Exactly one reply was written.
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn unread_replies_end_session() {
        // Room for one reply only.
        let (mut client, server) = tokio::io::duplex(64);
        let running = Arc::new(AtomicBool::new(true));
        let task = {
            let running = running.clone();
            tokio::spawn(async move { serve(server, peer(), &ctx(), &running).await })
        };

        client.write_all(&request()).await.unwrap();
        client.write_all(&request()).await.unwrap();
        let end = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(end, SessionEnd::Io(io::ErrorKind::TimedOut));
        assert!(running.load(Ordering::Acquire));
    }
}
