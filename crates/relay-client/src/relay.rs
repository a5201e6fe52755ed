// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Query helper for a running relay.
//!
//! The relay answers 48-byte requests on a TCP stream. This helper sends a
//! client-mode request stamped with the local Unix time and reduces the reply
//! to an offset and delay the same way an upstream reply is reduced.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::protocol::{ConstPackedSizeBytes, Mode, TimePacket, TimestampFormat, Version};
use crate::request::compute_offset_delay;
use crate::unix_time;

/// A decoded relay reply with the timing derived from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelayReply {
    /// The relay's response.
    pub packet: TimePacket,
    /// `((T2 - T1) + (T3 - T4)) / 2`, in seconds.
    pub offset_seconds: f64,
    /// `(T4 - T1) - (T3 - T2)`, in seconds.
    pub delay_seconds: f64,
}

/// Connect to a relay, send one request and read one reply, all within `timeout`.
pub async fn query<A: ToSocketAddrs>(addr: A, timeout: Duration) -> io::Result<RelayReply> {
    tokio::time::timeout(timeout, async {
        let mut stream = TcpStream::connect(addr).await?;
        exchange(&mut stream).await
    })
    .await
    .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "relay query timed out"))?
}

/// Send one request on an open connection and read its reply.
///
/// Several exchanges may share one connection; the relay answers them in order.
pub async fn exchange(stream: &mut TcpStream) -> io::Result<RelayReply> {
    let t1 = unix_time::now_secs();
    let request = TimePacket {
        version: Version::V3,
        mode: Mode::Client,
        transmit_timestamp: TimestampFormat::from_secs_f64(t1),
        ..TimePacket::default()
    };
    stream.write_all(&request.encode()).await?;

    let mut buf = [0u8; TimePacket::PACKED_SIZE_BYTES];
    stream.read_exact(&mut buf).await?;
    let t4 = unix_time::now_secs();

    let packet = TimePacket::decode(&buf)?;
    let t2 = packet.receive_timestamp.to_secs_f64();
    let t3 = packet.transmit_timestamp.to_secs_f64();
    let (offset_seconds, delay_seconds) = compute_offset_delay(t1, t2, t3, t4);
    Ok(RelayReply {
        packet,
        offset_seconds,
        delay_seconds,
    })
}
