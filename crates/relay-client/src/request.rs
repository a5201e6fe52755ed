// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! One-shot upstream NTP requests using the Tokio runtime.
//!
//! A request is a single version 3 client-mode datagram. The reply is checked
//! per RFC 5905 Section 8 before its four timestamps are reduced to an offset
//! and round-trip delay.

use log::debug;
use std::io;
use std::net::SocketAddr;
use std::ops::Deref;
use std::time::Duration;
use tokio::net::UdpSocket;

use crate::error::QueryError;
use crate::protocol::{
    ConstPackedSizeBytes, LeapIndicator, MAX_REQUEST_BYTES, Mode, Stratum, TimePacket,
    TimestampFormat, Version,
};
use crate::unix_time;

/// The result of an upstream NTP request.
///
/// This struct implements `Deref<Target = TimePacket>`, so packet fields can be read directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NtpResult {
    /// The server's reply.
    pub packet: TimePacket,
    /// Local Unix time when the reply arrived (T4).
    pub destination_secs: f64,
    /// Clock offset `((T2 - T1) + (T3 - T4)) / 2`.
    ///
    /// Positive when the local clock is behind the server.
    pub offset_seconds: f64,
    /// Round-trip delay `(T4 - T1) - (T3 - T2)`.
    pub delay_seconds: f64,
}

impl Deref for NtpResult {
    type Target = TimePacket;
    fn deref(&self) -> &Self::Target {
        &self.packet
    }
}

/// Select the wildcard bind address matching the target's family.
pub(crate) fn bind_addr_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}

/// Compute clock offset and round-trip delay from four Unix-second timestamps.
pub(crate) fn compute_offset_delay(t1: f64, t2: f64, t3: f64, t4: f64) -> (f64, f64) {
    let offset = ((t2 - t1) + (t3 - t4)) / 2.0;
    let delay = (t4 - t1) - (t3 - t2);
    (offset, delay)
}

/// Build a client request stamped with the current time.
///
/// Returns the serialized packet and its transmit timestamp (T1).
pub(crate) fn build_request_packet() -> ([u8; TimePacket::PACKED_SIZE_BYTES], TimestampFormat) {
    let packet = TimePacket {
        version: Version::V3,
        mode: Mode::Client,
        transmit_timestamp: unix_time::unix_to_ntp(unix_time::now_secs()),
        ..TimePacket::default()
    };
    (packet.encode(), packet.transmit_timestamp)
}

/// Validate a reply and compute offset and delay.
///
/// `t4` is the local Unix time at which the reply was received.
pub(crate) fn validate_response(
    recv_buf: &[u8],
    src_addr: SocketAddr,
    target_addr: SocketAddr,
    t1: TimestampFormat,
    t4: f64,
) -> Result<NtpResult, QueryError> {
    if src_addr.ip() != target_addr.ip() {
        return Err(QueryError::UnexpectedSource);
    }

    let packet = TimePacket::decode(recv_buf).map_err(|_| QueryError::ResponseTooShort {
        received: recv_buf.len(),
    })?;

    if packet.mode != Mode::Server {
        return Err(QueryError::UnexpectedMode);
    }

    // Kiss codes only mean something at stratum 0 (RFC 5905 Section 7.4).
    if packet.stratum == Stratum::UNSPECIFIED {
        if let Some(code) = packet.reference_id.kiss_code() {
            return Err(QueryError::KissOfDeath(code));
        }
    }

    if packet.transmit_timestamp.is_zero() {
        return Err(QueryError::ZeroTransmitTimestamp);
    }

    if packet.leap_indicator == LeapIndicator::Unknown && packet.stratum != Stratum::UNSPECIFIED
    {
        return Err(QueryError::UnsynchronizedServer);
    }

    // Anti-replay: the reply must echo our transmit timestamp.
    if packet.origin_timestamp != t1 {
        return Err(QueryError::OriginTimestampMismatch);
    }

    let t1 = unix_time::ntp_to_unix(t1, t4);
    let t2 = unix_time::ntp_to_unix(packet.receive_timestamp, t4);
    let t3 = unix_time::ntp_to_unix(packet.transmit_timestamp, t4);
    let (offset_seconds, delay_seconds) = compute_offset_delay(t1, t2, t3, t4);

    Ok(NtpResult {
        packet,
        destination_secs: t4,
        offset_seconds,
        delay_seconds,
    })
}

/// Send a request to an upstream NTP server with a 10 second timeout.
///
/// `addr` is `host:port`, e.g. `"ntp.aliyun.com:123"`.
pub async fn request(addr: &str) -> io::Result<NtpResult> {
    request_with_timeout(addr, Duration::from_secs(10)).await
}

/// Send a request to an upstream NTP server, bounding DNS, send and receive by `timeout`.
pub async fn request_with_timeout(addr: &str, timeout: Duration) -> io::Result<NtpResult> {
    tokio::time::timeout(timeout, request_inner(addr))
        .await
        .map_err(|_| io::Error::from(QueryError::Timeout))?
}

async fn request_inner(addr: &str) -> io::Result<NtpResult> {
    let target_addr = tokio::net::lookup_host(addr)
        .await?
        .next()
        .ok_or_else(|| QueryError::NoAddresses {
            address: addr.to_owned(),
        })?;

    let (send_buf, t1) = build_request_packet();
    let sock = UdpSocket::bind(bind_addr_for(&target_addr)).await?;

    let sz = sock.send_to(&send_buf, target_addr).await?;
    debug!("{:?}", sock.local_addr());
    debug!("sent: {}", sz);

    let mut recv_buf = [0u8; MAX_REQUEST_BYTES];
    let (recv_len, src_addr) = sock.recv_from(&mut recv_buf[..]).await?;
    let t4 = unix_time::now_secs();
    debug!("recv: {} bytes from {:?}", recv_len, src_addr);

    Ok(validate_response(
        &recv_buf[..recv_len],
        src_addr,
        target_addr,
        t1,
        t4,
    )?)
}
