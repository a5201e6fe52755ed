// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

// 2^32, the scale of the 32.32 fraction.
const TIMESTAMP_SCALE: f64 = 4_294_967_296.0;

// 2^16, the scale of the 16.16 fraction.
const SHORT_SCALE: f64 = 65_536.0;

/// **Short Format** - unsigned 16.16 fixed-point seconds, used by the root delay and root
/// dispersion header fields.
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Seconds              |           Fraction            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShortFormat {
    /// Whole seconds.
    pub seconds: u16,
    /// Fractional seconds in units of 2^-16.
    pub fraction: u16,
}

impl ShortFormat {
    /// Encode seconds as `round(secs * 2^16)`, truncated to 32 bits.
    pub fn from_secs_f64(secs: f64) -> Self {
        let raw = (secs * SHORT_SCALE).round() as i64 as u32;
        ShortFormat::from_u32(raw)
    }

    /// Decode to seconds.
    pub fn to_secs_f64(self) -> f64 {
        self.to_u32() as f64 / SHORT_SCALE
    }

    /// Build from the raw 32-bit wire value.
    pub fn from_u32(raw: u32) -> Self {
        ShortFormat {
            seconds: (raw >> 16) as u16,
            fraction: raw as u16,
        }
    }

    /// The raw 32-bit wire value.
    pub fn to_u32(self) -> u32 {
        ((self.seconds as u32) << 16) | self.fraction as u32
    }
}

/// **Timestamp Format** - unsigned 32.32 fixed-point seconds.
///
/// Relay packets count from the Unix epoch; upstream NTP packets count from 1900. The type itself
/// is epoch-agnostic; see [`crate::unix_time`] for conversions.
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Seconds                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Fraction                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimestampFormat {
    /// Whole seconds since the epoch.
    pub seconds: u32,
    /// Fractional seconds in units of 2^-32 (about 232 picoseconds).
    pub fraction: u32,
}

impl TimestampFormat {
    /// Encode seconds as `round(secs * 2^32)`, truncated to 64 unsigned bits.
    ///
    /// Negative and out-of-range inputs wrap rather than fail, so encoding never errors.
    pub fn from_secs_f64(secs: f64) -> Self {
        let raw = (secs * TIMESTAMP_SCALE).round() as i128 as u64;
        TimestampFormat::from_u64(raw)
    }

    /// Decode to seconds: `raw / 2^32`.
    pub fn to_secs_f64(self) -> f64 {
        self.to_u64() as f64 / TIMESTAMP_SCALE
    }

    /// Build from the raw 64-bit wire value.
    pub fn from_u64(raw: u64) -> Self {
        TimestampFormat {
            seconds: (raw >> 32) as u32,
            fraction: raw as u32,
        }
    }

    /// The raw 64-bit wire value.
    pub fn to_u64(self) -> u64 {
        ((self.seconds as u64) << 32) | self.fraction as u64
    }

    /// True when both halves are zero, which NTP uses for "not set".
    pub fn is_zero(self) -> bool {
        self.seconds == 0 && self.fraction == 0
    }
}

/// A 2-bit leap second warning. Every 2-bit value has a meaning, so decoding never fails.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum LeapIndicator {
    /// No leap required.
    #[default]
    NoWarning = 0,
    /// Last minute of the day has 61 seconds.
    AddOne = 1,
    /// Last minute of the day has 59 seconds.
    SubOne = 2,
    /// Clock unsynchronized.
    Unknown = 3,
}

impl LeapIndicator {
    /// Decode the low two bits of `bits`.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => LeapIndicator::NoWarning,
            1 => LeapIndicator::AddOne,
            2 => LeapIndicator::SubOne,
            _ => LeapIndicator::Unknown,
        }
    }
}

/// A 3-bit protocol version number.
///
/// Only the low three bits reach the wire.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Version(pub(super) u8);

impl Version {
    /// Version 3, used by the relay and its upstream queries.
    pub const V3: Version = Version(3);
    /// Version 4.
    pub const V4: Version = Version(4);

    /// Build a version from the low three bits of `bits`.
    pub fn from_bits(bits: u8) -> Self {
        Version(bits & 0b111)
    }

    /// The numeric version.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::V3
    }
}

/// A 3-bit association mode. Every 3-bit value maps to a variant.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Reserved (0).
    Reserved = 0,
    /// Symmetric active (1).
    SymmetricActive = 1,
    /// Symmetric passive (2).
    SymmetricPassive = 2,
    /// Client (3). Requests sent to the relay and to upstreams use this mode.
    #[default]
    Client = 3,
    /// Server (4). Every relay response uses this mode.
    Server = 4,
    /// Broadcast (5).
    Broadcast = 5,
    /// Control message (6).
    NtpControlMessage = 6,
    /// Reserved for private use (7).
    ReservedForPrivateUse = 7,
}

impl Mode {
    /// Decode the low three bits of `bits`.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Mode::Reserved,
            1 => Mode::SymmetricActive,
            2 => Mode::SymmetricPassive,
            3 => Mode::Client,
            4 => Mode::Server,
            5 => Mode::Broadcast,
            6 => Mode::NtpControlMessage,
            _ => Mode::ReservedForPrivateUse,
        }
    }
}

/// An 8-bit stratum.
///
/// ```ignore
/// +--------+-----------------------------------------------------+
/// | Value  | Meaning                                             |
/// +--------+-----------------------------------------------------+
/// | 0      | unspecified or invalid                              |
/// | 1      | primary server (e.g., equipped with a GPS receiver) |
/// | 2-15   | secondary server (via NTP)                          |
/// | 16     | unsynchronized                                      |
/// | 17-255 | reserved                                            |
/// +--------+-----------------------------------------------------+
/// ```
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Stratum(pub u8);

impl Stratum {
    /// Unspecified or invalid (0). Upstreams use it to carry kiss codes.
    pub const UNSPECIFIED: Stratum = Stratum(0);
    /// Unsynchronized (16).
    pub const UNSYNCHRONIZED: Stratum = Stratum(16);
}

/// The four-byte reference identifier, kept opaque.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ReferenceId(pub [u8; 4]);

impl ReferenceId {
    /// The identifier the relay stamps on its responses.
    pub const NTP1: ReferenceId = ReferenceId(*b"NTP1");

    /// Interpret this identifier as a kiss code, if it is one.
    pub fn kiss_code(self) -> Option<KissOfDeath> {
        KissOfDeath::try_from(self.0).ok()
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == 0) {
            for b in self.0.iter().take_while(|b| **b != 0) {
                write!(f, "{}", *b as char)?;
            }
            Ok(())
        } else {
            write!(f, "0x{:08X}", u32::from_be_bytes(self.0))
        }
    }
}

/// **Kiss-o'-Death** codes an upstream may send in the reference identifier of a stratum 0
/// reply.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KissOfDeath {
    /// Access denied; stop querying this server.
    Deny,
    /// Access restricted; stop querying this server.
    Rstr,
    /// Rate exceeded; reduce the polling interval.
    Rate,
}

impl TryFrom<[u8; 4]> for KissOfDeath {
    type Error = ();

    fn try_from(value: [u8; 4]) -> Result<Self, Self::Error> {
        match &value {
            b"DENY" => Ok(KissOfDeath::Deny),
            b"RSTR" => Ok(KissOfDeath::Rstr),
            b"RATE" => Ok(KissOfDeath::Rate),
            _ => Err(()),
        }
    }
}

/// **Time Packet** - the fixed 48-byte record exchanged with the relay and with upstreams.
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |LI | VN  |Mode |    Stratum     |     Poll      |  Precision   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Root Delay                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Root Dispersion                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          Reference ID                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// +                     Reference Timestamp (64)                  +
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// +                      Origin Timestamp (64)                    +
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// +                      Receive Timestamp (64)                   +
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// +                      Transmit Timestamp (64)                  +
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TimePacket {
    /// Leap second warning.
    pub leap_indicator: LeapIndicator,
    /// Protocol version.
    pub version: Version,
    /// Association mode.
    pub mode: Mode,
    /// Stratum.
    pub stratum: Stratum,
    /// Poll interval exponent (log2 seconds).
    pub poll: i8,
    /// Clock precision exponent (log2 seconds).
    pub precision: i8,
    /// Total round-trip delay to the reference clock.
    pub root_delay: ShortFormat,
    /// Total dispersion to the reference clock.
    pub root_dispersion: ShortFormat,
    /// Reference identifier.
    pub reference_id: ReferenceId,
    /// Time the system clock was last set or corrected.
    pub reference_timestamp: TimestampFormat,
    /// Time the request departed the client.
    pub origin_timestamp: TimestampFormat,
    /// Time the request arrived at the server.
    pub receive_timestamp: TimestampFormat,
    /// Time the reply departed the server.
    pub transmit_timestamp: TimestampFormat,
}

/// Types that have a constant size on the wire.
pub trait ConstPackedSizeBytes {
    /// The size in bytes when packed for network transmission.
    const PACKED_SIZE_BYTES: usize;
}

impl ConstPackedSizeBytes for ShortFormat {
    const PACKED_SIZE_BYTES: usize = 4;
}

impl ConstPackedSizeBytes for TimestampFormat {
    const PACKED_SIZE_BYTES: usize = 8;
}

impl ConstPackedSizeBytes for ReferenceId {
    const PACKED_SIZE_BYTES: usize = 4;
}

impl ConstPackedSizeBytes for TimePacket {
    const PACKED_SIZE_BYTES: usize = 48;
}
