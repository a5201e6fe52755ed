// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use byteorder::{BE, ByteOrder};

use super::{
    ConstPackedSizeBytes, LeapIndicator, Mode, ReferenceId, ShortFormat, Stratum, TimePacket,
    TimestampFormat, Version,
};
use crate::error::ParseError;

impl TimePacket {
    /// Serialize to the 48-byte wire form. Deterministic and infallible.
    pub fn encode(&self) -> [u8; TimePacket::PACKED_SIZE_BYTES] {
        let mut buf = [0u8; TimePacket::PACKED_SIZE_BYTES];
        buf[0] = ((self.leap_indicator as u8) << 6)
            | ((self.version.0 & 0b111) << 3)
            | self.mode as u8;
        buf[1] = self.stratum.0;
        buf[2] = self.poll as u8;
        buf[3] = self.precision as u8;
        BE::write_u32(&mut buf[4..8], self.root_delay.to_u32());
        BE::write_u32(&mut buf[8..12], self.root_dispersion.to_u32());
        buf[12..16].copy_from_slice(&self.reference_id.0);
        BE::write_u64(&mut buf[16..24], self.reference_timestamp.to_u64());
        BE::write_u64(&mut buf[24..32], self.origin_timestamp.to_u64());
        BE::write_u64(&mut buf[32..40], self.receive_timestamp.to_u64());
        BE::write_u64(&mut buf[40..48], self.transmit_timestamp.to_u64());
        buf
    }

    /// Parse the first 48 bytes of `buf`. Trailing bytes are ignored.
    ///
    /// Fails with [`ParseError::NotAPacket`] only when `buf` is shorter than 48 bytes.
    pub fn decode(buf: &[u8]) -> Result<TimePacket, ParseError> {
        if buf.len() < TimePacket::PACKED_SIZE_BYTES {
            return Err(ParseError::NotAPacket {
                received: buf.len(),
            });
        }
        let flags = buf[0];
        let mut reference_id = [0u8; 4];
        reference_id.copy_from_slice(&buf[12..16]);
        Ok(TimePacket {
            leap_indicator: LeapIndicator::from_bits(flags >> 6),
            version: Version::from_bits(flags >> 3),
            mode: Mode::from_bits(flags),
            stratum: Stratum(buf[1]),
            poll: buf[2] as i8,
            precision: buf[3] as i8,
            root_delay: ShortFormat::from_u32(BE::read_u32(&buf[4..8])),
            root_dispersion: ShortFormat::from_u32(BE::read_u32(&buf[8..12])),
            reference_id: ReferenceId(reference_id),
            reference_timestamp: TimestampFormat::from_u64(BE::read_u64(&buf[16..24])),
            origin_timestamp: TimestampFormat::from_u64(BE::read_u64(&buf[24..32])),
            receive_timestamp: TimestampFormat::from_u64(BE::read_u64(&buf[32..40])),
            transmit_timestamp: TimestampFormat::from_u64(BE::read_u64(&buf[40..48])),
        })
    }
}
