//! # Fixed-Point Codec
//!
//! The service port encodes most quantities as a signed 16-bit word in
//! hundredths, LSB first, and lifetime counters as unsigned 32-bit
//! little-endian integers. This module offers both plain byte-level
//! functions and nom parsers built on them for the frame layouts.

use nom::combinator::map;
use nom::number::complete::{le_u16, u8 as byte};
use nom::sequence::tuple;
use nom::IResult;

/// Decodes a signed fixed-point value with 0.01 resolution.
///
/// An MSB above 127 is the two's-complement negative form, so
/// `(0xFF, 0xFF)` is -0.01 and `(0x00, 0xFF)` is -2.56.
pub fn decode_signed_100(lsb: u8, msb: u8) -> f64 {
    f64::from(decode_signed_raw(lsb, msb)) / 100.0
}

/// The raw signed word behind [`decode_signed_100`], i.e. the value
/// scaled by 100.
pub fn decode_signed_raw(lsb: u8, msb: u8) -> i16 {
    i16::from_le_bytes([lsb, msb])
}

/// Decodes an unsigned 32-bit little-endian integer.
pub fn decode_u32_le(b0: u8, b1: u8, b2: u8, b3: u8) -> u32 {
    u32::from_le_bytes([b0, b1, b2, b3])
}

/// nom parser for one signed fixed-point word.
pub fn signed_100(input: &[u8]) -> IResult<&[u8], f64> {
    map(tuple((byte, byte)), |(lsb, msb)| decode_signed_100(lsb, msb))(input)
}

/// nom parser for one raw signed word (value × 100).
pub fn signed_raw(input: &[u8]) -> IResult<&[u8], i16> {
    map(tuple((byte, byte)), |(lsb, msb)| decode_signed_raw(lsb, msb))(input)
}

/// nom parser for an unsigned 16-bit counter.
pub fn counter_u16(input: &[u8]) -> IResult<&[u8], u16> {
    le_u16(input)
}

/// nom parser for an unsigned 32-bit counter.
pub fn counter_u32(input: &[u8]) -> IResult<&[u8], u32> {
    map(tuple((byte, byte, byte, byte)), |(b0, b1, b2, b3)| {
        decode_u32_le(b0, b1, b2, b3)
    })(input)
}
