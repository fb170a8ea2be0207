// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Base-128 varints.
//!
//! Little-endian 7-bit groups with the continuation flag in the high bit of
//! each byte. Signed values are written as their 64-bit two's-complement
//! pattern (no zig-zag), so the bit pattern survives signed/unsigned
//! reinterpretation and any negative value takes the full 10 bytes.

use super::errors::{DecodeError, DecodeErrorKind};
use crate::buffer::{Buffer, BufferResult, Storage};

pub const MAX_VARINT_LEN: usize = 10;

/// Encoded length of `value` in bytes.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Encode into a scratch array, returning the used length.
pub fn encode_varint(mut value: u64, out: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut len = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out[len] = byte;
            return len + 1;
        }
        out[len] = byte | 0x80;
        len += 1;
    }
}

pub fn put_varint<S: Storage>(buffer: &mut Buffer<S>, value: u64) -> BufferResult<()> {
    let mut scratch = [0u8; MAX_VARINT_LEN];
    let len = encode_varint(value, &mut scratch);
    buffer.put_bytes(&scratch[..len])
}

pub fn put_varint_i64<S: Storage>(buffer: &mut Buffer<S>, value: i64) -> BufferResult<()> {
    put_varint(buffer, value as u64)
}

/// Feed one byte into a partially decoded varint. Returns `Some(value)` once
/// the final byte has been seen.
#[derive(Debug, Default)]
pub struct VarintAccumulator {
    value: u64,
    count: usize,
}

impl VarintAccumulator {
    pub fn push(&mut self, byte: u8) -> Result<Option<u64>, DecodeError> {
        if self.count == MAX_VARINT_LEN - 1 && byte > 0x01 {
            // Tenth byte may only carry the top bit of the 64-bit value.
            return Err(DecodeErrorKind::InvalidVarint.into());
        }
        self.value |= u64::from(byte & 0x7F) << (7 * self.count);
        self.count += 1;
        if byte & 0x80 == 0 {
            return Ok(Some(self.value));
        }
        Ok(None)
    }
}

pub fn get_varint<S: Storage>(buffer: &mut Buffer<S>) -> Result<u64, DecodeError> {
    let mut accumulator = VarintAccumulator::default();
    loop {
        if let Some(value) = accumulator.push(buffer.get_u8()?)? {
            return Ok(value);
        }
    }
}

pub fn get_varint_i64<S: Storage>(buffer: &mut Buffer<S>) -> Result<i64, DecodeError> {
    Ok(get_varint(buffer)? as i64)
}

/// Varint that must fit a `usize` length or count.
pub fn get_length<S: Storage>(buffer: &mut Buffer<S>) -> Result<usize, DecodeError> {
    let raw = get_varint(buffer)?;
    usize::try_from(raw)
        .map_err(|_| DecodeErrorKind::OutOfRange(format!("length {} does not fit usize", raw)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::FixedBuffer;

    fn encoded(value: u64) -> Vec<u8> {
        let mut scratch = [0u8; MAX_VARINT_LEN];
        let len = encode_varint(value, &mut scratch);
        scratch[..len].to_vec()
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(1), vec![0x01]);
        assert_eq!(encoded(127), vec![0x7F]);
        assert_eq!(encoded(128), vec![0x80, 0x01]);
        assert_eq!(encoded(300), vec![0xAC, 0x02]);
        assert_eq!(
            encoded(u64::MAX),
            vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
        );
    }

    #[test]
    fn test_varint_len_matches_encoding() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            assert_eq!(varint_len(value), encoded(value).len(), "value {}", value);
        }
    }

    #[test]
    fn test_signed_pattern_duality() {
        let mut buffer = FixedBuffer::allocate(16);
        put_varint_i64(&mut buffer, -1).expect("write");
        assert_eq!(buffer.position(), MAX_VARINT_LEN);
        buffer.flip();
        assert_eq!(get_varint(&mut buffer).expect("read"), u64::MAX);
        buffer.set_position(0).expect("rewind");
        assert_eq!(get_varint_i64(&mut buffer).expect("read"), -1);
    }

    #[test]
    fn test_rejects_overlong_varint() {
        let mut bytes = vec![0xFF; 9];
        bytes.push(0x02);
        let mut buffer = FixedBuffer::from_bytes(bytes);
        assert_eq!(
            get_varint(&mut buffer).unwrap_err().kind(),
            &DecodeErrorKind::InvalidVarint
        );

        let mut eleven = FixedBuffer::from_bytes(vec![0x80; 11]);
        assert!(get_varint(&mut eleven).is_err());
    }

    #[test]
    fn test_truncated_varint_underflows() {
        let mut buffer = FixedBuffer::from_bytes(vec![0x80, 0x80]);
        assert!(matches!(
            get_varint(&mut buffer).unwrap_err().kind(),
            DecodeErrorKind::Buffer(_)
        ));
    }
}
