// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary wire codec.
//!
//! A [`Codec`] is built once over a (possibly bound) [`Schema`] and turns
//! [`GroupValue`]s into framed messages and back:
//!
//! ```text
//! message := varint(body length) body
//! body    := varint(group id) field*
//! field   := [presence byte, optional fields only] value
//! ```
//!
//! | Type                 | Wire form                                          |
//! |----------------------|----------------------------------------------------|
//! | integers             | varint of the 64-bit pattern                       |
//! | f32 / f64            | IEEE-754, little-endian                            |
//! | bool                 | one byte, 0 or 1                                   |
//! | string / binary      | varint length + bytes                              |
//! | small decimal        | varint mantissa at the configured scale            |
//! | decimal              | varint mantissa + scale byte                       |
//! | bigint / bigdecimal  | varint length + two's-complement BE (+ scale byte) |
//! | time                 | varint count of unit since epoch                   |
//! | enum                 | varint id                                          |
//! | sequence             | varint count + elements                            |
//! | static reference     | group fields, untagged                             |
//! | dynamic reference    | varint group id + group fields                     |
//!
//! The codec is stateless between calls and can be shared across threads;
//! each call drives the buffer it is given.

mod errors;
mod reader;
pub mod varint;
mod writer;

pub use errors::{
    CodecError, DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind, FieldPath,
    PathSegment,
};

use crate::binder::ValueMapping;
use crate::buffer::{Buffer, FixedBuffer, GrowableBuffer, Storage};
use crate::config::CodecConfig;
use crate::schema::{FieldDef, Schema};
use crate::types::TypeDef;
use crate::value::{GroupValue, Value};
use reader::Decoder;
use std::io::{Read, Write};
use varint::{encode_varint, get_length, get_varint, put_varint, VarintAccumulator, MAX_VARINT_LEN};
use writer::Encoder;

/// Field annotation that makes an enum field reject unknown ids.
pub const CLOSED_ANNOTATION: &str = "closed";

pub(crate) static IDENTITY: ValueMapping = ValueMapping::Identity;

pub(crate) fn is_closed(config: &CodecConfig, field: &FieldDef) -> bool {
    config.strict_enums || field.annotation(CLOSED_ANNOTATION) == Some("true")
}

/// Wire pattern of `value` for integer kind `kind`, if in range.
pub(crate) fn integer_to_wire(kind: &TypeDef, value: i128) -> Option<u64> {
    let (lo, hi) = kind.integer_range()?;
    if value < lo || value > hi {
        return None;
    }
    Some(if lo < 0 {
        value as i64 as u64
    } else {
        value as u64
    })
}

/// Value of wire pattern `raw` read as integer kind `kind`, if in range.
pub(crate) fn integer_from_wire(kind: &TypeDef, raw: u64) -> Option<i128> {
    let (lo, hi) = kind.integer_range()?;
    let value = if lo < 0 {
        i128::from(raw as i64)
    } else {
        i128::from(raw)
    };
    (lo..=hi).contains(&value).then_some(value)
}

/// `value` as the [`Value`] variant of integer kind `kind`, if in range.
pub(crate) fn integer_value(kind: &TypeDef, value: i128) -> Option<Value> {
    let converted = match kind {
        TypeDef::Int8 => Value::I8(i8::try_from(value).ok()?),
        TypeDef::Int16 => Value::I16(i16::try_from(value).ok()?),
        TypeDef::Int32 => Value::I32(i32::try_from(value).ok()?),
        TypeDef::Int64 => Value::I64(i64::try_from(value).ok()?),
        TypeDef::UInt8 => Value::U8(u8::try_from(value).ok()?),
        TypeDef::UInt16 => Value::U16(u16::try_from(value).ok()?),
        TypeDef::UInt32 => Value::U32(u32::try_from(value).ok()?),
        TypeDef::UInt64 => Value::U64(u64::try_from(value).ok()?),
        _ => return None,
    };
    Some(converted)
}

/// Schema-driven message encoder/decoder.
#[derive(Debug, Clone)]
pub struct Codec {
    schema: Schema,
    config: CodecConfig,
}

impl Codec {
    pub fn new(schema: Schema) -> Result<Self, CodecError> {
        Self::with_config(schema, CodecConfig::default())
    }

    /// Every group must carry an id.
    pub fn with_config(schema: Schema, config: CodecConfig) -> Result<Self, CodecError> {
        if let Some(group) = schema.groups().iter().find(|group| group.id.is_none()) {
            return Err(CodecError::MissingGroupId(group.name.clone()));
        }
        if config.max_depth == 0 {
            return Err(CodecError::InvalidConfig("max_depth must be positive".into()));
        }
        log::debug!(
            "[CODEC] codec ready over {} groups (bound: {})",
            schema.groups().len(),
            schema.is_bound()
        );
        Ok(Self { schema, config })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Buffer interface
    // -----------------------------------------------------------------------

    /// Append one framed message to `buffer`.
    ///
    /// On failure the buffer position is restored to where the message
    /// would have started, so no partial message is committed.
    pub fn encode<S: Storage>(
        &self,
        value: &GroupValue,
        buffer: &mut Buffer<S>,
    ) -> Result<(), EncodeError> {
        let start = buffer.position();
        let result = self.encode_message(value, buffer, start);
        if let Err(err) = &result {
            log::debug!("[CODEC] encode of '{}' failed: {}", value.group, err);
            buffer.set_position(start)?;
        }
        result
    }

    fn encode_message<S: Storage>(
        &self,
        value: &GroupValue,
        buffer: &mut Buffer<S>,
        start: usize,
    ) -> Result<(), EncodeError> {
        let group = self
            .schema
            .group(&value.group)
            .ok_or_else(|| EncodeError::new(EncodeErrorKind::UnknownGroup(value.group.clone())))?;
        let id = group
            .id
            .ok_or_else(|| EncodeError::new(EncodeErrorKind::MissingGroupId(group.name.clone())))?;

        // One byte reserved for the length; widened below if needed.
        buffer.put_u8(0)?;
        let body_start = buffer.position();
        put_varint(buffer, u64::from(id))?;
        Encoder::new(&self.schema, &self.config, buffer)
            .encode_group_body(group, value)
            .map_err(|err| err.in_group(&group.name))?;
        let body_end = buffer.position();

        let body_len = body_end - body_start;
        if body_len > self.config.max_message_size {
            return Err(EncodeErrorKind::MessageTooLarge {
                size: body_len,
                max: self.config.max_message_size,
            }
            .into());
        }
        let mut prefix = [0u8; MAX_VARINT_LEN];
        let prefix_len = encode_varint(body_len as u64, &mut prefix);
        if prefix_len > 1 {
            buffer.shift(body_start, body_end, (prefix_len - 1) as isize)?;
        }
        buffer.put_bytes_at(start, &prefix[..prefix_len])?;
        buffer.set_position(body_end + prefix_len - 1)?;
        Ok(())
    }

    /// Read one framed message from `buffer`.
    ///
    /// If the body fails to decode after its length is known, the position
    /// moves to the end of that message so the next one can be read. If the
    /// length prefix itself is unreadable or the message is incomplete, the
    /// position is left where it was.
    pub fn decode<S: Storage>(&self, buffer: &mut Buffer<S>) -> Result<GroupValue, DecodeError> {
        let start = buffer.position();
        let body_len = match get_length(buffer) {
            Ok(len) => len,
            Err(err) => {
                buffer.set_position(start)?;
                return Err(err);
            }
        };
        let body_start = buffer.position();
        let available = buffer.remaining();
        if body_len > available {
            buffer.set_position(start)?;
            return Err(DecodeErrorKind::Truncated {
                declared: body_len,
                available,
            }
            .into());
        }
        let body_end = body_start + body_len;
        let result = if body_len > self.config.max_message_size {
            Err(DecodeErrorKind::MessageTooLarge {
                size: body_len,
                max: self.config.max_message_size,
            }
            .into())
        } else {
            let limit = buffer.limit();
            buffer.set_limit(body_end)?;
            let decoded = self.decode_body(buffer);
            buffer.set_limit(limit)?;
            decoded
        };
        buffer.set_position(body_end)?;
        if let Err(err) = &result {
            log::debug!("[CODEC] decode failed, skipped {} byte message: {}", body_len, err);
        }
        result
    }

    /// Group id and fields of one message, up to the buffer limit.
    fn decode_body<S: Storage>(&self, buffer: &mut Buffer<S>) -> Result<GroupValue, DecodeError> {
        let id = get_varint(buffer)?;
        let group = u32::try_from(id)
            .ok()
            .and_then(|id| self.schema.group_by_id(id))
            .ok_or_else(|| DecodeError::new(DecodeErrorKind::UnknownGroupId(id)))?;
        Decoder::new(&self.schema, &self.config, buffer)
            .decode_group_body(group)
            .map_err(|err| err.in_group(&group.name))
    }

    // -----------------------------------------------------------------------
    // Convenience
    // -----------------------------------------------------------------------

    pub fn encode_to_vec(&self, value: &GroupValue) -> Result<Vec<u8>, EncodeError> {
        let mut buffer = GrowableBuffer::bounded(256, self.max_frame_size());
        self.encode(value, &mut buffer)?;
        Ok(buffer.into_vec())
    }

    /// Decode a single message occupying `bytes`.
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<GroupValue, DecodeError> {
        let mut buffer = FixedBuffer::from_bytes(bytes.to_vec());
        self.decode(&mut buffer)
    }

    fn max_frame_size(&self) -> usize {
        self.config.max_message_size.saturating_add(MAX_VARINT_LEN)
    }

    // -----------------------------------------------------------------------
    // Byte streams
    // -----------------------------------------------------------------------

    /// Encode one framed message and write it to `writer`.
    pub fn write_to<W: Write>(&self, value: &GroupValue, mut writer: W) -> Result<(), EncodeError> {
        let bytes = self.encode_to_vec(value)?;
        writer
            .write_all(&bytes)
            .map_err(|e| EncodeError::new(EncodeErrorKind::Io(e.to_string())))
    }

    /// Read exactly one framed message from `reader`.
    pub fn read_from<R: Read>(&self, mut reader: R) -> Result<GroupValue, DecodeError> {
        let io_error = |e: std::io::Error| DecodeError::new(DecodeErrorKind::Io(e.to_string()));
        let mut accumulator = VarintAccumulator::default();
        let mut byte = [0u8; 1];
        let body_len = loop {
            reader.read_exact(&mut byte).map_err(io_error)?;
            if let Some(len) = accumulator.push(byte[0])? {
                break len;
            }
        };
        let body_len = usize::try_from(body_len)
            .ok()
            .filter(|len| *len <= self.config.max_message_size)
            .ok_or_else(|| {
                DecodeError::new(DecodeErrorKind::MessageTooLarge {
                    size: usize::try_from(body_len).unwrap_or(usize::MAX),
                    max: self.config.max_message_size,
                })
            })?;
        let mut body = vec![0u8; body_len];
        reader.read_exact(&mut body).map_err(io_error)?;
        let mut buffer = FixedBuffer::from_bytes(body);
        self.decode_body(&mut buffer)
    }
}
