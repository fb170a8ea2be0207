// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value decoder.

use super::errors::{DecodeError, DecodeErrorKind};
use super::varint::{get_length, get_varint, get_varint_i64};
use super::{integer_from_wire, integer_value, is_closed, IDENTITY};
use crate::binder::{ReadAction, ValueMapping};
use crate::buffer::{Buffer, Storage};
use crate::config::CodecConfig;
use crate::schema::{FieldDef, GroupDef, Schema};
use crate::types::{EnumType, TypeDef};
use crate::value::{BigDecimal, BigInt, Decimal, EnumValue, GroupValue, UnknownField, Value};

pub(crate) struct Decoder<'a, 'b, S: Storage> {
    schema: &'a Schema,
    config: &'a CodecConfig,
    buffer: &'b mut Buffer<S>,
    depth: usize,
    /// Elements of zero-width sequences still allowed in this message.
    zero_width_budget: usize,
}

fn out_of_range(detail: String) -> DecodeError {
    DecodeErrorKind::OutOfRange(detail).into()
}

impl<'a, 'b, S: Storage> Decoder<'a, 'b, S> {
    pub(crate) fn new(
        schema: &'a Schema,
        config: &'a CodecConfig,
        buffer: &'b mut Buffer<S>,
    ) -> Self {
        Self {
            schema,
            config,
            buffer,
            depth: 0,
            zero_width_budget: config.max_sequence_length,
        }
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(DecodeErrorKind::DepthExceeded(self.config.max_depth).into());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    pub(crate) fn decode_group_body(&mut self, group: &GroupDef) -> Result<GroupValue, DecodeError> {
        self.enter()?;
        let schema = self.schema;
        let mut value = GroupValue::new(group.name.clone());
        let fields = schema.all_fields(&group.name).unwrap_or(&[]);
        for field in fields {
            self.decode_field(field, &mut value)
                .map_err(|err| err.in_field(&field.name))?;
        }
        self.leave();
        Ok(value)
    }

    fn decode_field(&mut self, field: &FieldDef, out: &mut GroupValue) -> Result<(), DecodeError> {
        if !field.required {
            match self.buffer.get_u8()? {
                0 => return Ok(()),
                1 => {}
                other => return Err(DecodeErrorKind::InvalidPresence(other).into()),
            }
        }
        let action = field.mapping.as_ref().map(|mapping| &mapping.read);
        match action {
            None => {
                let value = self.decode_value(&field.type_def, &IDENTITY, is_closed(self.config, field))?;
                out.fields.insert(field.name.clone(), value);
            }
            Some(ReadAction::Bind(mapping)) => {
                let value = self.decode_value(&field.type_def, mapping, is_closed(self.config, field))?;
                out.fields.insert(field.name.clone(), value);
            }
            Some(ReadAction::Retain) => {
                let start = self.buffer.position();
                self.decode_value(&field.type_def, &IDENTITY, false)?;
                let bytes = self.buffer.as_slice()[start..self.buffer.position()].to_vec();
                log::trace!(
                    "[CODEC] retained {} bytes of unknown field '{}'",
                    bytes.len(),
                    field.name
                );
                out.unknown_fields.push(UnknownField {
                    name: field.name.clone(),
                    bytes,
                });
            }
            Some(ReadAction::Skip) => {
                self.decode_value(&field.type_def, &IDENTITY, false)?;
            }
        }
        Ok(())
    }

    pub(crate) fn decode_value(
        &mut self,
        type_def: &TypeDef,
        mapping: &ValueMapping,
        closed: bool,
    ) -> Result<Value, DecodeError> {
        let schema = self.schema;
        let resolved = schema.resolve(type_def).ok_or_else(|| {
            out_of_range(format!("unresolved type {}", type_def))
        })?;

        match resolved {
            TypeDef::Int8
            | TypeDef::Int16
            | TypeDef::Int32
            | TypeDef::Int64
            | TypeDef::UInt8
            | TypeDef::UInt16
            | TypeDef::UInt32
            | TypeDef::UInt64 => {
                let raw = get_varint(self.buffer)?;
                let integer = integer_from_wire(resolved, raw).ok_or_else(|| {
                    out_of_range(format!("wire value 0x{:x} does not fit {}", raw, resolved))
                })?;
                let local = match mapping {
                    ValueMapping::Numeric { local, .. } => local,
                    _ => resolved,
                };
                integer_value(local, integer)
                    .ok_or_else(|| out_of_range(format!("{} does not fit local {}", integer, local)))
            }
            TypeDef::Float32 => {
                let float = self.buffer.get_f32_le()?;
                match mapping {
                    ValueMapping::Numeric {
                        local: TypeDef::Float64,
                        ..
                    } => Ok(Value::F64(f64::from(float))),
                    _ => Ok(Value::F32(float)),
                }
            }
            TypeDef::Float64 => {
                let float = self.buffer.get_f64_le()?;
                match mapping {
                    ValueMapping::Numeric {
                        local: TypeDef::Float32,
                        ..
                    } => {
                        let narrowed = float as f32;
                        if float.is_finite() && narrowed.is_infinite() {
                            return Err(out_of_range(format!("{} does not fit local f32", float)));
                        }
                        Ok(Value::F32(narrowed))
                    }
                    _ => Ok(Value::F64(float)),
                }
            }
            TypeDef::Boolean => match self.buffer.get_u8()? {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                other => Err(DecodeErrorKind::InvalidBool(other).into()),
            },
            TypeDef::String { max_size } => {
                let bytes = self.get_sized(*max_size)?;
                String::from_utf8(bytes)
                    .map(Value::String)
                    .map_err(|_| DecodeErrorKind::InvalidUtf8.into())
            }
            TypeDef::Binary { max_size } => Ok(Value::Binary(self.get_sized(*max_size)?)),
            TypeDef::SmallDecimal => {
                let mantissa = get_varint_i64(self.buffer)?;
                Ok(Value::Decimal(Decimal::new(
                    mantissa,
                    self.config.small_decimal_scale,
                )))
            }
            TypeDef::Decimal => {
                let mantissa = get_varint_i64(self.buffer)?;
                let scale = self.buffer.get_i8()?;
                Ok(Value::Decimal(Decimal::new(mantissa, scale)))
            }
            TypeDef::BigInt => {
                let bytes = self.get_sized(None)?;
                Ok(Value::BigInt(BigInt::from_be_bytes(&bytes)))
            }
            TypeDef::BigDecimal => {
                let bytes = self.get_sized(None)?;
                let scale = self.buffer.get_i8()?;
                Ok(Value::BigDecimal(BigDecimal::new(
                    BigInt::from_be_bytes(&bytes),
                    scale,
                )))
            }
            TypeDef::Time(time) => {
                let count = get_varint_i64(self.buffer)?;
                time.from_count(count)
                    .map(Value::Time)
                    .ok_or_else(|| out_of_range(format!("{} {} is not a valid instant", count, time)))
            }
            TypeDef::Enum(enum_type) => self.decode_enum(enum_type, mapping, closed),
            TypeDef::Sequence(component) => {
                let count = get_length(self.buffer)?;
                if count > self.config.max_sequence_length {
                    return Err(DecodeErrorKind::TooLong {
                        len: count,
                        max: self.config.max_sequence_length,
                    }
                    .into());
                }
                if self.is_zero_width(component, 0) {
                    // Shared by all sequences of the message so nesting cannot multiply it.
                    if count > self.zero_width_budget {
                        return Err(DecodeErrorKind::TooLong {
                            len: count,
                            max: self.zero_width_budget,
                        }
                        .into());
                    }
                    self.zero_width_budget -= count;
                } else if count > self.buffer.remaining() {
                    return Err(DecodeErrorKind::Truncated {
                        declared: count,
                        available: self.buffer.remaining(),
                    }
                    .into());
                }
                let element_mapping = match mapping {
                    ValueMapping::Sequence(inner) => inner.as_ref(),
                    _ => &IDENTITY,
                };
                self.enter()?;
                let mut items = Vec::with_capacity(count);
                for index in 0..count {
                    let item = self
                        .decode_value(component, element_mapping, closed)
                        .map_err(|err| err.at_index(index))?;
                    items.push(item);
                }
                self.leave();
                Ok(Value::Sequence(items))
            }
            TypeDef::Reference(name) => {
                let group = schema
                    .group(name)
                    .ok_or_else(|| out_of_range(format!("unknown group '{}'", name)))?;
                Ok(Value::from(self.decode_group_body(group)?))
            }
            TypeDef::DynamicReference(base) => {
                let id = get_varint(self.buffer)?;
                let group = u32::try_from(id)
                    .ok()
                    .and_then(|id| schema.group_by_id(id))
                    .ok_or_else(|| DecodeError::new(DecodeErrorKind::UnknownGroupId(id)))?;
                if let Some(base) = base {
                    if !schema.is_subgroup_of(&group.name, base) {
                        return Err(DecodeErrorKind::NotASubgroup {
                            group: group.name.clone(),
                            base: base.clone(),
                        }
                        .into());
                    }
                }
                Ok(Value::from(self.decode_group_body(group)?))
            }
            TypeDef::Named(alias) => Err(out_of_range(format!("unresolved type {}", alias))),
        }
    }

    /// Whether a value of this type can occupy no bytes: a static reference
    /// to a group whose fields are all required and zero-width themselves.
    fn is_zero_width(&self, type_def: &TypeDef, depth: usize) -> bool {
        if depth > self.config.max_depth {
            return false;
        }
        match self.schema.resolve(type_def) {
            Some(TypeDef::Reference(name)) => self.schema.all_fields(name).is_some_and(|fields| {
                fields
                    .iter()
                    .all(|field| field.required && self.is_zero_width(&field.type_def, depth + 1))
            }),
            _ => false,
        }
    }

    fn decode_enum(
        &mut self,
        enum_type: &EnumType,
        mapping: &ValueMapping,
        closed: bool,
    ) -> Result<Value, DecodeError> {
        let raw = get_varint_i64(self.buffer)?;
        let id = i32::try_from(raw)
            .map_err(|_| out_of_range(format!("enum id {} does not fit i32", raw)))?;
        let (known, closed) = match mapping {
            ValueMapping::Enum(m) => (
                m.wire_to_local
                    .get(&id)
                    .map(|symbol| EnumValue::new(symbol.id, symbol.name.clone())),
                closed || m.closed,
            ),
            _ => (
                enum_type
                    .symbol_by_id(id)
                    .map(|symbol| EnumValue::new(symbol.id, symbol.name.clone())),
                closed,
            ),
        };
        match known {
            Some(value) => Ok(Value::Enum(value)),
            None if closed => Err(DecodeErrorKind::UnknownEnumId(id).into()),
            None => {
                log::debug!("[CODEC] enum id {} has no symbol, surfacing as unknown", id);
                Ok(Value::Enum(EnumValue::unknown(id)))
            }
        }
    }

    /// Length-prefixed bytes with an optional size bound.
    fn get_sized(&mut self, max_size: Option<u32>) -> Result<Vec<u8>, DecodeError> {
        let len = get_length(self.buffer)?;
        if let Some(max) = max_size {
            if len > max as usize {
                return Err(DecodeErrorKind::TooLong {
                    len,
                    max: max as usize,
                }
                .into());
            }
        }
        Ok(self.buffer.take(len)?.to_vec())
    }
}
