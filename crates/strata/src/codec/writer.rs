// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value encoder.

use super::errors::{EncodeError, EncodeErrorKind};
use super::varint::{put_varint, put_varint_i64};
use super::{integer_to_wire, is_closed, IDENTITY};
use crate::binder::{ValueMapping, WriteAction};
use crate::buffer::{Buffer, Storage};
use crate::config::CodecConfig;
use crate::schema::{FieldDef, GroupDef, Schema};
use crate::types::{EnumType, TypeDef};
use crate::value::{BigDecimal, BigInt, Decimal, GroupValue, Value};

pub(crate) struct Encoder<'a, 'b, S: Storage> {
    schema: &'a Schema,
    config: &'a CodecConfig,
    buffer: &'b mut Buffer<S>,
    depth: usize,
}

fn mismatch(expected: &TypeDef, value: &Value) -> EncodeError {
    EncodeErrorKind::TypeMismatch {
        expected: expected.to_string(),
        found: value.kind_name(),
    }
    .into()
}

fn out_of_range(detail: String) -> EncodeError {
    EncodeErrorKind::OutOfRange(detail).into()
}

impl<'a, 'b, S: Storage> Encoder<'a, 'b, S> {
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
        }
    }

    fn enter(&mut self) -> Result<(), EncodeError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(EncodeErrorKind::DepthExceeded(self.config.max_depth).into());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Fields of `group`, inherited first, without a tag.
    pub(crate) fn encode_group_body(
        &mut self,
        group: &GroupDef,
        value: &GroupValue,
    ) -> Result<(), EncodeError> {
        self.enter()?;
        let schema = self.schema;
        let fields = schema
            .all_fields(&group.name)
            .ok_or_else(|| EncodeError::new(EncodeErrorKind::UnknownGroup(group.name.clone())))?;
        for field in fields {
            self.encode_field(field, value)
                .map_err(|err| err.in_field(&field.name))?;
        }
        self.leave();
        Ok(())
    }

    fn encode_field(&mut self, field: &FieldDef, value: &GroupValue) -> Result<(), EncodeError> {
        let action = field.mapping.as_ref().map(|mapping| &mapping.write);
        match action {
            None => self.encode_bound(field, &IDENTITY, value.get(&field.name)),
            Some(WriteAction::Bind(mapping)) => {
                self.encode_bound(field, mapping, value.get(&field.name))
            }
            Some(WriteAction::PassThrough) => {
                let raw = value.unknown_field(&field.name).map(|u| u.bytes.as_slice());
                self.write_presence(field, raw.is_some())?;
                if let Some(bytes) = raw {
                    self.buffer.put_bytes(bytes)?;
                }
                Ok(())
            }
            Some(WriteAction::Absent) => self.write_presence(field, false),
        }
    }

    fn encode_bound(
        &mut self,
        field: &FieldDef,
        mapping: &ValueMapping,
        value: Option<&Value>,
    ) -> Result<(), EncodeError> {
        self.write_presence(field, value.is_some())?;
        match value {
            Some(value) => self.encode_value(&field.type_def, mapping, value, is_closed(self.config, field)),
            None => Ok(()),
        }
    }

    /// Presence flag for optional fields; required fields must be present.
    fn write_presence(&mut self, field: &FieldDef, present: bool) -> Result<(), EncodeError> {
        match (field.required, present) {
            (true, true) => Ok(()),
            (true, false) => Err(EncodeErrorKind::MissingRequired.into()),
            (false, present) => Ok(self.buffer.put_u8(u8::from(present))?),
        }
    }

    pub(crate) fn encode_value(
        &mut self,
        type_def: &TypeDef,
        mapping: &ValueMapping,
        value: &Value,
        closed: bool,
    ) -> Result<(), EncodeError> {
        let schema = self.schema;
        let resolved = schema
            .resolve(type_def)
            .ok_or_else(|| EncodeError::new(EncodeErrorKind::UnknownGroup(type_def.to_string())))?;

        match resolved {
            TypeDef::Int8
            | TypeDef::Int16
            | TypeDef::Int32
            | TypeDef::Int64
            | TypeDef::UInt8
            | TypeDef::UInt16
            | TypeDef::UInt32
            | TypeDef::UInt64 => {
                let integer = value.as_integer().ok_or_else(|| mismatch(resolved, value))?;
                let pattern = integer_to_wire(resolved, integer).ok_or_else(|| {
                    out_of_range(format!("{} does not fit {}", integer, resolved))
                })?;
                Ok(put_varint(self.buffer, pattern)?)
            }
            TypeDef::Float32 => {
                let float = match value {
                    Value::F32(v) => *v,
                    Value::F64(v) => {
                        let narrowed = *v as f32;
                        if v.is_finite() && narrowed.is_infinite() {
                            return Err(out_of_range(format!("{} does not fit f32", v)));
                        }
                        narrowed
                    }
                    other => return Err(mismatch(resolved, other)),
                };
                Ok(self.buffer.put_f32_le(float)?)
            }
            TypeDef::Float64 => {
                let float = value.as_f64().ok_or_else(|| mismatch(resolved, value))?;
                Ok(self.buffer.put_f64_le(float)?)
            }
            TypeDef::Boolean => {
                let flag = value.as_bool().ok_or_else(|| mismatch(resolved, value))?;
                Ok(self.buffer.put_u8(u8::from(flag))?)
            }
            TypeDef::String { max_size } => {
                let text = value.as_str().ok_or_else(|| mismatch(resolved, value))?;
                self.put_sized(text.as_bytes(), *max_size)
            }
            TypeDef::Binary { max_size } => {
                let bytes = value.as_bytes().ok_or_else(|| mismatch(resolved, value))?;
                self.put_sized(bytes, *max_size)
            }
            TypeDef::SmallDecimal => {
                let decimal = decimal_of(value).ok_or_else(|| mismatch(resolved, value))?;
                let scale = self.config.small_decimal_scale;
                let mantissa = decimal.rescale(scale).ok_or_else(|| {
                    out_of_range(format!("{} is not representable at scale {}", decimal, scale))
                })?;
                Ok(put_varint_i64(self.buffer, mantissa)?)
            }
            TypeDef::Decimal => {
                let decimal = decimal_of(value).ok_or_else(|| mismatch(resolved, value))?;
                put_varint_i64(self.buffer, decimal.mantissa)?;
                Ok(self.buffer.put_i8(decimal.scale)?)
            }
            TypeDef::BigInt => {
                let big = match value {
                    Value::BigInt(big) => big.clone(),
                    other => other
                        .as_integer()
                        .map(BigInt::from_i128)
                        .ok_or_else(|| mismatch(resolved, other))?,
                };
                self.put_sized(big.as_be_bytes(), None)
            }
            TypeDef::BigDecimal => {
                let big = match value {
                    Value::BigDecimal(big) => big.clone(),
                    other => decimal_of(other)
                        .map(BigDecimal::from)
                        .ok_or_else(|| mismatch(resolved, other))?,
                };
                self.put_sized(big.unscaled.as_be_bytes(), None)?;
                Ok(self.buffer.put_i8(big.scale)?)
            }
            TypeDef::Time(time) => {
                let Value::Time(timestamp) = value else {
                    return Err(mismatch(resolved, value));
                };
                let count = time.to_count(timestamp).ok_or_else(|| {
                    out_of_range(format!("{:?} is not a whole number of {}", timestamp, time))
                })?;
                Ok(put_varint_i64(self.buffer, count)?)
            }
            TypeDef::Enum(enum_type) => self.encode_enum(enum_type, mapping, value, closed),
            TypeDef::Sequence(component) => {
                let items = value.as_sequence().ok_or_else(|| mismatch(resolved, value))?;
                if items.len() > self.config.max_sequence_length {
                    return Err(EncodeErrorKind::TooLong {
                        len: items.len(),
                        max: self.config.max_sequence_length,
                    }
                    .into());
                }
                let element_mapping = match mapping {
                    ValueMapping::Sequence(inner) => inner.as_ref(),
                    _ => &IDENTITY,
                };
                self.enter()?;
                put_varint(self.buffer, items.len() as u64)?;
                for (index, item) in items.iter().enumerate() {
                    self.encode_value(component, element_mapping, item, closed)
                        .map_err(|err| err.at_index(index))?;
                }
                self.leave();
                Ok(())
            }
            TypeDef::Reference(name) => {
                let group_value = value.as_group().ok_or_else(|| mismatch(resolved, value))?;
                if group_value.group != *name {
                    return Err(EncodeErrorKind::GroupMismatch {
                        expected: name.clone(),
                        found: group_value.group.clone(),
                    }
                    .into());
                }
                let group = schema
                    .group(name)
                    .ok_or_else(|| EncodeError::new(EncodeErrorKind::UnknownGroup(name.clone())))?;
                self.encode_group_body(group, group_value)
            }
            TypeDef::DynamicReference(base) => {
                let group_value = value.as_group().ok_or_else(|| mismatch(resolved, value))?;
                let group = schema.group(&group_value.group).ok_or_else(|| {
                    EncodeError::new(EncodeErrorKind::UnknownGroup(group_value.group.clone()))
                })?;
                if let Some(base) = base {
                    if !schema.is_subgroup_of(&group.name, base) {
                        return Err(EncodeErrorKind::NotASubgroup {
                            group: group.name.clone(),
                            base: base.clone(),
                        }
                        .into());
                    }
                }
                let id = group
                    .id
                    .ok_or_else(|| EncodeError::new(EncodeErrorKind::MissingGroupId(group.name.clone())))?;
                put_varint(self.buffer, u64::from(id))?;
                self.encode_group_body(group, group_value)
            }
            TypeDef::Named(_) => Err(mismatch(resolved, value)),
        }
    }

    fn encode_enum(
        &mut self,
        enum_type: &EnumType,
        mapping: &ValueMapping,
        value: &Value,
        closed: bool,
    ) -> Result<(), EncodeError> {
        let Value::Enum(enum_value) = value else {
            return Err(mismatch(&TypeDef::Enum(enum_type.clone()), value));
        };
        let wire_id = match &enum_value.symbol {
            Some(symbol) => enum_type
                .symbol_by_name(symbol)
                .map(|s| s.id)
                .ok_or_else(|| EncodeError::new(EncodeErrorKind::UnknownEnumSymbol(symbol.clone())))?,
            None => {
                let (id, closed) = match mapping {
                    ValueMapping::Enum(m) => (
                        m.local_to_wire
                            .get(&enum_value.id)
                            .copied()
                            .unwrap_or(enum_value.id),
                        closed || m.closed,
                    ),
                    _ => (enum_value.id, closed),
                };
                if closed && enum_type.symbol_by_id(id).is_none() {
                    return Err(EncodeErrorKind::UnknownEnumId(id).into());
                }
                id
            }
        };
        Ok(put_varint_i64(self.buffer, i64::from(wire_id))?)
    }

    /// Length-prefixed bytes with an optional size bound.
    fn put_sized(&mut self, bytes: &[u8], max_size: Option<u32>) -> Result<(), EncodeError> {
        if let Some(max) = max_size {
            if bytes.len() > max as usize {
                return Err(EncodeErrorKind::TooLong {
                    len: bytes.len(),
                    max: max as usize,
                }
                .into());
            }
        }
        put_varint(self.buffer, bytes.len() as u64)?;
        Ok(self.buffer.put_bytes(bytes)?)
    }
}

fn decimal_of(value: &Value) -> Option<Decimal> {
    match value {
        Value::Decimal(decimal) => Some(*decimal),
        other => other.as_i64().map(Decimal::from),
    }
}
