// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Self-describing schema exchange.
//!
//! A [`Schema`] is turned into a message of the fixed meta-schema and encoded
//! with the ordinary codec, so a peer can send its wire shape ahead of data
//! and the receiver can bind against it without pre-shared versions.
//!
//! Elements are written in declaration order: schema, named types, groups,
//! fields, annotations. Type definitions travel as dynamic references to the
//! `Type` base group, with one subgroup per kind. Host bindings and binder
//! mappings are never transmitted.

use crate::buffer::{Buffer, Storage};
use crate::codec::{Codec, CodecError, DecodeError, EncodeError};
use crate::schema::{
    Annotations, FieldDef, GroupDef, NamedType, Schema, SchemaBuilder, SchemaDefinitionError,
};
use crate::types::{EnumSymbol, EnumType, Epoch, TimeType, TimeUnit, TypeDef};
use crate::value::{GroupValue, Value};
use std::fmt;
use std::sync::OnceLock;

const SCHEMA: &str = "Schema";
const ANNOTATION: &str = "Annotation";
const NAMED_TYPE: &str = "NamedType";
const GROUP: &str = "Group";
const FIELD: &str = "Field";
const ENUM_SYMBOL: &str = "EnumSymbol";
const TYPE: &str = "Type";
const PRIMITIVE_TYPE: &str = "PrimitiveType";
const STRING_TYPE: &str = "StringType";
const BINARY_TYPE: &str = "BinaryType";
const TIME_TYPE: &str = "TimeType";
const ENUM_TYPE: &str = "EnumType";
const SEQUENCE_TYPE: &str = "SequenceType";
const REFERENCE_TYPE: &str = "ReferenceType";
const DYNAMIC_TYPE: &str = "DynamicReferenceType";
const ALIAS_TYPE: &str = "AliasType";

static META_SCHEMA: OnceLock<Schema> = OnceLock::new();

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum MetaError {
    Encode(EncodeError),
    Decode(DecodeError),
    Codec(CodecError),
    /// Message decodes but does not describe a schema.
    Malformed(String),
    /// Described schema breaks a schema invariant.
    Definition(SchemaDefinitionError),
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaError::Encode(err) => write!(f, "schema encode failed: {}", err),
            MetaError::Decode(err) => write!(f, "schema decode failed: {}", err),
            MetaError::Codec(err) => write!(f, "meta codec unavailable: {}", err),
            MetaError::Malformed(msg) => write!(f, "malformed schema description: {}", msg),
            MetaError::Definition(err) => write!(f, "described schema is invalid: {}", err),
        }
    }
}

impl std::error::Error for MetaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetaError::Encode(err) => Some(err),
            MetaError::Decode(err) => Some(err),
            MetaError::Codec(err) => Some(err),
            MetaError::Definition(err) => Some(err),
            MetaError::Malformed(_) => None,
        }
    }
}

impl From<EncodeError> for MetaError {
    fn from(err: EncodeError) -> Self {
        MetaError::Encode(err)
    }
}

impl From<DecodeError> for MetaError {
    fn from(err: DecodeError) -> Self {
        MetaError::Decode(err)
    }
}

impl From<CodecError> for MetaError {
    fn from(err: CodecError) -> Self {
        MetaError::Codec(err)
    }
}

impl From<SchemaDefinitionError> for MetaError {
    fn from(err: SchemaDefinitionError) -> Self {
        MetaError::Definition(err)
    }
}

// ---------------------------------------------------------------------------
// Meta-schema
// ---------------------------------------------------------------------------

/// The schema that describes schemas. Group ids are fixed.
pub fn meta_schema() -> &'static Schema {
    META_SCHEMA.get_or_init(|| Schema::assemble(meta_groups(), Vec::new(), Annotations::new(), None))
}

fn annotations_field() -> FieldDef {
    FieldDef::required("annotations", TypeDef::sequence(TypeDef::reference(ANNOTATION)))
}

fn name_field() -> FieldDef {
    FieldDef::required("name", TypeDef::string())
}

fn meta_groups() -> Vec<GroupDef> {
    vec![
        GroupDef::new(SCHEMA)
            .with_id(1)
            .field(FieldDef::required(
                "named_types",
                TypeDef::sequence(TypeDef::reference(NAMED_TYPE)),
            ))
            .field(FieldDef::required("groups", TypeDef::sequence(TypeDef::reference(GROUP))))
            .field(annotations_field()),
        GroupDef::new(ANNOTATION)
            .with_id(2)
            .field(FieldDef::required("key", TypeDef::string()))
            .field(FieldDef::required("value", TypeDef::string())),
        GroupDef::new(NAMED_TYPE)
            .with_id(3)
            .field(name_field())
            .field(FieldDef::required("type", TypeDef::dynamic(TYPE)))
            .field(annotations_field()),
        GroupDef::new(GROUP)
            .with_id(4)
            .field(name_field())
            .field(FieldDef::optional("id", TypeDef::UInt32))
            .field(FieldDef::optional("super_group", TypeDef::string()))
            .field(FieldDef::required("fields", TypeDef::sequence(TypeDef::reference(FIELD))))
            .field(annotations_field()),
        GroupDef::new(FIELD)
            .with_id(5)
            .field(name_field())
            .field(FieldDef::optional("id", TypeDef::UInt32))
            .field(FieldDef::required("required", TypeDef::Boolean))
            .field(FieldDef::required("type", TypeDef::dynamic(TYPE)))
            .field(annotations_field()),
        GroupDef::new(ENUM_SYMBOL)
            .with_id(6)
            .field(name_field())
            .field(FieldDef::required("id", TypeDef::Int32)),
        GroupDef::new(TYPE).with_id(16),
        GroupDef::new(PRIMITIVE_TYPE)
            .with_id(17)
            .extends(TYPE)
            .field(FieldDef::required("kind", TypeDef::string())),
        GroupDef::new(STRING_TYPE)
            .with_id(18)
            .extends(TYPE)
            .field(FieldDef::optional("max_size", TypeDef::UInt32)),
        GroupDef::new(BINARY_TYPE)
            .with_id(19)
            .extends(TYPE)
            .field(FieldDef::optional("max_size", TypeDef::UInt32)),
        GroupDef::new(TIME_TYPE)
            .with_id(20)
            .extends(TYPE)
            .field(FieldDef::required("unit", TypeDef::string()))
            .field(FieldDef::required("epoch", TypeDef::string()))
            .field(FieldDef::optional("timezone", TypeDef::string())),
        GroupDef::new(ENUM_TYPE)
            .with_id(21)
            .extends(TYPE)
            .field(FieldDef::required(
                "symbols",
                TypeDef::sequence(TypeDef::reference(ENUM_SYMBOL)),
            )),
        GroupDef::new(SEQUENCE_TYPE)
            .with_id(22)
            .extends(TYPE)
            .field(FieldDef::required("component", TypeDef::dynamic(TYPE))),
        GroupDef::new(REFERENCE_TYPE)
            .with_id(23)
            .extends(TYPE)
            .field(FieldDef::required("group", TypeDef::string())),
        GroupDef::new(DYNAMIC_TYPE)
            .with_id(24)
            .extends(TYPE)
            .field(FieldDef::optional("base", TypeDef::string())),
        GroupDef::new(ALIAS_TYPE)
            .with_id(25)
            .extends(TYPE)
            .field(name_field()),
    ]
}

// ---------------------------------------------------------------------------
// Schema -> value
// ---------------------------------------------------------------------------

/// Describe `schema` as a message of the meta-schema.
pub fn schema_to_value(schema: &Schema) -> GroupValue {
    let named_types: Vec<Value> = schema
        .named_types()
        .iter()
        .map(|named| {
            GroupValue::new(NAMED_TYPE)
                .with("name", named.name.as_str())
                .with("type", type_to_value(&named.type_def))
                .with("annotations", annotations_to_value(&named.annotations))
                .into()
        })
        .collect();
    let groups: Vec<Value> = schema.groups().iter().map(|g| group_to_value(g).into()).collect();

    GroupValue::new(SCHEMA)
        .with("named_types", named_types)
        .with("groups", groups)
        .with("annotations", annotations_to_value(schema.annotations()))
}

fn group_to_value(group: &GroupDef) -> GroupValue {
    let fields: Vec<Value> = group
        .fields
        .iter()
        .map(|field| {
            GroupValue::new(FIELD)
                .with("name", field.name.as_str())
                .with("id", field.id)
                .with("required", field.required)
                .with("type", type_to_value(&field.type_def))
                .with("annotations", annotations_to_value(&field.annotations))
                .into()
        })
        .collect();
    GroupValue::new(GROUP)
        .with("name", group.name.as_str())
        .with("id", group.id)
        .with("super_group", group.super_group.clone())
        .with("fields", fields)
        .with("annotations", annotations_to_value(&group.annotations))
}

fn annotations_to_value(annotations: &Annotations) -> Vec<Value> {
    annotations
        .iter()
        .map(|(key, value)| {
            GroupValue::new(ANNOTATION)
                .with("key", key.as_str())
                .with("value", value.as_str())
                .into()
        })
        .collect()
}

fn type_to_value(type_def: &TypeDef) -> GroupValue {
    match type_def {
        TypeDef::String { max_size } => GroupValue::new(STRING_TYPE).with("max_size", *max_size),
        TypeDef::Binary { max_size } => GroupValue::new(BINARY_TYPE).with("max_size", *max_size),
        TypeDef::Time(time) => GroupValue::new(TIME_TYPE)
            .with("unit", time.unit.as_str())
            .with("epoch", time.epoch.as_str())
            .with("timezone", time.timezone.clone()),
        TypeDef::Enum(enum_type) => {
            let symbols: Vec<Value> = enum_type
                .symbols
                .iter()
                .map(|symbol| {
                    GroupValue::new(ENUM_SYMBOL)
                        .with("name", symbol.name.as_str())
                        .with("id", symbol.id)
                        .into()
                })
                .collect();
            GroupValue::new(ENUM_TYPE).with("symbols", symbols)
        }
        TypeDef::Sequence(component) => {
            GroupValue::new(SEQUENCE_TYPE).with("component", type_to_value(component))
        }
        TypeDef::Reference(group) => GroupValue::new(REFERENCE_TYPE).with("group", group.as_str()),
        TypeDef::DynamicReference(base) => GroupValue::new(DYNAMIC_TYPE).with("base", base.clone()),
        TypeDef::Named(alias) => GroupValue::new(ALIAS_TYPE).with("name", alias.as_str()),
        primitive => GroupValue::new(PRIMITIVE_TYPE).with("kind", primitive.kind_name()),
    }
}

// ---------------------------------------------------------------------------
// Value -> schema
// ---------------------------------------------------------------------------

/// Rebuild a schema from its meta-schema description. The result is
/// validated like any other schema.
pub fn schema_from_value(value: &GroupValue) -> Result<Schema, MetaError> {
    expect_group(value, SCHEMA)?;
    let mut builder = SchemaBuilder::new();

    for named in members(value, "named_types")? {
        expect_group(named, NAMED_TYPE)?;
        let mut def = NamedType::new(text(named, "name")?, type_from_value(member(named, "type")?)?);
        def.annotations = annotations_from(named)?;
        builder = builder.named_type(def);
    }
    for group in members(value, "groups")? {
        builder = builder.group(group_from_value(group)?);
    }
    for (key, annotation) in annotations_from(value)? {
        builder = builder.annotation(key, annotation);
    }
    Ok(builder.build()?)
}

fn group_from_value(value: &GroupValue) -> Result<GroupDef, MetaError> {
    expect_group(value, GROUP)?;
    let mut group = GroupDef::new(text(value, "name")?);
    group.id = optional_u32(value, "id")?;
    group.super_group = optional_text(value, "super_group")?.map(str::to_string);
    group.annotations = annotations_from(value)?;
    for field in members(value, "fields")? {
        expect_group(field, FIELD)?;
        let required = field
            .get("required")
            .and_then(Value::as_bool)
            .ok_or_else(|| missing(field, "required"))?;
        let mut def = FieldDef::new(
            text(field, "name")?,
            type_from_value(member(field, "type")?)?,
            required,
        );
        def.id = optional_u32(field, "id")?;
        def.annotations = annotations_from(field)?;
        group.fields.push(def);
    }
    Ok(group)
}

fn type_from_value(value: &GroupValue) -> Result<TypeDef, MetaError> {
    match value.group.as_str() {
        PRIMITIVE_TYPE => primitive(text(value, "kind")?),
        STRING_TYPE => Ok(TypeDef::String {
            max_size: optional_u32(value, "max_size")?,
        }),
        BINARY_TYPE => Ok(TypeDef::Binary {
            max_size: optional_u32(value, "max_size")?,
        }),
        TIME_TYPE => {
            let unit = text(value, "unit")?;
            let epoch = text(value, "epoch")?;
            let mut time = TimeType::new(
                TimeUnit::parse(unit)
                    .ok_or_else(|| MetaError::Malformed(format!("unknown time unit '{}'", unit)))?,
                Epoch::parse(epoch)
                    .ok_or_else(|| MetaError::Malformed(format!("unknown epoch '{}'", epoch)))?,
            );
            time.timezone = optional_text(value, "timezone")?.map(str::to_string);
            Ok(TypeDef::Time(time))
        }
        ENUM_TYPE => {
            let symbols = members(value, "symbols")?
                .into_iter()
                .map(|symbol| {
                    let id = symbol
                        .get("id")
                        .and_then(Value::as_i64)
                        .and_then(|id| i32::try_from(id).ok())
                        .ok_or_else(|| missing(symbol, "id"))?;
                    Ok(EnumSymbol::new(text(symbol, "name")?, id))
                })
                .collect::<Result<Vec<_>, MetaError>>()?;
            Ok(TypeDef::Enum(EnumType::new(symbols)))
        }
        SEQUENCE_TYPE => Ok(TypeDef::sequence(type_from_value(member(value, "component")?)?)),
        REFERENCE_TYPE => Ok(TypeDef::reference(text(value, "group")?)),
        DYNAMIC_TYPE => Ok(TypeDef::DynamicReference(
            optional_text(value, "base")?.map(str::to_string),
        )),
        ALIAS_TYPE => Ok(TypeDef::named(text(value, "name")?)),
        other => Err(MetaError::Malformed(format!("'{}' is not a type", other))),
    }
}

fn primitive(kind: &str) -> Result<TypeDef, MetaError> {
    let type_def = match kind {
        "i8" => TypeDef::Int8,
        "i16" => TypeDef::Int16,
        "i32" => TypeDef::Int32,
        "i64" => TypeDef::Int64,
        "u8" => TypeDef::UInt8,
        "u16" => TypeDef::UInt16,
        "u32" => TypeDef::UInt32,
        "u64" => TypeDef::UInt64,
        "f32" => TypeDef::Float32,
        "f64" => TypeDef::Float64,
        "bool" => TypeDef::Boolean,
        "smalldecimal" => TypeDef::SmallDecimal,
        "decimal" => TypeDef::Decimal,
        "bigint" => TypeDef::BigInt,
        "bigdecimal" => TypeDef::BigDecimal,
        other => {
            return Err(MetaError::Malformed(format!("unknown primitive kind '{}'", other)))
        }
    };
    Ok(type_def)
}

fn missing(value: &GroupValue, field: &str) -> MetaError {
    MetaError::Malformed(format!("{}.{} is missing or mistyped", value.group, field))
}

fn expect_group(value: &GroupValue, group: &str) -> Result<(), MetaError> {
    if value.group == group {
        Ok(())
    } else {
        Err(MetaError::Malformed(format!(
            "expected {}, found {}",
            group, value.group
        )))
    }
}

fn text<'v>(value: &'v GroupValue, field: &str) -> Result<&'v str, MetaError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(value, field))
}

fn optional_text<'v>(value: &'v GroupValue, field: &str) -> Result<Option<&'v str>, MetaError> {
    match value.get(field) {
        None => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| missing(value, field)),
    }
}

fn optional_u32(value: &GroupValue, field: &str) -> Result<Option<u32>, MetaError> {
    match value.get(field) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| missing(value, field)),
    }
}

fn member<'v>(value: &'v GroupValue, field: &str) -> Result<&'v GroupValue, MetaError> {
    value
        .get(field)
        .and_then(Value::as_group)
        .ok_or_else(|| missing(value, field))
}

fn members<'v>(value: &'v GroupValue, field: &str) -> Result<Vec<&'v GroupValue>, MetaError> {
    let items = value
        .get(field)
        .and_then(Value::as_sequence)
        .ok_or_else(|| missing(value, field))?;
    items
        .iter()
        .map(|item| item.as_group().ok_or_else(|| missing(value, field)))
        .collect()
}

fn annotations_from(value: &GroupValue) -> Result<Annotations, MetaError> {
    members(value, "annotations")?
        .into_iter()
        .map(|annotation| {
            Ok((
                text(annotation, "key")?.to_string(),
                text(annotation, "value")?.to_string(),
            ))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Wire
// ---------------------------------------------------------------------------

fn meta_codec() -> Result<Codec, MetaError> {
    Ok(Codec::new(meta_schema().clone())?)
}

/// Encode `schema` as one framed meta-schema message.
pub fn encode_schema(schema: &Schema) -> Result<Vec<u8>, MetaError> {
    let bytes = meta_codec()?.encode_to_vec(&schema_to_value(schema))?;
    log::debug!(
        "[META] encoded schema of {} group(s) into {} bytes",
        schema.groups().len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Decode one framed meta-schema message occupying `bytes`.
pub fn decode_schema(bytes: &[u8]) -> Result<Schema, MetaError> {
    let value = meta_codec()?.decode_slice(bytes)?;
    schema_from_value(&value)
}

/// Append `schema` to `buffer`, e.g. ahead of the data it describes.
pub fn write_schema<S: Storage>(schema: &Schema, buffer: &mut Buffer<S>) -> Result<(), MetaError> {
    Ok(meta_codec()?.encode(&schema_to_value(schema), buffer)?)
}

/// Read a schema message from `buffer`.
pub fn read_schema<S: Storage>(buffer: &mut Buffer<S>) -> Result<Schema, MetaError> {
    let value = meta_codec()?.decode(buffer)?;
    schema_from_value(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{Direction, SchemaBinder};
    use crate::buffer::GrowableBuffer;
    use crate::schema::{Binding, SchemaViolation};

    fn trading_schema() -> Schema {
        Schema::builder()
            .annotation("namespace", "trading")
            .named_type(NamedType::new("Price", TypeDef::Decimal).with_annotation("unit", "EUR"))
            .group(
                GroupDef::new("Instrument")
                    .with_id(10)
                    .field(FieldDef::required("symbol", TypeDef::String { max_size: Some(12) }))
                    .field(FieldDef::optional("isin", TypeDef::binary())),
            )
            .group(
                GroupDef::new("Bond")
                    .with_id(11)
                    .extends("Instrument")
                    .field(FieldDef::required("coupon", TypeDef::SmallDecimal))
                    .field(FieldDef::optional("face", TypeDef::BigDecimal)),
            )
            .group(
                GroupDef::new("Order")
                    .with_annotation("direction", "outbound")
                    .field(FieldDef::required("price", TypeDef::named("Price")).with_id(1))
                    .field(
                        FieldDef::required(
                            "side",
                            TypeDef::Enum(EnumType::new(vec![
                                EnumSymbol::new("Buy", 1),
                                EnumSymbol::new("Sell", -1),
                            ])),
                        )
                        .with_annotation("closed", "true"),
                    )
                    .field(FieldDef::required(
                        "at",
                        TypeDef::Time(
                            TimeType::new(TimeUnit::Microseconds, Epoch::Y2k)
                                .with_timezone("+01:00"),
                        ),
                    ))
                    .field(FieldDef::required(
                        "legs",
                        TypeDef::sequence(TypeDef::sequence(TypeDef::reference("Instrument"))),
                    ))
                    .field(FieldDef::optional("any", TypeDef::DynamicReference(None)))
                    .field(FieldDef::optional("asset", TypeDef::dynamic("Instrument")))
                    .field(FieldDef::optional("qty", TypeDef::UInt64))
                    .field(FieldDef::optional("big", TypeDef::BigInt))
                    .field(FieldDef::optional("ratio", TypeDef::Float32))
                    .field(FieldDef::optional("flag", TypeDef::Boolean)),
            )
            .build()
            .expect("valid schema")
    }

    #[test]
    fn test_meta_schema_is_valid() {
        let checked = SchemaBuilder::new();
        let checked = meta_groups()
            .into_iter()
            .fold(checked, |builder, group| builder.group(group))
            .build()
            .expect("meta-schema satisfies schema invariants");
        assert_eq!(&checked, meta_schema());
        assert_eq!(meta_schema().dynamic_subgroups(TYPE).len(), 9);
    }

    #[test]
    fn test_schema_roundtrip() {
        let schema = trading_schema();
        let bytes = encode_schema(&schema).expect("encode");
        let decoded = decode_schema(&bytes).expect("decode");
        assert_eq!(decoded, schema);
        assert_eq!(decoded.group("Order").and_then(|g| g.id), None);
    }

    #[test]
    fn test_meta_schema_describes_itself() {
        let decoded = decode_schema(&encode_schema(meta_schema()).expect("encode")).expect("decode");
        assert_eq!(&decoded, meta_schema());
    }

    #[test]
    fn test_empty_schema_bytes() {
        let empty = Schema::builder().build().expect("valid");
        // len | id 1 | no named types | no groups | no annotations
        assert_eq!(encode_schema(&empty).expect("encode"), vec![0x04, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_named_types_precede_groups() {
        let schema = trading_schema();
        let value = schema_to_value(&schema);
        let bytes = encode_schema(&schema).expect("encode");
        let price = bytes
            .windows(5)
            .position(|w| w == b"Price")
            .expect("named type on the wire");
        let instrument = bytes
            .windows(10)
            .position(|w| w == b"Instrument")
            .expect("group on the wire");
        assert!(price < instrument);
        assert_eq!(
            value.get("named_types").and_then(Value::as_sequence).map(<[Value]>::len),
            Some(1)
        );
    }

    #[test]
    fn test_bindings_are_not_transmitted() {
        let schema = Schema::builder()
            .binding(Binding::new(7u8))
            .group(GroupDef::new("Ping").with_id(1).with_binding(Binding::new("ping")))
            .build()
            .expect("valid");
        let decoded = decode_schema(&encode_schema(&schema).expect("encode")).expect("decode");
        assert!(!decoded.is_bound());
        assert!(decoded.group("Ping").is_some());
    }

    #[test]
    fn test_buffer_exchange_ahead_of_data() {
        let remote = trading_schema().assign_group_ids();
        let mut buffer = GrowableBuffer::growable(64);
        write_schema(&remote, &mut buffer).expect("write");
        buffer.flip();

        let received = read_schema(&mut buffer).expect("read");
        assert_eq!(received, remote);
        let bound = SchemaBinder::new(trading_schema())
            .bind(&received, Direction::Inbound)
            .expect("same shape binds");
        assert!(bound.is_bound());
    }

    #[test]
    fn test_malformed_descriptions() {
        let err = schema_from_value(&GroupValue::new("Group")).unwrap_err();
        assert!(matches!(err, MetaError::Malformed(_)));

        let bogus_type = GroupValue::new(SCHEMA)
            .with("named_types", vec![Value::from(
                GroupValue::new(NAMED_TYPE)
                    .with("name", "T")
                    .with("type", GroupValue::new(PRIMITIVE_TYPE).with("kind", "i128"))
                    .with("annotations", Vec::<Value>::new()),
            )])
            .with("groups", Vec::<Value>::new())
            .with("annotations", Vec::<Value>::new());
        assert!(matches!(
            schema_from_value(&bogus_type).unwrap_err(),
            MetaError::Malformed(msg) if msg.contains("i128")
        ));

        let twice = group_to_value(&GroupDef::new("Dup"));
        let duplicated = GroupValue::new(SCHEMA)
            .with("named_types", Vec::<Value>::new())
            .with("groups", vec![Value::from(twice.clone()), Value::from(twice)])
            .with("annotations", Vec::<Value>::new());
        match schema_from_value(&duplicated).unwrap_err() {
            MetaError::Definition(err) => assert!(err
                .violations()
                .iter()
                .any(|v| matches!(v, SchemaViolation::DuplicateGroupName(name) if name == "Dup"))),
            other => panic!("unexpected {:?}", other),
        }
    }
}
