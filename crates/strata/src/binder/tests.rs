// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::codec::{Codec, DecodeErrorKind};
use crate::schema::Binding;
use crate::types::EnumSymbol;
use crate::value::{Decimal, EnumValue, GroupValue, Value};

fn position(extra: Option<FieldDef>) -> Schema {
    let mut group = GroupDef::new("Position")
        .with_id(1)
        .field(FieldDef::required("quantity", TypeDef::Decimal));
    if let Some(field) = extra {
        group = group.field(field);
    }
    Schema::builder().group(group).build().expect("valid schema")
}

fn single_field(type_def: TypeDef) -> Schema {
    Schema::builder()
        .group(GroupDef::new("Tick").with_id(1).field(FieldDef::required("value", type_def)))
        .build()
        .expect("valid schema")
}

fn field_mapping<'s>(schema: &'s Schema, group: &str, field: &str) -> &'s FieldMapping {
    schema
        .group(group)
        .and_then(|g| g.declared_field(field))
        .and_then(|f| f.mapping.as_ref())
        .expect("mapped field")
}

#[test]
fn test_identity_binding() {
    let schema = position(Some(FieldDef::optional("label", TypeDef::string())));
    let bound = SchemaBinder::new(schema.clone())
        .bind(&schema, Direction::Both)
        .expect("identical schemas bind");

    let group = bound.group("Position").expect("group");
    let mapping = group.mapping.as_ref().expect("group mapping");
    assert!(mapping.matched);
    assert!(mapping.local_only.is_empty());
    for field in &group.fields {
        assert!(field.mapping.as_ref().is_some_and(FieldMapping::is_identity));
    }
    assert!(bound.is_bound());
}

#[test]
fn test_additive_optional_field() {
    let old = position(None);
    let new = position(Some(FieldDef::optional("label", TypeDef::string())));

    let bound = SchemaBinder::new(old.clone())
        .bind(&new, Direction::Inbound)
        .expect("optional addition is compatible");
    assert_eq!(field_mapping(&bound, "Position", "label").read, ReadAction::Retain);

    let dropping = SchemaBinder::new(old)
        .with_policy(BinderPolicy::default().with_retain_unknown_fields(false))
        .bind(&new, Direction::Both)
        .expect("compatible");
    let mapping = field_mapping(&dropping, "Position", "label");
    assert_eq!(mapping.read, ReadAction::Skip);
    assert_eq!(mapping.write, WriteAction::Absent);
}

#[test]
fn test_additive_required_field() {
    let old = position(None);
    let new = position(Some(FieldDef::required("label", TypeDef::string())));

    let err = SchemaBinder::new(old.clone())
        .bind(&new, Direction::Inbound)
        .unwrap_err();
    assert_eq!(
        err.incompatibilities(),
        &[Incompatibility::field(
            "Position",
            "label",
            IncompatibilityReason::RequiredFieldAdded
        )]
    );

    let tolerant = SchemaBinder::new(old.clone())
        .with_policy(BinderPolicy::default().with_tolerate_unknown_required(true));
    assert!(tolerant.bind(&new, Direction::Inbound).is_ok());
    // Still cannot produce it.
    assert!(tolerant.bind(&new, Direction::Outbound).is_err());
}

#[test]
fn test_field_removal() {
    let with_optional = position(Some(FieldDef::optional("label", TypeDef::string())));
    let without = position(None);
    let binder = SchemaBinder::new(with_optional);
    for traffic in [Direction::Inbound, Direction::Outbound, Direction::Both] {
        let bound = binder.bind(&without, traffic).expect("optional removal is compatible");
        let mapping = bound
            .group("Position")
            .and_then(|g| g.mapping.as_ref())
            .expect("mapping");
        assert_eq!(mapping.local_only, vec!["label".to_string()]);
    }

    let with_required = position(Some(FieldDef::required("label", TypeDef::string())));
    let binder = SchemaBinder::new(with_required);
    let err = binder.bind(&without, Direction::Inbound).unwrap_err();
    assert!(err.has(
        "Position",
        Some("label"),
        IncompatibilityReason::RequiredFieldMissing
    ));
    // Sending: the field is simply not written.
    assert!(binder.bind(&without, Direction::Outbound).is_ok());
}

#[test]
fn test_requiredness_changes() {
    let required = position(Some(FieldDef::required("label", TypeDef::string())));
    let optional = position(Some(FieldDef::optional("label", TypeDef::string())));

    let err = SchemaBinder::new(required.clone())
        .bind(&optional, Direction::Inbound)
        .unwrap_err();
    assert!(err.has("Position", Some("label"), IncompatibilityReason::RequiredFieldMissing));
    assert!(SchemaBinder::new(required).bind(&optional, Direction::Outbound).is_ok());

    let err = SchemaBinder::new(optional.clone())
        .bind(&position(Some(FieldDef::required("label", TypeDef::string()))), Direction::Outbound)
        .unwrap_err();
    assert!(err.has("Position", Some("label"), IncompatibilityReason::RequiredFieldAdded));
}

#[test]
fn test_direction_exemption() {
    let local = Schema::builder()
        .group(
            GroupDef::new("Position")
                .with_id(1)
                .field(FieldDef::required("quantity", TypeDef::Decimal))
                .field(
                    FieldDef::required("trader", TypeDef::string())
                        .with_annotation("direction", "outbound"),
                ),
        )
        .build()
        .expect("valid");
    let remote = position(None);
    let binder =
        SchemaBinder::new(local).with_classifier(DirectionClassifier::by_annotation("direction"));

    assert!(binder.bind(&remote, Direction::Inbound).is_ok());
    // Without the classifier the same field is required on decode.
    let plain = SchemaBinder::new(binder.local().clone());
    assert!(plain.bind(&remote, Direction::Inbound).is_err());
}

#[test]
fn test_every_problem_is_reported() {
    let local = Schema::builder()
        .group(
            GroupDef::new("Tick")
                .with_id(1)
                .field(FieldDef::required("value", TypeDef::Int32))
                .field(FieldDef::required("venue", TypeDef::string())),
        )
        .group(GroupDef::new("Heartbeat").with_id(2))
        .build()
        .expect("valid");
    let remote = Schema::builder()
        .group(
            GroupDef::new("Tick")
                .with_id(7)
                .field(FieldDef::required("value", TypeDef::string())),
        )
        .build()
        .expect("valid");

    let err = SchemaBinder::new(local).bind(&remote, Direction::Both).unwrap_err();
    assert_eq!(err.incompatibilities().len(), 3);
    assert!(err.has("Tick", Some("value"), IncompatibilityReason::TypeMismatch));
    assert!(err.has("Tick", Some("venue"), IncompatibilityReason::RequiredFieldMissing));
    assert!(err.has("Heartbeat", None, IncompatibilityReason::GroupMissing));
    assert!(err.to_string().contains("Tick.value: TYPE_MISMATCH"));
}

#[test]
fn test_local_only_group_matters_only_when_sending() {
    let local = Schema::builder()
        .group(GroupDef::new("Tick").with_id(1))
        .group(GroupDef::new("Heartbeat").with_id(2))
        .build()
        .expect("valid");
    let remote = Schema::builder()
        .group(GroupDef::new("Tick").with_id(1))
        .build()
        .expect("valid");
    let binder = SchemaBinder::new(local);
    assert!(binder.bind(&remote, Direction::Inbound).is_ok());
    let err = binder.bind(&remote, Direction::Outbound).unwrap_err();
    assert_eq!(
        err.incompatibilities(),
        &[Incompatibility::group("Heartbeat", IncompatibilityReason::GroupMissing)]
    );
}

#[test]
fn test_numeric_conversion_policy() {
    let local = single_field(TypeDef::Int64);
    let remote = single_field(TypeDef::Int32);

    let exact = SchemaBinder::new(local.clone());
    let err = exact.bind(&remote, Direction::Inbound).unwrap_err();
    assert!(err.has("Tick", Some("value"), IncompatibilityReason::TypeMismatch));

    let widening = SchemaBinder::new(local.clone())
        .with_policy(BinderPolicy::default().with_numeric(NumericConversion::Widening));
    let bound = widening.bind(&remote, Direction::Inbound).expect("i32 widens to i64");
    assert_eq!(
        field_mapping(&bound, "Tick", "value").read,
        ReadAction::Bind(ValueMapping::Numeric {
            local: TypeDef::Int64,
            wire: TypeDef::Int32
        })
    );
    assert!(widening.bind(&remote, Direction::Outbound).is_err());

    let narrowing = SchemaBinder::new(local)
        .with_policy(BinderPolicy::default().with_numeric(NumericConversion::Narrowing));
    let bound = narrowing.bind(&remote, Direction::Both).expect("narrowing allowed");

    // Values that fit pass; others fail per message.
    let codec = Codec::new(bound).expect("codec");
    let ok = GroupValue::new("Tick").with("value", 42i64);
    let bytes = codec.encode_to_vec(&ok).expect("fits i32");
    assert_eq!(codec.decode_slice(&bytes).expect("decode"), ok);
    assert!(codec
        .encode_to_vec(&GroupValue::new("Tick").with("value", i64::MAX))
        .is_err());

    // Integer to float is never a numeric conversion.
    let float = single_field(TypeDef::Float64);
    assert!(narrowing.bind(&float, Direction::Both).is_err());
}

fn sides(symbols: &[(&str, i32)]) -> TypeDef {
    TypeDef::Enum(EnumType::new(
        symbols
            .iter()
            .map(|(name, id)| EnumSymbol::new(*name, *id))
            .collect(),
    ))
}

#[test]
fn test_enums_match_by_symbol_name() {
    let local = single_field(sides(&[("Buy", 1), ("Sell", 2)]));
    let remote = single_field(sides(&[("Sell", 1), ("Buy", 2), ("Short", 3)]));

    let bound = SchemaBinder::new(local.clone())
        .bind(&remote, Direction::Both)
        .expect("enum changes are compatible");
    let codec = Codec::new(bound).expect("codec");

    // Remote id 1 is "Sell", locally id 2.
    let sell = codec.decode_slice(&[0x02, 0x01, 0x01]).expect("decode");
    assert_eq!(sell.get("value"), Some(&Value::Enum(EnumValue::new(2, "Sell"))));
    let short = codec.decode_slice(&[0x02, 0x01, 0x03]).expect("decode");
    assert_eq!(short.get("value"), Some(&Value::Enum(EnumValue::unknown(3))));

    // Local id without a symbol name goes through the id translation.
    let buy = GroupValue::new("Tick").with("value", EnumValue {
        id: 1,
        symbol: None,
    });
    assert_eq!(codec.encode_to_vec(&buy).expect("encode"), vec![0x02, 0x01, 0x02]);

    let closed = SchemaBinder::new(local)
        .with_policy(BinderPolicy::default().with_unknown_enums(EnumPolicy::Closed))
        .bind(&remote, Direction::Both)
        .expect("compatible");
    let codec = Codec::new(closed).expect("codec");
    assert_eq!(
        codec.decode_slice(&[0x02, 0x01, 0x03]).unwrap_err().kind(),
        &DecodeErrorKind::UnknownEnumId(3)
    );
}

#[test]
fn test_time_types_must_agree() {
    use crate::types::{Epoch, TimeType, TimeUnit};
    let millis = single_field(TypeDef::Time(TimeType::new(TimeUnit::Milliseconds, Epoch::Unix)));
    let zoned = single_field(TypeDef::Time(
        TimeType::new(TimeUnit::Milliseconds, Epoch::Unix).with_timezone("+02:00"),
    ));
    let micros = single_field(TypeDef::Time(TimeType::new(TimeUnit::Microseconds, Epoch::Unix)));

    let binder = SchemaBinder::new(millis);
    assert!(binder.bind(&zoned, Direction::Both).is_ok());
    assert!(binder.bind(&micros, Direction::Both).is_err());
}

#[test]
fn test_unknown_fields_pass_through() {
    let v1 = position(None);
    let v2 = position(Some(FieldDef::optional("label", TypeDef::string())));
    let wire = Codec::new(v2.clone()).expect("codec");
    let original = GroupValue::new("Position")
        .with("quantity", Decimal::new(125, 1))
        .with("label", "north");
    let bytes = wire.encode_to_vec(&original).expect("encode");

    let bound = SchemaBinder::new(v1).bind(&v2, Direction::Both).expect("compatible");
    let view = Codec::new(bound).expect("codec");
    let decoded = view.decode_slice(&bytes).expect("decode");
    assert_eq!(decoded.get("quantity"), Some(&Value::Decimal(Decimal::new(125, 1))));
    assert!(decoded.get("label").is_none());
    assert_eq!(decoded.unknown_fields.len(), 1);

    assert_eq!(view.encode_to_vec(&decoded).expect("re-encode"), bytes);
}

#[test]
fn test_bindings_follow_local_elements() {
    let binding = Binding::new("PositionRecord");
    let local = Schema::builder()
        .group(
            GroupDef::new("Position")
                .with_id(1)
                .with_binding(binding.clone())
                .field(FieldDef::required("quantity", TypeDef::Decimal)),
        )
        .build()
        .expect("valid");
    let remote = position(None);
    let bound = SchemaBinder::new(local).bind(&remote, Direction::Both).expect("bind");
    let mapping = bound
        .group("Position")
        .and_then(|g| g.mapping.as_ref())
        .expect("mapping");
    assert_eq!(mapping.local_binding.as_ref(), Some(&binding));
    assert_eq!(
        mapping
            .local_binding
            .as_ref()
            .and_then(|b| b.downcast_ref::<&str>()),
        Some(&"PositionRecord")
    );
}

#[test]
fn test_remote_only_group_binds_as_is() {
    let local = position(None);
    let remote = Schema::builder()
        .group(GroupDef::new("Position").with_id(1).field(FieldDef::required("quantity", TypeDef::Decimal)))
        .group(GroupDef::new("Audit").with_id(2).field(FieldDef::optional("note", TypeDef::string())))
        .build()
        .expect("valid");
    let bound = SchemaBinder::new(local).bind(&remote, Direction::Both).expect("bind");
    let audit = bound.group("Audit").expect("group");
    assert_eq!(audit.mapping.as_ref().map(|m| m.matched), Some(false));
    assert!(field_mapping(&bound, "Audit", "note").is_identity());
}

fn hierarchy(x_on_base: bool, x: FieldDef) -> Schema {
    let (base, sub) = if x_on_base {
        (GroupDef::new("Base").with_id(1).field(x), GroupDef::new("Sub").with_id(2).extends("Base"))
    } else {
        (GroupDef::new("Base").with_id(1), GroupDef::new("Sub").with_id(2).extends("Base").field(x))
    };
    Schema::builder().group(base).group(sub).build().expect("valid schema")
}

#[test]
fn test_inherited_fields_match_across_levels() {
    // Declared on the base remotely, on the subgroup locally, and the reverse.
    for remote_on_base in [true, false] {
        let remote = hierarchy(remote_on_base, FieldDef::optional("x", TypeDef::Int32));
        let local = hierarchy(!remote_on_base, FieldDef::optional("x", TypeDef::Int32));
        let bytes = Codec::new(remote.clone())
            .expect("codec")
            .encode_to_vec(&GroupValue::new("Sub").with("x", 5i32))
            .expect("encode");

        let bound = SchemaBinder::new(local).bind(&remote, Direction::Inbound).expect("bind");
        let sub = bound.all_fields("Sub").expect("sub fields");
        assert!(sub[0].mapping.as_ref().is_some_and(FieldMapping::is_identity));

        let decoded = Codec::new(bound).expect("codec").decode_slice(&bytes).expect("decode");
        assert_eq!(decoded.get("x"), Some(&Value::I32(5)));
        assert!(decoded.unknown_fields.is_empty());
    }
}

#[test]
fn test_inherited_required_field_binds_on_subgroup() {
    let remote = hierarchy(true, FieldDef::required("x", TypeDef::Int32));
    let local = hierarchy(false, FieldDef::required("x", TypeDef::Int32));

    // Base messages carry `x`, which local Base does not know.
    let err = SchemaBinder::new(local.clone()).bind(&remote, Direction::Inbound).unwrap_err();
    assert_eq!(
        err.incompatibilities(),
        &[Incompatibility::field("Base", "x", IncompatibilityReason::RequiredFieldAdded)]
    );

    // Only Sub is received: local Sub knows `x`, so nothing is reported.
    let sub_only = DirectionClassifier::new(|element| match element {
        Element::Group(group) if group.name == "Base" => Direction::Outbound,
        _ => Direction::Both,
    });
    let bound = SchemaBinder::new(local)
        .with_classifier(sub_only)
        .bind(&remote, Direction::Inbound)
        .expect("bind");
    let codec = Codec::new(bound).expect("codec");
    let decoded = codec.decode_slice(&[0x02, 0x02, 0x07]).expect("decode");
    assert_eq!(decoded.get("x"), Some(&Value::I32(7)));
    assert!(decoded.unknown_fields.is_empty());
}

#[test]
fn test_local_closed_annotation_survives_binding() {
    let open = FieldDef::required("value", sides(&[("Buy", 1), ("Sell", 2)]));
    let closed = open.clone().with_annotation(crate::codec::CLOSED_ANNOTATION, "true");
    let local = Schema::builder()
        .group(GroupDef::new("Tick").with_id(1).field(closed))
        .build()
        .expect("valid");
    let remote = Schema::builder()
        .group(GroupDef::new("Tick").with_id(1).field(open))
        .build()
        .expect("valid");

    let bound = SchemaBinder::new(local).bind(&remote, Direction::Both).expect("bind");
    assert!(matches!(
        &field_mapping(&bound, "Tick", "value").read,
        ReadAction::Bind(ValueMapping::Enum(mapping)) if mapping.closed
    ));
    let codec = Codec::new(bound).expect("codec");
    assert_eq!(
        codec.decode_slice(&[0x02, 0x01, 0x07]).unwrap_err().kind(),
        &DecodeErrorKind::UnknownEnumId(7)
    );
    let unknown = GroupValue::new("Tick").with("value", EnumValue::unknown(7));
    assert!(codec.encode_to_vec(&unknown).is_err());
    assert!(codec.decode_slice(&[0x02, 0x01, 0x02]).is_ok());
}
