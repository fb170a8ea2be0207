// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Schema evolution end to end: two peers on different schema versions,
// exchanging schemas over the wire and binding against each other.

use strata::binder::ReadAction;
use strata::buffer::GrowableBuffer;
use strata::meta::{read_schema, write_schema};
use strata::{
    decode_schema, encode_schema, Codec, Decimal, Direction, DirectionClassifier, FieldDef,
    GroupDef, GroupValue, IncompatibilityReason, Schema, SchemaBinder, TypeDef, Value,
};

fn position_v1() -> Schema {
    Schema::builder()
        .group(
            GroupDef::new("Position")
                .with_id(1)
                .field(FieldDef::required("quantity", TypeDef::Decimal)),
        )
        .build()
        .expect("valid v1")
}

fn position_v2() -> Schema {
    Schema::builder()
        .group(
            GroupDef::new("Position")
                .with_id(1)
                .field(FieldDef::required("quantity", TypeDef::Decimal))
                .field(FieldDef::optional("label", TypeDef::string())),
        )
        .build()
        .expect("valid v2")
}

fn quantity() -> Value {
    Value::Decimal(Decimal::new(4200, 2))
}

#[test]
fn v1_message_read_by_v2_consumer() {
    let v1 = Codec::new(position_v1()).expect("codec");
    let bytes = v1
        .encode_to_vec(&GroupValue::new("Position").with("quantity", quantity()))
        .expect("encode");

    // v2 consumer reading v1-shaped data.
    let view = SchemaBinder::new(position_v2())
        .bind(&position_v1(), Direction::Inbound)
        .expect("optional field may be missing");
    let decoded = Codec::new(view).expect("codec").decode_slice(&bytes).expect("decode");
    assert_eq!(decoded.get("quantity"), Some(&quantity()));
    assert!(decoded.get("label").is_none());
}

#[test]
fn v2_message_read_by_v1_consumer() {
    let v2 = Codec::new(position_v2()).expect("codec");
    let bytes = v2
        .encode_to_vec(
            &GroupValue::new("Position")
                .with("quantity", quantity())
                .with("label", "hedge"),
        )
        .expect("encode");
    assert!(bytes.windows(5).any(|w| w == b"hedge"));

    let view = SchemaBinder::new(position_v1())
        .bind(&position_v2(), Direction::Inbound)
        .expect("compatible");
    let decoded = Codec::new(view).expect("codec").decode_slice(&bytes).expect("decode");
    assert_eq!(decoded.get("quantity"), Some(&quantity()));
    assert!(decoded.get("label").is_none());
    assert_eq!(decoded.fields.len(), 1);

    // A plain v1 codec also reads it: the rest of the body is skipped.
    let plain = Codec::new(position_v1()).expect("codec");
    let mut buffer = strata::FixedBuffer::from_bytes(bytes.clone());
    let decoded = plain.decode(&mut buffer).expect("decode");
    assert_eq!(decoded.get("quantity"), Some(&quantity()));
    assert_eq!(buffer.position(), bytes.len());
}

#[test]
fn required_addition_breaks_inbound_only_when_decoding() {
    let v2_required = Schema::builder()
        .group(
            GroupDef::new("Position")
                .with_id(1)
                .field(FieldDef::required("quantity", TypeDef::Decimal))
                .field(FieldDef::required("label", TypeDef::string())),
        )
        .build()
        .expect("valid");

    let err = SchemaBinder::new(position_v1())
        .bind(&v2_required, Direction::Inbound)
        .unwrap_err();
    assert!(err.has(
        "Position",
        Some("label"),
        IncompatibilityReason::RequiredFieldAdded
    ));

    // Newer peer reading older data is missing a required field.
    let err = SchemaBinder::new(v2_required)
        .bind(&position_v1(), Direction::Inbound)
        .unwrap_err();
    assert!(err.has(
        "Position",
        Some("label"),
        IncompatibilityReason::RequiredFieldMissing
    ));
}

#[test]
fn groups_match_by_name_not_id() {
    let local = position_v1();
    let remote = Schema::builder()
        .group(GroupDef::new("Heartbeat").with_id(1))
        .group(
            GroupDef::new("Position")
                .with_id(9)
                .field(FieldDef::required("quantity", TypeDef::Decimal)),
        )
        .build()
        .expect("valid");

    let bound = SchemaBinder::new(local)
        .bind(&remote, Direction::Both)
        .expect("compatible");
    let codec = Codec::new(bound).expect("codec");
    let bytes = codec
        .encode_to_vec(&GroupValue::new("Position").with("quantity", quantity()))
        .expect("encode");
    // The remote id is used on the wire.
    assert_eq!(bytes[1], 9);
}

#[test]
fn schema_exchange_then_bind() {
    // The producer ships its schema ahead of the data in one stream.
    let producer_schema = position_v2();
    let producer = Codec::new(producer_schema.clone()).expect("codec");
    let mut stream = GrowableBuffer::growable(128);
    write_schema(&producer_schema, &mut stream).expect("schema");
    producer
        .encode(
            &GroupValue::new("Position")
                .with("quantity", quantity())
                .with("label", "carry"),
            &mut stream,
        )
        .expect("data");
    stream.flip();

    let received = read_schema(&mut stream).expect("schema");
    let view = SchemaBinder::new(position_v1())
        .bind(&received, Direction::Inbound)
        .expect("compatible");
    let decoded = Codec::new(view).expect("codec").decode(&mut stream).expect("data");
    assert_eq!(decoded.get("quantity"), Some(&quantity()));
    assert_eq!(decoded.unknown_fields.len(), 1);
    assert!(!stream.has_remaining());

    // Standalone encoding round-trips too.
    let bytes = encode_schema(&received).expect("encode");
    assert_eq!(decode_schema(&bytes).expect("decode"), received);
}

#[test]
fn direction_classified_fields_are_exempt() {
    let local = Schema::builder()
        .group(
            GroupDef::new("Position")
                .with_id(1)
                .field(FieldDef::required("quantity", TypeDef::Decimal))
                .field(
                    FieldDef::required("audit", TypeDef::string())
                        .with_annotation("flow", "outbound"),
                ),
        )
        .group(GroupDef::new("Ack").with_id(2).with_annotation("flow", "inbound"))
        .build()
        .expect("valid");
    let binder =
        SchemaBinder::new(local).with_classifier(DirectionClassifier::by_annotation("flow"));

    // Inbound: the outbound-only field is never decoded.
    assert!(binder.bind(&position_v1(), Direction::Inbound).is_ok());
    // Outbound: the inbound-only group is never sent, the field is dropped.
    assert!(binder.bind(&position_v1(), Direction::Outbound).is_ok());
}

#[test]
fn retention_can_be_turned_off() {
    let view = SchemaBinder::new(position_v1())
        .with_policy(strata::BinderPolicy::default().with_retain_unknown_fields(false))
        .bind(&position_v2(), Direction::Inbound)
        .expect("compatible");
    let label = view
        .group("Position")
        .and_then(|g| g.declared_field("label"))
        .and_then(|f| f.mapping.as_ref())
        .map(|m| m.read.clone());
    assert_eq!(label, Some(ReadAction::Skip));

    let v2 = Codec::new(position_v2()).expect("codec");
    let bytes = v2
        .encode_to_vec(
            &GroupValue::new("Position")
                .with("quantity", quantity())
                .with("label", "x"),
        )
        .expect("encode");
    let decoded = Codec::new(view).expect("codec").decode_slice(&bytes).expect("decode");
    assert!(decoded.unknown_fields.is_empty());
}
