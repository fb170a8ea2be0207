// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec Benchmarks
//!
//! Measures encode/decode throughput of a representative order message:
//! - encode into a reused fixed buffer
//! - decode from a prepared buffer
//! - decode through a binder-derived view of a newer schema version

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use strata::{
    Codec, Decimal, Direction, EnumSymbol, EnumType, EnumValue, FieldDef, FixedBuffer, GroupDef,
    GroupValue, Schema, SchemaBinder, Timestamp, TimeType, TimeUnit, TypeDef, Value, Epoch,
};

fn order_schema(with_note: bool) -> Schema {
    let mut order = GroupDef::new("Order")
        .with_id(1)
        .field(FieldDef::required("id", TypeDef::UInt64))
        .field(FieldDef::required("symbol", TypeDef::string()))
        .field(FieldDef::required("price", TypeDef::SmallDecimal))
        .field(FieldDef::required("quantity", TypeDef::Decimal))
        .field(FieldDef::required(
            "side",
            TypeDef::Enum(EnumType::new(vec![
                EnumSymbol::new("Buy", 1),
                EnumSymbol::new("Sell", 2),
            ])),
        ))
        .field(FieldDef::required(
            "sent",
            TypeDef::Time(TimeType::new(TimeUnit::Microseconds, Epoch::Unix)),
        ))
        .field(FieldDef::required("fills", TypeDef::sequence(TypeDef::Int64)));
    if with_note {
        order = order.field(FieldDef::optional("note", TypeDef::string()));
    }
    Schema::builder().group(order).build().expect("valid schema")
}

fn order() -> GroupValue {
    GroupValue::new("Order")
        .with("id", 981_234_u64)
        .with("symbol", "ACME")
        .with("price", Decimal::new(10_125, 2))
        .with("quantity", Decimal::new(500, 0))
        .with("side", EnumValue::new(2, "Sell"))
        .with("sent", Timestamp::new(1_700_000_000, 123_456_000))
        .with(
            "fills",
            (0..16).map(|n| Value::I64(n * 100)).collect::<Vec<_>>(),
        )
}

fn bench_encode(c: &mut Criterion) {
    let codec = Codec::new(order_schema(false)).expect("codec");
    let value = order();
    let size = codec.encode_to_vec(&value).expect("encode").len();
    let mut buffer = FixedBuffer::allocate(1024);

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("encode_order", |b| {
        b.iter(|| {
            buffer.clear();
            codec
                .encode(black_box(&value), &mut buffer)
                .expect("encode");
        })
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let codec = Codec::new(order_schema(false)).expect("codec");
    let bytes = codec.encode_to_vec(&order()).expect("encode");
    let mut buffer = FixedBuffer::from_bytes(bytes.clone());

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("decode_order", |b| {
        b.iter(|| {
            buffer.set_position(0).expect("rewind");
            black_box(codec.decode(&mut buffer).expect("decode"));
        })
    });
    group.finish();
}

fn bench_bound_decode(c: &mut Criterion) {
    let newer = order_schema(true);
    let writer = Codec::new(newer.clone()).expect("codec");
    let bytes = writer
        .encode_to_vec(&order().with("note", "routed via venue 7"))
        .expect("encode");
    let bound = SchemaBinder::new(order_schema(false))
        .bind(&newer, Direction::Inbound)
        .expect("compatible");
    let view = Codec::new(bound).expect("codec");

    c.bench_function("decode_order_bound_view", |b| {
        b.iter(|| black_box(view.decode_slice(black_box(&bytes)).expect("decode")))
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_bound_decode);
criterion_main!(benches);
