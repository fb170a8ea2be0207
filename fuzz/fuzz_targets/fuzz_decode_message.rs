// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use strata::{
    Codec, EnumSymbol, EnumType, Epoch, FieldDef, FixedBuffer, GroupDef, Schema, TimeType,
    TimeUnit, TypeDef,
};

fn codec() -> &'static Codec {
    static CODEC: OnceLock<Codec> = OnceLock::new();
    CODEC.get_or_init(|| {
        let schema = Schema::builder()
            .group(
                GroupDef::new("Node")
                    .with_id(1)
                    .field(FieldDef::required("value", TypeDef::Int32))
                    .field(FieldDef::optional("next", TypeDef::reference("Node"))),
            )
            .group(
                GroupDef::new("Shape")
                    .with_id(2)
                    .field(FieldDef::required("name", TypeDef::string()))
                    .field(FieldDef::optional("tags", TypeDef::sequence(TypeDef::string()))),
            )
            .group(
                GroupDef::new("Circle")
                    .with_id(3)
                    .extends("Shape")
                    .field(FieldDef::required("radius", TypeDef::Float64)),
            )
            .group(
                GroupDef::new("Frame")
                    .with_id(4)
                    .field(FieldDef::required("shape", TypeDef::dynamic("Shape")))
                    .field(FieldDef::required("price", TypeDef::Decimal))
                    .field(FieldDef::optional("total", TypeDef::BigDecimal))
                    .field(FieldDef::optional(
                        "at",
                        TypeDef::Time(TimeType::new(TimeUnit::Nanoseconds, Epoch::Unix)),
                    ))
                    .field(FieldDef::optional(
                        "side",
                        TypeDef::Enum(EnumType::new(vec![
                            EnumSymbol::new("Buy", 1),
                            EnumSymbol::new("Sell", 2),
                        ])),
                    ))
                    .field(FieldDef::optional("blob", TypeDef::binary())),
            )
            .build()
            .expect("fuzz schema is valid");
        Codec::new(schema).expect("fuzz schema has group ids")
    })
}

fuzz_target!(|data: &[u8]| {
    let codec = codec();
    let mut buffer = FixedBuffer::from_bytes(data.to_vec());

    // Decode every message in the input; a decoded value must re-encode.
    while buffer.has_remaining() {
        let start = buffer.position();
        match codec.decode(&mut buffer) {
            Ok(value) => {
                let _ = codec.encode_to_vec(&value);
            }
            Err(_) if buffer.position() == start => break,
            Err(_) => {}
        }
    }
});
