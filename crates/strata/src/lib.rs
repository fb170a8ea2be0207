// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Strata - schema-driven binary messages with schema evolution
//!
//! Strata encodes structured messages into a compact binary form driven by an
//! explicit [`Schema`], and lets two parties with different versions of that
//! schema keep talking: the [`SchemaBinder`] reconciles a local schema with a
//! peer's schema and produces a bound schema that a [`Codec`] uses to read
//! and write the peer's wire shape with local values.
//!
//! ## Quick Start
//!
//! ```rust
//! use strata::{Codec, FieldDef, GroupDef, GroupValue, Schema, TypeDef};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = Schema::builder()
//!         .group(
//!             GroupDef::new("Position")
//!                 .with_id(1)
//!                 .field(FieldDef::required("quantity", TypeDef::Decimal))
//!                 .field(FieldDef::optional("label", TypeDef::string())),
//!         )
//!         .build()?;
//!
//!     let codec = Codec::new(schema)?;
//!     let value = GroupValue::new("Position").with("quantity", strata::Decimal::new(125, 1));
//!     let bytes = codec.encode_to_vec(&value)?;
//!     assert_eq!(codec.decode_slice(&bytes)?, value);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  meta      self-describing schema exchange (schemas as messages)    |
//! +---------------------------------------------------------------------+
//! |  binder    local vs remote schema -> bound schema + mappings        |
//! +---------------------------------------------------------------------+
//! |  codec     framing, varints, presence flags, per-kind encodings     |
//! +---------------------------------------------------------------------+
//! |  schema    groups, fields, named types, validation                  |
//! |  types     TypeDef sum type, enums, time units and epochs           |
//! +---------------------------------------------------------------------+
//! |  buffer    cursor buffers over fixed, growable and pooled storage   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`schema`] - schema model and builder (start here)
//! - [`codec`] - binary encoder/decoder
//! - [`binder`] - schema evolution
//! - [`meta`] - schema exchange over the wire
//! - [`buffer`] - byte buffers and pooling
//! - [`config`] - codec, binder and pool configuration

/// Schema binder: reconciles local and remote schema versions.
pub mod binder;
/// Byte buffers with explicit position/limit and a segment pool.
pub mod buffer;
/// Binary wire codec.
pub mod codec;
/// Codec, binder and pool configuration (optionally YAML-loaded).
pub mod config;
/// Self-describing schema exchange.
pub mod meta;
/// Schema model, builder and validation.
pub mod schema;
/// Type definitions.
pub mod types;
/// In-memory values.
pub mod value;

pub use binder::{
    Direction, DirectionClassifier, Element, Incompatibility, IncompatibilityReason,
    IncompatibleSchemaError, SchemaBinder,
};
pub use buffer::{Buffer, BufferError, BufferPool, FixedBuffer, GrowableBuffer};
pub use codec::{Codec, CodecError, DecodeError, EncodeError};
pub use config::{BinderPolicy, CodecConfig, StrataConfig};
pub use meta::{decode_schema, encode_schema, MetaError};
pub use schema::{FieldDef, GroupDef, NamedType, Schema, SchemaBuilder, SchemaDefinitionError};
pub use types::{EnumSymbol, EnumType, Epoch, TimeType, TimeUnit, TypeDef};
pub use value::{BigDecimal, BigInt, Decimal, EnumValue, GroupValue, Timestamp, Value};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
