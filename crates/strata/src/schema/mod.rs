// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Immutable schema model.
//!
//! Raw [`GroupDef`]/[`NamedType`] definitions go through [`SchemaBuilder`],
//! which validates every invariant eagerly and freezes them into a shareable
//! [`Schema`]:
//!
//! - group names unique, explicit group ids unique
//! - field names and ids unique per group across the inheritance chain
//! - super-groups, references and aliases resolve, without cycles
//! - enum ids and symbols unique, time types legal

mod builder;
mod errors;
mod model;
mod source;

pub use builder::SchemaBuilder;
pub use errors::{SchemaDefinitionError, SchemaViolation};
pub use model::{Annotations, Binding, FieldDef, GroupDef, NamedType, Schema};
pub use source::{Described, DescribedTypes, SchemaSource};
