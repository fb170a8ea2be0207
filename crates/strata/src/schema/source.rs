// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host-side schema sources.
//!
//! Anything able to describe host types as group definitions (hand-written
//! code, generated code, an IDL compiler) implements [`SchemaSource`]; the
//! core does no introspection of its own.

use super::builder::SchemaBuilder;
use super::model::{GroupDef, NamedType};

/// Producer of raw schema definitions.
pub trait SchemaSource {
    /// Add this source's definitions to `builder`.
    fn describe(&self, builder: SchemaBuilder) -> SchemaBuilder;
}

/// A host type that knows its own group definition.
pub trait Described {
    fn group_def() -> GroupDef;
}

impl SchemaSource for [GroupDef] {
    fn describe(&self, builder: SchemaBuilder) -> SchemaBuilder {
        self.iter()
            .cloned()
            .fold(builder, |builder, group| builder.group(group))
    }
}

impl SchemaSource for Vec<GroupDef> {
    fn describe(&self, builder: SchemaBuilder) -> SchemaBuilder {
        self.as_slice().describe(builder)
    }
}

impl SchemaSource for [NamedType] {
    fn describe(&self, builder: SchemaBuilder) -> SchemaBuilder {
        self.iter()
            .cloned()
            .fold(builder, |builder, named| builder.named_type(named))
    }
}

impl<A: SchemaSource + ?Sized, B: SchemaSource + ?Sized> SchemaSource for (&A, &B) {
    fn describe(&self, builder: SchemaBuilder) -> SchemaBuilder {
        self.1.describe(self.0.describe(builder))
    }
}

/// Schema source over a list of [`Described`] host types.
///
/// ```ignore
/// let source = DescribedTypes::new().with::<Order>().with::<Fill>();
/// let schema = Schema::from_source(&source)?;
/// ```
#[derive(Debug, Default, Clone)]
pub struct DescribedTypes {
    groups: Vec<GroupDef>,
}

impl DescribedTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Described>(mut self) -> Self {
        self.groups.push(T::group_def());
        self
    }
}

impl SchemaSource for DescribedTypes {
    fn describe(&self, builder: SchemaBuilder) -> SchemaBuilder {
        self.groups.describe(builder)
    }
}
