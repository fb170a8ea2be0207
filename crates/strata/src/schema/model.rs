// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema data model: groups, fields, named types and the frozen [`Schema`].

use super::builder::SchemaBuilder;
use super::errors::SchemaDefinitionError;
use super::source::SchemaSource;
use crate::binder::{FieldMapping, GroupMapping};
use crate::types::TypeDef;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

pub type Annotations = BTreeMap<String, String>;

/// Opaque host-side association attached to a schema element.
///
/// The core never looks inside; hosts downcast it back.
#[derive(Clone)]
pub struct Binding(Arc<dyn Any + Send + Sync>);

impl Binding {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Binding(..)")
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Member of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub id: Option<u32>,
    pub required: bool,
    pub type_def: TypeDef,
    pub annotations: Annotations,
    pub binding: Option<Binding>,
    /// Set on schemas produced by the binder.
    pub mapping: Option<FieldMapping>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, type_def: TypeDef, required: bool) -> Self {
        Self {
            name: name.into(),
            id: None,
            required,
            type_def,
            annotations: Annotations::new(),
            binding: None,
            mapping: None,
        }
    }

    pub fn required(name: impl Into<String>, type_def: TypeDef) -> Self {
        Self::new(name, type_def, true)
    }

    pub fn optional(name: impl Into<String>, type_def: TypeDef) -> Self {
        Self::new(name, type_def, false)
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// Message type: a named, optionally numbered list of fields with at most
/// one super-group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDef {
    pub name: String,
    pub id: Option<u32>,
    pub super_group: Option<String>,
    /// Declared fields only; inherited ones live on the super-group.
    pub fields: Vec<FieldDef>,
    pub annotations: Annotations,
    pub binding: Option<Binding>,
    /// Set on schemas produced by the binder.
    pub mapping: Option<GroupMapping>,
}

impl GroupDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            super_group: None,
            fields: Vec::new(),
            annotations: Annotations::new(),
            binding: None,
            mapping: None,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn extends(mut self, super_group: impl Into<String>) -> Self {
        self.super_group = Some(super_group.into());
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn declared_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// Alias from a name to a type.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    pub name: String,
    pub type_def: TypeDef,
    pub annotations: Annotations,
}

impl NamedType {
    pub fn new(name: impl Into<String>, type_def: TypeDef) -> Self {
        Self {
            name: name.into(),
            type_def,
            annotations: Annotations::new(),
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Frozen, validated set of groups and named types.
///
/// Cloning is cheap; all clones share the same definitions. Evolution always
/// produces a new `Schema`.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    groups: Vec<GroupDef>,
    named_types: Vec<NamedType>,
    annotations: Annotations,
    binding: Option<Binding>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<u32, usize>,
    named_by_name: HashMap<String, usize>,
    /// Inherited fields first, then declared ones, per group index.
    all_fields: Vec<Vec<FieldDef>>,
    /// Strict subgroups per group index, in declaration order.
    subgroups: Vec<Vec<usize>>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("groups", &self.inner.groups)
            .field("named_types", &self.inner.named_types)
            .field("annotations", &self.inner.annotations)
            .finish()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.groups == other.inner.groups
                && self.inner.named_types == other.inner.named_types
                && self.inner.annotations == other.inner.annotations)
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Build a schema from a host-side schema source.
    pub fn from_source<S: SchemaSource + ?Sized>(
        source: &S,
    ) -> Result<Schema, SchemaDefinitionError> {
        source.describe(SchemaBuilder::new()).build()
    }

    /// Freeze already-validated definitions and compute lookup indexes.
    ///
    /// Callers guarantee the invariants hold (acyclic super-groups in
    /// particular).
    pub(crate) fn assemble(
        groups: Vec<GroupDef>,
        named_types: Vec<NamedType>,
        annotations: Annotations,
        binding: Option<Binding>,
    ) -> Schema {
        Self::assemble_with_fields(groups, named_types, annotations, binding, None)
    }

    /// Like [`assemble`](Self::assemble), with the full field list of every
    /// group given explicitly (same order as `groups`).
    ///
    /// Bound schemas use this: an inherited field can carry a different
    /// mapping in each subgroup, so it cannot be copied from the declaring
    /// group.
    pub(crate) fn assemble_with_fields(
        groups: Vec<GroupDef>,
        named_types: Vec<NamedType>,
        annotations: Annotations,
        binding: Option<Binding>,
        flattened: Option<Vec<Vec<FieldDef>>>,
    ) -> Schema {
        let by_name: HashMap<String, usize> = groups
            .iter()
            .enumerate()
            .map(|(index, group)| (group.name.clone(), index))
            .collect();
        let by_id = groups
            .iter()
            .enumerate()
            .filter_map(|(index, group)| group.id.map(|id| (id, index)))
            .collect();
        let named_by_name = named_types
            .iter()
            .enumerate()
            .map(|(index, named)| (named.name.clone(), index))
            .collect();

        let chains: Vec<Vec<usize>> = (0..groups.len())
            .map(|index| ancestry(&groups, &by_name, index))
            .collect();

        let all_fields = match flattened {
            Some(fields) if fields.len() == groups.len() => fields,
            _ => chains
                .iter()
                .map(|chain| {
                    chain
                        .iter()
                        .rev()
                        .flat_map(|ancestor| groups[*ancestor].fields.iter().cloned())
                        .collect()
                })
                .collect(),
        };

        let mut subgroups = vec![Vec::new(); groups.len()];
        for (index, chain) in chains.iter().enumerate() {
            for ancestor in chain.iter().skip(1) {
                subgroups[*ancestor].push(index);
            }
        }

        Schema {
            inner: Arc::new(SchemaInner {
                groups,
                named_types,
                annotations,
                binding,
                by_name,
                by_id,
                named_by_name,
                all_fields,
                subgroups,
            }),
        }
    }

    pub fn groups(&self) -> &[GroupDef] {
        &self.inner.groups
    }

    pub fn named_types(&self) -> &[NamedType] {
        &self.inner.named_types
    }

    pub fn annotations(&self) -> &Annotations {
        &self.inner.annotations
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.inner.annotations.get(key).map(String::as_str)
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.inner.binding.as_ref()
    }

    pub fn group(&self, name: &str) -> Option<&GroupDef> {
        self.inner
            .by_name
            .get(name)
            .map(|index| &self.inner.groups[*index])
    }

    pub fn group_by_id(&self, id: u32) -> Option<&GroupDef> {
        self.inner
            .by_id
            .get(&id)
            .map(|index| &self.inner.groups[*index])
    }

    pub fn named_type(&self, name: &str) -> Option<&NamedType> {
        self.inner
            .named_by_name
            .get(name)
            .map(|index| &self.inner.named_types[*index])
    }

    /// Fields of `group` with inherited ones first, root ancestor first.
    pub fn all_fields(&self, group: &str) -> Option<&[FieldDef]> {
        self.inner
            .by_name
            .get(group)
            .map(|index| self.inner.all_fields[*index].as_slice())
    }

    /// Follow named-type aliases to a concrete type.
    ///
    /// Returns `None` only for an unknown alias.
    pub fn resolve<'a>(&'a self, type_def: &'a TypeDef) -> Option<&'a TypeDef> {
        let mut current = type_def;
        // Bounded by the alias count; validated schemas have no alias cycles.
        for _ in 0..=self.inner.named_types.len() {
            match current {
                TypeDef::Named(alias) => current = &self.named_type(alias)?.type_def,
                concrete => return Some(concrete),
            }
        }
        None
    }

    /// Group targeted by a (possibly aliased) static or dynamic reference.
    pub fn resolve_group(&self, type_def: &TypeDef) -> Option<&GroupDef> {
        match self.resolve(type_def)? {
            TypeDef::Reference(name) | TypeDef::DynamicReference(Some(name)) => self.group(name),
            _ => None,
        }
    }

    /// Groups whose super-group chain includes `base`, excluding `base`.
    pub fn dynamic_subgroups(&self, base: &str) -> Vec<&GroupDef> {
        match self.inner.by_name.get(base) {
            Some(index) => self.inner.subgroups[*index]
                .iter()
                .map(|sub| &self.inner.groups[*sub])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether `group` is `base` or inherits from it.
    pub fn is_subgroup_of(&self, group: &str, base: &str) -> bool {
        let mut current = self.group(group);
        for _ in 0..=self.inner.groups.len() {
            match current {
                Some(def) if def.name == base => return true,
                Some(def) => current = def.super_group.as_deref().and_then(|s| self.group(s)),
                None => return false,
            }
        }
        false
    }

    /// Copy of this schema where every id-less group receives an id.
    ///
    /// Ids are handed out in declaration order from a counter starting at 1,
    /// skipping ids already taken by explicit assignments.
    pub fn assign_group_ids(&self) -> Schema {
        let mut next = 1u32;
        let mut groups = self.inner.groups.clone();
        for group in groups.iter_mut().filter(|group| group.id.is_none()) {
            while self.inner.by_id.contains_key(&next) {
                next += 1;
            }
            log::debug!("[SCHEMA] assigned id {} to group '{}'", next, group.name);
            group.id = Some(next);
            next += 1;
        }
        Schema::assemble_with_fields(
            groups,
            self.inner.named_types.clone(),
            self.inner.annotations.clone(),
            self.inner.binding.clone(),
            Some(self.inner.all_fields.clone()),
        )
    }

    /// Whether any element carries a host binding or binder mapping.
    pub fn is_bound(&self) -> bool {
        self.inner.binding.is_some()
            || self.inner.groups.iter().any(|group| {
                group.binding.is_some()
                    || group.mapping.is_some()
                    || group
                        .fields
                        .iter()
                        .any(|field| field.binding.is_some() || field.mapping.is_some())
            })
    }

    /// Builder seeded with this schema's definitions.
    pub fn to_builder(&self) -> SchemaBuilder {
        let mut builder = SchemaBuilder::new();
        for named in &self.inner.named_types {
            builder = builder.named_type(named.clone());
        }
        for group in &self.inner.groups {
            builder = builder.group(group.clone());
        }
        for (key, value) in &self.inner.annotations {
            builder = builder.annotation(key.clone(), value.clone());
        }
        if let Some(binding) = &self.inner.binding {
            builder = builder.binding(binding.clone());
        }
        builder
    }
}

/// Indexes of `index` and its ancestors, nearest first.
fn ancestry(groups: &[GroupDef], by_name: &HashMap<String, usize>, index: usize) -> Vec<usize> {
    let mut chain = vec![index];
    let mut current = index;
    while let Some(parent) = groups[current]
        .super_group
        .as_ref()
        .and_then(|name| by_name.get(name))
    {
        if chain.contains(parent) {
            break;
        }
        chain.push(*parent);
        current = *parent;
    }
    chain
}
