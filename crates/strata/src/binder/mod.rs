// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema binder: reconciles a local schema with a remote wire schema.
//!
//! The binder matches groups and fields **by name** (ids may be assigned
//! independently on each side) and produces a new [`Schema`] that keeps the
//! remote wire shape while every group and field carries a mapping back to
//! the local definitions. A [`Codec`](crate::codec::Codec) built over that
//! schema talks the remote's wire format with local values.
//!
//! Checks depend on the traffic direction being bound and on the direction
//! each element is classified with:
//!
//! | Situation                             | Inbound (decode)         | Outbound (encode)       |
//! |---------------------------------------|--------------------------|-------------------------|
//! | local-only required field             | `RequiredFieldMissing`   | dropped                 |
//! | remote-only required field            | `RequiredFieldAdded` [1] | `RequiredFieldAdded`    |
//! | local required, remote optional       | `RequiredFieldMissing`   | -                       |
//! | local optional, remote required       | -                        | `RequiredFieldAdded`    |
//! | kind change                           | `TypeMismatch` [2]       | `TypeMismatch` [2]      |
//! | local-only group                      | -                        | `GroupMissing`          |
//!
//! [1] unless `BinderPolicy::tolerate_unknown_required`.
//! [2] numeric changes may be allowed by `BinderPolicy::numeric`.
//!
//! Every mismatch is collected; binding fails once, with all of them.

mod errors;
mod mapping;

pub use errors::{Incompatibility, IncompatibilityReason, IncompatibleSchemaError};
pub use mapping::{
    Direction, EnumMapping, FieldMapping, GroupMapping, ReadAction, ValueMapping, WriteAction,
};

use crate::codec::CLOSED_ANNOTATION;
use crate::config::{BinderPolicy, EnumPolicy, NumericConversion};
use crate::schema::{FieldDef, GroupDef, Schema};
use crate::types::{EnumType, TypeDef};
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Direction classification
// ---------------------------------------------------------------------------

/// Schema element handed to a [`DirectionClassifier`].
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Group(&'a GroupDef),
    Field {
        group: &'a GroupDef,
        field: &'a FieldDef,
    },
}

impl<'a> Element<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            Element::Group(group) => &group.name,
            Element::Field { field, .. } => &field.name,
        }
    }

    pub fn annotation(&self, key: &str) -> Option<&'a str> {
        match *self {
            Element::Group(group) => group.annotation(key),
            Element::Field { field, .. } => field.annotation(key),
        }
    }
}

type ClassifyFn = dyn Fn(&Element<'_>) -> Direction + Send + Sync;

/// Caller-supplied mapping from schema elements to the direction they
/// travel in. Unclassified elements travel both ways.
#[derive(Clone)]
pub struct DirectionClassifier(Arc<ClassifyFn>);

impl DirectionClassifier {
    pub fn new<F>(classify: F) -> Self
    where
        F: Fn(&Element<'_>) -> Direction + Send + Sync + 'static,
    {
        Self(Arc::new(classify))
    }

    /// Read the direction from annotation `key` (`inbound`, `outbound` or
    /// `both`); missing or unparsable values mean [`Direction::Both`].
    pub fn by_annotation(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(move |element| {
            element
                .annotation(&key)
                .and_then(Direction::parse)
                .unwrap_or_default()
        })
    }

    pub fn classify(&self, element: &Element<'_>) -> Direction {
        (self.0)(element)
    }
}

impl Default for DirectionClassifier {
    fn default() -> Self {
        Self::new(|_| Direction::Both)
    }
}

impl fmt::Debug for DirectionClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DirectionClassifier(..)")
    }
}

// ---------------------------------------------------------------------------
// Binder
// ---------------------------------------------------------------------------

/// Binds remote schemas against one local schema.
#[derive(Debug, Clone)]
pub struct SchemaBinder {
    local: Schema,
    policy: BinderPolicy,
    classifier: DirectionClassifier,
}

impl SchemaBinder {
    pub fn new(local: Schema) -> Self {
        Self {
            local,
            policy: BinderPolicy::default(),
            classifier: DirectionClassifier::default(),
        }
    }

    pub fn with_policy(mut self, policy: BinderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_classifier(mut self, classifier: DirectionClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn local(&self) -> &Schema {
        &self.local
    }

    pub fn policy(&self) -> &BinderPolicy {
        &self.policy
    }

    /// Bind `remote` for `traffic`: [`Direction::Inbound`] when this side
    /// decodes remote-shaped messages, [`Direction::Outbound`] when it
    /// encodes them, [`Direction::Both`] for both.
    pub fn bind(
        &self,
        remote: &Schema,
        traffic: Direction,
    ) -> Result<Schema, IncompatibleSchemaError> {
        log::debug!(
            "[BINDER] binding {} local group(s) against {} remote group(s) for {:?} traffic",
            self.local.groups().len(),
            remote.groups().len(),
            traffic
        );
        let mut pass = BindPass {
            local: &self.local,
            remote,
            policy: &self.policy,
            classifier: &self.classifier,
            traffic,
            found: Vec::new(),
        };
        let (groups, flattened): (Vec<GroupDef>, Vec<Vec<FieldDef>>) = remote
            .groups()
            .iter()
            .map(|group| pass.bind_group(group))
            .unzip();
        pass.check_local_only_groups();

        if !pass.found.is_empty() {
            log::debug!(
                "[BINDER] binding failed with {} incompatibilities",
                pass.found.len()
            );
            return Err(IncompatibleSchemaError {
                incompatibilities: pass.found,
            });
        }
        Ok(Schema::assemble_with_fields(
            groups,
            remote.named_types().to_vec(),
            remote.annotations().clone(),
            self.local.binding().cloned(),
            Some(flattened),
        ))
    }
}

/// State of one `bind` call.
struct BindPass<'a> {
    local: &'a Schema,
    remote: &'a Schema,
    policy: &'a BinderPolicy,
    classifier: &'a DirectionClassifier,
    traffic: Direction,
    found: Vec<Incompatibility>,
}

impl<'a> BindPass<'a> {
    fn report(&mut self, incompatibility: Incompatibility) {
        if !self.found.contains(&incompatibility) {
            log::warn!("[BINDER] incompatible: {}", incompatibility);
            self.found.push(incompatibility);
        }
    }

    fn field_direction(
        &self,
        group: &GroupDef,
        field: &FieldDef,
        group_direction: Option<Direction>,
    ) -> Option<Direction> {
        group_direction?.intersect(self.classifier.classify(&Element::Field { group, field }))
    }

    /// Remote group with its mappings, plus the group's full field list
    /// (inherited fields first) carrying mappings bound for this group.
    ///
    /// An inherited field is matched against the local group of the same
    /// name, so a field can be declared on different levels of the hierarchy
    /// on each side.
    fn bind_group(&mut self, remote_group: &'a GroupDef) -> (GroupDef, Vec<FieldDef>) {
        let local = self.local;
        let remote = self.remote;
        let mut bound = remote_group.clone();
        let mut flattened = remote.all_fields(&remote_group.name).unwrap_or(&[]).to_vec();

        let Some(local_group) = local.group(&remote_group.name) else {
            log::debug!("[BINDER] remote-only group '{}' bound as-is", remote_group.name);
            for field in bound.fields.iter_mut().chain(flattened.iter_mut()) {
                field.mapping = Some(FieldMapping::identity());
            }
            bound.mapping = Some(GroupMapping::default());
            return (bound, flattened);
        };

        let group_direction = self
            .traffic
            .intersect(self.classifier.classify(&Element::Group(local_group)));
        let local_fields = local.all_fields(&local_group.name).unwrap_or(&[]);

        for remote_field in flattened.iter_mut() {
            let mapping = match local_fields.iter().find(|f| f.name == remote_field.name) {
                Some(local_field) => {
                    let direction = self.field_direction(local_group, local_field, group_direction);
                    self.bind_field(&remote_group.name, local_field, remote_field, direction)
                }
                None => {
                    let direction =
                        self.field_direction(remote_group, remote_field, group_direction);
                    self.bind_remote_only(&remote_group.name, remote_field, direction)
                }
            };
            remote_field.mapping = Some(mapping);
        }
        for declared in &mut bound.fields {
            declared.mapping = flattened
                .iter()
                .find(|f| f.name == declared.name)
                .and_then(|f| f.mapping.clone());
        }

        let mut local_only = Vec::new();
        for local_field in local_fields {
            if flattened.iter().any(|f| f.name == local_field.name) {
                continue;
            }
            let direction = self.field_direction(local_group, local_field, group_direction);
            if local_field.required && direction.is_some_and(Direction::reads) {
                self.report(Incompatibility::field(
                    &remote_group.name,
                    &local_field.name,
                    IncompatibilityReason::RequiredFieldMissing,
                ));
            }
            local_only.push(local_field.name.clone());
        }

        bound.mapping = Some(GroupMapping {
            matched: true,
            local_binding: local_group.binding.clone(),
            local_only,
        });
        (bound, flattened)
    }

    fn bind_field(
        &mut self,
        group: &str,
        local_field: &FieldDef,
        remote_field: &FieldDef,
        direction: Option<Direction>,
    ) -> FieldMapping {
        if let Some(direction) = direction {
            if direction.reads() && local_field.required && !remote_field.required {
                self.report(Incompatibility::field(
                    group,
                    &local_field.name,
                    IncompatibilityReason::RequiredFieldMissing,
                ));
            }
            if direction.writes() && remote_field.required && !local_field.required {
                self.report(Incompatibility::field(
                    group,
                    &local_field.name,
                    IncompatibilityReason::RequiredFieldAdded,
                ));
            }
        }

        let closed = local_field.annotation(CLOSED_ANNOTATION) == Some("true");
        match self.value_mapping(&local_field.type_def, &remote_field.type_def, direction, closed) {
            Some(mapping) => FieldMapping {
                read: ReadAction::Bind(mapping.clone()),
                write: WriteAction::Bind(mapping),
                local_binding: local_field.binding.clone(),
            },
            None => {
                if direction.is_some() {
                    log::debug!(
                        "[BINDER] {}.{}: local {} vs remote {}",
                        group,
                        local_field.name,
                        local_field.type_def,
                        remote_field.type_def
                    );
                    self.report(Incompatibility::field(
                        group,
                        &local_field.name,
                        IncompatibilityReason::TypeMismatch,
                    ));
                }
                self.unknown_field_mapping()
            }
        }
    }

    fn bind_remote_only(
        &mut self,
        group: &str,
        remote_field: &FieldDef,
        direction: Option<Direction>,
    ) -> FieldMapping {
        if let Some(direction) = direction {
            let must_decode = direction.reads() && !self.policy.tolerate_unknown_required;
            if remote_field.required && (must_decode || direction.writes()) {
                self.report(Incompatibility::field(
                    group,
                    &remote_field.name,
                    IncompatibilityReason::RequiredFieldAdded,
                ));
            }
        }
        self.unknown_field_mapping()
    }

    fn unknown_field_mapping(&self) -> FieldMapping {
        let (read, write) = if self.policy.retain_unknown_fields {
            (ReadAction::Retain, WriteAction::PassThrough)
        } else {
            (ReadAction::Skip, WriteAction::Absent)
        };
        FieldMapping {
            read,
            write,
            local_binding: None,
        }
    }

    fn check_local_only_groups(&mut self) {
        let local = self.local;
        for group in local.groups() {
            if self.remote.group(&group.name).is_some() {
                continue;
            }
            let direction = self
                .traffic
                .intersect(self.classifier.classify(&Element::Group(group)));
            if direction.is_some_and(Direction::writes) {
                self.report(Incompatibility::group(
                    &group.name,
                    IncompatibilityReason::GroupMissing,
                ));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Value mappings
    // -----------------------------------------------------------------------

    /// Conversion between a local and a remote type, `None` if the kinds
    /// cannot be reconciled. `closed` marks a local field that rejects
    /// unknown enum ids.
    fn value_mapping(
        &self,
        local: &TypeDef,
        remote: &TypeDef,
        direction: Option<Direction>,
        closed: bool,
    ) -> Option<ValueMapping> {
        let local = self.local.resolve(local)?;
        let remote = self.remote.resolve(remote)?;

        match (local, remote) {
            (l, r) if (l.is_integer() && r.is_integer()) || (l.is_float() && r.is_float()) => {
                self.numeric_mapping(l, r, direction)
            }
            (TypeDef::String { .. }, TypeDef::String { .. })
            | (TypeDef::Binary { .. }, TypeDef::Binary { .. })
            | (TypeDef::Boolean, TypeDef::Boolean)
            | (TypeDef::SmallDecimal, TypeDef::SmallDecimal)
            | (TypeDef::Decimal, TypeDef::Decimal)
            | (TypeDef::BigInt, TypeDef::BigInt)
            | (TypeDef::BigDecimal, TypeDef::BigDecimal) => Some(ValueMapping::Identity),
            (TypeDef::Time(l), TypeDef::Time(r)) => {
                (l.unit == r.unit && l.epoch == r.epoch).then_some(ValueMapping::Identity)
            }
            (TypeDef::Enum(l), TypeDef::Enum(r)) => Some(self.enum_mapping(l, r, closed)),
            (TypeDef::Sequence(l), TypeDef::Sequence(r)) => {
                let inner = self.value_mapping(l, r, direction, closed)?;
                Some(if inner.is_identity() {
                    ValueMapping::Identity
                } else {
                    ValueMapping::Sequence(Box::new(inner))
                })
            }
            (TypeDef::Reference(l), TypeDef::Reference(r)) => {
                (l == r).then_some(ValueMapping::Identity)
            }
            (TypeDef::DynamicReference(l), TypeDef::DynamicReference(r)) => {
                (l == r).then_some(ValueMapping::Identity)
            }
            _ => None,
        }
    }

    fn numeric_mapping(
        &self,
        local: &TypeDef,
        remote: &TypeDef,
        direction: Option<Direction>,
    ) -> Option<ValueMapping> {
        if local == remote {
            return Some(ValueMapping::Identity);
        }
        let allowed = match self.policy.numeric {
            NumericConversion::Exact => false,
            // Data flows remote -> local on decode and local -> remote on encode.
            NumericConversion::Widening => direction.map_or(true, |direction| {
                (!direction.reads() || remote.widens_to(local))
                    && (!direction.writes() || local.widens_to(remote))
            }),
            NumericConversion::Narrowing => true,
        };
        allowed.then(|| ValueMapping::Numeric {
            local: local.clone(),
            wire: remote.clone(),
        })
    }

    /// Symbols are matched by name; ids may differ on each side.
    fn enum_mapping(&self, local: &EnumType, remote: &EnumType, closed: bool) -> ValueMapping {
        let closed = closed || self.policy.unknown_enums == EnumPolicy::Closed;
        if local == remote && !closed {
            return ValueMapping::Identity;
        }
        let mut mapping = EnumMapping {
            closed,
            ..EnumMapping::default()
        };
        for symbol in &remote.symbols {
            if let Some(local_symbol) = local.symbol_by_name(&symbol.name) {
                mapping.wire_to_local.insert(symbol.id, local_symbol.clone());
                mapping.local_to_wire.insert(local_symbol.id, symbol.id);
            }
        }
        ValueMapping::Enum(mapping)
    }
}

#[cfg(test)]
mod tests;
