// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Eagerly validating schema builder.

use super::errors::{SchemaDefinitionError, SchemaViolation};
use super::model::{Annotations, Binding, GroupDef, NamedType, Schema};
use crate::types::{parse_timezone, TypeDef};
use std::collections::{HashMap, HashSet};

/// Collects raw definitions and freezes them into a [`Schema`].
///
/// `build` checks every invariant and reports all violations at once.
#[derive(Debug, Default, Clone)]
pub struct SchemaBuilder {
    groups: Vec<GroupDef>,
    named_types: Vec<NamedType>,
    annotations: Annotations,
    binding: Option<Binding>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: GroupDef) -> Self {
        self.groups.push(group);
        self
    }

    pub fn named_type(mut self, named: NamedType) -> Self {
        self.named_types.push(named);
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaDefinitionError> {
        let violations = Validator::new(&self.groups, &self.named_types).run();
        if !violations.is_empty() {
            log::debug!(
                "[SCHEMA] rejected schema with {} violations",
                violations.len()
            );
            return Err(SchemaDefinitionError { violations });
        }
        Ok(Schema::assemble(
            self.groups,
            self.named_types,
            self.annotations,
            self.binding,
        ))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct Validator<'a> {
    groups: &'a [GroupDef],
    named_types: &'a [NamedType],
    by_name: HashMap<&'a str, &'a GroupDef>,
    named_by_name: HashMap<&'a str, &'a NamedType>,
    violations: Vec<SchemaViolation>,
}

impl<'a> Validator<'a> {
    fn new(groups: &'a [GroupDef], named_types: &'a [NamedType]) -> Self {
        Self {
            groups,
            named_types,
            by_name: HashMap::new(),
            named_by_name: HashMap::new(),
            violations: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<SchemaViolation> {
        self.check_names_and_ids();
        let acyclic = self.check_super_groups();
        for group in self.groups {
            if acyclic.contains(group.name.as_str()) {
                self.check_fields(group);
            }
            for field in &group.fields {
                let context = format!("field '{}.{}'", group.name, field.name);
                self.check_type(&context, &field.type_def);
            }
        }
        self.check_named_types();
        self.violations
    }

    fn check_names_and_ids(&mut self) {
        let mut ids = HashSet::new();
        for group in self.groups {
            if self.by_name.insert(&group.name, group).is_some() {
                self.violations
                    .push(SchemaViolation::DuplicateGroupName(group.name.clone()));
            }
            if let Some(id) = group.id {
                if !ids.insert(id) {
                    self.violations.push(SchemaViolation::DuplicateGroupId {
                        id,
                        group: group.name.clone(),
                    });
                }
            }
        }
        for named in self.named_types {
            if self.named_by_name.insert(&named.name, named).is_some() {
                self.violations
                    .push(SchemaViolation::DuplicateNamedType(named.name.clone()));
            }
        }
    }

    /// Report unresolved and cyclic super-groups; return the groups whose
    /// chain terminates.
    fn check_super_groups(&mut self) -> HashSet<&'a str> {
        let mut acyclic = HashSet::new();
        for group in self.groups {
            let mut seen = HashSet::new();
            seen.insert(group.name.as_str());
            let mut current = group;
            let terminates = loop {
                let Some(parent_name) = current.super_group.as_deref() else {
                    break true;
                };
                let Some(parent) = self.by_name.get(parent_name).copied() else {
                    if current.name == group.name {
                        self.violations.push(SchemaViolation::UnresolvedSuperGroup {
                            group: group.name.clone(),
                            super_group: parent_name.to_string(),
                        });
                    }
                    break false;
                };
                if !seen.insert(parent.name.as_str()) {
                    if parent.name == group.name {
                        self.violations.push(SchemaViolation::SuperGroupCycle {
                            group: group.name.clone(),
                        });
                    }
                    break false;
                }
                current = parent;
            };
            if terminates {
                acyclic.insert(group.name.as_str());
            }
        }
        acyclic
    }

    /// Field names and ids are unique across the inheritance chain. Only
    /// collisions involving this group's declared fields are reported here;
    /// ancestors report their own.
    fn check_fields(&mut self, group: &'a GroupDef) {
        let mut chain = Vec::new();
        let mut current = group.super_group.as_deref();
        while let Some(parent) = current.and_then(|name| self.by_name.get(name).copied()) {
            chain.push(parent);
            current = parent.super_group.as_deref();
        }

        let mut names: HashSet<&str> = HashSet::new();
        let mut ids: HashSet<u32> = HashSet::new();
        for ancestor in chain.iter().rev() {
            for field in &ancestor.fields {
                names.insert(&field.name);
                if let Some(id) = field.id {
                    ids.insert(id);
                }
            }
        }
        for field in &group.fields {
            if !names.insert(&field.name) {
                self.violations.push(SchemaViolation::DuplicateFieldName {
                    group: group.name.clone(),
                    field: field.name.clone(),
                });
            }
            if let Some(id) = field.id {
                if !ids.insert(id) {
                    self.violations.push(SchemaViolation::DuplicateFieldId {
                        group: group.name.clone(),
                        field: field.name.clone(),
                        id,
                    });
                }
            }
        }
    }

    fn check_type(&mut self, context: &str, type_def: &TypeDef) {
        match type_def {
            TypeDef::Sequence(component) => self.check_type(context, component),
            TypeDef::Reference(group) | TypeDef::DynamicReference(Some(group)) => {
                if !self.by_name.contains_key(group.as_str()) {
                    self.violations.push(SchemaViolation::UnresolvedReference {
                        context: context.to_string(),
                        group: group.clone(),
                    });
                }
            }
            TypeDef::Named(name) => {
                if !self.named_by_name.contains_key(name.as_str()) {
                    self.violations.push(SchemaViolation::UnresolvedNamedType {
                        context: context.to_string(),
                        name: name.clone(),
                    });
                }
            }
            TypeDef::Enum(e) => {
                for id in e.duplicate_ids() {
                    self.violations.push(SchemaViolation::DuplicateEnumId {
                        context: context.to_string(),
                        id,
                    });
                }
                for symbol in e.duplicate_names() {
                    self.violations.push(SchemaViolation::DuplicateEnumSymbol {
                        context: context.to_string(),
                        symbol,
                    });
                }
            }
            TypeDef::Time(time) => {
                if !time.is_legal() {
                    self.violations.push(SchemaViolation::IllegalTimeType {
                        context: context.to_string(),
                        time: time.to_string(),
                    });
                }
                if let Some(timezone) = &time.timezone {
                    if parse_timezone(timezone).is_none() {
                        self.violations.push(SchemaViolation::InvalidTimezone {
                            context: context.to_string(),
                            timezone: timezone.clone(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    fn check_named_types(&mut self) {
        for named in self.named_types {
            let context = format!("named type '{}'", named.name);
            self.check_type(&context, &named.type_def);

            let mut seen = HashSet::new();
            seen.insert(named.name.as_str());
            let mut current = &named.type_def;
            while let TypeDef::Named(alias) = current {
                let Some(target) = self.named_by_name.get(alias.as_str()).copied() else {
                    break;
                };
                if !seen.insert(target.name.as_str()) {
                    if target.name == named.name {
                        self.violations.push(SchemaViolation::NamedTypeCycle {
                            name: named.name.clone(),
                        });
                    }
                    break;
                }
                current = &target.type_def;
            }
        }
    }
}
