// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema construction errors.
//!
//! Validation never stops at the first problem: every violated invariant is
//! collected into a single [`SchemaDefinitionError`].

use std::fmt;

/// A single broken schema invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// Two groups share a name.
    DuplicateGroupName(String),
    /// Two groups share an id.
    DuplicateGroupId { id: u32, group: String },
    /// Two named types share a name.
    DuplicateNamedType(String),
    /// A field name repeats within a group, inherited fields included.
    DuplicateFieldName { group: String, field: String },
    /// A field id repeats within a group, inherited fields included.
    DuplicateFieldId {
        group: String,
        field: String,
        id: u32,
    },
    /// Super-group does not exist.
    UnresolvedSuperGroup { group: String, super_group: String },
    /// Static or dynamic reference to a group that does not exist.
    UnresolvedReference { context: String, group: String },
    /// Alias to a named type that does not exist.
    UnresolvedNamedType { context: String, name: String },
    /// Super-group chain loops back to `group`.
    SuperGroupCycle { group: String },
    /// Named-type alias chain loops back to `name`.
    NamedTypeCycle { name: String },
    DuplicateEnumId { context: String, id: i32 },
    DuplicateEnumSymbol { context: String, symbol: String },
    /// Unit and epoch cannot be combined (days since midnight).
    IllegalTimeType { context: String, time: String },
    /// Display timezone is neither `UTC`, `Z` nor a `+hh:mm` offset.
    InvalidTimezone { context: String, timezone: String },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateGroupName(name) => write!(f, "duplicate group name '{}'", name),
            Self::DuplicateGroupId { id, group } => {
                write!(f, "group '{}' reuses group id {}", group, id)
            }
            Self::DuplicateNamedType(name) => write!(f, "duplicate named type '{}'", name),
            Self::DuplicateFieldName { group, field } => {
                write!(f, "duplicate field '{}' in group '{}'", field, group)
            }
            Self::DuplicateFieldId { group, field, id } => write!(
                f,
                "field '{}' in group '{}' reuses field id {}",
                field, group, id
            ),
            Self::UnresolvedSuperGroup { group, super_group } => write!(
                f,
                "group '{}' extends unknown group '{}'",
                group, super_group
            ),
            Self::UnresolvedReference { context, group } => {
                write!(f, "{} references unknown group '{}'", context, group)
            }
            Self::UnresolvedNamedType { context, name } => {
                write!(f, "{} references unknown named type '{}'", context, name)
            }
            Self::SuperGroupCycle { group } => {
                write!(f, "super-group chain of '{}' is cyclic", group)
            }
            Self::NamedTypeCycle { name } => write!(f, "named type '{}' is cyclic", name),
            Self::DuplicateEnumId { context, id } => {
                write!(f, "{} repeats enum id {}", context, id)
            }
            Self::DuplicateEnumSymbol { context, symbol } => {
                write!(f, "{} repeats enum symbol '{}'", context, symbol)
            }
            Self::IllegalTimeType { context, time } => {
                write!(f, "{} uses illegal time type {}", context, time)
            }
            Self::InvalidTimezone { context, timezone } => {
                write!(f, "{} uses invalid timezone '{}'", context, timezone)
            }
        }
    }
}

/// Every invariant violation found while building a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinitionError {
    pub violations: Vec<SchemaViolation>,
}

impl SchemaDefinitionError {
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

impl fmt::Display for SchemaDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid schema ({} violations)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaDefinitionError {}
