// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;

/// Why a local and a remote element cannot be reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncompatibilityReason {
    /// Field kinds differ and no conversion is allowed.
    TypeMismatch,
    /// This side requires a field the remote may not send.
    RequiredFieldMissing,
    /// The remote requires a field this side cannot supply or understand.
    RequiredFieldAdded,
    /// This side sends a group the remote does not know.
    GroupMissing,
}

impl IncompatibilityReason {
    pub fn as_str(self) -> &'static str {
        match self {
            IncompatibilityReason::TypeMismatch => "TYPE_MISMATCH",
            IncompatibilityReason::RequiredFieldMissing => "REQUIRED_FIELD_MISSING",
            IncompatibilityReason::RequiredFieldAdded => "REQUIRED_FIELD_ADDED",
            IncompatibilityReason::GroupMissing => "GROUP_MISSING",
        }
    }
}

impl fmt::Display for IncompatibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mismatch found while binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Incompatibility {
    pub group: String,
    /// `None` for group-level problems.
    pub field: Option<String>,
    pub reason: IncompatibilityReason,
}

impl Incompatibility {
    pub fn group(group: impl Into<String>, reason: IncompatibilityReason) -> Self {
        Self {
            group: group.into(),
            field: None,
            reason,
        }
    }

    pub fn field(
        group: impl Into<String>,
        field: impl Into<String>,
        reason: IncompatibilityReason,
    ) -> Self {
        Self {
            group: group.into(),
            field: Some(field.into()),
            reason,
        }
    }
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}: {}", self.group, field, self.reason),
            None => write!(f, "{}: {}", self.group, self.reason),
        }
    }
}

/// Binding failed; carries every mismatch found, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompatibleSchemaError {
    pub incompatibilities: Vec<Incompatibility>,
}

impl IncompatibleSchemaError {
    pub fn incompatibilities(&self) -> &[Incompatibility] {
        &self.incompatibilities
    }

    pub fn has(&self, group: &str, field: Option<&str>, reason: IncompatibilityReason) -> bool {
        self.incompatibilities.iter().any(|incompatibility| {
            incompatibility.group == group
                && incompatibility.field.as_deref() == field
                && incompatibility.reason == reason
        })
    }
}

impl fmt::Display for IncompatibleSchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "schemas are incompatible ({} problem(s))",
            self.incompatibilities.len()
        )?;
        for incompatibility in &self.incompatibilities {
            write!(f, "\n  - {}", incompatibility)?;
        }
        Ok(())
    }
}

impl std::error::Error for IncompatibleSchemaError {}
