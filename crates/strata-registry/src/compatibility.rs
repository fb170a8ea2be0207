// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;

use serde::{Deserialize, Serialize};
use strata::{BinderPolicy, Direction, IncompatibleSchemaError, Schema, SchemaBinder};

// ---------------------------------------------------------------------------
// Compatibility level
// ---------------------------------------------------------------------------

/// How a new schema version must relate to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Compatibility {
    /// New schema can read data written with the old schema.
    #[default]
    Backward,
    /// Old schema can read data written with the new schema.
    Forward,
    /// Both backward and forward.
    Full,
    /// No guarantee; any version is accepted.
    None,
}

impl Compatibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Compatibility::Backward => "BACKWARD",
            Compatibility::Forward => "FORWARD",
            Compatibility::Full => "FULL",
            Compatibility::None => "NONE",
        }
    }

    fn requires_backward(self) -> bool {
        matches!(self, Compatibility::Backward | Compatibility::Full)
    }

    fn requires_forward(self) -> bool {
        matches!(self, Compatibility::Forward | Compatibility::Full)
    }
}

impl fmt::Display for Compatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CompatibilityResult
// ---------------------------------------------------------------------------

/// Result of checking a new schema version against an old one.
#[derive(Debug, Clone)]
pub struct CompatibilityResult {
    /// Level that was checked.
    pub level: Compatibility,
    /// Whether the new version satisfies the level.
    pub compatible: bool,
    /// One line per incompatibility, prefixed by the failing direction.
    pub details: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check `new` against `old` at the given level.
///
/// Backward binds `new` as the local schema reading `old` data; forward binds
/// `old` reading `new` data. Both use the binder's default policy unless one
/// is given.
pub fn check_compatibility(
    old: &Schema,
    new: &Schema,
    level: Compatibility,
    policy: Option<&BinderPolicy>,
) -> CompatibilityResult {
    let policy = policy.cloned().unwrap_or_default();
    let mut details = Vec::new();

    if level.requires_backward() {
        if let Err(err) = reads(new, old, &policy) {
            collect("backward", &err, &mut details);
        }
    }
    if level.requires_forward() {
        if let Err(err) = reads(old, new, &policy) {
            collect("forward", &err, &mut details);
        }
    }

    CompatibilityResult {
        level,
        compatible: details.is_empty(),
        details,
    }
}

/// Strongest level that `new` satisfies relative to `old`.
///
/// Returns [`Compatibility::None`] when neither direction binds.
pub fn assess(old: &Schema, new: &Schema, policy: Option<&BinderPolicy>) -> Compatibility {
    let policy = policy.cloned().unwrap_or_default();
    let backward = reads(new, old, &policy).is_ok();
    let forward = reads(old, new, &policy).is_ok();
    match (backward, forward) {
        (true, true) => Compatibility::Full,
        (true, false) => Compatibility::Backward,
        (false, true) => Compatibility::Forward,
        (false, false) => Compatibility::None,
    }
}

fn reads(
    reader: &Schema,
    writer: &Schema,
    policy: &BinderPolicy,
) -> Result<(), IncompatibleSchemaError> {
    SchemaBinder::new(reader.clone())
        .with_policy(policy.clone())
        .bind(writer, Direction::Inbound)
        .map(|_| ())
}

fn collect(direction: &str, err: &IncompatibleSchemaError, details: &mut Vec<String>) {
    details.extend(
        err.incompatibilities()
            .iter()
            .map(|i| format!("{}: {}", direction, i)),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
