// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strata::{decode_schema, encode_schema, BinderPolicy, Schema};

use crate::compatibility::{check_compatibility, Compatibility};

// ---------------------------------------------------------------------------
// SchemaEntry
// ---------------------------------------------------------------------------

/// A single versioned schema stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// Subject the schema is registered under (usually a topic or stream).
    pub subject: String,
    /// Monotonically increasing version number starting at 1.
    pub version: u32,
    /// Self-describing binary encoding of the schema.
    pub content: Vec<u8>,
    /// 64-bit hash of `content` for fast equality checks.
    pub hash: u64,
    /// Names of the groups the schema declares.
    pub groups: Vec<String>,
    /// Timestamp of registration.
    pub registered_at: SystemTime,
}

impl SchemaEntry {
    /// Decode the stored schema.
    pub fn schema(&self) -> Result<Schema, RegistryError> {
        decode_schema(&self.content).map_err(|e| {
            RegistryError::Encoding(format!(
                "{} v{}: {}",
                self.subject, self.version, e
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Errors produced by the schema registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Subject name is empty.
    InvalidSubject,
    /// The schema declares no groups.
    EmptySchema,
    /// A schema with the exact same content is already registered.
    DuplicateContent { subject: String, version: u32 },
    /// The schema breaks the subject's compatibility level.
    Incompatible {
        subject: String,
        level: Compatibility,
        details: Vec<String>,
    },
    /// Self-describing encoding or decoding failed.
    Encoding(String),
    /// Generic I/O or persistence error.
    IoError(String),
    /// Subject (or version) was not found.
    NotFound(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidSubject => write!(f, "subject name is empty"),
            RegistryError::EmptySchema => write!(f, "schema declares no groups"),
            RegistryError::DuplicateContent { subject, version } => write!(
                f,
                "identical schema already registered as {} v{}",
                subject, version
            ),
            RegistryError::Incompatible {
                subject,
                level,
                details,
            } => {
                write!(f, "schema is not {} compatible with {}", level, subject)?;
                for detail in details {
                    write!(f, "\n  {}", detail)?;
                }
                Ok(())
            }
            RegistryError::Encoding(msg) => write!(f, "schema encoding error: {}", msg),
            RegistryError::IoError(msg) => write!(f, "I/O error: {}", msg),
            RegistryError::NotFound(name) => write!(f, "schema not found: {}", name),
        }
    }
}

impl std::error::Error for RegistryError {}

// ---------------------------------------------------------------------------
// SchemaRegistry
// ---------------------------------------------------------------------------

/// In-memory store of versioned schemas keyed by subject.
pub struct SchemaRegistry {
    /// Map from subject to an ordered list of versions (index 0 = v1).
    schemas: HashMap<String, Vec<SchemaEntry>>,
    /// Level applied to subjects without an override.
    default_level: Compatibility,
    levels: HashMap<String, Compatibility>,
    policy: BinderPolicy,
}

impl SchemaRegistry {
    /// Create an empty registry with BACKWARD compatibility.
    pub fn new() -> Self {
        Self::from_raw(HashMap::new())
    }

    /// Reconstruct a registry from a raw map (used by persistence layer).
    pub(crate) fn from_raw(schemas: HashMap<String, Vec<SchemaEntry>>) -> Self {
        SchemaRegistry {
            schemas,
            default_level: Compatibility::default(),
            levels: HashMap::new(),
            policy: BinderPolicy::default(),
        }
    }

    /// Expose the inner map (used by persistence layer).
    pub(crate) fn inner(&self) -> &HashMap<String, Vec<SchemaEntry>> {
        &self.schemas
    }

    pub(crate) fn levels(&self) -> (Compatibility, &HashMap<String, Compatibility>) {
        (self.default_level, &self.levels)
    }

    /// Set the level used by subjects without an override.
    pub fn with_compatibility(mut self, level: Compatibility) -> Self {
        self.default_level = level;
        self
    }

    /// Binder policy used for compatibility checks.
    pub fn with_policy(mut self, policy: BinderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the level of one subject.
    pub fn set_compatibility(&mut self, subject: &str, level: Compatibility) {
        self.levels.insert(subject.to_string(), level);
    }

    /// Effective level of a subject.
    pub fn compatibility(&self, subject: &str) -> Compatibility {
        self.levels
            .get(subject)
            .copied()
            .unwrap_or(self.default_level)
    }

    /// Register a new schema version.
    ///
    /// The schema is checked against the latest version of the subject at
    /// the subject's compatibility level. Returns the assigned version
    /// number on success.
    pub fn register(&mut self, subject: &str, schema: &Schema) -> Result<u32, RegistryError> {
        if subject.is_empty() {
            return Err(RegistryError::InvalidSubject);
        }
        if schema.groups().is_empty() {
            return Err(RegistryError::EmptySchema);
        }

        let content = encode_schema(schema).map_err(|e| RegistryError::Encoding(e.to_string()))?;
        let hash = Self::compute_hash(&content);

        if let Some(version) = self.find(subject, hash, &content) {
            return Err(RegistryError::DuplicateContent {
                subject: subject.to_string(),
                version,
            });
        }

        let level = self.compatibility(subject);
        if let Some(latest) = self.get_latest(subject) {
            let previous = latest.schema()?;
            let result = check_compatibility(&previous, schema, level, Some(&self.policy));
            if !result.compatible {
                log::warn!(
                    "[REGISTRY] Rejected {} v{}: not {} compatible",
                    subject,
                    latest.version + 1,
                    level
                );
                return Err(RegistryError::Incompatible {
                    subject: subject.to_string(),
                    level,
                    details: result.details,
                });
            }
        }

        let versions = self.schemas.entry(subject.to_string()).or_default();
        let version = (versions.len() as u32) + 1;

        versions.push(SchemaEntry {
            subject: subject.to_string(),
            version,
            content,
            hash,
            groups: schema.groups().iter().map(|g| g.name.clone()).collect(),
            registered_at: SystemTime::now(),
        });
        log::debug!("[REGISTRY] Registered {} v{} ({})", subject, version, level);
        Ok(version)
    }

    /// Version under which this exact schema is registered, if any.
    pub fn lookup(&self, subject: &str, schema: &Schema) -> Option<u32> {
        let content = encode_schema(schema).ok()?;
        self.find(subject, Self::compute_hash(&content), &content)
    }

    /// Return the latest version of a subject, or `None` if not found.
    pub fn get_latest(&self, subject: &str) -> Option<&SchemaEntry> {
        self.schemas.get(subject).and_then(|v| v.last())
    }

    /// Return a specific version of a subject (1-indexed).
    pub fn get_version(&self, subject: &str, version: u32) -> Option<&SchemaEntry> {
        if version == 0 {
            return None;
        }
        self.schemas
            .get(subject)
            .and_then(|v| v.get((version - 1) as usize))
    }

    /// Decode a specific version of a subject.
    pub fn schema(&self, subject: &str, version: u32) -> Result<Schema, RegistryError> {
        self.get_version(subject, version)
            .ok_or_else(|| RegistryError::NotFound(format!("{} v{}", subject, version)))?
            .schema()
    }

    /// List all registered subjects (sorted for determinism).
    pub fn list_subjects(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.keys().cloned().collect();
        names.sort();
        names
    }

    /// List all version numbers for a given subject.
    pub fn list_versions(&self, subject: &str) -> Vec<u32> {
        match self.schemas.get(subject) {
            Some(versions) => versions.iter().map(|e| e.version).collect(),
            None => Vec::new(),
        }
    }

    /// Total number of distinct subjects.
    pub fn subject_count(&self) -> usize {
        self.schemas.len()
    }

    fn find(&self, subject: &str, hash: u64, content: &[u8]) -> Option<u32> {
        self.schemas
            .get(subject)?
            .iter()
            .find(|e| e.hash == hash && e.content == content)
            .map(|e| e.version)
    }

    /// Compute a deterministic 64-bit hash for the given content.
    pub(crate) fn compute_hash(content: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strata::{FieldDef, GroupDef, TypeDef};

    fn sensor(extra: Option<FieldDef>) -> Schema {
        let mut group = GroupDef::new("Sensor")
            .with_id(1)
            .field(FieldDef::required("id", TypeDef::Int32));
        if let Some(field) = extra {
            group = group.field(field);
        }
        Schema::builder().group(group).build().unwrap()
    }

    fn named(group: &str) -> Schema {
        Schema::builder()
            .group(GroupDef::new(group).with_id(1))
            .build()
            .unwrap()
    }

    #[test]
    fn register_schema() {
        let mut reg = SchemaRegistry::new();
        let v = reg.register("sensors", &sensor(None)).unwrap();
        assert_eq!(v, 1);
        assert_eq!(reg.subject_count(), 1);
        assert_eq!(reg.get_latest("sensors").unwrap().groups, vec!["Sensor"]);
    }

    #[test]
    fn register_same_subject_increments_version() {
        let mut reg = SchemaRegistry::new();
        let v1 = reg.register("sensors", &sensor(None)).unwrap();
        let v2 = reg
            .register(
                "sensors",
                &sensor(Some(FieldDef::optional("name", TypeDef::string()))),
            )
            .unwrap();
        assert_eq!(v1, 1);
        assert_eq!(v2, 2);
    }

    #[test]
    fn stored_schema_decodes() {
        let mut reg = SchemaRegistry::new();
        let newer = sensor(Some(FieldDef::optional("name", TypeDef::string())));
        reg.register("sensors", &sensor(None)).unwrap();
        reg.register("sensors", &newer).unwrap();

        let latest = reg.get_latest("sensors").unwrap();
        assert_eq!(latest.version, 2);
        assert_eq!(latest.schema().unwrap(), newer);
        assert_eq!(reg.schema("sensors", 1).unwrap(), sensor(None));
        assert!(matches!(
            reg.schema("sensors", 3),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn incompatible_version_rejected() {
        let mut reg = SchemaRegistry::new();
        reg.register("sensors", &sensor(None)).unwrap();
        let err = reg
            .register(
                "sensors",
                &sensor(Some(FieldDef::required("name", TypeDef::string()))),
            )
            .unwrap_err();
        match err {
            RegistryError::Incompatible { level, details, .. } => {
                assert_eq!(level, Compatibility::Backward);
                assert!(details.iter().any(|d| d.contains("Sensor.name")));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(reg.list_versions("sensors"), vec![1]);
    }

    #[test]
    fn none_level_accepts_anything() {
        let mut reg = SchemaRegistry::new();
        reg.set_compatibility("sensors", Compatibility::None);
        reg.register("sensors", &sensor(None)).unwrap();
        let v = reg
            .register(
                "sensors",
                &sensor(Some(FieldDef::required("name", TypeDef::string()))),
            )
            .unwrap();
        assert_eq!(v, 2);
        assert_eq!(reg.compatibility("other"), Compatibility::Backward);
    }

    #[test]
    fn list_subjects() {
        let mut reg = SchemaRegistry::new().with_compatibility(Compatibility::Full);
        reg.register("zebra", &named("Zebra")).unwrap();
        reg.register("alpha", &named("Alpha")).unwrap();

        assert_eq!(reg.list_subjects(), vec!["alpha", "zebra"]);
        assert_eq!(reg.compatibility("alpha"), Compatibility::Full);
    }

    #[test]
    fn list_versions() {
        let mut reg = SchemaRegistry::new().with_compatibility(Compatibility::None);
        reg.register("s", &named("A")).unwrap();
        reg.register("s", &named("B")).unwrap();
        reg.register("s", &named("C")).unwrap();

        assert_eq!(reg.list_versions("s"), vec![1, 2, 3]);
        assert!(reg.list_versions("missing").is_empty());
    }

    #[test]
    fn schema_not_found_returns_none() {
        let reg = SchemaRegistry::new();
        assert!(reg.get_latest("missing").is_none());
        assert!(reg.get_version("missing", 1).is_none());
        assert!(reg.get_version("missing", 0).is_none());
    }

    #[test]
    fn duplicate_content_rejected() {
        let mut reg = SchemaRegistry::new();
        reg.register("s", &sensor(None)).unwrap();
        let err = reg.register("s", &sensor(None)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateContent {
                subject: "s".to_string(),
                version: 1
            }
        );
        assert_eq!(reg.lookup("s", &sensor(None)), Some(1));
        assert_eq!(reg.lookup("other", &sensor(None)), None);
    }

    #[test]
    fn invalid_input_rejected() {
        let mut reg = SchemaRegistry::new();
        assert_eq!(
            reg.register("", &sensor(None)).unwrap_err(),
            RegistryError::InvalidSubject
        );
        let empty = Schema::builder().build().unwrap();
        assert_eq!(
            reg.register("s", &empty).unwrap_err(),
            RegistryError::EmptySchema
        );
    }

    #[test]
    fn schema_hash_uniqueness() {
        let hash_a = SchemaRegistry::compute_hash(b"schema a");
        let hash_b = SchemaRegistry::compute_hash(b"schema b");
        assert_ne!(hash_a, hash_b, "different content should yield different hashes");
        assert_eq!(hash_a, SchemaRegistry::compute_hash(b"schema a"));
    }
}
