// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compatibility::Compatibility;
use crate::registry::{RegistryError, SchemaEntry, SchemaRegistry};

const LEVELS_FILE: &str = "compatibility.json";

/// Compatibility settings, stored next to the subject directories.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LevelsFile {
    default: Compatibility,
    #[serde(default)]
    subjects: BTreeMap<String, Compatibility>,
}

// ---------------------------------------------------------------------------
// FilePersistence
// ---------------------------------------------------------------------------

/// File-based persistence for `SchemaRegistry`.
///
/// Stores each schema version as a JSON file at
/// `{directory}/{subject}/v{version}.json`, plus the compatibility levels in
/// `{directory}/compatibility.json`.
pub struct FilePersistence {
    directory: PathBuf,
}

impl FilePersistence {
    /// Create a new `FilePersistence` rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(directory: PathBuf) -> Result<Self, RegistryError> {
        create_dir(&directory)?;
        Ok(FilePersistence { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Persist the entire registry to disk. Existing files are overwritten.
    pub fn save(&self, registry: &SchemaRegistry) -> Result<(), RegistryError> {
        for (subject, versions) in registry.inner() {
            let subject_dir = self.directory.join(sanitize_name(subject));
            create_dir(&subject_dir)?;

            for entry in versions {
                let path = subject_dir.join(format!("v{}.json", entry.version));
                write_json(&path, entry)?;
            }
        }

        let (default, overrides) = registry.levels();
        let levels = LevelsFile {
            default,
            subjects: overrides
                .iter()
                .map(|(subject, level)| (subject.clone(), *level))
                .collect(),
        };
        write_json(&self.directory.join(LEVELS_FILE), &levels)?;

        log::debug!(
            "[REGISTRY] Saved {} subject(s) to {}",
            registry.subject_count(),
            self.directory.display()
        );
        Ok(())
    }

    /// Load a registry from disk.
    ///
    /// Scans all subdirectories of the root for `v*.json` files. Each stored
    /// schema is decoded once so a corrupt entry fails the load.
    pub fn load(&self) -> Result<SchemaRegistry, RegistryError> {
        let mut schemas: HashMap<String, Vec<SchemaEntry>> = HashMap::new();

        if !self.directory.exists() {
            return Ok(SchemaRegistry::new());
        }

        for path in read_dir(&self.directory)? {
            if !path.is_dir() {
                continue;
            }

            let mut versions: Vec<SchemaEntry> = Vec::new();
            for vpath in read_dir(&path)? {
                let is_version_file = vpath
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with('v') && n.ends_with(".json"))
                    .unwrap_or(false);
                if !is_version_file {
                    continue;
                }

                let entry: SchemaEntry = read_json(&vpath)?;
                entry.schema()?;
                versions.push(entry);
            }

            versions.sort_by_key(|e| e.version);

            // Subject name comes from the entries, not the sanitized dir name.
            if let Some(first) = versions.first() {
                let subject = first.subject.clone();
                schemas.insert(subject, versions);
            }
        }

        let mut registry = SchemaRegistry::from_raw(schemas);
        let levels_path = self.directory.join(LEVELS_FILE);
        if levels_path.exists() {
            let levels: LevelsFile = read_json(&levels_path)?;
            registry = registry.with_compatibility(levels.default);
            for (subject, level) in levels.subjects {
                registry.set_compatibility(&subject, level);
            }
        }
        Ok(registry)
    }
}

fn create_dir(path: &Path) -> Result<(), RegistryError> {
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| {
        RegistryError::IoError(format!(
            "failed to create directory {}: {}",
            path.display(),
            e
        ))
    })
}

fn read_dir(path: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let entries = fs::read_dir(path).map_err(|e| {
        RegistryError::IoError(format!("failed to read directory {}: {}", path.display(), e))
    })?;
    entries
        .map(|entry| {
            entry
                .map(|e| e.path())
                .map_err(|e| RegistryError::IoError(format!("directory entry error: {}", e)))
        })
        .collect()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RegistryError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| RegistryError::IoError(format!("serialization error: {}", e)))?;
    fs::write(path, json).map_err(|e| {
        RegistryError::IoError(format!("failed to write {}: {}", path.display(), e))
    })
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, RegistryError> {
    let json = fs::read_to_string(path).map_err(|e| {
        RegistryError::IoError(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&json).map_err(|e| {
        RegistryError::IoError(format!("failed to deserialize {}: {}", path.display(), e))
    })
}

/// Sanitize a subject name for use as a directory name.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
