// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema registry for strata message schemas.
//!
//! Keeps an ordered version history per subject, refuses versions that break
//! the subject's compatibility level, and persists the history to disk.
//!
//! # Features
//!
//! - **Schema storage**: schemas are stored in their self-describing binary
//!   form, so a registered version is exactly what a peer would receive
//! - **Compatibility checking**: BACKWARD, FORWARD, FULL and NONE levels,
//!   decided by binding the two versions against each other
//! - **Persistence**: one JSON file per version under a root directory
//!
//! # Architecture
//!
//! ```text
//! Producers/Consumers
//!        |
//!        v
//!   SchemaRegistry (in-memory history) --- SchemaBinder (compatibility)
//!        |
//!        v
//!   FilePersistence (JSON files)
//! ```

pub mod compatibility;
pub mod persistence;
pub mod registry;

pub use compatibility::{assess, check_compatibility, Compatibility, CompatibilityResult};
pub use persistence::FilePersistence;
pub use registry::{RegistryError, SchemaEntry, SchemaRegistry};
