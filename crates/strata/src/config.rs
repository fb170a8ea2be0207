// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec, binder and pool configuration.
//!
//! Every knob has a default and a consuming `with_*` setter. With the
//! `config-loaders` feature the whole set can be loaded from YAML:
//!
//! ```yaml
//! codec:
//!   small_decimal_scale: 4
//!   strict_enums: true
//! binder:
//!   numeric: widening
//!   unknown_enums: closed
//!   retain_unknown_fields: false
//! pool:
//!   segment_size: 4096
//!   segments: 32
//!   exhaustion: block
//! ```

pub use crate::buffer::{PoolConfig, PoolExhaustion};

use std::fmt;

/// Tunables of the binary codec.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct CodecConfig {
    /// Implied scale of small decimals.
    pub small_decimal_scale: i8,
    /// Maximum nesting of groups and sequences.
    pub max_depth: usize,
    /// Largest accepted message body in bytes.
    pub max_message_size: usize,
    /// Largest accepted sequence element count.
    pub max_sequence_length: usize,
    /// Reject enum ids without a symbol instead of surfacing them as unknown.
    pub strict_enums: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            small_decimal_scale: 2,
            max_depth: 64,
            max_message_size: 16 * 1024 * 1024,
            max_sequence_length: 1_048_576,
            strict_enums: false,
        }
    }
}

impl CodecConfig {
    pub fn with_small_decimal_scale(mut self, scale: i8) -> Self {
        self.small_decimal_scale = scale;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = max_sequence_length;
        self
    }

    pub fn with_strict_enums(mut self, strict: bool) -> Self {
        self.strict_enums = strict;
        self
    }
}

/// Which numeric kind changes the binder tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "snake_case"))]
pub enum NumericConversion {
    /// Kinds must match exactly.
    #[default]
    Exact,
    /// Accept kinds whose value range covers the source range in the
    /// direction data flows.
    Widening,
    /// Accept any integer-to-integer or float-to-float change; values are
    /// range-checked per message.
    Narrowing,
}

/// Treatment of enum ids without a matching local symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "snake_case"))]
pub enum EnumPolicy {
    /// Decode to an unknown-symbol value.
    #[default]
    Open,
    /// Fail the message.
    Closed,
}

/// Schema binder policy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct BinderPolicy {
    pub numeric: NumericConversion,
    pub unknown_enums: EnumPolicy,
    /// Keep remote-only fields as raw bytes for pass-through on re-encode.
    pub retain_unknown_fields: bool,
    /// Accept remote-only required fields on inbound traffic.
    pub tolerate_unknown_required: bool,
}

impl Default for BinderPolicy {
    fn default() -> Self {
        Self {
            numeric: NumericConversion::Exact,
            unknown_enums: EnumPolicy::Open,
            retain_unknown_fields: true,
            tolerate_unknown_required: false,
        }
    }
}

impl BinderPolicy {
    pub fn with_numeric(mut self, numeric: NumericConversion) -> Self {
        self.numeric = numeric;
        self
    }

    pub fn with_unknown_enums(mut self, unknown_enums: EnumPolicy) -> Self {
        self.unknown_enums = unknown_enums;
        self
    }

    pub fn with_retain_unknown_fields(mut self, retain: bool) -> Self {
        self.retain_unknown_fields = retain;
        self
    }

    pub fn with_tolerate_unknown_required(mut self, tolerate: bool) -> Self {
        self.tolerate_unknown_required = tolerate;
        self
    }
}

/// Complete configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct StrataConfig {
    pub codec: CodecConfig,
    pub binder: BinderPolicy,
    pub pool: PoolConfig,
}

impl StrataConfig {
    /// Check value ranges the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.codec.max_depth == 0 {
            return Err(ConfigError::Invalid("codec.max_depth must be positive".into()));
        }
        if self.codec.max_message_size == 0 {
            return Err(ConfigError::Invalid(
                "codec.max_message_size must be positive".into(),
            ));
        }
        if self.pool.segment_size == 0 {
            return Err(ConfigError::Invalid("pool.segment_size must be positive".into()));
        }
        Ok(())
    }
}

/// Configuration loading failures.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read configuration: {}", err),
            ConfigError::Parse(msg) => write!(f, "failed to parse configuration: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

#[cfg(feature = "config-loaders")]
impl StrataConfig {
    /// Parse and validate a YAML document. Missing sections keep defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StrataConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        log::debug!("[CONFIG] loading {}", path.display());
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StrataConfig::default();
        assert_eq!(config.codec.small_decimal_scale, 2);
        assert_eq!(config.codec.max_depth, 64);
        assert_eq!(config.codec.max_message_size, 16 * 1024 * 1024);
        assert!(!config.codec.strict_enums);
        assert_eq!(config.binder.numeric, NumericConversion::Exact);
        assert_eq!(config.binder.unknown_enums, EnumPolicy::Open);
        assert!(config.binder.retain_unknown_fields);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let policy = BinderPolicy::default()
            .with_numeric(NumericConversion::Narrowing)
            .with_unknown_enums(EnumPolicy::Closed)
            .with_retain_unknown_fields(false);
        assert_eq!(policy.numeric, NumericConversion::Narrowing);
        assert_eq!(policy.unknown_enums, EnumPolicy::Closed);
        assert!(!policy.retain_unknown_fields);
        assert!(!policy.tolerate_unknown_required);
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_yaml_partial_document() {
        let yaml = r#"
codec:
  small_decimal_scale: 4
  strict_enums: true
binder:
  numeric: widening
  unknown_enums: closed
pool:
  segment_size: 4096
  exhaustion: block
"#;
        let config = StrataConfig::from_yaml_str(yaml).expect("valid yaml");
        assert_eq!(config.codec.small_decimal_scale, 4);
        assert!(config.codec.strict_enums);
        assert_eq!(config.codec.max_depth, 64);
        assert_eq!(config.binder.numeric, NumericConversion::Widening);
        assert_eq!(config.binder.unknown_enums, EnumPolicy::Closed);
        assert!(config.binder.retain_unknown_fields);
        assert_eq!(config.pool.segment_size, 4096);
        assert_eq!(config.pool.segments, 16);
        assert_eq!(config.pool.exhaustion, PoolExhaustion::Block);
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_yaml_rejects_invalid_values() {
        assert!(matches!(
            StrataConfig::from_yaml_str("codec:\n  max_depth: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            StrataConfig::from_yaml_str("binder:\n  numeric: sideways\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
