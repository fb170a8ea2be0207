// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire-level type descriptions.
//!
//! [`TypeDef`] is a closed sum of every value shape the codec understands.
//! It is pure structure: resolution of named types and group references is
//! done by [`Schema`](crate::schema::Schema).

mod time;

pub use time::{Epoch, TimeType, TimeUnit, Y2K_OFFSET_SECONDS};
pub(crate) use time::parse_timezone;

use std::collections::HashSet;
use std::fmt;

/// One symbol of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumSymbol {
    pub name: String,
    pub id: i32,
}

impl EnumSymbol {
    pub fn new(name: impl Into<String>, id: i32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Ordered list of enumeration symbols; ids and names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct EnumType {
    pub symbols: Vec<EnumSymbol>,
}

impl EnumType {
    pub fn new(symbols: Vec<EnumSymbol>) -> Self {
        Self { symbols }
    }

    /// Symbols numbered from 0 in declaration order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| EnumSymbol::new(name, index as i32))
            .collect();
        Self { symbols }
    }

    pub fn symbol_by_id(&self, id: i32) -> Option<&EnumSymbol> {
        self.symbols.iter().find(|symbol| symbol.id == id)
    }

    pub fn symbol_by_name(&self, name: &str) -> Option<&EnumSymbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }

    /// Ids that appear more than once.
    pub fn duplicate_ids(&self) -> Vec<i32> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for symbol in &self.symbols {
            if !seen.insert(symbol.id) && !duplicates.contains(&symbol.id) {
                duplicates.push(symbol.id);
            }
        }
        duplicates
    }

    /// Names that appear more than once.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates: Vec<String> = Vec::new();
        for symbol in &self.symbols {
            if !seen.insert(symbol.name.as_str()) && !duplicates.contains(&symbol.name) {
                duplicates.push(symbol.name.clone());
            }
        }
        duplicates
    }
}

/// Wire-level value shape of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDef {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
    /// UTF-8 text, optionally bounded in bytes.
    String { max_size: Option<u32> },
    /// Raw bytes, optionally bounded.
    Binary { max_size: Option<u32> },
    /// Decimal whose scale is implied by codec configuration.
    SmallDecimal,
    /// Decimal with an explicit scale on the wire.
    Decimal,
    /// Arbitrary-precision integer.
    BigInt,
    /// Arbitrary-precision decimal.
    BigDecimal,
    Time(TimeType),
    Enum(EnumType),
    Sequence(Box<TypeDef>),
    /// Static reference: the named group is embedded without a tag.
    Reference(String),
    /// Dynamic reference: a tagged group that is the base or one of its
    /// subgroups. `None` accepts any group.
    DynamicReference(Option<String>),
    /// Alias to a [`NamedType`](crate::schema::NamedType).
    Named(String),
}

impl TypeDef {
    pub fn string() -> Self {
        Self::String { max_size: None }
    }

    pub fn binary() -> Self {
        Self::Binary { max_size: None }
    }

    pub fn sequence(component: TypeDef) -> Self {
        Self::Sequence(Box::new(component))
    }

    pub fn reference(group: impl Into<String>) -> Self {
        Self::Reference(group.into())
    }

    pub fn dynamic(base: impl Into<String>) -> Self {
        Self::DynamicReference(Some(base.into()))
    }

    pub fn named(alias: impl Into<String>) -> Self {
        Self::Named(alias.into())
    }

    pub fn is_integer(&self) -> bool {
        self.integer_range().is_some()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Inclusive value range of integer kinds, widened to `i128`.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            Self::Int8 => (i8::MIN as i128, i8::MAX as i128),
            Self::Int16 => (i16::MIN as i128, i16::MAX as i128),
            Self::Int32 => (i32::MIN as i128, i32::MAX as i128),
            Self::Int64 => (i64::MIN as i128, i64::MAX as i128),
            Self::UInt8 => (0, u8::MAX as i128),
            Self::UInt16 => (0, u16::MAX as i128),
            Self::UInt32 => (0, u32::MAX as i128),
            Self::UInt64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }

    /// Whether every value of `self` is representable in `target`
    /// (numeric kinds only).
    pub fn widens_to(&self, target: &TypeDef) -> bool {
        if let (Some((lo, hi)), Some((target_lo, target_hi))) =
            (self.integer_range(), target.integer_range())
        {
            return target_lo <= lo && hi <= target_hi;
        }
        matches!(
            (self, target),
            (Self::Float32, Self::Float32 | Self::Float64) | (Self::Float64, Self::Float64)
        )
    }

    /// Short kind name used in diagnostics and the schema exchange format.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int8 => "i8",
            Self::Int16 => "i16",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::UInt8 => "u8",
            Self::UInt16 => "u16",
            Self::UInt32 => "u32",
            Self::UInt64 => "u64",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
            Self::Boolean => "bool",
            Self::String { .. } => "string",
            Self::Binary { .. } => "binary",
            Self::SmallDecimal => "smalldecimal",
            Self::Decimal => "decimal",
            Self::BigInt => "bigint",
            Self::BigDecimal => "bigdecimal",
            Self::Time(_) => "time",
            Self::Enum(_) => "enum",
            Self::Sequence(_) => "sequence",
            Self::Reference(_) => "reference",
            Self::DynamicReference(_) => "dynamic",
            Self::Named(_) => "named",
        }
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String {
                max_size: Some(max),
            } => write!(f, "string({})", max),
            Self::Binary {
                max_size: Some(max),
            } => write!(f, "binary({})", max),
            Self::Time(time) => write!(f, "time({})", time),
            Self::Enum(e) => {
                write!(f, "enum(")?;
                for (index, symbol) in e.symbols.iter().enumerate() {
                    if index > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}/{}", symbol.name, symbol.id)?;
                }
                write!(f, ")")
            }
            Self::Sequence(component) => write!(f, "{}[]", component),
            Self::Reference(group) => write!(f, "{}", group),
            Self::DynamicReference(Some(base)) => write!(f, "{}*", base),
            Self::DynamicReference(None) => write!(f, "object"),
            Self::Named(alias) => write!(f, "{}", alias),
            other => write!(f, "{}", other.kind_name()),
        }
    }
}
