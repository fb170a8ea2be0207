// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write mappings attached to a bound schema.
//!
//! A bound schema keeps the remote wire shape; each remote field carries a
//! [`FieldMapping`] telling the codec what to do with it on decode
//! ([`ReadAction`]) and where its value comes from on encode
//! ([`WriteAction`]).

use crate::schema::Binding;
use crate::types::{EnumSymbol, TypeDef};
use std::collections::BTreeMap;

/// Which side of a protocol an element takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Decoded by this side.
    Inbound,
    /// Encoded by this side.
    Outbound,
    #[default]
    Both,
}

impl Direction {
    pub fn includes(self, other: Direction) -> bool {
        self == Direction::Both || other == Direction::Both || self == other
    }

    pub fn reads(self) -> bool {
        matches!(self, Direction::Inbound | Direction::Both)
    }

    pub fn writes(self) -> bool {
        matches!(self, Direction::Outbound | Direction::Both)
    }

    /// Overlap of two directions; `None` if disjoint.
    pub fn intersect(self, other: Direction) -> Option<Direction> {
        match (self, other) {
            (Direction::Both, d) | (d, Direction::Both) => Some(d),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "inbound" | "in" => Some(Direction::Inbound),
            "outbound" | "out" => Some(Direction::Outbound),
            "both" => Some(Direction::Both),
            _ => None,
        }
    }
}

/// Wire-to-local enum translation, by symbol name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumMapping {
    /// Wire id to the matching local symbol.
    pub wire_to_local: BTreeMap<i32, EnumSymbol>,
    /// Local id to wire id.
    pub local_to_wire: BTreeMap<i32, i32>,
    /// Unknown ids fail decoding instead of surfacing as unknown.
    pub closed: bool,
}

/// Value conversion between the wire kind and the local kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValueMapping {
    #[default]
    Identity,
    /// Integer or float kind change; values are range-checked.
    Numeric { local: TypeDef, wire: TypeDef },
    Enum(EnumMapping),
    /// Element mapping of a sequence.
    Sequence(Box<ValueMapping>),
}

impl ValueMapping {
    pub fn is_identity(&self) -> bool {
        match self {
            ValueMapping::Identity => true,
            ValueMapping::Sequence(inner) => inner.is_identity(),
            _ => false,
        }
    }
}

/// Decode-side treatment of a wire field.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadAction {
    /// Surface the value under the same field name.
    Bind(ValueMapping),
    /// Unknown locally; keep the raw bytes as an [`UnknownField`](crate::value::UnknownField).
    Retain,
    /// Unknown locally; consume and drop.
    Skip,
}

/// Encode-side source of a wire field.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteAction {
    /// Take the local value under the same field name.
    Bind(ValueMapping),
    /// Unknown locally; replay retained raw bytes if present.
    PassThrough,
    /// Unknown locally and never retained; always written as absent.
    Absent,
}

/// Binder output for one remote field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub read: ReadAction,
    pub write: WriteAction,
    /// Host binding of the matching local field.
    pub local_binding: Option<Binding>,
}

impl FieldMapping {
    pub fn identity() -> Self {
        Self {
            read: ReadAction::Bind(ValueMapping::Identity),
            write: WriteAction::Bind(ValueMapping::Identity),
            local_binding: None,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(&self.read, ReadAction::Bind(m) if m.is_identity())
            && matches!(&self.write, WriteAction::Bind(m) if m.is_identity())
    }
}

/// Binder output for one remote group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupMapping {
    /// Whether a local group of the same name exists.
    pub matched: bool,
    /// Host binding of the matching local group.
    pub local_binding: Option<Binding>,
    /// Local fields absent from the wire; they decode as absent.
    pub local_only: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_algebra() {
        assert_eq!(Direction::Both.intersect(Direction::Inbound), Some(Direction::Inbound));
        assert_eq!(Direction::Outbound.intersect(Direction::Inbound), None);
        assert!(Direction::Inbound.includes(Direction::Both));
        assert!(!Direction::Inbound.includes(Direction::Outbound));
        assert!(Direction::Both.reads() && Direction::Both.writes());
        assert_eq!(Direction::parse("OUTBOUND"), Some(Direction::Outbound));
    }

    #[test]
    fn test_identity_detection() {
        assert!(FieldMapping::identity().is_identity());
        let seq = ValueMapping::Sequence(Box::new(ValueMapping::Identity));
        assert!(seq.is_identity());
        let numeric = ValueMapping::Numeric {
            local: TypeDef::Int64,
            wire: TypeDef::Int32,
        };
        assert!(!numeric.is_identity());
    }
}
