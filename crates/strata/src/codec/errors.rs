// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec construction, encode and decode errors.
//!
//! Encode and decode errors carry the path of the failing value, e.g.
//! `Order.legs[2].price`, built up while the error unwinds.

use crate::buffer::BufferError;
use std::fmt;

/// One step of a value path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Group(String),
    Field(String),
    Index(usize),
}

/// Location of a failing value inside a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Group(name) => write!(f, "{}", name)?,
                PathSegment::Field(name) if index == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}

macro_rules! impl_path_error {
    ($error:ident, $kind:ident) => {
        impl $error {
            pub fn new(kind: $kind) -> Self {
                Self {
                    kind,
                    path: FieldPath::default(),
                }
            }

            pub fn kind(&self) -> &$kind {
                &self.kind
            }

            pub fn path(&self) -> &FieldPath {
                &self.path
            }

            pub(crate) fn in_field(mut self, name: &str) -> Self {
                self.path.prepend(PathSegment::Field(name.to_string()));
                self
            }

            pub(crate) fn at_index(mut self, index: usize) -> Self {
                self.path.prepend(PathSegment::Index(index));
                self
            }

            pub(crate) fn in_group(mut self, name: &str) -> Self {
                self.path.prepend(PathSegment::Group(name.to_string()));
                self
            }
        }

        impl From<$kind> for $error {
            fn from(kind: $kind) -> Self {
                Self::new(kind)
            }
        }

        impl From<BufferError> for $error {
            fn from(err: BufferError) -> Self {
                Self::new($kind::Buffer(err))
            }
        }

        impl fmt::Display for $error {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.path.is_empty() {
                    write!(f, "{}", self.kind)
                } else {
                    write!(f, "{} at {}", self.kind, self.path)
                }
            }
        }

        impl std::error::Error for $error {}
    };
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// Required field has no value.
    MissingRequired,
    /// Value variant does not fit the field type.
    TypeMismatch { expected: String, found: &'static str },
    /// Value cannot be represented by the wire kind.
    OutOfRange(String),
    /// String, binary or sequence longer than allowed.
    TooLong { len: usize, max: usize },
    UnknownGroup(String),
    /// Static reference value names another group.
    GroupMismatch { expected: String, found: String },
    /// Group has no id but is encoded with a tag.
    MissingGroupId(String),
    /// Dynamic reference value is not the base group or a subgroup of it.
    NotASubgroup { group: String, base: String },
    UnknownEnumSymbol(String),
    UnknownEnumId(i32),
    DepthExceeded(usize),
    MessageTooLarge { size: usize, max: usize },
    Buffer(BufferError),
    Io(String),
}

impl fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired => write!(f, "required field is absent"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected {} value, found {}", expected, found)
            }
            Self::OutOfRange(detail) => write!(f, "value out of range: {}", detail),
            Self::TooLong { len, max } => write!(f, "length {} exceeds maximum {}", len, max),
            Self::UnknownGroup(name) => write!(f, "unknown group '{}'", name),
            Self::GroupMismatch { expected, found } => {
                write!(f, "expected group '{}', found '{}'", expected, found)
            }
            Self::MissingGroupId(name) => write!(f, "group '{}' has no id", name),
            Self::NotASubgroup { group, base } => {
                write!(f, "group '{}' is not a subgroup of '{}'", group, base)
            }
            Self::UnknownEnumSymbol(symbol) => write!(f, "unknown enum symbol '{}'", symbol),
            Self::UnknownEnumId(id) => write!(f, "unknown enum id {}", id),
            Self::DepthExceeded(max) => write!(f, "nesting deeper than {}", max),
            Self::MessageTooLarge { size, max } => {
                write!(f, "message of {} bytes exceeds maximum {}", size, max)
            }
            Self::Buffer(err) => write!(f, "{}", err),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

/// Encoding failure. Nothing of the failing message stays committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    kind: EncodeErrorKind,
    path: FieldPath,
}

impl_path_error!(EncodeError, EncodeErrorKind);

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Varint longer than 10 bytes or overflowing 64 bits.
    InvalidVarint,
    InvalidBool(u8),
    InvalidPresence(u8),
    InvalidUtf8,
    /// Wire value does not fit the declared or local kind.
    OutOfRange(String),
    TooLong { len: usize, max: usize },
    UnknownGroupId(u64),
    NotASubgroup { group: String, base: String },
    /// Enum id with no symbol under a closed policy.
    UnknownEnumId(i32),
    DepthExceeded(usize),
    MessageTooLarge { size: usize, max: usize },
    /// Length prefix announces more bytes than are available.
    Truncated { declared: usize, available: usize },
    Buffer(BufferError),
    Io(String),
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVarint => write!(f, "malformed varint"),
            Self::InvalidBool(b) => write!(f, "invalid boolean byte 0x{:02x}", b),
            Self::InvalidPresence(b) => write!(f, "invalid presence flag 0x{:02x}", b),
            Self::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            Self::OutOfRange(detail) => write!(f, "value out of range: {}", detail),
            Self::TooLong { len, max } => write!(f, "length {} exceeds maximum {}", len, max),
            Self::UnknownGroupId(id) => write!(f, "unknown group id {}", id),
            Self::NotASubgroup { group, base } => {
                write!(f, "group '{}' is not a subgroup of '{}'", group, base)
            }
            Self::UnknownEnumId(id) => write!(f, "unknown enum id {}", id),
            Self::DepthExceeded(max) => write!(f, "nesting deeper than {}", max),
            Self::MessageTooLarge { size, max } => {
                write!(f, "message of {} bytes exceeds maximum {}", size, max)
            }
            Self::Truncated {
                declared,
                available,
            } => write!(
                f,
                "message declares {} bytes but only {} are available",
                declared, available
            ),
            Self::Buffer(err) => write!(f, "{}", err),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

/// Decoding failure with the path of the value being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    path: FieldPath,
}

impl_path_error!(DecodeError, DecodeErrorKind);

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Schema cannot drive a codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Group has no id; see `Schema::assign_group_ids`.
    MissingGroupId(String),
    /// Small decimal scale is not representable.
    InvalidConfig(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::MissingGroupId(group) => write!(
                f,
                "group '{}' has no id (assign ids before building a codec)",
                group
            ),
            CodecError::InvalidConfig(msg) => write!(f, "invalid codec configuration: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}
