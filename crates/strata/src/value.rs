// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory values exchanged with the codec.
//!
//! A [`Value`] mirrors the [`TypeDef`](crate::types::TypeDef) kinds. Groups are
//! represented generically by [`GroupValue`]; host types convert to and from
//! it at the edge.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Decimal
// ---------------------------------------------------------------------------

/// Decimal number `mantissa * 10^-scale`.
///
/// Equality compares numeric value: `1.50` equals `1.5`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    pub mantissa: i64,
    pub scale: i8,
}

impl Decimal {
    pub const fn new(mantissa: i64, scale: i8) -> Self {
        Self { mantissa, scale }
    }

    /// Mantissa expressed at `target` scale, or `None` if inexact or out of
    /// range.
    pub fn rescale(&self, target: i8) -> Option<i64> {
        if self.mantissa == 0 {
            return Some(0);
        }
        let diff = i32::from(target) - i32::from(self.scale);
        if diff >= 0 {
            let factor = 10i64.checked_pow(diff as u32)?;
            self.mantissa.checked_mul(factor)
        } else {
            let factor = 10i64.checked_pow(diff.unsigned_abs())?;
            if self.mantissa % factor != 0 {
                return None;
            }
            Some(self.mantissa / factor)
        }
    }

    /// Same value with trailing zeros of the mantissa removed.
    pub fn normalized(&self) -> Self {
        let mut mantissa = self.mantissa;
        let mut scale = self.scale;
        if mantissa == 0 {
            return Self::new(0, 0);
        }
        while mantissa % 10 == 0 && scale > i8::MIN {
            mantissa /= 10;
            scale -= 1;
        }
        Self::new(mantissa, scale)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.mantissa == b.mantissa && a.scale == b.scale
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let normalized = self.normalized();
        normalized.mantissa.hash(state);
        normalized.scale.hash(state);
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::new(value, 0)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_scaled(f, self.mantissa < 0, &self.mantissa.unsigned_abs().to_string(), self.scale)
    }
}

/// Error returned when parsing a decimal literal fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError(pub String);

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid decimal literal '{}'", self.0)
    }
}

impl std::error::Error for ParseDecimalError {}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let (integral, fraction) = s.split_once('.').unwrap_or((s, ""));
        let scale = i8::try_from(fraction.len()).map_err(|_| err())?;
        if fraction.starts_with(['+', '-']) {
            return Err(err());
        }
        let digits = format!("{}{}", integral, fraction);
        let mantissa = digits.parse::<i64>().map_err(|_| err())?;
        Ok(Self::new(mantissa, scale))
    }
}

fn format_scaled(f: &mut fmt::Formatter<'_>, negative: bool, digits: &str, scale: i8) -> fmt::Result {
    if negative {
        write!(f, "-")?;
    }
    if scale <= 0 {
        write!(f, "{}", digits)?;
        if digits != "0" {
            for _ in 0..scale.unsigned_abs() {
                write!(f, "0")?;
            }
        }
        return Ok(());
    }
    let scale = scale as usize;
    if digits.len() > scale {
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        write!(f, "{}.{}", int_part, frac_part)
    } else {
        write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
    }
}

// ---------------------------------------------------------------------------
// Arbitrary precision
// ---------------------------------------------------------------------------

/// Arbitrary-precision integer held as minimal two's-complement big-endian
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigInt {
    bytes: Vec<u8>,
}

impl BigInt {
    pub fn zero() -> Self {
        Self { bytes: vec![0] }
    }

    /// Build from two's-complement big-endian bytes; redundant sign bytes
    /// are stripped. Empty input is zero.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::zero();
        }
        let mut start = 0;
        while start + 1 < bytes.len() {
            let (lead, next) = (bytes[start], bytes[start + 1]);
            let redundant = (lead == 0x00 && next & 0x80 == 0) || (lead == 0xFF && next & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        Self {
            bytes: bytes[start..].to_vec(),
        }
    }

    pub fn from_i128(value: i128) -> Self {
        Self::from_be_bytes(&value.to_be_bytes())
    }

    pub fn to_i128(&self) -> Option<i128> {
        if self.bytes.len() > 16 {
            return None;
        }
        let fill = if self.is_negative() { 0xFF } else { 0x00 };
        let mut wide = [fill; 16];
        wide[16 - self.bytes.len()..].copy_from_slice(&self.bytes);
        Some(i128::from_be_bytes(wide))
    }

    pub fn is_negative(&self) -> bool {
        self.bytes[0] & 0x80 != 0
    }

    pub fn as_be_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Unsigned big-endian magnitude.
    fn magnitude(&self) -> Vec<u8> {
        if !self.is_negative() {
            return self.bytes.clone();
        }
        // Two's complement negation: invert, then add one.
        let mut out: Vec<u8> = self.bytes.iter().map(|b| !b).collect();
        for byte in out.iter_mut().rev() {
            let (sum, carry) = byte.overflowing_add(1);
            *byte = sum;
            if !carry {
                break;
            }
        }
        out
    }

    fn decimal_digits(&self) -> String {
        let mut magnitude = self.magnitude();
        let mut chunks = Vec::new();
        while magnitude.iter().any(|b| *b != 0) {
            let mut remainder: u64 = 0;
            for byte in magnitude.iter_mut() {
                let acc = (remainder << 8) | u64::from(*byte);
                *byte = (acc / 1_000_000_000) as u8;
                remainder = acc % 1_000_000_000;
            }
            chunks.push(remainder);
        }
        match chunks.split_last() {
            None => "0".to_string(),
            Some((head, rest)) => {
                let mut digits = head.to_string();
                for chunk in rest.iter().rev() {
                    digits.push_str(&format!("{:09}", chunk));
                }
                digits
            }
        }
    }
}

impl Default for BigInt {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for BigInt {
    fn from(value: i64) -> Self {
        Self::from_i128(i128::from(value))
    }
}

impl From<i128> for BigInt {
    fn from(value: i128) -> Self {
        Self::from_i128(value)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-")?;
        }
        write!(f, "{}", self.decimal_digits())
    }
}

/// Arbitrary-precision decimal `unscaled * 10^-scale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigDecimal {
    pub unscaled: BigInt,
    pub scale: i8,
}

impl BigDecimal {
    pub fn new(unscaled: BigInt, scale: i8) -> Self {
        Self { unscaled, scale }
    }
}

impl From<Decimal> for BigDecimal {
    fn from(value: Decimal) -> Self {
        Self::new(BigInt::from(value.mantissa), value.scale)
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.decimal_digits();
        format_scaled(f, self.unscaled.is_negative(), &digits, self.scale)
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Absolute instant as seconds and nanoseconds since the Unix epoch.
///
/// `nanos` is always below one second; negative instants carry a negative
/// `seconds` and a positive `nanos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    /// Normalizes `nanos` overflow into `seconds`, saturating at `i64::MAX`.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self {
            seconds: seconds.saturating_add(i64::from(nanos / 1_000_000_000)),
            nanos: nanos % 1_000_000_000,
        }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1_000),
            nanos: (millis.rem_euclid(1_000) * 1_000_000) as u32,
        }
    }

    pub fn total_nanos(&self) -> i128 {
        i128::from(self.seconds) * NANOS_PER_SECOND + i128::from(self.nanos)
    }

    pub fn from_total_nanos(nanos: i128) -> Option<Self> {
        let seconds = i64::try_from(nanos.div_euclid(NANOS_PER_SECOND)).ok()?;
        Some(Self {
            seconds,
            nanos: nanos.rem_euclid(NANOS_PER_SECOND) as u32,
        })
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }

    /// RFC 3339 rendering in `timezone` (`"UTC"`, `"Z"` or `"+hh:mm"`).
    /// Unknown timezones and out-of-range instants fall back to UTC or the
    /// raw representation.
    pub fn format_in(&self, timezone: Option<&str>) -> String {
        let Some(datetime) = self.to_datetime() else {
            return format!("{}.{:09}s", self.seconds, self.nanos);
        };
        match timezone.and_then(crate::types::parse_timezone) {
            Some(offset) => datetime
                .with_timezone(&offset)
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            None => datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self {
            seconds: datetime.timestamp(),
            nanos: datetime.timestamp_subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_in(None))
    }
}

// ---------------------------------------------------------------------------
// Enum, group, value
// ---------------------------------------------------------------------------

/// Enumeration value. `symbol == None` marks an id with no known symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub id: i32,
    pub symbol: Option<String>,
}

impl EnumValue {
    pub fn new(id: i32, symbol: impl Into<String>) -> Self {
        Self {
            id,
            symbol: Some(symbol.into()),
        }
    }

    pub fn unknown(id: i32) -> Self {
        Self { id, symbol: None }
    }

    pub fn is_known(&self) -> bool {
        self.symbol.is_some()
    }
}

/// Remote field with no local counterpart, kept as its raw wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Instance of a group: field values by name.
///
/// A field that is absent from `fields` (or set to [`Value::Null`]) is
/// encoded as absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupValue {
    pub group: String,
    pub fields: BTreeMap<String, Value>,
    pub unknown_fields: Vec<UnknownField>,
}

impl GroupValue {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            fields: BTreeMap::new(),
            unknown_fields: Vec::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Present, non-null field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn unknown_field(&self, name: &str) -> Option<&UnknownField> {
        self.unknown_fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Binary(Vec<u8>),
    Decimal(Decimal),
    BigInt(BigInt),
    BigDecimal(BigDecimal),
    Time(Timestamp),
    Enum(EnumValue),
    Sequence(Vec<Value>),
    Group(Box<GroupValue>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Decimal(_) => "decimal",
            Value::BigInt(_) => "bigint",
            Value::BigDecimal(_) => "bigdecimal",
            Value::Time(_) => "time",
            Value::Enum(_) => "enum",
            Value::Sequence(_) => "sequence",
            Value::Group(_) => "group",
        }
    }

    /// Any integer variant widened to `i128`.
    pub fn as_integer(&self) -> Option<i128> {
        let value = match self {
            Value::I8(v) => i128::from(*v),
            Value::I16(v) => i128::from(*v),
            Value::I32(v) => i128::from(*v),
            Value::I64(v) => i128::from(*v),
            Value::U8(v) => i128::from(*v),
            Value::U16(v) => i128::from(*v),
            Value::U32(v) => i128::from(*v),
            Value::U64(v) => i128::from(*v),
            _ => return None,
        };
        Some(value)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupValue> {
        match self {
            Value::Group(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from_for_value {
    ($($type:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$type> for Value {
                fn from(value: $type) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    &str => String,
    Vec<u8> => Binary,
    Decimal => Decimal,
    BigInt => BigInt,
    BigDecimal => BigDecimal,
    Timestamp => Time,
    EnumValue => Enum,
    Vec<Value> => Sequence,
);

impl From<GroupValue> for Value {
    fn from(value: GroupValue) -> Self {
        Value::Group(Box::new(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_equality_is_numeric() {
        assert_eq!(Decimal::new(150, 2), Decimal::new(15, 1));
        assert_ne!(Decimal::new(150, 2), Decimal::new(15, 2));
        assert_eq!(Decimal::new(0, 5), Decimal::new(0, -3));
    }

    #[test]
    fn test_decimal_rescale() {
        let d = Decimal::new(125, 1);
        assert_eq!(d.rescale(2), Some(1250));
        assert_eq!(d.rescale(1), Some(125));
        assert_eq!(d.rescale(0), None);
        assert_eq!(Decimal::new(1200, 2).rescale(0), Some(12));
        assert_eq!(Decimal::new(i64::MAX, 0).rescale(1), None);
        // Zero rescales to any scale, however far apart.
        assert_eq!(Decimal::new(0, 21).rescale(2), Some(0));
        assert_eq!(Decimal::new(0, -40).rescale(i8::MAX), Some(0));
        assert_eq!(Decimal::new(5, 30).rescale(2), None);
    }

    #[test]
    fn test_decimal_parse_and_display() {
        let d: Decimal = "-12.50".parse().expect("parse");
        assert_eq!(d.mantissa, -1250);
        assert_eq!(d.scale, 2);
        assert_eq!(d.to_string(), "-12.50");
        assert_eq!(Decimal::new(5, 3).to_string(), "0.005");
        assert_eq!(Decimal::new(7, -2).to_string(), "700");
        assert!("1.-5".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_bigint_minimal_bytes() {
        assert_eq!(BigInt::from(0i64).as_be_bytes(), &[0x00]);
        assert_eq!(BigInt::from(127i64).as_be_bytes(), &[0x7F]);
        assert_eq!(BigInt::from(128i64).as_be_bytes(), &[0x00, 0x80]);
        assert_eq!(BigInt::from(-1i64).as_be_bytes(), &[0xFF]);
        assert_eq!(BigInt::from(-128i64).as_be_bytes(), &[0x80]);
        assert_eq!(BigInt::from(-129i64).as_be_bytes(), &[0xFF, 0x7F]);
        assert_eq!(BigInt::from_be_bytes(&[]), BigInt::zero());
    }

    #[test]
    fn test_bigint_display_beyond_i128() {
        let value = BigInt::from(i128::MAX);
        assert_eq!(value.to_string(), i128::MAX.to_string());
        assert_eq!(BigInt::from(i128::MIN).to_string(), i128::MIN.to_string());

        // 2^128
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&[0u8; 16]);
        let huge = BigInt::from_be_bytes(&bytes);
        assert_eq!(huge.to_i128(), None);
        assert_eq!(huge.to_string(), "340282366920938463463374607431768211456");
    }

    #[test]
    fn test_big_decimal_display() {
        let value = BigDecimal::new(BigInt::from(-31415i64), 4);
        assert_eq!(value.to_string(), "-3.1415");
    }

    #[test]
    fn test_timestamp_normalization() {
        assert_eq!(Timestamp::new(1, 1_500_000_000), Timestamp::new(2, 500_000_000));
        let before = Timestamp::from_millis(-1);
        assert_eq!(before.seconds, -1);
        assert_eq!(before.nanos, 999_000_000);
        assert_eq!(before.total_nanos(), -1_000_000);
        assert_eq!(Timestamp::from_total_nanos(-1_000_000), Some(before));

        let last = Timestamp::new(i64::MAX, 1_500_000_000);
        assert_eq!(last.seconds, i64::MAX);
        assert_eq!(last.nanos, 500_000_000);
    }

    #[test]
    fn test_timestamp_format_in_timezone() {
        let ts = Timestamp::new(0, 0);
        assert_eq!(ts.format_in(None), "1970-01-01T00:00:00Z");
        assert_eq!(ts.format_in(Some("+02:00")), "1970-01-01T02:00:00+02:00");
        assert_eq!(ts.format_in(Some("Bogus/Zone")), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_group_value_absent_fields() {
        let group = GroupValue::new("Position")
            .with("quantity", Decimal::new(10, 0))
            .with("label", Option::<String>::None);
        assert!(group.get("quantity").is_some());
        assert!(group.get("label").is_none());
        assert!(group.get("missing").is_none());
    }
}
