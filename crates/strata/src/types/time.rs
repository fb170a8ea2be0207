// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Time types: a unit counted from an epoch.
//!
//! On the wire a time value is the integer count of `unit` since `epoch`.
//! Conversions go through `i128` nanoseconds so they are exact for every
//! representable [`Timestamp`].

use crate::value::Timestamp;
use chrono::FixedOffset;
use std::fmt;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Seconds between the Unix epoch and 2000-01-01T00:00:00Z.
pub const Y2K_OFFSET_SECONDS: i64 = 946_684_800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    pub fn nanos(self) -> i128 {
        match self {
            TimeUnit::Days => 86_400 * NANOS_PER_SECOND,
            TimeUnit::Hours => 3_600 * NANOS_PER_SECOND,
            TimeUnit::Minutes => 60 * NANOS_PER_SECOND,
            TimeUnit::Seconds => NANOS_PER_SECOND,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Nanoseconds => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Days => "days",
            TimeUnit::Hours => "hours",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Milliseconds => "millis",
            TimeUnit::Microseconds => "micros",
            TimeUnit::Nanoseconds => "nanos",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let unit = match name {
            "days" => TimeUnit::Days,
            "hours" => TimeUnit::Hours,
            "minutes" => TimeUnit::Minutes,
            "seconds" => TimeUnit::Seconds,
            "millis" => TimeUnit::Milliseconds,
            "micros" => TimeUnit::Microseconds,
            "nanos" => TimeUnit::Nanoseconds,
            _ => return None,
        };
        Some(unit)
    }
}

/// Zero point of a time count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Epoch {
    #[default]
    Unix,
    /// 2000-01-01T00:00:00Z.
    Y2k,
    /// Time of day: the count is measured from midnight.
    Midnight,
}

impl Epoch {
    pub fn offset_seconds(self) -> i64 {
        match self {
            Epoch::Unix | Epoch::Midnight => 0,
            Epoch::Y2k => Y2K_OFFSET_SECONDS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Epoch::Unix => "unix",
            Epoch::Y2k => "y2k",
            Epoch::Midnight => "midnight",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "unix" => Some(Epoch::Unix),
            "y2k" => Some(Epoch::Y2k),
            "midnight" => Some(Epoch::Midnight),
            _ => None,
        }
    }
}

/// Time value shape. The timezone is display metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeType {
    pub unit: TimeUnit,
    pub epoch: Epoch,
    pub timezone: Option<String>,
}

impl TimeType {
    pub fn new(unit: TimeUnit, epoch: Epoch) -> Self {
        Self {
            unit,
            epoch,
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Whether unit and epoch may be combined.
    pub fn is_legal(&self) -> bool {
        !(self.epoch == Epoch::Midnight && self.unit == TimeUnit::Days)
    }

    /// Count of `unit` since `epoch`, or `None` if `timestamp` is not an
    /// exact multiple of the unit or the count overflows `i64`.
    pub fn to_count(&self, timestamp: &Timestamp) -> Option<i64> {
        let since_epoch = timestamp.total_nanos()
            - i128::from(self.epoch.offset_seconds()) * NANOS_PER_SECOND;
        let unit = self.unit.nanos();
        if since_epoch % unit != 0 {
            return None;
        }
        i64::try_from(since_epoch / unit).ok()
    }

    /// Timestamp for a wire count, or `None` if out of range.
    pub fn from_count(&self, count: i64) -> Option<Timestamp> {
        let nanos = i128::from(count).checked_mul(self.unit.nanos())?
            + i128::from(self.epoch.offset_seconds()) * NANOS_PER_SECOND;
        Timestamp::from_total_nanos(nanos)
    }
}

impl fmt::Display for TimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.unit.as_str(), self.epoch.as_str())?;
        if let Some(timezone) = &self.timezone {
            write!(f, " {}", timezone)?;
        }
        Ok(())
    }
}

/// Parse a display timezone: `"UTC"`, `"Z"` or a `"+hh:mm"`/`"-hh:mm"` offset.
pub(crate) fn parse_timezone(timezone: &str) -> Option<FixedOffset> {
    if timezone == "UTC" || timezone == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match timezone.as_bytes().first()? {
        b'+' => (1, &timezone[1..]),
        b'-' => (-1, &timezone[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3_600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_is_exact() {
        let millis = TimeType::new(TimeUnit::Milliseconds, Epoch::Unix);
        let ts = Timestamp::new(1_700_000_000, 123_000_000);
        assert_eq!(millis.to_count(&ts), Some(1_700_000_000_123));
        assert_eq!(millis.from_count(1_700_000_000_123), Some(ts));

        let inexact = Timestamp::new(1, 500);
        assert_eq!(millis.to_count(&inexact), None);
    }

    #[test]
    fn test_y2k_epoch_offsets() {
        let days = TimeType::new(TimeUnit::Days, Epoch::Y2k);
        let ts = Timestamp::new(Y2K_OFFSET_SECONDS + 86_400 * 3, 0);
        assert_eq!(days.to_count(&ts), Some(3));
        let before = Timestamp::new(Y2K_OFFSET_SECONDS - 86_400, 0);
        assert_eq!(days.to_count(&before), Some(-1));
        assert_eq!(days.from_count(-1), Some(before));
    }

    #[test]
    fn test_negative_sub_second_counts() {
        let micros = TimeType::new(TimeUnit::Microseconds, Epoch::Unix);
        let ts = Timestamp::new(-1, 999_999_000);
        assert_eq!(micros.to_count(&ts), Some(-1));
        assert_eq!(micros.from_count(-1), Some(ts));
    }

    #[test]
    fn test_midnight_days_is_illegal() {
        assert!(!TimeType::new(TimeUnit::Days, Epoch::Midnight).is_legal());
        assert!(TimeType::new(TimeUnit::Seconds, Epoch::Midnight).is_legal());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Z").map(|o| o.local_minus_utc()), Some(0));
        assert_eq!(
            parse_timezone("+05:30").map(|o| o.local_minus_utc()),
            Some(19_800)
        );
        assert_eq!(
            parse_timezone("-01:00").map(|o| o.local_minus_utc()),
            Some(-3_600)
        );
        assert!(parse_timezone("Europe/Paris").is_none());
        assert!(parse_timezone("+5:30").is_none());
    }

    #[test]
    fn test_unit_names_roundtrip() {
        for unit in [
            TimeUnit::Days,
            TimeUnit::Hours,
            TimeUnit::Minutes,
            TimeUnit::Seconds,
            TimeUnit::Milliseconds,
            TimeUnit::Microseconds,
            TimeUnit::Nanoseconds,
        ] {
            assert_eq!(TimeUnit::parse(unit.as_str()), Some(unit));
        }
    }
}
