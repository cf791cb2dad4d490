use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// A calendar date in `YYYY-MM-DD` form, anchored to the reference timezone.
///
/// This is the sole join key between habits, completions, and progress
/// records. Construction always goes through validation; a malformed string
/// is an error, never silently coerced to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDateKey(pub String);

impl fmt::Display for InvalidDateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid date key '{}', expected YYYY-MM-DD", self.0)
    }
}

impl std::error::Error for InvalidDateKey {}

impl DateKey {
    pub fn parse(raw: &str) -> Result<Self, InvalidDateKey> {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| InvalidDateKey(raw.to_string()))?;
        // chrono tolerates unpadded fields; only the canonical form is a key.
        if date.format("%Y-%m-%d").to_string() != raw {
            return Err(InvalidDateKey(raw.to_string()));
        }
        Ok(Self(date))
    }

    /// The calendar date of `instant` as observed in `tz`.
    pub fn from_instant(instant: DateTime<Utc>, tz: Tz) -> Self {
        Self(instant.with_timezone(&tz).date_naive())
    }

    pub fn today(tz: Tz) -> Self {
        Self::from_instant(Utc::now(), tz)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, InvalidDateKey> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| InvalidDateKey(format!("{year:04}-{month:02}-{day:02}")))
    }

    /// Signed day difference `self - other`, treating both keys as
    /// midnight-anchored calendar dates. DST transitions never perturb it.
    pub fn days_between(self, other: Self) -> i64 {
        (self.0 - other.0).num_days()
    }

    pub fn offset(self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Monday of the week containing this date.
    pub fn week_start(self) -> Self {
        self.offset(-(self.0.weekday().num_days_from_monday() as i64))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    /// Day of week, Sunday-indexed (0 = Sunday), as month grids expect.
    pub fn weekday_from_sunday(self) -> u32 {
        self.0.weekday().num_days_from_sunday()
    }

    pub fn days_in_month(year: i32, month: u32) -> Result<u32, InvalidDateKey> {
        let first = Self::from_ymd(year, month, 1)?;
        let next = if month == 12 {
            Self::from_ymd(year + 1, 1, 1)?
        } else {
            Self::from_ymd(year, month + 1, 1)?
        };
        Ok(next.days_between(first) as u32)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = InvalidDateKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl de::Visitor<'_> for KeyVisitor {
            type Value = DateKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a YYYY-MM-DD date string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<DateKey, E> {
                DateKey::parse(value).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}
