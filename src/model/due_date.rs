//! Calendar due dates.
//!
//! A due date is a calendar day with no time-of-day or zone attached. It is
//! transmitted as UTC midnight (`2024-05-01T00:00:00.000Z`) and read back
//! from either a bare `YYYY-MM-DD` or an RFC 3339 timestamp, keeping the
//! calendar date as written. The local offset of the machine running the
//! client never takes part, so a date always redisplays as the same day.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueDate(NaiveDate);

impl DueDate {
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// Today's date in UTC.
    #[must_use]
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Tomorrow's date in UTC, the default for new tasks.
    #[must_use]
    pub fn tomorrow() -> Self {
        let today = Utc::now().date_naive();
        Self(today.checked_add_days(Days::new(1)).unwrap_or(today))
    }

    /// Parse a value coming back from the backend.
    ///
    /// Accepts `YYYY-MM-DD` or any RFC 3339 timestamp.
    pub fn parse_wire(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Some(Self(date));
        }
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Self(dt.date_naive()))
    }

    /// Canonical wire form: UTC midnight with millisecond precision.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!("{}T00:00:00.000Z", self.0.format(DATE_FORMAT))
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_wire(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid due date: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> DueDate {
        DueDate::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_wire_form_is_utc_midnight() {
        assert_eq!(ymd(2024, 5, 1).to_wire(), "2024-05-01T00:00:00.000Z");
        assert_eq!(
            serde_json::to_string(&ymd(2024, 12, 31)).unwrap(),
            r#""2024-12-31T00:00:00.000Z""#
        );
    }

    #[test]
    fn test_round_trip_keeps_calendar_date() {
        let original = ymd(2025, 3, 9);
        let back = DueDate::parse_wire(&original.to_wire()).unwrap();
        assert_eq!(back, original);
        assert_eq!(back.to_string(), "2025-03-09");
    }

    #[test]
    fn test_offset_timestamps_keep_written_date() {
        // Late evening west of UTC and early morning east of UTC both keep the written day.
        assert_eq!(
            DueDate::parse_wire("2025-03-09T23:30:00-08:00").unwrap(),
            ymd(2025, 3, 9)
        );
        assert_eq!(
            DueDate::parse_wire("2025-03-09T00:15:00+09:00").unwrap(),
            ymd(2025, 3, 9)
        );
    }

    #[test]
    fn test_parse_wire_rejects_garbage() {
        assert!(DueDate::parse_wire("05/06/2024").is_none());
        assert!(DueDate::parse_wire("").is_none());
        assert!(serde_json::from_str::<DueDate>(r#""soon""#).is_err());
    }

    #[test]
    fn test_tomorrow_follows_today() {
        let today = DueDate::today();
        let tomorrow = DueDate::tomorrow();
        assert!(tomorrow > today);
    }
}
