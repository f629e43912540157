//! Canonical story timeline moments.
//!
//! Story records arrive with dates in several shapes: a bare year
//! (`1933`), an ISO date or timestamp (`"1933-02-27"`,
//! `"1933-02-27T21:00:00Z"`), or nothing at all. Everything downstream of
//! the loader works with [`Moment`], a day-granularity point in time, so
//! this module is the only place that knows about the raw shapes.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when text cannot be read as a [`Moment`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid date: {0}")]
pub struct MomentParseError(pub String);

/// A point on the story timeline, at day granularity.
///
/// Serializes as an ISO `YYYY-MM-DD` string.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Moment(NaiveDate);

impl Moment {
    /// Create a moment from a calendar date.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// January 1 of the given year.
    pub fn start_of_year(year: i32) -> Option<Self> {
        Self::from_ymd(year, 1, 1)
    }

    /// The underlying calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The calendar year of this moment.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Read a moment from free-form text.
    ///
    /// Accepts a bare (optionally negative) year, `YYYY-MM`, `YYYY-MM-DD`,
    /// RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS` timestamps.
    /// Timestamps with an offset are read as their UTC date.
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if is_bare_year(text) {
            return text.parse::<i32>().ok().and_then(Self::start_of_year);
        }

        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(Self(date));
        }

        if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
            return Some(Self(timestamp.naive_utc().date()));
        }

        for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, pattern) {
                return Some(Self(timestamp.date()));
            }
        }

        // Year and month only, e.g. "1936-08".
        NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d")
            .ok()
            .map(Self)
    }
}

fn is_bare_year(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.len() <= 6 && digits.chars().all(|c| c.is_ascii_digit())
}

impl From<NaiveDate> for Moment {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Moment {
    type Err = MomentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s).ok_or_else(|| MomentParseError(s.to_string()))
    }
}

/// A date field exactly as it appears in a story record.
///
/// Anything that is not a number or a string lands in `Other` so that one
/// odd field never fails the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    /// A whole number, read as a year.
    Year(i64),
    /// A number with a fractional part (or one too large for `i64`).
    Number(f64),
    /// Free-form text.
    Text(String),
    /// Any other JSON value.
    Other(serde_json::Value),
}

impl RawDate {
    /// Normalize into a [`Moment`].
    ///
    /// A bare year `Y` becomes January 1 of `Y`. Numbers with a fractional
    /// part, unparseable text and other values become `None`.
    pub fn normalize(&self) -> Option<Moment> {
        match self {
            RawDate::Year(year) => i32::try_from(*year).ok().and_then(Moment::start_of_year),
            RawDate::Number(value) => {
                let whole = value.is_finite()
                    && value.fract() == 0.0
                    && *value >= f64::from(i32::MIN)
                    && *value <= f64::from(i32::MAX);
                if whole {
                    Moment::start_of_year(*value as i32)
                } else {
                    None
                }
            }
            RawDate::Text(text) => Moment::parse_lenient(text),
            RawDate::Other(_) => None,
        }
    }
}

impl From<Moment> for RawDate {
    fn from(moment: Moment) -> Self {
        RawDate::Text(moment.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> Moment {
        Moment::from_ymd(year, month, day).unwrap()
    }

    #[test]
    fn test_bare_year_is_january_first() {
        assert_eq!(RawDate::Year(1933).normalize(), Some(ymd(1933, 1, 1)));
        assert_eq!(RawDate::Number(1933.0).normalize(), Some(ymd(1933, 1, 1)));
        assert_eq!(
            RawDate::Text("1933".to_string()).normalize(),
            Some(ymd(1933, 1, 1))
        );
    }

    #[test]
    fn test_iso_shapes() {
        assert_eq!(Moment::parse_lenient("1936-08-01"), Some(ymd(1936, 8, 1)));
        assert_eq!(Moment::parse_lenient("1936-08"), Some(ymd(1936, 8, 1)));
        assert_eq!(
            Moment::parse_lenient("1938-11-09T20:00:00"),
            Some(ymd(1938, 11, 9))
        );
        assert_eq!(
            Moment::parse_lenient("1938-11-09T20:00:00.250"),
            Some(ymd(1938, 11, 9))
        );
        assert_eq!(
            Moment::parse_lenient("1938-11-09T23:30:00-02:00"),
            Some(ymd(1938, 11, 10))
        );
        assert_eq!(
            Moment::parse_lenient(" 1945-05-08T00:00:00Z "),
            Some(ymd(1945, 5, 8))
        );
    }

    #[test]
    fn test_malformed_is_absent() {
        assert_eq!(Moment::parse_lenient(""), None);
        assert_eq!(Moment::parse_lenient("sometime in the thirties"), None);
        assert_eq!(Moment::parse_lenient("1938-13-40"), None);
        assert_eq!(RawDate::Number(1933.5).normalize(), None);
        assert_eq!(RawDate::Number(f64::NAN).normalize(), None);
        assert_eq!(RawDate::Year(i64::MAX).normalize(), None);
        assert_eq!(RawDate::Other(serde_json::json!(true)).normalize(), None);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in [
            RawDate::Year(1871),
            RawDate::Text("1989-11-09".to_string()),
            RawDate::Text("1961-08-13T02:00:00Z".to_string()),
        ] {
            let once = raw.normalize().unwrap();
            let twice = RawDate::from(once).normalize().unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_raw_date_deserializes_any_json() {
        let dates: Vec<Option<RawDate>> =
            serde_json::from_str(r#"[1933, "1933-02-27", null, 12.5, {"year": 1933}]"#).unwrap();
        assert_eq!(dates[0], Some(RawDate::Year(1933)));
        assert_eq!(dates[1], Some(RawDate::Text("1933-02-27".to_string())));
        assert_eq!(dates[2], None);
        assert_eq!(dates[3], Some(RawDate::Number(12.5)));
        assert!(matches!(dates[4], Some(RawDate::Other(_))));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        let moment = ymd(1948, 6, 24);
        assert_eq!(moment.to_string(), "1948-06-24");
        assert_eq!("1948-06-24".parse::<Moment>().unwrap(), moment);
        assert!("not a date".parse::<Moment>().is_err());
    }

    #[test]
    fn test_serde_as_iso_string() {
        let json = serde_json::to_string(&ymd(1933, 1, 30)).unwrap();
        assert_eq!(json, "\"1933-01-30\"");
        let back: Moment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ymd(1933, 1, 30));
    }
}
