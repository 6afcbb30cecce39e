//! Lazy parsing of temporal literals
//!
//! Typed scalars keep their lexical form until a comparison needs the
//! calendar value; parse failures surface as [`Error::ParseValue`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| Error::ParseValue(format!("ill-formed date: '{}'", input)))
}

pub(crate) fn parse_time(input: &str) -> Result<NaiveTime> {
    let s = input.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| Error::ParseValue(format!("ill-formed time: '{}'", input)))
}

/// A dateTime literal, offset-aware or naive depending on the lexical form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DateTimeValue {
    Offset(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

pub(crate) fn parse_datetime(input: &str) -> Result<DateTimeValue> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(DateTimeValue::Offset(dt));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map(DateTimeValue::Naive)
        .map_err(|_| Error::ParseValue(format!("ill-formed dateTime: '{}'", input)))
}

/// Parsed ISO-8601 duration.
///
/// Durations carrying years or months have no fixed length in seconds, so
/// ordering them is refused at the comparison layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct IsoDuration {
    pub years: f64,
    pub months: f64,
    pub weeks: f64,
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
    pub negative: bool,
}

impl IsoDuration {
    /// Parse `[-]PnYnMnWnDTnHnMnS`; decimal components are accepted.
    pub fn parse(input: &str) -> Result<Self> {
        let original = input;
        let mut s = input.trim();

        let mut duration = IsoDuration::default();
        if let Some(rest) = s.strip_prefix('-') {
            duration.negative = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('+') {
            s = rest;
        }

        let Some(body) = s.strip_prefix('P') else {
            return Err(ill_formed(original));
        };

        let mut in_time = false;
        let mut saw_component = false;
        let mut number = String::new();

        for c in body.chars() {
            if c == 'T' && !in_time && number.is_empty() {
                in_time = true;
                continue;
            }
            if c.is_ascii_digit() || c == '.' {
                number.push(c);
                continue;
            }
            if c == ',' {
                // Comma is the ISO-8601 alternative decimal mark
                number.push('.');
                continue;
            }

            if number.is_empty() {
                return Err(ill_formed(original));
            }
            let value: f64 = number.parse().map_err(|_| ill_formed(original))?;
            number.clear();
            saw_component = true;

            match (in_time, c) {
                (false, 'Y') => duration.years = value,
                (false, 'M') => duration.months = value,
                (false, 'W') => duration.weeks = value,
                (false, 'D') => duration.days = value,
                (true, 'H') => duration.hours = value,
                (true, 'M') => duration.minutes = value,
                (true, 'S') => duration.seconds = value,
                _ => return Err(ill_formed(original)),
            }
        }

        if !number.is_empty() || !saw_component {
            return Err(ill_formed(original));
        }

        Ok(duration)
    }

    pub fn has_year_or_month(&self) -> bool {
        self.years != 0.0 || self.months != 0.0
    }

    /// Total seconds of the week-and-smaller components.
    pub fn total_seconds(&self) -> f64 {
        let seconds = self.weeks * 604_800.0
            + self.days * 86_400.0
            + self.hours * 3_600.0
            + self.minutes * 60.0
            + self.seconds;
        if self.negative {
            -seconds
        } else {
            seconds
        }
    }
}

fn ill_formed(input: &str) -> Error {
    Error::ParseValue(format!("ill-formed duration: '{}'", input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2023-02-18").is_ok());
        assert!(parse_date("2023-13-01").is_err());
        assert!(parse_date("not a date").is_err());
    }

    #[test]
    fn test_parse_time_forms() {
        assert!(parse_time("14:30").is_ok());
        assert!(parse_time("14:30:05").is_ok());
        assert!(parse_time("14:30:05.250").is_ok());
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn test_parse_datetime_offset_and_naive() {
        assert!(matches!(
            parse_datetime("2023-02-18T14:00:00Z"),
            Ok(DateTimeValue::Offset(_))
        ));
        assert!(matches!(
            parse_datetime("2023-02-18T14:00:00"),
            Ok(DateTimeValue::Naive(_))
        ));
    }

    #[test]
    fn test_duration_components() {
        let d = IsoDuration::parse("P3Y6M4DT12H30M5S").unwrap();
        assert_eq!(d.years, 3.0);
        assert_eq!(d.months, 6.0);
        assert_eq!(d.days, 4.0);
        assert_eq!(d.hours, 12.0);
        assert!(d.has_year_or_month());

        let t = IsoDuration::parse("PT1H30M").unwrap();
        assert!(!t.has_year_or_month());
        assert_eq!(t.total_seconds(), 5400.0);
    }

    #[test]
    fn test_duration_negative_and_weeks() {
        let d = IsoDuration::parse("-P1W").unwrap();
        assert_eq!(d.total_seconds(), -604_800.0);
    }

    #[test]
    fn test_duration_rejects_garbage() {
        assert!(IsoDuration::parse("P").is_err());
        assert!(IsoDuration::parse("PT").is_err());
        assert!(IsoDuration::parse("1H30M").is_err());
        assert!(IsoDuration::parse("P1X").is_err());
        assert!(IsoDuration::parse("P1H").is_err()); // hours need the T section
    }
}
