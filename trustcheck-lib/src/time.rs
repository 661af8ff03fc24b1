//! ASN.1 time values and the clock used for validity checks.

use crate::der::{tag, Reader};
use crate::{Error, Result};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Source of "now" for date-validity checks.
pub trait Clock {
    /// Current time as a Unix timestamp.
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// A fixed instant, for tests and `--attime`.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Which end of a validity window was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateBound {
    /// The object is not yet valid.
    Before,
    /// The object has expired.
    After,
}

impl std::fmt::Display for DateBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateBound::Before => f.write_str("not yet valid"),
            DateBound::After => f.write_str("expired"),
        }
    }
}

/// Encoding an [`Asn1Time`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeFormat {
    UtcTime,
    GeneralizedTime,
}

/// A UTCTime or GeneralizedTime: the exact DER content plus its parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asn1Time {
    raw: Vec<u8>,
    format: TimeFormat,
    timestamp: i64,
}

impl Asn1Time {
    /// Read a UTCTime or GeneralizedTime element.
    pub fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let offset = reader.position();
        match reader.peek_tag() {
            Some(tag::UTC_TIME) => Self::parse_utc(reader.read_content(tag::UTC_TIME)?),
            Some(tag::GENERALIZED_TIME) => {
                Self::parse_generalized(reader.read_content(tag::GENERALIZED_TIME)?)
            }
            Some(found) => Err(Error::UnexpectedTag {
                expected: tag::UTC_TIME,
                found,
                offset,
            }),
            None => Err(Error::BufferTooShort { offset }),
        }
    }

    /// Parse `YYMMDDHHMMSSZ`. Years below 50 are 20YY, otherwise 19YY.
    pub fn parse_utc(raw: &[u8]) -> Result<Self> {
        let (digits, rest) = split_digits(raw, 12)?;
        if rest != b"Z" {
            return Err(invalid(raw));
        }
        let yy = pair(digits, 0);
        let year = if yy < 50 { 2000 + yy } else { 1900 + yy };
        let timestamp = to_timestamp(
            raw,
            year,
            pair(digits, 2),
            pair(digits, 4),
            pair(digits, 6),
            pair(digits, 8),
            pair(digits, 10),
        )?;
        Ok(Asn1Time {
            raw: raw.to_vec(),
            format: TimeFormat::UtcTime,
            timestamp,
        })
    }

    /// Parse `YYYYMMDDHHMMSS[.fff]Z`. Fractional seconds are truncated.
    pub fn parse_generalized(raw: &[u8]) -> Result<Self> {
        let (digits, mut rest) = split_digits(raw, 14)?;
        if let Some(frac) = rest.strip_prefix(b".") {
            let n = frac.iter().take_while(|b| b.is_ascii_digit()).count();
            if n == 0 {
                return Err(invalid(raw));
            }
            rest = frac.get(n..).unwrap_or_default();
        }
        if rest != b"Z" {
            return Err(invalid(raw));
        }
        let year = pair(digits, 0) * 100 + pair(digits, 2);
        let timestamp = to_timestamp(
            raw,
            year,
            pair(digits, 4),
            pair(digits, 6),
            pair(digits, 8),
            pair(digits, 10),
            pair(digits, 12),
        )?;
        Ok(Asn1Time {
            raw: raw.to_vec(),
            format: TimeFormat::GeneralizedTime,
            timestamp,
        })
    }

    /// Exact content octets as they appeared in the DER.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn format(&self) -> TimeFormat {
        self.format
    }

    /// Unix timestamp (seconds, UTC).
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// ISO 8601 rendering (`2025-01-01T00:00:00Z`).
    pub fn iso8601(&self) -> String {
        match OffsetDateTime::from_unix_timestamp(self.timestamp) {
            Ok(dt) => format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
                dt.year(),
                u8::from(dt.month()),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second()
            ),
            Err(_) => String::from_utf8_lossy(&self.raw).into_owned(),
        }
    }

    /// Format in OpenSSL's default date style: `Feb  3 23:57:06 2026 GMT`.
    pub fn to_openssl(&self) -> String {
        match OffsetDateTime::from_unix_timestamp(self.timestamp) {
            Ok(dt) => {
                let month = match u8::from(dt.month()) {
                    1 => "Jan",
                    2 => "Feb",
                    3 => "Mar",
                    4 => "Apr",
                    5 => "May",
                    6 => "Jun",
                    7 => "Jul",
                    8 => "Aug",
                    9 => "Sep",
                    10 => "Oct",
                    11 => "Nov",
                    12 => "Dec",
                    _ => "???",
                };
                format!(
                    "{} {:2} {:02}:{:02}:{:02} {} GMT",
                    month,
                    dt.day(),
                    dt.hour(),
                    dt.minute(),
                    dt.second(),
                    dt.year()
                )
            }
            Err(_) => self.iso8601(),
        }
    }
}

impl std::fmt::Display for Asn1Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_openssl())
    }
}

impl Serialize for Asn1Time {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Asn1Time", 3)?;
        s.serialize_field("raw", &String::from_utf8_lossy(&self.raw))?;
        s.serialize_field("iso8601", &self.iso8601())?;
        s.serialize_field("timestamp", &self.timestamp)?;
        s.end()
    }
}

/// Outcome of comparing a validity window against a clock.
///
/// Both ends are evaluated independently so callers can report "not yet
/// valid" and "expired" separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Validity {
    pub not_yet_valid: bool,
    pub expired: bool,
}

impl Validity {
    /// Evaluate `[not_before, not_after]` at `now`, widening each end by its
    /// skew tolerance. Both boundaries are inclusive.
    pub fn evaluate(
        not_before: i64,
        not_after: i64,
        now: i64,
        skew_before: i64,
        skew_after: i64,
    ) -> Self {
        Validity {
            not_yet_valid: now.saturating_add(skew_before) < not_before,
            expired: now.saturating_sub(skew_after) > not_after,
        }
    }

    /// The error to surface, if any. An expired window wins over a
    /// not-yet-valid one.
    pub fn error(&self) -> Option<DateBound> {
        if self.expired {
            Some(DateBound::After)
        } else if self.not_yet_valid {
            Some(DateBound::Before)
        } else {
            None
        }
    }
}

/// Encode a Unix timestamp as UTCTime content (`YYMMDDHHMMSSZ`).
///
/// Only years 1950 through 2049 are representable.
pub fn encode_utc_time(timestamp: i64) -> Result<String> {
    let dt = from_timestamp(timestamp)?;
    if !(1950..2050).contains(&dt.year()) {
        return Err(Error::InvalidTime(format!(
            "year {} outside UTCTime range",
            dt.year()
        )));
    }
    Ok(format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}Z",
        dt.year() % 100,
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    ))
}

/// Encode a Unix timestamp as GeneralizedTime content (`YYYYMMDDHHMMSSZ`).
pub fn encode_generalized_time(timestamp: i64) -> Result<String> {
    let dt = from_timestamp(timestamp)?;
    Ok(format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}Z",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    ))
}

fn from_timestamp(timestamp: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| Error::InvalidTime(format!("{}: {}", timestamp, e)))
}

fn invalid(raw: &[u8]) -> Error {
    Error::InvalidTime(String::from_utf8_lossy(raw).into_owned())
}

/// Split off exactly `n` leading ASCII digits.
fn split_digits(raw: &[u8], n: usize) -> Result<(&[u8], &[u8])> {
    if raw.len() < n {
        return Err(invalid(raw));
    }
    let (digits, rest) = raw.split_at(n);
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid(raw));
    }
    Ok((digits, rest))
}

/// Two-digit decimal at `at`; the caller has verified every byte is a digit.
fn pair(digits: &[u8], at: usize) -> i32 {
    let d = |i: usize| digits.get(i).map_or(0, |b| i32::from(b - b'0'));
    d(at) * 10 + d(at + 1)
}

fn to_timestamp(
    raw: &[u8],
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    minute: i32,
    second: i32,
) -> Result<i64> {
    let month = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(|| invalid(raw))?;
    let day = u8::try_from(day).map_err(|_| invalid(raw))?;
    let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid(raw))?;
    let hms = |v: i32| u8::try_from(v).map_err(|_| invalid(raw));
    let time = Time::from_hms(hms(hour)?, hms(minute)?, hms(second)?).map_err(|_| invalid(raw))?;
    Ok(PrimitiveDateTime::new(date, time).assume_utc().unix_timestamp())
}
