//! Report date normalization.
//!
//! Upstream exposure dates arrive as 8-digit (`YYYYMMDD`), 6-digit (`YYYYMM`)
//! or 4-digit (`YYYY`) strings, or as ISO dates once a normalizer has touched
//! them. Missing or unreadable bounds are replaced with the extreme date for
//! that side of the interval, so an exposure without an end date is treated
//! as still ongoing.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized report date `{raw}`")]
pub struct DateParseError {
    pub raw: String,
}

/// Which side of an exposure interval a date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

impl DateBound {
    /// Sentinel used when the bound is absent or unreadable.
    pub const fn sentinel(self) -> NaiveDate {
        match self {
            DateBound::Start => NaiveDate::MIN,
            DateBound::End => NaiveDate::MAX,
        }
    }
}

/// Parse one report date.
pub fn parse_report_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let s = raw.trim();
    let err = || DateParseError {
        raw: raw.to_string(),
    };

    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = |digits: &str| digits.parse::<i32>().map_err(|_| err());
        let part = |digits: &str| digits.parse::<u32>().map_err(|_| err());
        let date = match s.len() {
            8 => NaiveDate::from_ymd_opt(year(&s[0..4])?, part(&s[4..6])?, part(&s[6..8])?),
            6 => NaiveDate::from_ymd_opt(year(&s[0..4])?, part(&s[4..6])?, 1),
            4 => NaiveDate::from_ymd_opt(year(s)?, 1, 1),
            _ => None,
        };
        return date.ok_or_else(err);
    }

    // ISO date, optionally followed by a time component.
    if s.len() >= 10 && s.is_char_boundary(10) {
        let (date, rest) = s.split_at(10);
        if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('T') {
            return NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| err());
        }
    }

    Err(err())
}

/// Resolve an optional raw bound to a concrete date.
///
/// Returns the date and whether a present value failed to parse.
pub fn resolve_bound(raw: Option<&str>, bound: DateBound) -> (NaiveDate, bool) {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => (bound.sentinel(), false),
        Some(value) => match parse_report_date(value) {
            Ok(date) => (date, false),
            Err(_) => (bound.sentinel(), true),
        },
    }
}
