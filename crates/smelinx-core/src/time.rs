// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing and canonical formatting of instants and dates.
//!
//! Every instant is normalized to UTC before it is stored or compared.
//! Stored instants use a fixed-width format so lexical order in SQL matches
//! chronological order.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, SecondsFormat, Utc};

use crate::error::SmelinxError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Years that fit the four-digit storage form. Anything outside would break
/// the lexical ordering the due query depends on.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// Parse a caller-supplied instant.
///
/// Accepts RFC 3339 with any offset, or a bare `YYYY-MM-DD` which is read as
/// midnight UTC. The UTC year must lie in 0000..=9999.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, SmelinxError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SmelinxError::Validation("scheduled_at required".to_string()));
    }
    let instant = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.with_timezone(&Utc)
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        date.and_time(NaiveTime::MIN).and_utc()
    } else {
        return Err(SmelinxError::Validation(
            "scheduled_at must be RFC3339 or YYYY-MM-DD".to_string(),
        ));
    };
    if !YEAR_RANGE.contains(&instant.year()) {
        return Err(SmelinxError::Validation(
            "scheduled_at year must be between 0000 and 9999".to_string(),
        ));
    }
    Ok(instant)
}

/// Parse a `YYYY-MM-DD` date. Empty input yields `None`.
pub fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, SmelinxError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .ok()
            .filter(|date| YEAR_RANGE.contains(&date.year()))
            .map(Some)
            .ok_or_else(|| SmelinxError::Validation("invalid sunset_date (YYYY-MM-DD)".to_string())),
    }
}

/// Canonical storage form: `2025-08-17T12:30:00.000000000Z`.
///
/// Always nine fractional digits, so every instant round-trips exactly and
/// the text stays fixed width.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Inverse of [`format_instant`]; tolerant of any RFC 3339 input.
pub fn parse_stored_instant(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_stored_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn offsets_normalize_to_the_same_instant() {
        let eastern = parse_instant("2025-08-17T08:30:00-04:00").unwrap();
        let utc = parse_instant("2025-08-17T12:30:00Z").unwrap();
        assert_eq!(eastern, utc);
        assert_eq!(format_instant(eastern), "2025-08-17T12:30:00.000000000Z");
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        let parsed = parse_instant("2025-12-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn garbage_instant_is_validation_error() {
        let err = parse_instant("next tuesday").unwrap_err();
        assert!(matches!(err, SmelinxError::Validation(_)));
        let err = parse_instant("   ").unwrap_err();
        assert!(matches!(err, SmelinxError::Validation(m) if m.contains("required")));
    }

    #[test]
    fn stored_instants_sort_lexically() {
        let a = format_instant(Utc.with_ymd_and_hms(2025, 8, 17, 9, 59, 59).unwrap());
        let b = format_instant(Utc.with_ymd_and_hms(2025, 8, 17, 10, 0, 0).unwrap());
        assert!(a < b);
    }

    #[test]
    fn stored_instant_roundtrip() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 14, 5, 9).unwrap();
        assert_eq!(parse_stored_instant(&format_instant(now)).unwrap(), now);
    }

    #[test]
    fn sub_millisecond_instants_roundtrip_exactly() {
        let parsed = parse_instant("2025-08-17T12:30:00.999999Z").unwrap();
        let stored = format_instant(parsed);
        assert_eq!(stored, "2025-08-17T12:30:00.999999000Z");
        assert_eq!(parse_stored_instant(&stored).unwrap(), parsed);

        let nanos = Utc.with_ymd_and_hms(2025, 8, 17, 12, 30, 0).unwrap()
            + chrono::TimeDelta::nanoseconds(1);
        assert_eq!(parse_stored_instant(&format_instant(nanos)).unwrap(), nanos);
    }

    #[test]
    fn fractional_digits_do_not_break_ordering() {
        let whole = format_instant(parse_instant("2025-08-17T12:30:00Z").unwrap());
        let later = format_instant(parse_instant("2025-08-17T12:30:00.000001Z").unwrap());
        assert!(whole < later);
    }

    #[test]
    fn years_outside_four_digits_are_rejected() {
        for raw in ["+10000-01-01", "+10000-01-01T00:00:00Z", "0000-01-01T00:30:00+01:00"] {
            let err = parse_instant(raw).unwrap_err();
            assert!(matches!(err, SmelinxError::Validation(_)), "{raw}");
        }
        assert!(parse_instant("9999-12-31T23:59:59Z").is_ok());
        assert!(parse_instant("0000-01-01").is_ok());
        assert!(parse_date(Some("+10000-01-01")).is_err());
    }

    #[test]
    fn date_parsing() {
        assert_eq!(parse_date(None).unwrap(), None);
        assert_eq!(parse_date(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_date(Some("2025-12-01")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 1)
        );
        assert!(parse_date(Some("12/01/2025")).is_err());
    }
}
