//! Coverage date normalization.
//!
//! Spreadsheets from different locales and office suites disagree on day
//! and month order and on whether dates are text or serial day counts, so
//! a raw value is tried against a fixed chain of interpretations and the
//! first calendar-valid result wins.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate, NaiveDateTime};
use regex::Regex;

pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// Largest serial spreadsheets can represent (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));
static SLASHED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid regex"));
static SERIAL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid regex"));

const GENERIC_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%m/%d/%y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

const GENERIC_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

type Interpretation = fn(&str) -> Option<NaiveDate>;

/// Tried in order; the first hit wins.
const INTERPRETATIONS: &[Interpretation] = &[
    parse_canonical,
    parse_day_month_year,
    parse_month_day_year,
    parse_serial,
    parse_generic,
];

/// Returns the canonical `YYYY-MM-DD` form, or `None` if no interpretation
/// yields a real calendar date.
pub fn normalize_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    INTERPRETATIONS
        .iter()
        .find_map(|interpret| interpret(s))
        .map(|d| d.format(CANONICAL_FORMAT).to_string())
}

/// Empty input takes `default`; unresolvable input is kept as-is so that
/// validation can report it.
pub fn normalize_or_default(raw: &str, default: &str) -> String {
    if raw.trim().is_empty() {
        return default.to_string();
    }
    normalize_date(raw).unwrap_or_else(|| raw.to_string())
}

pub fn is_valid_date(value: &str) -> bool {
    normalize_date(value).is_some()
}

fn parse_canonical(s: &str) -> Option<NaiveDate> {
    if !ISO_DATE.is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, CANONICAL_FORMAT).ok()
}

fn slashed_parts(s: &str) -> Option<(u32, u32, i32)> {
    let caps = SLASHED_DATE.captures(s)?;
    Some((
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    ))
}

fn parse_day_month_year(s: &str) -> Option<NaiveDate> {
    let (d, m, y) = slashed_parts(s)?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn parse_month_day_year(s: &str) -> Option<NaiveDate> {
    let (m, d, y) = slashed_parts(s)?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Excel-style day count. The 1899-12-30 epoch absorbs the phantom
/// 1900-02-29 for every serial after 60.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(Days::new(serial.trunc() as u64))
}

fn parse_serial(s: &str) -> Option<NaiveDate> {
    if !SERIAL_DATE.is_match(s) {
        return None;
    }
    serial_to_date(s.parse().ok()?)
}

fn parse_generic(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    GENERIC_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
        .or_else(|| {
            GENERIC_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

/// Default coverage window: the whole plan year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageDefaults {
    pub start: String,
    pub end: String,
}

impl CoverageDefaults {
    pub fn for_plan_year(year: i32) -> Self {
        Self {
            start: format!("{year:04}-01-01"),
            end: format!("{year:04}-12-31"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_is_idempotent() {
        for s in ["2025-01-01", "2024-02-29", "1999-12-31"] {
            assert_eq!(normalize_date(s).as_deref(), Some(s));
            let once = normalize_date(s).unwrap();
            assert_eq!(normalize_date(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_day_month_year_wins_when_month_invalid_otherwise() {
        assert_eq!(normalize_date("15/03/2025").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date("5/3/2025").as_deref(), Some("2025-03-05"));
    }

    #[test]
    fn test_month_day_year_fallback() {
        assert_eq!(normalize_date("03/15/2025").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date("12/31/2025").as_deref(), Some("2025-12-31"));
    }

    #[test]
    fn test_serial_dates() {
        assert_eq!(normalize_date("45000").as_deref(), Some("2023-03-15"));
        assert_eq!(normalize_date("45667").as_deref(), Some("2025-01-10"));
        assert_eq!(normalize_date("45667.75").as_deref(), Some("2025-01-10"));
        assert_eq!(normalize_date("61").as_deref(), Some("1900-03-01"));
        assert_eq!(normalize_date("0"), None);
        assert_eq!(normalize_date("99999999"), None);
    }

    #[test]
    fn test_generic_formats() {
        assert_eq!(normalize_date("2025/03/15").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date("15-03-2025").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date("15 Mar 2025").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date("March 15, 2025").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date("2025-03-15T10:30:00").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date("2025-03-15T10:30:00+05:00").as_deref(), Some("2025-03-15"));
    }

    #[test]
    fn test_calendar_invalid_rejected() {
        assert_eq!(normalize_date("2025-02-30"), None);
        assert_eq!(normalize_date("31/31/2025"), None);
        assert_eq!(normalize_date("2025-13-01"), None);
        assert_eq!(normalize_date("next tuesday"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn test_normalize_or_default() {
        assert_eq!(normalize_or_default("", "2025-01-01"), "2025-01-01");
        assert_eq!(normalize_or_default("   ", "2025-01-01"), "2025-01-01");
        assert_eq!(normalize_or_default("15/03/2025", "2025-01-01"), "2025-03-15");
        assert_eq!(normalize_or_default("soon", "2025-01-01"), "soon");
    }

    #[test]
    fn test_coverage_defaults_span_plan_year() {
        let d = CoverageDefaults::for_plan_year(2026);
        assert_eq!(d.start, "2026-01-01");
        assert_eq!(d.end, "2026-12-31");
        assert!(is_valid_date(&d.start) && is_valid_date(&d.end));
    }
}
