//! Date normalization for statement cells.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::patterns::{DATE_NUMERIC, DATE_YMD, DAY_ORDINAL};

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// How to read an all-numeric date whose first two parts could both be a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `05/01/2024` is 5 January.
    #[default]
    DayFirst,
    /// `05/01/2024` is 1 May.
    MonthFirst,
    /// Ambiguous numeric dates are rejected.
    Strict,
}

/// Normalize a date cell using day-first resolution.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    normalize_date_with(raw, DateOrder::DayFirst)
}

/// Normalize a date cell into a calendar date.
///
/// Returns `None` for anything that is not a complete date, including
/// day-month pairs without a year.
pub fn normalize_date_with(raw: &str, order: DateOrder) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = DATE_YMD.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_NUMERIC.captures(s) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3])?;
        let (day, month) = resolve_day_month(first, second, order)?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    parse_textual(s)
}

fn resolve_day_month(first: u32, second: u32, order: DateOrder) -> Option<(u32, u32)> {
    if first > 12 {
        return Some((first, second));
    }
    if second > 12 {
        return Some((second, first));
    }
    match order {
        DateOrder::DayFirst => Some((first, second)),
        DateOrder::MonthFirst => Some((second, first)),
        DateOrder::Strict if first == second => Some((first, second)),
        DateOrder::Strict => None,
    }
}

/// Dates spelled with a month name: "5 Apr 2024", "Apr 5, 2024", "05-Apr-24".
fn parse_textual(s: &str) -> Option<NaiveDate> {
    let lowered = s.to_lowercase();
    let tokens = lowered
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '-' | '/' | '.'))
        .filter(|t| !t.is_empty());

    let mut month = None;
    let mut numbers: Vec<&str> = Vec::new();

    for token in tokens {
        if token.chars().all(|c| c.is_ascii_digit()) {
            numbers.push(token);
        } else if let Some(caps) = DAY_ORDINAL.captures(token) {
            numbers.push(caps.get(1)?.as_str());
        } else if let Some(m) = month_from_name(token) {
            if month.is_some() {
                return None;
            }
            month = Some(m);
        } else if !is_weekday(token) {
            return None;
        }
    }

    let month = month?;
    // Missing year: refuse to guess one.
    let (day, year) = match numbers.as_slice() {
        [a, b] if a.len() == 4 => (*b, *a),
        [a, b] => (*a, *b),
        _ => return None,
    };

    let day: u32 = day.parse().ok()?;
    let year = parse_year(year)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_from_name(token: &str) -> Option<u32> {
    if token.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|name| name.starts_with(token))
        .map(|idx| idx as u32 + 1)
}

fn is_weekday(token: &str) -> bool {
    token.len() >= 3 && WEEKDAYS.iter().any(|name| name.starts_with(token))
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        2 if year <= 50 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}
