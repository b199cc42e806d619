use crate::error::{AppError, AppResult};
use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})-([0-9]{4})$").expect("static regex"));

/// Parses `MM-YYYY` into the first day of that month at UTC midnight.
pub fn parse_month_year(text: &str) -> AppResult<DateTime<Utc>> {
    let invalid = || AppError::InvalidDateFormat(text.to_string());

    let caps = MONTH_YEAR.captures(text).ok_or_else(invalid)?;
    let month: u32 = caps[1].parse().map_err(|_| invalid())?;
    let year: i32 = caps[2].parse().map_err(|_| invalid())?;

    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(invalid)
}

pub fn format_month_year(date: &DateTime<Utc>) -> String {
    format!("{:02}-{:04}", date.month(), date.year())
}

/// Last day of the month that starts at `month_start`, UTC midnight.
pub fn last_day_of_month(month_start: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    month_start
        .checked_add_months(Months::new(1))
        .map(|next| next - Duration::days(1))
        .ok_or_else(|| AppError::InvalidDateFormat(format_month_year(&month_start)))
}
