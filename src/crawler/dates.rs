use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone};
use std::time::Duration;

/// Query date format used by both flight APIs.
pub const QUERY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Departure window of one search: from `from` up to `to`, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Window covering `today` up to the first day of the next month.
    pub fn starting(today: NaiveDate) -> Self {
        Self {
            from: today,
            to: first_day_of_next_month(today),
        }
    }

    pub fn today() -> Self {
        Self::starting(Local::now().date_naive())
    }

    pub fn query_dates(&self) -> (String, String) {
        (format_query_date(self.from), format_query_date(self.to))
    }
}

pub fn format_query_date(date: NaiveDate) -> String {
    date.format(QUERY_DATE_FORMAT).to_string()
}

pub fn first_day_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    // Day 1 exists in every month
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Time left until the next local midnight.
pub fn until_next_midnight(now: DateTime<Local>) -> Duration {
    let next_day = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or(now.date_naive());
    let midnight = next_day.and_hms_opt(0, 0, 0).unwrap_or_default();

    let remaining = match Local.from_local_datetime(&midnight).earliest() {
        Some(local_midnight) => local_midnight.signed_duration_since(now),
        // Midnight skipped by a DST jump
        None => midnight.signed_duration_since(now.naive_local()),
    };

    remaining.to_std().unwrap_or(Duration::ZERO)
}
