//! Week arithmetic: which calendar week the survey targets and the seven
//! dates that week covers.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::{Error, Result};

/// Weekday display names, index-aligned with day index 0-6 (Monday = 0).
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One weekday of the target week.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayInfo {
    pub label: &'static str,
    pub date: NaiveDate,
}

impl DayInfo {
    /// `DD.MM.YYYY`, the date format used in all rendered messages.
    pub fn date_label(&self) -> String {
        self.date.format("%d.%m.%Y").to_string()
    }
}

/// Week number the next survey targets: the week after the reference
/// date's, rolling over to week 1 past the end of the ISO year.
pub fn target_week(reference: NaiveDate) -> u32 {
    let iso = reference.iso_week();
    let next = iso.week() + 1;
    if next > weeks_in_year(iso.year()) {
        1
    } else {
        next
    }
}

/// The seven dates of `week`, Monday first.
///
/// The ISO year is anchored at `today + 1 day`; week numbers past the end
/// of that year wrap into the following year.
pub fn days_of_week(week: u32, today: NaiveDate) -> Result<Vec<DayInfo>> {
    let anchor = today + Duration::days(1);
    let monday = monday_of_week(anchor.iso_week().year(), week)
        .ok_or_else(|| Error::Week(format!("no Monday for week {week}")))?;

    Ok((0..7i64)
        .map(|i| DayInfo {
            label: WEEKDAY_NAMES[i as usize],
            date: monday + Duration::days(i),
        })
        .collect())
}

fn monday_of_week(year: i32, week: u32) -> Option<NaiveDate> {
    let in_year = weeks_in_year(year);
    if week > in_year {
        NaiveDate::from_isoywd_opt(year + 1, week - in_year, Weekday::Mon)
    } else {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
    }
}

/// Number of ISO weeks in `year` (52 or 53). Dec 28 always falls in the
/// last ISO week of its year.
fn weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .unwrap_or(52)
}
