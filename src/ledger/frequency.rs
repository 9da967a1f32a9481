use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How often a recurring rule fires.
///
/// Persisted as `"None"`, `"Daily"`, `"Weekly"`, `"Monthly"` or `"Yearly"`.
/// Any other stored value is read back as [`Frequency::Daily`] so the
/// expansion loop always has a forward step to take.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "String")]
pub enum Frequency {
    None,
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub const RECURRING: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    /// Strict lookup used by user-facing input; returns `None` for unknown labels.
    pub fn from_label(value: &str) -> Option<Frequency> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Frequency::None),
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            "yearly" => Some(Frequency::Yearly),
            _ => None,
        }
    }

    /// Lenient lookup used for persisted data: unknown labels become `Daily`.
    pub fn parse(value: &str) -> Frequency {
        Self::from_label(value).unwrap_or_else(|| {
            tracing::warn!(frequency = value, "unrecognized recurrence frequency, treating as Daily");
            Frequency::Daily
        })
    }

    pub fn is_recurring(self) -> bool {
        self != Frequency::None
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::None => "None",
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
        }
    }

    /// Advances `from` by one step, keeping the time of day.
    ///
    /// Returns `None` for [`Frequency::None`], which has no step.
    pub fn advance(self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.advance_anchored(from, from.day())
    }

    /// Advances `from` by one step, aiming month and year steps at
    /// `preferred_day`.
    ///
    /// Month and year steps clamp to the last day of the target month, so
    /// Jan 31 + 1 month is Feb 29 in a leap year and Feb 28 otherwise. Passing
    /// the series' original day as `preferred_day` lets later steps return
    /// to it (Feb 29 -> Mar 31) instead of drifting.
    pub fn advance_anchored(
        self,
        from: DateTime<Utc>,
        preferred_day: u32,
    ) -> Option<DateTime<Utc>> {
        let date = from.date_naive();
        let next = match self {
            Frequency::None => return None,
            Frequency::Daily => date.checked_add_signed(Duration::days(1)),
            Frequency::Weekly => date.checked_add_signed(Duration::weeks(1)),
            Frequency::Monthly => shift_month(date, 1, preferred_day),
            Frequency::Yearly => shift_year(date, 1, preferred_day),
        }?;
        Some(DateTime::from_naive_utc_and_offset(
            next.and_time(from.time()),
            Utc,
        ))
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        Frequency::parse(&value)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn shift_month(date: NaiveDate, months: i32, preferred_day: u32) -> Option<NaiveDate> {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = preferred_day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

fn shift_year(date: NaiveDate, years: i32, preferred_day: u32) -> Option<NaiveDate> {
    let year = date.year() + years;
    let month = date.month();
    let day = preferred_day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Number of days in `month` (1-based) of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// 366 for leap years, 365 otherwise.
pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}
