//! # Age Arithmetic
//!
//! Day, week and calendar-month counts between a birth instant and a
//! reference instant.
//!
//! Months are calendar months: `(year difference * 12) + month difference`,
//! ignoring the day of month. A child born on Jan 31 is one month old on
//! Feb 1. The stage thresholds were chosen against this count, so it must not
//! be replaced by `days / 30`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;
const DAYS_PER_WEEK: i64 = 7;
const MONTHS_PER_YEAR: i64 = 12;

/// Elapsed time between birth and a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeSpan {
    /// `floor((now - birth) / 1 day)`
    pub total_days: i64,
    /// `floor(total_days / 7)`
    pub total_weeks: i64,
    /// Calendar month difference, read in UTC.
    pub total_months: i64,
}

impl AgeSpan {
    /// Measure the span from `birth` to `now`.
    ///
    /// `birth <= now` is expected; earlier reference instants yield negative
    /// counts rather than an error.
    #[must_use]
    pub fn between(birth: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let elapsed = now.signed_duration_since(birth);
        let total_days = elapsed.num_seconds().div_euclid(SECONDS_PER_DAY);
        let total_weeks = total_days.div_euclid(DAYS_PER_WEEK);

        let year_diff = i64::from(now.year()) - i64::from(birth.year());
        let month_diff = i64::from(now.month()) - i64::from(birth.month());
        let total_months = year_diff
            .saturating_mul(MONTHS_PER_YEAR)
            .saturating_add(month_diff);

        Self {
            total_days,
            total_weeks,
            total_months,
        }
    }

    /// Measure between two calendar dates, both taken at midnight UTC.
    #[must_use]
    pub fn between_dates(birth: NaiveDate, today: NaiveDate) -> Self {
        Self::between(midnight_utc(birth), midnight_utc(today))
    }

    /// Whole years.
    #[must_use]
    pub fn years(&self) -> i64 {
        self.total_months.div_euclid(MONTHS_PER_YEAR)
    }

    /// Months past the last whole year.
    #[must_use]
    pub fn months(&self) -> i64 {
        self.total_months.rem_euclid(MONTHS_PER_YEAR)
    }

    /// Human-readable age, e.g. `"3 weeks old"` or `"1 year 2 months old"`.
    ///
    /// Weeks are used under 12 weeks, months under a year, then years with
    /// the remaining months.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.total_months < MONTHS_PER_YEAR {
            if self.total_weeks < 12 {
                return format!("{} old", plural(self.total_weeks, "week"));
            }
            return format!("{} old", plural(self.total_months, "month"));
        }

        let mut out = plural(self.years(), "year");
        if self.months() > 0 {
            out.push(' ');
            out.push_str(&plural(self.months(), "month"));
        }
        out.push_str(" old");
        out
    }
}

/// The instant at 00:00:00 UTC on `date`.
#[must_use]
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

// =============================================================================
// TESTS
// =============================================================================
