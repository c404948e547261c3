//! # Stage Classification
//!
//! Maps a child's age to one developmental stage and expands that stage into
//! the small window of stages worth showing next to it.
//!
//! ## Stage Definitions
//!
//! | Tier | Condition (first match wins) | Stage |
//! |------|------------------------------|-------|
//! | days   | ≤ 7, ≤ 14, ≤ 21, ≤ 28 | Week 1 .. Week 4 |
//! | weeks  | ≤ 6, ≤ 8, ≤ 12        | Week 5-6, Week 7-8, Week 9-12 |
//! | months | ≤ 2                   | 1-2 Months |
//! | months | < 4, < 5, < 6, < 7    | 3 Months .. 6 Months |
//! | months | < 12, < 18, < 24, < 36 | 7-12 Months, 1 Year, 18-24 Months, 2-3 Years |
//! | -      | otherwise             | 3 Years |
//!
//! ## Important Note
//!
//! The week tiers use inclusive bounds and the month tiers (after the first)
//! use exclusive bounds. The two sets of thresholds were chosen independently
//! and overlap around 12-13 weeks; ordered evaluation makes the result
//! deterministic. The operators are kept exactly as authored so that stage
//! assignment matches existing content.

use super::age::AgeSpan;
use crate::SproutError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

// =============================================================================
// STAGE THRESHOLDS
// =============================================================================

/// Inclusive day limits for Week 1 through Week 4.
pub const WEEK_1_MAX_DAYS: i64 = 7;
pub const WEEK_2_MAX_DAYS: i64 = 14;
pub const WEEK_3_MAX_DAYS: i64 = 21;
pub const WEEK_4_MAX_DAYS: i64 = 28;

/// Inclusive week limits for the multi-week stages.
pub const WEEKS_5_6_MAX_WEEKS: i64 = 6;
pub const WEEKS_7_8_MAX_WEEKS: i64 = 8;
pub const WEEKS_9_12_MAX_WEEKS: i64 = 12;

/// Inclusive month limit for 1-2 Months.
pub const MONTHS_1_2_MAX_MONTHS: i64 = 2;

/// Exclusive month limits for the remaining stages.
pub const MONTHS_3_BELOW: i64 = 4;
pub const MONTHS_4_BELOW: i64 = 5;
pub const MONTHS_5_BELOW: i64 = 6;
pub const MONTHS_6_BELOW: i64 = 7;
pub const MONTHS_7_12_BELOW: i64 = 12;
pub const YEAR_1_BELOW: i64 = 18;
pub const MONTHS_18_24_BELOW: i64 = 24;
pub const YEARS_2_3_BELOW: i64 = 36;

// =============================================================================
// STAGE ENUM
// =============================================================================

/// Developmental stage, totally ordered from birth onwards.
///
/// Serializes as its display label (`"Week 5-6"`, `"1 Year"`, ...), which is
/// also the key used by the guidance content table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "Week 1")]
    Week1,
    #[serde(rename = "Week 2")]
    Week2,
    #[serde(rename = "Week 3")]
    Week3,
    #[serde(rename = "Week 4")]
    Week4,
    #[serde(rename = "Week 5-6")]
    Weeks5To6,
    #[serde(rename = "Week 7-8")]
    Weeks7To8,
    #[serde(rename = "Week 9-12")]
    Weeks9To12,
    #[serde(rename = "1-2 Months")]
    Months1To2,
    #[serde(rename = "3 Months")]
    Months3,
    #[serde(rename = "4 Months")]
    Months4,
    #[serde(rename = "5 Months")]
    Months5,
    #[serde(rename = "6 Months")]
    Months6,
    #[serde(rename = "7-12 Months")]
    Months7To12,
    #[serde(rename = "1 Year")]
    Year1,
    #[serde(rename = "18-24 Months")]
    Months18To24,
    #[serde(rename = "2-3 Years")]
    Years2To3,
    #[serde(rename = "3 Years")]
    Years3,
}

impl Stage {
    /// Every stage, in order.
    pub const ORDER: [Stage; 17] = [
        Stage::Week1,
        Stage::Week2,
        Stage::Week3,
        Stage::Week4,
        Stage::Weeks5To6,
        Stage::Weeks7To8,
        Stage::Weeks9To12,
        Stage::Months1To2,
        Stage::Months3,
        Stage::Months4,
        Stage::Months5,
        Stage::Months6,
        Stage::Months7To12,
        Stage::Year1,
        Stage::Months18To24,
        Stage::Years2To3,
        Stage::Years3,
    ];

    /// Get the stage label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Week1 => "Week 1",
            Stage::Week2 => "Week 2",
            Stage::Week3 => "Week 3",
            Stage::Week4 => "Week 4",
            Stage::Weeks5To6 => "Week 5-6",
            Stage::Weeks7To8 => "Week 7-8",
            Stage::Weeks9To12 => "Week 9-12",
            Stage::Months1To2 => "1-2 Months",
            Stage::Months3 => "3 Months",
            Stage::Months4 => "4 Months",
            Stage::Months5 => "5 Months",
            Stage::Months6 => "6 Months",
            Stage::Months7To12 => "7-12 Months",
            Stage::Year1 => "1 Year",
            Stage::Months18To24 => "18-24 Months",
            Stage::Years2To3 => "2-3 Years",
            Stage::Years3 => "3 Years",
        }
    }

    /// Look a stage up by its exact label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Stage> {
        Self::ORDER.iter().copied().find(|s| s.label() == label)
    }

    /// Position in [`Stage::ORDER`].
    #[must_use]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        Self::ORDER.get(self.index().saturating_add(1)).copied()
    }

    /// Get the previous stage, if any.
    #[must_use]
    pub fn previous(&self) -> Option<Stage> {
        self.index()
            .checked_sub(1)
            .and_then(|i| Self::ORDER.get(i).copied())
    }

    /// Check if this stage is terminal (3 Years).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Years3)
    }

    /// Classify an age span. Total: every span maps to exactly one stage.
    #[must_use]
    pub fn for_age(age: &AgeSpan) -> Stage {
        let days = age.total_days;
        let weeks = age.total_weeks;
        let months = age.total_months;

        if days <= WEEK_1_MAX_DAYS {
            Stage::Week1
        } else if days <= WEEK_2_MAX_DAYS {
            Stage::Week2
        } else if days <= WEEK_3_MAX_DAYS {
            Stage::Week3
        } else if days <= WEEK_4_MAX_DAYS {
            Stage::Week4
        } else if weeks <= WEEKS_5_6_MAX_WEEKS {
            Stage::Weeks5To6
        } else if weeks <= WEEKS_7_8_MAX_WEEKS {
            Stage::Weeks7To8
        } else if weeks <= WEEKS_9_12_MAX_WEEKS {
            Stage::Weeks9To12
        } else if months <= MONTHS_1_2_MAX_MONTHS {
            Stage::Months1To2
        } else if months < MONTHS_3_BELOW {
            Stage::Months3
        } else if months < MONTHS_4_BELOW {
            Stage::Months4
        } else if months < MONTHS_5_BELOW {
            Stage::Months5
        } else if months < MONTHS_6_BELOW {
            Stage::Months6
        } else if months < MONTHS_7_12_BELOW {
            Stage::Months7To12
        } else if months < YEAR_1_BELOW {
            Stage::Year1
        } else if months < MONTHS_18_24_BELOW {
            Stage::Months18To24
        } else if months < YEARS_2_3_BELOW {
            Stage::Years2To3
        } else {
            Stage::Years3
        }
    }

    /// The current stage plus its successor, restricted to stages present
    /// in `available`, in stage order. May be empty.
    #[must_use]
    pub fn relevant_window<C: StageCatalog + ?Sized>(self, available: &C) -> Vec<Stage> {
        std::iter::once(self)
            .chain(self.next())
            .filter(|s| available.has_stage(s.label()))
            .collect()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::from_label(s)
            .ok_or_else(|| SproutError::InvalidInput(format!("unknown stage '{}'", s)))
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classify the stage of a child born at `birth`, as of `now`.
///
/// Callers guarantee `birth <= now`; this function does not validate.
#[must_use]
pub fn classify_stage(birth: DateTime<Utc>, now: DateTime<Utc>) -> Stage {
    Stage::for_age(&AgeSpan::between(birth, now))
}

/// Label-level window selection.
///
/// A label outside the stage sequence comes back alone and unfiltered.
#[must_use]
pub fn relevant_window_labels<C: StageCatalog + ?Sized>(
    current: &str,
    available: &C,
) -> Vec<String> {
    match Stage::from_label(current) {
        Some(stage) => stage
            .relevant_window(available)
            .into_iter()
            .map(|s| s.label().to_string())
            .collect(),
        None => vec![current.to_string()],
    }
}

// =============================================================================
// STAGE CATALOG
// =============================================================================

/// The set of stage labels that have content authored for them.
///
/// Content coverage may be sparse; window selection only returns stages the
/// catalog knows.
pub trait StageCatalog {
    fn has_stage(&self, label: &str) -> bool;
}

impl StageCatalog for BTreeSet<String> {
    fn has_stage(&self, label: &str) -> bool {
        self.contains(label)
    }
}

impl StageCatalog for BTreeSet<&str> {
    fn has_stage(&self, label: &str) -> bool {
        self.contains(label)
    }
}

impl StageCatalog for [&str] {
    fn has_stage(&self, label: &str) -> bool {
        self.contains(&label)
    }
}

impl StageCatalog for Vec<String> {
    fn has_stage(&self, label: &str) -> bool {
        self.iter().any(|l| l == label)
    }
}

// =============================================================================
// TESTS
// =============================================================================
