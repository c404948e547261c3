//! # Guidance
//!
//! Combines the classifier with the content table: the child's age, its
//! current stage, the stages worth showing, and the content rows for them.

use crate::content::{ContentRow, ContentTable};
use crate::development::{AgeSpan, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What to show a caregiver for a child at a given instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guidance {
    pub age: AgeSpan,
    pub stage: Stage,
    /// Current stage then next stage, restricted to stages with content.
    pub window: Vec<Stage>,
    /// Content rows whose stage is in `window`, in table order.
    pub sections: Vec<ContentRow>,
}

impl Guidance {
    /// Classify `birth` at `now` and collect the matching content.
    ///
    /// Does not check `birth <= now`; see `Registry::guidance` for the
    /// guarded entry point.
    #[must_use]
    pub fn assemble(birth: DateTime<Utc>, now: DateTime<Utc>, table: &ContentTable) -> Self {
        let age = AgeSpan::between(birth, now);
        let stage = Stage::for_age(&age);
        let window = stage.relevant_window(table);

        let sections = table
            .rows()
            .iter()
            .filter(|row| window.iter().any(|s| s.label() == row.stage))
            .cloned()
            .collect();

        Self {
            age,
            stage,
            window,
            sections,
        }
    }

    /// True when the table has nothing for the current or next stage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
