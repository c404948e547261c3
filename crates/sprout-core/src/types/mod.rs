//! # Core Type Definitions
//!
//! This module contains the record types tracked by Sprout:
//! - Identifiers (`UserId`, `ChildId`, `MilestoneId`, `ActivityId`)
//! - Closed vocabularies (`Gender`, `Relationship`, `Language`, `ActivityCategory`)
//! - Records (`Child`, `ChildRelation`, `Milestone`, `Activity`, `UserProfile`)
//! - Error types (`SproutError`)
//!
//! ## Serialization
//!
//! Stored records are encoded with postcard, which is not self-describing.
//! Stored types therefore avoid `#[serde(flatten)]` and
//! `skip_serializing_if`; those belong on API views only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque identifier of an authenticated user.
///
/// Issued by the upstream authenticator; Sprout never mints user ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-allocated identifier of a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChildId(pub u64);

/// Store-allocated identifier of a recorded milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MilestoneId(pub u64);

/// Store-allocated identifier of a recorded activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub u64);

// =============================================================================
// VOCABULARIES
// =============================================================================

/// Implements `as_str`, `Display` and `FromStr` for a closed string vocabulary.
macro_rules! vocabulary {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All values in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SproutError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(SproutError::InvalidInput(format!(
                        "unknown {} '{}'",
                        $what, other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

vocabulary!(Gender, "gender", {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

/// How a user relates to a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Dad,
    Mom,
    Babysitter,
    Brother,
    Sister,
    Grandparent,
    Other,
}

vocabulary!(Relationship, "relationship", {
    Dad => "Dad",
    Mom => "Mom",
    Babysitter => "Babysitter",
    Brother => "Brother",
    Sister => "Sister",
    Grandparent => "Grandparent",
    Other => "Other",
});

/// Preferred interface language of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Assamese,
    Bengali,
    Kannada,
    Tamil,
    Marathi,
}

vocabulary!(Language, "language", {
    English => "English",
    Hindi => "Hindi",
    Assamese => "Assamese",
    Bengali => "Bengali",
    Kannada => "Kannada",
    Tamil => "Tamil",
    Marathi => "Marathi",
});

/// Kind of a recorded activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Play,
    Learning,
    Exercise,
    Meal,
    Sleep,
    Medical,
    Social,
    Creative,
    Outdoor,
    Other,
}

vocabulary!(ActivityCategory, "activity category", {
    Play => "play",
    Learning => "learning",
    Exercise => "exercise",
    Meal => "meal",
    Sleep => "sleep",
    Medical => "medical",
    Social => "social",
    Creative => "creative",
    Outdoor => "outdoor",
    Other => "other",
});

// =============================================================================
// RECORDS
// =============================================================================

/// A registered child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: ChildId,
    pub name: String,
    pub date_of_birth: DateTime<Utc>,
    pub gender: Gender,
    pub head_circumference_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Link between a user and a child. Its existence is the ownership check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRelation {
    pub user: UserId,
    pub child: ChildId,
    pub relationship: Relationship,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// A child as seen by one related user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildWithRelation {
    pub child: Child,
    pub relationship: Relationship,
    pub is_primary: bool,
    pub relation_created_at: DateTime<Utc>,
}

impl ChildWithRelation {
    #[must_use]
    pub fn new(child: Child, relation: &ChildRelation) -> Self {
        Self {
            child,
            relationship: relation.relationship,
            is_primary: relation.is_primary,
            relation_created_at: relation.created_at,
        }
    }
}

/// A milestone a user recorded for a child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub child_id: ChildId,
    pub title: String,
    pub description: Option<String>,
    pub achieved_at: DateTime<Utc>,
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An activity a user recorded for a child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub child_id: ChildId,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub category: ActivityCategory,
    pub recorded_at: DateTime<Utc>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user settings and onboarding state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: UserId,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub language: Language,
    pub avatar: Option<String>,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A fresh profile with defaults, not yet onboarded.
    #[must_use]
    pub fn new(user: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user,
            display_name: None,
            phone: None,
            language: Language::default(),
            avatar: None,
            onboarding_completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Sprout system.
///
/// - No silent failures
/// - Use `Result<T, SproutError>` for fallible operations
/// - A missing ownership relation is reported as the missing record
#[derive(Debug, Error)]
pub enum SproutError {
    /// Input failed a bound or could not be parsed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The child does not exist or is not related to the caller.
    #[error("Child not found: {0:?}")]
    ChildNotFound(ChildId),

    /// The milestone does not exist or belongs to an unrelated child.
    #[error("Milestone not found: {0:?}")]
    MilestoneNotFound(MilestoneId),

    /// The activity does not exist or belongs to an unrelated child.
    #[error("Activity not found: {0:?}")]
    ActivityNotFound(ActivityId),

    /// Classification requested for a birth date after the reference instant.
    #[error("Birth date is after the reference date")]
    BirthDateInFuture,

    /// The guidance content table could not be loaded.
    #[error("Content error: {0}")]
    ContentError(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl SproutError {
    /// True when the error means "no such record for this caller".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SproutError::ChildNotFound(_)
                | SproutError::MilestoneNotFound(_)
                | SproutError::ActivityNotFound(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
