//! # sprout-core
//!
//! Child-development logic for Sprout - THE LOGIC.
//!
//! This crate maps a child's age to one of seventeen developmental stages,
//! selects which authored guidance is relevant right now, and keeps the
//! records caregivers attach to each child.
//!
//! ## Modules
//!
//! - `development`: age arithmetic and the stage classifier
//! - `content`: the externally authored guidance table
//! - `guidance`: classifier + content for one child
//! - `registry`: ownership-checked records over a `RecordStore`
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - The classifier is a pure function of two instants; callers pass `now`
//! - The content table is passed in, never read from a global

// =============================================================================
// MODULES
// =============================================================================

pub mod content;
pub mod development;
pub mod guidance;
pub mod primitives;
pub mod registry;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Activity, ActivityCategory, ActivityId, Child, ChildId, ChildRelation, ChildWithRelation,
    Gender, Language, Milestone, MilestoneId, Relationship, SproutError, UserId, UserProfile,
};

// =============================================================================
// RE-EXPORTS: Classification
// =============================================================================

pub use development::{
    AgeSpan, Stage, StageCatalog, classify_stage, midnight_utc, relevant_window_labels,
};

// =============================================================================
// RE-EXPORTS: Content and Records
// =============================================================================

pub use content::{ContentEntry, ContentRow, ContentTable};
pub use guidance::Guidance;
pub use registry::{
    ActivityEntry, ActivityUpdate, ChildUpdate, MilestoneEntry, MilestoneUpdate, NewActivity,
    NewChild, NewMilestone, OnboardingOutcome, OnboardingSubmission, ProfileUpdate, Registry,
    StorageBackend,
};
pub use storage::RedbStore;
pub use store::{MemoryStore, RecordStore};
