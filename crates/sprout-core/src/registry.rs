//! # Registry
//!
//! Ownership-checked operations over children, milestones, activities and
//! profiles.
//!
//! Every read or mutation of a child's data first resolves the caller's
//! relation to that child. A missing relation is reported exactly like a
//! missing record, so callers cannot probe for ids they do not own.
//!
//! ## Storage Backends
//!
//! - `InMemory`: a [`MemoryStore`], volatile
//! - `Persistent`: a [`RedbStore`], disk-backed
//!
//! ## Updates
//!
//! Update structs use `Option<T>` for "leave unchanged" and, on nullable
//! fields, `Option<Option<T>>` where `Some(None)` clears the value.

use crate::content::ContentTable;
use crate::guidance::Guidance;
use crate::primitives::{
    MAX_DESCRIPTION_LENGTH, MAX_DURATION_MINUTES, MAX_NAME_LENGTH, MAX_ONBOARDING_CHILDREN,
    MAX_PHONE_LENGTH, MAX_PHOTOS, MAX_REFERENCE_LENGTH, MAX_TITLE_LENGTH, MIN_DURATION_MINUTES,
};
use crate::storage::RedbStore;
use crate::store::{MemoryStore, RecordStore};
use crate::{
    Activity, ActivityCategory, ActivityId, Child, ChildId, ChildRelation, ChildWithRelation,
    Gender, Language, Milestone, MilestoneId, Relationship, SproutError, UserId, UserProfile,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Registry.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory maps (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

// =============================================================================
// INPUTS
// =============================================================================

/// A child to register, with the caller's relation to it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChild {
    pub name: String,
    pub date_of_birth: DateTime<Utc>,
    pub gender: Gender,
    pub head_circumference_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub profile_image: Option<String>,
    pub relationship: Relationship,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildUpdate {
    pub name: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub head_circumference_cm: Option<Option<f64>>,
    pub height_cm: Option<Option<f64>>,
    pub weight_kg: Option<Option<f64>>,
    pub profile_image: Option<Option<String>>,
    pub relationship: Option<Relationship>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMilestone {
    pub child_id: ChildId,
    pub title: String,
    pub description: Option<String>,
    pub achieved_at: DateTime<Utc>,
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub achieved_at: Option<DateTime<Utc>>,
    pub photos: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub child_id: ChildId,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub category: ActivityCategory,
    pub recorded_at: DateTime<Utc>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub duration_minutes: Option<Option<u32>>,
    pub category: Option<ActivityCategory>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub image: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub language: Option<Language>,
    pub avatar: Option<Option<String>>,
}

/// Everything collected by the onboarding flow.
///
/// Every child is registered with a primary relation, whatever
/// `is_primary` says.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingSubmission {
    pub phone: Option<String>,
    pub language: Language,
    pub children: Vec<NewChild>,
}

// =============================================================================
// VIEWS
// =============================================================================

/// A milestone listed across all of a user's children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneEntry {
    pub milestone: Milestone,
    pub child_name: String,
}

/// An activity listed across all of a user's children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub activity: Activity,
    pub child_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingOutcome {
    pub profile: UserProfile,
    pub children: Vec<ChildWithRelation>,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Ownership-checked access to the record store.
///
/// Registry does NOT implement Clone: the redb handle cannot be shared that
/// way. Wrap it in a lock to share it.
#[derive(Debug, Default)]
pub struct Registry {
    backend: StorageBackend,
}

impl Registry {
    /// Create a registry with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with persistent redb storage at `path`.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, SproutError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    #[must_use]
    pub fn with_backend(backend: StorageBackend) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    fn store(&self) -> &dyn RecordStore {
        match &self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn RecordStore {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    /// Number of stored children across all users.
    pub fn child_count(&self) -> Result<usize, SproutError> {
        self.store().child_count()
    }

    // -------------------------------------------------------------------------
    // Ownership
    // -------------------------------------------------------------------------

    fn owned_child(
        &self,
        user: &UserId,
        id: ChildId,
    ) -> Result<(Child, ChildRelation), SproutError> {
        let relation = self
            .store()
            .relation(user, id)?
            .ok_or(SproutError::ChildNotFound(id))?;
        let child = self
            .store()
            .child(id)?
            .ok_or(SproutError::ChildNotFound(id))?;
        Ok((child, relation))
    }

    fn owns(&self, user: &UserId, child: ChildId) -> Result<bool, SproutError> {
        Ok(self.store().relation(user, child)?.is_some())
    }

    fn owned_milestone(&self, user: &UserId, id: MilestoneId) -> Result<Milestone, SproutError> {
        match self.store().milestone(id)? {
            Some(m) if self.owns(user, m.child_id)? => Ok(m),
            _ => Err(SproutError::MilestoneNotFound(id)),
        }
    }

    fn owned_activity(&self, user: &UserId, id: ActivityId) -> Result<Activity, SproutError> {
        match self.store().activity(id)? {
            Some(a) if self.owns(user, a.child_id)? => Ok(a),
            _ => Err(SproutError::ActivityNotFound(id)),
        }
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    /// Children related to `user`, in registration order.
    pub fn list_children(&self, user: &UserId) -> Result<Vec<ChildWithRelation>, SproutError> {
        let mut relations = self.store().relations_for_user(user)?;
        relations.sort_by_key(|r| r.child);

        let mut children = Vec::with_capacity(relations.len());
        for relation in &relations {
            if let Some(child) = self.store().child(relation.child)? {
                children.push(ChildWithRelation::new(child, relation));
            }
        }
        Ok(children)
    }

    pub fn get_child(&self, user: &UserId, id: ChildId) -> Result<ChildWithRelation, SproutError> {
        let (child, relation) = self.owned_child(user, id)?;
        Ok(ChildWithRelation::new(child, &relation))
    }

    pub fn create_child(
        &mut self,
        user: &UserId,
        new: NewChild,
        now: DateTime<Utc>,
    ) -> Result<ChildWithRelation, SproutError> {
        let new = validate_new_child(new)?;
        self.insert_child(user, new, now)
    }

    fn insert_child(
        &mut self,
        user: &UserId,
        new: NewChild,
        now: DateTime<Utc>,
    ) -> Result<ChildWithRelation, SproutError> {
        let id = ChildId(self.store_mut().allocate_id()?);
        let child = Child {
            id,
            name: new.name,
            date_of_birth: new.date_of_birth,
            gender: new.gender,
            head_circumference_cm: new.head_circumference_cm,
            height_cm: new.height_cm,
            weight_kg: new.weight_kg,
            profile_image: new.profile_image,
            created_at: now,
            updated_at: now,
        };
        let relation = ChildRelation {
            user: user.clone(),
            child: id,
            relationship: new.relationship,
            is_primary: new.is_primary,
            created_at: now,
        };

        self.store_mut().insert_child_with_relation(&child, &relation)?;
        Ok(ChildWithRelation::new(child, &relation))
    }

    pub fn update_child(
        &mut self,
        user: &UserId,
        id: ChildId,
        update: ChildUpdate,
        now: DateTime<Utc>,
    ) -> Result<ChildWithRelation, SproutError> {
        let (mut child, mut relation) = self.owned_child(user, id)?;

        if let Some(name) = update.name {
            child.name = required_text("name", &name, MAX_NAME_LENGTH)?;
        }
        if let Some(date_of_birth) = update.date_of_birth {
            child.date_of_birth = date_of_birth;
        }
        if let Some(gender) = update.gender {
            child.gender = gender;
        }
        if let Some(value) = update.head_circumference_cm {
            child.head_circumference_cm = measurement("head_circumference_cm", value)?;
        }
        if let Some(value) = update.height_cm {
            child.height_cm = measurement("height_cm", value)?;
        }
        if let Some(value) = update.weight_kg {
            child.weight_kg = measurement("weight_kg", value)?;
        }
        if let Some(value) = update.profile_image {
            child.profile_image = reference("profile_image", value)?;
        }
        child.updated_at = now;

        let relation_changed = update.relationship.is_some() || update.is_primary.is_some();
        if let Some(relationship) = update.relationship {
            relation.relationship = relationship;
        }
        if let Some(is_primary) = update.is_primary {
            relation.is_primary = is_primary;
        }

        if relation_changed {
            self.store_mut().insert_child_with_relation(&child, &relation)?;
        } else {
            self.store_mut().put_child(&child)?;
        }
        Ok(ChildWithRelation::new(child, &relation))
    }

    /// Remove the caller's relation to a child.
    ///
    /// Returns true when this was the last relation and the child, with its
    /// milestones and activities, was removed as well.
    pub fn delete_child(&mut self, user: &UserId, id: ChildId) -> Result<bool, SproutError> {
        self.owned_child(user, id)?;
        self.store_mut().unlink_child(user, id)
    }

    /// Guidance for a child at `now`.
    pub fn guidance(
        &self,
        user: &UserId,
        id: ChildId,
        now: DateTime<Utc>,
        table: &ContentTable,
    ) -> Result<Guidance, SproutError> {
        let (child, _) = self.owned_child(user, id)?;
        if child.date_of_birth > now {
            return Err(SproutError::BirthDateInFuture);
        }
        Ok(Guidance::assemble(child.date_of_birth, now, table))
    }

    // -------------------------------------------------------------------------
    // Milestones
    // -------------------------------------------------------------------------

    /// Milestones of all the user's children, most recently achieved first.
    pub fn list_milestones(&self, user: &UserId) -> Result<Vec<MilestoneEntry>, SproutError> {
        let mut entries = Vec::new();
        for child in self.list_children(user)? {
            for milestone in self.store().milestones_for_child(child.child.id)? {
                entries.push(MilestoneEntry {
                    milestone,
                    child_name: child.child.name.clone(),
                });
            }
        }
        entries.sort_by(|a, b| {
            b.milestone
                .achieved_at
                .cmp(&a.milestone.achieved_at)
                .then(b.milestone.id.cmp(&a.milestone.id))
        });
        Ok(entries)
    }

    pub fn get_milestone(&self, user: &UserId, id: MilestoneId) -> Result<Milestone, SproutError> {
        self.owned_milestone(user, id)
    }

    pub fn create_milestone(
        &mut self,
        user: &UserId,
        new: NewMilestone,
        now: DateTime<Utc>,
    ) -> Result<Milestone, SproutError> {
        self.owned_child(user, new.child_id)?;

        let title = required_text("title", &new.title, MAX_TITLE_LENGTH)?;
        let description = optional_text("description", new.description, MAX_DESCRIPTION_LENGTH)?;
        let photos = photos(new.photos)?;

        let milestone = Milestone {
            id: MilestoneId(self.store_mut().allocate_id()?),
            child_id: new.child_id,
            title,
            description,
            achieved_at: new.achieved_at,
            photos,
            created_at: now,
            updated_at: now,
        };
        self.store_mut().put_milestone(&milestone)?;
        Ok(milestone)
    }

    pub fn update_milestone(
        &mut self,
        user: &UserId,
        id: MilestoneId,
        update: MilestoneUpdate,
        now: DateTime<Utc>,
    ) -> Result<Milestone, SproutError> {
        let mut milestone = self.owned_milestone(user, id)?;

        if let Some(title) = update.title {
            milestone.title = required_text("title", &title, MAX_TITLE_LENGTH)?;
        }
        if let Some(description) = update.description {
            milestone.description =
                optional_text("description", description, MAX_DESCRIPTION_LENGTH)?;
        }
        if let Some(achieved_at) = update.achieved_at {
            milestone.achieved_at = achieved_at;
        }
        if let Some(list) = update.photos {
            milestone.photos = photos(list)?;
        }
        milestone.updated_at = now;

        self.store_mut().put_milestone(&milestone)?;
        Ok(milestone)
    }

    pub fn delete_milestone(&mut self, user: &UserId, id: MilestoneId) -> Result<(), SproutError> {
        self.owned_milestone(user, id)?;
        self.store_mut().remove_milestone(id)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Activities
    // -------------------------------------------------------------------------

    /// Activities of all the user's children, most recently recorded first.
    pub fn list_activities(&self, user: &UserId) -> Result<Vec<ActivityEntry>, SproutError> {
        let mut entries = Vec::new();
        for child in self.list_children(user)? {
            for activity in self.store().activities_for_child(child.child.id)? {
                entries.push(ActivityEntry {
                    activity,
                    child_name: child.child.name.clone(),
                });
            }
        }
        entries.sort_by(|a, b| {
            b.activity
                .recorded_at
                .cmp(&a.activity.recorded_at)
                .then(b.activity.id.cmp(&a.activity.id))
        });
        Ok(entries)
    }

    pub fn get_activity(&self, user: &UserId, id: ActivityId) -> Result<Activity, SproutError> {
        self.owned_activity(user, id)
    }

    pub fn create_activity(
        &mut self,
        user: &UserId,
        new: NewActivity,
        now: DateTime<Utc>,
    ) -> Result<Activity, SproutError> {
        self.owned_child(user, new.child_id)?;

        let title = required_text("title", &new.title, MAX_TITLE_LENGTH)?;
        let description = optional_text("description", new.description, MAX_DESCRIPTION_LENGTH)?;
        let duration_minutes = duration(new.duration_minutes)?;
        let image = reference("image", new.image)?;

        let activity = Activity {
            id: ActivityId(self.store_mut().allocate_id()?),
            child_id: new.child_id,
            title,
            description,
            duration_minutes,
            category: new.category,
            recorded_at: new.recorded_at,
            image,
            created_at: now,
            updated_at: now,
        };
        self.store_mut().put_activity(&activity)?;
        Ok(activity)
    }

    pub fn update_activity(
        &mut self,
        user: &UserId,
        id: ActivityId,
        update: ActivityUpdate,
        now: DateTime<Utc>,
    ) -> Result<Activity, SproutError> {
        let mut activity = self.owned_activity(user, id)?;

        if let Some(title) = update.title {
            activity.title = required_text("title", &title, MAX_TITLE_LENGTH)?;
        }
        if let Some(description) = update.description {
            activity.description =
                optional_text("description", description, MAX_DESCRIPTION_LENGTH)?;
        }
        if let Some(minutes) = update.duration_minutes {
            activity.duration_minutes = duration(minutes)?;
        }
        if let Some(category) = update.category {
            activity.category = category;
        }
        if let Some(recorded_at) = update.recorded_at {
            activity.recorded_at = recorded_at;
        }
        if let Some(image) = update.image {
            activity.image = reference("image", image)?;
        }
        activity.updated_at = now;

        self.store_mut().put_activity(&activity)?;
        Ok(activity)
    }

    pub fn delete_activity(&mut self, user: &UserId, id: ActivityId) -> Result<(), SproutError> {
        self.owned_activity(user, id)?;
        self.store_mut().remove_activity(id)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Profile and onboarding
    // -------------------------------------------------------------------------

    pub fn profile(&self, user: &UserId) -> Result<Option<UserProfile>, SproutError> {
        self.store().profile(user)
    }

    /// Apply `update` to the user's profile, creating it if absent.
    pub fn update_profile(
        &mut self,
        user: &UserId,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, SproutError> {
        let mut profile = self
            .store()
            .profile(user)?
            .unwrap_or_else(|| UserProfile::new(user.clone(), now));

        if let Some(name) = update.display_name {
            profile.display_name = optional_text("display_name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(phone) = update.phone {
            profile.phone = optional_text("phone", phone, MAX_PHONE_LENGTH)?;
        }
        if let Some(language) = update.language {
            profile.language = language;
        }
        if let Some(avatar) = update.avatar {
            profile.avatar = reference("avatar", avatar)?;
        }
        profile.updated_at = now;

        self.store_mut().put_profile(&profile)?;
        Ok(profile)
    }

    /// Mark onboarding complete and register the submitted children.
    ///
    /// All children are validated before anything is written.
    pub fn complete_onboarding(
        &mut self,
        user: &UserId,
        submission: OnboardingSubmission,
        now: DateTime<Utc>,
    ) -> Result<OnboardingOutcome, SproutError> {
        if submission.children.len() > MAX_ONBOARDING_CHILDREN {
            return Err(SproutError::InvalidInput(format!(
                "at most {} children per onboarding",
                MAX_ONBOARDING_CHILDREN
            )));
        }

        let phone = optional_text("phone", submission.phone, MAX_PHONE_LENGTH)?;
        let children = submission
            .children
            .into_iter()
            .map(|new| {
                validate_new_child(NewChild {
                    is_primary: true,
                    ..new
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut profile = self
            .store()
            .profile(user)?
            .unwrap_or_else(|| UserProfile::new(user.clone(), now));
        profile.phone = phone;
        profile.language = submission.language;
        profile.onboarding_completed = true;
        profile.updated_at = now;
        self.store_mut().put_profile(&profile)?;

        let mut created = Vec::with_capacity(children.len());
        for new in children {
            created.push(self.insert_child(user, new, now)?);
        }

        Ok(OnboardingOutcome {
            profile,
            children: created,
        })
    }
}

// =============================================================================
// INPUT BOUNDS
// =============================================================================

fn validate_new_child(new: NewChild) -> Result<NewChild, SproutError> {
    Ok(NewChild {
        name: required_text("name", &new.name, MAX_NAME_LENGTH)?,
        head_circumference_cm: measurement("head_circumference_cm", new.head_circumference_cm)?,
        height_cm: measurement("height_cm", new.height_cm)?,
        weight_kg: measurement("weight_kg", new.weight_kg)?,
        profile_image: reference("profile_image", new.profile_image)?,
        ..new
    })
}

/// Trimmed, non-empty, at most `max` bytes.
fn required_text(field: &str, value: &str, max: usize) -> Result<String, SproutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SproutError::InvalidInput(format!("{} is required", field)));
    }
    if trimmed.len() > max {
        return Err(SproutError::InvalidInput(format!(
            "{} exceeds {} bytes",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

/// Trimmed; empty becomes `None`.
fn optional_text(
    field: &str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, SproutError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => required_text(field, trimmed, max).map(Some),
    }
}

fn reference(field: &str, value: Option<String>) -> Result<Option<String>, SproutError> {
    optional_text(field, value, MAX_REFERENCE_LENGTH)
}

fn measurement(field: &str, value: Option<f64>) -> Result<Option<f64>, SproutError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(SproutError::InvalidInput(format!(
            "{} must be a non-negative number",
            field
        ))),
        other => Ok(other),
    }
}

fn duration(value: Option<u32>) -> Result<Option<u32>, SproutError> {
    match value {
        Some(m) if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&m) => {
            Err(SproutError::InvalidInput(format!(
                "duration must be between {} and {} minutes",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            )))
        }
        other => Ok(other),
    }
}

fn photos(list: Vec<String>) -> Result<Vec<String>, SproutError> {
    if list.len() > MAX_PHOTOS {
        return Err(SproutError::InvalidInput(format!(
            "at most {} photos",
            MAX_PHOTOS
        )));
    }
    let mut kept = Vec::with_capacity(list.len());
    for photo in list {
        if let Some(photo) = reference("photos", Some(photo))? {
            kept.push(photo);
        }
    }
    Ok(kept)
}

// =============================================================================
// TESTS
// =============================================================================
