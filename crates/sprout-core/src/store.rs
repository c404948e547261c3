//! # Record Store
//!
//! The storage seam for children, relations, milestones, activities and
//! profiles.
//!
//! `RecordStore` is deliberately dumb: it stores and retrieves records by key
//! and performs the child cascade. Ownership checks, validation and ordering
//! live in [`crate::registry`].
//!
//! Two implementations exist:
//! - [`MemoryStore`]: ordered maps, volatile
//! - [`crate::storage::RedbStore`]: redb tables with postcard values

use crate::{
    Activity, ActivityId, Child, ChildId, ChildRelation, Milestone, MilestoneId, SproutError,
    UserId, UserProfile,
};
use std::collections::BTreeMap;

/// Key-level access to stored records.
pub trait RecordStore {
    /// Allocate a fresh record id. Ids are never reused.
    fn allocate_id(&mut self) -> Result<u64, SproutError>;

    /// Insert or replace a child.
    fn put_child(&mut self, child: &Child) -> Result<(), SproutError>;

    /// Insert or replace a child and one relation to it in a single step.
    fn insert_child_with_relation(
        &mut self,
        child: &Child,
        relation: &ChildRelation,
    ) -> Result<(), SproutError>;

    fn child(&self, id: ChildId) -> Result<Option<Child>, SproutError>;

    /// Remove a child together with its relations, milestones and activities.
    /// Returns false if the child did not exist.
    fn remove_child(&mut self, id: ChildId) -> Result<bool, SproutError>;

    /// Insert or replace the relation for `(relation.user, relation.child)`.
    fn put_relation(&mut self, relation: &ChildRelation) -> Result<(), SproutError>;

    fn relation(&self, user: &UserId, child: ChildId)
    -> Result<Option<ChildRelation>, SproutError>;

    /// Remove one user's relation to a child. When no relation remains the
    /// child is removed with its cascade in the same step.
    ///
    /// Returns true if the child itself was removed.
    fn unlink_child(&mut self, user: &UserId, child: ChildId) -> Result<bool, SproutError>;

    /// All relations held by `user`, in child id order.
    fn relations_for_user(&self, user: &UserId) -> Result<Vec<ChildRelation>, SproutError>;

    /// All relations pointing at `child`.
    fn relations_for_child(&self, child: ChildId) -> Result<Vec<ChildRelation>, SproutError>;

    fn put_milestone(&mut self, milestone: &Milestone) -> Result<(), SproutError>;

    fn milestone(&self, id: MilestoneId) -> Result<Option<Milestone>, SproutError>;

    fn remove_milestone(&mut self, id: MilestoneId) -> Result<bool, SproutError>;

    fn milestones_for_child(&self, child: ChildId) -> Result<Vec<Milestone>, SproutError>;

    fn put_activity(&mut self, activity: &Activity) -> Result<(), SproutError>;

    fn activity(&self, id: ActivityId) -> Result<Option<Activity>, SproutError>;

    fn remove_activity(&mut self, id: ActivityId) -> Result<bool, SproutError>;

    fn activities_for_child(&self, child: ChildId) -> Result<Vec<Activity>, SproutError>;

    fn put_profile(&mut self, profile: &UserProfile) -> Result<(), SproutError>;

    fn profile(&self, user: &UserId) -> Result<Option<UserProfile>, SproutError>;

    /// Number of stored children across all users.
    fn child_count(&self) -> Result<usize, SproutError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Volatile store backed by ordered maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    next_id: u64,
    children: BTreeMap<ChildId, Child>,
    relations: BTreeMap<(ChildId, UserId), ChildRelation>,
    milestones: BTreeMap<MilestoneId, Milestone>,
    activities: BTreeMap<ActivityId, Activity>,
    profiles: BTreeMap<UserId, UserProfile>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn allocate_id(&mut self) -> Result<u64, SproutError> {
        let id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| SproutError::IoError("record id space exhausted".to_string()))?;
        self.next_id = id;
        Ok(id)
    }

    fn put_child(&mut self, child: &Child) -> Result<(), SproutError> {
        self.children.insert(child.id, child.clone());
        Ok(())
    }

    fn insert_child_with_relation(
        &mut self,
        child: &Child,
        relation: &ChildRelation,
    ) -> Result<(), SproutError> {
        self.put_child(child)?;
        self.put_relation(relation)
    }

    fn child(&self, id: ChildId) -> Result<Option<Child>, SproutError> {
        Ok(self.children.get(&id).cloned())
    }

    fn remove_child(&mut self, id: ChildId) -> Result<bool, SproutError> {
        if self.children.remove(&id).is_none() {
            return Ok(false);
        }
        self.relations.retain(|(child, _), _| *child != id);
        self.milestones.retain(|_, m| m.child_id != id);
        self.activities.retain(|_, a| a.child_id != id);
        Ok(true)
    }

    fn put_relation(&mut self, relation: &ChildRelation) -> Result<(), SproutError> {
        self.relations.insert(
            (relation.child, relation.user.clone()),
            relation.clone(),
        );
        Ok(())
    }

    fn relation(
        &self,
        user: &UserId,
        child: ChildId,
    ) -> Result<Option<ChildRelation>, SproutError> {
        Ok(self.relations.get(&(child, user.clone())).cloned())
    }

    fn unlink_child(&mut self, user: &UserId, child: ChildId) -> Result<bool, SproutError> {
        self.relations.remove(&(child, user.clone()));
        if self.relations.keys().any(|(c, _)| *c == child) {
            return Ok(false);
        }
        self.remove_child(child)
    }

    fn relations_for_user(&self, user: &UserId) -> Result<Vec<ChildRelation>, SproutError> {
        Ok(self
            .relations
            .values()
            .filter(|r| &r.user == user)
            .cloned()
            .collect())
    }

    fn relations_for_child(&self, child: ChildId) -> Result<Vec<ChildRelation>, SproutError> {
        Ok(self
            .relations
            .values()
            .filter(|r| r.child == child)
            .cloned()
            .collect())
    }

    fn put_milestone(&mut self, milestone: &Milestone) -> Result<(), SproutError> {
        self.milestones.insert(milestone.id, milestone.clone());
        Ok(())
    }

    fn milestone(&self, id: MilestoneId) -> Result<Option<Milestone>, SproutError> {
        Ok(self.milestones.get(&id).cloned())
    }

    fn remove_milestone(&mut self, id: MilestoneId) -> Result<bool, SproutError> {
        Ok(self.milestones.remove(&id).is_some())
    }

    fn milestones_for_child(&self, child: ChildId) -> Result<Vec<Milestone>, SproutError> {
        Ok(self
            .milestones
            .values()
            .filter(|m| m.child_id == child)
            .cloned()
            .collect())
    }

    fn put_activity(&mut self, activity: &Activity) -> Result<(), SproutError> {
        self.activities.insert(activity.id, activity.clone());
        Ok(())
    }

    fn activity(&self, id: ActivityId) -> Result<Option<Activity>, SproutError> {
        Ok(self.activities.get(&id).cloned())
    }

    fn remove_activity(&mut self, id: ActivityId) -> Result<bool, SproutError> {
        Ok(self.activities.remove(&id).is_some())
    }

    fn activities_for_child(&self, child: ChildId) -> Result<Vec<Activity>, SproutError> {
        Ok(self
            .activities
            .values()
            .filter(|a| a.child_id == child)
            .cloned()
            .collect())
    }

    fn put_profile(&mut self, profile: &UserProfile) -> Result<(), SproutError> {
        self.profiles.insert(profile.user.clone(), profile.clone());
        Ok(())
    }

    fn profile(&self, user: &UserId) -> Result<Option<UserProfile>, SproutError> {
        Ok(self.profiles.get(user).cloned())
    }

    fn child_count(&self) -> Result<usize, SproutError> {
        Ok(self.children.len())
    }
}

// =============================================================================
// TEST FIXTURES
// =============================================================================
