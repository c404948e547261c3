//! # redb-backed Record Storage
//!
//! A disk-backed record store using the redb embedded database.
//!
//! Every record is stored postcard-encoded under its numeric id. Relations are
//! grouped per child so that the ownership check is a single point lookup.
//! Per-user and per-child listings scan their table; the record counts of a
//! household are small enough that secondary indexes are not kept.
//!
//! Each mutating call runs in its own write transaction. A child and its
//! first relation are written together, and unlinking the last relation
//! removes the child and its cascade in the same transaction.

use crate::store::RecordStore;
use crate::{
    Activity, ActivityId, Child, ChildId, ChildRelation, Milestone, MilestoneId, SproutError,
    UserId, UserProfile,
};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::path::Path;

/// A table of postcard-encoded records keyed by numeric id.
type RecordTable = TableDefinition<'static, u64, &'static [u8]>;

/// Table for children: ChildId(u64) -> serialized Child
const CHILDREN: RecordTable = TableDefinition::new("children");

/// Table for relations: ChildId(u64) -> serialized Vec<ChildRelation>
const RELATIONS: RecordTable = TableDefinition::new("relations");

/// Table for milestones: MilestoneId(u64) -> serialized Milestone
const MILESTONES: RecordTable = TableDefinition::new("milestones");

/// Table for activities: ActivityId(u64) -> serialized Activity
const ACTIVITIES: RecordTable = TableDefinition::new("activities");

/// Table for profiles: user id -> serialized UserProfile
const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_ID_KEY: &str = "next_id";

fn storage_err(e: impl Display) -> SproutError {
    SproutError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SproutError> {
    postcard::to_allocvec(value).map_err(|e| SproutError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SproutError> {
    postcard::from_bytes(bytes).map_err(|e| SproutError::SerializationError(e.to_string()))
}

fn relations_in(
    table: &Table<'_, u64, &'static [u8]>,
    child: ChildId,
) -> Result<Vec<ChildRelation>, SproutError> {
    let relations = match table.get(child.0).map_err(storage_err)? {
        Some(data) => decode(data.value())?,
        None => Vec::new(),
    };
    Ok(relations)
}

/// Remove a child, its relations, milestones and activities inside `txn`.
/// Returns false without touching other tables if the child is absent.
fn cascade_child(txn: &WriteTransaction, id: ChildId) -> Result<bool, SproutError> {
    let existed = {
        let mut children = txn.open_table(CHILDREN).map_err(storage_err)?;
        let existed = children.remove(id.0).map_err(storage_err)?.is_some();
        existed
    };
    if !existed {
        return Ok(false);
    }

    {
        let mut relations = txn.open_table(RELATIONS).map_err(storage_err)?;
        relations.remove(id.0).map_err(storage_err)?;
    }

    {
        let mut milestones = txn.open_table(MILESTONES).map_err(storage_err)?;
        let mut doomed = Vec::new();
        for entry in milestones.iter().map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            let milestone: Milestone = decode(value.value())?;
            if milestone.child_id == id {
                doomed.push(key.value());
            }
        }
        for key in doomed {
            milestones.remove(key).map_err(storage_err)?;
        }
    }

    {
        let mut activities = txn.open_table(ACTIVITIES).map_err(storage_err)?;
        let mut doomed = Vec::new();
        for entry in activities.iter().map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            let activity: Activity = decode(value.value())?;
            if activity.child_id == id {
                doomed.push(key.value());
            }
        }
        for key in doomed {
            activities.remove(key).map_err(storage_err)?;
        }
    }

    Ok(true)
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a record database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SproutError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(CHILDREN).map_err(storage_err)?;
            let _ = write_txn.open_table(RELATIONS).map_err(storage_err)?;
            let _ = write_txn.open_table(MILESTONES).map_err(storage_err)?;
            let _ = write_txn.open_table(ACTIVITIES).map_err(storage_err)?;
            let _ = write_txn.open_table(PROFILES).map_err(storage_err)?;
            let _ = write_txn.open_table(METADATA).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), SproutError> {
        self.db.compact().map_err(storage_err)?;
        Ok(())
    }

    fn put_record(
        &self,
        table: RecordTable,
        key: u64,
        bytes: &[u8],
    ) -> Result<(), SproutError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(table).map_err(storage_err)?;
            table.insert(key, bytes).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        table: RecordTable,
        key: u64,
    ) -> Result<Option<T>, SproutError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(table).map_err(storage_err)?;

        match table.get(key).map_err(storage_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn remove_record(
        &self,
        table: RecordTable,
        key: u64,
    ) -> Result<bool, SproutError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let removed = {
            let mut table = write_txn.open_table(table).map_err(storage_err)?;
            let removed = table.remove(key).map_err(storage_err)?.is_some();
            removed
        };
        write_txn.commit().map_err(storage_err)?;
        Ok(removed)
    }

    fn scan_records<T: DeserializeOwned>(
        &self,
        table: RecordTable,
    ) -> Result<Vec<T>, SproutError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(table).map_err(storage_err)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(storage_err)? {
            let (_, value) = entry.map_err(storage_err)?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }

    fn relations_of(&self, child: ChildId) -> Result<Vec<ChildRelation>, SproutError> {
        Ok(self
            .get_record::<Vec<ChildRelation>>(RELATIONS, child.0)?
            .unwrap_or_default())
    }
}

impl RecordStore for RedbStore {
    fn allocate_id(&mut self) -> Result<u64, SproutError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let id = {
            let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
            let current = meta
                .get(NEXT_ID_KEY)
                .map_err(storage_err)?
                .map(|v| v.value())
                .unwrap_or(0);
            let id = current
                .checked_add(1)
                .ok_or_else(|| SproutError::IoError("record id space exhausted".to_string()))?;
            meta.insert(NEXT_ID_KEY, id).map_err(storage_err)?;
            id
        };
        write_txn.commit().map_err(storage_err)?;
        Ok(id)
    }

    fn put_child(&mut self, child: &Child) -> Result<(), SproutError> {
        self.put_record(CHILDREN, child.id.0, &encode(child)?)
    }

    fn insert_child_with_relation(
        &mut self,
        child: &Child,
        relation: &ChildRelation,
    ) -> Result<(), SproutError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut children = write_txn.open_table(CHILDREN).map_err(storage_err)?;
            children
                .insert(child.id.0, encode(child)?.as_slice())
                .map_err(storage_err)?;
        }
        {
            let mut table = write_txn.open_table(RELATIONS).map_err(storage_err)?;
            let mut relations = relations_in(&table, relation.child)?;
            match relations.iter_mut().find(|r| r.user == relation.user) {
                Some(existing) => *existing = relation.clone(),
                None => relations.push(relation.clone()),
            }
            table
                .insert(relation.child.0, encode(&relations)?.as_slice())
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn child(&self, id: ChildId) -> Result<Option<Child>, SproutError> {
        self.get_record(CHILDREN, id.0)
    }

    fn remove_child(&mut self, id: ChildId) -> Result<bool, SproutError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        if !cascade_child(&write_txn, id)? {
            write_txn.abort().map_err(storage_err)?;
            return Ok(false);
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(true)
    }

    fn put_relation(&mut self, relation: &ChildRelation) -> Result<(), SproutError> {
        let mut relations = self.relations_of(relation.child)?;
        match relations.iter_mut().find(|r| r.user == relation.user) {
            Some(existing) => *existing = relation.clone(),
            None => relations.push(relation.clone()),
        }
        self.put_record(RELATIONS, relation.child.0, &encode(&relations)?)
    }

    fn relation(
        &self,
        user: &UserId,
        child: ChildId,
    ) -> Result<Option<ChildRelation>, SproutError> {
        Ok(self
            .relations_of(child)?
            .into_iter()
            .find(|r| &r.user == user))
    }

    fn unlink_child(&mut self, user: &UserId, child: ChildId) -> Result<bool, SproutError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let last = {
            let mut table = write_txn.open_table(RELATIONS).map_err(storage_err)?;
            let mut relations = relations_in(&table, child)?;
            relations.retain(|r| &r.user != user);
            if relations.is_empty() {
                table.remove(child.0).map_err(storage_err)?;
                true
            } else {
                table
                    .insert(child.0, encode(&relations)?.as_slice())
                    .map_err(storage_err)?;
                false
            }
        };
        let removed = last && cascade_child(&write_txn, child)?;
        write_txn.commit().map_err(storage_err)?;
        Ok(removed)
    }

    fn relations_for_user(&self, user: &UserId) -> Result<Vec<ChildRelation>, SproutError> {
        let groups: Vec<Vec<ChildRelation>> = self.scan_records(RELATIONS)?;
        Ok(groups
            .into_iter()
            .flatten()
            .filter(|r| &r.user == user)
            .collect())
    }

    fn relations_for_child(&self, child: ChildId) -> Result<Vec<ChildRelation>, SproutError> {
        self.relations_of(child)
    }

    fn put_milestone(&mut self, milestone: &Milestone) -> Result<(), SproutError> {
        self.put_record(MILESTONES, milestone.id.0, &encode(milestone)?)
    }

    fn milestone(&self, id: MilestoneId) -> Result<Option<Milestone>, SproutError> {
        self.get_record(MILESTONES, id.0)
    }

    fn remove_milestone(&mut self, id: MilestoneId) -> Result<bool, SproutError> {
        self.remove_record(MILESTONES, id.0)
    }

    fn milestones_for_child(&self, child: ChildId) -> Result<Vec<Milestone>, SproutError> {
        let all: Vec<Milestone> = self.scan_records(MILESTONES)?;
        Ok(all.into_iter().filter(|m| m.child_id == child).collect())
    }

    fn put_activity(&mut self, activity: &Activity) -> Result<(), SproutError> {
        self.put_record(ACTIVITIES, activity.id.0, &encode(activity)?)
    }

    fn activity(&self, id: ActivityId) -> Result<Option<Activity>, SproutError> {
        self.get_record(ACTIVITIES, id.0)
    }

    fn remove_activity(&mut self, id: ActivityId) -> Result<bool, SproutError> {
        self.remove_record(ACTIVITIES, id.0)
    }

    fn activities_for_child(&self, child: ChildId) -> Result<Vec<Activity>, SproutError> {
        let all: Vec<Activity> = self.scan_records(ACTIVITIES)?;
        Ok(all.into_iter().filter(|a| a.child_id == child).collect())
    }

    fn put_profile(&mut self, profile: &UserProfile) -> Result<(), SproutError> {
        let bytes = encode(profile)?;
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(PROFILES).map_err(storage_err)?;
            table
                .insert(profile.user.as_str(), bytes.as_slice())
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn profile(&self, user: &UserId) -> Result<Option<UserProfile>, SproutError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(PROFILES).map_err(storage_err)?;

        match table.get(user.as_str()).map_err(storage_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn child_count(&self) -> Result<usize, SproutError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(CHILDREN).map_err(storage_err)?;
        let len = table.len().map_err(storage_err)?;
        Ok(len as usize)
    }
}
