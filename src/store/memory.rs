//! In-memory versioned store
//!
//! Sharded map of independently locked records.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Result, VersoError};
use crate::model::{Resource, ResourceId, UserId, Version, Workout, INITIAL_VERSION};

use super::{UpdateOutcome, VersionedStore};

/// A single resource record. Payload and version only change together,
/// under the record's write lock.
#[derive(Debug)]
struct Record {
    owner: UserId,
    version: Version,
    payload: Workout,

    /// Set once the record is unlinked from its shard, so that a caller who
    /// looked it up just before removal cannot commit to it
    removed: bool,
}

type Shard = RwLock<HashMap<ResourceId, Arc<RwLock<Record>>>>;

/// In-memory implementation of [`VersionedStore`]
///
/// ## Concurrency:
/// - `shards`: each shard's RwLock guards only the id → record mapping
/// - each record has its own RwLock (readers share, the CAS is exclusive)
/// - `next_id`: atomic counter (lock-free)
pub struct MemoryStore {
    shards: Vec<Shard>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store with `shard_count` shards
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count).map(|_| RwLock::new(HashMap::new())).collect();

        Self {
            shards,
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a store sized by the config
    pub fn with_config(config: &Config) -> Self {
        Self::new(config.shard_count)
    }

    /// Insert a resource at version 1 under an explicit id
    ///
    /// Later calls to `create` never reuse `id`.
    pub fn insert(&self, id: ResourceId, owner: UserId, payload: Workout) -> Result<Resource> {
        self.insert_with_version(id, owner, INITIAL_VERSION, payload)
    }

    /// Insert a resource at an explicit version (seeding and tests)
    pub fn insert_with_version(
        &self,
        id: ResourceId,
        owner: UserId,
        version: Version,
        payload: Workout,
    ) -> Result<Resource> {
        if version < INITIAL_VERSION {
            return Err(VersoError::Internal(format!(
                "version must be at least {}, got {}",
                INITIAL_VERSION, version
            )));
        }

        let mut shard = self.shard(id).write();
        if shard.contains_key(&id) {
            return Err(VersoError::AlreadyExists(id));
        }

        shard.insert(
            id,
            Arc::new(RwLock::new(Record {
                owner,
                version,
                payload: payload.clone(),
                removed: false,
            })),
        );
        drop(shard);

        self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);

        Ok(Resource {
            id,
            owner,
            version,
            payload,
        })
    }

    /// Number of live resources
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of shards
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn shard(&self, id: ResourceId) -> &Shard {
        // shards is never empty, see new()
        &self.shards[(id % self.shards.len() as u64) as usize]
    }

    /// Clone the record handle out of its shard; the shard lock is released
    /// before the caller locks the record.
    fn lookup(&self, id: ResourceId) -> Option<Arc<RwLock<Record>>> {
        self.shard(id).read().get(&id).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_config(&Config::default())
    }
}

impl VersionedStore for MemoryStore {
    fn get(&self, id: ResourceId) -> Result<Option<Resource>> {
        let Some(handle) = self.lookup(id) else {
            return Ok(None);
        };

        let record = handle.read();
        if record.removed {
            return Ok(None);
        }

        Ok(Some(Resource {
            id,
            owner: record.owner,
            version: record.version,
            payload: record.payload.clone(),
        }))
    }

    fn owner(&self, id: ResourceId) -> Result<Option<UserId>> {
        let Some(handle) = self.lookup(id) else {
            return Ok(None);
        };

        let record = handle.read();
        Ok((!record.removed).then_some(record.owner))
    }

    fn update_if_version_matches(
        &self,
        id: ResourceId,
        expected_version: Version,
        payload: Workout,
    ) -> Result<UpdateOutcome> {
        let Some(handle) = self.lookup(id) else {
            return Ok(UpdateOutcome::NotFound);
        };

        compare_and_swap(id, &handle, expected_version, payload)
    }

    fn create(&self, owner: UserId, payload: Workout) -> Result<Resource> {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            match self.insert(id, owner, payload.clone()) {
                // An explicit insert may have claimed this id first
                Err(VersoError::AlreadyExists(_)) => continue,
                other => return other,
            }
        }
    }

    fn remove(&self, id: ResourceId) -> Result<bool> {
        let removed = self.shard(id).write().remove(&id);

        match removed {
            Some(handle) => {
                handle.write().removed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// The conditional write on an already resolved record
fn compare_and_swap(
    id: ResourceId,
    handle: &RwLock<Record>,
    expected_version: Version,
    payload: Workout,
) -> Result<UpdateOutcome> {
    // Critical section: payload and version are written together or not
    // at all, and nothing in here blocks on anything but this guard.
    let mut record = handle.write();

    if record.removed {
        return Ok(UpdateOutcome::NotFound);
    }

    if record.version != expected_version {
        tracing::debug!(
            id,
            expected_version,
            current_version = record.version,
            "version mismatch"
        );
        return Ok(UpdateOutcome::Conflict {
            current_version: record.version,
            current_payload: record.payload.clone(),
        });
    }

    let next_version = record
        .version
        .checked_add(1)
        .ok_or_else(|| VersoError::Internal(format!("version overflow on resource {}", id)))?;

    record.payload = payload;
    record.version = next_version;

    Ok(UpdateOutcome::Success {
        version: next_version,
        payload: record.payload.clone(),
    })
}
