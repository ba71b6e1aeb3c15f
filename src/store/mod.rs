//! Store Module
//!
//! Versioned resource storage with compare-and-swap updates.
//!
//! ## Responsibilities
//! - Hold resource records keyed by id
//! - Apply conditional updates atomically per record
//! - Report the *current* state to callers that lose a race
//!
//! ## Locking Layout
//! ```text
//!   id ──► shard = id % N
//!          ┌──────────────────────────┐
//!          │ RwLock<HashMap<id, Arc>> │  held only to find/insert/remove
//!          └────────────┬─────────────┘
//!                       ▼
//!          ┌──────────────────────────┐
//!          │   RwLock<Record>         │  compare + swap happen here
//!          └──────────────────────────┘
//! ```
//!
//! Different ids never wait on each other's record lock, and a shard lock is
//! never held while a record lock is awaited.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::model::{Resource, ResourceId, UserId, Version, Workout};

/// Result of a conditional update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The expected version matched; the new pair is committed
    Success { version: Version, payload: Workout },

    /// The expected version was stale; carries the state that is committed now
    Conflict {
        current_version: Version,
        current_payload: Workout,
    },

    /// No resource with this id
    NotFound,
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Success { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, UpdateOutcome::Conflict { .. })
    }
}

/// Storage backend contract.
///
/// `Err` from any method means the store itself failed (an internal
/// failure), never a business outcome like a conflict or a missing id.
pub trait VersionedStore: Send + Sync {
    /// Read the committed `(payload, version)` pair of a resource
    fn get(&self, id: ResourceId) -> Result<Option<Resource>>;

    /// Owner of a resource, without cloning its payload
    fn owner(&self, id: ResourceId) -> Result<Option<UserId>>;

    /// Replace the payload if `expected_version` is the committed version.
    ///
    /// Linearizable per id: concurrent callers with the same expected version
    /// see exactly one `Success`.
    fn update_if_version_matches(
        &self,
        id: ResourceId,
        expected_version: Version,
        payload: Workout,
    ) -> Result<UpdateOutcome>;

    /// Create a resource at version 1 under a fresh id
    fn create(&self, owner: UserId, payload: Workout) -> Result<Resource>;

    /// Remove a resource entirely. Returns false if it did not exist.
    fn remove(&self, id: ResourceId) -> Result<bool>;
}
