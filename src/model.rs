//! Data model
//!
//! Resources are workouts: a payload of descriptive fields plus an ordered
//! list of entries, paired with a version counter that starts at 1.

use serde::{Deserialize, Serialize};

/// Opaque resource identifier
pub type ResourceId = u64;

/// Version counter; strictly positive once a resource exists
pub type Version = u64;

/// Identifier of a principal that can own resources
pub type UserId = u64;

/// Version assigned to a freshly created resource
pub const INITIAL_VERSION: Version = 1;

/// The mutable payload of a resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workout {
    pub title: String,
    pub description: String,
    pub duration_minutes: i64,
    pub calories_burned: i64,
    pub entries: Vec<WorkoutEntry>,
}

/// One exercise within a workout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub exercise_name: String,
    pub sets: i64,
    #[serde(default)]
    pub reps: Option<i64>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: String,
    /// Position within the workout; duplicates are allowed
    pub order_index: i64,
}

impl Workout {
    /// Entries in display order (by `order_index`, ties keep submission order).
    ///
    /// The stored sequence itself is never reordered.
    pub fn entries_in_order(&self) -> Vec<&WorkoutEntry> {
        let mut entries: Vec<&WorkoutEntry> = self.entries.iter().collect();
        entries.sort_by_key(|entry| entry.order_index);
        entries
    }
}

/// A committed `(payload, version)` pair together with its identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub id: ResourceId,
    pub owner: UserId,
    pub version: Version,
    pub payload: Workout,
}
