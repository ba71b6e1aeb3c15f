//! Tests for MemoryStore
//!
//! These tests verify:
//! - Conditional update outcomes (success, conflict, not found)
//! - Exclusivity under concurrent same-version updates
//! - Atomic visibility of (payload, version) pairs
//! - Monotonic versions under contention
//! - Independence of different resource ids
//! - Updates racing a removal

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use versokv::store::{MemoryStore, UpdateOutcome, VersionedStore};
use versokv::{Version, Workout, WorkoutEntry};

// =============================================================================
// Helper Functions
// =============================================================================

const OWNER: u64 = 1;

fn workout(title: &str) -> Workout {
    Workout {
        title: title.to_string(),
        description: "Test for concurrent modification conflict".to_string(),
        duration_minutes: 45,
        calories_burned: 250,
        entries: vec![WorkoutEntry {
            exercise_name: "Walking".to_string(),
            sets: 1,
            duration_seconds: Some(2700),
            weight: Some(0.0),
            notes: "Keep a steady pace".to_string(),
            order_index: 1,
            ..Default::default()
        }],
    }
}

/// Store with resource 11 at version 4
fn setup_store_at_v4() -> Arc<MemoryStore> {
    let store = MemoryStore::new(8);
    store
        .insert_with_version(11, OWNER, 4, workout("Original"))
        .unwrap();
    Arc::new(store)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_get_returns_committed_pair() {
    let store = setup_store_at_v4();

    let resource = store.get(11).unwrap().unwrap();
    assert_eq!(resource.id, 11);
    assert_eq!(resource.owner, OWNER);
    assert_eq!(resource.version, 4);
    assert_eq!(resource.payload.title, "Original");
}

#[test]
fn test_get_nonexistent() {
    let store = setup_store_at_v4();
    assert_eq!(store.get(12).unwrap(), None);
    assert_eq!(store.owner(12).unwrap(), None);
}

#[test]
fn test_update_round_trip() {
    let store = setup_store_at_v4();
    let submitted = workout("First Update");

    let outcome = store
        .update_if_version_matches(11, 4, submitted.clone())
        .unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Success {
            version: 5,
            payload: submitted.clone(),
        }
    );

    let resource = store.get(11).unwrap().unwrap();
    assert_eq!(resource.version, 5);
    assert_eq!(resource.payload, submitted);
}

#[test]
fn test_stale_version_conflicts_without_change() {
    let store = setup_store_at_v4();
    store
        .update_if_version_matches(11, 4, workout("v5"))
        .unwrap();

    let outcome = store
        .update_if_version_matches(11, 3, workout("stale"))
        .unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Conflict {
            current_version: 5,
            current_payload: workout("v5"),
        }
    );

    let resource = store.get(11).unwrap().unwrap();
    assert_eq!(resource.version, 5);
    assert_eq!(resource.payload.title, "v5");
}

#[test]
fn test_future_version_conflicts() {
    let store = setup_store_at_v4();

    let outcome = store
        .update_if_version_matches(11, 9, workout("ahead"))
        .unwrap();
    assert!(outcome.is_conflict());
    assert_eq!(store.get(11).unwrap().unwrap().version, 4);
}

#[test]
fn test_stale_rejection_is_idempotent() {
    let store = setup_store_at_v4();
    store
        .update_if_version_matches(11, 4, workout("v5"))
        .unwrap();
    let before = store.get(11).unwrap().unwrap();

    for _ in 0..50 {
        let outcome = store
            .update_if_version_matches(11, 4, workout("retry"))
            .unwrap();
        assert!(outcome.is_conflict());
    }

    assert_eq!(store.get(11).unwrap().unwrap(), before);
}

#[test]
fn test_update_nonexistent_creates_nothing() {
    let store = setup_store_at_v4();

    let outcome = store
        .update_if_version_matches(999, 1, workout("ghost"))
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::NotFound);
    assert_eq!(store.get(999).unwrap(), None);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove() {
    let store = setup_store_at_v4();

    assert!(store.remove(11).unwrap());
    assert!(!store.remove(11).unwrap());
    assert_eq!(store.get(11).unwrap(), None);
    assert_eq!(
        store
            .update_if_version_matches(11, 4, workout("after delete"))
            .unwrap(),
        UpdateOutcome::NotFound
    );
}

#[test]
fn test_sequential_updates_step_by_one() {
    let store = setup_store_at_v4();

    for expected in 4..20 {
        let outcome = store
            .update_if_version_matches(11, expected, workout(&format!("v{}", expected + 1)))
            .unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Success {
                version: expected + 1,
                payload: workout(&format!("v{}", expected + 1)),
            }
        );
    }
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_two_writers_same_version_scenario() {
    // Repeat to give the scheduler many chances to interleave differently
    for _ in 0..200 {
        let store = setup_store_at_v4();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["First Update", "Second Update"]
            .into_iter()
            .map(|title| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let outcome = store
                        .update_if_version_matches(11, 4, workout(title))
                        .unwrap();
                    (title, outcome)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = results.iter().filter(|(_, o)| o.is_success()).collect();
        let losers: Vec<_> = results.iter().filter(|(_, o)| o.is_conflict()).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(losers.len(), 1);

        let (winning_title, winning) = winners[0];
        assert_eq!(
            winning,
            &UpdateOutcome::Success {
                version: 5,
                payload: workout(winning_title),
            }
        );

        match &losers[0].1 {
            UpdateOutcome::Conflict {
                current_version,
                current_payload,
            } => {
                assert_eq!(*current_version, 5);
                assert_eq!(current_payload.title, *winning_title);
            }
            other => panic!("expected conflict, got {:?}", other),
        }

        let stored = store.get(11).unwrap().unwrap();
        assert_eq!(stored.version, 5);
        assert_eq!(stored.payload.title, *winning_title);
    }
}

#[test]
fn test_exclusivity_many_writers() {
    const WRITERS: usize = 16;
    let store = setup_store_at_v4();
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|n| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store
                    .update_if_version_matches(11, 4, workout(&format!("writer {}", n)))
                    .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = outcomes.iter().filter(|o| o.is_success()).count();
    assert_eq!(successes, 1);

    for outcome in &outcomes {
        match outcome {
            UpdateOutcome::Success { version, .. } => assert_eq!(*version, 5),
            UpdateOutcome::Conflict {
                current_version, ..
            } => assert!(*current_version >= 5),
            UpdateOutcome::NotFound => panic!("resource vanished"),
        }
    }
}

#[test]
fn test_monotonic_versions_with_retrying_writers() {
    const WRITERS: usize = 8;
    const UPDATES_PER_WRITER: usize = 50;

    let store = setup_store_at_v4();
    let handles: Vec<_> = (0..WRITERS)
        .map(|n| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut committed: Vec<Version> = Vec::new();
                let mut expected = store.get(11).unwrap().unwrap().version;

                while committed.len() < UPDATES_PER_WRITER {
                    let payload = workout(&format!("writer {} #{}", n, committed.len()));
                    match store.update_if_version_matches(11, expected, payload).unwrap() {
                        UpdateOutcome::Success { version, .. } => {
                            assert_eq!(version, expected + 1);
                            committed.push(version);
                            expected = version;
                        }
                        UpdateOutcome::Conflict {
                            current_version, ..
                        } => {
                            assert_ne!(current_version, expected);
                            expected = current_version;
                        }
                        UpdateOutcome::NotFound => panic!("resource vanished"),
                    }
                }
                committed
            })
        })
        .collect();

    let mut all: Vec<Version> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();

    // Every version from 5 up was committed exactly once
    let expected: Vec<Version> = (5..5 + (WRITERS * UPDATES_PER_WRITER) as Version).collect();
    assert_eq!(all, expected);
    assert_eq!(
        store.get(11).unwrap().unwrap().version,
        4 + (WRITERS * UPDATES_PER_WRITER) as Version
    );
}

#[test]
fn test_readers_never_see_torn_pairs() {
    let store = setup_store_at_v4();
    store
        .update_if_version_matches(11, 4, workout("version 5"))
        .unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for v in 5..1005 {
                let outcome = store
                    .update_if_version_matches(11, v, workout(&format!("version {}", v + 1)))
                    .unwrap();
                assert!(outcome.is_success());
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut last_seen = 0;
                while !done.load(Ordering::SeqCst) {
                    let resource = store.get(11).unwrap().unwrap();
                    // Each committed payload names its own version
                    assert_eq!(resource.payload.title, format!("version {}", resource.version));
                    assert!(resource.version >= last_seen);
                    last_seen = resource.version;
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.get(11).unwrap().unwrap().version, 1005);
}

#[test]
fn test_different_ids_update_independently() {
    const IDS: u64 = 32;
    let store = Arc::new(MemoryStore::new(4));
    for id in 0..IDS {
        store.insert(id, OWNER, workout("start")).unwrap();
    }

    let handles: Vec<_> = (0..IDS)
        .map(|id| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for expected in 1..=20 {
                    let outcome = store
                        .update_if_version_matches(id, expected, workout(&format!("{}:{}", id, expected)))
                        .unwrap();
                    // Sole writer per id: never a conflict
                    assert!(outcome.is_success());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for id in 0..IDS {
        let resource = store.get(id).unwrap().unwrap();
        assert_eq!(resource.version, 21);
        assert_eq!(resource.payload.title, format!("{}:20", id));
    }
}

#[test]
fn test_update_racing_remove_never_resurrects() {
    for _ in 0..100 {
        let store = setup_store_at_v4();
        let barrier = Arc::new(Barrier::new(2));

        let updater = {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store
                    .update_if_version_matches(11, 4, workout("racing"))
                    .unwrap()
            })
        };
        let remover = {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.remove(11).unwrap()
            })
        };

        let outcome = updater.join().unwrap();
        assert!(remover.join().unwrap());
        assert!(matches!(
            outcome,
            UpdateOutcome::Success { version: 5, .. } | UpdateOutcome::NotFound
        ));
        assert_eq!(store.get(11).unwrap(), None);
        assert!(store.is_empty());
    }
}

#[test]
fn test_concurrent_creates_get_unique_ids() {
    let store = Arc::new(MemoryStore::new(4));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..25)
                    .map(|_| store.create(OWNER, workout("new")).unwrap().id)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    assert_eq!(ids.len(), 200);
    assert_eq!(store.len(), 200);
    assert!(ids.iter().all(|id| store.get(*id).unwrap().unwrap().version == 1));
}
