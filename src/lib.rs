//! # VersoKV
//!
//! A versioned resource store with optimistic concurrency control:
//! - Compare-and-swap updates keyed on a per-resource version
//! - Per-record locking, so different resources never block each other
//! - Conflicts reported with the state that actually won
//! - TCP-based client protocol with JSON bodies
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (acceptor + worker pool)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Command
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  RequestHandler                              │
//! │        authenticate → validate → authorize → CAS             │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │ Outcome
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │ VersionedStore  │                │    Response     │
//!   │ (sharded, one   │                │  (status + JSON)│
//!   │  lock per id)   │                └─────────────────┘
//!   └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod model;

pub mod auth;
pub mod store;
pub mod handler;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FieldError, Result, VersoError};
pub use config::{Config, ValidationRules};
pub use model::{Resource, ResourceId, UserId, Version, Workout, WorkoutEntry};
pub use auth::{AuthValidator, Principal, StaticTokenValidator};
pub use store::{MemoryStore, UpdateOutcome, VersionedStore};
pub use handler::{Outcome, RequestHandler};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of VersoKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
