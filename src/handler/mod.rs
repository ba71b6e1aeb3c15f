//! Handler Module
//!
//! Drives a single request from receipt to a terminal outcome.
//!
//! ## Request Lifecycle
//! ```text
//! Received ─► Authenticated ─► Validated ─► Attempting ─► Succeeded
//!    │              │              │             ├──────► Conflicted
//!    ▼              ▼              ▼             └──────► NotFound
//! Unauthenticated  ValidationFailed  Forbidden / NotFound
//! ```
//!
//! Only `Attempting` enters the store's critical section. Failures before it
//! leave the store untouched.

mod request;
pub mod validation;

pub use request::RequestHandler;
pub use validation::{decode_create, decode_update, validate_workout, UpdateRequest};

use crate::error::FieldError;
use crate::model::{Resource, Version, Workout};

/// Terminal state of a request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The resource as committed (after update/create) or as read
    Succeeded(Resource),

    /// The resource was removed
    Deleted,

    /// The expected version was stale
    Conflicted {
        expected_version: Version,
        current_version: Version,
        current_payload: Workout,
    },

    NotFound,

    ValidationFailed(Vec<FieldError>),

    Unauthenticated,

    /// Authenticated, but not the owner of the resource
    Forbidden(String),

    /// The store failed; the message is for logs, not for clients
    Failed(String),

    Pong,
}

impl Outcome {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Succeeded(_) => "succeeded",
            Outcome::Deleted => "deleted",
            Outcome::Conflicted { .. } => "conflicted",
            Outcome::NotFound => "not_found",
            Outcome::ValidationFailed(_) => "validation_failed",
            Outcome::Unauthenticated => "unauthenticated",
            Outcome::Forbidden(_) => "forbidden",
            Outcome::Failed(_) => "failed",
            Outcome::Pong => "pong",
        }
    }
}
