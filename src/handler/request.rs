//! Request handler
//!
//! Stateless per request; shared by every connection behind an `Arc`.

use std::sync::Arc;

use crate::auth::{AuthValidator, Principal};
use crate::config::ValidationRules;
use crate::error::VersoError;
use crate::model::{Resource, ResourceId};
use crate::protocol::Command;
use crate::store::{UpdateOutcome, VersionedStore};

use super::validation::{decode_create, decode_update};
use super::Outcome;

/// Authenticates, validates and runs requests against a store
pub struct RequestHandler<S, A> {
    store: Arc<S>,
    auth: Arc<A>,
    rules: ValidationRules,
}

impl<S: VersionedStore, A: AuthValidator> RequestHandler<S, A> {
    pub fn new(store: Arc<S>, auth: Arc<A>, rules: ValidationRules) -> Self {
        Self { store, auth, rules }
    }

    /// Execute a decoded command
    pub fn execute(&self, command: Command) -> Outcome {
        match command {
            Command::Get { token, id } => self.get(id, &token),
            Command::Create { token, body } => self.create(&token, &body),
            Command::Update { token, id, body } => self.update(id, &token, &body),
            Command::Delete { token, id } => self.delete(id, &token),
            Command::Ping => Outcome::Pong,
        }
    }

    /// Conditional update of a resource
    ///
    /// Steps:
    /// 1. Authenticate the credential
    /// 2. Decode and validate the body (full payload + expected version)
    /// 3. Check ownership
    /// 4. Compare-and-swap in the store
    pub fn update(&self, id: ResourceId, credential: &str, body: &[u8]) -> Outcome {
        let span = tracing::debug_span!("update", id);
        let _enter = span.enter();

        let Some(principal) = self.authenticate(credential) else {
            return Outcome::Unauthenticated;
        };

        let (payload, expected_version) = match decode_update(body, &self.rules) {
            Ok(parts) => parts,
            Err(fields) => {
                tracing::debug!(errors = fields.len(), "rejected update body");
                return Outcome::ValidationFailed(fields);
            }
        };

        if let Err(outcome) = self.authorize(id, &principal) {
            return outcome;
        }

        let outcome = match self.store.update_if_version_matches(id, expected_version, payload) {
            Ok(UpdateOutcome::Success { version, payload }) => Outcome::Succeeded(Resource {
                id,
                owner: principal.user_id,
                version,
                payload,
            }),
            Ok(UpdateOutcome::Conflict {
                current_version,
                current_payload,
            }) => {
                tracing::warn!(expected_version, current_version, "version conflict");
                Outcome::Conflicted {
                    expected_version,
                    current_version,
                    current_payload,
                }
            }
            Ok(UpdateOutcome::NotFound) => Outcome::NotFound,
            Err(e) => return self.internal(e),
        };

        tracing::debug!(outcome = outcome.label(), "update finished");
        outcome
    }

    /// Read a resource. Any authenticated principal may read.
    ///
    /// Entries come back in display order (`order_index`, ties stable).
    pub fn get(&self, id: ResourceId, credential: &str) -> Outcome {
        let span = tracing::debug_span!("get", id);
        let _enter = span.enter();

        if self.authenticate(credential).is_none() {
            return Outcome::Unauthenticated;
        }

        match self.store.get(id) {
            Ok(Some(mut resource)) => {
                let ordered: Vec<_> = resource
                    .payload
                    .entries_in_order()
                    .into_iter()
                    .cloned()
                    .collect();
                resource.payload.entries = ordered;
                Outcome::Succeeded(resource)
            }
            Ok(None) => Outcome::NotFound,
            Err(e) => self.internal(e),
        }
    }

    /// Create a resource owned by the caller, at version 1
    pub fn create(&self, credential: &str, body: &[u8]) -> Outcome {
        let span = tracing::debug_span!("create");
        let _enter = span.enter();

        let Some(principal) = self.authenticate(credential) else {
            return Outcome::Unauthenticated;
        };

        let payload = match decode_create(body, &self.rules) {
            Ok(payload) => payload,
            Err(fields) => return Outcome::ValidationFailed(fields),
        };

        match self.store.create(principal.user_id, payload) {
            Ok(resource) => {
                tracing::debug!(id = resource.id, owner = resource.owner, "created");
                Outcome::Succeeded(resource)
            }
            Err(e) => self.internal(e),
        }
    }

    /// Delete a resource owned by the caller
    pub fn delete(&self, id: ResourceId, credential: &str) -> Outcome {
        let span = tracing::debug_span!("delete", id);
        let _enter = span.enter();

        let Some(principal) = self.authenticate(credential) else {
            return Outcome::Unauthenticated;
        };

        if let Err(outcome) = self.authorize(id, &principal) {
            return outcome;
        }

        match self.store.remove(id) {
            Ok(true) => Outcome::Deleted,
            Ok(false) => Outcome::NotFound,
            Err(e) => self.internal(e),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn authenticate(&self, credential: &str) -> Option<Principal> {
        match self.auth.validate(credential) {
            Ok(principal) => Some(principal),
            Err(e) => {
                tracing::debug!("authentication failed: {}", e);
                None
            }
        }
    }

    /// Owner check. The owner never changes after creation, so reading it
    /// ahead of the critical section cannot race with an update.
    fn authorize(&self, id: ResourceId, principal: &Principal) -> Result<(), Outcome> {
        match self.store.owner(id) {
            Ok(Some(owner)) if owner == principal.user_id => Ok(()),
            Ok(Some(_)) => Err(Outcome::Forbidden(format!(
                "user {} does not own resource {}",
                principal.user_id, id
            ))),
            Ok(None) => Err(Outcome::NotFound),
            Err(e) => Err(self.internal(e)),
        }
    }

    fn internal(&self, err: VersoError) -> Outcome {
        tracing::error!("store failure: {}", err);
        Outcome::Failed(err.to_string())
    }
}
