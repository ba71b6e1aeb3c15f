//! Credential validation
//!
//! Token checking is an external capability; the handler only needs a
//! [`Principal`] or a refusal. [`StaticTokenValidator`] covers local
//! deployments and tests.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use crate::model::UserId;

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub name: String,
}

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing credential")]
    MissingCredential,

    #[error("Invalid credential")]
    InvalidCredential,
}

/// Turns a bearer credential into a principal
pub trait AuthValidator: Send + Sync {
    fn validate(&self, credential: &str) -> std::result::Result<Principal, AuthError>;
}

/// Strip an optional `Bearer ` scheme prefix
pub fn bearer_token(credential: &str) -> &str {
    let credential = credential.trim();
    match credential.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => credential[7..].trim_start(),
        _ => credential,
    }
}

/// In-memory token table
#[derive(Debug, Default)]
pub struct StaticTokenValidator {
    tokens: RwLock<HashMap<String, Principal>>,
}

impl StaticTokenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a token
    pub fn with_token(self, token: impl Into<String>, principal: Principal) -> Self {
        self.insert(token, principal);
        self
    }

    pub fn insert(&self, token: impl Into<String>, principal: Principal) {
        self.tokens.write().insert(token.into(), principal);
    }

    /// Revoke a token. Returns false if it was unknown.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.write().remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuthValidator for StaticTokenValidator {
    fn validate(&self, credential: &str) -> std::result::Result<Principal, AuthError> {
        let token = bearer_token(credential);
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        self.tokens
            .read()
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredential)
    }
}
