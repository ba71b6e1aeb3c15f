//! Response definitions
//!
//! Maps request outcomes to the status/body pair sent to clients.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::FieldError;
use crate::handler::Outcome;
use crate::model::{Resource, ResourceId, Version, Workout};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Conflict = 0x01,
    NotFound = 0x02,
    BadRequest = 0x03,
    Unauthorized = 0x04,
    Forbidden = 0x05,
    InternalError = 0x06,
}

impl Status {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::Conflict),
            0x02 => Some(Status::NotFound),
            0x03 => Some(Status::BadRequest),
            0x04 => Some(Status::Unauthorized),
            0x05 => Some(Status::Forbidden),
            0x06 => Some(Status::InternalError),
            _ => None,
        }
    }

    /// Wire name, e.g. `not_found`
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Conflict => "conflict",
            Status::NotFound => "not_found",
            Status::BadRequest => "bad_request",
            Status::Unauthorized => "unauthorized",
            Status::Forbidden => "forbidden",
            Status::InternalError => "internal_error",
        }
    }
}

/// Body of a `conflict` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictBody {
    pub expected_version: Version,
    pub current_version: Version,
    pub current_payload: Workout,
}

/// Body of a successful read/write: the payload and its version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceBody {
    pub id: ResourceId,
    pub version: Version,
    pub workout: Workout,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional JSON body
    pub body: Option<Value>,
}

impl Response {
    /// Build the response for a terminal request outcome
    pub fn from_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Succeeded(resource) => Self::resource(resource),
            Outcome::Deleted => Self::ok(None),
            Outcome::Conflicted {
                expected_version,
                current_version,
                current_payload,
            } => Self::conflict(*expected_version, *current_version, current_payload),
            Outcome::NotFound => Self::not_found(),
            Outcome::ValidationFailed(fields) => Self::bad_request(fields),
            Outcome::Unauthenticated => Self::unauthorized(),
            Outcome::Forbidden(_) => Self::forbidden("you do not own this resource"),
            Outcome::Failed(_) => Self::internal_error(),
            Outcome::Pong => Self::ok(Some(json!("PONG"))),
        }
    }

    /// Create an OK response with optional body
    pub fn ok(body: Option<Value>) -> Self {
        Self {
            status: Status::Ok,
            body,
        }
    }

    /// OK carrying a committed resource
    pub fn resource(resource: &Resource) -> Self {
        let body = ResourceBody {
            id: resource.id,
            version: resource.version,
            workout: resource.payload.clone(),
        };
        Self::with_body(Status::Ok, &body)
    }

    pub fn conflict(expected_version: Version, current_version: Version, current: &Workout) -> Self {
        let body = ConflictBody {
            expected_version,
            current_version,
            current_payload: current.clone(),
        };
        Self::with_body(Status::Conflict, &body)
    }

    /// Create a NOT_FOUND response
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            body: None,
        }
    }

    pub fn bad_request(fields: &[FieldError]) -> Self {
        Self {
            status: Status::BadRequest,
            body: Some(json!({
                "error": "validation failed",
                "fields": fields,
            })),
        }
    }

    /// Bad request that is not tied to a field (e.g. a malformed frame)
    pub fn malformed(message: &str) -> Self {
        Self::bad_request(&[FieldError::new("request", message)])
    }

    pub fn unauthorized() -> Self {
        Self {
            status: Status::Unauthorized,
            body: None,
        }
    }

    pub fn forbidden(message: &str) -> Self {
        Self {
            status: Status::Forbidden,
            body: Some(json!({ "error": message })),
        }
    }

    /// Internal details stay in the server log
    pub fn internal_error() -> Self {
        Self {
            status: Status::InternalError,
            body: Some(json!({ "error": "internal server error" })),
        }
    }

    /// Serialize a typed body; a body that cannot be encoded becomes an internal error
    fn with_body<T: Serialize>(status: Status, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self {
                status,
                body: Some(body),
            },
            Err(e) => {
                tracing::error!("failed to encode {} body: {}", status.as_str(), e);
                Self::internal_error()
            }
        }
    }

    /// Decode the body of an OK response carrying a resource
    pub fn resource_body(&self) -> Option<ResourceBody> {
        match (self.status, &self.body) {
            (Status::Ok, Some(body)) => serde_json::from_value(body.clone()).ok(),
            _ => None,
        }
    }

    /// Decode the body of a conflict response
    pub fn conflict_body(&self) -> Option<ConflictBody> {
        match (self.status, &self.body) {
            (Status::Conflict, Some(body)) => serde_json::from_value(body.clone()).ok(),
            _ => None,
        }
    }
}
