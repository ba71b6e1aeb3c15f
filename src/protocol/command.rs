//! Command definitions
//!
//! Represents requests from clients.

use crate::model::ResourceId;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = 0x01,
    Create = 0x02,
    Update = 0x03,
    Delete = 0x04,
    Ping = 0x05,
}

impl CommandType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandType::Get),
            0x02 => Some(CommandType::Create),
            0x03 => Some(CommandType::Update),
            0x04 => Some(CommandType::Delete),
            0x05 => Some(CommandType::Ping),
            _ => None,
        }
    }
}

/// A parsed command. `token` is the bearer credential; `body` is raw JSON
/// left for the handler to validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read a resource
    Get { token: String, id: ResourceId },

    /// Create a resource at version 1
    Create { token: String, body: Vec<u8> },

    /// Conditional update; the body carries the expected version
    Update {
        token: String,
        id: ResourceId,
        body: Vec<u8>,
    },

    /// Remove a resource
    Delete { token: String, id: ResourceId },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Create { .. } => CommandType::Create,
            Command::Update { .. } => CommandType::Update,
            Command::Delete { .. } => CommandType::Delete,
            Command::Ping => CommandType::Ping,
        }
    }
}
