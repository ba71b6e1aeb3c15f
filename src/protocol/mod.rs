//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Binary frames, JSON bodies)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: GET     - Payload: token + id
//! - 0x02: CREATE  - Payload: token + workout JSON
//! - 0x03: UPDATE  - Payload: token + id + workout JSON with `version`
//! - 0x04: DELETE  - Payload: token + id
//! - 0x05: PING    - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         JSON body           │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: CONFLICT
//! - 0x02: NOT_FOUND
//! - 0x03: BAD_REQUEST
//! - 0x04: UNAUTHORIZED
//! - 0x05: FORBIDDEN
//! - 0x06: INTERNAL_ERROR

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{ConflictBody, Response, ResourceBody, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
