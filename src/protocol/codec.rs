//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - GET:    token_len (2) + token + id (8)
//! - CREATE: token_len (2) + token + JSON body
//! - UPDATE: token_len (2) + token + id (8) + JSON body
//! - DELETE: token_len (2) + token + id (8)
//! - PING:   empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │      JSON body (optional)   │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! All integers are big-endian.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Command, CommandType, Response, Status};
use crate::error::{Result, VersoError};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Maximum credential length
pub const MAX_TOKEN_LEN: usize = u16::MAX as usize;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Result<Bytes> {
    let mut payload = BytesMut::new();

    match command {
        Command::Get { token, id } | Command::Delete { token, id } => {
            put_token(&mut payload, token)?;
            payload.put_u64(*id);
        }
        Command::Create { token, body } => {
            put_token(&mut payload, token)?;
            payload.put_slice(body);
        }
        Command::Update { token, id, body } => {
            put_token(&mut payload, token)?;
            payload.put_u64(*id);
            payload.put_slice(body);
        }
        Command::Ping => {}
    }

    frame(command.command_type() as u8, &payload)
}

/// Decode a command from a complete frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_byte, mut payload) = split_frame(bytes)?;

    let cmd_type = CommandType::from_byte(cmd_byte).ok_or_else(|| {
        VersoError::Protocol(format!("Unknown command type: 0x{:02x}", cmd_byte))
    })?;

    let command = match cmd_type {
        CommandType::Get => {
            let token = take_token(&mut payload, "GET")?;
            let id = take_id(&mut payload, "GET")?;
            Command::Get { token, id }
        }
        CommandType::Create => {
            let token = take_token(&mut payload, "CREATE")?;
            let body = payload.to_vec();
            payload.advance(body.len());
            Command::Create { token, body }
        }
        CommandType::Update => {
            let token = take_token(&mut payload, "UPDATE")?;
            let id = take_id(&mut payload, "UPDATE")?;
            let body = payload.to_vec();
            payload.advance(body.len());
            Command::Update { token, id, body }
        }
        CommandType::Delete => {
            let token = take_token(&mut payload, "DELETE")?;
            let id = take_id(&mut payload, "DELETE")?;
            Command::Delete { token, id }
        }
        CommandType::Ping => Command::Ping,
    };

    if payload.has_remaining() {
        return Err(VersoError::Protocol(format!(
            "{:?} command: {} unexpected trailing bytes",
            cmd_type,
            payload.remaining()
        )));
    }

    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + JSON body
pub fn encode_response(response: &Response) -> Result<Bytes> {
    let body = match &response.body {
        Some(value) => serde_json::to_vec(value)?,
        None => Vec::new(),
    };

    frame(response.status as u8, &body)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes)?;

    let status = Status::from_byte(status_byte).ok_or_else(|| {
        VersoError::Protocol(format!("Unknown response status: 0x{:02x}", status_byte))
    })?;

    let body = if payload.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(payload)?)
    };

    Ok(Response { status, body })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let frame = read_frame(reader)?;
    decode_command(&frame)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader)?;
    decode_response(&frame)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Private Helpers
// =============================================================================

fn frame(kind: u8, payload: &[u8]) -> Result<Bytes> {
    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(VersoError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(kind);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    Ok(message.freeze())
}

/// Validate the header and return (kind, payload)
fn split_frame(bytes: &[u8]) -> Result<(u8, &[u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(VersoError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let kind = header.get_u8();
    let payload_len = header.get_u32();
    check_payload_len(payload_len)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() < total_len {
        return Err(VersoError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = (&header[1..]).get_u32();
    check_payload_len(payload_len)?;

    let mut frame = vec![0u8; HEADER_SIZE + payload_len as usize];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut frame[HEADER_SIZE..])?;
    Ok(frame)
}

fn check_payload_len(len: u32) -> Result<()> {
    if len > MAX_PAYLOAD_SIZE {
        return Err(VersoError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

fn put_token(buf: &mut BytesMut, token: &str) -> Result<()> {
    if token.len() > MAX_TOKEN_LEN {
        return Err(VersoError::Protocol(format!(
            "Token too long: {} bytes (max {})",
            token.len(),
            MAX_TOKEN_LEN
        )));
    }
    buf.put_u16(token.len() as u16);
    buf.put_slice(token.as_bytes());
    Ok(())
}

fn take_token(buf: &mut &[u8], cmd: &str) -> Result<String> {
    if buf.remaining() < 2 {
        return Err(VersoError::Protocol(format!(
            "{} command: missing token length",
            cmd
        )));
    }
    let len = buf.get_u16() as usize;

    if buf.remaining() < len {
        return Err(VersoError::Protocol(format!(
            "{} command: incomplete token (expected {}, got {})",
            cmd,
            len,
            buf.remaining()
        )));
    }
    let token = String::from_utf8(buf[..len].to_vec())
        .map_err(|_| VersoError::Protocol(format!("{} command: token is not UTF-8", cmd)))?;
    buf.advance(len);

    Ok(token)
}

fn take_id(buf: &mut &[u8], cmd: &str) -> Result<u64> {
    if buf.remaining() < 8 {
        return Err(VersoError::Protocol(format!(
            "{} command: missing resource id",
            cmd
        )));
    }
    Ok(buf.get_u64())
}
