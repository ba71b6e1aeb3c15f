//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;

use serde_json::json;
use versokv::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, Response, Status, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
use versokv::VersoError;

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_update() {
    let cmd = Command::Update {
        token: "secret".to_string(),
        id: 11,
        body: br#"{"title":"First Update","version":4}"#.to_vec(),
    };
    let encoded = encode_command(&cmd).unwrap();

    assert_eq!(encoded[0], 0x03);
    assert_eq!(decode_command(&encoded).unwrap(), cmd);
}

#[test]
fn test_encode_decode_get_and_delete() {
    for cmd in [
        Command::Get {
            token: "t".to_string(),
            id: u64::MAX,
        },
        Command::Delete {
            token: String::new(),
            id: 0,
        },
    ] {
        let encoded = encode_command(&cmd).unwrap();
        assert_eq!(decode_command(&encoded).unwrap(), cmd);
    }
}

#[test]
fn test_encode_decode_create_empty_body() {
    let cmd = Command::Create {
        token: "t".to_string(),
        body: Vec::new(),
    };
    let encoded = encode_command(&cmd).unwrap();
    assert_eq!(decode_command(&encoded).unwrap(), cmd);
}

#[test]
fn test_ping_has_empty_payload() {
    let encoded = encode_command(&Command::Ping).unwrap();

    assert_eq!(encoded.len(), HEADER_SIZE);
    assert_eq!(decode_command(&encoded).unwrap(), Command::Ping);
}

#[test]
fn test_decode_unknown_command() {
    let bytes = [0x7f, 0, 0, 0, 0];
    let err = decode_command(&bytes).unwrap_err();
    assert!(matches!(err, VersoError::Protocol(_)));
}

#[test]
fn test_decode_incomplete_header() {
    let err = decode_command(&[0x01, 0, 0]).unwrap_err();
    assert!(matches!(err, VersoError::Protocol(_)));
}

#[test]
fn test_decode_truncated_id() {
    // GET with a token but only 4 of the 8 id bytes
    let payload = [0, 1, b't', 0, 0, 0, 1];
    let mut bytes = vec![0x01];
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&payload);

    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("missing resource id"));
}

#[test]
fn test_decode_token_longer_than_payload() {
    let payload = [0, 9, b'a', b'b'];
    let mut bytes = vec![0x04];
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&payload);

    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("incomplete token"));
}

#[test]
fn test_decode_rejects_trailing_bytes() {
    let mut encoded = encode_command(&Command::Get {
        token: "t".to_string(),
        id: 1,
    })
    .unwrap()
    .to_vec();
    encoded.push(0xff);
    let len = (encoded.len() - HEADER_SIZE) as u32;
    encoded[1..HEADER_SIZE].copy_from_slice(&len.to_be_bytes());

    let err = decode_command(&encoded).unwrap_err();
    assert!(err.to_string().contains("trailing"));
}

#[test]
fn test_decode_oversized_length() {
    let mut bytes = vec![0x03];
    bytes.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());

    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("too large"));
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_conflict_response() {
    let response = Response {
        status: Status::Conflict,
        body: Some(json!({
            "expected_version": 4,
            "current_version": 5,
            "current_payload": {"title": "First Update"},
        })),
    };
    let encoded = encode_response(&response).unwrap();

    assert_eq!(encoded[0], Status::Conflict as u8);
    assert_eq!(decode_response(&encoded).unwrap(), response);
}

#[test]
fn test_empty_body_decodes_to_none() {
    let encoded = encode_response(&Response::not_found()).unwrap();

    assert_eq!(encoded.len(), HEADER_SIZE);
    let decoded = decode_response(&encoded).unwrap();
    assert_eq!(decoded.status, Status::NotFound);
    assert_eq!(decoded.body, None);
}

#[test]
fn test_decode_unknown_status() {
    let err = decode_response(&[0x42, 0, 0, 0, 0]).unwrap_err();
    assert!(matches!(err, VersoError::Protocol(_)));
}

#[test]
fn test_decode_response_with_invalid_json() {
    let mut bytes = vec![0x00];
    bytes.extend_from_slice(&3u32.to_be_bytes());
    bytes.extend_from_slice(b"{{{");

    let err = decode_response(&bytes).unwrap_err();
    assert!(matches!(err, VersoError::Serialization(_)));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_multiple_commands() {
    let commands = vec![
        Command::Ping,
        Command::Get {
            token: "a".to_string(),
            id: 1,
        },
        Command::Update {
            token: "a".to_string(),
            id: 1,
            body: b"{}".to_vec(),
        },
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &commands {
        assert_eq!(&read_command(&mut cursor).unwrap(), expected);
    }

    // Stream exhausted
    let err = read_command(&mut cursor).unwrap_err();
    assert!(matches!(err, VersoError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
}

#[test]
fn test_stream_response() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::unauthorized()).unwrap();
    write_response(&mut buffer, &Response::internal_error()).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_response(&mut cursor).unwrap().status, Status::Unauthorized);
    assert_eq!(read_response(&mut cursor).unwrap().status, Status::InternalError);
}

#[test]
fn test_stream_truncated_payload() {
    let encoded = encode_command(&Command::Get {
        token: "t".to_string(),
        id: 1,
    })
    .unwrap();
    let mut cursor = Cursor::new(encoded[..encoded.len() - 2].to_vec());

    let err = read_command(&mut cursor).unwrap_err();
    assert!(matches!(err, VersoError::Io(_)));
}
