//! Blocking client
//!
//! One request in flight per connection; open several clients to race.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::Result;
use crate::model::{ResourceId, Version, Workout};
use crate::protocol::{read_response, write_command, Command, Response};

/// Client for a VersoKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    token: String,
}

impl Client {
    /// Connect and remember the bearer token for every request
    pub fn connect(addr: impl ToSocketAddrs, token: impl Into<String>) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            token: token.into(),
        })
    }

    /// Send any command and wait for its response
    pub fn send(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    pub fn ping(&mut self) -> Result<Response> {
        self.send(&Command::Ping)
    }

    pub fn get(&mut self, id: ResourceId) -> Result<Response> {
        let command = Command::Get {
            token: self.token.clone(),
            id,
        };
        self.send(&command)
    }

    pub fn create(&mut self, workout: &Workout) -> Result<Response> {
        let command = Command::Create {
            token: self.token.clone(),
            body: serde_json::to_vec(workout)?,
        };
        self.send(&command)
    }

    /// Conditional update with the version the caller last saw
    pub fn update(&mut self, id: ResourceId, version: Version, workout: &Workout) -> Result<Response> {
        let mut body = serde_json::to_value(workout)?;
        body["version"] = serde_json::Value::from(version);

        self.update_raw(id, serde_json::to_vec(&body)?)
    }

    /// Update with a caller-built body (no client-side checks)
    pub fn update_raw(&mut self, id: ResourceId, body: Vec<u8>) -> Result<Response> {
        let command = Command::Update {
            token: self.token.clone(),
            id,
            body,
        };
        self.send(&command)
    }

    pub fn delete(&mut self, id: ResourceId) -> Result<Response> {
        let command = Command::Delete {
            token: self.token.clone(),
            id,
        };
        self.send(&command)
    }
}
