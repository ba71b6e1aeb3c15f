//! Configuration for VersoKV
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, VersoError};

/// Main configuration for a VersoKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Number of independently locked shards in the resource table.
    /// Records are assigned to `id % shard_count`.
    pub shard_count: usize,

    // -------------------------------------------------------------------------
    // Validation Configuration
    // -------------------------------------------------------------------------
    /// Rules applied to request bodies before the store is touched
    pub validation: ValidationRules,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections (size of the worker pool)
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// Structural and semantic rules for workout bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    /// Accept a blank `title`
    pub allow_empty_title: bool,

    /// Upper bound on `entries` per workout
    pub max_entries: usize,

    /// Upper bound on the length of any single text field (bytes)
    pub max_text_len: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            allow_empty_title: false,
            max_entries: 256,
            max_text_len: 4096,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_count: 16,
            validation: ValidationRules::default(),
            listen_addr: "127.0.0.1:7878".to_string(),
            max_connections: 64,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the store or server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(VersoError::Config("shard_count must be at least 1".to_string()));
        }
        if self.max_connections == 0 {
            return Err(VersoError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the number of shards in the resource table
    pub fn shard_count(mut self, count: usize) -> Self {
        self.config.shard_count = count;
        self
    }

    /// Replace the validation rules
    pub fn validation(mut self, rules: ValidationRules) -> Self {
        self.config.validation = rules;
        self
    }

    /// Accept or reject blank titles
    pub fn allow_empty_title(mut self, allow: bool) -> Self {
        self.config.validation.allow_empty_title = allow;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
