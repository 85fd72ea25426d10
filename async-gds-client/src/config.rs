// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Client configuration data.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error returned from saving or loading config objects.
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration is invalid, with a list of validation errors.
    ConfigInvalid(Vec<String>),
    /// Reading or writing file failed.
    IO(std::io::Error),
    /// Failed to serialize or deserialize config object.
    Yaml(serde_yaml::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::IO(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

/// Configuration for a [`GdsClient`](crate::GdsClient).
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct GdsClientConfig {
    /// Endpoint URL of the global discovery server, used when a call finds
    /// the session disconnected and has to connect it first.
    pub endpoint_url: String,
    /// Preferred locales, passed along whenever the session is re-activated
    /// with a different identity.
    #[serde(default)]
    pub preferred_locales: Vec<String>,
    /// Maximum number of records requested per page when enumerating servers
    /// on the network. The server may return fewer.
    #[serde(default = "GdsClientConfig::default_query_page_size")]
    pub query_page_size: u32,
    /// Chunk size in bytes for trust list file transfers.
    #[serde(default = "GdsClientConfig::default_file_chunk_size")]
    pub file_chunk_size: u32,
}

impl GdsClientConfig {
    /// Create a configuration for the discovery server at `endpoint_url`,
    /// with defaults for everything else.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            preferred_locales: Vec::new(),
            query_page_size: Self::default_query_page_size(),
            file_chunk_size: Self::default_file_chunk_size(),
        }
    }

    fn default_query_page_size() -> u32 {
        100
    }

    fn default_file_chunk_size() -> u32 {
        4096
    }

    /// Save the configuration object to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Err(e) = self.validate() {
            return Err(ConfigError::ConfigInvalid(e));
        }
        let s = serde_yaml::to_string(&self)?;
        let mut f = File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Load the configuration object from the given path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut f = File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        let config: Self = serde_yaml::from_str(&s)?;
        if let Err(e) = config.validate() {
            return Err(ConfigError::ConfigInvalid(e));
        }
        Ok(config)
    }

    /// Validate the config struct, returning a list of validation errors if it fails.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.endpoint_url.is_empty() {
            errors.push("Endpoint url is empty".to_owned());
        }
        if self.query_page_size == 0 {
            errors.push("Query page size must be greater than zero".to_owned());
        }
        if self.file_chunk_size == 0 {
            errors.push("File chunk size must be greater than zero".to_owned());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
