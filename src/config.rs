// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Persistent settings are stored in TOML via `confy`. Command-line flags
//! override them for a single invocation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use xbl_status_client::ws::{DEFAULT_ENDPOINT, DEFAULT_ORIGIN, DEFAULT_TIMEOUT};
use xbl_status_client::FetcherConfig;

const APP_NAME: &str = "xbl-status";
const CONFIG_NAME: &str = "config";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// WebSocket URL of the status feed
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Origin header sent with the connection
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Deadline for one fetch, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(5000)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            endpoint: default_endpoint(),
            origin: default_origin(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Replace stored values with any that were given on the command line
    pub fn apply_overrides(
        &mut self,
        endpoint: Option<String>,
        origin: Option<String>,
        timeout_ms: Option<u64>,
    ) {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(origin) = origin {
            self.origin = origin;
        }
        if let Some(timeout_ms) = timeout_ms {
            self.timeout_ms = timeout_ms;
        }
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            endpoint: self.endpoint.clone(),
            origin: self.origin.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}
