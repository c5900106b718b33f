// crates/chrysalis-store/src/config.rs
//
// Storage backend configuration, deserialized from the `[storage]` table.

use std::sync::Arc;
use std::time::Duration;

use chrysalis_core::{EnvApiKey, SharedApiKey};
use serde::Deserialize;

/// Connection settings for the IPFS API node and public gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// URL of the IPFS API endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Gateway host used when building metadata references.
    #[serde(default = "default_gateway")]
    pub gateway: String,

    /// Environment variable holding a bearer token, for hosted pinning APIs.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_gateway() -> String {
    "ipfs.io".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            gateway: default_gateway(),
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Credential provider, when a token variable is configured.
    pub fn credential(&self) -> Option<SharedApiKey> {
        self.api_key_env
            .as_ref()
            .map(|var| Arc::new(EnvApiKey::new(var.clone())) as SharedApiKey)
    }
}
