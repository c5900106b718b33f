// crates/chrysalis-forge/src/config.rs
//
// Transformation backend configuration, deserialized from the `[transform]` table.

use std::time::Duration;

use serde::Deserialize;

/// Settings for the image-to-image inference endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// Full URL of the model inference endpoint.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds. Image models are slow; keep this generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Lowest denoising strength the model accepts.
    #[serde(default = "default_min_strength")]
    pub min_strength: f64,

    /// Highest denoising strength the model accepts.
    #[serde(default = "default_max_strength")]
    pub max_strength: f64,
}

fn default_endpoint_url() -> String {
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-refiner-1.0"
        .to_string()
}

fn default_api_key_env() -> String {
    "HUGGING_FACE_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_min_strength() -> f64 {
    0.0
}

fn default_max_strength() -> f64 {
    1.0
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            min_strength: default_min_strength(),
            max_strength: default_max_strength(),
        }
    }
}

impl TransformConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
