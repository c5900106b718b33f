// crates/chrysalis-forge/src/img2img.rs
//
// Hugging Face inference client for image-to-image diffusion models.
//
// The source image travels base64-encoded inside a JSON body; the model
// answers with the raw bytes of the generated image.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use chrysalis_core::prompt::NEGATIVE_PROMPT;
use chrysalis_core::{EnvApiKey, ImageTransformer, SharedApiKey, TransformError};

use crate::config::TransformConfig;

#[derive(Debug, Serialize)]
struct Img2ImgRequest<'a> {
    inputs: Img2ImgInputs<'a>,
}

#[derive(Debug, Serialize)]
struct Img2ImgInputs<'a> {
    image: String,
    prompt: &'a str,
    negative_prompt: &'a str,
    denoising_strength: f64,
}

/// ImageTransformer backed by a Hugging Face hosted img2img model.
#[derive(Clone)]
pub struct HuggingFaceTransformer {
    /// Full URL of the inference endpoint.
    pub endpoint_url: String,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
    bounds: (f64, f64),
    api_key: SharedApiKey,
    client: reqwest::Client,
}

impl std::fmt::Debug for HuggingFaceTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceTransformer")
            .field("endpoint_url", &self.endpoint_url)
            .field("timeout", &self.timeout)
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl HuggingFaceTransformer {
    /// Create a client for `endpoint_url` authenticated by `api_key`.
    pub fn new(endpoint_url: &str, api_key: SharedApiKey, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint_url: endpoint_url.to_string(),
            timeout,
            bounds: (0.0, 1.0),
            api_key,
            client,
        }
    }

    /// Override the strength range the model accepts.
    pub fn with_strength_bounds(mut self, min: f64, max: f64) -> Self {
        self.bounds = if min <= max { (min, max) } else { (max, min) };
        self
    }

    /// Build a client from configuration, reading the key from the environment.
    pub fn from_config(config: &TransformConfig) -> Self {
        let api_key: SharedApiKey = Arc::new(EnvApiKey::new(config.api_key_env.clone()));
        Self::new(&config.endpoint_url, api_key, config.timeout())
            .with_strength_bounds(config.min_strength, config.max_strength)
    }
}

#[async_trait]
impl ImageTransformer for HuggingFaceTransformer {
    async fn transform(
        &self,
        source: &[u8],
        prompt: &str,
        strength: f64,
    ) -> Result<Vec<u8>, TransformError> {
        let key = self.api_key.api_key().map_err(TransformError::Credentials)?;

        let body = Img2ImgRequest {
            inputs: Img2ImgInputs {
                image: STANDARD.encode(source),
                prompt,
                negative_prompt: NEGATIVE_PROMPT,
                denoising_strength: strength,
            },
        };

        tracing::debug!(
            "Requesting img2img from {} (strength {:.2}, {} source bytes)",
            self.endpoint_url,
            strength,
            source.len()
        );

        let response = self
            .client
            .post(&self.endpoint_url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransformError::Timeout(self.timeout)
                } else {
                    TransformError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransformError::Status { status, body });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransformError::Timeout(self.timeout)
            } else {
                TransformError::Request(format!("image body read failed: {}", e))
            }
        })?;

        if bytes.is_empty() {
            return Err(TransformError::EmptyImage);
        }

        Ok(bytes.to_vec())
    }

    fn strength_bounds(&self) -> (f64, f64) {
        self.bounds
    }
}
