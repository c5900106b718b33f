// crates/chrysalis-store/src/ipfs.rs
//
// IPFS client for content-addressed immutable storage.
// Uses reqwest to communicate with a Kubo/IPFS daemon HTTP API.

use std::time::Duration;

use chrysalis_core::{PublishError, SharedApiKey};
use serde::Deserialize;

/// Default bound on a single IPFS API call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// IPFS client for interacting with a Kubo / IPFS daemon.
///
/// Communicates with the IPFS HTTP API using reqwest. Hosted pinning
/// services that front the same API take an optional bearer credential.
#[derive(Clone)]
pub struct IpfsClient {
    /// Base URL of the IPFS HTTP API (e.g., "http://127.0.0.1:5001").
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
    /// Bearer credential, if the API requires one.
    credential: Option<SharedApiKey>,
    /// HTTP client instance.
    client: reqwest::Client,
}

impl std::fmt::Debug for IpfsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpfsClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("authenticated", &self.credential.is_some())
            .finish()
    }
}

/// One line of the NDJSON stream returned by `/api/v0/add`.
#[derive(Debug, Deserialize)]
struct AddEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsClient {
    /// Create a new IPFS client pointing at the given API base URL.
    pub fn new(base_url: &str) -> Self {
        Self::with_options(base_url, DEFAULT_TIMEOUT, None)
    }

    /// Create a client with an explicit timeout and optional credential.
    pub fn with_options(
        base_url: &str,
        timeout: Duration,
        credential: Option<SharedApiKey>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            credential,
            client,
        }
    }

    /// Build a POST request against an API path, attaching the credential.
    fn post(&self, path: &str) -> Result<reqwest::RequestBuilder, PublishError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url);

        if let Some(credential) = &self.credential {
            let key = credential.api_key().map_err(PublishError::Credentials)?;
            request = request.bearer_auth(key);
        }

        Ok(request)
    }

    /// Send a request and turn non-success statuses into errors.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<reqwest::Response, PublishError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                PublishError::Timeout(self.timeout)
            } else {
                PublishError::Request(format!("IPFS {} request failed: {}", action, e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status { status, body });
        }

        Ok(response)
    }

    /// Add a single named file wrapped in a directory, pinning it.
    ///
    /// POST /api/v0/add?pin=true&wrap-with-directory=true with multipart form
    /// data. Returns the CID of the wrapping directory, so the file is
    /// addressable as `{cid}/{file_name}`.
    pub async fn add_wrapped(
        &self,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, PublishError> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| PublishError::Request(format!("invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let request = self
            .post("/api/v0/add")?
            .query(&[("pin", "true"), ("wrap-with-directory", "true")])
            .multipart(form);
        let response = self.send(request, "add").await?;

        let body = response.text().await.map_err(|e| {
            PublishError::MalformedResponse(format!("IPFS add body read failed: {}", e))
        })?;

        directory_cid(&body)
    }

    /// Unpin a CID from the IPFS node, allowing garbage collection.
    ///
    /// POST /api/v0/pin/rm?arg={cid}
    pub async fn unpin(&self, cid: &str) -> Result<(), PublishError> {
        let request = self.post("/api/v0/pin/rm")?.query(&[("arg", cid)]);
        self.send(request, "unpin").await?;
        Ok(())
    }

    /// Retrieve raw bytes for a CID or CID path from the IPFS network.
    ///
    /// POST /api/v0/cat?arg={path}
    pub async fn cat(&self, path: &str) -> Result<Vec<u8>, PublishError> {
        let request = self.post("/api/v0/cat")?.query(&[("arg", path)]);
        let response = self.send(request, "cat").await?;

        let bytes = response.bytes().await.map_err(|e| {
            PublishError::Request(format!("IPFS cat body read failed: {}", e))
        })?;

        Ok(bytes.to_vec())
    }
}

/// Pick the wrapping directory's CID out of an `add` NDJSON response.
///
/// The directory entry is the one with an empty name.
fn directory_cid(body: &str) -> Result<String, PublishError> {
    let mut directory = None;

    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let entry: AddEntry = serde_json::from_str(line).map_err(|e| {
            PublishError::MalformedResponse(format!("IPFS add response parse failed: {}", e))
        })?;
        if entry.name.is_empty() {
            directory = Some(entry.hash);
        }
    }

    directory.ok_or_else(|| {
        PublishError::MalformedResponse("IPFS add response missing directory entry".to_string())
    })
}
