// crates/chrysalis-store/src/publisher.rs
//
// IpfsPublisher: publishes one evolution stage as an image asset plus a
// linked metadata document, and resolves published documents back.
//
// Layout on IPFS, per stage:
//   {image_dir}/{file_name}       the stage image
//   {metadata_dir}/metadata.json  the metadata, `image` = ipfs://{image_dir}/{file_name}
//
// The returned reference is https://{gateway}/ipfs/{metadata_dir}/metadata.json.

use async_trait::async_trait;

use chrysalis_core::{ContentPublisher, ImageAsset, MetadataRecord, MetadataResolver, PublishError};

use crate::config::StorageConfig;
use crate::ipfs::IpfsClient;

/// File name of the metadata document inside its wrapping directory.
pub const METADATA_FILE: &str = "metadata.json";

/// ContentPublisher backed by an IPFS API node and a public gateway.
#[derive(Debug, Clone)]
pub struct IpfsPublisher {
    pub ipfs: IpfsClient,
    /// Gateway host used in returned references (e.g., "ipfs.io").
    pub gateway: String,
}

impl IpfsPublisher {
    pub fn new(ipfs: IpfsClient, gateway: &str) -> Self {
        Self {
            ipfs,
            gateway: normalize_gateway(gateway),
        }
    }

    /// Build a publisher from storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        let ipfs = IpfsClient::with_options(&config.api_url, config.timeout(), config.credential());
        Self::new(ipfs, &config.gateway)
    }

    /// Dereferenceable URI for a metadata directory CID.
    pub fn metadata_uri(&self, metadata_dir: &str) -> String {
        format!("https://{}/ipfs/{}/{}", self.gateway, metadata_dir, METADATA_FILE)
    }
}

/// Strip scheme and trailing slashes so the host can be formatted into URIs.
fn normalize_gateway(gateway: &str) -> String {
    gateway
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

/// Extract the `{cid}/metadata.json` path from a published reference.
///
/// Accepts gateway URLs (`https://host/ipfs/{cid}/metadata.json`) and
/// native `ipfs://{cid}/metadata.json` links.
pub fn ipfs_path(reference: &str) -> Result<String, PublishError> {
    let path = if let Some(rest) = reference.strip_prefix("ipfs://") {
        rest
    } else if let Some(idx) = reference.find("/ipfs/") {
        &reference[idx + "/ipfs/".len()..]
    } else {
        return Err(PublishError::InvalidReference(reference.to_string()));
    };

    let path = path.trim_matches('/');
    if path.is_empty() || path.starts_with(METADATA_FILE) {
        return Err(PublishError::InvalidReference(reference.to_string()));
    }

    Ok(path.to_string())
}

#[async_trait]
impl ContentPublisher for IpfsPublisher {
    async fn publish(
        &self,
        asset: ImageAsset,
        mut metadata: MetadataRecord,
    ) -> Result<String, PublishError> {
        let file_name = asset.file_name.clone();

        // Step 1: Upload the image asset.
        let image_dir = self
            .ipfs
            .add_wrapped(&asset.file_name, &asset.content_type, asset.bytes)
            .await?;
        tracing::debug!("Uploaded {} as {}/{}", metadata.name, image_dir, file_name);

        // Step 2: Point the metadata at the uploaded asset.
        metadata.image = format!("ipfs://{}/{}", image_dir, file_name);
        let json = serde_json::to_vec_pretty(&metadata)?;

        // Step 3: Upload the metadata document. Release the image on failure
        // so no half-published stage stays pinned.
        let metadata_dir = match self
            .ipfs
            .add_wrapped(METADATA_FILE, "application/json", json)
            .await
        {
            Ok(cid) => cid,
            Err(e) => {
                if let Err(unpin_err) = self.ipfs.unpin(&image_dir).await {
                    tracing::warn!("Failed to unpin orphaned image {}: {}", image_dir, unpin_err);
                }
                return Err(e);
            }
        };

        let reference = self.metadata_uri(&metadata_dir);
        tracing::info!("Published {} at {}", metadata.name, reference);
        Ok(reference)
    }
}

#[async_trait]
impl MetadataResolver for IpfsPublisher {
    async fn resolve(&self, reference: &str) -> Result<MetadataRecord, PublishError> {
        let path = ipfs_path(reference)?;
        let bytes = self.ipfs.cat(&path).await?;
        let record: MetadataRecord = serde_json::from_slice(&bytes)?;
        Ok(record)
    }
}
