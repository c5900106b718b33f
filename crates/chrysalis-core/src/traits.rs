// crates/chrysalis-core/src/traits.rs

use async_trait::async_trait;

use crate::error::{PublishError, TransformError};
use crate::stage::{ImageAsset, MetadataRecord};

/// Trait for the remote image-to-image generation backend.
///
/// Implemented by chrysalis-forge.
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    /// Produce a new image from `source`, steered toward `prompt`.
    ///
    /// `strength` controls how far the result may drift from the source.
    /// One outbound call per invocation; no retries.
    async fn transform(
        &self,
        source: &[u8],
        prompt: &str,
        strength: f64,
    ) -> Result<Vec<u8>, TransformError>;

    /// Inclusive range of strengths the backend accepts.
    fn strength_bounds(&self) -> (f64, f64) {
        (0.0, 1.0)
    }
}

/// Trait for content-addressed publication of a stage.
///
/// Implemented by chrysalis-store (IPFS backend).
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Store the image and its metadata, returning a dereferenceable URI
    /// for the metadata document. Either both land or an error is returned.
    async fn publish(
        &self,
        asset: ImageAsset,
        metadata: MetadataRecord,
    ) -> Result<String, PublishError>;
}

/// Trait for reading published metadata back by reference.
///
/// Implemented by chrysalis-store (IPFS backend).
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<MetadataRecord, PublishError>;
}
