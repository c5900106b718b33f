// crates/chrysalis-core/src/stage.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::PipelineError;

/// One descriptive trait of a stage, serialized as `{trait_type, value}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Placeholder held in `MetadataRecord::image` until the asset is uploaded.
pub const IMAGE_PLACEHOLDER: &str = "pending-upload";

/// The JSON document published for every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub name: String,
    pub description: String,
    /// Link to the uploaded image asset once published.
    pub image: String,
    pub attributes: Vec<Attribute>,
    /// Reference to the predecessor stage's metadata document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_stage: Option<String>,
}

impl MetadataRecord {
    /// Build a record whose image slot still awaits upload.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        attributes: Vec<Attribute>,
        previous_stage: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: IMAGE_PLACEHOLDER.to_string(),
            attributes,
            previous_stage,
        }
    }

    /// Value of the first attribute with the given trait name.
    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }
}

/// A named binary asset handed to the content publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    /// A JPEG asset, the format every stage is stored in.
    pub fn jpeg(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "image/jpeg".to_string(),
            bytes,
        }
    }
}

/// One published step of an evolution chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStage {
    /// 0 is the unmodified genesis stage.
    pub index: u32,
    #[serde(skip)]
    pub image: Vec<u8>,
    /// Hex SHA-256 of `image`.
    pub image_digest: String,
    /// Exact prompt used to generate the image (None for genesis).
    pub prompt: Option<String>,
    /// Transformation strength sent to the backend (None for genesis).
    pub strength: Option<f64>,
    pub attributes: Vec<Attribute>,
    /// Published reference of this stage's metadata document.
    pub metadata_ref: String,
    /// `metadata_ref` of the predecessor (None for genesis).
    pub previous_ref: Option<String>,
}

impl EvolutionStage {
    /// The genesis stage: the untouched base image.
    pub fn genesis(image: Vec<u8>, attributes: Vec<Attribute>, metadata_ref: String) -> Self {
        Self {
            index: 0,
            image_digest: digest_hex(&image),
            image,
            prompt: None,
            strength: None,
            attributes,
            metadata_ref,
            previous_ref: None,
        }
    }

    /// An evolved stage generated from its predecessor's image.
    pub fn evolved(
        index: u32,
        image: Vec<u8>,
        prompt: String,
        strength: f64,
        attributes: Vec<Attribute>,
        metadata_ref: String,
        previous_ref: String,
    ) -> Self {
        Self {
            index,
            image_digest: digest_hex(&image),
            image,
            prompt: Some(prompt),
            strength: Some(strength),
            attributes,
            metadata_ref,
            previous_ref: Some(previous_ref),
        }
    }
}

/// Hex-encoded SHA-256 of a payload.
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// What a minting flow needs: the canonical token URI and the full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintPayload {
    pub token_uri: String,
    pub evolution_uris: Vec<String>,
}

/// The ordered stages produced for one evolution request.
///
/// Stages can only be appended in index order, each linking to the
/// reference of the stage before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionChain {
    /// Correlates every log line of one request.
    pub id: Uuid,
    pub base_description: String,
    pub created_at: DateTime<Utc>,
    stages: Vec<EvolutionStage>,
}

impl EvolutionChain {
    /// Start an empty chain for a description.
    pub fn new(base_description: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            base_description: base_description.into(),
            created_at: Utc::now(),
            stages: Vec::new(),
        }
    }

    /// Append the next stage, enforcing index order and back-links.
    pub fn push_stage(&mut self, stage: EvolutionStage) -> Result<(), PipelineError> {
        let expected_index = self.stages.len();
        if usize::try_from(stage.index).ok() != Some(expected_index) {
            return Err(PipelineError::InvalidState(format!(
                "expected stage {} but got stage {}",
                expected_index, stage.index
            )));
        }

        let expected_previous = self.stages.last().map(|s| s.metadata_ref.as_str());
        if stage.previous_ref.as_deref() != expected_previous {
            return Err(PipelineError::InvalidState(format!(
                "stage {} links to {:?} but predecessor is {:?}",
                stage.index, stage.previous_ref, expected_previous
            )));
        }

        self.stages.push(stage);
        Ok(())
    }

    pub fn stages(&self) -> &[EvolutionStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn genesis(&self) -> Option<&EvolutionStage> {
        self.stages.first()
    }

    pub fn latest(&self) -> Option<&EvolutionStage> {
        self.stages.last()
    }

    /// Published references in stage order.
    pub fn metadata_refs(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.metadata_ref.clone()).collect()
    }

    /// Reference to surface for a token whose on-chain stage is `current_stage`.
    ///
    /// Stages beyond what was realized resolve to the latest published stage.
    pub fn reference_for_stage(&self, current_stage: u32) -> Option<&str> {
        select_reference(self.stages.as_slice(), current_stage, |s| s.metadata_ref.as_str())
    }

    /// Token URI (genesis) plus full history, or None for an empty chain.
    pub fn mint_payload(&self) -> Option<MintPayload> {
        let genesis = self.genesis()?;
        Some(MintPayload {
            token_uri: genesis.metadata_ref.clone(),
            evolution_uris: self.metadata_refs(),
        })
    }
}

/// Pick the entry for `current_stage`, clamped to the last available one.
pub fn select_reference<T>(
    items: &[T],
    current_stage: u32,
    project: impl Fn(&T) -> &str,
) -> Option<&str> {
    let last = items.len().checked_sub(1)?;
    let wanted = usize::try_from(current_stage).unwrap_or(usize::MAX);
    items.get(wanted.min(last)).map(project)
}
