// crates/chrysalis-pipeline/src/pipeline.rs
//
// EvolutionPipeline: turns one base image into a published, linked chain of
// progressively evolved stages.
//
// Stage 0 is the base image, published unmodified. Every later stage is
// generated from the previous stage's generated image, published with a
// back-link to the previous stage's reference, and the chain stops at the
// first stage that cannot be generated or published.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrysalis_core::attributes::{derive_attributes, genesis_attributes};
use chrysalis_core::prompt::compose;
use chrysalis_core::{
    ContentPublisher, EvolutionChain, EvolutionStage, ImageAsset, ImageTransformer,
    MetadataRecord, PipelineError, PublishError, TransformError,
};

use crate::outcome::{EvolutionOutcome, StageFailure, StageFailureReason};
use crate::state::{PipelineState, PipelineStateMachine};

/// File name of the genesis image inside its IPFS directory.
pub const GENESIS_FILE: &str = "image.jpeg";

/// Tunables for a pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Prefix of every stage name, e.g. "Evolving NFT - Stage 3".
    pub collection_name: String,
    /// Upper bound on each remote call, on top of the clients' own timeouts.
    pub call_timeout: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            collection_name: "Evolving NFT".to_string(),
            call_timeout: None,
        }
    }
}

/// A generated image waiting to be published.
struct PendingStage {
    image: Vec<u8>,
    prompt: String,
    strength: f64,
}

/// Orchestrates generation and publication of an evolution chain.
///
/// Holds no per-request state, so one instance can serve concurrent requests.
#[derive(Clone)]
pub struct EvolutionPipeline {
    transformer: Arc<dyn ImageTransformer>,
    publisher: Arc<dyn ContentPublisher>,
    options: PipelineOptions,
}

impl EvolutionPipeline {
    pub fn new(
        transformer: Arc<dyn ImageTransformer>,
        publisher: Arc<dyn ContentPublisher>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transformer,
            publisher,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Generate and publish genesis plus `stage_count` evolved stages.
    ///
    /// Fails only when genesis cannot be published. Any later failure ends
    /// the chain early and is reported on the returned outcome.
    pub async fn generate(
        &self,
        base_image: Vec<u8>,
        description: &str,
        stage_count: u32,
    ) -> Result<EvolutionOutcome, PipelineError> {
        let mut machine = PipelineStateMachine::new(stage_count);
        let mut chain = EvolutionChain::new(description);
        let mut base_image = Some(base_image);
        let mut pending: Option<PendingStage> = None;
        let mut failure: Option<StageFailure> = None;

        tracing::info!(
            "Evolution {}: generating genesis + {} stages",
            chain.id,
            stage_count
        );

        loop {
            match machine.current() {
                PipelineState::PublishingGenesis => {
                    let image = base_image.take().unwrap_or_default();
                    let attributes = genesis_attributes();
                    let metadata = MetadataRecord::new(
                        self.stage_name(0),
                        description,
                        attributes.clone(),
                        None,
                    );
                    let asset = ImageAsset::jpeg(GENESIS_FILE, image.clone());

                    match self.publish(asset, metadata).await {
                        Ok(reference) => {
                            chain.push_stage(EvolutionStage::genesis(image, attributes, reference))?;
                            machine.transition(machine.after_published(0))?;
                        }
                        Err(e) => {
                            machine.transition(PipelineState::FailedFatal)?;
                            tracing::error!("Evolution {}: genesis publish failed: {}", chain.id, e);
                            return Err(PipelineError::Genesis(e));
                        }
                    }
                }
                PipelineState::Generating(stage) => {
                    let composed = compose(description, stage);
                    let strength = fit_strength(composed.strength, self.transformer.strength_bounds());
                    let source = match chain.latest() {
                        Some(previous) => &previous.image,
                        None => {
                            return Err(PipelineError::InvalidState(format!(
                                "stage {} has no predecessor",
                                stage
                            )))
                        }
                    };

                    match self.transform(source, &composed.prompt, strength).await {
                        Ok(image) => {
                            pending = Some(PendingStage {
                                image,
                                prompt: composed.prompt,
                                strength,
                            });
                            machine.transition(PipelineState::Publishing(stage))?;
                        }
                        Err(e) => {
                            failure = Some(StageFailure {
                                stage,
                                reason: StageFailureReason::Transform(e),
                            });
                            machine.transition(PipelineState::DonePartial)?;
                        }
                    }
                }
                PipelineState::Publishing(stage) => {
                    let generated = pending.take().ok_or_else(|| {
                        PipelineError::InvalidState(format!("stage {} has no generated image", stage))
                    })?;
                    let previous_ref = chain
                        .latest()
                        .map(|s| s.metadata_ref.clone())
                        .ok_or_else(|| {
                            PipelineError::InvalidState(format!("stage {} has no predecessor", stage))
                        })?;
                    let attributes = derive_attributes(stage);
                    let metadata = MetadataRecord::new(
                        self.stage_name(stage),
                        evolved_description(description, stage),
                        attributes.clone(),
                        Some(previous_ref.clone()),
                    );
                    let asset = ImageAsset::jpeg(stage_file(stage), generated.image.clone());

                    match self.publish(asset, metadata).await {
                        Ok(reference) => {
                            chain.push_stage(EvolutionStage::evolved(
                                stage,
                                generated.image,
                                generated.prompt,
                                generated.strength,
                                attributes,
                                reference,
                                previous_ref,
                            ))?;
                            machine.transition(machine.after_published(stage))?;
                        }
                        Err(e) => {
                            failure = Some(StageFailure {
                                stage,
                                reason: StageFailureReason::Publish(e),
                            });
                            machine.transition(PipelineState::DonePartial)?;
                        }
                    }
                }
                PipelineState::Done | PipelineState::DonePartial | PipelineState::FailedFatal => {
                    break
                }
            }
        }

        let outcome = EvolutionOutcome {
            chain,
            requested: stage_count,
            failure,
            trace: machine.into_history(),
        };

        match &outcome.failure {
            Some(f) => tracing::warn!(
                "Evolution {}: stopped at stage {} ({}); realized {}/{} stages",
                outcome.chain.id,
                f.stage,
                f.reason,
                outcome.achieved(),
                outcome.requested
            ),
            None => tracing::info!(
                "Evolution {}: complete, {}/{} stages",
                outcome.chain.id,
                outcome.achieved(),
                outcome.requested
            ),
        }

        Ok(outcome)
    }

    fn stage_name(&self, stage: u32) -> String {
        format!("{} - Stage {}", self.options.collection_name, stage)
    }

    async fn transform(
        &self,
        source: &[u8],
        prompt: &str,
        strength: f64,
    ) -> Result<Vec<u8>, TransformError> {
        bounded(
            self.options.call_timeout,
            self.transformer.transform(source, prompt, strength),
            TransformError::Timeout,
        )
        .await
    }

    async fn publish(
        &self,
        asset: ImageAsset,
        metadata: MetadataRecord,
    ) -> Result<String, PublishError> {
        bounded(
            self.options.call_timeout,
            self.publisher.publish(asset, metadata),
            PublishError::Timeout,
        )
        .await
    }
}

/// Run a remote call, mapping an elapsed bound to the caller's timeout error.
async fn bounded<T, E>(
    limit: Option<Duration>,
    call: impl Future<Output = Result<T, E>>,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E> {
    match limit {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(limit)),
        },
        None => call.await,
    }
}

/// Fit a composed strength into the backend's accepted range.
pub fn fit_strength(strength: f64, (min, max): (f64, f64)) -> f64 {
    strength.max(min).min(max)
}

/// File name of an evolved stage's image.
pub fn stage_file(stage: u32) -> String {
    format!("evolution_stage_{}.jpeg", stage)
}

/// Description published for an evolved stage.
pub fn evolved_description(description: &str, stage: u32) -> String {
    format!(
        "{} - Now evolved to stage {} through ApeChain interactions!",
        description, stage
    )
}
