// crates/chrysalis-pipeline/tests/evolution_pipeline.rs
//
// End-to-end behaviour of the evolution pipeline against in-memory backends:
// complete chains, partial chains on transform or publish failure, fatal
// genesis failure, timeouts, concurrent requests, and verification of what
// was published.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use chrysalis_core::{
    ContentPublisher, ImageAsset, ImageTransformer, MetadataRecord, MetadataResolver,
    PipelineError, PublishError, TransformError,
};
use chrysalis_pipeline::{
    verify_chain, EvolutionPipeline, PipelineOptions, PipelineState, StageCheck,
    StageFailureReason,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TransformCall {
    source: Vec<u8>,
    prompt: String,
    strength: f64,
}

/// Appends a marker to the source image so every generation is distinct.
#[derive(Default)]
struct FakeTransformer {
    calls: Mutex<Vec<TransformCall>>,
    /// 1-based call number that fails.
    fail_on_call: Option<usize>,
    delay: Option<Duration>,
}

impl FakeTransformer {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<TransformCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageTransformer for FakeTransformer {
    async fn transform(
        &self,
        source: &[u8],
        prompt: &str,
        strength: f64,
    ) -> Result<Vec<u8>, TransformError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(TransformCall {
                source: source.to_vec(),
                prompt: prompt.to_string(),
                strength,
            });
            calls.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on_call == Some(call_number) {
            return Err(TransformError::Status {
                status: 503,
                body: "model overloaded".to_string(),
            });
        }

        let mut evolved = source.to_vec();
        evolved.extend_from_slice(format!("+{}", call_number).as_bytes());
        Ok(evolved)
    }
}

/// Stores metadata in memory under gateway-style references.
#[derive(Default)]
struct FakePublisher {
    documents: Mutex<HashMap<String, MetadataRecord>>,
    assets: Mutex<Vec<ImageAsset>>,
    calls: AtomicUsize,
    /// 1-based call number that fails.
    fail_on_call: Option<usize>,
}

impl FakePublisher {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    fn document(&self, reference: &str) -> MetadataRecord {
        self.documents.lock().unwrap()[reference].clone()
    }

    fn tamper(&self, reference: &str, previous: Option<String>) {
        let mut documents = self.documents.lock().unwrap();
        if let Some(doc) = documents.get_mut(reference) {
            doc.previous_stage = previous;
        }
    }

    fn asset_names(&self) -> Vec<String> {
        self.assets
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.file_name.clone())
            .collect()
    }
}

#[async_trait]
impl ContentPublisher for FakePublisher {
    async fn publish(
        &self,
        asset: ImageAsset,
        mut metadata: MetadataRecord,
    ) -> Result<String, PublishError> {
        let call_number = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call_number) {
            return Err(PublishError::Status {
                status: 429,
                body: "quota exceeded".to_string(),
            });
        }

        let reference = format!("https://ipfs.io/ipfs/QmMeta{}/metadata.json", call_number);
        metadata.image = format!("ipfs://QmImage{}/{}", call_number, asset.file_name);
        self.documents
            .lock()
            .unwrap()
            .insert(reference.clone(), metadata);
        self.assets.lock().unwrap().push(asset);
        Ok(reference)
    }
}

#[async_trait]
impl MetadataResolver for FakePublisher {
    async fn resolve(&self, reference: &str) -> Result<MetadataRecord, PublishError> {
        self.documents
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| PublishError::InvalidReference(reference.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BASE_IMAGE: &[u8] = b"base";

fn pipeline(
    transformer: Arc<FakeTransformer>,
    publisher: Arc<FakePublisher>,
) -> EvolutionPipeline {
    EvolutionPipeline::new(transformer, publisher, PipelineOptions::default())
}

fn assert_linked(outcome: &chrysalis_pipeline::EvolutionOutcome) {
    let stages = outcome.chain.stages();
    assert!(stages[0].previous_ref.is_none());
    for (i, stage) in stages.iter().enumerate() {
        assert_eq!(stage.index as usize, i);
        if i > 0 {
            assert_eq!(
                stage.previous_ref.as_deref(),
                Some(stages[i - 1].metadata_ref.as_str())
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Complete chains
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_chain_has_every_stage_linked() {
    for stage_count in [0u32, 1, 5] {
        let transformer = Arc::new(FakeTransformer::default());
        let publisher = Arc::new(FakePublisher::default());
        let outcome = pipeline(transformer.clone(), publisher.clone())
            .generate(BASE_IMAGE.to_vec(), "a fox", stage_count)
            .await
            .unwrap();

        assert_eq!(outcome.chain.len(), stage_count as usize + 1);
        assert!(outcome.is_complete());
        assert_eq!(outcome.achieved(), stage_count);
        assert_eq!(outcome.final_state(), Some(PipelineState::Done));
        assert_eq!(transformer.calls().len(), stage_count as usize);
        assert_linked(&outcome);
    }
}

#[tokio::test]
async fn genesis_is_published_unmodified() {
    let transformer = Arc::new(FakeTransformer::default());
    let publisher = Arc::new(FakePublisher::default());
    let outcome = pipeline(transformer, publisher.clone())
        .generate(BASE_IMAGE.to_vec(), "a fox", 0)
        .await
        .unwrap();

    let genesis = outcome.chain.genesis().unwrap();
    assert_eq!(genesis.image, BASE_IMAGE);
    assert!(genesis.prompt.is_none());
    assert!(genesis.strength.is_none());

    let doc = publisher.document(&genesis.metadata_ref);
    assert_eq!(doc.name, "Evolving NFT - Stage 0");
    assert_eq!(doc.description, "a fox");
    assert_eq!(doc.attribute("Evolution Stage"), Some("0"));
    assert_eq!(doc.attribute("Interactions"), Some("0"));
    assert!(doc.previous_stage.is_none());
    assert_eq!(publisher.asset_names(), vec!["image.jpeg"]);
}

#[tokio::test]
async fn each_stage_evolves_from_previous_generated_image() {
    let transformer = Arc::new(FakeTransformer::default());
    let publisher = Arc::new(FakePublisher::default());
    let outcome = pipeline(transformer.clone(), publisher)
        .generate(BASE_IMAGE.to_vec(), "a fox", 3)
        .await
        .unwrap();

    let calls = transformer.calls();
    let stages = outcome.chain.stages();
    assert_eq!(calls[0].source, BASE_IMAGE);
    assert_eq!(calls[1].source, stages[1].image);
    assert_eq!(calls[2].source, stages[2].image);
    assert_eq!(stages[3].image, b"base+1+2+3");
}

#[tokio::test]
async fn evolved_stages_carry_prompt_strength_and_traits() {
    let transformer = Arc::new(FakeTransformer::default());
    let publisher = Arc::new(FakePublisher::default());
    let outcome = pipeline(transformer.clone(), publisher.clone())
        .generate(BASE_IMAGE.to_vec(), "a fox", 3)
        .await
        .unwrap();

    let stage = &outcome.chain.stages()[3];
    assert_eq!(
        stage.prompt.as_deref(),
        Some("a fox, significantly transformed, with new colors and details, detailed, high quality, on ApeChain blockchain")
    );
    assert!((stage.strength.unwrap() - 0.6).abs() < 1e-9);
    assert_eq!(transformer.calls()[0].strength, 0.4);

    let doc = publisher.document(&stage.metadata_ref);
    assert_eq!(doc.name, "Evolving NFT - Stage 3");
    assert_eq!(
        doc.description,
        "a fox - Now evolved to stage 3 through ApeChain interactions!"
    );
    assert_eq!(doc.attribute("Evolution Path"), Some("Ascendant"));
    assert_eq!(doc.attribute("Power Level"), Some("60"));
    assert_eq!(doc.attribute("Aura"), Some("Radiant Gold"));
    assert_eq!(doc.attribute("Special Ability"), Some("Block Perception"));
    assert_eq!(
        doc.previous_stage.as_deref(),
        Some(outcome.chain.stages()[2].metadata_ref.as_str())
    );
    assert_eq!(
        publisher.asset_names(),
        vec![
            "image.jpeg",
            "evolution_stage_1.jpeg",
            "evolution_stage_2.jpeg",
            "evolution_stage_3.jpeg"
        ]
    );
}

#[tokio::test]
async fn strength_is_fitted_to_backend_bounds() {
    let transformer = Arc::new(FakeTransformer::default());
    let publisher = Arc::new(FakePublisher::default());
    let outcome = pipeline(transformer.clone(), publisher)
        .generate(BASE_IMAGE.to_vec(), "a fox", 9)
        .await
        .unwrap();

    // 0.3 + 7 * 0.1 reaches the default upper bound of 1.0.
    let strengths: Vec<f64> = transformer.calls().iter().map(|c| c.strength).collect();
    assert!(strengths.iter().all(|s| (0.0..=1.0).contains(s)));
    assert_eq!(strengths[8], 1.0);
    assert_eq!(outcome.chain.stages()[9].strength, Some(1.0));
}

#[tokio::test]
async fn mint_payload_lists_every_reference() {
    let outcome = pipeline(
        Arc::new(FakeTransformer::default()),
        Arc::new(FakePublisher::default()),
    )
    .generate(BASE_IMAGE.to_vec(), "a fox", 2)
    .await
    .unwrap();

    let payload = outcome.chain.mint_payload().unwrap();
    assert_eq!(payload.token_uri, outcome.chain.stages()[0].metadata_ref);
    assert_eq!(payload.evolution_uris, outcome.chain.metadata_refs());
    assert_eq!(payload.evolution_uris.len(), 3);
}

// ---------------------------------------------------------------------------
// Partial and fatal outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transform_failure_returns_partial_chain() {
    // Third transform call is stage 3.
    let transformer = Arc::new(FakeTransformer::failing_on(3));
    let publisher = Arc::new(FakePublisher::default());
    let outcome = pipeline(transformer.clone(), publisher.clone())
        .generate(BASE_IMAGE.to_vec(), "a fox", 5)
        .await
        .unwrap();

    assert_eq!(outcome.chain.len(), 3);
    assert!(outcome.is_partial());
    assert_eq!(outcome.requested, 5);
    assert_eq!(outcome.achieved(), 2);

    let failure = outcome.failure.clone().unwrap();
    assert_eq!(failure.stage, 3);
    assert!(matches!(
        failure.reason,
        StageFailureReason::Transform(TransformError::Status { status: 503, .. })
    ));

    // Later stages were never attempted.
    assert_eq!(transformer.calls().len(), 3);
    assert_eq!(publisher.asset_names().len(), 3);
    assert_linked(&outcome);

    assert_eq!(
        outcome.trace,
        vec![
            PipelineState::PublishingGenesis,
            PipelineState::Generating(1),
            PipelineState::Publishing(1),
            PipelineState::Generating(2),
            PipelineState::Publishing(2),
            PipelineState::Generating(3),
            PipelineState::DonePartial,
        ]
    );
}

#[tokio::test]
async fn first_transform_failure_leaves_genesis_only() {
    let outcome = pipeline(
        Arc::new(FakeTransformer::failing_on(1)),
        Arc::new(FakePublisher::default()),
    )
    .generate(BASE_IMAGE.to_vec(), "a fox", 5)
    .await
    .unwrap();

    assert_eq!(outcome.chain.len(), 1);
    assert_eq!(outcome.achieved(), 0);
    assert_eq!(outcome.failure.unwrap().stage, 1);
}

#[tokio::test]
async fn publish_failure_returns_partial_chain() {
    // Publish calls: 1 = genesis, 2 = stage 1, 3 = stage 2.
    let transformer = Arc::new(FakeTransformer::default());
    let publisher = Arc::new(FakePublisher::failing_on(3));
    let outcome = pipeline(transformer.clone(), publisher)
        .generate(BASE_IMAGE.to_vec(), "a fox", 4)
        .await
        .unwrap();

    assert_eq!(outcome.chain.len(), 2);
    let failure = outcome.failure.clone().unwrap();
    assert_eq!(failure.stage, 2);
    assert!(matches!(
        failure.reason,
        StageFailureReason::Publish(PublishError::Status { status: 429, .. })
    ));
    assert_eq!(transformer.calls().len(), 2);
    assert_eq!(
        outcome.trace.last(),
        Some(&PipelineState::DonePartial)
    );
    assert_eq!(
        outcome.trace[outcome.trace.len() - 2],
        PipelineState::Publishing(2)
    );
}

#[tokio::test]
async fn genesis_failure_is_fatal() {
    let transformer = Arc::new(FakeTransformer::default());
    let result = pipeline(transformer.clone(), Arc::new(FakePublisher::failing_on(1)))
        .generate(BASE_IMAGE.to_vec(), "a fox", 5)
        .await;

    match result {
        Err(PipelineError::Genesis(PublishError::Status { status, .. })) => assert_eq!(status, 429),
        other => panic!("Expected Genesis error, got: {:?}", other.map(|o| o.chain.len())),
    }
    assert!(transformer.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_backend_is_bounded_by_call_timeout() {
    let transformer = Arc::new(FakeTransformer::slow(Duration::from_secs(600)));
    let publisher = Arc::new(FakePublisher::default());
    let options = PipelineOptions {
        call_timeout: Some(Duration::from_secs(30)),
        ..PipelineOptions::default()
    };

    let outcome = EvolutionPipeline::new(transformer, publisher, options)
        .generate(BASE_IMAGE.to_vec(), "a fox", 3)
        .await
        .unwrap();

    assert_eq!(outcome.chain.len(), 1);
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.stage, 1);
    assert_eq!(
        failure.reason,
        StageFailureReason::Transform(TransformError::Timeout(Duration::from_secs(30)))
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_requests_build_independent_chains() {
    let publisher = Arc::new(FakePublisher::default());
    let shared = pipeline(Arc::new(FakeTransformer::default()), publisher.clone());

    let fox = tokio::spawn({
        let p = shared.clone();
        async move { p.generate(b"fox".to_vec(), "a fox", 3).await }
    });
    let owl = tokio::spawn({
        let p = shared.clone();
        async move { p.generate(b"owl".to_vec(), "an owl", 2).await }
    });

    let fox = fox.await.unwrap().unwrap();
    let owl = owl.await.unwrap().unwrap();

    assert_eq!(fox.chain.len(), 4);
    assert_eq!(owl.chain.len(), 3);
    assert_ne!(fox.chain.id, owl.chain.id);
    assert_linked(&fox);
    assert_linked(&owl);
    assert!(fox.chain.stages()[3].image.starts_with(b"fox"));
    assert!(owl.chain.stages()[2].image.starts_with(b"owl"));
    assert!(publisher
        .document(&owl.chain.stages()[1].metadata_ref)
        .description
        .starts_with("an owl"));
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn published_chain_verifies() {
    let publisher = Arc::new(FakePublisher::default());
    let outcome = pipeline(Arc::new(FakeTransformer::default()), publisher.clone())
        .generate(BASE_IMAGE.to_vec(), "a fox", 4)
        .await
        .unwrap();

    let report = verify_chain(publisher.as_ref(), &outcome.chain.metadata_refs())
        .await
        .unwrap();

    assert!(report.is_valid());
    assert_eq!(report.stages.len(), 5);
    assert_eq!(report.stages[4].name, "Evolving NFT - Stage 4");
}

#[tokio::test]
async fn tampered_link_fails_verification() {
    let publisher = Arc::new(FakePublisher::default());
    let outcome = pipeline(Arc::new(FakeTransformer::default()), publisher.clone())
        .generate(BASE_IMAGE.to_vec(), "a fox", 3)
        .await
        .unwrap();
    let refs = outcome.chain.metadata_refs();

    // Point stage 2 at genesis instead of stage 1.
    publisher.tamper(&refs[2], Some(refs[0].clone()));

    let report = verify_chain(publisher.as_ref(), &refs).await.unwrap();
    assert!(!report.is_valid());
    let bad: Vec<u32> = report.mismatches().map(|s| s.index).collect();
    assert_eq!(bad, vec![2]);
    assert!(matches!(report.stages[2].check, StageCheck::Mismatch(_)));
}

#[tokio::test]
async fn unresolvable_reference_aborts_verification() {
    let publisher = FakePublisher::default();
    let err = verify_chain(&publisher, &["https://ipfs.io/ipfs/QmMissing/metadata.json".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Verification(_)));
}
