// crates/chrysalis-cli/src/commands/evolve.rs
//
// `chrysalis evolve`: generate and publish an evolution chain.
//
// Exits with an error only when nothing could be published. A chain that
// stopped early is still printed, along with how many stages were realized.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use chrysalis_core::attributes::{TRAIT_EVOLUTION_PATH, TRAIT_POWER_LEVEL};
use chrysalis_core::{EvolutionStage, MintPayload};
use chrysalis_forge::HuggingFaceTransformer;
use chrysalis_pipeline::{EvolutionOutcome, EvolutionPipeline, PipelineState};
use chrysalis_store::IpfsPublisher;

use crate::config::{expand_tilde, ChrysalisConfig};
use crate::output::{abbreviate, format_json, format_table, OutputFormat};

/// Arguments for the evolve command.
#[derive(Debug, Args)]
pub struct EvolveCmd {
    /// Path to the base (genesis) image.
    #[arg(long)]
    image: String,

    /// Description the collectible evolves from.
    #[arg(long)]
    description: String,

    /// Evolved stages to generate (defaults to the configured count).
    #[arg(long)]
    stages: Option<u32>,

    /// Print machine-readable JSON instead of a table.
    #[arg(long)]
    json: bool,
}

/// A row in the stage table.
#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    index: u32,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Strength")]
    strength: String,
    #[tabled(rename = "Image SHA-256")]
    digest: String,
    #[tabled(rename = "Reference")]
    reference: String,
}

impl From<&EvolutionStage> for StageRow {
    fn from(stage: &EvolutionStage) -> Self {
        let trait_value = |name: &str| {
            stage
                .attributes
                .iter()
                .find(|a| a.trait_type == name)
                .map(|a| a.value.clone())
                .unwrap_or_else(|| "--".to_string())
        };

        Self {
            index: stage.index,
            path: if stage.index == 0 {
                "Genesis".to_string()
            } else {
                trait_value(TRAIT_EVOLUTION_PATH)
            },
            power: trait_value(TRAIT_POWER_LEVEL),
            strength: stage
                .strength
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "--".to_string()),
            digest: abbreviate(&stage.image_digest, 12),
            reference: stage.metadata_ref.clone(),
        }
    }
}

/// JSON shape of an evolve run.
#[derive(Serialize)]
struct EvolveReport<'a> {
    chain_id: String,
    requested: u32,
    achieved: u32,
    complete: bool,
    failed_stage: Option<u32>,
    failure: Option<String>,
    stages: &'a [EvolutionStage],
    mint: Option<MintPayload>,
    trace: &'a [PipelineState],
}

impl<'a> From<&'a EvolutionOutcome> for EvolveReport<'a> {
    fn from(outcome: &'a EvolutionOutcome) -> Self {
        Self {
            chain_id: outcome.chain.id.to_string(),
            requested: outcome.requested,
            achieved: outcome.achieved(),
            complete: outcome.is_complete(),
            failed_stage: outcome.failure.as_ref().map(|f| f.stage),
            failure: outcome.failure.as_ref().map(|f| f.reason.to_string()),
            stages: outcome.chain.stages(),
            mint: outcome.chain.mint_payload(),
            trace: &outcome.trace,
        }
    }
}

/// Run the evolve command.
pub async fn run(cmd: &EvolveCmd, config: &ChrysalisConfig) -> Result<(), Box<dyn std::error::Error>> {
    let image_path = expand_tilde(&cmd.image);
    let base_image = tokio::fs::read(&image_path)
        .await
        .map_err(|e| format!("Failed to read base image {}: {}", image_path, e))?;
    let stage_count = cmd.stages.unwrap_or(config.evolution.stages);

    let transformer = Arc::new(HuggingFaceTransformer::from_config(&config.transform));
    let publisher = Arc::new(IpfsPublisher::from_config(&config.storage));
    let pipeline = EvolutionPipeline::new(
        transformer,
        publisher,
        config.evolution.pipeline_options(),
    );

    tracing::info!(
        "Evolving {} ({} bytes) through {} stages",
        image_path,
        base_image.len(),
        stage_count
    );

    let outcome = pipeline
        .generate(base_image, &cmd.description, stage_count)
        .await?;

    match OutputFormat::from_json_flag(cmd.json) {
        OutputFormat::Json => println!("{}", format_json(&EvolveReport::from(&outcome))),
        OutputFormat::Table => print_table(&outcome),
    }

    Ok(())
}

fn print_table(outcome: &EvolutionOutcome) {
    let rows: Vec<StageRow> = outcome.chain.stages().iter().map(StageRow::from).collect();

    println!("Evolution chain {}", outcome.chain.id);
    println!("Description: {}", outcome.chain.base_description);
    println!();
    println!("{}", format_table(&rows));
    println!();

    match &outcome.failure {
        None => println!(
            "Evolution complete: realized {} of {} stages.",
            outcome.achieved(),
            outcome.requested
        ),
        Some(failure) => {
            println!(
                "Evolution incomplete: realized {} of {} stages.",
                outcome.achieved(),
                outcome.requested
            );
            println!("  Stopped at stage {}: {}", failure.stage, failure.reason);
        }
    }

    if let Some(mint) = outcome.chain.mint_payload() {
        println!();
        println!("Token URI: {}", mint.token_uri);
        println!("Evolution URIs: {}", mint.evolution_uris.len());
    }
}
