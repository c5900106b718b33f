// crates/chrysalis-pipeline/src/verify.rs
//
// Independent verification of a published chain: fetch every metadata
// document back by reference and check stage numbering and back-links.

use chrysalis_core::attributes::TRAIT_EVOLUTION_STAGE;
use chrysalis_core::stage::IMAGE_PLACEHOLDER;
use chrysalis_core::{MetadataRecord, MetadataResolver, PipelineError};

/// Result of checking one published stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageCheck {
    Verified,
    Mismatch(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageVerification {
    pub index: u32,
    pub reference: String,
    pub name: String,
    pub check: StageCheck,
}

/// Per-stage verification results, in chain order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    pub stages: Vec<StageVerification>,
}

impl ChainReport {
    /// True when every stage verified and the chain is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.stages.is_empty() && self.stages.iter().all(|s| s.check == StageCheck::Verified)
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &StageVerification> {
        self.stages.iter().filter(|s| s.check != StageCheck::Verified)
    }
}

/// Resolve every reference and check it against its position in `references`.
///
/// A reference that cannot be fetched aborts verification; content that does
/// not match is reported per stage.
pub async fn verify_chain(
    resolver: &dyn MetadataResolver,
    references: &[String],
) -> Result<ChainReport, PipelineError> {
    let mut report = ChainReport::default();

    for (position, reference) in references.iter().enumerate() {
        let index = u32::try_from(position)
            .map_err(|_| PipelineError::Verification("chain too long".to_string()))?;
        let previous = position.checked_sub(1).map(|p| references[p].as_str());

        let record = resolver.resolve(reference).await.map_err(|e| {
            PipelineError::Verification(format!("stage {} ({}): {}", index, reference, e))
        })?;

        let check = check_record(&record, index, previous);
        if let StageCheck::Mismatch(reason) = &check {
            tracing::warn!("Stage {} failed verification: {}", index, reason);
        }

        report.stages.push(StageVerification {
            index,
            reference: reference.clone(),
            name: record.name,
            check,
        });
    }

    Ok(report)
}

fn check_record(record: &MetadataRecord, index: u32, previous: Option<&str>) -> StageCheck {
    let expected_stage = index.to_string();
    match record.attribute(TRAIT_EVOLUTION_STAGE) {
        Some(stage) if stage == expected_stage => {}
        other => {
            return StageCheck::Mismatch(format!(
                "expected Evolution Stage {} but found {:?}",
                index, other
            ))
        }
    }

    if record.previous_stage.as_deref() != previous {
        return StageCheck::Mismatch(format!(
            "expected previous_stage {:?} but found {:?}",
            previous, record.previous_stage
        ));
    }

    if record.image.is_empty() || record.image == IMAGE_PLACEHOLDER {
        return StageCheck::Mismatch("image was never linked".to_string());
    }

    StageCheck::Verified
}
