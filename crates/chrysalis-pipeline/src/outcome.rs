// crates/chrysalis-pipeline/src/outcome.rs

use std::fmt;

use chrysalis_core::{EvolutionChain, PublishError, TransformError};

use crate::state::PipelineState;

/// Why an evolved stage could not be realized.
#[derive(Debug, Clone, PartialEq)]
pub enum StageFailureReason {
    Transform(TransformError),
    Publish(PublishError),
}

impl fmt::Display for StageFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFailureReason::Transform(e) => write!(f, "{}", e),
            StageFailureReason::Publish(e) => write!(f, "{}", e),
        }
    }
}

/// The stage at which a chain stopped growing.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: u32,
    pub reason: StageFailureReason,
}

/// Result of a generation request that produced at least the genesis stage.
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    pub chain: EvolutionChain,
    /// Evolved stages asked for, excluding genesis.
    pub requested: u32,
    /// Set when the chain stopped before `requested`.
    pub failure: Option<StageFailure>,
    /// Every state the request moved through, in order.
    pub trace: Vec<PipelineState>,
}

impl EvolutionOutcome {
    /// Evolved stages actually published, excluding genesis.
    pub fn achieved(&self) -> u32 {
        u32::try_from(self.chain.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.achieved() == self.requested
    }

    pub fn is_partial(&self) -> bool {
        !self.is_complete()
    }

    /// Final state of the request.
    pub fn final_state(&self) -> Option<PipelineState> {
        self.trace.last().copied()
    }
}
