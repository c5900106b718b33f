// crates/chrysalis-pipeline/src/state.rs
//
// State machine for a single evolution request.
//
// Valid transitions:
//   PublishingGenesis -> Generating(1) | Done (no stages requested) | FailedFatal
//   Generating(n)     -> Publishing(n) | DonePartial
//   Publishing(n)     -> Generating(n+1) | Done (n == requested) | DonePartial

use std::fmt;

use chrysalis_core::PipelineError;
use serde::{Deserialize, Serialize};

/// Lifecycle states of an evolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    /// Uploading the untouched base image and its metadata.
    PublishingGenesis,
    /// Waiting on the image backend for the given stage.
    Generating(u32),
    /// Uploading the given stage's image and metadata.
    Publishing(u32),
    /// Every requested stage was published.
    Done,
    /// Stopped early; the chain holds every stage published so far.
    DonePartial,
    /// Genesis could not be published; nothing usable exists.
    FailedFatal,
}

impl PipelineState {
    /// Whether the request has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::DonePartial | PipelineState::FailedFatal
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::PublishingGenesis => write!(f, "PublishingGenesis"),
            PipelineState::Generating(n) => write!(f, "Generating({})", n),
            PipelineState::Publishing(n) => write!(f, "Publishing({})", n),
            PipelineState::Done => write!(f, "Done"),
            PipelineState::DonePartial => write!(f, "DonePartial"),
            PipelineState::FailedFatal => write!(f, "FailedFatal"),
        }
    }
}

/// Validated state machine that remembers every state it passed through.
#[derive(Debug, Clone)]
pub struct PipelineStateMachine {
    current: PipelineState,
    requested: u32,
    history: Vec<PipelineState>,
}

impl PipelineStateMachine {
    /// Start a request for `requested` evolved stages.
    pub fn new(requested: u32) -> Self {
        Self {
            current: PipelineState::PublishingGenesis,
            requested,
            history: vec![PipelineState::PublishingGenesis],
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn into_history(self) -> Vec<PipelineState> {
        self.history
    }

    /// State that follows a successfully published stage `published`.
    pub fn after_published(&self, published: u32) -> PipelineState {
        if published >= self.requested {
            PipelineState::Done
        } else {
            PipelineState::Generating(published + 1)
        }
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns an error if the transition is not valid.
    pub fn transition(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        use PipelineState::*;

        let valid = match (self.current, next) {
            (PublishingGenesis, Generating(1)) => self.requested >= 1,
            (PublishingGenesis, Done) => self.requested == 0,
            (PublishingGenesis, FailedFatal) => true,
            (Generating(n), Publishing(m)) => n == m,
            (Generating(_), DonePartial) => true,
            (Publishing(n), Generating(m)) => m == n + 1 && m <= self.requested,
            (Publishing(n), Done) => n == self.requested,
            (Publishing(_), DonePartial) => true,
            _ => false,
        };

        if !valid {
            return Err(PipelineError::InvalidTransition(format!(
                "{} -> {}",
                self.current, next
            )));
        }

        tracing::debug!("Pipeline transition: {} -> {}", self.current, next);
        self.current = next;
        self.history.push(next);
        Ok(())
    }
}
