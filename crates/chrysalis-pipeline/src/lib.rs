// crates/chrysalis-pipeline/src/lib.rs
//
// chrysalis-pipeline: Staged evolution orchestration for Chrysalis.
//
// Drives genesis publication and the sequential generate/publish loop as an
// explicit state machine, reports complete or partial outcomes, and verifies
// published chains by resolving them back from storage.

pub mod outcome;
pub mod pipeline;
pub mod state;
pub mod verify;

pub use outcome::{EvolutionOutcome, StageFailure, StageFailureReason};
pub use pipeline::{EvolutionPipeline, PipelineOptions};
pub use state::{PipelineState, PipelineStateMachine};
pub use verify::{verify_chain, ChainReport, StageCheck, StageVerification};
