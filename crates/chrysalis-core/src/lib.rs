// crates/chrysalis-core/src/lib.rs
//
// chrysalis-core: Core types, traits, and pure derivation logic for Chrysalis.
//
// This is the leaf crate that every other crate in the workspace depends on.
// It defines the evolution chain data model, error types, the backend traits
// the pipeline drives, and the deterministic attribute and prompt tables.

pub mod attributes;
pub mod credentials;
pub mod error;
pub mod lookup;
pub mod prompt;
pub mod stage;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use chrysalis_core::EvolutionChain;`

// Chain types
pub use stage::{
    Attribute, EvolutionChain, EvolutionStage, ImageAsset, MetadataRecord, MintPayload,
};

// Derivation
pub use attributes::{derive_attributes, genesis_attributes};
pub use prompt::{compose, ComposedPrompt};

// Credentials
pub use credentials::{ApiKeyProvider, EnvApiKey, SharedApiKey, StaticApiKey};

// Error types
pub use error::{PipelineError, PublishError, TransformError};

// Traits
pub use traits::{ContentPublisher, ImageTransformer, MetadataResolver};
