// crates/chrysalis-store/src/lib.rs
//
// chrysalis-store: Content-addressed storage for Chrysalis evolution stages.
//
// Provides a Kubo/IPFS HTTP API client and an IPFS-backed publisher that
// stores each stage's image and metadata document and resolves published
// references back into metadata records.

pub mod config;
pub mod ipfs;
pub mod publisher;

// Re-export key types for ergonomic access from downstream crates.
pub use config::StorageConfig;
pub use ipfs::IpfsClient;
pub use publisher::IpfsPublisher;
