// crates/chrysalis-forge/src/lib.rs
//
// chrysalis-forge: Remote image-to-image generation for Chrysalis.
//
// Wraps a hosted diffusion model behind the `ImageTransformer` trait so the
// pipeline can evolve each stage's image from its predecessor.

pub mod config;
pub mod img2img;

pub use config::TransformConfig;
pub use img2img::HuggingFaceTransformer;
