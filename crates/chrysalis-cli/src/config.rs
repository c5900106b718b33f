// crates/chrysalis-cli/src/config.rs
//
// Runtime configuration for the Chrysalis CLI.
// Loaded from a TOML file or populated with sensible defaults. Credentials
// never live in the file; each backend names the environment variable that
// holds its token.

use serde::Deserialize;
use std::fs;
use std::time::Duration;

use chrysalis_forge::TransformConfig;
use chrysalis_pipeline::PipelineOptions;
use chrysalis_store::StorageConfig;

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ChrysalisConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub evolution: EvolutionConfig,
}

/// Settings for the evolution run itself.
#[derive(Debug, Clone, Deserialize)]
pub struct EvolutionConfig {
    /// Evolved stages generated when `--stages` is not given.
    #[serde(default = "default_stages")]
    pub stages: u32,

    /// Prefix of every stage's metadata name.
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Optional bound on each remote call, in seconds.
    #[serde(default)]
    pub call_timeout_secs: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stages() -> u32 {
    5
}

fn default_collection_name() -> String {
    "Evolving NFT".to_string()
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            stages: default_stages(),
            collection_name: default_collection_name(),
            call_timeout_secs: None,
        }
    }
}

impl Default for ChrysalisConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            transform: TransformConfig::default(),
            storage: StorageConfig::default(),
            evolution: EvolutionConfig::default(),
        }
    }
}

impl EvolutionConfig {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            collection_name: self.collection_name.clone(),
            call_timeout: self.call_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl ChrysalisConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: ChrysalisConfig = toml::from_str(contents)?;
        Ok(config)
    }
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
