// crates/chrysalis-core/src/credentials.rs
//
// Credential providers injected into remote clients at construction.
// Keys are fetched at call time so rotated environment values are picked up.

use std::fmt;
use std::sync::Arc;

/// Supplies a bearer credential for a remote backend.
pub trait ApiKeyProvider: Send + Sync {
    /// Return the current key, or a human-readable reason it is unavailable.
    fn api_key(&self) -> Result<String, String>;
}

/// A key fixed at construction.
#[derive(Clone)]
pub struct StaticApiKey(String);

impl StaticApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Debug for StaticApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticApiKey(<redacted>)")
    }
}

impl ApiKeyProvider for StaticApiKey {
    fn api_key(&self) -> Result<String, String> {
        if self.0.is_empty() {
            return Err("static API key is empty".to_string());
        }
        Ok(self.0.clone())
    }
}

/// A key read from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvApiKey {
    pub var: String,
}

impl EnvApiKey {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl ApiKeyProvider for EnvApiKey {
    fn api_key(&self) -> Result<String, String> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Ok(_) => Err(format!("environment variable {} is empty", self.var)),
            Err(_) => Err(format!("environment variable {} is not set", self.var)),
        }
    }
}

/// Shared handle used by client configs.
pub type SharedApiKey = Arc<dyn ApiKeyProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_key_round_trips() {
        let key = StaticApiKey::new("hf_secret");
        assert_eq!(key.api_key().unwrap(), "hf_secret");
        assert!(!format!("{:?}", key).contains("hf_secret"));
    }

    #[test]
    fn empty_static_key_is_rejected() {
        assert!(StaticApiKey::new("").api_key().is_err());
    }

    #[test]
    fn missing_env_key_reports_variable_name() {
        let provider = EnvApiKey::new("CHRYSALIS_TEST_KEY_THAT_IS_NEVER_SET");
        let err = provider.api_key().unwrap_err();
        assert!(err.contains("CHRYSALIS_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
