use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

/// Gateway configuration, constructed explicitly and passed into the
/// orchestrator. Nothing in the crate reads ambient/global state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EppConfig {
    /// Whether the EPP processor integration is enabled at all.
    pub enabled: bool,
    /// Default application code applied to sale requests that omit one.
    pub application_code: String,
    /// Hosted checkout URL the auto-submitting form posts to.
    pub checkout_url: String,
    /// When true, a store failure while recording an initiation aborts the
    /// payment instead of degrading to a logged warning.
    pub require_initiation_record: bool,
}

impl Default for EppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            application_code: String::new(),
            checkout_url: String::new(),
            require_initiation_record: false,
        }
    }
}

impl EppConfig {
    /// Loads configuration from a JSON file. Missing fields fall back to
    /// their defaults (disabled processor, empty codes).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
