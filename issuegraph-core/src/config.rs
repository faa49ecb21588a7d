//! Persisted settings — the explicit load-on-start/save-on-change port
//! replacing ambient browser storage.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SettingsError;

/// Default completion-service model.
pub const DEFAULT_MODEL: &str = "o3-mini";

/// Credentials and preferences that persist across sessions.
///
/// The repository owner/name are deliberately absent: they travel with
/// each invocation (the original kept them in the navigable URL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Bearer token for the issue-tracker API.
    #[serde(default)]
    pub github_token: String,
    /// API key for the completion service.
    #[serde(default)]
    pub openai_api_key: String,
    /// Completion-service model identifier.
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_token: String::new(),
            openai_api_key: String::new(),
            model: default_model(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save settings to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
