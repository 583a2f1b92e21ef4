//! Highlighting configuration persistence
//!
//! Stores user preferences in `~/.config/codeblock-highlight/config.yaml`

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Highlighting configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Theme used by blocks without a theme attribute (e.g. "vitesse-light")
    #[serde(default = "default_theme")]
    pub default_theme: String,
    /// Language used by blocks without a language attribute
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Class put on every code block container
    #[serde(default = "default_node_class")]
    pub node_class: String,
    /// Prefix for the `<code>` element class (`language-rust`)
    #[serde(default = "default_language_class_prefix")]
    pub language_class_prefix: String,
    /// How long a failed grammar/theme load is left alone before retrying
    #[serde(default = "default_retry_after_ms")]
    pub retry_after_ms: u64,
}

fn default_theme() -> String {
    "vitesse-light".to_string()
}

fn default_language() -> String {
    "text".to_string()
}

fn default_node_class() -> String {
    "code-block".to_string()
}

fn default_language_class_prefix() -> String {
    "language-".to_string()
}

/// Lower bound for `retry_after_ms`; smaller values would re-request a
/// failing resource as fast as its loads fail
pub const MIN_RETRY_AFTER_MS: u64 = 100;

fn default_retry_after_ms() -> u64 {
    30_000
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            default_theme: default_theme(),
            default_language: default_language(),
            node_class: default_node_class(),
            language_class_prefix: default_language_class_prefix(),
            retry_after_ms: default_retry_after_ms(),
        }
    }
}

impl HighlightConfig {
    /// Load config from the user config directory, or return defaults
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}", e);
                Self::default()
            }
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse config at {}: {}", path.display(), e))
    }

    /// Save config to the user config directory
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Failed-load backoff, never below [`MIN_RETRY_AFTER_MS`]
    pub fn retry_after(&self) -> Duration {
        Duration::from_millis(self.retry_after_ms.max(MIN_RETRY_AFTER_MS))
    }
}
