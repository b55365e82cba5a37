use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, RovError};
use crate::lexicon::{default_model_aliases, ModelAliasConfig, RouterFile};
use crate::types::Lang;

/// Top-level configuration for the rovassist application.
///
/// Loaded from `~/.rovassist/config.toml` by default. Every section has
/// defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RovConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dialog: DialogConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl RovConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RovConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the dialog engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.dialog.default_model.trim().is_empty() {
            return Err(RovError::Config(
                "dialog.default_model must not be empty".to_string(),
            ));
        }
        if self.dialog.max_utterance_chars == 0 {
            return Err(RovError::Config(
                "dialog.max_utterance_chars must be greater than 0".to_string(),
            ));
        }
        if self.lexicon.models.is_empty() {
            return Err(RovError::Config(
                "lexicon.models must contain at least one model".to_string(),
            ));
        }
        for entry in &self.lexicon.models {
            if entry.aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(RovError::Config(format!(
                    "model '{}' has an empty alias",
                    entry.canonical
                )));
            }
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Dialog engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Language new sessions start in.
    pub default_language: Lang,
    /// Model used for specific-info lookups when none is named.
    pub default_model: String,
    /// Unit kinds the answer service is asked to recognize.
    pub unit_kinds: Vec<String>,
    /// Longest accepted utterance, in characters.
    pub max_utterance_chars: usize,
    /// Minutes of inactivity after which a session expires.
    pub session_timeout_minutes: u32,
    /// Turns kept in each session's history.
    pub history_turns: usize,
    /// Citations shown per answer.
    pub citation_limit: usize,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            default_language: Lang::En,
            default_model: "Titan 4".to_string(),
            unit_kinds: ["Nm", "ft-lb", "psi", "bar", "L/min", "gpm", "km/h", "knot", "m", "ft"]
                .iter()
                .map(|u| u.to_string())
                .collect(),
            max_utterance_chars: 2000,
            session_timeout_minutes: 30,
            history_turns: 10,
            citation_limit: 6,
        }
    }
}

/// Router rules and model alias table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Optional router file replacing the embedded rule set.
    pub router_path: Option<PathBuf>,
    /// Ordered alias table; first match wins.
    pub models: Vec<ModelAliasConfig>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            router_path: None,
            models: default_model_aliases(),
        }
    }
}

impl LexiconConfig {
    /// Load the configured router file, or the embedded one.
    pub fn load_rules(&self) -> Result<RouterFile> {
        match self.router_path {
            Some(ref path) => RouterFile::load(path),
            None => RouterFile::embedded(),
        }
    }
}

/// Retrieval and translation service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Base URL exposing `/search`, `/answer` and `/translate`.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 15_000,
        }
    }
}

/// Speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Speak each outcome message after a turn.
    pub speak_responses: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            speak_responses: true,
        }
    }
}
