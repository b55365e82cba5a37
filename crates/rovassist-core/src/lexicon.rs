//! Lexicon schema: the ordered router rules and the model alias table.
//!
//! Both are static configuration. The router rules use the JSON schema
//! `{ "rules": [ { "if": ["contains('token')"], "intent": "...", "entities"?, "topic"? } ] }`;
//! a default rule file is embedded in the binary and can be replaced at load time.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, RovError};
use crate::types::Intent;

const DEFAULT_ROUTER_JSON: &str = include_str!("../data/router.json");

/// One classification rule as written in the router file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Condition strings, e.g. `contains('manual')`. All must hold.
    #[serde(rename = "if")]
    pub conditions: Vec<String>,
    pub intent: Intent,
    /// Opaque pass-through data attached to the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Contents of a router file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterFile {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl RouterFile {
    /// Parse a router file from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: RouterFile = serde_json::from_str(content)?;
        if file.rules.is_empty() {
            return Err(RovError::Lexicon("router file contains no rules".to_string()));
        }
        Ok(file)
    }

    /// Load a router file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file = Self::from_json(&content)?;
        info!(rules = file.rules.len(), "Router rules loaded from {}", path.display());
        Ok(file)
    }

    /// The rule set shipped with the application.
    pub fn embedded() -> Result<Self> {
        Self::from_json(DEFAULT_ROUTER_JSON)
    }
}

/// Aliases that all resolve to one canonical model name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAliasConfig {
    pub canonical: String,
    pub aliases: Vec<String>,
}

impl ModelAliasConfig {
    pub fn new(canonical: &str, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// The fixed alias table for the supported fleet. Order is lookup order.
pub fn default_model_aliases() -> Vec<ModelAliasConfig> {
    vec![
        ModelAliasConfig::new("Titan 4", &["t4", "titan 4"]),
        ModelAliasConfig::new("RigMaster 2", &["rigmaster"]),
        ModelAliasConfig::new("Millennium Plus", &["millennium"]),
        ModelAliasConfig::new("Duplex Pump", &["duplex"]),
    ]
}
