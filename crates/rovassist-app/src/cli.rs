//! CLI argument definitions for the rovassist front-end.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::Parser;

use rovassist_core::config::RovConfig;
use rovassist_core::types::Lang;

/// rovassist: ask for ROV equipment manuals and technical facts by text or voice.
#[derive(Parser, Debug)]
#[command(name = "rovassist", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Starting language (en, pt).
    #[arg(long = "lang")]
    pub lang: Option<Lang>,

    /// Base URL of the search/answer/translate services.
    #[arg(short = 's', long = "services-url")]
    pub services_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Use built-in sample data instead of the remote services.
    #[arg(long = "offline")]
    pub offline: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ROVASSIST_CONFIG env var > ~/.rovassist/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ROVASSIST_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --services-url flag > ROVASSIST_SERVICES_URL env var > config file value.
    pub fn resolve_services_url(&self, config: &RovConfig) -> String {
        if let Some(ref url) = self.services_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("ROVASSIST_SERVICES_URL") {
            if !url.trim().is_empty() {
                return url;
            }
        }
        config.services.base_url.clone()
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config: &RovConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }

    /// Priority: --lang flag > config file value.
    pub fn resolve_language(&self, config: &RovConfig) -> Lang {
        self.lang.unwrap_or(config.dialog.default_language)
    }

    /// Apply the overrides that live in the configuration itself.
    pub fn apply(&self, config: &mut RovConfig) {
        config.services.base_url = self.resolve_services_url(config);
        config.general.log_level = self.resolve_log_level(config);
        config.dialog.default_language = self.resolve_language(config);
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".rovassist").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".rovassist").join("config.toml");
    }
    PathBuf::from("config.toml")
}
