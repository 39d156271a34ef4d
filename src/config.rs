//! Configuration Management
//!
//! Handles persistent configuration storage for sentry-provider.

use anyhow::{Context, Result};
use sentry_provider::sentry::client::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Token variables, most specific first
const TOKEN_VARS: &[&str] = &["SENTRY_AUTH_TOKEN", "SENTRY_TOKEN"];
const BASE_URL_VAR: &str = "SENTRY_BASE_URL";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Sentry auth token
    #[serde(default)]
    pub token: Option<String>,
    /// API base, e.g. `https://sentry.example.com/api/`
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Effective settings after layering flags, environment and file
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub token: Option<String>,
    pub base_url: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sentry-provider").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("Saved config to {:?}", path);

        Ok(())
    }

    /// Effective settings (CLI > environment > config file > default)
    pub fn resolve(
        &self,
        cli_token: Option<String>,
        cli_base_url: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Settings {
        let non_empty = |v: String| (!v.trim().is_empty()).then_some(v);

        let token = cli_token
            .and_then(non_empty)
            .or_else(|| TOKEN_VARS.iter().find_map(|var| env(*var).and_then(non_empty)))
            .or_else(|| self.token.clone());

        let base_url = cli_base_url
            .and_then(non_empty)
            .or_else(|| env(BASE_URL_VAR).and_then(non_empty))
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Settings { token, base_url }
    }
}

impl From<&Settings> for Config {
    fn from(settings: &Settings) -> Self {
        Config {
            token: settings.token.clone(),
            base_url: Some(settings.base_url.clone()),
        }
    }
}
