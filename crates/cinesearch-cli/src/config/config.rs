//! `AppConfig` struct and TOML loading.

use std::path::Path;

use anyhow::{Context, Result, bail};
use cinesearch_api::tmdb::Credential;
use serde::{Deserialize, Serialize};

/// Environment variable holding a TMDB v3 API key.
pub const ENV_API_KEY: &str = "TMDB_API_KEY";

/// Environment variable holding a TMDB v4 read access token.
pub const ENV_API_TOKEN: &str = "TMDB_API_TOKEN";

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB API settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Poster image URLs.
    #[serde(default)]
    pub images: ImagesConfig,
    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Terminal UI settings.
    #[serde(default)]
    pub ui: UiConfig,
}

/// TMDB API configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TmdbConfig {
    /// v3 API key. `TMDB_API_KEY` takes precedence.
    pub api_key: Option<String>,
    /// v4 read access token. `TMDB_API_TOKEN` takes precedence.
    pub api_token: Option<String>,
    /// API base URL override (default: `https://api.themoviedb.org/3/`).
    pub base_url: Option<String>,
    /// Response language (e.g. `en-US`, `ar-SA`).
    pub language: Option<String>,
    /// Include adult titles in results.
    pub include_adult: bool,
}

/// Poster image configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImagesConfig {
    /// Prefix joined with a movie's `poster_path`.
    pub base_url: String,
    /// Image used when a movie has no poster.
    pub placeholder_url: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://image.tmdb.org/t/p/w500"),
            placeholder_url: String::from("https://via.placeholder.com/500x750?text=No+Image"),
        }
    }
}

/// Result cache configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a result stays fresh after it was fetched.
    pub stale_time_secs: u64,
    /// Seconds an unused entry is kept before it is dropped.
    pub gc_time_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: 300,
            gc_time_secs: 300,
        }
    }
}

/// UI language for labels and messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UiLanguage {
    /// English.
    #[default]
    En,
    /// Arabic.
    Ar,
}

/// Terminal UI configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    /// Label language.
    pub language: UiLanguage,
    /// Delay before a changed search string is sent. `0` sends every keystroke.
    pub debounce_ms: u64,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}

impl TmdbConfig {
    /// Resolves the TMDB credential.
    ///
    /// Order: `TMDB_API_KEY`, `TMDB_API_TOKEN`, `tmdb.api_key`, `tmdb.api_token`.
    /// `env` looks a variable up; empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if no credential is configured anywhere.
    pub fn credential(&self, env: impl Fn(&str) -> Option<String>) -> Result<Credential> {
        let non_empty = |v: &String| !v.is_empty();

        if let Some(key) = env(ENV_API_KEY).filter(non_empty) {
            return Ok(Credential::ApiKey(key));
        }
        if let Some(token) = env(ENV_API_TOKEN).filter(non_empty) {
            return Ok(Credential::BearerToken(token));
        }
        if let Some(key) = self.api_key.clone().filter(non_empty) {
            return Ok(Credential::ApiKey(key));
        }
        if let Some(token) = self.api_token.clone().filter(non_empty) {
            return Ok(Credential::BearerToken(token));
        }
        bail!(
            "TMDB credential is required: set {ENV_API_KEY} or {ENV_API_TOKEN}, \
             or tmdb.api_key in config.toml"
        )
    }
}
