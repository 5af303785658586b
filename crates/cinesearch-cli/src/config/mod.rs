//! Application configuration module.
//!
//! Manages the TOML config file holding the TMDB credential, image URLs,
//! cache freshness and UI settings.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, ImagesConfig, UiLanguage};
pub use paths::resolve_config_path;
