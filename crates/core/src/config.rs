//! Application configuration handling.
//!
//! Settings come from a TOML file under the user's config directory,
//! overridable through `ARMYTUI_*` environment variables. A commented
//! default file is written on first run so users can discover the knobs.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = r#"# armytui configuration
#
# Directory with extra unit-catalog JSON files. Files there may add
# civilizations and add or replace units by id.
# data_dir = "/home/user/.local/share/armytui/data"
#
# Where named plans are stored.
# saves_dir = "/home/user/.config/armytui/plans"
#
# Base address generated share links are appended to.
# share_base_url = "https://armytui.app/planner"
"#;

/// Runtime configuration for the planner.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Optional directory with extra unit-catalog files.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Where named plans are written.
    #[serde(default = "default_saves_dir")]
    pub saves_dir: PathBuf,
    /// Base address share links are appended to.
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            saves_dir: default_saves_dir(),
            share_base_url: default_share_base_url(),
        }
    }
}

fn default_saves_dir() -> PathBuf {
    config_root().join("plans")
}

fn default_share_base_url() -> String {
    "https://armytui.app/planner".to_string()
}

fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("armytui")
}

/// Path to the user configuration file.
pub fn config_file_path() -> PathBuf {
    config_root().join("config.toml")
}

/// Write the commented default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_file_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))
}

impl AppConfig {
    /// Load configuration from the default file location plus environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_file_path())
    }

    /// Load configuration from an explicit file path plus environment.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_path()).required(false))
            .add_source(config::Environment::with_prefix("ARMYTUI"))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        settings
            .try_deserialize()
            .context("invalid configuration values")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("config.toml"))?;
        assert_eq!(config.share_base_url, default_share_base_url());
        assert!(config.data_dir.is_none());
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
share_base_url = "https://example.org/army"
data_dir = "/srv/armytui/data"
"#,
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.share_base_url, "https://example.org/army");
        assert_eq!(config.data_dir.as_deref(), Some(std::path::Path::new("/srv/armytui/data")));
        Ok(())
    }

    #[test]
    fn default_template_loads_as_empty_config() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, DEFAULT_CONFIG)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.saves_dir, default_saves_dir());
        Ok(())
    }
}
