//! User preferences persisted across sessions.
//!
//! Session-lifecycle state (the support-notice snooze, last selections)
//! lives in an explicit file-backed store that gets injected into the
//! frontend, rather than in ambient globals.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// File name under the app config directory.
pub const PREFS_FILE: &str = "armytui/prefs.json";

/// How long a dismissed support notice stays hidden.
const NOTICE_SNOOZE_DAYS: i64 = 30;

/// Persisted preference record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// When the support notice was last dismissed, if ever.
    #[serde(default)]
    pub notice_dismissed_at: Option<DateTime<Utc>>,
    /// Civilization selected when the app last exited.
    #[serde(default)]
    pub last_civilization: Option<String>,
    /// Age tag selected when the app last exited.
    #[serde(default)]
    pub last_age: Option<String>,
}

impl Preferences {
    /// Whether the support notice should currently be shown.
    pub fn should_show_support_notice(&self, now: DateTime<Utc>) -> bool {
        match self.notice_dismissed_at {
            Some(dismissed) => now - dismissed >= Duration::days(NOTICE_SNOOZE_DAYS),
            None => true,
        }
    }

    /// Snooze the support notice as of `now`.
    pub fn dismiss_support_notice(&mut self, now: DateTime<Utc>) {
        self.notice_dismissed_at = Some(now);
    }
}

/// File-backed preference store.
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    /// Create a store over the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(PREFS_FILE)
    }

    /// Path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences, falling back to defaults when the file is absent.
    pub fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    /// Persist preferences, creating parent directories if needed.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialized =
            serde_json::to_string_pretty(prefs).context("failed to serialize preferences")?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let store = PrefsStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load()?, Preferences::default());
        Ok(())
    }

    #[test]
    fn save_and_reload() -> Result<()> {
        let dir = tempdir()?;
        let store = PrefsStore::new(dir.path().join("nested/prefs.json"));

        let mut prefs = Preferences::default();
        prefs.last_civilization = Some("britons".to_string());
        prefs.dismiss_support_notice(Utc::now());
        store.save(&prefs)?;

        assert_eq!(store.load()?, prefs);
        Ok(())
    }

    #[test]
    fn notice_snooze_expires() {
        let now = Utc::now();
        let mut prefs = Preferences::default();
        assert!(prefs.should_show_support_notice(now));

        prefs.dismiss_support_notice(now);
        assert!(!prefs.should_show_support_notice(now + Duration::days(1)));
        assert!(prefs.should_show_support_notice(now + Duration::days(NOTICE_SNOOZE_DAYS)));
    }
}
