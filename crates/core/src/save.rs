//! Named plan persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Composition, PlannerConfig};

/// Metadata describing a persisted plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Absolute path to the plan file on disk.
    pub path: PathBuf,
    /// Human readable plan name.
    pub name: String,
    /// Timestamp when the plan was written.
    pub saved_at: DateTime<Utc>,
}

/// Serialized representation of a plan file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPayload {
    name: String,
    saved_at: DateTime<Utc>,
    composition: Composition,
    config: PlannerConfig,
}

impl PlanPayload {
    /// Consume the payload and return the stored plan state.
    pub fn into_parts(self) -> (Composition, PlannerConfig) {
        (self.composition, self.config)
    }

    /// Plan name as entered by the user.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Manager responsible for loading and writing plan files.
pub struct PlanManager {
    root: PathBuf,
}

impl PlanManager {
    /// Create a new manager rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Return all known plans sorted by timestamp (most recent first).
    pub fn entries(&self) -> Result<Vec<PlanEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).context("failed to read plans directory")? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match self.read_payload(entry.path()) {
                Ok(payload) => entries.push(PlanEntry {
                    path: entry.path(),
                    name: payload.name,
                    saved_at: payload.saved_at,
                }),
                Err(err) => {
                    warn!("Failed to read plan {:?}: {err}", entry.path());
                }
            }
        }

        entries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(entries)
    }

    /// Write the current plan to disk and return the resulting entry.
    pub fn create(
        &self,
        name: &str,
        composition: &Composition,
        config: &PlannerConfig,
    ) -> Result<PlanEntry> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        let saved_at = Utc::now();
        let display_name = name.trim();
        let display_name = if display_name.is_empty() {
            "Untitled plan"
        } else {
            display_name
        };
        let payload = PlanPayload {
            name: display_name.to_string(),
            saved_at,
            composition: composition.clone(),
            config: config.clone(),
        };

        let file_name = format!(
            "{}_{}.json",
            sanitize_component(&payload.name),
            saved_at.format("%Y%m%d%H%M%S")
        );
        let path = self.root.join(file_name);
        self.write_payload(&path, &payload)?;

        Ok(PlanEntry {
            path,
            name: payload.name,
            saved_at,
        })
    }

    /// Load the payload for the provided entry.
    pub fn load(&self, entry: &PlanEntry) -> Result<PlanPayload> {
        self.read_payload(&entry.path)
    }

    /// Remove a plan file from disk.
    pub fn delete(&self, entry: &PlanEntry) -> Result<()> {
        fs::remove_file(&entry.path)
            .with_context(|| format!("failed to delete {}", entry.path.display()))
    }

    /// Load the most recent plan entry, if any.
    pub fn latest(&self) -> Result<Option<PlanEntry>> {
        let entries = self.entries()?;
        Ok(entries.into_iter().next())
    }

    fn write_payload(&self, path: &Path, payload: &PlanPayload) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(payload)?;
        fs::write(path, serialized).with_context(|| format!("failed to write {}", path.display()))
    }

    fn read_payload(&self, path: impl AsRef<Path>) -> Result<PlanPayload> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let payload = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(payload)
    }
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "plan".to_string()
    } else {
        result
    }
}
