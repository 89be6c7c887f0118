//! Unit catalog: an embedded dataset plus optional user override files.
//!
//! The embedded catalog ships with the binary. When a data directory is
//! configured, every `*.json` file in it (read in name order) may add
//! civilizations and add or replace units by id. Files that fail to parse
//! are logged and skipped so one bad override cannot take the app down.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{info, warn};

use crate::events::{CatalogEvent, EventHub, EventSubscription};
use crate::models::{Age, UnitInfo};

const EMBEDDED_CATALOG: &str = include_str!("../../data/catalog.json");

/// Raw shape of a catalog data file.
#[derive(Debug, Clone, Deserialize)]
struct CatalogData {
    #[serde(default)]
    civilizations: Vec<String>,
    #[serde(default)]
    units: Vec<UnitInfo>,
}

static EMBEDDED: Lazy<CatalogData> =
    Lazy::new(|| serde_json::from_str(EMBEDDED_CATALOG).expect("embedded catalog is valid JSON"));

/// Thread-safe catalog with reload support.
pub struct CatalogLoader {
    inner: Arc<RwLock<Inner>>,
    events: EventHub<CatalogEvent>,
}

struct Inner {
    data_dir: Option<PathBuf>,
    civilizations: Vec<String>,
    units: Vec<UnitInfo>,
}

impl CatalogLoader {
    /// Build a loader, merging override files from `data_dir` when given.
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let (civilizations, units) = build_catalog(data_dir.as_deref());
        Self {
            inner: Arc::new(RwLock::new(Inner {
                data_dir,
                civilizations,
                units,
            })),
            events: EventHub::default(),
        }
    }

    /// All units, catalog order (embedded first, then user additions).
    pub fn units(&self) -> Vec<UnitInfo> {
        self.inner.read().units.clone()
    }

    /// Units available at or before `age`.
    pub fn units_in_age(&self, age: Age) -> Vec<UnitInfo> {
        self.inner
            .read()
            .units
            .iter()
            .filter(|unit| unit.age <= age)
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over unit ids and names.
    pub fn units_matching(&self, query: &str) -> Vec<UnitInfo> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.units();
        }
        self.inner
            .read()
            .units
            .iter()
            .filter(|unit| {
                unit.id.to_lowercase().contains(&needle)
                    || unit.name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Look up a single unit by id.
    pub fn unit(&self, unit_id: &str) -> Option<UnitInfo> {
        self.inner
            .read()
            .units
            .iter()
            .find(|unit| unit.id == unit_id)
            .cloned()
    }

    /// Known civilization ids.
    pub fn civilizations(&self) -> Vec<String> {
        self.inner.read().civilizations.clone()
    }

    /// Re-read override files and notify subscribers.
    pub fn refresh(&self) {
        let mut inner = self.inner.write();
        let (civilizations, units) = build_catalog(inner.data_dir.as_deref());
        inner.civilizations = civilizations;
        inner.units = units;
        let total = inner.units.len();
        drop(inner);
        info!(total, "catalog reloaded");
        self.events.emit(CatalogEvent::Reloaded);
    }

    /// Subscribe to reload notifications.
    pub fn subscribe(&self) -> EventSubscription<CatalogEvent> {
        self.events.subscribe()
    }
}

fn build_catalog(data_dir: Option<&Path>) -> (Vec<String>, Vec<UnitInfo>) {
    let mut civilizations = EMBEDDED.civilizations.clone();
    let mut units = EMBEDDED.units.clone();

    if let Some(dir) = data_dir {
        match override_files(dir) {
            Ok(files) => {
                for path in files {
                    match read_data_file(&path) {
                        Ok(data) => merge(&mut civilizations, &mut units, data),
                        Err(err) => warn!("Skipping catalog file {}: {err:#}", path.display()),
                    }
                }
            }
            Err(err) => warn!("Failed to scan catalog directory {}: {err:#}", dir.display()),
        }
    }

    (civilizations, units)
}

fn override_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    files.sort();
    Ok(files)
}

fn read_data_file(path: &Path) -> Result<CatalogData> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn merge(civilizations: &mut Vec<String>, units: &mut Vec<UnitInfo>, data: CatalogData) {
    for civ in data.civilizations {
        if !civilizations.contains(&civ) {
            civilizations.push(civ);
        }
    }
    for unit in data.units {
        match units.iter_mut().find(|existing| existing.id == unit.id) {
            Some(existing) => *existing = unit,
            None => units.push(unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn embedded_catalog_loads() {
        let catalog = CatalogLoader::new(None);
        assert!(!catalog.units().is_empty());
        assert!(!catalog.civilizations().is_empty());
        assert!(catalog.unit("knight").is_some());
        assert!(catalog.unit("chocobo").is_none());
    }

    #[test]
    fn age_filter_is_cumulative() {
        let catalog = CatalogLoader::new(None);
        let feudal = catalog.units_in_age(Age::Feudal);
        assert!(feudal.iter().any(|unit| unit.id == "militia"));
        assert!(feudal.iter().any(|unit| unit.id == "archer"));
        assert!(feudal.iter().all(|unit| unit.age <= Age::Feudal));
    }

    #[test]
    fn matching_searches_ids_and_names() {
        let catalog = CatalogLoader::new(None);
        let hits = catalog.units_matching("swords");
        assert!(hits.iter().any(|unit| unit.id == "long_swordsman"));
        assert!(catalog.units_matching("").len() == catalog.units().len());
    }

    #[test]
    fn override_files_replace_and_extend() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("custom.json"),
            r#"{
              "civilizations": ["atlanteans"],
              "units": [
                { "id": "knight", "name": "Knight", "age": "castle", "cost": { "food": 50, "gold": 50 } },
                { "id": "war_hound", "name": "War Hound", "age": "dark", "cost": { "food": 30 } }
              ]
            }"#,
        )?;
        // A broken file must be skipped, not fatal.
        fs::write(dir.path().join("broken.json"), "{ nope")?;

        let catalog = CatalogLoader::new(Some(dir.path().to_path_buf()));
        let knight = catalog.unit("knight").unwrap();
        assert_eq!(knight.cost.food, 50);
        assert!(catalog.unit("war_hound").is_some());
        assert!(catalog.civilizations().contains(&"atlanteans".to_string()));
        Ok(())
    }

    #[test]
    fn refresh_notifies_subscribers() -> Result<()> {
        let dir = tempdir()?;
        let catalog = CatalogLoader::new(Some(dir.path().to_path_buf()));
        let mut subscription = catalog.subscribe();

        fs::write(
            dir.path().join("extra.json"),
            r#"{ "units": [ { "id": "slinger", "name": "Slinger", "age": "feudal", "cost": { "food": 30, "gold": 40 } } ] }"#,
        )?;
        catalog.refresh();

        assert_eq!(subscription.try_next(), Some(CatalogEvent::Reloaded));
        assert!(catalog.unit("slinger").is_some());
        Ok(())
    }
}
