//! Shared domain models for army planning.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The four stockpiled resources units are paid with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Resource {
    Food,
    Wood,
    Gold,
    Stone,
}

impl Resource {
    /// All resource kinds in display order.
    pub const ALL: [Resource; 4] = [Resource::Food, Resource::Wood, Resource::Gold, Resource::Stone];

    /// Lowercase tag used in wire formats and data files.
    pub fn tag(self) -> &'static str {
        match self {
            Resource::Food => "food",
            Resource::Wood => "wood",
            Resource::Gold => "gold",
            Resource::Stone => "stone",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Per-resource quantities, used both for unit costs and aggregate spend.
///
/// Data files may omit resources a unit does not cost anything of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCost {
    /// Food amount.
    #[serde(default)]
    pub food: u32,
    /// Wood amount.
    #[serde(default)]
    pub wood: u32,
    /// Gold amount.
    #[serde(default)]
    pub gold: u32,
    /// Stone amount.
    #[serde(default)]
    pub stone: u32,
}

impl ResourceCost {
    /// Amount of a single resource kind.
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Food => self.food,
            Resource::Wood => self.wood,
            Resource::Gold => self.gold,
            Resource::Stone => self.stone,
        }
    }

    /// Saturating component-wise addition.
    pub fn add(&self, other: &ResourceCost) -> ResourceCost {
        ResourceCost {
            food: self.food.saturating_add(other.food),
            wood: self.wood.saturating_add(other.wood),
            gold: self.gold.saturating_add(other.gold),
            stone: self.stone.saturating_add(other.stone),
        }
    }

    /// Cost of `quantity` copies, saturating on overflow.
    pub fn scale(&self, quantity: u32) -> ResourceCost {
        ResourceCost {
            food: self.food.saturating_mul(quantity),
            wood: self.wood.saturating_mul(quantity),
            gold: self.gold.saturating_mul(quantity),
            stone: self.stone.saturating_mul(quantity),
        }
    }

    /// Sum over all four resources.
    pub fn total(&self) -> u64 {
        u64::from(self.food) + u64::from(self.wood) + u64::from(self.gold) + u64::from(self.stone)
    }
}

/// Per-resource spending caps used in [`LimitMode::Individual`].
///
/// Unlike [`ResourceCost`], every field is always serialized so the share
/// wire record carries all four keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Food cap.
    #[serde(default)]
    pub food: u32,
    /// Wood cap.
    #[serde(default)]
    pub wood: u32,
    /// Gold cap.
    #[serde(default)]
    pub gold: u32,
    /// Stone cap.
    #[serde(default)]
    pub stone: u32,
}

impl ResourceLimits {
    /// Cap for a single resource kind. Zero means uncapped.
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Food => self.food,
            Resource::Wood => self.wood,
            Resource::Gold => self.gold,
            Resource::Stone => self.stone,
        }
    }
}

/// Game ages, ordered from earliest to latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Age {
    Dark,
    Feudal,
    Castle,
    Imperial,
}

impl Age {
    /// All ages in chronological order.
    pub const ALL: [Age; 4] = [Age::Dark, Age::Feudal, Age::Castle, Age::Imperial];

    /// Lowercase tag used in wire formats and data files.
    pub fn tag(self) -> &'static str {
        match self {
            Age::Dark => "dark",
            Age::Feudal => "feudal",
            Age::Castle => "castle",
            Age::Imperial => "imperial",
        }
    }

    /// Parse a tag, returning `None` for anything unrecognized.
    ///
    /// Configuration carries the age as an uninterpreted string so unknown
    /// tags survive a share round-trip; callers that need semantics go
    /// through here and pick their own fallback.
    pub fn from_tag(tag: &str) -> Option<Age> {
        match tag {
            "dark" => Some(Age::Dark),
            "feudal" => Some(Age::Feudal),
            "castle" => Some(Age::Castle),
            "imperial" => Some(Age::Imperial),
            _ => None,
        }
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How resource limits constrain a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitMode {
    /// Each resource is capped separately via [`ResourceLimits`].
    Individual,
    /// Only the aggregate spend across all resources is capped.
    Total,
}

impl fmt::Display for LimitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitMode::Individual => f.write_str("individual"),
            LimitMode::Total => f.write_str("total"),
        }
    }
}

/// A unit as described by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    /// Stable identifier (e.g. `knight`).
    pub id: String,
    /// Human readable name.
    pub name: String,
    /// Earliest age the unit is available in.
    pub age: Age,
    /// Training cost.
    pub cost: ResourceCost,
    /// Population slots occupied per unit.
    #[serde(default = "default_population")]
    pub population: u32,
}

fn default_population() -> u32 {
    1
}

/// Requested quantities keyed by unit id.
///
/// Backed by a `BTreeMap` so iteration (and therefore share-token output)
/// is deterministic. Quantities are strictly positive; setting zero removes
/// the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Composition {
    units: BTreeMap<String, u32>,
}

impl Composition {
    /// Empty composition.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no units are requested.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of distinct unit ids.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Requested quantity for a unit, zero when absent.
    pub fn quantity(&self, unit_id: &str) -> u32 {
        self.units.get(unit_id).copied().unwrap_or(0)
    }

    /// Set the quantity for a unit. Zero removes the entry.
    pub fn set(&mut self, unit_id: &str, quantity: u32) {
        if quantity == 0 {
            self.units.remove(unit_id);
        } else {
            self.units.insert(unit_id.to_string(), quantity);
        }
    }

    /// Adjust a quantity by a signed delta, clamping at zero.
    pub fn adjust(&mut self, unit_id: &str, delta: i64) {
        let current = i64::from(self.quantity(unit_id));
        let next = current.saturating_add(delta).clamp(0, i64::from(u32::MAX));
        self.set(unit_id, next as u32);
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.units.clear();
    }

    /// Iterate over `(unit id, quantity)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.units.iter().map(|(id, qty)| (id.as_str(), *qty))
    }
}

impl FromIterator<(String, u32)> for Composition {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        let mut composition = Composition::new();
        for (id, qty) in iter {
            composition.set(&id, qty);
        }
        composition
    }
}

/// Planning constraints captured by the share codec.
///
/// `age` and `civilization` are uninterpreted tags: values the current
/// catalog does not know still round-trip through a share token verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Active limit mode.
    pub mode: LimitMode,
    /// Per-resource caps, consulted in [`LimitMode::Individual`].
    pub limits: ResourceLimits,
    /// Aggregate cap, consulted in [`LimitMode::Total`]. Zero means uncapped.
    pub total_limit: u32,
    /// Population cap. Zero means uncapped.
    pub population_cap: u32,
    /// Selected age tag.
    pub age: String,
    /// Selected civilization id.
    pub civilization: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mode: LimitMode::Total,
            limits: ResourceLimits::default(),
            total_limit: 0,
            population_cap: 200,
            age: Age::Imperial.tag().to_string(),
            civilization: "generic".to_string(),
        }
    }
}

impl PlannerConfig {
    /// Typed view of the age tag, `None` when unrecognized.
    pub fn age_known(&self) -> Option<Age> {
        Age::from_tag(&self.age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_set_zero_removes_entry() {
        let mut composition = Composition::new();
        composition.set("archer", 10);
        composition.set("knight", 5);
        assert_eq!(composition.len(), 2);

        composition.set("archer", 0);
        assert_eq!(composition.quantity("archer"), 0);
        assert_eq!(composition.len(), 1);
    }

    #[test]
    fn composition_adjust_clamps_at_zero() {
        let mut composition = Composition::new();
        composition.adjust("knight", 3);
        composition.adjust("knight", -10);
        assert!(composition.is_empty());
    }

    #[test]
    fn composition_iterates_in_id_order() {
        let mut composition = Composition::new();
        composition.set("knight", 5);
        composition.set("archer", 10);
        let ids: Vec<&str> = composition.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["archer", "knight"]);
    }

    #[test]
    fn cost_scale_and_total() {
        let cost = ResourceCost {
            food: 60,
            gold: 75,
            ..ResourceCost::default()
        };
        let scaled = cost.scale(4);
        assert_eq!(scaled.food, 240);
        assert_eq!(scaled.gold, 300);
        assert_eq!(scaled.total(), 540);
    }

    #[test]
    fn age_tags_round_trip() {
        for age in Age::ALL {
            assert_eq!(Age::from_tag(age.tag()), Some(age));
        }
        assert_eq!(Age::from_tag("space"), None);
    }

    #[test]
    fn limit_mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LimitMode::Individual).unwrap(),
            "\"individual\""
        );
        assert_eq!(serde_json::to_string(&LimitMode::Total).unwrap(), "\"total\"");
    }
}
