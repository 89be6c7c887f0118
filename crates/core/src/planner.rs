//! Aggregate cost and limit checking for a composition.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogLoader;
use crate::models::{Composition, LimitMode, PlannerConfig, Resource, ResourceCost};

/// Totals derived from a composition against the current catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Combined training cost.
    pub cost: ResourceCost,
    /// Population slots used.
    pub population: u32,
    /// Total unit count across all entries.
    pub unit_count: u32,
    /// Composition entries the catalog knows nothing about. They contribute
    /// no cost or population but are kept so callers can surface them.
    pub unknown_units: Vec<String>,
}

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitBreach {
    /// A per-resource cap was exceeded (individual mode).
    Resource {
        /// Which resource.
        resource: Resource,
        /// Amount the plan spends.
        spent: u32,
        /// Configured cap.
        cap: u32,
    },
    /// The aggregate cap was exceeded (total mode).
    TotalResources {
        /// Combined spend across all resources.
        spent: u64,
        /// Configured cap.
        cap: u64,
    },
    /// The population cap was exceeded.
    Population {
        /// Slots used.
        used: u32,
        /// Configured cap.
        cap: u32,
    },
}

/// Total up a composition. Unknown unit ids are recorded, not errors.
pub fn summarize(composition: &Composition, catalog: &CatalogLoader) -> PlanSummary {
    let mut summary = PlanSummary::default();
    for (unit_id, quantity) in composition.iter() {
        summary.unit_count = summary.unit_count.saturating_add(quantity);
        match catalog.unit(unit_id) {
            Some(unit) => {
                summary.cost = summary.cost.add(&unit.cost.scale(quantity));
                summary.population = summary
                    .population
                    .saturating_add(unit.population.saturating_mul(quantity));
            }
            None => summary.unknown_units.push(unit_id.to_string()),
        }
    }
    summary
}

/// Check a summary against the configured limits. A cap of zero disables
/// the corresponding check.
pub fn check(config: &PlannerConfig, summary: &PlanSummary) -> Vec<LimitBreach> {
    let mut breaches = Vec::new();

    match config.mode {
        LimitMode::Individual => {
            for resource in Resource::ALL {
                let cap = config.limits.get(resource);
                let spent = summary.cost.get(resource);
                if cap > 0 && spent > cap {
                    breaches.push(LimitBreach::Resource { resource, spent, cap });
                }
            }
        }
        LimitMode::Total => {
            let cap = u64::from(config.total_limit);
            let spent = summary.cost.total();
            if cap > 0 && spent > cap {
                breaches.push(LimitBreach::TotalResources { spent, cap });
            }
        }
    }

    if config.population_cap > 0 && summary.population > config.population_cap {
        breaches.push(LimitBreach::Population {
            used: summary.population,
            cap: config.population_cap,
        });
    }

    breaches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceLimits;

    fn catalog() -> CatalogLoader {
        CatalogLoader::new(None)
    }

    fn composition() -> Composition {
        // 10 archers (25w 45g) + 5 knights (60f 75g).
        [("archer".to_string(), 10), ("knight".to_string(), 5)]
            .into_iter()
            .collect()
    }

    #[test]
    fn summarize_totals_cost_and_population() {
        let summary = summarize(&composition(), &catalog());
        assert_eq!(summary.cost.wood, 250);
        assert_eq!(summary.cost.food, 300);
        assert_eq!(summary.cost.gold, 825);
        assert_eq!(summary.cost.stone, 0);
        assert_eq!(summary.cost.total(), 1375);
        assert_eq!(summary.population, 15);
        assert_eq!(summary.unit_count, 15);
        assert!(summary.unknown_units.is_empty());
    }

    #[test]
    fn unknown_units_contribute_nothing() {
        let mut composition = composition();
        composition.set("chocobo", 40);
        let summary = summarize(&composition, &catalog());
        assert_eq!(summary.cost.total(), 1375);
        assert_eq!(summary.population, 15);
        assert_eq!(summary.unit_count, 55);
        assert_eq!(summary.unknown_units, vec!["chocobo".to_string()]);
    }

    #[test]
    fn total_mode_checks_aggregate_only() {
        let config = PlannerConfig {
            mode: LimitMode::Total,
            total_limit: 1000,
            // Tight per-resource caps must be ignored in total mode.
            limits: ResourceLimits {
                food: 1,
                wood: 1,
                gold: 1,
                stone: 1,
            },
            population_cap: 200,
            ..PlannerConfig::default()
        };
        let breaches = check(&config, &summarize(&composition(), &catalog()));
        assert_eq!(
            breaches,
            vec![LimitBreach::TotalResources {
                spent: 1375,
                cap: 1000
            }]
        );
    }

    #[test]
    fn individual_mode_checks_each_resource() {
        let config = PlannerConfig {
            mode: LimitMode::Individual,
            limits: ResourceLimits {
                food: 200,
                wood: 500,
                gold: 800,
                stone: 0,
            },
            total_limit: 1,
            population_cap: 200,
            ..PlannerConfig::default()
        };
        let breaches = check(&config, &summarize(&composition(), &catalog()));
        assert_eq!(breaches.len(), 2);
        assert!(breaches.contains(&LimitBreach::Resource {
            resource: Resource::Food,
            spent: 300,
            cap: 200
        }));
        assert!(breaches.contains(&LimitBreach::Resource {
            resource: Resource::Gold,
            spent: 825,
            cap: 800
        }));
    }

    #[test]
    fn population_cap_always_applies() {
        let config = PlannerConfig {
            population_cap: 10,
            ..PlannerConfig::default()
        };
        let breaches = check(&config, &summarize(&composition(), &catalog()));
        assert_eq!(
            breaches,
            vec![LimitBreach::Population { used: 15, cap: 10 }]
        );
    }

    #[test]
    fn zero_caps_disable_checks() {
        let config = PlannerConfig {
            total_limit: 0,
            population_cap: 0,
            ..PlannerConfig::default()
        };
        assert!(check(&config, &summarize(&composition(), &catalog())).is_empty());
    }
}
