#![warn(clippy::all, missing_docs)]

//! Core domain logic for the armytui planner.
//!
//! This crate hosts the data models, unit catalog, planning
//! arithmetic, share-link codec, and persistence layers used by
//! the terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod events;
pub mod models;
pub mod planner;
pub mod prefs;
pub mod save;
pub mod share;

pub use catalog::CatalogLoader;
pub use config::AppConfig;
pub use models::{
    Age, Composition, LimitMode, PlannerConfig, Resource, ResourceCost, ResourceLimits, UnitInfo,
};
pub use planner::{check, summarize, LimitBreach, PlanSummary};
pub use share::{decode, encode, share_url, token_from_url, ShareError};
