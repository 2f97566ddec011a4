//! Data-driven progression content and loaders.
//!
//! This crate houses the bundled rule data and provides loaders for TOML/RON files:
//! - Progression tables (class, profession and race gains, via TOML)
//! - Engine configuration (tier thresholds, base stat, modifier curve, via TOML)
//! - Imported character sheets for reverse-engineering validation (via RON)
//!
//! Content is consumed through `character_core::ProgressionOracle` and never
//! appears in a persisted character.

/// Bundled progression tables.
pub const BUNDLED_TABLES: &str = include_str!("../data/tables.toml");

/// Bundled engine configuration.
pub const BUNDLED_CONFIG: &str = include_str!("../data/config.toml");

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{CharacterSheet, ConfigLoader, ContentFactory, SheetLoader, TablesLoader};
