//! Progression tables loader.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, bail};
use character_core::{LevelGains, ProgressionTables, RaceRank, RaceTable, normalize_name};
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file, stat_block};

/// Top-level layout of `tables.toml`.
///
/// ```toml
/// [[class]]
/// tier = 1
/// name = "mage"
/// free_points = 2
/// stats = { intelligence = 2, willpower = 2 }
///
/// [[race]]
/// name = "human"
///
/// [[race.ranks]]
/// min_level = 0
/// max_level = 9
/// rank = "G"
/// free_points = 1
/// stats = { strength = 1 }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TablesFile {
    #[serde(default)]
    class: Vec<TrackEntry>,
    #[serde(default)]
    profession: Vec<TrackEntry>,
    #[serde(default)]
    race: Vec<RaceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrackEntry {
    tier: u32,
    name: String,
    #[serde(default)]
    free_points: u32,
    #[serde(default)]
    stats: BTreeMap<String, i32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RaceEntry {
    name: String,
    ranks: Vec<RankEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RankEntry {
    min_level: u32,
    max_level: u32,
    rank: String,
    #[serde(default)]
    free_points: u32,
    #[serde(default)]
    stats: BTreeMap<String, i32>,
}

fn gains(stats: &BTreeMap<String, i32>, free_points: u32) -> LoadResult<LevelGains> {
    let block = stat_block(stats)?;
    if let Some((stat, value)) = block.iter().find(|&(_, value)| value < 0) {
        bail!("gain for {stat} is negative ({value})");
    }
    Ok(LevelGains::new(block, free_points))
}

/// Loader for progression tables from TOML files.
pub struct TablesLoader;

impl TablesLoader {
    /// Load tables from a TOML file.
    pub fn load(path: &Path) -> LoadResult<ProgressionTables> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("Invalid tables at {}", path.display()))
    }

    /// Tables shipped with the crate.
    pub fn bundled() -> LoadResult<ProgressionTables> {
        Self::parse(crate::BUNDLED_TABLES).context("Invalid bundled tables")
    }

    /// Parse and validate tables from TOML text.
    ///
    /// Rejects unknown stat names, negative gains, duplicate entries, tier 0
    /// and malformed race rank ranges.
    pub fn parse(content: &str) -> LoadResult<ProgressionTables> {
        let file: TablesFile =
            toml::from_str(content).context("Failed to parse tables TOML")?;
        let mut tables = ProgressionTables::new();

        for (kind, entries) in [("class", &file.class), ("profession", &file.profession)] {
            let mut seen = BTreeSet::new();
            for entry in entries {
                let name = normalize_name(&entry.name);
                if entry.tier == 0 {
                    bail!("{kind} '{name}' declares tier 0; tiers start at 1");
                }
                if !seen.insert((entry.tier, name.clone())) {
                    bail!("{kind} '{name}' is defined twice for tier {}", entry.tier);
                }
                let gains = gains(&entry.stats, entry.free_points)
                    .with_context(|| format!("{kind} '{name}' (tier {})", entry.tier))?;
                if kind == "class" {
                    tables.insert_class(entry.tier, &name, gains);
                } else {
                    tables.insert_profession(entry.tier, &name, gains);
                }
            }
        }

        let mut seen = BTreeSet::new();
        for entry in &file.race {
            let name = normalize_name(&entry.name);
            if !seen.insert(name.clone()) {
                bail!("race '{name}' is defined twice");
            }
            let ranks = entry
                .ranks
                .iter()
                .map(|row| {
                    Ok(RaceRank {
                        min_level: row.min_level,
                        max_level: row.max_level,
                        rank: row.rank.trim().to_string(),
                        gains: gains(&row.stats, row.free_points)?,
                    })
                })
                .collect::<LoadResult<Vec<_>>>()
                .with_context(|| format!("race '{name}'"))?;
            tables.insert_race(&name, RaceTable::new(&name, ranks)?);
        }

        tracing::debug!(
            classes = tables.class_count(),
            professions = tables.profession_count(),
            races = file.race.len(),
            "progression tables loaded"
        );
        Ok(tables)
    }
}
