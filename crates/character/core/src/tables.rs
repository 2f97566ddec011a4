//! Static progression rule data.
//!
//! Class and profession behaviour is pure data keyed by `(tier, name)`; races
//! are level-range tables. Everything here is read-only lookup, exposed to the
//! engine through [`ProgressionOracle`] so content crates can supply their own
//! backing store.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EngineError, ErrorSeverity};
use crate::progression::Track;
use crate::stats::StatBlock;

/// Errors raised while looking up or building rule tables.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("class '{name}' is not defined for tier {tier}")]
    UnknownClass { tier: u32, name: String },

    #[error("profession '{name}' is not defined for tier {tier}")]
    UnknownProfession { tier: u32, name: String },

    #[error("race '{name}' is not defined")]
    UnknownRace { name: String },

    #[error("race table '{race}' is malformed: {reason}")]
    MalformedRaceTable { race: String, reason: String },

    #[error("invalid tier thresholds {thresholds:?}: {reason}")]
    InvalidThresholds {
        thresholds: Vec<u32>,
        reason: &'static str,
    },
}

impl EngineError for TableError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MalformedRaceTable { .. } => ErrorSeverity::Internal,
            Self::UnknownClass { .. }
            | Self::UnknownProfession { .. }
            | Self::UnknownRace { .. }
            | Self::InvalidThresholds { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownClass { .. } => "TABLE_UNKNOWN_CLASS",
            Self::UnknownProfession { .. } => "TABLE_UNKNOWN_PROFESSION",
            Self::UnknownRace { .. } => "TABLE_UNKNOWN_RACE",
            Self::MalformedRaceTable { .. } => "TABLE_MALFORMED_RACE_TABLE",
            Self::InvalidThresholds { .. } => "TABLE_INVALID_THRESHOLDS",
        }
    }
}

/// Canonical form of a class, profession or race name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Stat deltas and free points granted by one level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelGains {
    pub stats: StatBlock,
    pub free_points: u32,
}

impl LevelGains {
    pub const fn new(stats: StatBlock, free_points: u32) -> Self {
        Self { stats, free_points }
    }
}

/// One row of a race table: gains for every race level in `min_level..=max_level`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaceRank {
    pub min_level: u32,
    pub max_level: u32,
    pub rank: String,
    pub gains: LevelGains,
}

impl RaceRank {
    pub fn contains(&self, level: u32) -> bool {
        (self.min_level..=self.max_level).contains(&level)
    }
}

/// Rows of one race, sorted and contiguous.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaceTable {
    ranks: Vec<RaceRank>,
}

impl RaceTable {
    /// Sorts the rows and rejects inverted ranges, gaps and overlaps.
    pub fn new(race: &str, mut ranks: Vec<RaceRank>) -> Result<Self, TableError> {
        let malformed = |reason: String| TableError::MalformedRaceTable {
            race: race.to_string(),
            reason,
        };

        if ranks.is_empty() {
            return Err(malformed("no level ranges".into()));
        }
        ranks.sort_by_key(|rank| rank.min_level);

        for rank in &ranks {
            if rank.min_level > rank.max_level {
                return Err(malformed(format!(
                    "range {}..={} is inverted",
                    rank.min_level, rank.max_level
                )));
            }
        }
        for pair in ranks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.min_level <= prev.max_level {
                return Err(malformed(format!(
                    "ranges {}..={} and {}..={} overlap",
                    prev.min_level, prev.max_level, next.min_level, next.max_level
                )));
            }
            if next.min_level != prev.max_level + 1 {
                return Err(malformed(format!(
                    "gap between levels {} and {}",
                    prev.max_level, next.min_level
                )));
            }
        }

        Ok(Self { ranks })
    }

    /// Row covering `level`, if any.
    pub fn rank_for(&self, level: u32) -> Option<&RaceRank> {
        self.ranks.iter().find(|rank| rank.contains(level))
    }

    pub fn ranks(&self) -> &[RaceRank] {
        &self.ranks
    }
}

/// Read-only access to progression rules.
///
/// Unknown `(tier, name)` combinations are hard errors, never silent no-ops.
pub trait ProgressionOracle: Send + Sync {
    fn class_gains(&self, tier: u32, class: &str) -> Result<LevelGains, TableError>;

    fn profession_gains(&self, tier: u32, profession: &str) -> Result<LevelGains, TableError>;

    fn race_table(&self, race: &str) -> Result<&RaceTable, TableError>;

    fn classes_for_tier(&self, tier: u32) -> Vec<String>;

    fn professions_for_tier(&self, tier: u32) -> Vec<String>;

    /// Gains for either track.
    fn track_gains(&self, track: Track, tier: u32, name: &str) -> Result<LevelGains, TableError> {
        match track {
            Track::Class => self.class_gains(tier, name),
            Track::Profession => self.profession_gains(tier, name),
        }
    }

    /// Names selectable on `track` at `tier`.
    fn track_options(&self, track: Track, tier: u32) -> Vec<String> {
        match track {
            Track::Class => self.classes_for_tier(tier),
            Track::Profession => self.professions_for_tier(tier),
        }
    }

    /// Row of `race` containing `level`; `None` when no row covers it.
    fn race_gains(&self, race: &str, level: u32) -> Result<Option<&RaceRank>, TableError> {
        Ok(self.race_table(race)?.rank_for(level))
    }
}

/// In-memory rule tables.
#[derive(Clone, Debug, Default)]
pub struct ProgressionTables {
    classes: BTreeMap<u32, BTreeMap<String, LevelGains>>,
    professions: BTreeMap<u32, BTreeMap<String, LevelGains>>,
    races: BTreeMap<String, RaceTable>,
}

impl ProgressionTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_class(&mut self, tier: u32, name: &str, gains: LevelGains) -> &mut Self {
        self.classes
            .entry(tier)
            .or_default()
            .insert(normalize_name(name), gains);
        self
    }

    pub fn insert_profession(&mut self, tier: u32, name: &str, gains: LevelGains) -> &mut Self {
        self.professions
            .entry(tier)
            .or_default()
            .insert(normalize_name(name), gains);
        self
    }

    pub fn insert_race(&mut self, name: &str, table: RaceTable) -> &mut Self {
        self.races.insert(normalize_name(name), table);
        self
    }

    /// Every tier with at least one class or profession.
    pub fn tiers(&self) -> Vec<u32> {
        self.classes
            .keys()
            .chain(self.professions.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn races(&self) -> Vec<String> {
        self.races.keys().cloned().collect()
    }

    pub fn class_count(&self) -> usize {
        self.classes.values().map(BTreeMap::len).sum()
    }

    pub fn profession_count(&self) -> usize {
        self.professions.values().map(BTreeMap::len).sum()
    }

    fn lookup(
        table: &BTreeMap<u32, BTreeMap<String, LevelGains>>,
        tier: u32,
        name: &str,
    ) -> Option<LevelGains> {
        table.get(&tier)?.get(&normalize_name(name)).copied()
    }

    fn names(table: &BTreeMap<u32, BTreeMap<String, LevelGains>>, tier: u32) -> Vec<String> {
        table
            .get(&tier)
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl ProgressionOracle for ProgressionTables {
    fn class_gains(&self, tier: u32, class: &str) -> Result<LevelGains, TableError> {
        Self::lookup(&self.classes, tier, class).ok_or_else(|| TableError::UnknownClass {
            tier,
            name: class.to_string(),
        })
    }

    fn profession_gains(&self, tier: u32, profession: &str) -> Result<LevelGains, TableError> {
        Self::lookup(&self.professions, tier, profession).ok_or_else(|| {
            TableError::UnknownProfession {
                tier,
                name: profession.to_string(),
            }
        })
    }

    fn race_table(&self, race: &str) -> Result<&RaceTable, TableError> {
        self.races
            .get(&normalize_name(race))
            .ok_or_else(|| TableError::UnknownRace {
                name: race.to_string(),
            })
    }

    fn classes_for_tier(&self, tier: u32) -> Vec<String> {
        Self::names(&self.classes, tier)
    }

    fn professions_for_tier(&self, tier: u32) -> Vec<String> {
        Self::names(&self.professions, tier)
    }
}
