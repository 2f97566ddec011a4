//! Tabular record layout - one row per character.
//!
//! Columns, in canonical order:
//!
//! | Column | Content |
//! |--------|---------|
//! | `Name` | identity |
//! | `Class`, `Class level`, `Profession`, `Profession level`, `Race`, `Race level`, `Race rank` | meta attributes |
//! | `{stat}` | current total (informational) |
//! | `{stat}_modifier` | modifier of the total (informational) |
//! | `{stat}_{source}` | raw contribution of one source |
//! | `free_points` | unspent pool |
//! | `tier_thresholds`, `{track}_history`, `race_history`, `{line}_points_granted`, `current_health`, `blessing` | bookkeeping |
//!
//! Loading rebuilds the ledger bucket by bucket and trusts the stored race
//! level and rank; nothing is recomputed from the rule tables.

use std::collections::BTreeMap;

use crate::character::Character;
use crate::error::{EngineError, ErrorSeverity};
use crate::progression::{
    FreePointPool, HistoryParseError, LevelSystem, ProgressionHistory, RaceProgress,
    TierThresholds, Track, TrackProgress,
};
use crate::stats::{HealthState, LedgerError, ModifierCurve, Stat, StatLedger, StatSource};
use crate::tables::TableError;

/// Column names.
pub mod columns {
    use crate::stats::{Stat, StatSource};

    pub const NAME: &str = "Name";
    pub const CLASS: &str = "Class";
    pub const CLASS_LEVEL: &str = "Class level";
    pub const PROFESSION: &str = "Profession";
    pub const PROFESSION_LEVEL: &str = "Profession level";
    pub const RACE: &str = "Race";
    pub const RACE_LEVEL: &str = "Race level";
    pub const RACE_RANK: &str = "Race rank";
    pub const FREE_POINTS: &str = "free_points";
    pub const TIER_THRESHOLDS: &str = "tier_thresholds";
    pub const CLASS_HISTORY: &str = "class_history";
    pub const PROFESSION_HISTORY: &str = "profession_history";
    pub const RACE_HISTORY: &str = "race_history";
    pub const CLASS_POINTS_GRANTED: &str = "class_points_granted";
    pub const PROFESSION_POINTS_GRANTED: &str = "profession_points_granted";
    pub const RACE_POINTS_GRANTED: &str = "race_points_granted";
    pub const CURRENT_HEALTH: &str = "current_health";
    pub const BLESSING: &str = "blessing";

    pub const META: [&str; 7] = [
        CLASS,
        CLASS_LEVEL,
        PROFESSION,
        PROFESSION_LEVEL,
        RACE,
        RACE_LEVEL,
        RACE_RANK,
    ];

    pub const BOOKKEEPING: [&str; 9] = [
        TIER_THRESHOLDS,
        CLASS_HISTORY,
        PROFESSION_HISTORY,
        RACE_HISTORY,
        CLASS_POINTS_GRANTED,
        PROFESSION_POINTS_GRANTED,
        RACE_POINTS_GRANTED,
        CURRENT_HEALTH,
        BLESSING,
    ];

    pub fn total(stat: Stat) -> String {
        stat.to_string()
    }

    pub fn modifier(stat: Stat) -> String {
        format!("{stat}_modifier")
    }

    pub fn source(stat: Stat, source: StatSource) -> String {
        format!("{stat}_{source}")
    }

    /// Every column in canonical order.
    pub fn all() -> Vec<String> {
        let mut names = vec![NAME.to_string()];
        names.extend(META.iter().map(|name| name.to_string()));
        names.extend(Stat::ALL.iter().map(|&stat| total(stat)));
        names.extend(Stat::ALL.iter().map(|&stat| modifier(stat)));
        for origin in StatSource::ALL {
            names.extend(Stat::ALL.iter().map(|&stat| source(stat, origin)));
        }
        names.push(FREE_POINTS.to_string());
        names.extend(BOOKKEEPING.iter().map(|name| name.to_string()));
        names
    }
}

/// Errors raised while reading a record back into a character.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("column '{column}' should hold {expected}")]
    InvalidCell {
        column: String,
        expected: &'static str,
    },

    #[error("column '{column}' holds a malformed history")]
    History {
        column: String,
        #[source]
        cause: HistoryParseError,
    },

    #[error(transparent)]
    Thresholds(#[from] TableError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EngineError for RecordError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingColumn { .. } => "RECORD_MISSING_COLUMN",
            Self::InvalidCell { .. } => "RECORD_INVALID_CELL",
            Self::History { .. } => "RECORD_MALFORMED_HISTORY",
            Self::Thresholds(inner) => inner.error_code(),
            Self::Ledger(inner) => inner.error_code(),
        }
    }
}

/// A single cell: integers for numbers, text for everything else.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Cell {
    Int(i64),
    Text(String),
}

impl Cell {
    /// Integer value; numeric text is accepted for sheets that stored levels as text.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Int(_) => None,
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One persisted row, keyed by column name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CharacterRecord {
    cells: BTreeMap<String, Cell>,
}

impl CharacterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub fn set(&mut self, column: impl Into<String>, cell: impl Into<Cell>) {
        self.cells.insert(column.into(), cell.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<Cell> {
        self.cells.remove(column)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The identity column.
    pub fn name(&self) -> Option<&str> {
        self.get(columns::NAME).and_then(Cell::as_text)
    }

    fn text(&self, column: &str) -> Result<Option<&str>, RecordError> {
        match self.get(column) {
            None => Ok(None),
            Some(Cell::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(Cell::Text(text)) => Ok(Some(text.trim())),
            Some(Cell::Int(_)) => Err(RecordError::InvalidCell {
                column: column.to_string(),
                expected: "text",
            }),
        }
    }

    fn int<T: TryFrom<i64>>(&self, column: &str) -> Result<Option<T>, RecordError> {
        let Some(cell) = self.get(column) else {
            return Ok(None);
        };
        cell.as_int()
            .and_then(|value| T::try_from(value).ok())
            .map(Some)
            .ok_or_else(|| RecordError::InvalidCell {
                column: column.to_string(),
                expected: "an integer in range",
            })
    }

    fn history(&self, column: &str) -> Result<Option<ProgressionHistory>, RecordError> {
        self.text(column)?
            .map(|encoded| {
                encoded.parse().map_err(|cause| RecordError::History {
                    column: column.to_string(),
                    cause,
                })
            })
            .transpose()
    }
}

fn text_or_empty(value: Option<&str>) -> Cell {
    Cell::Text(value.unwrap_or_default().to_string())
}

impl Character {
    /// Flattens the character into one row.
    pub fn to_record(&self) -> CharacterRecord {
        let mut record = CharacterRecord::new();
        let levels = self.levels();
        let class = levels.track(Track::Class);
        let profession = levels.track(Track::Profession);
        let race = levels.race();

        record.set(columns::NAME, self.name());
        record.set(columns::CLASS, text_or_empty(class.name()));
        record.set(columns::CLASS_LEVEL, class.level());
        record.set(columns::PROFESSION, text_or_empty(profession.name()));
        record.set(columns::PROFESSION_LEVEL, profession.level());
        record.set(columns::RACE, text_or_empty(race.name()));
        record.set(columns::RACE_LEVEL, race.level());
        record.set(columns::RACE_RANK, text_or_empty(race.rank()));

        let ledger = self.ledger();
        for stat in Stat::ALL {
            record.set(columns::total(stat), ledger.current(stat));
            record.set(columns::modifier(stat), ledger.modifier(stat));
            for source in StatSource::ALL {
                record.set(columns::source(stat, source), ledger.contribution(stat, source));
            }
        }
        record.set(columns::FREE_POINTS, levels.pool().available());

        let thresholds: Vec<String> = levels
            .thresholds()
            .as_slice()
            .iter()
            .map(u32::to_string)
            .collect();
        record.set(columns::TIER_THRESHOLDS, thresholds.join(","));
        record.set(columns::CLASS_HISTORY, class.history().to_string());
        record.set(columns::PROFESSION_HISTORY, profession.history().to_string());
        record.set(columns::RACE_HISTORY, race.history().to_string());
        record.set(columns::CLASS_POINTS_GRANTED, class.granted());
        record.set(columns::PROFESSION_POINTS_GRANTED, profession.granted());
        record.set(columns::RACE_POINTS_GRANTED, race.granted());
        record.set(columns::CURRENT_HEALTH, self.health().current());
        record.set(
            columns::BLESSING,
            text_or_empty(self.blessing().map(|blessing| blessing.name.as_str())),
        );
        record
    }

    /// Rebuilds a character from its row.
    ///
    /// Missing source columns read as zero and missing bookkeeping columns fall
    /// back to defaults, so rows written before those columns existed still load.
    pub fn from_record(record: &CharacterRecord, curve: ModifierCurve) -> Result<Self, RecordError> {
        let name = record
            .text(columns::NAME)?
            .ok_or_else(|| RecordError::MissingColumn {
                column: columns::NAME.to_string(),
            })?
            .to_string();

        let mut ledger = StatLedger::empty().with_curve(curve);
        for stat in Stat::ALL {
            for source in StatSource::ALL {
                let column = columns::source(stat, source);
                if let Some(value) = record.int::<i32>(&column)? {
                    ledger.restore(stat, source, value)?;
                }
            }
            let stored: Option<i64> = record.int(&columns::total(stat))?;
            if stored.is_some_and(|total| total != i64::from(ledger.current(stat))) {
                tracing::warn!(
                    character = %name,
                    %stat,
                    stored = stored.unwrap_or_default(),
                    rebuilt = ledger.current(stat),
                    "stored total disagrees with source columns"
                );
            }
        }
        ledger.ensure_non_negative()?;

        let thresholds = match record.text(columns::TIER_THRESHOLDS)? {
            None if record.get(columns::TIER_THRESHOLDS).is_some() => {
                TierThresholds::new(Vec::new())?
            }
            None => TierThresholds::default(),
            Some(encoded) => {
                let parsed: Result<Vec<u32>, _> =
                    encoded.split(',').map(|part| part.trim().parse()).collect();
                let parsed = parsed.map_err(|_| RecordError::InvalidCell {
                    column: columns::TIER_THRESHOLDS.to_string(),
                    expected: "comma separated levels",
                })?;
                TierThresholds::new(parsed)?
            }
        };

        let class = restore_track(
            record,
            columns::CLASS,
            columns::CLASS_LEVEL,
            columns::CLASS_HISTORY,
            columns::CLASS_POINTS_GRANTED,
        )?;
        let profession = restore_track(
            record,
            columns::PROFESSION,
            columns::PROFESSION_LEVEL,
            columns::PROFESSION_HISTORY,
            columns::PROFESSION_POINTS_GRANTED,
        )?;

        let race_history = match record.history(columns::RACE_HISTORY)? {
            Some(history) => history,
            None => record
                .text(columns::RACE)?
                .map(|race| ProgressionHistory::starting_with(race, 0))
                .unwrap_or_default(),
        };
        let race = RaceProgress::restored(
            record.int(columns::RACE_LEVEL)?.unwrap_or_default(),
            record.text(columns::RACE_RANK)?.map(String::from),
            race_history,
            record
                .int(columns::RACE_POINTS_GRANTED)?
                .unwrap_or_default(),
        );

        let pool = FreePointPool::new(record.int(columns::FREE_POINTS)?.unwrap_or_default());
        let levels = LevelSystem::restore(thresholds, class, profession, race, pool);

        let max_health = ledger.modifier(Stat::Vitality);
        let health = match record.int(columns::CURRENT_HEALTH)? {
            Some(current) => HealthState::from_parts(max_health, current),
            None => HealthState::new(max_health),
        };
        let blessing = record.text(columns::BLESSING)?.map(String::from);

        tracing::debug!(character = %name, "character restored from record");
        Ok(Character::restore(name, ledger, levels, health, blessing))
    }
}

fn restore_track(
    record: &CharacterRecord,
    name_column: &str,
    level_column: &str,
    history_column: &str,
    granted_column: &str,
) -> Result<TrackProgress, RecordError> {
    let history = match record.history(history_column)? {
        Some(history) => history,
        None => record
            .text(name_column)?
            .map(|name| ProgressionHistory::starting_with(name, 1))
            .unwrap_or_default(),
    };
    Ok(TrackProgress::restored(
        record.int(level_column)?.unwrap_or_default(),
        history,
        record.int(granted_column)?.unwrap_or_default(),
    ))
}
