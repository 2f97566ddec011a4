//! Declared class, profession and race histories.
//!
//! A history is an ordered list of `(name, from_level)` entries; each name is in
//! effect from its level until the next entry starts. Replaying a history
//! against the rule tables reproduces the progression contributions exactly.

use core::fmt;
use core::str::FromStr;

use crate::stats::StatSource;
use crate::tables::normalize_name;

use super::level::ProgressionError;

/// The two independently leveled progression tracks.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Track {
    Class,
    Profession,
}

impl Track {
    pub const ALL: [Track; 2] = [Track::Class, Track::Profession];

    /// Ledger source the track's gains are booked under.
    pub const fn source(self) -> StatSource {
        match self {
            Self::Class => StatSource::Class,
            Self::Profession => StatSource::Profession,
        }
    }

    /// Parses a track kind, rejecting anything but class or profession.
    pub fn lookup(kind: &str) -> Result<Self, ProgressionError> {
        kind.trim()
            .parse()
            .map_err(|_| ProgressionError::InvalidTrack {
                kind: kind.to_string(),
            })
    }
}

/// One history entry: `name` is in effect from `from_level` onwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry {
    pub name: String,
    pub from_level: u32,
}

/// Error returned when an encoded history cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed history entry '{entry}'")]
pub struct HistoryParseError {
    pub entry: String,
}

/// Ordered, non-overlapping history of one progression line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ProgressionHistory {
    entries: Vec<HistoryEntry>,
}

impl ProgressionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history with a single entry.
    pub fn starting_with(name: &str, from_level: u32) -> Self {
        let mut history = Self::new();
        history.supersede(name, from_level);
        history
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name in effect at `level`.
    pub fn name_at(&self, level: u32) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.from_level <= level)
            .map(|entry| entry.name.as_str())
    }

    /// The most recently declared name.
    pub fn current(&self) -> Option<&str> {
        self.entries.last().map(|entry| entry.name.as_str())
    }

    /// Name of the entry starting exactly at `level`.
    pub fn starts_at(&self, level: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.from_level == level)
            .map(|entry| entry.name.as_str())
    }

    /// Declares `name` from `from_level` on, dropping every entry it supersedes.
    pub fn supersede(&mut self, name: &str, from_level: u32) {
        self.entries.retain(|entry| entry.from_level < from_level);
        self.entries.push(HistoryEntry {
            name: normalize_name(name),
            from_level,
        });
    }
}

/// Encodes as `name@level;name@level`.
impl fmt::Display for ProgressionHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}@{}", entry.name, entry.from_level)?;
        }
        Ok(())
    }
}

impl FromStr for ProgressionHistory {
    type Err = HistoryParseError;

    fn from_str(encoded: &str) -> Result<Self, Self::Err> {
        let mut history = Self::new();
        for raw in encoded.split(';').map(str::trim).filter(|raw| !raw.is_empty()) {
            let malformed = || HistoryParseError {
                entry: raw.to_string(),
            };
            let (name, level) = raw.rsplit_once('@').ok_or_else(malformed)?;
            let level: u32 = level.trim().parse().map_err(|_| malformed())?;
            if name.trim().is_empty()
                || history
                    .entries
                    .last()
                    .is_some_and(|last| last.from_level >= level)
            {
                return Err(malformed());
            }
            history.supersede(name, level);
        }
        Ok(history)
    }
}
