//! Character progression rules shared by content loaders, storage and tools.
//!
//! `character-core` owns the canonical rules: the per-source stat ledger and its
//! modifier curve, tiered class and profession progression, race derivation,
//! the free-point economy, health, and reverse-engineering validation of
//! hand-edited sheets. Rule tables arrive through
//! [`tables::ProgressionOracle`], so the crate performs no I/O. All mutation of a
//! character flows through [`character::Character`].
pub mod character;
pub mod config;
pub mod error;
pub mod progression;
pub mod record;
pub mod stats;
pub mod tables;
pub mod validator;

pub use character::{Blessing, Character, CharacterBuilder, CharacterError, Item, MetaKey};
pub use config::EngineConfig;
pub use error::{EngineError, ErrorSeverity};
pub use progression::{
    AllocationError, FreePointPool, HistoryEntry, HistoryParseError, LevelSystem, LevelUpSummary,
    NoChoices, ProgressionError, ProgressionHistory, RaceProgress, ScriptedChoices,
    TierChoiceProvider, TierChoiceRequest, TierThresholds, Track, TrackProgress,
};
pub use record::{Cell, CharacterRecord, RecordError};
pub use stats::{
    HealthState, LedgerError, ModifierCurve, RecomputeReason, SourceBreakdown, Stat, StatBlock,
    StatLedger, StatSource, modifier,
};
pub use tables::{
    LevelGains, ProgressionOracle, ProgressionTables, RaceRank, RaceTable, TableError,
    normalize_name,
};
pub use validator::{
    DeclaredProgression, FreePointBalance, ReverseEngineeringInput, ReverseEngineeringValidator,
    StatBreakdown, ValidationIssue, ValidationReport, ValidationWarning,
};
