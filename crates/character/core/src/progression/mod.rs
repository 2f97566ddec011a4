//! Progression - tiers, histories, leveling and the free-point economy.
//!
//! [`LevelSystem`] drives everything: it resolves tiers through
//! [`TierThresholds`], looks gains up through a
//! [`ProgressionOracle`](crate::tables::ProgressionOracle), books them into the
//! [`StatLedger`](crate::stats::StatLedger) and grants free points into the
//! embedded [`FreePointPool`].

pub mod history;
pub mod level;
pub mod pool;
pub mod replay;
pub mod tier;

pub use history::{HistoryEntry, HistoryParseError, ProgressionHistory, Track};
pub use level::{
    LevelSystem, LevelUpSummary, NoChoices, ProgressionError, RaceProgress, ScriptedChoices,
    TierChoiceProvider, TierChoiceRequest, TrackProgress,
};
pub use pool::{AllocationError, FreePointPool};
pub use replay::{RaceReplay, ReplayTotals, replay_race, replay_track};
pub use tier::TierThresholds;
