//! Pure replay of declared histories against the rule tables.
//!
//! Shared by the level system (reset-and-replay) and the reverse-engineering
//! validator, so both agree on what a history is worth.

use core::ops::{AddAssign, RangeInclusive};

use crate::stats::StatBlock;
use crate::tables::{LevelGains, ProgressionOracle};

use super::history::{ProgressionHistory, Track};
use super::level::ProgressionError;
use super::tier::TierThresholds;

/// Summed gains over a range of levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayTotals {
    pub stats: StatBlock,
    pub free_points: u32,
}

impl AddAssign<LevelGains> for ReplayTotals {
    fn add_assign(&mut self, gains: LevelGains) {
        self.stats += gains.stats;
        self.free_points += gains.free_points;
    }
}

impl AddAssign for ReplayTotals {
    fn add_assign(&mut self, other: Self) {
        self.stats += other.stats;
        self.free_points += other.free_points;
    }
}

/// Race gains over a range of race levels, plus the rank reached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RaceReplay {
    pub totals: ReplayTotals,
    pub rank: Option<String>,
}

/// Gains of `track` for levels `1..=level` under `history`.
pub fn replay_track(
    oracle: &dyn ProgressionOracle,
    thresholds: &TierThresholds,
    track: Track,
    history: &ProgressionHistory,
    level: u32,
) -> Result<ReplayTotals, ProgressionError> {
    let mut totals = ReplayTotals::default();
    for current in 1..=level {
        let name = history
            .name_at(current)
            .ok_or(ProgressionError::MissingName {
                track,
                level: current,
            })?;
        let tier = thresholds.tier_for_level(current);
        totals += oracle.track_gains(track, tier, name)?;
    }
    Ok(totals)
}

/// Race gains for every race level in `levels`.
///
/// Race level 0 only sets the starting rank; it never grants anything. Levels
/// with no race declared, or not covered by the race's table, grant nothing
/// and keep the previous rank.
pub fn replay_race(
    oracle: &dyn ProgressionOracle,
    history: &ProgressionHistory,
    levels: RangeInclusive<u32>,
    rank: Option<String>,
) -> Result<RaceReplay, ProgressionError> {
    let mut replay = RaceReplay {
        totals: ReplayTotals::default(),
        rank,
    };
    for level in levels {
        let Some(race) = history.name_at(level) else {
            continue;
        };
        let Some(row) = oracle.race_gains(race, level)? else {
            continue;
        };
        replay.rank = Some(row.rank.clone());
        if level > 0 {
            replay.totals += row.gains;
        }
    }
    Ok(replay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Stat;
    use crate::tables::{ProgressionTables, RaceRank, RaceTable};

    fn tables() -> ProgressionTables {
        let mut tables = ProgressionTables::new();
        tables
            .insert_class(1, "archer", LevelGains::new(StatBlock::ZERO.with(Stat::Perception, 2), 2))
            .insert_class(2, "sniper", LevelGains::new(StatBlock::ZERO.with(Stat::Perception, 5), 4));
        let race = RaceTable::new(
            "human",
            vec![
                RaceRank {
                    min_level: 0,
                    max_level: 9,
                    rank: "G".into(),
                    gains: LevelGains::new(StatBlock::splat(1), 1),
                },
                RaceRank {
                    min_level: 10,
                    max_level: 24,
                    rank: "F".into(),
                    gains: LevelGains::new(StatBlock::splat(1), 2),
                },
            ],
        )
        .unwrap();
        tables.insert_race("human", race);
        tables
    }

    #[test]
    fn track_replay_switches_tables_at_thresholds() {
        let thresholds = TierThresholds::new(vec![3]).unwrap();
        let mut history = ProgressionHistory::starting_with("archer", 1);
        history.supersede("sniper", 3);

        let totals = replay_track(&tables(), &thresholds, Track::Class, &history, 4).unwrap();
        assert_eq!(totals.stats[Stat::Perception], 2 + 2 + 5 + 5);
        assert_eq!(totals.free_points, 2 + 2 + 4 + 4);
    }

    #[test]
    fn track_replay_needs_a_name_per_level() {
        let thresholds = TierThresholds::default();
        let empty = ProgressionHistory::new();
        assert_eq!(
            replay_track(&tables(), &thresholds, Track::Class, &empty, 0).unwrap(),
            ReplayTotals::default()
        );
        assert!(matches!(
            replay_track(&tables(), &thresholds, Track::Class, &empty, 1),
            Err(ProgressionError::MissingName { level: 1, .. })
        ));
    }

    #[test]
    fn race_replay_skips_level_zero_gains() {
        let history = ProgressionHistory::starting_with("human", 0);
        let replay = replay_race(&tables(), &history, 0..=0, None).unwrap();
        assert_eq!(replay.rank.as_deref(), Some("G"));
        assert_eq!(replay.totals, ReplayTotals::default());

        let replay = replay_race(&tables(), &history, 6..=11, Some("G".into())).unwrap();
        assert_eq!(replay.rank.as_deref(), Some("F"));
        assert_eq!(replay.totals.stats[Stat::Wisdom], 6);
        assert_eq!(replay.totals.free_points, 4 + 2 * 2);
    }

    #[test]
    fn uncovered_race_levels_keep_rank() {
        let history = ProgressionHistory::starting_with("human", 0);
        let replay = replay_race(&tables(), &history, 30..=31, Some("F".into())).unwrap();
        assert_eq!(replay.rank.as_deref(), Some("F"));
        assert_eq!(replay.totals, ReplayTotals::default());
    }
}
