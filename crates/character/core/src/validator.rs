//! Reverse engineering of free-point allocation from stat snapshots.
//!
//! Given base stats, observed current stats and a declared progression, the
//! validator replays the rule tables to find what the rules alone guarantee,
//! attributes every remaining point to free-point spending, and checks the
//! free-point balance:
//!
//! ```text
//! granted == spent + pool
//! ```
//!
//! A stat below its rule floor or spending beyond what was granted makes the
//! declaration invalid. A pool smaller than `granted - spent` is a bookkeeping
//! gap: it is corrected upwards and reported as a warning.

use core::fmt;

use crate::progression::{
    LevelSystem, ProgressionError, ProgressionHistory, ReplayTotals, TierThresholds, Track,
    TrackProgress, replay_race, replay_track,
};
use crate::stats::{Stat, StatBlock, StatLedger, StatSource};
use crate::tables::ProgressionOracle;

/// Declared class, profession and race progression.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclaredProgression {
    pub thresholds: TierThresholds,
    pub class: TrackProgress,
    pub profession: TrackProgress,
    pub race_history: ProgressionHistory,
    pub race_level: u32,
}

impl DeclaredProgression {
    /// Declaration whose race level is derived from the track levels.
    pub fn new(
        thresholds: TierThresholds,
        class: TrackProgress,
        profession: TrackProgress,
        race_history: ProgressionHistory,
    ) -> Self {
        let race_level = (class.level() + profession.level()) / 2;
        Self {
            thresholds,
            class,
            profession,
            race_history,
            race_level,
        }
    }

    /// The live progression of a level system.
    pub fn from_levels(levels: &LevelSystem) -> Self {
        Self {
            thresholds: levels.thresholds().clone(),
            class: levels.track(Track::Class).clone(),
            profession: levels.track(Track::Profession).clone(),
            race_history: levels.race().history().clone(),
            race_level: levels.race_level(),
        }
    }
}

/// Everything the validator reasons about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReverseEngineeringInput {
    pub base: StatBlock,
    pub current: StatBlock,
    /// Known non-progression contributions (items, blessing, custom edits).
    pub adjustments: StatBlock,
    pub declaration: DeclaredProgression,
    pub declared_pool: u32,
}

/// Expected contributions and residual of one stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatBreakdown {
    pub stat: Stat,
    pub base: i32,
    pub class: i32,
    pub profession: i32,
    pub race: i32,
    pub adjustments: i32,
    pub current: i32,
    /// `current - (base + class + profession + race + adjustments)`.
    pub residual: i64,
}

impl StatBreakdown {
    /// The value the rules guarantee before any free points.
    ///
    /// Summed in `i64` so sheets near the `i32` limits cannot overflow.
    pub fn floor(&self) -> i64 {
        [self.base, self.class, self.profession, self.race, self.adjustments]
            .into_iter()
            .map(i64::from)
            .sum()
    }
}

/// `granted == spent + pool`, before and after correction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreePointBalance {
    pub granted: u32,
    pub spent: u64,
    pub declared_pool: u32,
    pub corrected_pool: u32,
}

impl FreePointBalance {
    /// `granted - spent - corrected_pool`; zero when balanced.
    pub fn difference(&self) -> i64 {
        let spent = i64::try_from(self.spent).unwrap_or(i64::MAX);
        i64::from(self.granted) - spent - i64::from(self.corrected_pool)
    }
}

/// Reasons a declaration is rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A stat is lower than the rules alone guarantee.
    BelowRuleFloor { stat: Stat, floor: i64, current: i32 },
    /// More points were spent than the declared progression ever granted.
    UnexplainedAllocation { spent: u64, granted: u32 },
    /// The declared pool holds more than could remain unspent.
    PoolSurplus { declared: u32, available: u32 },
    /// A recorded progression contribution differs from its replayed value.
    SourceDrift {
        stat: Stat,
        source: StatSource,
        recorded: i32,
        expected: i32,
    },
}

impl ValidationIssue {
    /// True for stat totals that free points cannot explain.
    pub fn is_impossible_allocation(&self) -> bool {
        matches!(
            self,
            Self::BelowRuleFloor { .. } | Self::UnexplainedAllocation { .. }
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowRuleFloor {
                stat,
                floor,
                current,
            } => write!(
                f,
                "impossible allocation: {stat} is {current}, below the rule floor of {floor}"
            ),
            Self::UnexplainedAllocation { spent, granted } => write!(
                f,
                "impossible allocation: {spent} free points spent but only {granted} granted"
            ),
            Self::PoolSurplus {
                declared,
                available,
            } => write!(
                f,
                "free point pool of {declared} exceeds the {available} left unspent"
            ),
            Self::SourceDrift {
                stat,
                source,
                recorded,
                expected,
            } => write!(
                f,
                "{stat} {source} contribution is {recorded}, history replays to {expected}"
            ),
        }
    }
}

/// Non-fatal findings that were repaired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationWarning {
    PoolShortfallCorrected { declared: u32, corrected: u32 },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolShortfallCorrected {
                declared,
                corrected,
            } => write!(
                f,
                "free point pool raised from {declared} to {corrected} to cover unrecorded points"
            ),
        }
    }
}

/// Full outcome of a validation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub stats: Vec<StatBreakdown>,
    pub balance: FreePointBalance,
    pub race_level: u32,
    pub race_rank: Option<String>,
    pub issues: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn breakdown(&self, stat: Stat) -> Option<&StatBreakdown> {
        self.stats.iter().find(|entry| entry.stat == stat)
    }

    /// Pool after correction, when a shortfall was repaired.
    pub fn corrected_pool(&self) -> Option<u32> {
        self.warnings.iter().find_map(|warning| match warning {
            ValidationWarning::PoolShortfallCorrected { corrected, .. } => Some(*corrected),
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<13}{:>6}{:>7}{:>7}{:>6}{:>6}{:>8}{:>9}",
            "stat", "base", "class", "prof", "race", "adj", "current", "residual"
        )?;
        for entry in &self.stats {
            writeln!(
                f,
                "{:<13}{:>6}{:>7}{:>7}{:>6}{:>6}{:>8}{:>9}",
                entry.stat.as_ref(),
                entry.base,
                entry.class,
                entry.profession,
                entry.race,
                entry.adjustments,
                entry.current,
                entry.residual
            )?;
        }

        let balance = &self.balance;
        writeln!(
            f,
            "free points: granted {} = spent {} + pool {} (declared {})",
            balance.granted, balance.spent, balance.corrected_pool, balance.declared_pool
        )?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        for issue in &self.issues {
            writeln!(f, "error: {issue}")?;
        }
        write!(f, "verdict: {}", if self.is_valid() { "valid" } else { "invalid" })
    }
}

/// Replays declared progression and checks stats and free points against it.
pub struct ReverseEngineeringValidator<'a> {
    oracle: &'a dyn ProgressionOracle,
}

impl<'a> ReverseEngineeringValidator<'a> {
    pub fn new(oracle: &'a dyn ProgressionOracle) -> Self {
        Self { oracle }
    }

    /// Validates a before/after snapshot against its declared progression.
    ///
    /// Fails only when the declaration itself cannot be replayed.
    pub fn validate(
        &self,
        input: &ReverseEngineeringInput,
    ) -> Result<ValidationReport, ProgressionError> {
        let expected = self.replay(&input.declaration)?;
        let mut issues = Vec::new();
        let mut stats = Vec::with_capacity(Stat::COUNT);
        let mut spent: u64 = 0;

        for stat in Stat::ALL {
            let mut entry = StatBreakdown {
                stat,
                base: input.base[stat],
                class: expected.class.stats[stat],
                profession: expected.profession.stats[stat],
                race: expected.race.stats[stat],
                adjustments: input.adjustments[stat],
                current: input.current[stat],
                residual: 0,
            };
            entry.residual = i64::from(entry.current) - entry.floor();

            match u64::try_from(entry.residual) {
                Ok(points) => spent = spent.saturating_add(points),
                Err(_) => issues.push(ValidationIssue::BelowRuleFloor {
                    stat,
                    floor: entry.floor(),
                    current: entry.current,
                }),
            }
            stats.push(entry);
        }

        let granted = expected.granted();
        let mut balance = FreePointBalance {
            granted,
            spent,
            declared_pool: input.declared_pool,
            corrected_pool: input.declared_pool,
        };
        let mut warnings = Vec::new();

        // Never above `granted`, so the narrowing always fits.
        let available = u64::from(granted)
            .checked_sub(spent)
            .and_then(|left| u32::try_from(left).ok());
        match available {
            None => issues.push(ValidationIssue::UnexplainedAllocation { spent, granted }),
            Some(available) if input.declared_pool > available => {
                issues.push(ValidationIssue::PoolSurplus {
                    declared: input.declared_pool,
                    available,
                });
            }
            Some(available) if input.declared_pool < available => {
                tracing::warn!(
                    declared = input.declared_pool,
                    corrected = available,
                    "free point shortfall corrected"
                );
                balance.corrected_pool = available;
                warnings.push(ValidationWarning::PoolShortfallCorrected {
                    declared: input.declared_pool,
                    corrected: available,
                });
            }
            Some(_) => {}
        }

        let report = ValidationReport {
            stats,
            balance,
            race_level: input.declaration.race_level,
            race_rank: expected.race_rank,
            issues,
            warnings,
        };
        tracing::debug!(
            valid = report.is_valid(),
            issues = report.issues.len(),
            warnings = report.warnings.len(),
            "reverse engineering complete"
        );
        Ok(report)
    }

    /// Validates a live character's ledger against its own declared history.
    ///
    /// On top of the snapshot checks, reports every progression bucket whose
    /// recorded value drifted from what the history replays to.
    pub fn audit(
        &self,
        ledger: &StatLedger,
        levels: &LevelSystem,
    ) -> Result<ValidationReport, ProgressionError> {
        let input = ReverseEngineeringInput {
            base: ledger.source_totals(StatSource::Base),
            current: ledger.totals(),
            adjustments: ledger.source_totals(StatSource::Item)
                + ledger.source_totals(StatSource::Blessing)
                + ledger.source_totals(StatSource::Custom),
            declaration: DeclaredProgression::from_levels(levels),
            declared_pool: levels.pool().available(),
        };
        let mut report = self.validate(&input)?;

        for entry in &report.stats {
            for (source, expected) in [
                (StatSource::Class, entry.class),
                (StatSource::Profession, entry.profession),
                (StatSource::Race, entry.race),
            ] {
                let recorded = ledger.contribution(entry.stat, source);
                if recorded != expected {
                    report.issues.push(ValidationIssue::SourceDrift {
                        stat: entry.stat,
                        source,
                        recorded,
                        expected,
                    });
                }
            }
        }
        Ok(report)
    }

    fn replay(&self, declaration: &DeclaredProgression) -> Result<ExpectedGains, ProgressionError> {
        let class = replay_track(
            self.oracle,
            &declaration.thresholds,
            Track::Class,
            declaration.class.history(),
            declaration.class.level(),
        )?;
        let profession = replay_track(
            self.oracle,
            &declaration.thresholds,
            Track::Profession,
            declaration.profession.history(),
            declaration.profession.level(),
        )?;
        let race = replay_race(
            self.oracle,
            &declaration.race_history,
            0..=declaration.race_level,
            None,
        )?;

        Ok(ExpectedGains {
            class,
            profession,
            race: race.totals,
            race_rank: race.rank,
        })
    }
}

struct ExpectedGains {
    class: ReplayTotals,
    profession: ReplayTotals,
    race: ReplayTotals,
    race_rank: Option<String>,
}

impl ExpectedGains {
    fn granted(&self) -> u32 {
        self.class.free_points + self.profession.free_points + self.race.free_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{LevelGains, ProgressionTables};

    fn tables() -> ProgressionTables {
        let mut tables = ProgressionTables::new();
        tables.insert_class(
            1,
            "heavy warrior",
            LevelGains::new(
                StatBlock::ZERO
                    .with(Stat::Strength, 2)
                    .with(Stat::Vitality, 2)
                    .with(Stat::Endurance, 1)
                    .with(Stat::Toughness, 1),
                2,
            ),
        );
        tables
    }

    fn warrior_declaration(level: u32) -> DeclaredProgression {
        DeclaredProgression::new(
            TierThresholds::default(),
            TrackProgress::new(level, ProgressionHistory::starting_with("heavy warrior", 1)),
            TrackProgress::default(),
            ProgressionHistory::new(),
        )
    }

    #[test]
    fn residual_without_history_is_impossible() {
        let oracle = tables();
        let input = ReverseEngineeringInput {
            base: StatBlock::ZERO.with(Stat::Strength, 5),
            current: StatBlock::ZERO.with(Stat::Strength, 6),
            ..ReverseEngineeringInput::default()
        };

        let report = ReverseEngineeringValidator::new(&oracle).validate(&input).unwrap();

        assert_eq!(report.breakdown(Stat::Strength).unwrap().residual, 1);
        assert_eq!(report.balance.granted, 0);
        assert!(!report.is_valid());
        assert!(report.issues.iter().any(ValidationIssue::is_impossible_allocation));
    }

    #[test]
    fn stat_below_rule_floor_is_reported_per_stat() {
        let oracle = tables();
        let input = ReverseEngineeringInput {
            base: StatBlock::splat(5),
            current: StatBlock::splat(5),
            declaration: warrior_declaration(1),
            declared_pool: 2,
            ..ReverseEngineeringInput::default()
        };

        let report = ReverseEngineeringValidator::new(&oracle).validate(&input).unwrap();

        let below: Vec<Stat> = report
            .issues
            .iter()
            .filter_map(|issue| match issue {
                ValidationIssue::BelowRuleFloor { stat, .. } => Some(*stat),
                _ => None,
            })
            .collect();
        assert_eq!(
            below,
            vec![Stat::Vitality, Stat::Endurance, Stat::Strength, Stat::Toughness]
        );
    }

    #[test]
    fn shortfall_is_corrected_with_a_warning() {
        let oracle = tables();
        let class = StatBlock::ZERO
            .with(Stat::Strength, 4)
            .with(Stat::Vitality, 4)
            .with(Stat::Endurance, 2)
            .with(Stat::Toughness, 2);
        let input = ReverseEngineeringInput {
            base: StatBlock::splat(5),
            current: StatBlock::splat(5) + class + StatBlock::ZERO.with(Stat::Dexterity, 1),
            declaration: warrior_declaration(2),
            declared_pool: 0,
            ..ReverseEngineeringInput::default()
        };

        let report = ReverseEngineeringValidator::new(&oracle).validate(&input).unwrap();

        assert!(report.is_valid(), "{report}");
        assert_eq!(report.balance.spent, 1);
        assert_eq!(report.corrected_pool(), Some(3));
        assert_eq!(report.balance.difference(), 0);
    }

    #[test]
    fn pool_surplus_is_invalid() {
        let oracle = tables();
        let input = ReverseEngineeringInput {
            base: StatBlock::splat(5),
            current: StatBlock::splat(5),
            declared_pool: 1,
            ..ReverseEngineeringInput::default()
        };

        let report = ReverseEngineeringValidator::new(&oracle).validate(&input).unwrap();
        assert_eq!(
            report.issues,
            vec![ValidationIssue::PoolSurplus {
                declared: 1,
                available: 0
            }]
        );
        assert!(report.to_string().ends_with("verdict: invalid"));
    }

    #[test]
    fn extreme_sheet_values_are_reported_not_overflowed() {
        let oracle = tables();
        let validator = ReverseEngineeringValidator::new(&oracle);

        let inflated = ReverseEngineeringInput {
            current: StatBlock::splat(1_000_000_000),
            ..ReverseEngineeringInput::default()
        };
        let report = validator.validate(&inflated).unwrap();
        assert_eq!(report.balance.spent, 9_000_000_000);
        assert_eq!(
            report.issues,
            vec![ValidationIssue::UnexplainedAllocation {
                spent: 9_000_000_000,
                granted: 0
            }]
        );

        let saturated = ReverseEngineeringInput {
            base: StatBlock::splat(2_000_000_000),
            current: StatBlock::splat(2_000_000_000),
            adjustments: StatBlock::splat(2_000_000_000),
            ..ReverseEngineeringInput::default()
        };
        let report = validator.validate(&saturated).unwrap();
        assert_eq!(report.issues.len(), Stat::COUNT);
        assert!(report.issues.iter().all(|issue| matches!(
            issue,
            ValidationIssue::BelowRuleFloor {
                floor: 4_000_000_000,
                current: 2_000_000_000,
                ..
            }
        )));
        assert_eq!(
            report.breakdown(Stat::Wisdom).map(|entry| entry.residual),
            Some(-2_000_000_000)
        );
    }

    #[test]
    fn unknown_declared_class_is_an_error() {
        let oracle = tables();
        let input = ReverseEngineeringInput {
            declaration: DeclaredProgression::new(
                TierThresholds::default(),
                TrackProgress::new(1, ProgressionHistory::starting_with("bard", 1)),
                TrackProgress::default(),
                ProgressionHistory::new(),
            ),
            ..ReverseEngineeringInput::default()
        };
        assert!(ReverseEngineeringValidator::new(&oracle).validate(&input).is_err());
    }
}
