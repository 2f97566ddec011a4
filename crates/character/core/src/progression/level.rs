//! Level system - class/profession leveling, race derivation and replay.
//!
//! The race level is never set directly: it is `(class + profession) / 2`,
//! recomputed after every class or profession level and applied one race level
//! at a time. Retroactive changes (a new class from some level, a new race, new
//! tier thresholds) reset the affected ledger sources and replay the declared
//! history from scratch.
//!
//! Every public operation stages its work on copies of the system and ledger and
//! commits only on success, so a failed call leaves both untouched.

use std::collections::VecDeque;

use rand::Rng;

use crate::error::{EngineError, ErrorSeverity};
use crate::stats::{LedgerError, Stat, StatBlock, StatLedger, StatSource};
use crate::tables::{ProgressionOracle, TableError, normalize_name};

use super::history::{HistoryEntry, ProgressionHistory, Track};
use super::pool::{AllocationError, FreePointPool};
use super::replay::{self, ReplayTotals};
use super::tier::TierThresholds;

/// Errors raised by progression operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("invalid level type '{kind}', expected class or profession")]
    InvalidTrack { kind: String },

    #[error("{track} is already at level {current}, cannot level to {target}")]
    TargetNotAbove {
        track: Track,
        current: u32,
        target: u32,
    },

    #[error("no {track} declared for level {level}")]
    MissingName { track: Track, level: u32 },

    #[error("{track} choice for level {level} was declined")]
    ChoiceDeclined { track: Track, level: u32 },

    #[error("'{name}' is not a valid {track} for level {level}")]
    ChoiceRejected {
        track: Track,
        level: u32,
        name: String,
    },

    #[error("change would revoke {revoked} free points but only {available} are unspent")]
    PoolOverdrawn { revoked: u32, available: u32 },

    #[error("{track} changes must take effect at level 1 or later, got {level}")]
    InvalidEffectiveLevel { track: Track, level: u32 },

    #[error("'{key}' is derived and cannot be set directly")]
    DerivedField { key: String },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

impl EngineError for ProgressionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Table(inner) => inner.severity(),
            Self::Ledger(inner) => inner.severity(),
            Self::Allocation(inner) => inner.severity(),
            Self::MissingName { .. } => ErrorSeverity::Internal,
            Self::InvalidTrack { .. }
            | Self::TargetNotAbove { .. }
            | Self::ChoiceDeclined { .. }
            | Self::ChoiceRejected { .. }
            | Self::PoolOverdrawn { .. }
            | Self::InvalidEffectiveLevel { .. }
            | Self::DerivedField { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTrack { .. } => "PROGRESSION_INVALID_TRACK",
            Self::TargetNotAbove { .. } => "PROGRESSION_TARGET_NOT_ABOVE",
            Self::MissingName { .. } => "PROGRESSION_MISSING_NAME",
            Self::ChoiceDeclined { .. } => "PROGRESSION_CHOICE_DECLINED",
            Self::ChoiceRejected { .. } => "PROGRESSION_CHOICE_REJECTED",
            Self::PoolOverdrawn { .. } => "PROGRESSION_POOL_OVERDRAWN",
            Self::InvalidEffectiveLevel { .. } => "PROGRESSION_INVALID_EFFECTIVE_LEVEL",
            Self::DerivedField { .. } => "PROGRESSION_DERIVED_FIELD",
            Self::Table(inner) => inner.error_code(),
            Self::Ledger(inner) => inner.error_code(),
            Self::Allocation(inner) => inner.error_code(),
        }
    }
}

// ============================================================================
// Tier choice
// ============================================================================

/// A pending request for a class or profession name.
///
/// Raised when a level has no declared name: level 1 of an empty history, or a
/// tier threshold without an entry starting there. No gains for `level` are
/// applied until a valid name is supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierChoiceRequest {
    pub track: Track,
    pub level: u32,
    pub tier: u32,
    /// Name in effect for the previous level, if any.
    pub previous: Option<String>,
    /// Names valid at `tier`.
    pub options: Vec<String>,
    /// Answers already rejected for this request.
    pub rejected: Vec<String>,
}

/// Synchronous source of tier-crossing choices.
///
/// Returning `None` declines, which aborts and rolls back the whole operation.
pub trait TierChoiceProvider {
    fn choose(&mut self, request: &TierChoiceRequest) -> Option<String>;
}

impl<F> TierChoiceProvider for F
where
    F: FnMut(&TierChoiceRequest) -> Option<String>,
{
    fn choose(&mut self, request: &TierChoiceRequest) -> Option<String> {
        self(request)
    }
}

/// Answers requests from a fixed queue, in order.
#[derive(Clone, Debug, Default)]
pub struct ScriptedChoices {
    answers: VecDeque<String>,
}

impl ScriptedChoices {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl TierChoiceProvider for ScriptedChoices {
    fn choose(&mut self, _request: &TierChoiceRequest) -> Option<String> {
        self.answers.pop_front()
    }
}

/// Declines every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoChoices;

impl TierChoiceProvider for NoChoices {
    fn choose(&mut self, _request: &TierChoiceRequest) -> Option<String> {
        None
    }
}

// ============================================================================
// Progress state
// ============================================================================

/// Level, history and granted free points of one track.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackProgress {
    level: u32,
    history: ProgressionHistory,
    granted: u32,
}

impl TrackProgress {
    pub fn new(level: u32, history: ProgressionHistory) -> Self {
        Self {
            level,
            history,
            granted: 0,
        }
    }

    /// Rebuilds persisted progress without replaying it.
    pub fn restored(level: u32, history: ProgressionHistory, granted: u32) -> Self {
        Self {
            level,
            history,
            granted,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn history(&self) -> &ProgressionHistory {
        &self.history
    }

    /// Name in effect at the current level.
    pub fn name(&self) -> Option<&str> {
        self.history
            .name_at(self.level.max(1))
            .or_else(|| self.history.current())
    }

    /// Free points granted by this track so far.
    pub fn granted(&self) -> u32 {
        self.granted
    }
}

/// Derived race level, rank and race history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RaceProgress {
    level: u32,
    rank: Option<String>,
    history: ProgressionHistory,
    granted: u32,
}

impl RaceProgress {
    pub fn new(history: ProgressionHistory) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    /// Rebuilds persisted race state; level and rank are trusted as given.
    pub fn restored(
        level: u32,
        rank: Option<String>,
        history: ProgressionHistory,
        granted: u32,
    ) -> Self {
        Self {
            level,
            rank,
            history,
            granted,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn rank(&self) -> Option<&str> {
        self.rank.as_deref()
    }

    pub fn history(&self) -> &ProgressionHistory {
        &self.history
    }

    /// Race in effect at the current race level.
    pub fn name(&self) -> Option<&str> {
        self.history
            .name_at(self.level)
            .or_else(|| self.history.current())
    }

    pub fn granted(&self) -> u32 {
        self.granted
    }
}

/// Outcome of one `level_up` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelUpSummary {
    pub track: Option<Track>,
    pub from_level: u32,
    pub to_level: u32,
    pub race_from: u32,
    pub race_to: u32,
    /// Stat gains from the track and from race levels crossed on the way.
    pub stats: StatBlock,
    pub free_points: u32,
    /// Names chosen at tier crossings.
    pub choices: Vec<HistoryEntry>,
}

// ============================================================================
// Level system
// ============================================================================

/// Class, profession and race progression of one character.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelSystem {
    thresholds: TierThresholds,
    class: TrackProgress,
    profession: TrackProgress,
    race: RaceProgress,
    pool: FreePointPool,
}

impl LevelSystem {
    /// A level-0 system with no names declared.
    pub fn new(thresholds: TierThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    /// Declares histories and levels; call [`LevelSystem::replay_all`] to book them.
    pub fn with_progress(
        thresholds: TierThresholds,
        class: TrackProgress,
        profession: TrackProgress,
        race_history: ProgressionHistory,
    ) -> Self {
        Self {
            thresholds,
            class,
            profession,
            race: RaceProgress::new(race_history),
            pool: FreePointPool::default(),
        }
    }

    /// Reassembles persisted state verbatim.
    pub(crate) fn restore(
        thresholds: TierThresholds,
        class: TrackProgress,
        profession: TrackProgress,
        race: RaceProgress,
        pool: FreePointPool,
    ) -> Self {
        Self {
            thresholds,
            class,
            profession,
            race,
            pool,
        }
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    pub fn track(&self, track: Track) -> &TrackProgress {
        match track {
            Track::Class => &self.class,
            Track::Profession => &self.profession,
        }
    }

    fn track_mut(&mut self, track: Track) -> &mut TrackProgress {
        match track {
            Track::Class => &mut self.class,
            Track::Profession => &mut self.profession,
        }
    }

    pub fn level(&self, track: Track) -> u32 {
        self.track(track).level
    }

    /// Tier of the track's current level.
    pub fn tier(&self, track: Track) -> u32 {
        self.thresholds.tier_for_level(self.level(track))
    }

    pub fn race(&self) -> &RaceProgress {
        &self.race
    }

    pub fn race_level(&self) -> u32 {
        self.race.level
    }

    pub fn pool(&self) -> &FreePointPool {
        &self.pool
    }

    pub(crate) fn pool_mut(&mut self) -> &mut FreePointPool {
        &mut self.pool
    }

    /// `(class level + profession level) / 2`, rounded down.
    pub fn derived_race_level(&self) -> u32 {
        (self.class.level + self.profession.level) / 2
    }

    /// Free points granted by every track and race level so far.
    pub fn total_granted(&self) -> u32 {
        self.class.granted + self.profession.granted + self.race.granted
    }

    /// Levels `track` up to `target`, one level at a time.
    ///
    /// Each level books its table gains, grants its free points and then
    /// applies any race levels newly reached. Tier crossings without a declared
    /// name ask `chooser`.
    pub fn level_up(
        &mut self,
        ledger: &mut StatLedger,
        oracle: &dyn ProgressionOracle,
        track: Track,
        target: u32,
        chooser: &mut dyn TierChoiceProvider,
    ) -> Result<LevelUpSummary, ProgressionError> {
        let current = self.level(track);
        if target <= current {
            return Err(ProgressionError::TargetNotAbove {
                track,
                current,
                target,
            });
        }

        let mut staged = self.clone();
        let mut staged_ledger = ledger.clone();
        let summary = staged.advance(&mut staged_ledger, oracle, track, target, chooser)?;
        staged_ledger.ensure_non_negative()?;

        *self = staged;
        *ledger = staged_ledger;
        tracing::info!(
            %track,
            from = summary.from_level,
            to = summary.to_level,
            race_level = summary.race_to,
            free_points = summary.free_points,
            "level up complete"
        );
        Ok(summary)
    }

    fn advance(
        &mut self,
        ledger: &mut StatLedger,
        oracle: &dyn ProgressionOracle,
        track: Track,
        target: u32,
        chooser: &mut dyn TierChoiceProvider,
    ) -> Result<LevelUpSummary, ProgressionError> {
        let mut summary = LevelUpSummary {
            track: Some(track),
            from_level: self.level(track),
            to_level: target,
            race_from: self.race.level,
            ..LevelUpSummary::default()
        };

        for level in summary.from_level + 1..=target {
            let tier = self.thresholds.tier_for_level(level);
            if self.needs_choice(track, level) {
                let name = self.request_choice(oracle, track, level, tier, chooser)?;
                self.track_mut(track).history.supersede(&name, level);
                summary.choices.push(HistoryEntry {
                    name,
                    from_level: level,
                });
            }

            let gains = {
                let name = self
                    .track(track)
                    .history
                    .name_at(level)
                    .ok_or(ProgressionError::MissingName { track, level })?;
                oracle.track_gains(track, tier, name)?
            };
            ledger.apply_block(track.source(), &gains.stats)?;
            self.pool.grant(gains.free_points);

            let progress = self.track_mut(track);
            progress.granted += gains.free_points;
            progress.level = level;
            tracing::debug!(%track, level, tier, free_points = gains.free_points, "level applied");

            let race = self.sync_race(ledger, oracle)?;
            summary.stats += gains.stats + race.stats;
            summary.free_points += gains.free_points + race.free_points;
        }

        summary.race_to = self.race.level;
        Ok(summary)
    }

    fn needs_choice(&self, track: Track, level: u32) -> bool {
        let history = &self.track(track).history;
        history.starts_at(level).is_none()
            && (history.name_at(level).is_none() || self.thresholds.is_threshold(level))
    }

    fn request_choice(
        &self,
        oracle: &dyn ProgressionOracle,
        track: Track,
        level: u32,
        tier: u32,
        chooser: &mut dyn TierChoiceProvider,
    ) -> Result<String, ProgressionError> {
        let mut request = TierChoiceRequest {
            track,
            level,
            tier,
            previous: self
                .track(track)
                .history
                .name_at(level.saturating_sub(1))
                .map(String::from),
            options: oracle.track_options(track, tier),
            rejected: Vec::new(),
        };

        loop {
            let Some(answer) = chooser.choose(&request) else {
                tracing::warn!(%track, level, "tier choice declined");
                return Err(ProgressionError::ChoiceDeclined { track, level });
            };
            let answer = normalize_name(&answer);

            match oracle.track_gains(track, tier, &answer) {
                Ok(_) => {
                    tracing::info!(%track, level, tier, name = %answer, "tier choice accepted");
                    return Ok(answer);
                }
                Err(TableError::UnknownClass { .. } | TableError::UnknownProfession { .. })
                    if !request.rejected.contains(&answer) =>
                {
                    tracing::warn!(%track, level, tier, name = %answer, "tier choice rejected");
                    request.rejected.push(answer);
                }
                Err(TableError::UnknownClass { .. } | TableError::UnknownProfession { .. }) => {
                    return Err(ProgressionError::ChoiceRejected {
                        track,
                        level,
                        name: answer,
                    });
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Applies race levels between the stored and the derived race level.
    fn sync_race(
        &mut self,
        ledger: &mut StatLedger,
        oracle: &dyn ProgressionOracle,
    ) -> Result<ReplayTotals, ProgressionError> {
        let target = self.derived_race_level();
        let current = self.race.level;
        if target <= current {
            return Ok(ReplayTotals::default());
        }

        let replay = replay::replay_race(
            oracle,
            &self.race.history,
            current + 1..=target,
            self.race.rank.clone(),
        )?;
        ledger.apply_block(StatSource::Race, &replay.totals.stats)?;
        self.pool.grant(replay.totals.free_points);
        self.race.granted += replay.totals.free_points;
        self.race.rank = replay.rank;
        self.race.level = target;
        tracing::debug!(from = current, to = target, "race level derived");
        Ok(replay.totals)
    }

    /// Declares `name` for `track` from `effective_level` on and replays the track.
    pub fn change_track(
        &mut self,
        ledger: &mut StatLedger,
        oracle: &dyn ProgressionOracle,
        track: Track,
        name: &str,
        effective_level: u32,
    ) -> Result<(), ProgressionError> {
        if effective_level == 0 {
            return Err(ProgressionError::InvalidEffectiveLevel {
                track,
                level: effective_level,
            });
        }
        oracle.track_gains(track, self.thresholds.tier_for_level(effective_level), name)?;

        self.staged(ledger, |system, ledger| {
            system.track_mut(track).history.supersede(name, effective_level);
            system.replay_track(ledger, oracle, track)
        })?;
        tracing::info!(%track, name, effective_level, "progression changed");
        Ok(())
    }

    /// Declares `race` from race level `effective_level` on and replays race gains.
    pub fn change_race(
        &mut self,
        ledger: &mut StatLedger,
        oracle: &dyn ProgressionOracle,
        race: &str,
        effective_level: u32,
    ) -> Result<(), ProgressionError> {
        oracle.race_table(race)?;

        self.staged(ledger, |system, ledger| {
            system.race.history.supersede(race, effective_level);
            system.replay_race(ledger, oracle)
        })?;
        tracing::info!(race, effective_level, "race changed");
        Ok(())
    }

    /// Adopts new tier thresholds and replays both tracks under them.
    pub fn set_thresholds(
        &mut self,
        ledger: &mut StatLedger,
        oracle: &dyn ProgressionOracle,
        thresholds: TierThresholds,
    ) -> Result<(), ProgressionError> {
        self.staged(ledger, |system, ledger| {
            system.thresholds = thresholds;
            system.replay_track(ledger, oracle, Track::Class)?;
            system.replay_track(ledger, oracle, Track::Profession)
        })
    }

    /// Rebuilds every progression source from the declared histories.
    ///
    /// The race level is re-derived from the track levels first.
    pub fn replay_all(
        &mut self,
        ledger: &mut StatLedger,
        oracle: &dyn ProgressionOracle,
    ) -> Result<(), ProgressionError> {
        self.staged(ledger, |system, ledger| {
            system.replay_track(ledger, oracle, Track::Class)?;
            system.replay_track(ledger, oracle, Track::Profession)?;
            system.race.level = system.derived_race_level();
            system.replay_race(ledger, oracle)
        })
    }

    fn staged<F>(&mut self, ledger: &mut StatLedger, operation: F) -> Result<(), ProgressionError>
    where
        F: FnOnce(&mut Self, &mut StatLedger) -> Result<(), ProgressionError>,
    {
        let mut staged = self.clone();
        let mut staged_ledger = ledger.clone();
        operation(&mut staged, &mut staged_ledger)?;
        staged_ledger.ensure_non_negative()?;

        *self = staged;
        *ledger = staged_ledger;
        Ok(())
    }

    fn replay_track(
        &mut self,
        ledger: &mut StatLedger,
        oracle: &dyn ProgressionOracle,
        track: Track,
    ) -> Result<(), ProgressionError> {
        let progress = self.track(track);
        let totals = replay::replay_track(
            oracle,
            &self.thresholds,
            track,
            &progress.history,
            progress.level,
        )?;
        let previously = progress.granted;

        ledger.reset_source_everywhere(track.source());
        ledger.apply_block(track.source(), &totals.stats)?;
        self.rebalance_pool(previously, totals.free_points)?;
        self.track_mut(track).granted = totals.free_points;
        tracing::debug!(%track, level = self.level(track), "track replayed");
        Ok(())
    }

    fn replay_race(
        &mut self,
        ledger: &mut StatLedger,
        oracle: &dyn ProgressionOracle,
    ) -> Result<(), ProgressionError> {
        let replay = replay::replay_race(oracle, &self.race.history, 0..=self.race.level, None)?;
        let previously = self.race.granted;

        ledger.reset_source_everywhere(StatSource::Race);
        ledger.apply_block(StatSource::Race, &replay.totals.stats)?;
        self.rebalance_pool(previously, replay.totals.free_points)?;
        self.race.granted = replay.totals.free_points;
        self.race.rank = replay.rank;
        tracing::debug!(level = self.race.level, "race replayed");
        Ok(())
    }

    fn rebalance_pool(&mut self, previously: u32, now: u32) -> Result<(), ProgressionError> {
        if now >= previously {
            self.pool.grant(now - previously);
            return Ok(());
        }
        let revoked = previously - now;
        self.pool
            .revoke(revoked)
            .ok_or(ProgressionError::PoolOverdrawn {
                revoked,
                available: self.pool.available(),
            })
    }

    /// Spends free points on one stat.
    pub fn allocate(
        &mut self,
        ledger: &mut StatLedger,
        stat: Stat,
        amount: i32,
    ) -> Result<u32, AllocationError> {
        self.pool.allocate(ledger, stat, amount)
    }

    /// Spends the whole pool one point at a time on random stats.
    pub fn allocate_random_all<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut StatLedger,
        rng: &mut R,
    ) -> Result<StatBlock, AllocationError> {
        self.pool.allocate_random_all(ledger, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{LevelGains, ProgressionTables, RaceRank, RaceTable};

    fn gains(pairs: &[(Stat, i32)], free_points: u32) -> LevelGains {
        LevelGains::new(StatBlock::from_pairs(pairs.iter().copied()), free_points)
    }

    fn tables() -> ProgressionTables {
        let mut tables = ProgressionTables::new();
        tables
            .insert_class(
                1,
                "heavy warrior",
                gains(
                    &[
                        (Stat::Strength, 2),
                        (Stat::Vitality, 2),
                        (Stat::Endurance, 1),
                        (Stat::Toughness, 1),
                    ],
                    2,
                ),
            )
            .insert_class(1, "mage", gains(&[(Stat::Intelligence, 2)], 2))
            .insert_class(2, "spearman", gains(&[(Stat::Strength, 5)], 4))
            .insert_profession(1, "gatherer", gains(&[(Stat::Perception, 2)], 2));
        let human = RaceTable::new(
            "human",
            vec![RaceRank {
                min_level: 0,
                max_level: 1000,
                rank: "G".into(),
                gains: gains(&[(Stat::Wisdom, 1)], 1),
            }],
        )
        .unwrap();
        tables.insert_race("human", human);
        tables
    }

    fn ledger() -> StatLedger {
        StatLedger::new(StatBlock::splat(5)).unwrap()
    }

    fn system_with_class(class: &str) -> LevelSystem {
        LevelSystem::with_progress(
            TierThresholds::default(),
            TrackProgress::new(0, ProgressionHistory::starting_with(class, 1)),
            TrackProgress::default(),
            ProgressionHistory::new(),
        )
    }

    #[test]
    fn target_must_be_above_current() {
        let mut system = system_with_class("mage");
        let mut ledger = ledger();
        let err = system
            .level_up(&mut ledger, &tables(), Track::Class, 0, &mut NoChoices)
            .unwrap_err();
        assert!(matches!(err, ProgressionError::TargetNotAbove { .. }));
    }

    #[test]
    fn level_one_without_a_class_asks_for_one() {
        let mut system = LevelSystem::new(TierThresholds::default());
        let mut ledger = ledger();
        let mut asked = Vec::new();
        let mut chooser = |request: &TierChoiceRequest| {
            asked.push((request.level, request.options.clone()));
            Some("Mage".to_string())
        };

        system
            .level_up(&mut ledger, &tables(), Track::Class, 2, &mut chooser)
            .unwrap();

        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0].0, 1);
        assert!(asked[0].1.contains(&"heavy warrior".to_string()));
        assert_eq!(system.track(Track::Class).name(), Some("mage"));
        assert_eq!(ledger.contribution(Stat::Intelligence, StatSource::Class), 4);
    }

    #[test]
    fn declined_choice_rolls_back() {
        let mut system = system_with_class("heavy warrior");
        let mut ledger = ledger();
        let before = (system.clone(), ledger.clone());

        let err = system
            .level_up(&mut ledger, &tables(), Track::Class, 30, &mut NoChoices)
            .unwrap_err();

        assert_eq!(err, ProgressionError::ChoiceDeclined { track: Track::Class, level: 25 });
        assert_eq!((system, ledger), before);
    }

    #[test]
    fn invalid_choice_is_asked_again() {
        let mut system = system_with_class("heavy warrior");
        let mut ledger = ledger();
        let mut chooser = ScriptedChoices::new(["archmage", "spearman"]);

        let summary = system
            .level_up(&mut ledger, &tables(), Track::Class, 25, &mut chooser)
            .unwrap();

        assert_eq!(summary.choices.len(), 1);
        assert_eq!(summary.choices[0].name, "spearman");
        assert_eq!(system.tier(Track::Class), 2);
        assert_eq!(ledger.contribution(Stat::Strength, StatSource::Class), 24 * 2 + 5);
    }

    #[test]
    fn repeated_invalid_choice_fails() {
        let mut system = system_with_class("heavy warrior");
        let mut ledger = ledger();
        let mut chooser = |_: &TierChoiceRequest| Some("archmage".to_string());

        let err = system
            .level_up(&mut ledger, &tables(), Track::Class, 25, &mut chooser)
            .unwrap_err();
        assert!(matches!(err, ProgressionError::ChoiceRejected { level: 25, .. }));
        assert_eq!(system.level(Track::Class), 0);
    }

    #[test]
    fn race_follows_track_levels() {
        let mut system = LevelSystem::with_progress(
            TierThresholds::default(),
            TrackProgress::new(0, ProgressionHistory::starting_with("mage", 1)),
            TrackProgress::new(0, ProgressionHistory::starting_with("gatherer", 1)),
            ProgressionHistory::starting_with("human", 0),
        );
        let mut ledger = ledger();
        let oracle = tables();

        system
            .level_up(&mut ledger, &oracle, Track::Class, 3, &mut NoChoices)
            .unwrap();
        assert_eq!(system.race_level(), 1);
        let summary = system
            .level_up(&mut ledger, &oracle, Track::Profession, 3, &mut NoChoices)
            .unwrap();

        assert_eq!((summary.race_from, summary.race_to), (1, 3));
        assert_eq!(system.race_level(), system.derived_race_level());
        assert_eq!(ledger.contribution(Stat::Wisdom, StatSource::Race), 3);
        assert_eq!(system.race().rank(), Some("G"));
        assert_eq!(system.pool().available(), 3 * 2 + 3 * 2 + 3);
        assert_eq!(system.total_granted(), system.pool().available());
    }

    #[test]
    fn change_track_replays_history() {
        let mut system = system_with_class("heavy warrior");
        let mut ledger = ledger();
        let oracle = tables();
        system
            .level_up(&mut ledger, &oracle, Track::Class, 4, &mut NoChoices)
            .unwrap();

        system
            .change_track(&mut ledger, &oracle, Track::Class, "mage", 3)
            .unwrap();

        assert_eq!(ledger.contribution(Stat::Strength, StatSource::Class), 4);
        assert_eq!(ledger.contribution(Stat::Intelligence, StatSource::Class), 4);
        assert_eq!(ledger.current(Stat::Strength), 9);
        assert_eq!(system.pool().available(), 8);
    }

    #[test]
    fn change_track_cannot_revoke_spent_points() {
        let mut tables = tables();
        tables.insert_class(1, "squire", gains(&[(Stat::Strength, 1)], 0));
        let mut system = system_with_class("heavy warrior");
        let mut ledger = ledger();
        system
            .level_up(&mut ledger, &tables, Track::Class, 2, &mut NoChoices)
            .unwrap();
        system.allocate(&mut ledger, Stat::Dexterity, 3).unwrap();
        let before = (system.clone(), ledger.clone());

        let err = system
            .change_track(&mut ledger, &tables, Track::Class, "squire", 1)
            .unwrap_err();
        assert_eq!(err, ProgressionError::PoolOverdrawn { revoked: 4, available: 1 });
        assert_eq!((system, ledger), before);
    }

    #[test]
    fn change_track_validates_name_and_level() {
        let mut system = system_with_class("heavy warrior");
        let mut ledger = ledger();
        let oracle = tables();

        assert!(matches!(
            system.change_track(&mut ledger, &oracle, Track::Class, "spearman", 1),
            Err(ProgressionError::Table(TableError::UnknownClass { tier: 1, .. }))
        ));
        assert!(matches!(
            system.change_track(&mut ledger, &oracle, Track::Class, "mage", 0),
            Err(ProgressionError::InvalidEffectiveLevel { .. })
        ));
    }

    #[test]
    fn change_race_replaces_race_gains() {
        let mut oracle = tables();
        let elf = RaceTable::new(
            "elf",
            vec![RaceRank {
                min_level: 0,
                max_level: 50,
                rank: "E".into(),
                gains: gains(&[(Stat::Dexterity, 2)], 0),
            }],
        )
        .unwrap();
        oracle.insert_race("elf", elf);

        let mut system = LevelSystem::with_progress(
            TierThresholds::default(),
            TrackProgress::new(4, ProgressionHistory::starting_with("mage", 1)),
            TrackProgress::default(),
            ProgressionHistory::starting_with("human", 0),
        );
        let mut ledger = ledger();
        system.replay_all(&mut ledger, &oracle).unwrap();
        assert_eq!(ledger.contribution(Stat::Wisdom, StatSource::Race), 2);
        assert_eq!(system.pool().available(), 4 * 2 + 2);

        system.change_race(&mut ledger, &oracle, "elf", 0).unwrap();
        assert_eq!(ledger.contribution(Stat::Wisdom, StatSource::Race), 0);
        assert_eq!(ledger.contribution(Stat::Dexterity, StatSource::Race), 4);
        assert_eq!(system.race().rank(), Some("E"));
        assert_eq!(system.pool().available(), 4 * 2);

        assert!(matches!(
            system.change_race(&mut ledger, &oracle, "dwarf", 0),
            Err(ProgressionError::Table(TableError::UnknownRace { .. }))
        ));
    }

    #[test]
    fn new_thresholds_replay_under_new_tiers() {
        let mut system = system_with_class("heavy warrior");
        let mut ledger = ledger();
        let oracle = tables();
        system
            .level_up(&mut ledger, &oracle, Track::Class, 3, &mut NoChoices)
            .unwrap();

        // Level 3 would move to tier 2, where heavy warrior is undefined.
        let err = system
            .set_thresholds(&mut ledger, &oracle, TierThresholds::new(vec![3]).unwrap())
            .unwrap_err();
        assert!(matches!(err, ProgressionError::Table(TableError::UnknownClass { tier: 2, .. })));
        assert_eq!(system.thresholds(), &TierThresholds::default());

        system
            .set_thresholds(&mut ledger, &oracle, TierThresholds::new(vec![10]).unwrap())
            .unwrap();
        assert_eq!(system.thresholds().as_slice(), &[10]);
        assert_eq!(ledger.contribution(Stat::Strength, StatSource::Class), 6);
    }
}
