//! Character aggregate - one ledger, one level system, one health state.
//!
//! Every stat-affecting operation goes through here so health is recomputed
//! with the right [`RecomputeReason`] after each mutation.

use core::fmt;

use rand::Rng;

use crate::config::EngineConfig;
use crate::error::{EngineError, ErrorSeverity};
use crate::progression::{
    AllocationError, LevelSystem, LevelUpSummary, ProgressionError, ProgressionHistory,
    TierChoiceProvider, TierThresholds, Track, TrackProgress,
};
use crate::stats::{
    HealthState, LedgerError, ModifierCurve, RecomputeReason, Stat, StatBlock, StatLedger,
    StatSource,
};
use crate::tables::{ProgressionOracle, TableError};
use crate::validator::{ReverseEngineeringValidator, ValidationReport};

/// Errors raised by character operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CharacterError {
    #[error("unknown meta attribute '{key}'")]
    UnknownMetaKey { key: String },

    #[error("invalid value '{value}' for {key}")]
    InvalidMetaValue { key: MetaKey, value: String },

    #[error("item '{name}' is already equipped")]
    ItemAlreadyEquipped { name: String },

    #[error("item '{name}' is not equipped")]
    ItemNotEquipped { name: String },

    #[error(transparent)]
    Progression(#[from] ProgressionError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Table(#[from] TableError),
}

impl EngineError for CharacterError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Progression(inner) => inner.severity(),
            Self::Allocation(inner) => inner.severity(),
            Self::Ledger(inner) => inner.severity(),
            Self::Table(inner) => inner.severity(),
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownMetaKey { .. } => "CHARACTER_UNKNOWN_META_KEY",
            Self::InvalidMetaValue { .. } => "CHARACTER_INVALID_META_VALUE",
            Self::ItemAlreadyEquipped { .. } => "CHARACTER_ITEM_ALREADY_EQUIPPED",
            Self::ItemNotEquipped { .. } => "CHARACTER_ITEM_NOT_EQUIPPED",
            Self::Progression(inner) => inner.error_code(),
            Self::Allocation(inner) => inner.error_code(),
            Self::Ledger(inner) => inner.error_code(),
            Self::Table(inner) => inner.error_code(),
        }
    }
}

/// Meta attributes of a character.
///
/// `RaceLevel` and `RaceRank` are derived and can only be read.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum MetaKey {
    #[strum(serialize = "Class")]
    Class,
    #[strum(serialize = "Class level")]
    ClassLevel,
    #[strum(serialize = "Profession")]
    Profession,
    #[strum(serialize = "Profession level")]
    ProfessionLevel,
    #[strum(serialize = "Race")]
    Race,
    #[strum(serialize = "Race level")]
    RaceLevel,
    #[strum(serialize = "Race rank")]
    RaceRank,
}

impl MetaKey {
    pub const ALL: [MetaKey; 7] = [
        MetaKey::Class,
        MetaKey::ClassLevel,
        MetaKey::Profession,
        MetaKey::ProfessionLevel,
        MetaKey::Race,
        MetaKey::RaceLevel,
        MetaKey::RaceRank,
    ];

    pub const fn is_derived(self) -> bool {
        matches!(self, Self::RaceLevel | Self::RaceRank)
    }

    pub fn lookup(key: &str) -> Result<Self, CharacterError> {
        key.trim()
            .parse()
            .map_err(|_| CharacterError::UnknownMetaKey {
                key: key.to_string(),
            })
    }
}

/// An equippable item and the stats it grants while worn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub description: String,
    pub stats: StatBlock,
}

/// The single active blessing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blessing {
    pub name: String,
    pub stats: StatBlock,
}

/// A playable character.
#[derive(Clone, Debug, PartialEq)]
pub struct Character {
    name: String,
    ledger: StatLedger,
    levels: LevelSystem,
    health: HealthState,
    equipped: Vec<Item>,
    blessing: Option<Blessing>,
}

impl Character {
    /// A level-0 character with the given base stats and default thresholds.
    pub fn new(name: impl Into<String>, base: StatBlock) -> Result<Self, CharacterError> {
        let ledger = StatLedger::new(base)?;
        Ok(Self::assemble(
            name.into(),
            ledger,
            LevelSystem::new(TierThresholds::default()),
        ))
    }

    pub fn builder(name: impl Into<String>) -> CharacterBuilder {
        CharacterBuilder::new(name)
    }

    fn assemble(name: String, ledger: StatLedger, levels: LevelSystem) -> Self {
        let health = HealthState::new(ledger.modifier(Stat::Vitality));
        Self {
            name,
            ledger,
            levels,
            health,
            equipped: Vec::new(),
            blessing: None,
        }
    }

    /// Reassembles a persisted character without consulting the rule tables.
    pub(crate) fn restore(
        name: String,
        ledger: StatLedger,
        levels: LevelSystem,
        health: HealthState,
        blessing: Option<String>,
    ) -> Self {
        let blessing = blessing.map(|name| Blessing {
            name,
            stats: ledger.source_totals(StatSource::Blessing),
        });
        Self {
            name,
            ledger,
            levels,
            health,
            equipped: Vec::new(),
            blessing,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ledger(&self) -> &StatLedger {
        &self.ledger
    }

    pub fn levels(&self) -> &LevelSystem {
        &self.levels
    }

    pub fn health(&self) -> &HealthState {
        &self.health
    }

    pub fn equipped(&self) -> &[Item] {
        &self.equipped
    }

    pub fn blessing(&self) -> Option<&Blessing> {
        self.blessing.as_ref()
    }

    pub fn stat(&self, stat: Stat) -> i32 {
        self.ledger.current(stat)
    }

    pub fn modifier(&self, stat: Stat) -> i32 {
        self.ledger.modifier(stat)
    }

    pub fn free_points(&self) -> u32 {
        self.levels.pool().available()
    }

    /// Current value of a meta attribute as displayed and persisted.
    pub fn meta(&self, key: MetaKey) -> Option<String> {
        match key {
            MetaKey::Class => self.levels.track(Track::Class).name().map(String::from),
            MetaKey::ClassLevel => Some(self.levels.level(Track::Class).to_string()),
            MetaKey::Profession => self
                .levels
                .track(Track::Profession)
                .name()
                .map(String::from),
            MetaKey::ProfessionLevel => Some(self.levels.level(Track::Profession).to_string()),
            MetaKey::Race => self.levels.race().name().map(String::from),
            MetaKey::RaceLevel => Some(self.levels.race_level().to_string()),
            MetaKey::RaceRank => self.levels.race().rank().map(String::from),
        }
    }

    fn refresh_health(&mut self, reason: RecomputeReason) {
        self.health
            .recompute(self.ledger.modifier(Stat::Vitality), reason);
    }

    // ------------------------------------------------------------------------
    // Progression
    // ------------------------------------------------------------------------

    pub fn level_up(
        &mut self,
        oracle: &dyn ProgressionOracle,
        track: Track,
        target: u32,
        chooser: &mut dyn TierChoiceProvider,
    ) -> Result<LevelUpSummary, CharacterError> {
        let summary = self
            .levels
            .level_up(&mut self.ledger, oracle, track, target, chooser)?;
        self.refresh_health(RecomputeReason::LevelUp);
        Ok(summary)
    }

    /// Declares a new class or profession from `effective_level` on.
    pub fn change_track(
        &mut self,
        oracle: &dyn ProgressionOracle,
        track: Track,
        name: &str,
        effective_level: u32,
    ) -> Result<(), CharacterError> {
        self.levels
            .change_track(&mut self.ledger, oracle, track, name, effective_level)?;
        self.refresh_health(RecomputeReason::Other);
        Ok(())
    }

    pub fn change_class(
        &mut self,
        oracle: &dyn ProgressionOracle,
        name: &str,
        effective_level: u32,
    ) -> Result<(), CharacterError> {
        self.change_track(oracle, Track::Class, name, effective_level)
    }

    pub fn change_profession(
        &mut self,
        oracle: &dyn ProgressionOracle,
        name: &str,
        effective_level: u32,
    ) -> Result<(), CharacterError> {
        self.change_track(oracle, Track::Profession, name, effective_level)
    }

    /// Declares a new race from race level `effective_level` on.
    pub fn change_race(
        &mut self,
        oracle: &dyn ProgressionOracle,
        race: &str,
        effective_level: u32,
    ) -> Result<(), CharacterError> {
        self.levels
            .change_race(&mut self.ledger, oracle, race, effective_level)?;
        self.refresh_health(RecomputeReason::Other);
        Ok(())
    }

    pub fn set_tier_thresholds(
        &mut self,
        oracle: &dyn ProgressionOracle,
        thresholds: TierThresholds,
    ) -> Result<(), CharacterError> {
        self.levels
            .set_thresholds(&mut self.ledger, oracle, thresholds)?;
        self.refresh_health(RecomputeReason::Other);
        Ok(())
    }

    /// Sets a user-editable meta attribute, cascading to the matching recalculation.
    ///
    /// A class or profession applies from the start of the current tier; a race
    /// replaces the whole race history; levels can only be raised. Race level and
    /// race rank are derived and always rejected.
    pub fn set_meta(
        &mut self,
        oracle: &dyn ProgressionOracle,
        key: &str,
        value: &str,
        chooser: &mut dyn TierChoiceProvider,
    ) -> Result<(), CharacterError> {
        let key = MetaKey::lookup(key)?;
        let invalid = || CharacterError::InvalidMetaValue {
            key,
            value: value.to_string(),
        };

        match key {
            MetaKey::RaceLevel | MetaKey::RaceRank => Err(ProgressionError::DerivedField {
                key: key.to_string(),
            }
            .into()),
            MetaKey::Class | MetaKey::Profession => {
                let track = if key == MetaKey::Class {
                    Track::Class
                } else {
                    Track::Profession
                };
                let tier = self.levels.tier(track);
                let start = self.levels.thresholds().tier_start(tier).unwrap_or(1);
                self.change_track(oracle, track, value, start)
            }
            MetaKey::ClassLevel | MetaKey::ProfessionLevel => {
                let track = if key == MetaKey::ClassLevel {
                    Track::Class
                } else {
                    Track::Profession
                };
                let target: u32 = value.trim().parse().map_err(|_| invalid())?;
                self.level_up(oracle, track, target, chooser).map(|_| ())
            }
            MetaKey::Race => self.change_race(oracle, value, 0),
        }
    }

    // ------------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------------

    /// Spends free points on one stat. Returns the points left.
    pub fn allocate(&mut self, stat: Stat, amount: i32) -> Result<u32, CharacterError> {
        let remaining = self.levels.allocate(&mut self.ledger, stat, amount)?;
        self.refresh_health(RecomputeReason::Other);
        Ok(remaining)
    }

    /// Spends the whole pool on random stats. Returns points per stat.
    pub fn allocate_random<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<StatBlock, CharacterError> {
        let tally = self.levels.allocate_random_all(&mut self.ledger, rng)?;
        self.refresh_health(RecomputeReason::Other);
        Ok(tally)
    }

    /// Direct edit of a base stat.
    pub fn set_base_stat(&mut self, stat: Stat, value: i32) -> Result<(), CharacterError> {
        self.ledger.set_base(stat, value)?;
        self.refresh_health(RecomputeReason::Other);
        Ok(())
    }

    /// Manual adjustment booked under the `custom` source.
    pub fn adjust(&mut self, stat: Stat, delta: i32) -> Result<i32, CharacterError> {
        let total = self
            .ledger
            .add_contribution(stat, StatSource::Custom, delta)?;
        self.refresh_health(RecomputeReason::Other);
        Ok(total)
    }

    pub fn equip(&mut self, item: Item) -> Result<(), CharacterError> {
        if self.equipped.iter().any(|worn| worn.name == item.name) {
            return Err(CharacterError::ItemAlreadyEquipped { name: item.name });
        }
        self.ledger.apply_block(StatSource::Item, &item.stats)?;
        tracing::debug!(item = %item.name, "item equipped");
        self.equipped.push(item);
        self.refresh_health(RecomputeReason::Item);
        Ok(())
    }

    pub fn unequip(&mut self, name: &str) -> Result<Item, CharacterError> {
        let index = self
            .equipped
            .iter()
            .position(|worn| worn.name == name)
            .ok_or_else(|| CharacterError::ItemNotEquipped {
                name: name.to_string(),
            })?;
        self.ledger
            .apply_block(StatSource::Item, &-self.equipped[index].stats)?;
        let item = self.equipped.remove(index);
        tracing::debug!(item = %item.name, "item unequipped");
        self.refresh_health(RecomputeReason::Item);
        Ok(item)
    }

    /// Grants a blessing, replacing any active one.
    pub fn bless(&mut self, blessing: Blessing) -> Result<(), CharacterError> {
        let mut staged = self.ledger.clone();
        staged.reset_source_everywhere(StatSource::Blessing);
        staged.apply_block(StatSource::Blessing, &blessing.stats)?;
        staged.ensure_non_negative()?;

        self.ledger = staged;
        tracing::debug!(blessing = %blessing.name, "blessing granted");
        self.blessing = Some(blessing);
        self.refresh_health(RecomputeReason::Blessing);
        Ok(())
    }

    /// Removes the active blessing, returning it.
    pub fn remove_blessing(&mut self) -> Result<Option<Blessing>, CharacterError> {
        if self.blessing.is_none() {
            return Ok(None);
        }
        let mut staged = self.ledger.clone();
        staged.reset_source_everywhere(StatSource::Blessing);
        staged.ensure_non_negative()?;

        self.ledger = staged;
        self.refresh_health(RecomputeReason::Blessing);
        Ok(self.blessing.take())
    }

    // ------------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------------

    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.health.take_damage(amount)
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        self.health.heal(amount)
    }

    pub fn reset_health(&mut self) {
        self.health.reset();
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Checks the ledger and pool against the character's declared history.
    pub fn audit(&self, oracle: &dyn ProgressionOracle) -> Result<ValidationReport, CharacterError> {
        Ok(ReverseEngineeringValidator::new(oracle).audit(&self.ledger, &self.levels)?)
    }

    /// Audits, then raises the pool if the audit found a free-point shortfall.
    pub fn repair_free_points(
        &mut self,
        oracle: &dyn ProgressionOracle,
    ) -> Result<ValidationReport, CharacterError> {
        let report = self.audit(oracle)?;
        if let Some(corrected) = report.corrected_pool() {
            let added = self.levels.pool_mut().raise_to(corrected);
            tracing::warn!(character = %self.name, added, "free point pool repaired");
        }
        Ok(report)
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unset = || "-".to_string();
        writeln!(f, "Character: {}", self.name)?;
        for track in Track::ALL {
            let key = match track {
                Track::Class => MetaKey::Class,
                Track::Profession => MetaKey::Profession,
            };
            writeln!(
                f,
                "{}: {} (level {}, tier {})",
                key,
                self.meta(key).unwrap_or_else(unset),
                self.levels.level(track),
                self.levels.tier(track)
            )?;
        }
        writeln!(
            f,
            "Race: {} (level {}, rank {})",
            self.meta(MetaKey::Race).unwrap_or_else(unset),
            self.levels.race_level(),
            self.meta(MetaKey::RaceRank).unwrap_or_else(unset)
        )?;
        writeln!(f, "Health: {}", self.health)?;
        writeln!(f, "Free points: {}", self.free_points())?;
        if let Some(blessing) = &self.blessing {
            writeln!(f, "Blessing: {}", blessing.name)?;
        }
        if !self.equipped.is_empty() {
            let names: Vec<&str> = self.equipped.iter().map(|item| item.name.as_str()).collect();
            writeln!(f, "Equipped: {}", names.join(", "))?;
        }

        write!(f, "{:<13}{:>6}{:>6}", "stat", "total", "mod")?;
        for source in StatSource::ALL {
            write!(f, "{:>12}", source.as_ref())?;
        }
        for stat in Stat::ALL {
            write!(
                f,
                "\n{:<13}{:>6}{:>6}",
                stat.as_ref(),
                self.stat(stat),
                self.modifier(stat)
            )?;
            for source in StatSource::ALL {
                write!(f, "{:>12}", self.ledger.contribution(stat, source))?;
            }
        }
        Ok(())
    }
}

/// Builds a character from declared progression and replays it.
#[derive(Clone, Debug)]
pub struct CharacterBuilder {
    name: String,
    base: StatBlock,
    curve: ModifierCurve,
    thresholds: TierThresholds,
    class: TrackProgress,
    profession: TrackProgress,
    race: ProgressionHistory,
}

impl CharacterBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: StatBlock::splat(EngineConfig::DEFAULT_BASE_STAT),
            curve: ModifierCurve::STANDARD,
            thresholds: TierThresholds::default(),
            class: TrackProgress::default(),
            profession: TrackProgress::default(),
            race: ProgressionHistory::new(),
        }
    }

    /// Applies thresholds, base stat and curve from engine configuration.
    pub fn config(mut self, config: &EngineConfig) -> Self {
        self.base = StatBlock::splat(config.base_stat);
        self.curve = config.modifier;
        self.thresholds = config.tier_thresholds.clone();
        self
    }

    pub fn base(mut self, base: StatBlock) -> Self {
        self.base = base;
        self
    }

    pub fn thresholds(mut self, thresholds: TierThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// A single class from level 1, leveled to `level`.
    pub fn class(self, name: &str, level: u32) -> Self {
        self.track_history(Track::Class, ProgressionHistory::starting_with(name, 1), level)
    }

    /// A single profession from level 1, leveled to `level`.
    pub fn profession(self, name: &str, level: u32) -> Self {
        self.track_history(Track::Profession, ProgressionHistory::starting_with(name, 1), level)
    }

    /// A full history for one track, leveled to `level`.
    pub fn track_history(mut self, track: Track, history: ProgressionHistory, level: u32) -> Self {
        let progress = TrackProgress::new(level, history);
        match track {
            Track::Class => self.class = progress,
            Track::Profession => self.profession = progress,
        }
        self
    }

    pub fn race(mut self, name: &str) -> Self {
        self.race = ProgressionHistory::starting_with(name, 0);
        self
    }

    pub fn race_history(mut self, history: ProgressionHistory) -> Self {
        self.race = history;
        self
    }

    /// Replays the declared progression into a fresh ledger.
    pub fn build(self, oracle: &dyn ProgressionOracle) -> Result<Character, CharacterError> {
        let mut ledger = StatLedger::new(self.base)?.with_curve(self.curve);
        let mut levels =
            LevelSystem::with_progress(self.thresholds, self.class, self.profession, self.race);
        levels.replay_all(&mut ledger, oracle)?;

        let character = Character::assemble(self.name, ledger, levels);
        tracing::info!(
            character = %character.name,
            class_level = character.levels.level(Track::Class),
            profession_level = character.levels.level(Track::Profession),
            race_level = character.levels.race_level(),
            "character built"
        );
        Ok(character)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::{NoChoices, ScriptedChoices};
    use crate::stats::modifier;
    use crate::tables::{LevelGains, ProgressionTables, RaceRank, RaceTable};

    fn tables() -> ProgressionTables {
        let mut tables = ProgressionTables::new();
        tables
            .insert_class(
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
            )
            .insert_class(
                1,
                "mage",
                LevelGains::new(StatBlock::ZERO.with(Stat::Intelligence, 2), 2),
            )
            .insert_class(2, "spearman", LevelGains::new(StatBlock::ZERO.with(Stat::Strength, 5), 4))
            .insert_profession(
                1,
                "miner",
                LevelGains::new(StatBlock::ZERO.with(Stat::Toughness, 1), 1),
            )
            .insert_profession(
                1,
                "scribe",
                LevelGains::new(StatBlock::ZERO.with(Stat::Wisdom, 1), 1),
            );
        let human = RaceTable::new(
            "human",
            vec![RaceRank {
                min_level: 0,
                max_level: 9,
                rank: "G".into(),
                gains: LevelGains::new(StatBlock::splat(1), 1),
            }],
        )
        .unwrap();
        tables.insert_race("human", human);
        tables
    }

    fn sword() -> Item {
        Item {
            name: "sword of vigor".into(),
            description: String::new(),
            stats: StatBlock::ZERO.with(Stat::Vitality, 100),
        }
    }

    #[test]
    fn builder_replays_declared_levels() {
        let character = Character::builder("Aria")
            .class("heavy warrior", 4)
            .race("human")
            .build(&tables())
            .unwrap();

        assert_eq!(character.stat(Stat::Strength), 5 + 8 + 2);
        assert_eq!(character.levels().race_level(), 2);
        assert_eq!(character.meta(MetaKey::RaceRank).as_deref(), Some("G"));
        assert_eq!(character.free_points(), 8 + 2);
        assert_eq!(character.health().max(), modifier(5 + 8 + 2));
        assert!(character.health().is_full());
    }

    #[test]
    fn derived_meta_cannot_be_set() {
        let oracle = tables();
        let mut character = Character::new("Bram", StatBlock::splat(5)).unwrap();
        for key in ["Race level", "race rank"] {
            let err = character
                .set_meta(&oracle, key, "9", &mut NoChoices)
                .unwrap_err();
            assert!(matches!(
                err,
                CharacterError::Progression(ProgressionError::DerivedField { .. })
            ));
        }
        assert!(matches!(
            character.set_meta(&oracle, "Alignment", "good", &mut NoChoices),
            Err(CharacterError::UnknownMetaKey { .. })
        ));
    }

    #[test]
    fn set_meta_cascades() {
        let oracle = tables();
        let mut character = Character::new("Cora", StatBlock::splat(5)).unwrap();

        character.set_meta(&oracle, "Class", "mage", &mut NoChoices).unwrap();
        character.set_meta(&oracle, "Race", "Human", &mut NoChoices).unwrap();
        character
            .set_meta(&oracle, "Class level", "4", &mut NoChoices)
            .unwrap();

        assert_eq!(character.meta(MetaKey::Class).as_deref(), Some("mage"));
        assert_eq!(character.meta(MetaKey::RaceLevel).as_deref(), Some("2"));
        assert_eq!(character.stat(Stat::Intelligence), 5 + 8 + 2);
        assert!(matches!(
            character.set_meta(&oracle, "Class level", "four", &mut NoChoices),
            Err(CharacterError::InvalidMetaValue { .. })
        ));

        character
            .set_meta(&oracle, "class", "heavy warrior", &mut NoChoices)
            .unwrap();
        assert_eq!(character.stat(Stat::Intelligence), 5 + 2);
        assert_eq!(character.stat(Stat::Strength), 5 + 8 + 2);
    }

    #[test]
    fn change_class_replays_from_the_effective_level() {
        let oracle = tables();
        let mut character = Character::builder("Iris")
            .class("heavy warrior", 4)
            .build(&oracle)
            .unwrap();
        assert_eq!(character.stat(Stat::Strength), 5 + 8);

        character.change_class(&oracle, "mage", 3).unwrap();

        assert_eq!(character.stat(Stat::Strength), 5 + 4);
        assert_eq!(character.stat(Stat::Intelligence), 5 + 4);
        assert_eq!(character.free_points(), 8);
        assert_eq!(character.meta(MetaKey::Class).as_deref(), Some("mage"));
        assert_eq!(character.health().max(), modifier(5 + 4));
        assert!(character.audit(&oracle).unwrap().is_valid());

        let before = character.clone();
        assert!(matches!(
            character.change_class(&oracle, "bard", 2),
            Err(CharacterError::Progression(ProgressionError::Table(_)))
        ));
        assert!(matches!(
            character.change_class(&oracle, "mage", 0),
            Err(CharacterError::Progression(
                ProgressionError::InvalidEffectiveLevel { level: 0, .. }
            ))
        ));
        assert_eq!(character, before);
    }

    #[test]
    fn change_profession_keeps_earlier_levels() {
        let oracle = tables();
        let mut character = Character::builder("Jade")
            .profession("miner", 2)
            .build(&oracle)
            .unwrap();
        assert_eq!(character.stat(Stat::Toughness), 7);

        character.change_profession(&oracle, "scribe", 2).unwrap();

        assert_eq!(character.stat(Stat::Toughness), 6);
        assert_eq!(character.stat(Stat::Wisdom), 6);
        assert_eq!(character.free_points(), 2);
        assert_eq!(
            character.levels().track(Track::Profession).history().to_string(),
            "miner@1;scribe@2"
        );
    }

    #[test]
    fn set_base_stat_recomputes_health() {
        let mut character = Character::new("Kai", StatBlock::splat(5)).unwrap();
        character.take_damage(3);
        let before = character.health().current();

        character.set_base_stat(Stat::Vitality, 200).unwrap();
        assert_eq!(character.stat(Stat::Vitality), 200);
        let growth = modifier(200) - modifier(5);
        assert_eq!(character.health().max(), modifier(200));
        assert_eq!(character.health().current(), before + growth);

        character.reset_health();
        assert!(character.health().is_full());

        assert!(matches!(
            character.set_base_stat(Stat::Strength, -1),
            Err(CharacterError::Ledger(_))
        ));
        assert_eq!(character.stat(Stat::Strength), 5);
    }

    #[test]
    fn level_up_grows_current_health() {
        let oracle = tables();
        let mut character = Character::builder("Dax")
            .class("heavy warrior", 0)
            .build(&oracle)
            .unwrap();
        character.take_damage(3);
        let before = character.health().current();

        character
            .level_up(&oracle, Track::Class, 30, &mut ScriptedChoices::new(["spearman"]))
            .unwrap();

        let growth = character.health().max() - modifier(5);
        assert_eq!(character.health().current(), before + growth);
    }

    #[test]
    fn items_and_blessings_keep_health_fraction() {
        let mut character = Character::new("Eve", StatBlock::splat(5)).unwrap();
        character.equip(sword()).unwrap();
        assert!(character.health().is_full());
        assert_eq!(character.stat(Stat::Vitality), 105);
        assert!(matches!(
            character.equip(sword()),
            Err(CharacterError::ItemAlreadyEquipped { .. })
        ));

        let max = character.health().max();
        character.take_damage(max / 2);
        character.unequip("sword of vigor").unwrap();
        assert_eq!(character.stat(Stat::Vitality), 5);
        assert!(character.health().current() >= 1);
        assert!(character.health().current() < character.health().max());
        assert!(matches!(
            character.unequip("sword of vigor"),
            Err(CharacterError::ItemNotEquipped { .. })
        ));
    }

    #[test]
    fn blessing_replaces_previous() {
        let mut character = Character::new("Finn", StatBlock::splat(5)).unwrap();
        character
            .bless(Blessing {
                name: "dawn".into(),
                stats: StatBlock::ZERO.with(Stat::Wisdom, 3),
            })
            .unwrap();
        character
            .bless(Blessing {
                name: "dusk".into(),
                stats: StatBlock::ZERO.with(Stat::Willpower, 2),
            })
            .unwrap();

        assert_eq!(character.stat(Stat::Wisdom), 5);
        assert_eq!(character.stat(Stat::Willpower), 7);
        assert_eq!(character.blessing().map(|b| b.name.as_str()), Some("dusk"));

        let removed = character.remove_blessing().unwrap();
        assert_eq!(removed.map(|b| b.name), Some("dusk".to_string()));
        assert_eq!(character.stat(Stat::Willpower), 5);
        assert_eq!(character.remove_blessing().unwrap(), None);
    }

    #[test]
    fn audit_detects_drift_and_repairs_shortfall() {
        let oracle = tables();
        let mut character = Character::builder("Gil")
            .class("heavy warrior", 2)
            .build(&oracle)
            .unwrap();
        assert!(character.audit(&oracle).unwrap().is_valid());

        character.levels.pool_mut().revoke(3).unwrap();
        let report = character.repair_free_points(&oracle).unwrap();
        assert!(report.is_valid());
        assert_eq!(character.free_points(), 4);

        character
            .ledger
            .add_contribution(Stat::Strength, StatSource::Class, 1)
            .unwrap();
        let report = character.audit(&oracle).unwrap();
        assert!(!report.is_valid());
    }

    #[test]
    fn summary_lists_meta_and_sources() {
        let character = Character::builder("Hana")
            .class("mage", 1)
            .build(&tables())
            .unwrap();
        let summary = character.to_string();
        assert!(summary.starts_with("Character: Hana"));
        assert!(summary.contains("Class: mage (level 1, tier 1)"));
        assert!(summary.contains("Race: - (level 0, rank -)"));
        assert!(summary.contains("free_points"));
    }
}
