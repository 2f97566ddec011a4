//! Stat ledger - per-stat, per-source additive bookkeeping.
//!
//! Every stat is the sum of its source buckets:
//! `current(stat) == Σ contributions(stat, *)`
//!
//! Totals are never stored; they are recomputed from the buckets on every read,
//! so no code path can leave a stale total behind.

use std::collections::BTreeMap;

use crate::error::{EngineError, ErrorSeverity};

use super::modifier::ModifierCurve;
use super::stat::{Stat, StatBlock, StatSource};

/// Contributions of every source to one stat.
pub type SourceBreakdown = BTreeMap<StatSource, i32>;

/// Errors raised by ledger mutations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("unknown stat '{name}'")]
    UnknownStat { name: String },

    #[error("{origin} contribution of {delta} would take {stat} to {result}")]
    OutOfRange {
        stat: Stat,
        origin: StatSource,
        delta: i64,
        result: i64,
    },

    #[error("{origin} cannot hold a negative contribution ({value}) to {stat}")]
    NegativeContribution {
        stat: Stat,
        origin: StatSource,
        value: i64,
    },
}

impl EngineError for LedgerError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownStat { .. } => "LEDGER_UNKNOWN_STAT",
            Self::OutOfRange { .. } => "LEDGER_OUT_OF_RANGE",
            Self::NegativeContribution { .. } => "LEDGER_NEGATIVE_CONTRIBUTION",
        }
    }
}

/// Per-source stat bookkeeping for one character.
#[derive(Clone, Debug)]
pub struct StatLedger {
    entries: [SourceBreakdown; Stat::COUNT],
    curve: ModifierCurve,
}

impl StatLedger {
    /// Creates a ledger whose only contributions are the base values.
    pub fn new(base: StatBlock) -> Result<Self, LedgerError> {
        let mut ledger = Self::empty();
        for (stat, value) in base.iter() {
            ledger.set_base(stat, value)?;
        }
        Ok(ledger)
    }

    /// A ledger with no buckets at all; every stat reads 0.
    pub fn empty() -> Self {
        Self {
            entries: Default::default(),
            curve: ModifierCurve::STANDARD,
        }
    }

    pub fn with_curve(mut self, curve: ModifierCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn curve(&self) -> &ModifierCurve {
        &self.curve
    }

    /// Adds `delta` to one source bucket, creating it at 0 first if absent.
    ///
    /// Fails without touching the ledger if the bucket would turn negative for
    /// a non-reversible source, or if the stat total would drop below zero.
    /// Returns the new total.
    pub fn add_contribution(
        &mut self,
        stat: Stat,
        source: StatSource,
        delta: i32,
    ) -> Result<i32, LedgerError> {
        let bucket = i64::from(self.contribution(stat, source)) + i64::from(delta);
        let total = i64::from(self.current(stat)) + i64::from(delta);

        if bucket < 0 && !source.is_reversible() {
            return Err(LedgerError::NegativeContribution {
                stat,
                origin: source,
                value: bucket,
            });
        }
        let (Ok(bucket), Ok(total)) = (i32::try_from(bucket), i32::try_from(total)) else {
            return Err(LedgerError::OutOfRange {
                stat,
                origin: source,
                delta: i64::from(delta),
                result: total,
            });
        };
        if total < 0 {
            return Err(LedgerError::OutOfRange {
                stat,
                origin: source,
                delta: i64::from(delta),
                result: i64::from(total),
            });
        }

        self.entries[stat.index()].insert(source, bucket);
        tracing::trace!(%stat, %source, delta, total, "ledger contribution");
        Ok(total)
    }

    /// Replaces the base contribution directly, leaving other sources alone.
    pub fn set_base(&mut self, stat: Stat, value: i32) -> Result<(), LedgerError> {
        let delta = i64::from(value) - i64::from(self.contribution(stat, StatSource::Base));
        let delta = i32::try_from(delta).map_err(|_| LedgerError::OutOfRange {
            stat,
            origin: StatSource::Base,
            delta,
            result: i64::from(self.current(stat)) + delta,
        })?;
        self.add_contribution(stat, StatSource::Base, delta)?;
        Ok(())
    }

    /// Adds a whole block of deltas under one source, all or nothing.
    pub fn apply_block(&mut self, source: StatSource, block: &StatBlock) -> Result<(), LedgerError> {
        let mut staged = self.clone();
        for (stat, delta) in block.non_zero() {
            staged.add_contribution(stat, source, delta)?;
        }
        *self = staged;
        Ok(())
    }

    /// Zeroes one source's contribution to one stat.
    ///
    /// Used before replaying a progression history so gains are not counted twice.
    pub fn reset_source(&mut self, stat: Stat, source: StatSource) {
        if let Some(bucket) = self.entries[stat.index()].get_mut(&source) {
            *bucket = 0;
        }
    }

    /// Zeroes one source across every stat.
    pub fn reset_source_everywhere(&mut self, source: StatSource) {
        for stat in Stat::ALL {
            self.reset_source(stat, source);
        }
    }

    /// Current total of a stat.
    pub fn current(&self, stat: Stat) -> i32 {
        self.entries[stat.index()].values().sum()
    }

    /// Modifier of the current total.
    pub fn modifier(&self, stat: Stat) -> i32 {
        self.curve.modifier(self.current(stat))
    }

    /// Full per-source breakdown of a stat, for audit and display.
    pub fn sources(&self, stat: Stat) -> &SourceBreakdown {
        &self.entries[stat.index()]
    }

    pub fn contribution(&self, stat: Stat, source: StatSource) -> i32 {
        self.entries[stat.index()]
            .get(&source)
            .copied()
            .unwrap_or_default()
    }

    /// Current totals of every stat.
    pub fn totals(&self) -> StatBlock {
        StatBlock::from_pairs(Stat::ALL.map(|stat| (stat, self.current(stat))))
    }

    /// Modifiers of every stat.
    pub fn modifiers(&self) -> StatBlock {
        StatBlock::from_pairs(Stat::ALL.map(|stat| (stat, self.modifier(stat))))
    }

    /// One source's contribution to every stat.
    pub fn source_totals(&self, source: StatSource) -> StatBlock {
        StatBlock::from_pairs(Stat::ALL.map(|stat| (stat, self.contribution(stat, source))))
    }

    /// Reinstates a persisted bucket verbatim.
    ///
    /// Persisted characters may legitimately disagree with the rule tables, so
    /// buckets are restored as given rather than derived.
    pub fn restore(
        &mut self,
        stat: Stat,
        source: StatSource,
        value: i32,
    ) -> Result<(), LedgerError> {
        if value < 0 && !source.is_reversible() {
            return Err(LedgerError::NegativeContribution {
                stat,
                origin: source,
                value: i64::from(value),
            });
        }
        self.entries[stat.index()].insert(source, value);
        Ok(())
    }

    /// Fails on the first stat whose total is negative.
    pub fn ensure_non_negative(&self) -> Result<(), LedgerError> {
        match Stat::ALL.into_iter().find(|&stat| self.current(stat) < 0) {
            Some(stat) => Err(LedgerError::OutOfRange {
                stat,
                origin: StatSource::Base,
                delta: 0,
                result: i64::from(self.current(stat)),
            }),
            None => Ok(()),
        }
    }
}

/// Ledgers compare by contribution value; an absent bucket equals a zero bucket.
impl PartialEq for StatLedger {
    fn eq(&self, other: &Self) -> bool {
        self.curve == other.curve
            && Stat::ALL.iter().all(|&stat| {
                StatSource::ALL
                    .iter()
                    .all(|&source| self.contribution(stat, source) == other.contribution(stat, source))
            })
    }
}

impl Default for StatLedger {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_ledger() -> StatLedger {
        StatLedger::new(StatBlock::splat(5)).unwrap()
    }

    fn assert_sum_invariant(ledger: &StatLedger) {
        for stat in Stat::ALL {
            let sum: i32 = ledger.sources(stat).values().sum();
            assert_eq!(ledger.current(stat), sum);
        }
    }

    #[test]
    fn contributions_sum_into_current() {
        let mut ledger = base_ledger();
        ledger.add_contribution(Stat::Strength, StatSource::Class, 2).unwrap();
        ledger.add_contribution(Stat::Strength, StatSource::Item, 10).unwrap();
        ledger.add_contribution(Stat::Strength, StatSource::Item, -4).unwrap();

        assert_eq!(ledger.current(Stat::Strength), 13);
        assert_eq!(ledger.contribution(Stat::Strength, StatSource::Item), 6);
        assert_eq!(ledger.sources(Stat::Strength).len(), 3);
        assert_sum_invariant(&ledger);
    }

    #[test]
    fn total_cannot_go_negative() {
        let mut ledger = base_ledger();
        let err = ledger
            .add_contribution(Stat::Wisdom, StatSource::Custom, -6)
            .unwrap_err();
        assert!(matches!(err, LedgerError::OutOfRange { result: -1, .. }));
        assert_eq!(ledger.current(Stat::Wisdom), 5);
        assert!(!ledger.sources(Stat::Wisdom).contains_key(&StatSource::Custom));
    }

    #[test]
    fn only_reversible_sources_go_negative() {
        let mut ledger = base_ledger();
        assert!(ledger.add_contribution(Stat::Wisdom, StatSource::Blessing, -2).is_ok());
        let err = ledger
            .add_contribution(Stat::Wisdom, StatSource::Class, -1)
            .unwrap_err();
        assert!(matches!(err, LedgerError::NegativeContribution { .. }));
        assert_eq!(err.severity(), ErrorSeverity::Validation);
    }

    #[test]
    fn set_base_leaves_other_sources() {
        let mut ledger = base_ledger();
        ledger.add_contribution(Stat::Dexterity, StatSource::Race, 3).unwrap();
        ledger.set_base(Stat::Dexterity, 12).unwrap();

        assert_eq!(ledger.contribution(Stat::Dexterity, StatSource::Base), 12);
        assert_eq!(ledger.contribution(Stat::Dexterity, StatSource::Race), 3);
        assert_eq!(ledger.current(Stat::Dexterity), 15);
        assert!(ledger.set_base(Stat::Dexterity, -1).is_err());
    }

    #[test]
    fn reset_source_zeroes_a_bucket() {
        let mut ledger = base_ledger();
        ledger.add_contribution(Stat::Vitality, StatSource::Class, 4).unwrap();
        ledger.reset_source(Stat::Vitality, StatSource::Class);

        assert_eq!(ledger.current(Stat::Vitality), 5);
        assert_eq!(ledger.sources(Stat::Vitality).get(&StatSource::Class), Some(&0));
        assert_sum_invariant(&ledger);
    }

    #[test]
    fn apply_block_is_all_or_nothing() {
        let mut ledger = base_ledger();
        let block = StatBlock::ZERO
            .with(Stat::Strength, 3)
            .with(Stat::Perception, -9);
        assert!(ledger.apply_block(StatSource::Item, &block).is_err());
        assert_eq!(ledger, base_ledger());
    }

    #[test]
    fn modifier_follows_total() {
        let mut ledger = base_ledger();
        assert_eq!(ledger.modifier(Stat::Vitality), 7);
        ledger.add_contribution(Stat::Vitality, StatSource::Custom, 495).unwrap();
        assert_eq!(ledger.modifier(Stat::Vitality), 735);
    }

    #[test]
    fn equality_ignores_empty_buckets() {
        let mut a = base_ledger();
        let b = base_ledger();
        a.add_contribution(Stat::Strength, StatSource::Item, 0).unwrap();
        assert_eq!(a, b);
    }
}
