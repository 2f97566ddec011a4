//! Stat and source identifiers, plus a fixed-size per-stat value block.

use core::ops::{Add, AddAssign, Index, IndexMut, Neg, Sub};

use super::ledger::LedgerError;

/// The nine attributes that define a character.
///
/// Raw values are non-negative integers; the modifier curve turns them into
/// the effective power consumed by health and combat.
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
pub enum Stat {
    Vitality,
    Endurance,
    Strength,
    Dexterity,
    Toughness,
    Intelligence,
    Willpower,
    Wisdom,
    Perception,
}

impl Stat {
    pub const COUNT: usize = 9;

    /// All stats in canonical (display and persistence) order.
    pub const ALL: [Stat; Self::COUNT] = [
        Stat::Vitality,
        Stat::Endurance,
        Stat::Strength,
        Stat::Dexterity,
        Stat::Toughness,
        Stat::Intelligence,
        Stat::Willpower,
        Stat::Wisdom,
        Stat::Perception,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parses a stat name, reporting unknown names as a ledger input error.
    pub fn lookup(name: &str) -> Result<Self, LedgerError> {
        name.trim()
            .parse()
            .map_err(|_| LedgerError::UnknownStat {
                name: name.to_string(),
            })
    }
}

/// Origin of a stat contribution.
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
pub enum StatSource {
    /// Rolled or directly edited starting value.
    Base,
    Class,
    Profession,
    Race,
    /// Equipped items.
    Item,
    /// The active blessing.
    Blessing,
    /// Points spent from the free-point pool.
    FreePoints,
    /// Manually entered adjustments.
    Custom,
}

impl StatSource {
    pub const COUNT: usize = 8;

    /// All sources in canonical (persistence) order.
    pub const ALL: [StatSource; Self::COUNT] = [
        StatSource::Base,
        StatSource::Class,
        StatSource::Profession,
        StatSource::Race,
        StatSource::Item,
        StatSource::Blessing,
        StatSource::FreePoints,
        StatSource::Custom,
    ];

    /// Reversible sources may hold a negative running contribution.
    pub const fn is_reversible(self) -> bool {
        matches!(self, Self::Item | Self::Blessing | Self::Custom)
    }
}

/// One integer per stat.
///
/// Used for base rolls, table gains, item bonuses and snapshots of totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatBlock([i32; Stat::COUNT]);

impl StatBlock {
    pub const ZERO: Self = Self([0; Stat::COUNT]);

    /// Every stat set to the same value.
    pub const fn splat(value: i32) -> Self {
        Self([value; Stat::COUNT])
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Stat, i32)>) -> Self {
        let mut block = Self::ZERO;
        for (stat, value) in pairs {
            block[stat] += value;
        }
        block
    }

    pub fn get(&self, stat: Stat) -> i32 {
        self.0[stat.index()]
    }

    pub fn set(&mut self, stat: Stat, value: i32) {
        self.0[stat.index()] = value;
    }

    /// Builder-style setter.
    pub fn with(mut self, stat: Stat, value: i32) -> Self {
        self.set(stat, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, i32)> + '_ {
        Stat::ALL.iter().map(move |&stat| (stat, self.get(stat)))
    }

    /// Stats with a non-zero value.
    pub fn non_zero(&self) -> impl Iterator<Item = (Stat, i32)> + '_ {
        self.iter().filter(|(_, value)| *value != 0)
    }

    pub fn sum(&self) -> i32 {
        self.0.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|value| *value == 0)
    }

    /// Multiplies every entry by `factor`.
    pub fn scaled(&self, factor: i32) -> Self {
        let mut out = *self;
        for value in out.0.iter_mut() {
            *value *= factor;
        }
        out
    }
}

impl Index<Stat> for StatBlock {
    type Output = i32;

    fn index(&self, stat: Stat) -> &i32 {
        &self.0[stat.index()]
    }
}

impl IndexMut<Stat> for StatBlock {
    fn index_mut(&mut self, stat: Stat) -> &mut i32 {
        &mut self.0[stat.index()]
    }
}

impl Add for StatBlock {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for StatBlock {
    fn add_assign(&mut self, rhs: Self) {
        for (lhs, rhs) in self.0.iter_mut().zip(rhs.0) {
            *lhs += rhs;
        }
    }
}

impl Sub for StatBlock {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Neg for StatBlock {
    type Output = Self;

    fn neg(self) -> Self {
        self.scaled(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_names_parse_case_insensitively() {
        assert_eq!(Stat::lookup("Strength").unwrap(), Stat::Strength);
        assert_eq!(Stat::lookup(" wisdom ").unwrap(), Stat::Wisdom);
        assert!(matches!(
            Stat::lookup("luck"),
            Err(LedgerError::UnknownStat { .. })
        ));
    }

    #[test]
    fn source_tags_render_snake_case() {
        assert_eq!(StatSource::FreePoints.to_string(), "free_points");
        assert_eq!("free_points".parse::<StatSource>().unwrap(), StatSource::FreePoints);
        assert!(StatSource::Item.is_reversible());
        assert!(!StatSource::Class.is_reversible());
    }

    #[test]
    fn block_arithmetic() {
        let a = StatBlock::ZERO.with(Stat::Strength, 2).with(Stat::Vitality, 1);
        let b = StatBlock::splat(1);
        let sum = a + b;
        assert_eq!(sum[Stat::Strength], 3);
        assert_eq!(sum[Stat::Wisdom], 1);
        assert_eq!((sum - b), a);
        assert_eq!(a.non_zero().count(), 2);
        assert_eq!(a.scaled(3)[Stat::Strength], 6);
    }
}
