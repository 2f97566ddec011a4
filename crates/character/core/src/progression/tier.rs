//! Tier resolution against a character's own threshold list.
//!
//! With thresholds `[t0, t1, ..]`, tier 1 covers levels `1..t0`, tier `k`
//! covers `t(k-2)..t(k-1)`, and the last tier is unbounded. Level 0 (no levels
//! taken yet) resolves to tier 1.

use crate::tables::TableError;

/// Sorted, strictly increasing tier thresholds, all above level 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<u32>", into = "Vec<u32>"))]
pub struct TierThresholds(Vec<u32>);

impl TierThresholds {
    pub const DEFAULT: [u32; 3] = [25, 100, 200];

    /// Validates a threshold list as given; it is not re-sorted.
    pub fn new(thresholds: Vec<u32>) -> Result<Self, TableError> {
        let invalid = |reason| TableError::InvalidThresholds {
            thresholds: thresholds.clone(),
            reason,
        };
        // A threshold at 1 would leave tier 1 without levels.
        if thresholds.first().is_some_and(|&first| first < 2) {
            return Err(invalid("thresholds must be greater than 1"));
        }
        if thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(invalid("thresholds must be strictly increasing"));
        }
        Ok(Self(thresholds))
    }

    /// Balanced thresholds for `tiers` tiers up to `max_level`.
    ///
    /// Early tiers are shorter: threshold `i` sits at `max_level * (i / tiers)^0.8`,
    /// but never below `5 * i`.
    pub fn suggest(max_level: u32, tiers: u32) -> Result<Self, TableError> {
        let thresholds = (1..tiers.max(1))
            .map(|i| {
                let ratio = (f64::from(i) / f64::from(tiers)).powf(0.8);
                let threshold = (f64::from(max_level) * ratio) as u32;
                threshold.max(i * 5)
            })
            .collect();
        Self::new(thresholds)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Number of tiers these thresholds define.
    pub fn tier_count(&self) -> u32 {
        self.0.len() as u32 + 1
    }

    /// Tier containing `level`.
    pub fn tier_for_level(&self, level: u32) -> u32 {
        1 + self.0.iter().take_while(|&&threshold| level >= threshold).count() as u32
    }

    /// True when `level` is the first level of a tier above tier 1.
    pub fn is_threshold(&self, level: u32) -> bool {
        self.0.binary_search(&level).is_ok()
    }

    /// First level of `tier`, or `None` for a tier beyond the last.
    pub fn tier_start(&self, tier: u32) -> Option<u32> {
        match tier {
            0 => None,
            1 => Some(1),
            _ => self.0.get(tier as usize - 2).copied(),
        }
    }

    /// Inclusive level range of `tier`; the upper bound is `None` for the last tier.
    pub fn tier_range(&self, tier: u32) -> Option<(u32, Option<u32>)> {
        let start = self.tier_start(tier)?;
        let end = self.0.get(tier as usize - 1).map(|next| next - 1);
        Some((start, end))
    }

    /// The next threshold strictly above `level`.
    pub fn next_threshold(&self, level: u32) -> Option<u32> {
        self.0.iter().copied().find(|&threshold| level < threshold)
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self(Self::DEFAULT.to_vec())
    }
}

impl TryFrom<Vec<u32>> for TierThresholds {
    type Error = TableError;

    fn try_from(thresholds: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(thresholds)
    }
}

impl From<TierThresholds> for Vec<u32> {
    fn from(thresholds: TierThresholds) -> Self {
        thresholds.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_thresholds() {
        let thresholds = TierThresholds::default();
        assert_eq!(thresholds.tier_for_level(0), 1);
        assert_eq!(thresholds.tier_for_level(1), 1);
        assert_eq!(thresholds.tier_for_level(24), 1);
        assert_eq!(thresholds.tier_for_level(25), 2);
        assert_eq!(thresholds.tier_for_level(99), 2);
        assert_eq!(thresholds.tier_for_level(100), 3);
        assert_eq!(thresholds.tier_for_level(500), 4);
        assert_eq!(thresholds.tier_count(), 4);
    }

    #[test]
    fn ranges_and_next_threshold() {
        let thresholds = TierThresholds::default();
        assert_eq!(thresholds.tier_range(1), Some((1, Some(24))));
        assert_eq!(thresholds.tier_range(2), Some((25, Some(99))));
        assert_eq!(thresholds.tier_range(4), Some((200, None)));
        assert_eq!(thresholds.tier_range(5), None);
        assert_eq!(thresholds.tier_range(0), None);

        assert_eq!(thresholds.next_threshold(0), Some(25));
        assert_eq!(thresholds.next_threshold(25), Some(100));
        assert_eq!(thresholds.next_threshold(200), None);
        assert!(thresholds.is_threshold(100));
        assert!(!thresholds.is_threshold(101));
    }

    #[test]
    fn every_tier_range_is_non_empty() {
        let thresholds = TierThresholds::new(vec![2, 3, 7]).unwrap();
        assert_eq!(thresholds.tier_range(1), Some((1, Some(1))));
        assert_eq!(thresholds.tier_range(2), Some((2, Some(2))));
        assert_eq!(thresholds.tier_range(3), Some((3, Some(6))));
        for tier in 1..=thresholds.tier_count() {
            let (start, end) = thresholds.tier_range(tier).unwrap();
            assert!(end.is_none_or(|end| end >= start), "tier {tier} is empty");
        }
    }

    #[test]
    fn empty_thresholds_are_a_single_tier() {
        let thresholds = TierThresholds::new(Vec::new()).unwrap();
        assert_eq!(thresholds.tier_for_level(1000), 1);
        assert_eq!(thresholds.tier_range(1), Some((1, None)));
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        assert!(TierThresholds::new(vec![0, 10]).is_err());
        assert!(TierThresholds::new(vec![1]).is_err());
        assert!(TierThresholds::new(vec![1, 10]).is_err());
        assert!(TierThresholds::new(vec![10, 10]).is_err());
        assert!(TierThresholds::new(vec![20, 10]).is_err());
    }

    #[test]
    fn suggested_thresholds_are_front_loaded() {
        let thresholds = TierThresholds::suggest(100, 4).unwrap();
        // 100 * 0.25^0.8 = 32.9, 100 * 0.5^0.8 = 57.4, 100 * 0.75^0.8 = 79.4
        assert_eq!(thresholds.as_slice(), &[32, 57, 79]);
        assert_eq!(TierThresholds::suggest(100, 1).unwrap().as_slice(), &[] as &[u32]);
        assert_eq!(TierThresholds::suggest(4, 3).unwrap().as_slice(), &[5, 10]);
    }
}
