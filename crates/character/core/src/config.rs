use crate::progression::TierThresholds;
use crate::stats::ModifierCurve;

/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Thresholds given to newly created characters.
    pub tier_thresholds: TierThresholds,
    /// Starting value of every stat before any progression.
    pub base_stat: i32,
    /// Raw value to modifier conversion.
    pub modifier: ModifierCurve,
}

impl EngineConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_BASE_STAT: i32 = 5;

    pub fn new() -> Self {
        Self {
            tier_thresholds: TierThresholds::default(),
            base_stat: Self::DEFAULT_BASE_STAT,
            modifier: ModifierCurve::STANDARD,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
