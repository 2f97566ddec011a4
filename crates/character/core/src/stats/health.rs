//! Health derived from the vitality modifier.
//!
//! `max` is never edited directly; it follows `modifier(vitality)` through
//! [`HealthState::recompute`]. `current` is the only field combat touches and
//! always satisfies `0 <= current <= max`.

/// What triggered a health recomputation.
///
/// The trigger decides how `current` is reconciled with the new maximum.
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
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RecomputeReason {
    /// Growth from leveling is added to current health in full.
    LevelUp,
    /// Equipping or removing an item keeps the injury fraction.
    Item,
    /// Gaining or losing a blessing keeps the injury fraction.
    Blessing,
    /// Anything else behaves like a level-up.
    Other,
}

/// Maximum and current health of one character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthState {
    max: i32,
    current: i32,
}

impl HealthState {
    /// Fresh health at full.
    pub fn new(max: i32) -> Self {
        let max = max.max(0);
        Self { max, current: max }
    }

    /// Rebuilds a persisted state, clamping `current` into `0..=max`.
    pub fn from_parts(max: i32, current: i32) -> Self {
        let max = max.max(0);
        Self {
            max,
            current: current.clamp(0, max),
        }
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn is_full(&self) -> bool {
        self.current == self.max
    }

    /// Adopts a new maximum and reconciles current health for `reason`.
    pub fn recompute(&mut self, new_max: i32, reason: RecomputeReason) {
        let old_max = self.max;
        let new_max = new_max.max(0);

        self.current = match reason {
            RecomputeReason::LevelUp | RecomputeReason::Other => {
                if new_max > old_max {
                    self.current + (new_max - old_max)
                } else {
                    self.current.min(new_max)
                }
            }
            RecomputeReason::Item | RecomputeReason::Blessing => {
                if self.current == old_max {
                    new_max
                } else if self.current == 0 {
                    0
                } else {
                    let fraction = f64::from(self.current) / f64::from(old_max);
                    let scaled = (f64::from(new_max) * fraction).round() as i32;
                    scaled.max(1).min(new_max)
                }
            }
        };
        self.max = new_max;

        tracing::debug!(
            old_max,
            new_max,
            current = self.current,
            %reason,
            "health recomputed"
        );
    }

    /// Applies damage, flooring at zero. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let taken = amount.max(0).min(self.current);
        self.current -= taken;
        taken
    }

    /// Heals, capping at max. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let restored = amount.max(0).min(self.max - self.current);
        self.current += restored;
        restored
    }

    /// Restores current health to max.
    pub fn reset(&mut self) {
        self.current = self.max;
    }
}

impl core::fmt::Display for HealthState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wounded(max: i32, current: i32) -> HealthState {
        HealthState::from_parts(max, current)
    }

    #[test]
    fn level_up_adds_growth_to_current() {
        let mut health = wounded(100, 40);
        health.recompute(130, RecomputeReason::LevelUp);
        assert_eq!((health.max(), health.current()), (130, 70));
    }

    #[test]
    fn shrinking_max_clamps_down() {
        let mut health = wounded(100, 90);
        health.recompute(80, RecomputeReason::Other);
        assert_eq!(health.current(), 80);

        let mut health = wounded(100, 50);
        health.recompute(80, RecomputeReason::LevelUp);
        assert_eq!(health.current(), 50);
    }

    #[test]
    fn item_change_at_full_health_stays_full() {
        let mut health = HealthState::new(100);
        health.recompute(150, RecomputeReason::Item);
        assert!(health.is_full());
        health.recompute(60, RecomputeReason::Blessing);
        assert_eq!(health.current(), 60);
    }

    #[test]
    fn item_change_preserves_fraction() {
        let mut health = wounded(100, 50);
        health.recompute(200, RecomputeReason::Item);
        assert_eq!(health.current(), 100);

        let mut health = wounded(100, 25);
        health.recompute(10, RecomputeReason::Blessing);
        // 2.5 rounds away from zero
        assert_eq!(health.current(), 3);
    }

    #[test]
    fn item_change_never_kills() {
        let mut health = wounded(1000, 1);
        health.recompute(100, RecomputeReason::Item);
        assert_eq!(health.current(), 1);
        assert!(health.is_alive());
    }

    #[test]
    fn dead_stays_dead_on_item_change() {
        let mut health = wounded(100, 0);
        health.recompute(200, RecomputeReason::Item);
        assert_eq!(health.current(), 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn damage_and_healing_are_bounded() {
        let mut health = HealthState::new(20);
        assert_eq!(health.take_damage(15), 15);
        assert_eq!(health.take_damage(15), 5);
        assert_eq!(health.current(), 0);
        assert_eq!(health.heal(50), 20);
        assert_eq!(health.take_damage(-3), 0);
        health.take_damage(7);
        health.reset();
        assert!(health.is_full());
        assert_eq!(health.to_string(), "20/20");
    }
}
