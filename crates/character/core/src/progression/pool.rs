//! Free-point pool.
//!
//! Progression grants points into the pool; only allocation spends them, and an
//! allocation never exceeds what is available.

use rand::Rng;

use crate::error::{EngineError, ErrorSeverity};
use crate::stats::{LedgerError, Stat, StatBlock, StatLedger, StatSource};

/// Errors raised by free-point allocation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("allocation amount must be positive, got {amount}")]
    NonPositive { amount: i32 },

    #[error("cannot allocate {requested} points, only {available} available")]
    Insufficient { requested: u32, available: u32 },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EngineError for AllocationError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositive { .. } => "ALLOCATION_NON_POSITIVE",
            Self::Insufficient { .. } => "ALLOCATION_INSUFFICIENT",
            Self::Ledger(inner) => inner.error_code(),
        }
    }
}

/// Unspent free points of one character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FreePointPool {
    available: u32,
}

impl FreePointPool {
    pub const fn new(available: u32) -> Self {
        Self { available }
    }

    pub const fn available(&self) -> u32 {
        self.available
    }

    pub const fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub(crate) fn grant(&mut self, points: u32) {
        self.available += points;
    }

    /// Takes back previously granted points; fails if they were already spent.
    pub(crate) fn revoke(&mut self, points: u32) -> Option<()> {
        self.available = self.available.checked_sub(points)?;
        Some(())
    }

    /// Raises the pool to at least `floor`, returning how much was added.
    pub(crate) fn raise_to(&mut self, floor: u32) -> u32 {
        let added = floor.saturating_sub(self.available);
        self.available += added;
        added
    }

    /// Spends `amount` points on `stat` under the `free_points` source.
    ///
    /// Returns the points left in the pool.
    pub fn allocate(
        &mut self,
        ledger: &mut StatLedger,
        stat: Stat,
        amount: i32,
    ) -> Result<u32, AllocationError> {
        let requested = u32::try_from(amount)
            .ok()
            .filter(|&requested| requested > 0)
            .ok_or(AllocationError::NonPositive { amount })?;
        if requested > self.available {
            return Err(AllocationError::Insufficient {
                requested,
                available: self.available,
            });
        }

        ledger.add_contribution(stat, StatSource::FreePoints, amount)?;
        self.available -= requested;
        tracing::debug!(%stat, amount, remaining = self.available, "free points allocated");
        Ok(self.available)
    }

    /// Allocates one point at a time to uniformly chosen stats until empty.
    ///
    /// Returns how many points each stat received.
    pub fn allocate_random_all<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut StatLedger,
        rng: &mut R,
    ) -> Result<StatBlock, AllocationError> {
        let mut tally = StatBlock::ZERO;
        while self.available > 0 {
            let stat = Stat::ALL[rng.gen_range(0..Stat::COUNT)];
            self.allocate(ledger, stat, 1)?;
            tally[stat] += 1;
        }
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ledger() -> StatLedger {
        StatLedger::new(StatBlock::splat(5)).unwrap()
    }

    #[test]
    fn allocation_guard() {
        let mut ledger = ledger();
        let mut pool = FreePointPool::new(3);

        assert_eq!(
            pool.allocate(&mut ledger, Stat::Dexterity, 0),
            Err(AllocationError::NonPositive { amount: 0 })
        );
        assert_eq!(
            pool.allocate(&mut ledger, Stat::Dexterity, -2),
            Err(AllocationError::NonPositive { amount: -2 })
        );
        assert_eq!(
            pool.allocate(&mut ledger, Stat::Dexterity, 4),
            Err(AllocationError::Insufficient {
                requested: 4,
                available: 3
            })
        );
        assert_eq!(ledger.current(Stat::Dexterity), 5);

        assert_eq!(pool.allocate(&mut ledger, Stat::Dexterity, 3), Ok(0));
        assert_eq!(ledger.contribution(Stat::Dexterity, StatSource::FreePoints), 3);
        assert!(pool.is_empty());
    }

    #[test]
    fn random_allocation_spends_everything() {
        let mut ledger = ledger();
        let mut pool = FreePointPool::new(40);
        let mut rng = StdRng::seed_from_u64(7);

        let tally = pool.allocate_random_all(&mut ledger, &mut rng).unwrap();
        assert!(pool.is_empty());
        assert_eq!(tally.sum(), 40);
        assert_eq!(ledger.source_totals(StatSource::FreePoints), tally);
        assert_eq!(ledger.totals().sum(), 9 * 5 + 40);
    }

    #[test]
    fn revoke_and_raise() {
        let mut pool = FreePointPool::new(2);
        assert!(pool.revoke(3).is_none());
        assert_eq!(pool.available(), 2);
        assert!(pool.revoke(2).is_some());
        assert_eq!(pool.raise_to(5), 5);
        assert_eq!(pool.raise_to(1), 0);
        pool.grant(1);
        assert_eq!(pool.available(), 6);
    }
}
