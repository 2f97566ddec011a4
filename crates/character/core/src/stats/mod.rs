//! Stat system - raw values, their sources, and everything derived from them.
//!
//! # Architecture
//!
//! ```text
//! [ Source buckets (StatLedger) ]
//!      ↓  Σ per stat
//! [ Raw totals ]
//!      ↓  ModifierCurve
//! [ Modifiers ]
//!      ↓  vitality only
//! [ HealthState ]
//! ```
//!
//! Only the buckets are state. Totals and modifiers are recomputed on read,
//! and health follows the vitality modifier after every mutation.

pub mod health;
pub mod ledger;
pub mod modifier;
pub mod stat;

pub use health::{HealthState, RecomputeReason};
pub use ledger::{LedgerError, SourceBreakdown, StatLedger};
pub use modifier::{ModifierCurve, modifier};
pub use stat::{Stat, StatBlock, StatSource};
