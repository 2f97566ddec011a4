//! Common error infrastructure for character-core.
//!
//! Domain-specific errors (e.g. `LedgerError`, `AllocationError`) are defined in
//! their respective modules alongside the operations they validate. This module
//! holds the shared classification every one of them reports through.
//!
//! # Taxonomy
//!
//! - **Validation**: bad caller input (unknown stat, over-allocation, a target
//!   level that is not above the current one, writing a derived meta field).
//! - **Internal**: rule data or declared history that cannot be reconciled
//!   (malformed race table, a current stat lower than the rules guarantee).
//!
//! Recoverable bookkeeping gaps never surface as errors; the validator repairs
//! them and reports a warning instead.

/// Severity level of an error, used for categorization and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid input, should not retry without changes.
    ///
    /// Examples: unknown class for a tier, allocation exceeding the pool
    Validation,

    /// Rule data or declared history is inconsistent.
    ///
    /// Examples: overlapping race level ranges, impossible stat totals
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error points at rule data rather than caller input.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all character-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on who has to fix it, not on impact
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for error categorization and testing.
    fn error_code(&self) -> &'static str;
}
