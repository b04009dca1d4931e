// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Choreo Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all choreography kernel failures.
///
/// No variant is fatal: whoever returns one leaves the network in its
/// last valid state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChoreoError {
    /// A shape (coupling matrix, matrix row or per-unit array) does not
    /// match the size it must agree with.
    #[error("configuration mismatch: expected {expected}, found {found}")]
    ConfigurationMismatch { expected: usize, found: usize },

    /// Phase or frequency override vector has the wrong length.
    #[error("invalid override arity: expected 1 or {expected} values, got {found}")]
    InvalidOverrideArity { expected: usize, found: usize },

    /// Pattern selector outside the closed pattern set.
    #[error("invalid pattern index {index} (valid range 0..={max})")]
    InvalidIndex { index: i64, max: usize },

    /// Configuration document failed validation or parsing.
    #[error("config error: {0}")]
    Config(String),

    /// Numerical error (NaN/Inf in an input vector).
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type ChoreoResult<T> = Result<T, ChoreoError>;
