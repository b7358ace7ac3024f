//! # RankError
//!
//! Centralized error handling for the rankpair engine.
//! The first two variants are normal terminal conditions of the judging
//! loop, not faults; callers are expected to match on them.

use thiserror::Error;

/// The primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum RankError {
    /// Fewer than 2 items exist, so no pair can be offered.
    #[error("not enough items to compare: need at least 2, have {0}")]
    InsufficientItems(usize),

    /// The judge has already voted on every unordered pair.
    #[error("all pairs have been judged")]
    PairsExhausted,

    /// A choice other than "1" or "2" was submitted. Recoverable; the
    /// pending offer is left untouched so the same pair can be re-prompted.
    #[error("invalid choice {0:?}: expected 1 or 2")]
    InvalidChoice(String),

    /// Resource not found (e.g., item referenced by a stale session).
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Persistence failure. The previously committed snapshot remains
    /// authoritative; the operation is not retried automatically.
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

/// A specialized Result type for engine logic.
pub type Result<T> = std::result::Result<T, RankError>;
