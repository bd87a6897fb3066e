//! Error types.
//!
//! Only two things can fail a generation run: an invalid configuration
//! and a catastrophic solver adapter failure. Everything that goes wrong
//! inside a single iteration (infeasible solve, over-cap lineup, duplicate)
//! is absorbed by the controller and reported as a statistic instead.

use thiserror::Error;

/// Errors that abort a generation run.
#[derive(Error, Debug)]
pub enum LineupError {
    #[error("Invalid configuration: {field} ({reason})")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Solver failure: {0}")]
    Solver(#[from] SolverError),
}

/// Catastrophic failures reported by an [`IpSolver`](crate::ip::IpSolver).
///
/// Infeasibility and timeouts are *not* errors; they are expressed through
/// [`SolverStatus`](crate::ip::SolverStatus).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Solver unavailable: {0}")]
    Unavailable(String),

    #[error("Solver crashed: {0}")]
    Crashed(String),
}

/// Reasons a raw player record is rejected at ingestion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Player record has an empty identifier")]
    MissingId,

    #[error("Invalid salary for {id}: {value:?}")]
    InvalidSalary { id: String, value: String },

    #[error("Invalid boost for {id}: {value:?}")]
    InvalidBoost { id: String, value: String },

    #[error("Duplicate player identifier: {0}")]
    DuplicateId(String),
}

pub type LineupResult<T> = Result<T, LineupError>;
