//! Error taxonomy for the portfolio core
//!
//! - [`ValidationError`]: a single malformed input record. The caller decides
//!   whether to drop the record or abort the batch.
//! - [`ModelError`]: a numerical invariant was broken (row normalization,
//!   mass conservation). Fatal for the computation that raised it.
//! - [`ConfigurationError`]: bad model parameters or strategy levers,
//!   rejected before any work starts.

use thiserror::Error;

/// A malformed account or snapshot record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("account {account_id}: application score {score} outside [300, 900]")]
    ScoreOutOfRange { account_id: String, score: f64 },

    #[error("account {account_id}: {field} must be a finite non-negative number, got {value}")]
    NegativeOrNonFinite {
        account_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("account {account_id}: unrecognized {field} '{value}'")]
    UnknownCategory {
        account_id: String,
        field: &'static str,
        value: String,
    },

    #[error("account {account_id}: {field} '{value}' is not a number")]
    MalformedField {
        account_id: String,
        field: &'static str,
        value: String,
    },

    #[error("record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("account {account_id}: delinquency status {value} is negative")]
    NegativeDelinquency { account_id: String, value: i64 },

    #[error("duplicate snapshot date {date}")]
    DuplicateSnapshotDate { date: chrono::NaiveDate },
}

/// A broken numerical invariant inside a model computation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("transition row for {state} sums to {sum}, expected 1")]
    RowNotNormalized { state: &'static str, sum: f64 },

    #[error("transition probability {value} for {from} -> {to} outside [0, 1]")]
    ProbabilityOutOfRange {
        from: &'static str,
        to: &'static str,
        value: f64,
    },

    #[error("distribution mass {mass} at period {period} violates conservation")]
    MassNotConserved { period: usize, mass: f64 },

    #[error("distribution component {value} for {state} is not a probability")]
    InvalidDistribution { state: &'static str, value: f64 },
}

/// Invalid model parameters or strategy levers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("invalid model parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("unknown PD model term '{0}'")]
    UnknownTerm(String),

    #[error("strategy '{name}': min_score {min_score} outside [300, 900]")]
    MinScoreOutOfRange { name: String, min_score: u16 },

    #[error("strategy '{name}': limit multiplier {multiplier} outside [{min}, {max}]")]
    MultiplierOutOfRange {
        name: String,
        multiplier: f64,
        min: f64,
        max: f64,
    },

    #[error("strategy '{name}': no eligible income bands")]
    NoIncomeBands { name: String },

    #[error("unknown income band '{0}'")]
    UnknownIncomeBand(String),

    #[error("unknown group-by key '{0}'")]
    UnknownGroupKey(String),

    #[error("group-by key {0} listed more than once")]
    DuplicateGroupKey(&'static str),

    #[error("strategy grid lever '{0}' has no values")]
    EmptyLever(&'static str),

    #[error("worker pool: {0}")]
    WorkerPool(String),
}

/// Umbrella error for loaders and pipeline entry points
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
