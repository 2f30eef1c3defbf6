//! Account data structures, extract loading and data-quality checks

mod data;
pub mod loader;
mod quality;

pub use data::{
    Account, AcceptanceDecision, DelinquencyState, IncomeBand, Region, MAX_APPLICATION_SCORE,
    MIN_APPLICATION_SCORE,
};
pub use loader::{load_accounts, load_accounts_from_reader, LoadReport};
pub use quality::{DataQualityReport, Range};

#[cfg(test)]
pub(crate) use data::fixtures;
