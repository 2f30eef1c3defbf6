//! Credit Portfolio - risk metrics and lending strategy simulation for a
//! retail credit-card book
//!
//! This library provides:
//! - Per-account PD, LGD, EAD and expected loss
//! - Delinquency roll-rate estimation and forward projection
//! - Segment aggregation with balance-weighted rates
//! - Parallel grid search over lending-policy levers

pub mod account;
pub mod assumptions;
pub mod error;
pub mod output;
pub mod risk;
pub mod rollrate;
pub mod scenario;
pub mod segment;
pub mod strategy;

// Re-export commonly used types
pub use account::{Account, DelinquencyState, IncomeBand, Region};
pub use assumptions::ModelConfig;
pub use error::{ConfigurationError, Error, ModelError, Result, ValidationError};
pub use risk::{EnrichedAccount, RiskMetricCalculator, RiskMetrics, RiskSegment};
pub use rollrate::TransitionMatrix;
pub use scenario::AnalysisRunner;
pub use segment::{aggregate, GroupBy, SegmentSummary};
pub use strategy::{StrategyConfig, StrategyGrid, StrategyResult, StrategySimulator};
