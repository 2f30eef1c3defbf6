//! Per-account credit risk metrics: PD, LGD, EAD and expected loss

mod calculator;
mod metrics;

pub use calculator::{EnrichmentBatch, InvalidRecordPolicy, RiskMetricCalculator};
pub use metrics::{EnrichedAccount, RiskMetrics, RiskSegment};
