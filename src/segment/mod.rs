//! Segment-level aggregation and portfolio reporting

mod aggregator;
mod alerts;
mod keys;
mod portfolio;

pub use aggregator::{aggregate, sorted_by_loss_rate, SegmentSummary};
pub use alerts::{HighRiskAlert, HighRiskFilter, HIGH_UTILIZATION_PCT};
pub use keys::{GroupBy, GroupKey, ScoreBand, SegmentKey, SegmentValue};
pub use portfolio::PortfolioMetrics;
