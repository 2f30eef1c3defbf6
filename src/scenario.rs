//! Analysis runner for repeated portfolio runs
//!
//! Builds the calculator once, then runs enrichment, segmentation, trend
//! projection and strategy search against any number of extracts.

use crate::account::Account;
use crate::assumptions::ModelConfig;
use crate::error::Result;
use crate::risk::{EnrichmentBatch, InvalidRecordPolicy, RiskMetricCalculator};
use crate::rollrate::{project_portfolio_trend, TransitionMatrix, TrendPoint};
use crate::segment::{aggregate, sorted_by_loss_rate, GroupBy, PortfolioMetrics, SegmentKey, SegmentSummary};
use crate::strategy::{
    evaluate, CancellationToken, SimulationReport, SimulationSettings, StrategyComparison,
    StrategyConfig, StrategyGrid, StrategySimulator,
};
use log::{info, warn};
use std::borrow::Cow;

/// Strategy search output with every ranked result compared to the baseline
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub baseline: crate::strategy::StrategyResult,
    pub report: SimulationReport,
    /// One per ranked result, in ranking order
    pub comparisons: Vec<StrategyComparison>,
}

/// Pre-built calculator plus the invalid-record policy used for enrichment
///
/// # Example
/// ```ignore
/// let runner = AnalysisRunner::from_config_path(Path::new("model.json"))?;
/// let batch = runner.enrich(&accounts)?;
/// let segments = runner.segments(&batch, &GroupBy::parse("region,risk_segment")?);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnalysisRunner {
    calculator: RiskMetricCalculator,
    policy: InvalidRecordPolicy,
}

impl AnalysisRunner {
    /// Runner with the default calibration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ModelConfig) -> Result<Self> {
        Ok(Self {
            calculator: RiskMetricCalculator::new(config)?,
            policy: InvalidRecordPolicy::default(),
        })
    }

    /// Load and validate a JSON model configuration
    pub fn from_config_path(path: &std::path::Path) -> Result<Self> {
        Self::with_config(ModelConfig::from_json_path(path)?)
    }

    pub fn with_policy(mut self, policy: InvalidRecordPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> InvalidRecordPolicy {
        self.policy
    }

    pub fn calculator(&self) -> &RiskMetricCalculator {
        &self.calculator
    }

    pub fn enrich(&self, accounts: &[Account]) -> Result<EnrichmentBatch> {
        Ok(self.calculator.enrich_batch(accounts, self.policy)?)
    }

    pub fn portfolio_metrics(&self, batch: &EnrichmentBatch) -> PortfolioMetrics {
        PortfolioMetrics::from_accounts(&batch.enriched)
    }

    /// Segment summaries in presentation order (loss rate descending)
    pub fn segments(&self, batch: &EnrichmentBatch, group_by: &GroupBy) -> Vec<(SegmentKey, SegmentSummary)> {
        sorted_by_loss_rate(aggregate(&batch.enriched, group_by))
    }

    pub fn trend(
        &self,
        batch: &EnrichmentBatch,
        matrix: &TransitionMatrix,
        periods: usize,
    ) -> Result<Vec<TrendPoint>> {
        Ok(project_portfolio_trend(&batch.enriched, matrix, periods)?)
    }

    /// Apply the invalid-record policy ahead of a strategy search
    ///
    /// Borrows the input when every account is valid.
    pub fn screen<'a>(&self, accounts: &'a [Account]) -> Result<Cow<'a, [Account]>> {
        let mut invalid = accounts.iter().filter_map(|a| a.validate().err()).peekable();
        if invalid.peek().is_none() {
            return Ok(Cow::Borrowed(accounts));
        }
        if self.policy == InvalidRecordPolicy::Abort {
            if let Some(err) = invalid.next() {
                return Err(err.into());
            }
        }
        for err in invalid {
            warn!("skipping account: {}", err);
        }

        let valid: Vec<Account> = accounts.iter().filter(|a| a.validate().is_ok()).cloned().collect();
        info!(
            "screened {} accounts ({} skipped)",
            valid.len(),
            accounts.len() - valid.len()
        );
        Ok(Cow::Owned(valid))
    }

    /// Search a strategy grid and compare each ranked result to the baseline
    ///
    /// Invalid accounts are dropped or abort the search according to the
    /// runner's policy. Pass a token to cancel the search from another thread.
    pub fn strategies(
        &self,
        accounts: &[Account],
        grid: &StrategyGrid,
        settings: SimulationSettings,
        cancel: Option<CancellationToken>,
    ) -> Result<StrategyRun> {
        let accounts = self.screen(accounts)?;
        let baseline = evaluate(&accounts, &self.calculator, 0, &StrategyConfig::baseline())?;
        let mut simulator = StrategySimulator::new(settings)?;
        if let Some(token) = cancel {
            simulator = simulator.with_cancellation(token);
        }
        let report = simulator.simulate_grid(&accounts, &self.calculator, grid);
        let comparisons = StrategyComparison::all(&baseline, &report.ranked);
        Ok(StrategyRun {
            baseline,
            report,
            comparisons,
        })
    }

    /// Portfolio metrics of the same extract under several calibrations
    pub fn run_scenarios(&self, accounts: &[Account], configs: &[ModelConfig]) -> Result<Vec<PortfolioMetrics>> {
        configs
            .iter()
            .map(|config| {
                let runner = Self::with_config(config.clone())?.with_policy(self.policy);
                let batch = runner.enrich(accounts)?;
                Ok(runner.portfolio_metrics(&batch))
            })
            .collect()
    }
}
