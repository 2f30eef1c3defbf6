//! Strategy simulation over a grid of lending-policy configurations
//!
//! Each configuration is evaluated independently against the same shared,
//! read-only accounts and calculator, so evaluations run on a fixed worker
//! pool without locking. Only already-approved accounts are re-underwritten:
//! the extract records actual outcomes, so a declined application cannot be
//! replayed as approved even when it would pass a looser threshold.

use super::config::{StrategyConfig, StrategyGrid};
use crate::account::Account;
use crate::error::{ConfigurationError, ValidationError};
use crate::risk::RiskMetricCalculator;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Outcome of one configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyResult {
    /// Position of the configuration in the input sequence
    pub index: usize,
    pub config: StrategyConfig,
    pub eligible_count: usize,
    pub approved_count: usize,
    /// approved_count / total accounts
    pub approval_rate: f64,
    pub portfolio_balance: f64,
    pub total_credit_limit: f64,
    pub total_ead: f64,
    pub avg_approved_score: f64,
    /// Delinquent share of approved accounts
    pub delinquency_rate: f64,
    pub expected_loss_total: f64,
    /// portfolio_balance * APR / 12
    pub monthly_revenue_estimate: f64,
    /// (revenue - expected loss) / balance; 0 when balance is 0
    pub roa: f64,
}

/// Total ranking order: ROA descending, then balance descending, then index
pub fn rank_order(a: &StrategyResult, b: &StrategyResult) -> Ordering {
    b.roa
        .total_cmp(&a.roa)
        .then_with(|| b.portfolio_balance.total_cmp(&a.portfolio_balance))
        .then_with(|| a.index.cmp(&b.index))
}

/// Sort results into ranking order
pub fn rank(results: &mut [StrategyResult]) {
    results.sort_by(rank_order);
}

/// A configuration whose evaluation faulted
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyFailure {
    pub index: usize,
    pub config: StrategyConfig,
    pub error: ValidationError,
}

/// Ranked results plus everything that did not make it into the ranking
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub ranked: Vec<StrategyResult>,
    /// Failed configurations, by index
    pub failures: Vec<StrategyFailure>,
    /// Configurations not evaluated because the run was cancelled
    pub skipped: usize,
}

impl SimulationReport {
    pub fn best(&self) -> Option<&StrategyResult> {
        self.ranked.first()
    }

    pub fn evaluated(&self) -> usize {
        self.ranked.len() + self.failures.len()
    }
}

/// Evaluate one configuration against the book
///
/// Eligible accounts pass the score threshold and income-band filter. Of
/// those, approved accounts get the scaled limit and freshly computed
/// metrics. Invalid account data in the approved set fails the evaluation.
pub fn evaluate(
    accounts: &[Account],
    calculator: &RiskMetricCalculator,
    index: usize,
    config: &StrategyConfig,
) -> Result<StrategyResult, ValidationError> {
    let min_score = f64::from(config.min_score);
    let apr = calculator.config().apr;

    let mut eligible_count = 0;
    let mut approved_count = 0;
    let mut delinquent = 0;
    let mut balance = 0.0;
    let mut credit_limit = 0.0;
    let mut ead = 0.0;
    let mut expected_loss = 0.0;
    let mut score_sum = 0.0;

    for account in accounts {
        if account.application_score < min_score || !config.is_eligible_band(account.income_band) {
            continue;
        }
        eligible_count += 1;
        if !account.is_approved() {
            continue;
        }

        let adjusted = account.with_limit_multiplier(config.limit_multiplier);
        let metrics = calculator.compute_metrics(&adjusted)?;

        approved_count += 1;
        balance += adjusted.balance;
        credit_limit += adjusted.credit_limit;
        ead += metrics.ead;
        expected_loss += metrics.expected_loss;
        score_sum += adjusted.application_score;
        if adjusted.is_delinquent() {
            delinquent += 1;
        }
    }

    let monthly_revenue_estimate = balance * apr / 12.0;
    let per_approved = |x: f64| {
        if approved_count > 0 {
            x / approved_count as f64
        } else {
            0.0
        }
    };

    Ok(StrategyResult {
        index,
        config: config.clone(),
        eligible_count,
        approved_count,
        approval_rate: if accounts.is_empty() {
            0.0
        } else {
            approved_count as f64 / accounts.len() as f64
        },
        portfolio_balance: balance,
        total_credit_limit: credit_limit,
        total_ead: ead,
        avg_approved_score: per_approved(score_sum),
        delinquency_rate: per_approved(delinquent as f64),
        expected_loss_total: expected_loss,
        monthly_revenue_estimate,
        roa: if balance > 0.0 {
            (monthly_revenue_estimate - expected_loss) / balance
        } else {
            0.0
        },
    })
}

/// Shared flag that stops a running simulation from starting new evaluations
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Worker threads in the simulation pool
    pub workers: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

enum Outcome {
    Done(StrategyResult),
    Failed(StrategyFailure),
    Skipped,
}

/// Runs configurations on a dedicated fixed-size worker pool
#[derive(Debug)]
pub struct StrategySimulator {
    pool: rayon::ThreadPool,
    token: CancellationToken,
}

impl StrategySimulator {
    pub fn new(settings: SimulationSettings) -> Result<Self, ConfigurationError> {
        if settings.workers == 0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "workers",
                reason: "need at least one worker".to_string(),
            });
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.workers)
            .thread_name(|i| format!("strategy-sim-{}", i))
            .build()
            .map_err(|e| ConfigurationError::WorkerPool(e.to_string()))?;

        Ok(Self {
            pool,
            token: CancellationToken::new(),
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Use a caller-owned token instead of the simulator's own
    ///
    /// A cancelled token stays cancelled, so give each run that must be
    /// stoppable independently its own token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Token that cancels runs of this simulator; clone it to another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Evaluate every configuration of a grid without materializing it
    pub fn simulate_grid(
        &self,
        accounts: &[Account],
        calculator: &RiskMetricCalculator,
        grid: &StrategyGrid,
    ) -> SimulationReport {
        info!(
            "simulating {} configurations over {} accounts on {} workers",
            grid.len(),
            accounts.len(),
            self.workers()
        );
        self.run(accounts, calculator, grid.iter())
    }

    /// Evaluate explicit configurations; all are validated before any runs
    pub fn simulate(
        &self,
        accounts: &[Account],
        calculator: &RiskMetricCalculator,
        configs: &[StrategyConfig],
    ) -> Result<SimulationReport, ConfigurationError> {
        for config in configs {
            config.validate()?;
        }
        info!(
            "simulating {} configurations over {} accounts on {} workers",
            configs.len(),
            accounts.len(),
            self.workers()
        );
        Ok(self.run(accounts, calculator, configs.iter().cloned()))
    }

    fn run<I>(&self, accounts: &[Account], calculator: &RiskMetricCalculator, configs: I) -> SimulationReport
    where
        I: Iterator<Item = StrategyConfig> + Send,
    {
        if self.token.is_cancelled() {
            warn!("cancellation token already set, no configuration will run");
        }
        let token = &self.token;
        let outcomes: Vec<Outcome> = self.pool.install(|| {
            configs
                .enumerate()
                .par_bridge()
                .map(|(index, config)| {
                    if token.is_cancelled() {
                        return Outcome::Skipped;
                    }
                    match evaluate(accounts, calculator, index, &config) {
                        Ok(result) => {
                            debug!(
                                "{}: approved {} balance {:.2} roa {:.6}",
                                config.name, result.approved_count, result.portfolio_balance, result.roa
                            );
                            Outcome::Done(result)
                        }
                        Err(error) => {
                            warn!("configuration '{}' failed: {}", config.name, error);
                            Outcome::Failed(StrategyFailure { index, config, error })
                        }
                    }
                })
                .collect()
        });

        let mut report = SimulationReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Done(result) => report.ranked.push(result),
                Outcome::Failed(failure) => report.failures.push(failure),
                Outcome::Skipped => report.skipped += 1,
            }
        }
        rank(&mut report.ranked);
        report.failures.sort_by_key(|f| f.index);

        if report.skipped > 0 {
            warn!("simulation cancelled: {} configurations skipped", report.skipped);
        }
        info!(
            "evaluated {} configurations ({} failed)",
            report.evaluated(),
            report.failures.len()
        );
        report
    }
}
