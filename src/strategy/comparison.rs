//! Strategy outcomes relative to the pass-through baseline

use super::simulator::StrategyResult;
use serde::Serialize;

/// Differences of a strategy against a baseline (strategy minus baseline)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyComparison {
    pub name: String,
    pub approved_count_delta: i64,
    pub approval_rate_delta: f64,
    /// Percent change in portfolio balance; 0 when the baseline has none
    pub balance_change_pct: f64,
    pub delinquency_rate_delta: f64,
    pub avg_score_delta: f64,
    pub expected_loss_delta: f64,
    pub roa_delta: f64,
}

impl StrategyComparison {
    pub fn against(baseline: &StrategyResult, strategy: &StrategyResult) -> Self {
        let balance_change_pct = if baseline.portfolio_balance > 0.0 {
            (strategy.portfolio_balance - baseline.portfolio_balance) / baseline.portfolio_balance
                * 100.0
        } else {
            0.0
        };

        Self {
            name: strategy.config.name.clone(),
            approved_count_delta: strategy.approved_count as i64 - baseline.approved_count as i64,
            approval_rate_delta: strategy.approval_rate - baseline.approval_rate,
            balance_change_pct,
            delinquency_rate_delta: strategy.delinquency_rate - baseline.delinquency_rate,
            avg_score_delta: strategy.avg_approved_score - baseline.avg_approved_score,
            expected_loss_delta: strategy.expected_loss_total - baseline.expected_loss_total,
            roa_delta: strategy.roa - baseline.roa,
        }
    }

    /// Compare every result against the same baseline, preserving order
    pub fn all(baseline: &StrategyResult, results: &[StrategyResult]) -> Vec<Self> {
        results.iter().map(|r| Self::against(baseline, r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::fixtures::account;
    use crate::account::{Account, IncomeBand};
    use crate::risk::RiskMetricCalculator;
    use crate::strategy::{evaluate, StrategyConfig};
    use approx::assert_relative_eq;

    fn book() -> Vec<Account> {
        let mut late = account("C", 540.0, 2_000.0);
        late.delinquency_status = 40;
        vec![account("A", 720.0, 1_000.0), account("B", 680.0, 3_000.0), late]
    }

    #[test]
    fn test_tighter_strategy_against_baseline() {
        let calc = RiskMetricCalculator::default();
        let accounts = book();
        let baseline = evaluate(&accounts, &calc, 0, &StrategyConfig::baseline()).unwrap();
        let strict = evaluate(
            &accounts,
            &calc,
            1,
            &StrategyConfig::new("strict", 650, 1.0, IncomeBand::ALL),
        )
        .unwrap();

        let cmp = StrategyComparison::against(&baseline, &strict);
        assert_eq!(cmp.name, "strict");
        assert_eq!(cmp.approved_count_delta, -1);
        assert_relative_eq!(cmp.approval_rate_delta, -1.0 / 3.0);
        assert_relative_eq!(cmp.balance_change_pct, -2_000.0 / 6_000.0 * 100.0);
        assert_relative_eq!(cmp.delinquency_rate_delta, -1.0 / 3.0);
        assert_relative_eq!(cmp.avg_score_delta, 700.0 - 1_940.0 / 3.0);
        assert!(cmp.expected_loss_delta < 0.0);
    }

    #[test]
    fn test_baseline_against_itself_is_zero() {
        let calc = RiskMetricCalculator::default();
        let baseline = evaluate(&book(), &calc, 0, &StrategyConfig::baseline()).unwrap();
        let cmp = StrategyComparison::against(&baseline, &baseline);
        assert_eq!(cmp.approved_count_delta, 0);
        assert_eq!(cmp.balance_change_pct, 0.0);
        assert_eq!(cmp.roa_delta, 0.0);
    }

    #[test]
    fn test_zero_baseline_balance() {
        let calc = RiskMetricCalculator::default();
        let empty = evaluate(&[], &calc, 0, &StrategyConfig::baseline()).unwrap();
        let cmp = StrategyComparison::against(&empty, &empty);
        assert_eq!(cmp.balance_change_pct, 0.0);
    }
}
