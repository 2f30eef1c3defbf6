//! Headline portfolio metrics

use crate::risk::EnrichedAccount;
use serde::Serialize;

/// Headline figures for an enriched extract
///
/// Balance, limit and rate figures cover approved accounts only. Rates are
/// fractions in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub total_customers: usize,
    pub approved_customers: usize,
    pub approval_rate: f64,
    pub portfolio_balance: f64,
    pub total_limits: f64,
    pub avg_utilization: f64,
    pub avg_score: f64,
    pub delinquent_customers: usize,
    pub delinquency_rate: f64,
    /// Approved accounts in the High or Very High risk segment
    pub high_risk_customers: usize,
    pub expected_loss: f64,
}

impl PortfolioMetrics {
    pub fn from_accounts(accounts: &[EnrichedAccount]) -> Self {
        let mut m = PortfolioMetrics {
            total_customers: accounts.len(),
            ..Default::default()
        };

        let mut utilization_sum = 0.0;
        let mut score_sum = 0.0;
        for e in accounts.iter().filter(|e| e.account.is_approved()) {
            m.approved_customers += 1;
            m.portfolio_balance += e.account.balance;
            m.total_limits += e.account.credit_limit;
            m.expected_loss += e.metrics.expected_loss;
            utilization_sum += e.account.utilization_rate;
            score_sum += e.account.application_score;
            if e.account.is_delinquent() {
                m.delinquent_customers += 1;
            }
            if e.metrics.risk_segment.is_elevated() {
                m.high_risk_customers += 1;
            }
        }

        if m.total_customers > 0 {
            m.approval_rate = m.approved_customers as f64 / m.total_customers as f64;
        }
        if m.approved_customers > 0 {
            let n = m.approved_customers as f64;
            m.avg_utilization = utilization_sum / n;
            m.avg_score = score_sum / n;
            m.delinquency_rate = m.delinquent_customers as f64 / n;
        }
        m
    }
}
