//! High-risk customer alert filter

use crate::risk::EnrichedAccount;
use serde::{Deserialize, Serialize};

/// Utilization (percent) above which an alerted account counts as highly utilized
pub const HIGH_UTILIZATION_PCT: f64 = 80.0;

/// Thresholds selecting approved accounts for review
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighRiskFilter {
    pub min_balance: f64,
    pub max_score: f64,
    /// Percent
    pub min_utilization: f64,
}

impl Default for HighRiskFilter {
    fn default() -> Self {
        Self {
            min_balance: 1_000.0,
            max_score: 650.0,
            min_utilization: 50.0,
        }
    }
}

/// Accounts matching a [`HighRiskFilter`], riskiest first
#[derive(Debug, Clone)]
pub struct HighRiskAlert<'a> {
    pub accounts: Vec<&'a EnrichedAccount>,
    pub delinquent_count: usize,
    pub high_utilization_count: usize,
}

impl<'a> HighRiskAlert<'a> {
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn exposure(&self) -> f64 {
        self.accounts.iter().map(|e| e.account.balance).sum()
    }
}

impl HighRiskFilter {
    pub fn matches(&self, e: &EnrichedAccount) -> bool {
        let a = &e.account;
        a.is_approved()
            && a.balance >= self.min_balance
            && a.application_score <= self.max_score
            && a.utilization_rate >= self.min_utilization
    }

    /// Select matching accounts ordered by risk score descending, then
    /// balance descending, then customer id
    pub fn apply<'a>(&self, accounts: &'a [EnrichedAccount]) -> HighRiskAlert<'a> {
        let mut selected: Vec<&EnrichedAccount> =
            accounts.iter().filter(|e| self.matches(e)).collect();
        selected.sort_by(|a, b| {
            b.metrics
                .risk_score
                .cmp(&a.metrics.risk_score)
                .then_with(|| b.account.balance.total_cmp(&a.account.balance))
                .then_with(|| a.account.customer_id.cmp(&b.account.customer_id))
        });

        HighRiskAlert {
            delinquent_count: selected.iter().filter(|e| e.account.is_delinquent()).count(),
            high_utilization_count: selected
                .iter()
                .filter(|e| e.account.utilization_rate > HIGH_UTILIZATION_PCT)
                .count(),
            accounts: selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::fixtures::account;
    use crate::account::AcceptanceDecision;
    use crate::risk::RiskMetricCalculator;

    fn enriched() -> Vec<EnrichedAccount> {
        let mut late = account("LATE", 600.0, 3_000.0);
        late.delinquency_status = 70;
        let mut declined = account("DECL", 500.0, 4_500.0);
        declined.acceptance_decision = AcceptanceDecision::Declined;
        let accounts = vec![
            account("HIGH", 560.0, 4_500.0), // 90% utilized
            account("SAFE", 780.0, 4_000.0), // score too high
            account("SMALL", 520.0, 500.0),  // balance too low
            late,
            declined,
            account("MID", 640.0, 2_600.0),
        ];
        RiskMetricCalculator::default()
            .enrich_batch(&accounts, Default::default())
            .unwrap()
            .enriched
    }

    #[test]
    fn test_filter_and_order() {
        let book = enriched();
        let alert = HighRiskFilter::default().apply(&book);
        let ids: Vec<&str> = alert
            .accounts
            .iter()
            .map(|e| e.account.customer_id.as_str())
            .collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&"HIGH"));
        assert!(ids.contains(&"LATE"));
        assert!(ids.contains(&"MID"));
        assert!(!ids.contains(&"DECL"));

        for w in alert.accounts.windows(2) {
            assert!(w[0].metrics.risk_score >= w[1].metrics.risk_score);
        }
        assert_eq!(alert.delinquent_count, 1);
        assert_eq!(alert.high_utilization_count, 1);
        assert_eq!(alert.exposure(), 4_500.0 + 3_000.0 + 2_600.0);
    }

    #[test]
    fn test_ties_break_on_balance_then_id() {
        let calc = RiskMetricCalculator::default();
        let accounts = vec![
            account("B", 600.0, 3_000.0),
            account("A", 600.0, 3_000.0),
            account("C", 600.0, 3_000.0),
        ];
        let book = calc.enrich_batch(&accounts, Default::default()).unwrap().enriched;
        let alert = HighRiskFilter::default().apply(&book);
        let ids: Vec<&str> = alert
            .accounts
            .iter()
            .map(|e| e.account.customer_id.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }
}
