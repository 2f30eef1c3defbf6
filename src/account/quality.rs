//! Data-quality checks over a loaded extract
//!
//! Informational only. Nothing here rejects or alters an account.

use super::Account;
use serde::Serialize;
use std::collections::HashMap;

/// Observed min/max of a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, v| match acc {
            None => Some(Range { min: v, max: v }),
            Some(r) => Some(Range {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub row_count: usize,
    /// Customer ids appearing more than once, sorted
    pub duplicate_customers: Vec<String>,
    pub score_range: Option<Range>,
    pub credit_limit_range: Option<Range>,
    pub balance_range: Option<Range>,
    /// Accounts with balance above credit_limit * tolerance
    pub excess_utilization_count: usize,
    /// Accounts that fail field validation
    pub invalid_count: usize,
}

impl DataQualityReport {
    pub fn assess(accounts: &[Account], excess_tolerance: f64) -> Self {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for acct in accounts {
            *seen.entry(acct.customer_id.as_str()).or_insert(0) += 1;
        }
        let mut duplicate_customers: Vec<String> = seen
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(id, _)| id.to_string())
            .collect();
        duplicate_customers.sort();

        Self {
            row_count: accounts.len(),
            duplicate_customers,
            score_range: Range::of(accounts.iter().map(|a| a.application_score)),
            credit_limit_range: Range::of(accounts.iter().map(|a| a.credit_limit)),
            balance_range: Range::of(accounts.iter().map(|a| a.balance)),
            excess_utilization_count: accounts
                .iter()
                .filter(|a| a.has_excess_utilization(excess_tolerance))
                .count(),
            invalid_count: accounts.iter().filter(|a| a.validate().is_err()).count(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.duplicate_customers.is_empty()
            && self.excess_utilization_count == 0
            && self.invalid_count == 0
    }
}
