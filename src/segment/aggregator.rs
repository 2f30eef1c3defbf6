//! Segment aggregation with balance-weighted rate averages
//!
//! Rate-type fields (utilization, PD) are balance-weighted; simple averages
//! would let many small accounts dominate portfolio-level risk. Ratios with
//! a zero denominator resolve to 0.

use super::keys::{GroupBy, SegmentKey};
use crate::risk::EnrichedAccount;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Accounts per parallel chunk; chunk results merge in input order so
/// floating-point sums do not depend on thread scheduling
const AGGREGATION_CHUNK: usize = 4096;

/// Summary statistics for one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub account_count: usize,
    pub total_balance: f64,
    pub total_credit_limit: f64,
    pub total_ead: f64,
    pub total_expected_loss: f64,
    /// Balance-weighted utilization rate (percent)
    pub weighted_utilization: f64,
    /// Balance-weighted 12-month PD
    pub weighted_pd: f64,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub delinquent_count: usize,
    /// delinquent_count / account_count
    pub delinquency_rate: f64,
    /// total_expected_loss / total_ead
    pub loss_rate: f64,
}

/// Running sums for one segment
#[derive(Debug, Clone, Default)]
struct SegmentAccumulator {
    count: usize,
    balance: f64,
    credit_limit: f64,
    ead: f64,
    expected_loss: f64,
    utilization_x_balance: f64,
    pd_x_balance: f64,
    score_sum: f64,
    min_score: f64,
    max_score: f64,
    delinquent: usize,
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

impl SegmentAccumulator {
    fn add(&mut self, e: &EnrichedAccount) {
        let a = &e.account;
        let score = a.application_score;
        if self.count == 0 {
            self.min_score = score;
            self.max_score = score;
        } else {
            self.min_score = self.min_score.min(score);
            self.max_score = self.max_score.max(score);
        }
        self.count += 1;
        self.balance += a.balance;
        self.credit_limit += a.credit_limit;
        self.ead += e.metrics.ead;
        self.expected_loss += e.metrics.expected_loss;
        self.utilization_x_balance += a.utilization_rate * a.balance;
        self.pd_x_balance += e.metrics.pd_12m * a.balance;
        self.score_sum += score;
        if a.is_delinquent() {
            self.delinquent += 1;
        }
    }

    fn merge(&mut self, other: SegmentAccumulator) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other;
            return;
        }
        self.count += other.count;
        self.balance += other.balance;
        self.credit_limit += other.credit_limit;
        self.ead += other.ead;
        self.expected_loss += other.expected_loss;
        self.utilization_x_balance += other.utilization_x_balance;
        self.pd_x_balance += other.pd_x_balance;
        self.score_sum += other.score_sum;
        self.min_score = self.min_score.min(other.min_score);
        self.max_score = self.max_score.max(other.max_score);
        self.delinquent += other.delinquent;
    }

    fn finish(self) -> SegmentSummary {
        SegmentSummary {
            account_count: self.count,
            total_balance: self.balance,
            total_credit_limit: self.credit_limit,
            total_ead: self.ead,
            total_expected_loss: self.expected_loss,
            weighted_utilization: ratio(self.utilization_x_balance, self.balance),
            weighted_pd: ratio(self.pd_x_balance, self.balance),
            avg_score: ratio(self.score_sum, self.count as f64),
            min_score: self.min_score,
            max_score: self.max_score,
            delinquent_count: self.delinquent,
            delinquency_rate: ratio(self.delinquent as f64, self.count as f64),
            loss_rate: ratio(self.expected_loss, self.ead),
        }
    }
}

type Partial = HashMap<SegmentKey, SegmentAccumulator>;

fn merge_partials(mut into: Partial, from: Partial) -> Partial {
    for (key, acc) in from {
        into.entry(key).or_default().merge(acc);
    }
    into
}

/// Group accounts and summarize each distinct key combination present
///
/// Returns an unordered mapping; use [`sorted_by_loss_rate`] for the
/// presentation order.
pub fn aggregate(accounts: &[EnrichedAccount], group_by: &GroupBy) -> HashMap<SegmentKey, SegmentSummary> {
    let partials: Vec<Partial> = accounts
        .par_chunks(AGGREGATION_CHUNK)
        .map(|chunk| {
            let mut partial = Partial::new();
            for e in chunk {
                partial.entry(group_by.key_of(e)).or_default().add(e);
            }
            partial
        })
        .collect();

    partials
        .into_iter()
        .fold(Partial::new(), merge_partials)
        .into_iter()
        .map(|(key, acc)| (key, acc.finish()))
        .collect()
}

/// Segments in canonical presentation order: loss rate descending, then key
pub fn sorted_by_loss_rate(
    segments: HashMap<SegmentKey, SegmentSummary>,
) -> Vec<(SegmentKey, SegmentSummary)> {
    let mut rows: Vec<_> = segments.into_iter().collect();
    rows.sort_by(|(ka, a), (kb, b)| b.loss_rate.total_cmp(&a.loss_rate).then_with(|| ka.cmp(kb)));
    rows
}
