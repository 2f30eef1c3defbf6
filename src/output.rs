//! Flat output rows for CSV handoff to reporting and dashboards
//!
//! Every row type is a single level of primitive columns so the CSV header
//! is stable and the files load directly into a table.

use crate::account::DelinquencyState;
use crate::error::Result;
use crate::risk::EnrichedAccount;
use crate::rollrate::TransitionMatrix;
use crate::segment::{SegmentKey, SegmentSummary};
use crate::strategy::{StrategyComparison, StrategyResult};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Account with its risk metrics attached
#[derive(Debug, Clone, Serialize)]
pub struct AccountMetricsRow {
    pub customer_id: String,
    pub application_score: f64,
    pub income_band: &'static str,
    pub region: &'static str,
    pub credit_limit: f64,
    pub balance: f64,
    pub utilization_rate: f64,
    pub delinquency_status: u32,
    pub acceptance_decision: &'static str,
    pub pd_12m: f64,
    pub lgd: f64,
    pub ead: f64,
    pub expected_loss: f64,
    pub risk_score: u32,
    pub risk_segment: &'static str,
}

impl From<&EnrichedAccount> for AccountMetricsRow {
    fn from(e: &EnrichedAccount) -> Self {
        let a = &e.account;
        let m = &e.metrics;
        Self {
            customer_id: a.customer_id.clone(),
            application_score: a.application_score,
            income_band: a.income_band.as_str(),
            region: a.region.as_str(),
            credit_limit: a.credit_limit,
            balance: a.balance,
            utilization_rate: a.utilization_rate,
            delinquency_status: a.delinquency_status,
            acceptance_decision: a.acceptance_decision.as_str(),
            pd_12m: m.pd_12m,
            lgd: m.lgd,
            ead: m.ead,
            expected_loss: m.expected_loss,
            risk_score: m.risk_score,
            risk_segment: m.risk_segment.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentRow {
    pub segment: String,
    pub account_count: usize,
    pub total_balance: f64,
    pub total_credit_limit: f64,
    pub total_ead: f64,
    pub total_expected_loss: f64,
    pub weighted_utilization: f64,
    pub weighted_pd: f64,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub delinquent_count: usize,
    pub delinquency_rate: f64,
    pub loss_rate: f64,
}

impl SegmentRow {
    pub fn new(key: &SegmentKey, s: &SegmentSummary) -> Self {
        Self {
            segment: key.to_string(),
            account_count: s.account_count,
            total_balance: s.total_balance,
            total_credit_limit: s.total_credit_limit,
            total_ead: s.total_ead,
            total_expected_loss: s.total_expected_loss,
            weighted_utilization: s.weighted_utilization,
            weighted_pd: s.weighted_pd,
            avg_score: s.avg_score,
            min_score: s.min_score,
            max_score: s.max_score,
            delinquent_count: s.delinquent_count,
            delinquency_rate: s.delinquency_rate,
            loss_rate: s.loss_rate,
        }
    }
}

/// One cell of a transition matrix
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRow {
    pub from_state: &'static str,
    pub to_state: &'static str,
    pub probability: f64,
}

pub fn transition_rows(matrix: &TransitionMatrix) -> Vec<TransitionRow> {
    DelinquencyState::ALL
        .iter()
        .flat_map(|&from| {
            DelinquencyState::ALL.iter().map(move |&to| TransitionRow {
                from_state: from.as_str(),
                to_state: to.as_str(),
                probability: matrix.probability(from, to),
            })
        })
        .collect()
}

/// Ranked strategy with its levers and baseline deltas
#[derive(Debug, Clone, Serialize)]
pub struct StrategyRow {
    pub rank: usize,
    pub name: String,
    pub min_score: u16,
    pub limit_multiplier: f64,
    pub income_bands: String,
    pub eligible_count: usize,
    pub approved_count: usize,
    pub approval_rate: f64,
    pub portfolio_balance: f64,
    pub avg_approved_score: f64,
    pub delinquency_rate: f64,
    pub expected_loss_total: f64,
    pub monthly_revenue_estimate: f64,
    pub roa: f64,
    pub balance_change_pct: f64,
    pub roa_delta: f64,
}

impl StrategyRow {
    pub fn new(rank: usize, r: &StrategyResult, cmp: &StrategyComparison) -> Self {
        let bands: Vec<&str> = r.config.eligible_income_bands.iter().map(|b| b.as_str()).collect();
        Self {
            rank,
            name: r.config.name.clone(),
            min_score: r.config.min_score,
            limit_multiplier: r.config.limit_multiplier,
            income_bands: bands.join("+"),
            eligible_count: r.eligible_count,
            approved_count: r.approved_count,
            approval_rate: r.approval_rate,
            portfolio_balance: r.portfolio_balance,
            avg_approved_score: r.avg_approved_score,
            delinquency_rate: r.delinquency_rate,
            expected_loss_total: r.expected_loss_total,
            monthly_revenue_estimate: r.monthly_revenue_estimate,
            roa: r.roa,
            balance_change_pct: cmp.balance_change_pct,
            roa_delta: cmp.roa_delta,
        }
    }
}

/// Serialize rows as CSV with a header line
pub fn write_csv<T: Serialize, W: Write>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_path<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), rows)
}
