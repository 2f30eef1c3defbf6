//! Per-account risk metric computation
//!
//! The calculator is a pure function of the account and the [`ModelConfig`]
//! it was built with. Calculators with different calibrations can coexist.

use super::metrics::{EnrichedAccount, RiskMetrics};
use crate::account::Account;
use crate::assumptions::ModelConfig;
use crate::error::{ConfigurationError, ValidationError};
use log::{info, warn};
use rayon::prelude::*;

/// What to do with accounts that fail validation during batch enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidRecordPolicy {
    /// Drop the record and report it
    #[default]
    Skip,
    /// Fail the whole batch on the first invalid record (in input order)
    Abort,
}

/// Enriched accounts plus the records that were dropped
#[derive(Debug, Clone, Default)]
pub struct EnrichmentBatch {
    pub enriched: Vec<EnrichedAccount>,
    pub rejected: Vec<ValidationError>,
}

#[derive(Debug, Clone)]
pub struct RiskMetricCalculator {
    config: ModelConfig,
}

impl RiskMetricCalculator {
    pub fn new(config: ModelConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Compute PD, LGD, EAD and expected loss for one account
    pub fn compute_metrics(&self, account: &Account) -> Result<RiskMetrics, ValidationError> {
        account.validate()?;

        let state = account.delinquency_state();
        let pd_12m = self.config.pd_model.probability(
            account.application_score,
            account.utilization_rate,
            state,
        );
        let lgd = self.config.lgd.lgd(state);
        let ead = (account.balance + self.config.ead_ccf * account.undrawn()).max(0.0);
        let expected_loss = (pd_12m * lgd * ead).clamp(0.0, ead);

        let risk_score = (pd_12m * 1000.0).round() as u32;
        let risk_segment = self.config.score_bands.segment(risk_score);

        Ok(RiskMetrics {
            pd_12m,
            lgd,
            ead,
            expected_loss,
            risk_score,
            risk_segment,
        })
    }

    pub fn enrich(&self, account: &Account) -> Result<EnrichedAccount, ValidationError> {
        let metrics = self.compute_metrics(account)?;
        Ok(EnrichedAccount {
            account: account.clone(),
            metrics,
        })
    }

    /// Enrich a batch in parallel; output order follows input order
    pub fn enrich_batch(
        &self,
        accounts: &[Account],
        policy: InvalidRecordPolicy,
    ) -> Result<EnrichmentBatch, ValidationError> {
        let results: Vec<Result<EnrichedAccount, ValidationError>> =
            accounts.par_iter().map(|a| self.enrich(a)).collect();

        let mut batch = EnrichmentBatch::default();
        for result in results {
            match result {
                Ok(enriched) => batch.enriched.push(enriched),
                Err(err) if policy == InvalidRecordPolicy::Abort => return Err(err),
                Err(err) => {
                    warn!("skipping account: {}", err);
                    batch.rejected.push(err);
                }
            }
        }

        info!(
            "enriched {} accounts ({} skipped)",
            batch.enriched.len(),
            batch.rejected.len()
        );
        Ok(batch)
    }
}

impl Default for RiskMetricCalculator {
    fn default() -> Self {
        Self {
            config: ModelConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::fixtures::account;
    use crate::account::{AcceptanceDecision, IncomeBand, Region};
    use crate::risk::RiskSegment;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_ead_uses_ccf_on_undrawn() {
        let calc = RiskMetricCalculator::default();
        let acct = account("A1", 700.0, 1_000.0); // limit 5000
        let m = calc.compute_metrics(&acct).unwrap();
        assert_relative_eq!(m.ead, 1_000.0 + 0.75 * 4_000.0);
        assert_relative_eq!(m.expected_loss, m.pd_12m * m.lgd * m.ead, epsilon = 1e-9);
    }

    #[test]
    fn test_overlimit_ead_is_balance() {
        let calc = RiskMetricCalculator::default();
        let mut acct = account("A1", 700.0, 6_000.0);
        acct.utilization_rate = 120.0;
        let m = calc.compute_metrics(&acct).unwrap();
        assert_relative_eq!(m.ead, 6_000.0);
    }

    #[test]
    fn test_zero_exposure() {
        let calc = RiskMetricCalculator::default();
        let mut acct = account("A1", 700.0, 0.0);
        acct.credit_limit = 0.0;
        let m = calc.compute_metrics(&acct).unwrap();
        assert_eq!(m.ead, 0.0);
        assert_eq!(m.expected_loss, 0.0);
    }

    #[test]
    fn test_malformed_score_fails_validation() {
        let calc = RiskMetricCalculator::default();
        let acct = account("A1", 950.0, 1_000.0);
        assert!(matches!(
            calc.compute_metrics(&acct),
            Err(ValidationError::ScoreOutOfRange { .. })
        ));
    }

    #[test]
    fn test_delinquency_raises_pd() {
        let calc = RiskMetricCalculator::default();
        let mut prev = 0.0;
        for dpd in [0, 30, 60, 90, 120] {
            let mut acct = account("A1", 650.0, 2_000.0);
            acct.delinquency_status = dpd;
            let pd = calc.compute_metrics(&acct).unwrap().pd_12m;
            assert!(pd >= prev, "pd {} at {} dpd fell below {}", pd, dpd, prev);
            prev = pd;
        }
    }

    #[test]
    fn test_segment_follows_risk_score() {
        let calc = RiskMetricCalculator::default();
        let strong = calc.compute_metrics(&account("A1", 850.0, 500.0)).unwrap();
        assert_eq!(strong.risk_segment, RiskSegment::Low);

        let mut weak = account("A2", 420.0, 4_800.0);
        weak.delinquency_status = 90;
        let weak = calc.compute_metrics(&weak).unwrap();
        assert_eq!(weak.risk_segment, RiskSegment::VeryHigh);
        assert!(weak.risk_score > strong.risk_score);
    }

    #[test]
    fn test_calibrations_coexist() {
        let base = RiskMetricCalculator::default();
        let mut config = ModelConfig::default();
        config.pd_model.intercept = -2.0;
        let stressed = RiskMetricCalculator::new(config).unwrap();

        let acct = account("A1", 650.0, 2_000.0);
        let pd_base = base.compute_metrics(&acct).unwrap().pd_12m;
        let pd_stressed = stressed.compute_metrics(&acct).unwrap().pd_12m;
        assert!(pd_stressed > pd_base);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ModelConfig::default();
        config.pd_model.score = 1.0;
        assert!(RiskMetricCalculator::new(config).is_err());
    }

    #[test]
    fn test_enrich_batch_policies() {
        let calc = RiskMetricCalculator::default();
        let accounts = vec![
            account("A1", 700.0, 1_000.0),
            account("A2", 200.0, 1_000.0),
            account("A3", 640.0, 3_000.0),
        ];

        let batch = calc.enrich_batch(&accounts, InvalidRecordPolicy::Skip).unwrap();
        assert_eq!(batch.enriched.len(), 2);
        assert_eq!(batch.enriched[1].account.customer_id, "A3");
        assert_eq!(batch.rejected.len(), 1);

        let err = calc
            .enrich_batch(&accounts, InvalidRecordPolicy::Abort)
            .unwrap_err();
        assert!(matches!(err, ValidationError::ScoreOutOfRange { .. }));
    }

    fn arb_account() -> impl Strategy<Value = Account> {
        (
            300.0..=900.0f64,
            0.0..50_000.0f64,
            0.0..=1.5f64,
            0u32..200,
            0.0..250.0f64,
        )
            .prop_map(|(score, limit, drawn, dpd, util)| Account {
                customer_id: "P".to_string(),
                application_score: score,
                income_band: IncomeBand::Low,
                region: Region::Wales,
                credit_limit: limit,
                balance: limit * drawn,
                utilization_rate: util,
                delinquency_status: dpd,
                acceptance_decision: AcceptanceDecision::Approved,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn prop_metrics_within_bounds(acct in arb_account()) {
            let m = RiskMetricCalculator::default().compute_metrics(&acct).unwrap();
            prop_assert!((0.0..=1.0).contains(&m.pd_12m));
            prop_assert!((0.0..=1.0).contains(&m.lgd));
            prop_assert!(m.ead >= 0.0);
            prop_assert!(m.ead <= acct.balance + acct.undrawn() + 1e-9);
            prop_assert!(m.expected_loss >= 0.0);
            prop_assert!(m.expected_loss <= m.ead + 1e-9);
        }

        #[test]
        fn prop_pd_decreasing_in_score(
            acct in arb_account(),
            bump in 1.0..300.0f64,
        ) {
            let calc = RiskMetricCalculator::default();
            let low = Account { application_score: 300.0 + (acct.application_score - 300.0) * 0.5, ..acct.clone() };
            let high = Account { application_score: (low.application_score + bump).min(900.0), ..acct };
            prop_assume!(high.application_score > low.application_score);

            let pd_low = calc.compute_metrics(&low).unwrap().pd_12m;
            let pd_high = calc.compute_metrics(&high).unwrap().pd_12m;
            prop_assert!(pd_high < pd_low, "pd({}) = {} not below pd({}) = {}",
                high.application_score, pd_high, low.application_score, pd_low);
        }
    }
}
