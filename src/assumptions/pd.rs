//! Probability-of-default scoring model
//!
//! Logistic link: pd = 1 / (1 + exp(-z)) with
//! z = intercept + score * (application_score - score_pivot) / 100
//!       + utilization * min(utilization_rate, utilization_cap) / 100
//!       + delinquency uplift for the account's bucket

use crate::account::{DelinquencyState, MIN_APPLICATION_SCORE};
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Largest linear predictor a valid model may reach anywhere in the input
/// domain. Beyond it the logistic output rounds towards 1.0 and PD stops
/// falling with score.
pub const MAX_LINEAR_PREDICTOR: f64 = 25.0;

/// Fitted coefficients of the PD scorecard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdModel {
    pub intercept: f64,
    /// Effect per 100 score points above the pivot; must be negative
    pub score: f64,
    pub score_pivot: f64,
    /// Effect per 100 percentage points of utilization; must be non-negative
    pub utilization: f64,
    /// Utilization (percent) beyond which the feature stops growing
    pub utilization_cap: f64,
    pub dpd_30: f64,
    pub dpd_60: f64,
    pub dpd_90_plus: f64,
}

impl Default for PdModel {
    fn default() -> Self {
        Self {
            intercept: -3.2,
            score: -1.1,
            score_pivot: 600.0,
            utilization: 1.5,
            utilization_cap: 150.0,
            dpd_30: 1.2,
            dpd_60: 2.2,
            dpd_90_plus: 3.5,
        }
    }
}

impl PdModel {
    /// Build from `term -> coefficient` pairs; terms not listed keep their defaults
    pub fn from_terms(terms: &HashMap<String, f64>) -> Result<Self, ConfigurationError> {
        let mut model = Self::default();
        for (term, &coef) in terms {
            let slot = match term.as_str() {
                "intercept" => &mut model.intercept,
                "score" => &mut model.score,
                "score_pivot" => &mut model.score_pivot,
                "utilization" => &mut model.utilization,
                "utilization_cap" => &mut model.utilization_cap,
                "dpd_30" => &mut model.dpd_30,
                "dpd_60" => &mut model.dpd_60,
                "dpd_90_plus" => &mut model.dpd_90_plus,
                other => return Err(ConfigurationError::UnknownTerm(other.to_string())),
            };
            *slot = coef;
        }
        Ok(model)
    }

    /// Reject coefficients that would break the monotonicity guarantees
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let all = [
            self.intercept,
            self.score,
            self.score_pivot,
            self.utilization,
            self.utilization_cap,
            self.dpd_30,
            self.dpd_60,
            self.dpd_90_plus,
        ];
        if all.iter().any(|c| !c.is_finite()) {
            return Err(invalid("pd_model", "coefficients must be finite"));
        }
        if self.score >= 0.0 {
            return Err(invalid(
                "pd_model.score",
                format!("must be negative so PD falls with score, got {}", self.score),
            ));
        }
        if self.utilization < 0.0 {
            return Err(invalid("pd_model.utilization", "must be non-negative"));
        }
        if self.utilization_cap <= 0.0 {
            return Err(invalid("pd_model.utilization_cap", "must be positive"));
        }
        if !(0.0 <= self.dpd_30 && self.dpd_30 <= self.dpd_60 && self.dpd_60 <= self.dpd_90_plus) {
            return Err(invalid(
                "pd_model.dpd",
                "delinquency uplifts must satisfy 0 <= dpd_30 <= dpd_60 <= dpd_90_plus",
            ));
        }
        let worst = self.linear_predictor(
            MIN_APPLICATION_SCORE,
            self.utilization_cap,
            DelinquencyState::Dpd90Plus,
        );
        if worst > MAX_LINEAR_PREDICTOR {
            return Err(invalid(
                "pd_model",
                format!(
                    "linear predictor reaches {:.2} at the riskiest input, limit is {}",
                    worst, MAX_LINEAR_PREDICTOR
                ),
            ));
        }
        Ok(())
    }

    fn delinquency_uplift(&self, state: DelinquencyState) -> f64 {
        match state {
            DelinquencyState::Current => 0.0,
            DelinquencyState::Dpd30 => self.dpd_30,
            DelinquencyState::Dpd60 => self.dpd_60,
            DelinquencyState::Dpd90Plus | DelinquencyState::WrittenOff => self.dpd_90_plus,
        }
    }

    pub fn linear_predictor(
        &self,
        application_score: f64,
        utilization_rate: f64,
        state: DelinquencyState,
    ) -> f64 {
        self.intercept
            + self.score * (application_score - self.score_pivot) / 100.0
            + self.utilization * utilization_rate.min(self.utilization_cap) / 100.0
            + self.delinquency_uplift(state)
    }

    /// 12-month probability of default
    pub fn probability(
        &self,
        application_score: f64,
        utilization_rate: f64,
        state: DelinquencyState,
    ) -> f64 {
        let z = self.linear_predictor(application_score, utilization_rate, state);
        (1.0 / (1.0 + (-z).exp())).clamp(0.0, 1.0)
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_calibration() {
        let model = PdModel::default();
        // Pivot score, 50% utilization, current: z = -3.2 + 0.75
        let pd = model.probability(600.0, 50.0, DelinquencyState::Current);
        assert_relative_eq!(pd, 1.0 / (1.0 + 2.45_f64.exp()), epsilon = 1e-12);
        assert!(pd > 0.07 && pd < 0.09);
    }

    #[test]
    fn test_utilization_is_capped() {
        let model = PdModel::default();
        let at_cap = model.probability(650.0, 150.0, DelinquencyState::Current);
        let beyond = model.probability(650.0, 400.0, DelinquencyState::Current);
        assert_eq!(at_cap, beyond);
    }

    #[test]
    fn test_from_terms() {
        let mut terms = HashMap::new();
        terms.insert("intercept".to_string(), -2.5);
        terms.insert("dpd_90_plus".to_string(), 4.0);
        let model = PdModel::from_terms(&terms).unwrap();
        assert_eq!(model.intercept, -2.5);
        assert_eq!(model.dpd_90_plus, 4.0);
        assert_eq!(model.score, PdModel::default().score);

        terms.insert("bureau_age".to_string(), 0.1);
        assert_eq!(
            PdModel::from_terms(&terms),
            Err(ConfigurationError::UnknownTerm("bureau_age".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_non_monotone() {
        let mut model = PdModel::default();
        model.score = 0.2;
        assert!(model.validate().is_err());

        let mut model = PdModel::default();
        model.dpd_60 = 0.5;
        assert!(model.validate().is_err());

        assert!(PdModel::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_saturating_coefficients() {
        let mut model = PdModel::default();
        model.intercept = 40.0;
        assert!(matches!(
            model.validate(),
            Err(ConfigurationError::InvalidParameter { name: "pd_model", .. })
        ));

        let mut model = PdModel::default();
        model.dpd_30 = 30.0;
        model.dpd_60 = 30.0;
        model.dpd_90_plus = 30.0;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_pd_strictly_decreasing_at_largest_accepted_predictor() {
        let mut model = PdModel::default();
        let worst = model.linear_predictor(300.0, model.utilization_cap, DelinquencyState::Dpd90Plus);
        model.intercept += MAX_LINEAR_PREDICTOR - worst - 1e-9;
        assert!(model.validate().is_ok());

        let state = DelinquencyState::Dpd90Plus;
        let mut previous = model.probability(300.0, 150.0, state);
        assert!(previous < 1.0);
        for score in 301..=900 {
            let pd = model.probability(f64::from(score), 150.0, state);
            assert!(pd < previous, "pd not decreasing at score {}", score);
            previous = pd;
        }
    }
}
