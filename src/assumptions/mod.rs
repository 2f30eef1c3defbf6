//! Calibrated model parameters: PD scorecard, LGD band, EAD conversion,
//! APR and risk-score cut points

mod bands;
mod lgd;
mod pd;
pub mod loader;

pub use bands::ScoreBands;
pub use lgd::LgdAssumptions;
pub use loader::{load_model_config, load_pd_coefficients, with_pd_coefficients};
pub use pd::PdModel;

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Default annualized APR used for revenue estimates
pub const DEFAULT_APR: f64 = 0.18;

/// Default credit conversion factor applied to undrawn limit
pub const DEFAULT_EAD_CCF: f64 = 0.75;

/// Default balance/limit ratio above which an account is flagged
pub const DEFAULT_EXCESS_UTILIZATION_TOLERANCE: f64 = 1.1;

/// Container for all model parameters handed to a calculator at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub pd_model: PdModel,
    pub lgd: LgdAssumptions,
    /// Annualized APR, decimal
    pub apr: f64,
    /// Credit conversion factor on undrawn limit, in [0, 1]
    pub ead_ccf: f64,
    pub score_bands: ScoreBands,
    pub excess_utilization_tolerance: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            pd_model: PdModel::default(),
            lgd: LgdAssumptions::default(),
            apr: DEFAULT_APR,
            ead_ccf: DEFAULT_EAD_CCF,
            score_bands: ScoreBands::default(),
            excess_utilization_tolerance: DEFAULT_EXCESS_UTILIZATION_TOLERANCE,
        }
    }
}

impl ModelConfig {
    /// Load from a JSON file in the given path
    pub fn from_json_path(path: &std::path::Path) -> crate::error::Result<Self> {
        loader::load_model_config(path)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.pd_model.validate()?;
        self.lgd.validate()?;
        self.score_bands.validate()?;

        if !self.apr.is_finite() || self.apr < 0.0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "apr",
                reason: format!("must be a finite non-negative rate, got {}", self.apr),
            });
        }
        if !(0.0..=1.0).contains(&self.ead_ccf) {
            return Err(ConfigurationError::InvalidParameter {
                name: "ead_ccf",
                reason: format!("must lie in [0, 1], got {}", self.ead_ccf),
            });
        }
        if !self.excess_utilization_tolerance.is_finite() || self.excess_utilization_tolerance < 1.0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "excess_utilization_tolerance",
                reason: format!("must be at least 1, got {}", self.excess_utilization_tolerance),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_ccf_and_apr() {
        let config = ModelConfig {
            ead_ccf: 1.5,
            ..ModelConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidParameter { name: "ead_ccf", .. })
        ));

        let config = ModelConfig {
            apr: f64::NAN,
            ..ModelConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
