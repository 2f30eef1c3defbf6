//! Loss-given-default assumptions for unsecured revolving credit

use crate::account::DelinquencyState;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LgdAssumptions {
    /// Base LGD for collateral-free card balances
    pub unsecured_base: f64,
    /// Additional LGD per delinquency bucket past Current (recoveries worsen)
    pub delinquency_uplift: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for LgdAssumptions {
    fn default() -> Self {
        Self {
            unsecured_base: 0.75,
            delinquency_uplift: 0.03,
            floor: 0.40,
            ceiling: 0.90,
        }
    }
}

impl LgdAssumptions {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.floor) || !unit.contains(&self.ceiling) {
            return Err(ConfigurationError::InvalidParameter {
                name: "lgd",
                reason: format!("floor {} and ceiling {} must lie in [0, 1]", self.floor, self.ceiling),
            });
        }
        if self.floor > self.ceiling {
            return Err(ConfigurationError::InvalidParameter {
                name: "lgd",
                reason: format!("floor {} above ceiling {}", self.floor, self.ceiling),
            });
        }
        if !self.unsecured_base.is_finite() || !self.delinquency_uplift.is_finite() {
            return Err(ConfigurationError::InvalidParameter {
                name: "lgd",
                reason: "base and uplift must be finite".to_string(),
            });
        }
        Ok(())
    }

    pub fn lgd(&self, state: DelinquencyState) -> f64 {
        let steps = state.index().min(DelinquencyState::Dpd90Plus.index()) as f64;
        (self.unsecured_base + self.delinquency_uplift * steps)
            .clamp(self.floor, self.ceiling)
            .clamp(0.0, 1.0)
    }
}
