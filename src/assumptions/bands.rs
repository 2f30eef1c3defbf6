//! Risk-score cut points for segment assignment

use crate::error::ConfigurationError;
use crate::risk::RiskSegment;
use serde::{Deserialize, Serialize};

/// Three ascending cut points on risk_score (PD per mille)
///
/// A score equal to a cut point belongs to the higher-risk segment:
/// `[0, c0)` Low, `[c0, c1)` Medium, `[c1, c2)` High, `[c2, ..)` Very High.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreBands {
    cut_points: Vec<u32>,
}

impl Default for ScoreBands {
    fn default() -> Self {
        // 2%, 5% and 10% twelve-month PD
        Self {
            cut_points: vec![20, 50, 100],
        }
    }
}

impl ScoreBands {
    pub fn new(cut_points: Vec<u32>) -> Result<Self, ConfigurationError> {
        let bands = Self { cut_points };
        bands.validate()?;
        Ok(bands)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.cut_points.len() != 3 {
            return Err(ConfigurationError::InvalidParameter {
                name: "score_bands",
                reason: format!("expected 3 cut points, got {}", self.cut_points.len()),
            });
        }
        if self.cut_points.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigurationError::InvalidParameter {
                name: "score_bands",
                reason: format!("cut points {:?} must be strictly increasing", self.cut_points),
            });
        }
        Ok(())
    }

    pub fn cut_points(&self) -> &[u32] {
        &self.cut_points
    }

    pub fn segment(&self, risk_score: u32) -> RiskSegment {
        let crossed = self.cut_points.iter().filter(|&&c| risk_score >= c).count();
        match crossed {
            0 => RiskSegment::Low,
            1 => RiskSegment::Medium,
            2 => RiskSegment::High,
            _ => RiskSegment::VeryHigh,
        }
    }
}
