//! Risk metrics attached to each account

use crate::account::Account;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered risk segment; ordering follows increasing risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskSegment {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskSegment {
    pub const ALL: [RiskSegment; 4] = [
        RiskSegment::Low,
        RiskSegment::Medium,
        RiskSegment::High,
        RiskSegment::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskSegment::Low => "Low Risk",
            RiskSegment::Medium => "Medium Risk",
            RiskSegment::High => "High Risk",
            RiskSegment::VeryHigh => "Very High Risk",
        }
    }

    /// High or Very High
    pub fn is_elevated(&self) -> bool {
        *self >= RiskSegment::High
    }
}

impl fmt::Display for RiskSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived risk metrics, one-to-one with an account
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// 12-month probability of default
    pub pd_12m: f64,
    /// Loss given default
    pub lgd: f64,
    /// Exposure at default
    pub ead: f64,
    /// pd_12m * lgd * ead
    pub expected_loss: f64,
    /// PD in points per mille
    pub risk_score: u32,
    pub risk_segment: RiskSegment,
}

impl RiskMetrics {
    /// Expected loss as a fraction of exposure, 0 when there is no exposure
    pub fn loss_rate(&self) -> f64 {
        if self.ead > 0.0 {
            self.expected_loss / self.ead
        } else {
            0.0
        }
    }
}

/// Account snapshot with its risk metrics attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedAccount {
    pub account: Account,
    pub metrics: RiskMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_ordering() {
        assert!(RiskSegment::Low < RiskSegment::Medium);
        assert!(RiskSegment::High < RiskSegment::VeryHigh);
        assert!(RiskSegment::High.is_elevated());
        assert!(!RiskSegment::Medium.is_elevated());
    }

    #[test]
    fn test_loss_rate_without_exposure() {
        let metrics = RiskMetrics {
            pd_12m: 0.1,
            lgd: 0.8,
            ead: 0.0,
            expected_loss: 0.0,
            risk_score: 100,
            risk_segment: RiskSegment::VeryHigh,
        };
        assert_eq!(metrics.loss_rate(), 0.0);
    }
}
