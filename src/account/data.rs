//! Account record and categorical fields matching the portfolio extract format

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest valid application score
pub const MIN_APPLICATION_SCORE: f64 = 300.0;

/// Highest valid application score
pub const MAX_APPLICATION_SCORE: f64 = 900.0;

/// Normalize free text for category matching ("South East", "south_east" -> "southeast")
fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Declared income band of the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncomeBand {
    Low,
    Medium,
    High,
}

impl IncomeBand {
    pub const ALL: [IncomeBand; 3] = [IncomeBand::Low, IncomeBand::Medium, IncomeBand::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeBand::Low => "Low",
            IncomeBand::Medium => "Medium",
            IncomeBand::High => "High",
        }
    }

    /// Parse from extract text; `None` for anything outside the closed set
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize(raw).as_str() {
            "low" => Some(IncomeBand::Low),
            "medium" | "med" => Some(IncomeBand::Medium),
            "high" => Some(IncomeBand::High),
            _ => None,
        }
    }
}

impl fmt::Display for IncomeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UK region of the customer's address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    London,
    SouthEast,
    SouthWest,
    EastOfEngland,
    EastMidlands,
    WestMidlands,
    YorkshireAndTheHumber,
    NorthWest,
    NorthEast,
    Wales,
    Scotland,
    NorthernIreland,
}

impl Region {
    pub const ALL: [Region; 12] = [
        Region::London,
        Region::SouthEast,
        Region::SouthWest,
        Region::EastOfEngland,
        Region::EastMidlands,
        Region::WestMidlands,
        Region::YorkshireAndTheHumber,
        Region::NorthWest,
        Region::NorthEast,
        Region::Wales,
        Region::Scotland,
        Region::NorthernIreland,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::London => "London",
            Region::SouthEast => "South East",
            Region::SouthWest => "South West",
            Region::EastOfEngland => "East of England",
            Region::EastMidlands => "East Midlands",
            Region::WestMidlands => "West Midlands",
            Region::YorkshireAndTheHumber => "Yorkshire and the Humber",
            Region::NorthWest => "North West",
            Region::NorthEast => "North East",
            Region::Wales => "Wales",
            Region::Scotland => "Scotland",
            Region::NorthernIreland => "Northern Ireland",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = normalize(raw);
        Region::ALL
            .iter()
            .copied()
            .find(|r| normalize(r.as_str()) == key)
            .or(match key.as_str() {
                "yorkshire" | "yorkshireandhumber" | "yorkshirehumber" => {
                    Some(Region::YorkshireAndTheHumber)
                }
                "east" | "eastanglia" => Some(Region::EastOfEngland),
                _ => None,
            })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Original underwriting outcome recorded in the extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcceptanceDecision {
    Approved,
    Declined,
}

impl AcceptanceDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcceptanceDecision::Approved => "Approved",
            AcceptanceDecision::Declined => "Declined",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize(raw).as_str() {
            "approved" | "accept" | "accepted" => Some(AcceptanceDecision::Approved),
            "declined" | "decline" | "rejected" => Some(AcceptanceDecision::Declined),
            _ => None,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, AcceptanceDecision::Approved)
    }
}

/// Delinquency state in the roll-rate chain
///
/// Current -> 30 -> 60 -> 90+ -> WrittenOff. WrittenOff is terminal and
/// never produced by bucketing days past due; it only appears in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DelinquencyState {
    Current,
    Dpd30,
    Dpd60,
    Dpd90Plus,
    WrittenOff,
}

impl DelinquencyState {
    pub const COUNT: usize = 5;

    pub const ALL: [DelinquencyState; 5] = [
        DelinquencyState::Current,
        DelinquencyState::Dpd30,
        DelinquencyState::Dpd60,
        DelinquencyState::Dpd90Plus,
        DelinquencyState::WrittenOff,
    ];

    /// Bucket days past due: 0 -> Current, 1-59 -> 30, 60-89 -> 60, 90+ -> 90+
    pub fn from_days_past_due(days: u32) -> Self {
        match days {
            0 => DelinquencyState::Current,
            1..=59 => DelinquencyState::Dpd30,
            60..=89 => DelinquencyState::Dpd60,
            _ => DelinquencyState::Dpd90Plus,
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DelinquencyState::Current => "Current",
            DelinquencyState::Dpd30 => "30 DPD",
            DelinquencyState::Dpd60 => "60 DPD",
            DelinquencyState::Dpd90Plus => "90+ DPD",
            DelinquencyState::WrittenOff => "Written Off",
        }
    }

    /// Past due but not yet written off
    pub fn is_delinquent(&self) -> bool {
        matches!(
            self,
            DelinquencyState::Dpd30 | DelinquencyState::Dpd60 | DelinquencyState::Dpd90Plus
        )
    }
}

impl fmt::Display for DelinquencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single credit-card account from the portfolio extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique customer identifier
    pub customer_id: String,

    /// Application score, valid range 300-900
    pub application_score: f64,

    pub income_band: IncomeBand,

    pub region: Region,

    /// Credit limit in GBP
    pub credit_limit: f64,

    /// Drawn balance in GBP
    pub balance: f64,

    /// Utilization as a percentage (nominally 0-100, may exceed 100)
    pub utilization_rate: f64,

    /// Days past due
    pub delinquency_status: u32,

    pub acceptance_decision: AcceptanceDecision,
}

impl Account {
    /// Check every numeric field; categorical fields are valid by construction
    pub fn validate(&self) -> Result<(), ValidationError> {
        let score = self.application_score;
        if !score.is_finite() || !(MIN_APPLICATION_SCORE..=MAX_APPLICATION_SCORE).contains(&score) {
            return Err(ValidationError::ScoreOutOfRange {
                account_id: self.customer_id.clone(),
                score,
            });
        }

        for (field, value) in [
            ("credit_limit", self.credit_limit),
            ("balance", self.balance),
            ("utilization_rate", self.utilization_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::NegativeOrNonFinite {
                    account_id: self.customer_id.clone(),
                    field,
                    value,
                });
            }
        }

        Ok(())
    }

    pub fn delinquency_state(&self) -> DelinquencyState {
        DelinquencyState::from_days_past_due(self.delinquency_status)
    }

    pub fn is_approved(&self) -> bool {
        self.acceptance_decision.is_approved()
    }

    pub fn is_delinquent(&self) -> bool {
        self.delinquency_status > 0
    }

    /// Undrawn headroom, zero when the balance exceeds the limit
    pub fn undrawn(&self) -> f64 {
        (self.credit_limit - self.balance).max(0.0)
    }

    /// Balance above `limit * tolerance`; flagged, never rejected
    pub fn has_excess_utilization(&self, tolerance: f64) -> bool {
        self.balance > self.credit_limit * tolerance
    }

    /// Copy of the account with its credit limit scaled (strategy simulation)
    pub fn with_limit_multiplier(&self, multiplier: f64) -> Self {
        Self {
            credit_limit: self.credit_limit * multiplier,
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Approved, current, London, Medium income account
    pub fn account(id: &str, score: f64, balance: f64) -> Account {
        Account {
            customer_id: id.to_string(),
            application_score: score,
            income_band: IncomeBand::Medium,
            region: Region::London,
            credit_limit: 5_000.0,
            balance,
            utilization_rate: balance / 5_000.0 * 100.0,
            delinquency_status: 0,
            acceptance_decision: AcceptanceDecision::Approved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::account;
    use super::*;

    #[test]
    fn test_delinquency_bucketing() {
        assert_eq!(DelinquencyState::from_days_past_due(0), DelinquencyState::Current);
        assert_eq!(DelinquencyState::from_days_past_due(15), DelinquencyState::Dpd30);
        assert_eq!(DelinquencyState::from_days_past_due(30), DelinquencyState::Dpd30);
        assert_eq!(DelinquencyState::from_days_past_due(60), DelinquencyState::Dpd60);
        assert_eq!(DelinquencyState::from_days_past_due(89), DelinquencyState::Dpd60);
        assert_eq!(DelinquencyState::from_days_past_due(90), DelinquencyState::Dpd90Plus);
        assert_eq!(DelinquencyState::from_days_past_due(180), DelinquencyState::Dpd90Plus);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(Region::parse("South East"), Some(Region::SouthEast));
        assert_eq!(Region::parse("yorkshire_and_the_humber"), Some(Region::YorkshireAndTheHumber));
        assert_eq!(Region::parse("Northern Ireland"), Some(Region::NorthernIreland));
        assert_eq!(Region::parse("Atlantis"), None);

        assert_eq!(IncomeBand::parse(" medium "), Some(IncomeBand::Medium));
        assert_eq!(IncomeBand::parse("Very High"), None);

        assert_eq!(AcceptanceDecision::parse("Approved"), Some(AcceptanceDecision::Approved));
        assert_eq!(AcceptanceDecision::parse("DECLINED"), Some(AcceptanceDecision::Declined));
    }

    #[test]
    fn test_validate_rejects_bad_score() {
        let acct = account("A1", 250.0, 1_000.0);
        assert!(matches!(
            acct.validate(),
            Err(ValidationError::ScoreOutOfRange { .. })
        ));

        let acct = account("A2", 901.0, 1_000.0);
        assert!(acct.validate().is_err());

        let acct = account("A3", 900.0, 1_000.0);
        assert!(acct.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_balance() {
        let mut acct = account("A1", 650.0, 1_000.0);
        acct.balance = -5.0;
        match acct.validate() {
            Err(ValidationError::NegativeOrNonFinite { field, .. }) => assert_eq!(field, "balance"),
            other => panic!("expected negative balance error, got {:?}", other),
        }
    }

    #[test]
    fn test_excess_utilization_is_flag_not_error() {
        let mut acct = account("A1", 650.0, 6_000.0);
        acct.utilization_rate = 120.0;
        assert!(acct.validate().is_ok());
        assert!(acct.has_excess_utilization(1.1));
        assert!(!acct.has_excess_utilization(1.25));
        assert_eq!(acct.undrawn(), 0.0);
    }

    #[test]
    fn test_limit_multiplier_leaves_balance() {
        let acct = account("A1", 650.0, 1_000.0);
        let scaled = acct.with_limit_multiplier(1.5);
        assert_eq!(scaled.credit_limit, 7_500.0);
        assert_eq!(scaled.balance, 1_000.0);
        assert_eq!(scaled.customer_id, "A1");
    }
}
