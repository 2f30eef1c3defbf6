//! Group-by keys for segment aggregation

use crate::account::{DelinquencyState, IncomeBand, Region};
use crate::error::ConfigurationError;
use crate::risk::{EnrichedAccount, RiskSegment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Application-score band used in portfolio reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScoreBand {
    Under500,
    From500To599,
    From600To649,
    From650To699,
    From700To749,
    From750,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score < 500.0 {
            ScoreBand::Under500
        } else if score < 600.0 {
            ScoreBand::From500To599
        } else if score < 650.0 {
            ScoreBand::From600To649
        } else if score < 700.0 {
            ScoreBand::From650To699
        } else if score < 750.0 {
            ScoreBand::From700To749
        } else {
            ScoreBand::From750
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Under500 => "<500",
            ScoreBand::From500To599 => "500-599",
            ScoreBand::From600To649 => "600-649",
            ScoreBand::From650To699 => "650-699",
            ScoreBand::From700To749 => "700-749",
            ScoreBand::From750 => "750+",
        }
    }
}

/// Attribute an aggregation can group by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    Region,
    IncomeBand,
    RiskSegment,
    ScoreBand,
    DelinquencyState,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Region => "region",
            GroupKey::IncomeBand => "income_band",
            GroupKey::RiskSegment => "risk_segment",
            GroupKey::ScoreBand => "score_band",
            GroupKey::DelinquencyState => "delinquency_status",
        }
    }

    pub fn value_of(&self, e: &EnrichedAccount) -> SegmentValue {
        match self {
            GroupKey::Region => SegmentValue::Region(e.account.region),
            GroupKey::IncomeBand => SegmentValue::IncomeBand(e.account.income_band),
            GroupKey::RiskSegment => SegmentValue::RiskSegment(e.metrics.risk_segment),
            GroupKey::ScoreBand => {
                SegmentValue::ScoreBand(ScoreBand::from_score(e.account.application_score))
            }
            GroupKey::DelinquencyState => {
                SegmentValue::Delinquency(e.account.delinquency_state())
            }
        }
    }
}

impl FromStr for GroupKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "region" => Ok(GroupKey::Region),
            "income_band" | "income" => Ok(GroupKey::IncomeBand),
            "risk_segment" | "risk" => Ok(GroupKey::RiskSegment),
            "score_band" | "score" => Ok(GroupKey::ScoreBand),
            "delinquency_status" | "delinquency" => Ok(GroupKey::DelinquencyState),
            other => Err(ConfigurationError::UnknownGroupKey(other.to_string())),
        }
    }
}

/// Ordered set of group-by keys; duplicates are rejected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupBy {
    keys: Vec<GroupKey>,
}

impl GroupBy {
    pub fn new(keys: Vec<GroupKey>) -> Result<Self, ConfigurationError> {
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(ConfigurationError::DuplicateGroupKey(key.as_str()));
            }
        }
        Ok(Self { keys })
    }

    /// Parse a comma-separated list, e.g. "region,income_band"
    pub fn parse(list: &str) -> Result<Self, ConfigurationError> {
        let keys = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(GroupKey::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(keys)
    }

    /// No keys: a single segment spanning every account
    pub fn all() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    pub fn key_of(&self, e: &EnrichedAccount) -> SegmentKey {
        SegmentKey(self.keys.iter().map(|k| k.value_of(e)).collect())
    }
}

/// One attribute value of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SegmentValue {
    Region(Region),
    IncomeBand(IncomeBand),
    RiskSegment(RiskSegment),
    ScoreBand(ScoreBand),
    Delinquency(DelinquencyState),
}

impl fmt::Display for SegmentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentValue::Region(v) => f.write_str(v.as_str()),
            SegmentValue::IncomeBand(v) => f.write_str(v.as_str()),
            SegmentValue::RiskSegment(v) => f.write_str(v.as_str()),
            SegmentValue::ScoreBand(v) => f.write_str(v.as_str()),
            SegmentValue::Delinquency(v) => f.write_str(v.as_str()),
        }
    }
}

/// Values of the group-by keys, in key order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentKey(pub Vec<SegmentValue>);

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("All");
        }
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        f.write_str(&parts.join(" / "))
    }
}
