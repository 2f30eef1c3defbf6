//! Lending-policy levers and the Cartesian grid of configurations

use crate::account::{IncomeBand, MAX_APPLICATION_SCORE, MIN_APPLICATION_SCORE};
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Smallest credit-limit multiplier accepted
pub const MIN_LIMIT_MULTIPLIER: f64 = 0.1;

/// Largest credit-limit multiplier accepted
pub const MAX_LIMIT_MULTIPLIER: f64 = 5.0;

/// One combination of policy levers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    /// Accounts scoring below this are ineligible
    pub min_score: u16,
    /// Scales the credit limit of approved accounts
    pub limit_multiplier: f64,
    pub eligible_income_bands: BTreeSet<IncomeBand>,
}

impl StrategyConfig {
    pub fn new(
        name: impl Into<String>,
        min_score: u16,
        limit_multiplier: f64,
        eligible_income_bands: impl IntoIterator<Item = IncomeBand>,
    ) -> Self {
        Self {
            name: name.into(),
            min_score,
            limit_multiplier,
            eligible_income_bands: eligible_income_bands.into_iter().collect(),
        }
    }

    /// Pass-through policy: every score, every band, limits unchanged
    pub fn baseline() -> Self {
        Self::new("baseline", MIN_APPLICATION_SCORE as u16, 1.0, IncomeBand::ALL)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_min_score(&self.name, self.min_score)?;
        validate_multiplier(&self.name, self.limit_multiplier)?;
        if self.eligible_income_bands.is_empty() {
            return Err(ConfigurationError::NoIncomeBands {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    pub fn is_eligible_band(&self, band: IncomeBand) -> bool {
        self.eligible_income_bands.contains(&band)
    }
}

fn validate_min_score(name: &str, min_score: u16) -> Result<(), ConfigurationError> {
    let score = f64::from(min_score);
    if !(MIN_APPLICATION_SCORE..=MAX_APPLICATION_SCORE).contains(&score) {
        return Err(ConfigurationError::MinScoreOutOfRange {
            name: name.to_string(),
            min_score,
        });
    }
    Ok(())
}

fn validate_multiplier(name: &str, multiplier: f64) -> Result<(), ConfigurationError> {
    if !multiplier.is_finite() || !(MIN_LIMIT_MULTIPLIER..=MAX_LIMIT_MULTIPLIER).contains(&multiplier) {
        return Err(ConfigurationError::MultiplierOutOfRange {
            name: name.to_string(),
            multiplier,
            min: MIN_LIMIT_MULTIPLIER,
            max: MAX_LIMIT_MULTIPLIER,
        });
    }
    Ok(())
}

/// Parse income band names ("Low,High") into a set
pub fn parse_income_bands<S: AsRef<str>>(
    names: impl IntoIterator<Item = S>,
) -> Result<BTreeSet<IncomeBand>, ConfigurationError> {
    names
        .into_iter()
        .map(|s| {
            let s = s.as_ref();
            IncomeBand::parse(s).ok_or_else(|| ConfigurationError::UnknownIncomeBand(s.to_string()))
        })
        .collect()
}

/// Lever values whose Cartesian product forms the configurations to search
///
/// Every lever value is validated on construction, so every configuration
/// the grid yields is valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyGrid {
    min_scores: Vec<u16>,
    limit_multipliers: Vec<f64>,
    income_band_sets: Vec<BTreeSet<IncomeBand>>,
}

impl StrategyGrid {
    pub fn new(
        min_scores: Vec<u16>,
        limit_multipliers: Vec<f64>,
        income_band_sets: Vec<BTreeSet<IncomeBand>>,
    ) -> Result<Self, ConfigurationError> {
        if min_scores.is_empty() {
            return Err(ConfigurationError::EmptyLever("min_score"));
        }
        if limit_multipliers.is_empty() {
            return Err(ConfigurationError::EmptyLever("limit_multiplier"));
        }
        if income_band_sets.is_empty() {
            return Err(ConfigurationError::EmptyLever("eligible_income_bands"));
        }

        for &score in &min_scores {
            validate_min_score(&format!("min_score={}", score), score)?;
        }
        for &m in &limit_multipliers {
            validate_multiplier(&format!("limit_multiplier={}", m), m)?;
        }
        for (i, bands) in income_band_sets.iter().enumerate() {
            if bands.is_empty() {
                return Err(ConfigurationError::NoIncomeBands {
                    name: format!("eligible_income_bands[{}]", i),
                });
            }
        }

        Ok(Self {
            min_scores,
            limit_multipliers,
            income_band_sets,
        })
    }

    /// Number of configurations; computed without enumerating them
    pub fn len(&self) -> usize {
        self.min_scores.len() * self.limit_multipliers.len() * self.income_band_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode the configuration at a grid position
    ///
    /// Positions run min_score-major, then multiplier, then band set.
    pub fn get(&self, index: usize) -> Option<StrategyConfig> {
        if index >= self.len() {
            return None;
        }
        let n_bands = self.income_band_sets.len();
        let n_mult = self.limit_multipliers.len();

        let bands = &self.income_band_sets[index % n_bands];
        let multiplier = self.limit_multipliers[(index / n_bands) % n_mult];
        let min_score = self.min_scores[index / (n_bands * n_mult)];

        Some(StrategyConfig {
            name: config_name(min_score, multiplier, bands),
            min_score,
            limit_multiplier: multiplier,
            eligible_income_bands: bands.clone(),
        })
    }

    /// Lazy, restartable walk over every configuration
    pub fn iter(&self) -> GridIter<'_> {
        GridIter {
            grid: self,
            next: 0,
            end: self.len(),
        }
    }
}

impl<'a> IntoIterator for &'a StrategyGrid {
    type Item = StrategyConfig;
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn config_name(min_score: u16, multiplier: f64, bands: &BTreeSet<IncomeBand>) -> String {
    let labels: Vec<&str> = bands.iter().map(|b| b.as_str()).collect();
    format!("score>={} limit x{} bands={}", min_score, multiplier, labels.join("+"))
}

/// Iterator over a [`StrategyGrid`]; builds each configuration on demand
#[derive(Debug, Clone)]
pub struct GridIter<'a> {
    grid: &'a StrategyGrid,
    next: usize,
    end: usize,
}

impl Iterator for GridIter<'_> {
    type Item = StrategyConfig;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let config = self.grid.get(self.next);
        self.next += 1;
        config
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridIter<'_> {}
