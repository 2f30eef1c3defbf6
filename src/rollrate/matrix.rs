//! One-period delinquency transition matrix and state distributions

use crate::account::DelinquencyState;
use crate::error::ModelError;
use serde::Serialize;

/// Tolerance on row sums and distribution mass
pub const MASS_TOLERANCE: f64 = 1e-6;

const N: usize = DelinquencyState::COUNT;

/// Row-stochastic matrix over [`DelinquencyState`]
///
/// Every row sums to 1 within [`MASS_TOLERANCE`]. Cures (moves to a less
/// delinquent state) are ordinary entries left of the diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionMatrix {
    rows: [[f64; N]; N],
}

impl TransitionMatrix {
    pub fn new(rows: [[f64; N]; N]) -> Result<Self, ModelError> {
        for (i, row) in rows.iter().enumerate() {
            let from = state_name(i);
            for (j, &p) in row.iter().enumerate() {
                if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                    return Err(ModelError::ProbabilityOutOfRange {
                        from,
                        to: state_name(j),
                        value: p,
                    });
                }
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > MASS_TOLERANCE {
                return Err(ModelError::RowNotNormalized { state: from, sum });
            }
        }
        Ok(Self { rows })
    }

    /// Every state stays where it is
    pub fn identity() -> Self {
        let mut rows = [[0.0; N]; N];
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { rows }
    }

    pub fn probability(&self, from: DelinquencyState, to: DelinquencyState) -> f64 {
        self.rows[from.index()][to.index()]
    }

    pub fn row(&self, from: DelinquencyState) -> &[f64; N] {
        &self.rows[from.index()]
    }

    pub fn rows(&self) -> &[[f64; N]; N] {
        &self.rows
    }

    /// Mass moving to a worse state in one period
    pub fn roll_forward_rate(&self, from: DelinquencyState) -> f64 {
        self.row(from)[from.index() + 1..].iter().sum()
    }

    /// Mass moving to a better state in one period
    pub fn cure_rate(&self, from: DelinquencyState) -> f64 {
        self.row(from)[..from.index()].iter().sum()
    }

    /// distribution x matrix, without any renormalization
    pub fn apply(&self, distribution: &StateDistribution) -> StateDistribution {
        let mut next = [0.0; N];
        for (i, &mass) in distribution.shares.iter().enumerate() {
            if mass == 0.0 {
                continue;
            }
            for (j, &p) in self.rows[i].iter().enumerate() {
                next[j] += mass * p;
            }
        }
        StateDistribution { shares: next }
    }
}

fn state_name(idx: usize) -> &'static str {
    DelinquencyState::from_index(idx)
        .map(|s| s.as_str())
        .unwrap_or("?")
}

/// Probability distribution of the portfolio across delinquency states
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateDistribution {
    shares: [f64; N],
}

impl StateDistribution {
    pub fn new(shares: [f64; N]) -> Result<Self, ModelError> {
        for (i, &s) in shares.iter().enumerate() {
            if !s.is_finite() || s < -MASS_TOLERANCE || s > 1.0 + MASS_TOLERANCE {
                return Err(ModelError::InvalidDistribution {
                    state: state_name(i),
                    value: s,
                });
            }
        }
        let dist = Self { shares };
        let mass = dist.mass();
        if (mass - 1.0).abs() > MASS_TOLERANCE {
            return Err(ModelError::MassNotConserved { period: 0, mass });
        }
        Ok(dist)
    }

    /// Normalize non-negative weights (e.g., balances by state)
    pub fn from_weights(weights: [f64; N]) -> Result<Self, ModelError> {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(ModelError::MassNotConserved { period: 0, mass: total });
        }
        let mut shares = [0.0; N];
        for (share, w) in shares.iter_mut().zip(weights) {
            *share = w / total;
        }
        Self::new(shares)
    }

    /// All mass in one state
    pub fn concentrated(state: DelinquencyState) -> Self {
        let mut shares = [0.0; N];
        shares[state.index()] = 1.0;
        Self { shares }
    }

    pub fn share(&self, state: DelinquencyState) -> f64 {
        self.shares[state.index()]
    }

    pub fn shares(&self) -> &[f64; N] {
        &self.shares
    }

    pub fn mass(&self) -> f64 {
        self.shares.iter().sum()
    }

    /// Share in 30, 60 or 90+
    pub fn delinquent_share(&self) -> f64 {
        DelinquencyState::ALL
            .iter()
            .filter(|s| s.is_delinquent())
            .map(|s| self.share(*s))
            .sum()
    }
}

#[cfg(test)]
pub(crate) fn sample_rows() -> [[f64; N]; N] {
    [
        [0.95, 0.05, 0.0, 0.0, 0.0],
        [0.40, 0.30, 0.30, 0.0, 0.0],
        [0.10, 0.10, 0.20, 0.60, 0.0],
        [0.02, 0.0, 0.03, 0.45, 0.50],
        [0.0, 0.0, 0.0, 0.0, 1.0],
    ]
}
