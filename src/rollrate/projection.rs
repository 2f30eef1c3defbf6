//! Forward projection of delinquency distributions through a transition matrix

use super::matrix::{StateDistribution, TransitionMatrix, MASS_TOLERANCE};
use crate::account::DelinquencyState;
use crate::error::ModelError;
use crate::risk::EnrichedAccount;
use log::warn;
use serde::Serialize;

/// Lazy, finite sequence of projected distributions
///
/// Yields `periods` items: distribution after 1, 2, ... periods. Neither the
/// initial distribution nor the matrix is modified, so cloning the iterator
/// (or calling [`project`] again) restarts the sequence. A mass-conservation
/// failure is yielded once as an error and ends the sequence.
#[derive(Debug, Clone)]
pub struct Projection<'a> {
    matrix: &'a TransitionMatrix,
    current: StateDistribution,
    period: usize,
    periods: usize,
    failed: bool,
}

impl Iterator for Projection<'_> {
    type Item = Result<StateDistribution, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.period >= self.periods {
            return None;
        }

        let next = self.matrix.apply(&self.current);
        self.period += 1;

        let mass = next.mass();
        if (mass - 1.0).abs() > MASS_TOLERANCE {
            self.failed = true;
            return Some(Err(ModelError::MassNotConserved {
                period: self.period,
                mass,
            }));
        }

        self.current = next;
        Some(Ok(next))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed {
            0
        } else {
            self.periods - self.period
        };
        (0, Some(remaining))
    }
}

/// distribution_{t+1} = distribution_t x matrix, for `periods` steps
pub fn project<'a>(
    initial: &StateDistribution,
    matrix: &'a TransitionMatrix,
    periods: usize,
) -> Projection<'a> {
    Projection {
        matrix,
        current: *initial,
        period: 0,
        periods,
        failed: false,
    }
}

/// Portfolio-level view of one projected period
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub period: usize,
    pub current_share: f64,
    pub delinquent_share: f64,
    pub written_off_share: f64,
    /// Balance not yet written off
    pub outstanding_balance: f64,
    /// Written-off balance times balance-weighted LGD
    pub cumulative_expected_loss: f64,
}

/// Project the balance-weighted delinquency mix of approved accounts
///
/// Returns period 0 (today) followed by `periods` projected points. An empty
/// or zero-balance book yields no points.
pub fn project_portfolio_trend(
    accounts: &[EnrichedAccount],
    matrix: &TransitionMatrix,
    periods: usize,
) -> Result<Vec<TrendPoint>, ModelError> {
    let mut weights = [0.0; DelinquencyState::COUNT];
    let mut total_balance = 0.0;
    let mut lgd_weighted = 0.0;

    for e in accounts.iter().filter(|e| e.account.is_approved()) {
        let balance = e.account.balance;
        weights[e.account.delinquency_state().index()] += balance;
        total_balance += balance;
        lgd_weighted += balance * e.metrics.lgd;
    }

    if total_balance <= 0.0 {
        warn!("trend projection skipped: no approved balance");
        return Ok(Vec::new());
    }

    let avg_lgd = lgd_weighted / total_balance;
    let initial = StateDistribution::from_weights(weights)?;

    let point = |period: usize, dist: &StateDistribution| {
        let written_off = dist.share(DelinquencyState::WrittenOff);
        TrendPoint {
            period,
            current_share: dist.share(DelinquencyState::Current),
            delinquent_share: dist.delinquent_share(),
            written_off_share: written_off,
            outstanding_balance: total_balance * (1.0 - written_off),
            cumulative_expected_loss: total_balance * written_off * avg_lgd,
        }
    };

    let mut trend = Vec::with_capacity(periods + 1);
    trend.push(point(0, &initial));
    for (i, dist) in project(&initial, matrix, periods).enumerate() {
        trend.push(point(i + 1, &dist?));
    }
    Ok(trend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::fixtures::account;
    use crate::risk::RiskMetricCalculator;
    use crate::rollrate::matrix::sample_rows;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_projection_length_and_mass() {
        let m = TransitionMatrix::new(sample_rows()).unwrap();
        let start = StateDistribution::concentrated(DelinquencyState::Current);
        let path: Vec<_> = project(&start, &m, 12).collect::<Result<_, _>>().unwrap();
        assert_eq!(path.len(), 12);
        for d in &path {
            assert_relative_eq!(d.mass(), 1.0, epsilon = 1e-9);
        }
        // Written-off share can only grow under an absorbing write-off row
        for w in path.windows(2) {
            assert!(w[1].share(DelinquencyState::WrittenOff) >= w[0].share(DelinquencyState::WrittenOff));
        }
    }

    #[test]
    fn test_projection_is_restartable() {
        let m = TransitionMatrix::new(sample_rows()).unwrap();
        let start = StateDistribution::new([0.8, 0.1, 0.05, 0.05, 0.0]).unwrap();
        let proj = project(&start, &m, 6);
        let first: Vec<_> = proj.clone().collect();
        let second: Vec<_> = proj.collect();
        assert_eq!(first, second);
        assert_eq!(first, project(&start, &m, 6).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_periods() {
        let start = StateDistribution::concentrated(DelinquencyState::Dpd30);
        assert_eq!(project(&start, &TransitionMatrix::identity(), 0).count(), 0);
    }

    #[test]
    fn test_mass_drift_is_an_error() {
        // Every row over-sums by 8e-7: accepted per row, but mass drifts
        let rows = [
            [0.9000008, 0.1, 0.0, 0.0, 0.0],
            [0.0, 0.9000008, 0.1, 0.0, 0.0],
            [0.0, 0.0, 0.9000008, 0.1, 0.0],
            [0.0, 0.0, 0.0, 0.9000008, 0.1],
            [0.0, 0.0, 0.0, 0.0000008, 1.0],
        ];
        let m = TransitionMatrix::new(rows).unwrap();
        let start = StateDistribution::concentrated(DelinquencyState::Current);
        let results: Vec<_> = project(&start, &m, 10).collect();

        assert!(results[0].is_ok());
        let last = results.last().unwrap();
        assert!(matches!(last, Err(ModelError::MassNotConserved { .. })));
        assert!(results.len() < 10);
    }

    #[test]
    fn test_portfolio_trend() {
        let calc = RiskMetricCalculator::default();
        let mut late = account("B", 560.0, 3_000.0);
        late.delinquency_status = 65;
        let accounts = vec![account("A", 720.0, 1_000.0), late];
        let enriched = calc
            .enrich_batch(&accounts, Default::default())
            .unwrap()
            .enriched;

        let m = TransitionMatrix::new(sample_rows()).unwrap();
        let trend = project_portfolio_trend(&enriched, &m, 12).unwrap();
        assert_eq!(trend.len(), 13);

        let today = &trend[0];
        assert_relative_eq!(today.delinquent_share, 0.75);
        assert_relative_eq!(today.outstanding_balance, 4_000.0);
        assert_eq!(today.cumulative_expected_loss, 0.0);

        let end = trend.last().unwrap();
        assert!(end.written_off_share > 0.0);
        assert!(end.outstanding_balance < 4_000.0);
        assert!(end.cumulative_expected_loss > 0.0);
        assert!(end.cumulative_expected_loss < 4_000.0 * end.written_off_share);
    }

    #[test]
    fn test_trend_on_empty_book() {
        let m = TransitionMatrix::identity();
        assert!(project_portfolio_trend(&[], &m, 12).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_identity_projection_is_idempotent(
            raw in prop::array::uniform5(0.0..10.0f64),
            periods in 0usize..40,
        ) {
            prop_assume!(raw.iter().sum::<f64>() > 1e-3);
            let start = StateDistribution::from_weights(raw).unwrap();
            let identity = TransitionMatrix::identity();
            for dist in project(&start, &identity, periods) {
                prop_assert_eq!(dist.unwrap(), start);
            }
        }
    }
}
