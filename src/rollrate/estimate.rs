//! Transition matrix estimation from historical portfolio snapshots

use super::matrix::TransitionMatrix;
use crate::account::{Account, DelinquencyState};
use crate::error::{Result, ValidationError};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const N: usize = DelinquencyState::COUNT;

/// Delinquency state of every account at one observation date
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    pub as_of: NaiveDate,
    pub states: BTreeMap<String, DelinquencyState>,
}

impl PortfolioSnapshot {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            states: BTreeMap::new(),
        }
    }

    /// Snapshot of an extract's current delinquency buckets
    pub fn from_accounts(as_of: NaiveDate, accounts: &[Account]) -> Self {
        Self {
            as_of,
            states: accounts
                .iter()
                .map(|a| (a.customer_id.clone(), a.delinquency_state()))
                .collect(),
        }
    }

    pub fn insert(&mut self, customer_id: impl Into<String>, state: DelinquencyState) {
        self.states.insert(customer_id.into(), state);
    }
}

/// Raw observed transitions between consecutive snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionCounts {
    counts: [[u64; N]; N],
}

impl TransitionCounts {
    pub fn record(&mut self, from: DelinquencyState, to: DelinquencyState) {
        self.counts[from.index()][to.index()] += 1;
    }

    pub fn count(&self, from: DelinquencyState, to: DelinquencyState) -> u64 {
        self.counts[from.index()][to.index()]
    }

    pub fn observations(&self, from: DelinquencyState) -> u64 {
        self.counts[from.index()].iter().sum()
    }

    /// Normalize each origin row; rows with no observations stay put
    pub fn to_matrix(&self) -> std::result::Result<TransitionMatrix, crate::error::ModelError> {
        let mut rows = [[0.0; N]; N];
        for state in DelinquencyState::ALL {
            let i = state.index();
            let total = self.observations(state);
            if total == 0 {
                warn!("no observed transitions from {}; holding at identity", state);
                rows[i][i] = 1.0;
                continue;
            }
            for j in 0..N {
                rows[i][j] = self.counts[i][j] as f64 / total as f64;
            }
        }
        TransitionMatrix::new(rows)
    }
}

/// Count state-to-state moves for accounts present in consecutive snapshots
pub fn count_transitions(
    snapshots: &[PortfolioSnapshot],
) -> std::result::Result<TransitionCounts, ValidationError> {
    let mut ordered: Vec<&PortfolioSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.as_of);

    if let Some(pair) = ordered.windows(2).find(|w| w[0].as_of == w[1].as_of) {
        return Err(ValidationError::DuplicateSnapshotDate { date: pair[0].as_of });
    }

    let mut counts = TransitionCounts::default();
    for pair in ordered.windows(2) {
        let (before, after) = (pair[0], pair[1]);
        for (id, &from) in &before.states {
            if let Some(&to) = after.states.get(id) {
                counts.record(from, to);
            }
        }
    }
    Ok(counts)
}

/// Estimate a one-period transition matrix
///
/// Snapshots may arrive in any order; they are sorted by date. An origin
/// state with no observed transitions gets probability 1 of staying put.
pub fn estimate_matrix(snapshots: &[PortfolioSnapshot]) -> Result<TransitionMatrix> {
    let counts = count_transitions(snapshots)?;
    let matrix = counts.to_matrix()?;
    info!(
        "estimated transition matrix from {} snapshots ({} transitions)",
        snapshots.len(),
        DelinquencyState::ALL
            .iter()
            .map(|s| counts.observations(*s))
            .sum::<u64>()
    );
    Ok(matrix)
}

/// Raw CSV row of a snapshot history file
#[derive(Debug, Deserialize)]
struct SnapshotRow {
    as_of: NaiveDate,
    customer_id: String,
    days_past_due: i64,
    #[serde(default)]
    written_off: bool,
}

/// Load snapshot history (`as_of,customer_id,days_past_due[,written_off]`)
pub fn load_snapshots<P: AsRef<Path>>(path: P) -> Result<Vec<PortfolioSnapshot>> {
    let reader = csv::Reader::from_path(path)?;
    read_snapshots(reader)
}

pub fn load_snapshots_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<PortfolioSnapshot>> {
    read_snapshots(csv::Reader::from_reader(reader))
}

fn read_snapshots<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<PortfolioSnapshot>> {
    let mut by_date: BTreeMap<NaiveDate, PortfolioSnapshot> = BTreeMap::new();

    for result in reader.deserialize() {
        let row: SnapshotRow = result?;
        let days = u32::try_from(row.days_past_due).map_err(|_| {
            ValidationError::NegativeDelinquency {
                account_id: row.customer_id.clone(),
                value: row.days_past_due,
            }
        })?;
        let state = if row.written_off {
            DelinquencyState::WrittenOff
        } else {
            DelinquencyState::from_days_past_due(days)
        };
        by_date
            .entry(row.as_of)
            .or_insert_with(|| PortfolioSnapshot::new(row.as_of))
            .insert(row.customer_id, state);
    }

    Ok(by_date.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use DelinquencyState::*;

    fn date(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    fn snapshot(m: u32, states: &[(&str, DelinquencyState)]) -> PortfolioSnapshot {
        let mut snap = PortfolioSnapshot::new(date(m));
        for (id, s) in states {
            snap.insert(*id, *s);
        }
        snap
    }

    #[test]
    fn test_estimate_counts_and_normalizes() {
        let snapshots = vec![
            snapshot(1, &[("a", Current), ("b", Current), ("c", Dpd30), ("d", Current)]),
            snapshot(2, &[("a", Current), ("b", Dpd30), ("c", Dpd60), ("d", Current)]),
            snapshot(3, &[("a", Current), ("b", Current), ("c", Dpd90Plus)]),
        ];
        let m = estimate_matrix(&snapshots).unwrap();

        // Current: a,b,d then a -> 3 stay, b rolls (d leaves the book)
        assert_relative_eq!(m.probability(Current, Current), 0.75);
        assert_relative_eq!(m.probability(Current, Dpd30), 0.25);
        // 30: c -> 60, b -> Current (cure)
        assert_relative_eq!(m.probability(Dpd30, Dpd60), 0.5);
        assert_relative_eq!(m.cure_rate(Dpd30), 0.5);
        assert_relative_eq!(m.probability(Dpd60, Dpd90Plus), 1.0);
    }

    #[test]
    fn test_cold_start_rows_are_identity() {
        let snapshots = vec![
            snapshot(1, &[("a", Current)]),
            snapshot(2, &[("a", Dpd30)]),
        ];
        let m = estimate_matrix(&snapshots).unwrap();
        assert_eq!(m.probability(Dpd90Plus, Dpd90Plus), 1.0);
        assert_eq!(m.probability(WrittenOff, WrittenOff), 1.0);
        assert_eq!(m.probability(Dpd60, Dpd60), 1.0);
        assert_eq!(m.probability(Current, Dpd30), 1.0);

        // No history at all
        assert_eq!(estimate_matrix(&[]).unwrap(), TransitionMatrix::identity());
    }

    #[test]
    fn test_snapshot_order_does_not_matter() {
        let a = snapshot(1, &[("x", Current), ("y", Dpd30)]);
        let b = snapshot(2, &[("x", Dpd30), ("y", Dpd60)]);
        let c = snapshot(3, &[("x", Current), ("y", WrittenOff)]);
        let sorted = estimate_matrix(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let shuffled = estimate_matrix(&[c, a, b]).unwrap();
        assert_eq!(sorted, shuffled);
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let snapshots = vec![snapshot(1, &[("a", Current)]), snapshot(1, &[("a", Dpd30)])];
        assert!(matches!(
            count_transitions(&snapshots),
            Err(ValidationError::DuplicateSnapshotDate { .. })
        ));
    }

    #[test]
    fn test_load_snapshots() {
        let csv = "\
as_of,customer_id,days_past_due,written_off
2024-01-31,C1,0,false
2024-01-31,C2,35,false
2024-02-29,C1,0,false
2024-02-29,C2,95,true
";
        let snapshots = load_snapshots_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].states["C2"], Dpd30);
        assert_eq!(snapshots[1].states["C2"], WrittenOff);

        let m = estimate_matrix(&snapshots).unwrap();
        assert_eq!(m.probability(Dpd30, WrittenOff), 1.0);
    }

    fn arb_state() -> impl Strategy<Value = DelinquencyState> {
        (0usize..N).prop_map(|i| DelinquencyState::from_index(i).unwrap())
    }

    proptest! {
        #[test]
        fn prop_estimated_rows_sum_to_one(
            history in prop::collection::vec(prop::collection::vec(arb_state(), 8), 2..6)
        ) {
            let snapshots: Vec<PortfolioSnapshot> = history
                .iter()
                .enumerate()
                .map(|(m, states)| {
                    let mut snap = PortfolioSnapshot::new(date(m as u32 + 1));
                    for (i, s) in states.iter().enumerate() {
                        snap.insert(format!("acct{}", i), *s);
                    }
                    snap
                })
                .collect();

            let m = estimate_matrix(&snapshots).unwrap();
            for row in m.rows() {
                let sum: f64 = row.iter().sum();
                prop_assert!((sum - 1.0).abs() <= 1e-6);
            }
        }
    }
}
