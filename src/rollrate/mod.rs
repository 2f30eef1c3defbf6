//! Delinquency roll-rate model: estimation from snapshot history and
//! forward projection of portfolio composition

mod estimate;
mod matrix;
mod projection;

pub use estimate::{
    count_transitions, estimate_matrix, load_snapshots, load_snapshots_from_reader,
    PortfolioSnapshot, TransitionCounts,
};
pub use matrix::{StateDistribution, TransitionMatrix, MASS_TOLERANCE};
pub use projection::{project, project_portfolio_trend, Projection, TrendPoint};
