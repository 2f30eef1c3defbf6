//! Lending strategy search: policy levers, grid enumeration, parallel
//! simulation and ranking

mod comparison;
mod config;
mod simulator;

pub use comparison::StrategyComparison;
pub use config::{
    parse_income_bands, GridIter, StrategyConfig, StrategyGrid, MAX_LIMIT_MULTIPLIER,
    MIN_LIMIT_MULTIPLIER,
};
pub use simulator::{
    evaluate, rank, rank_order, CancellationToken, SimulationReport, SimulationSettings,
    StrategyFailure, StrategyResult, StrategySimulator,
};
