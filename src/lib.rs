// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod config;
pub mod dvp;
pub mod import;
pub mod optimizer;
pub mod pool;

pub use config::{Config, ContestRules, PositionBound};
pub use dvp::DvpTable;
pub use optimizer::{optimize, Lineup, LineupResult, OptimizeError};
pub use pool::{Candidate, ExclusionRule, Position};
