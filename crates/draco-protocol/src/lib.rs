//! Shared machine-readable DRACO contracts: the optimization parameters a run
//! is configured with and the report written about each design.

pub mod config;
pub mod report;

pub use config::{ConfigError, OptimizationConfig};
pub use report::{CodonUsageSummary, DesignReport, MotifHit, RepeatHit};
