// src/lib.rs

pub mod config;
pub mod error;
pub mod math;
pub mod models;
pub mod optimization;
pub mod report;
pub mod run;
pub mod sizing;

pub use error::SizingError;
pub use optimization::{optimize, ConstrainedProblem, OptimizationResult, Strategy};
pub use run::{run_sizing, SizingRun};
pub use sizing::{DesignVector, SizingEvaluator, SizingReport};
