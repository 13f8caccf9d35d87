// src/sizing/mod.rs

pub mod design;
pub mod evaluator;
pub mod report;

pub use design::{DesignVector, DESIGN_BOUNDS, DESIGN_DIM, DESIGN_LABELS};
pub use evaluator::{Evaluation, EvaluationMode, SizingEvaluator, DEFAULT_PENALTY_WEIGHT};
pub use report::{Category, ReportEntry, SizingReport, CONSTRAINT_COUNT, CONSTRAINT_LABELS};
