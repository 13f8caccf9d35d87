// src/config/mod.rs

pub mod error;
pub mod load_parameters;
pub mod mission;
pub mod optimizer;
pub mod parameters;

pub use error::ConfigurationError;
pub use mission::{Architecture, MissionConfig, MissionSpecification, ObjectiveMode};
pub use optimizer::OptimizerConfig;
pub use parameters::ReferenceParameters;
