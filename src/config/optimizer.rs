// src/config/optimizer.rs

use serde::Deserialize;

use crate::config::error::{ensure_in_range, ensure_positive, ConfigurationError};
use crate::optimization::{validate_bounds, Bounds, SolverSettings, Strategy};
use crate::sizing::{DesignVector, DEFAULT_PENALTY_WEIGHT, DESIGN_BOUNDS, DESIGN_DIM};

/// optimizer.yaml の内容
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    pub strategy: Strategy,
    pub penalty_weight: f64,
    pub initial: DesignVector,
    /// 設計変数ごとの [下限, 上限]（DESIGN_LABELS の順）
    pub bounds: [[f64; 2]; DESIGN_DIM],
    pub solver: SolverSettings,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Local,
            penalty_weight: DEFAULT_PENALTY_WEIGHT,
            initial: DesignVector::from_array([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01]),
            bounds: DESIGN_BOUNDS.map(|(lo, hi)| [lo, hi]),
            solver: SolverSettings::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn bounds(&self) -> Bounds<DESIGN_DIM> {
        self.bounds.map(|[lo, hi]| (lo, hi))
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ensure_positive("optimizer.penalty_weight", self.penalty_weight)?;
        validate_bounds(&self.bounds())?;

        let local = &self.solver.local;
        ensure_positive("solver.local.tolerance", local.tolerance)?;
        ensure_in_range("solver.local.finite_difference_step", local.finite_difference_step, f64::MIN_POSITIVE, 0.1)?;
        ensure_positive("solver.local.feasibility_tolerance", local.feasibility_tolerance)?;
        ensure_positive("solver.local.kkt_tolerance", local.kkt_tolerance)?;

        let global = &self.solver.global;
        ensure_positive("solver.global.population_factor", global.population_factor as f64)?;
        ensure_in_range("solver.global.mutation[0]", global.mutation.0, 0.0, 2.0)?;
        ensure_in_range("solver.global.mutation[1]", global.mutation.1, global.mutation.0, 2.0)?;
        ensure_in_range("solver.global.crossover", global.crossover, 0.0, 1.0)?;
        ensure_in_range("solver.global.tolerance", global.tolerance, 0.0, f64::MAX)?;
        ensure_in_range("solver.global.absolute_tolerance", global.absolute_tolerance, 0.0, f64::MAX)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OptimizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bounds(), DESIGN_BOUNDS);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
strategy: global
solver:
  global:
    seed: 42
    mutation: [0.4, 0.9]
"#;
        let config: OptimizerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.strategy, Strategy::Global);
        assert_eq!(config.solver.global.seed, Some(42));
        assert_eq!(config.solver.global.mutation, (0.4, 0.9));
        assert_eq!(config.solver.global.crossover, 0.7);
        assert_eq!(config.solver.local, Default::default());
        assert_eq!(config.penalty_weight, DEFAULT_PENALTY_WEIGHT);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = OptimizerConfig::default();
        config.bounds[2] = [10.0, 1.0];
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidBounds { index: 2, .. })
        ));
    }

    #[test]
    fn test_crossover_must_be_probability() {
        let mut config = OptimizerConfig::default();
        config.solver.global.crossover = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::OutOfRange { field: "solver.global.crossover", .. })
        ));
    }

    #[test]
    fn test_kkt_tolerance_must_be_positive() {
        let mut config = OptimizerConfig::default();
        config.solver.local.kkt_tolerance = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::NotPositive { field: "solver.local.kkt_tolerance", .. })
        ));
    }
}
