// src/optimization/mod.rs

pub mod global;
pub mod local;
pub mod space;

use std::fmt;

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::config::error::ConfigurationError;
use crate::math::error::DomainError;
use crate::sizing::{DesignVector, SizingEvaluator, DESIGN_DIM, DESIGN_LABELS};

pub use global::GlobalSettings;
pub use local::LocalSettings;

/// 各変数の (下限, 上限)
pub type Bounds<const N: usize> = [(f64, f64); N];

/// 不等式制約付き最小化問題（制約は c(x) ≥ 0 で満たされる）
pub trait ConstrainedProblem<const N: usize> {
    fn objective(&self, x: &[f64; N]) -> Result<f64, DomainError>;

    fn constraints(&self, x: &[f64; N]) -> Result<Vec<f64>, DomainError>;

    /// 制約を扱えない解法向けの罰則付き目的関数
    fn penalized_objective(&self, x: &[f64; N]) -> Result<f64, DomainError>;

    /// 目的関数と制約を1回の評価で求める
    fn objective_and_constraints(&self, x: &[f64; N]) -> Result<(f64, Vec<f64>), DomainError> {
        Ok((self.objective(x)?, self.constraints(x)?))
    }
}

impl ConstrainedProblem<DESIGN_DIM> for SizingEvaluator {
    fn objective(&self, x: &[f64; DESIGN_DIM]) -> Result<f64, DomainError> {
        SizingEvaluator::objective(self, &DesignVector::from_array(*x))
    }

    fn constraints(&self, x: &[f64; DESIGN_DIM]) -> Result<Vec<f64>, DomainError> {
        Ok(SizingEvaluator::constraints(self, &DesignVector::from_array(*x))?.to_vec())
    }

    fn penalized_objective(&self, x: &[f64; DESIGN_DIM]) -> Result<f64, DomainError> {
        SizingEvaluator::penalized_objective(self, &DesignVector::from_array(*x))
    }

    fn objective_and_constraints(
        &self,
        x: &[f64; DESIGN_DIM],
    ) -> Result<(f64, Vec<f64>), DomainError> {
        let report = self.size(&DesignVector::from_array(*x))?;
        Ok((report.objective, report.constraints.to_vec()))
    }
}

/// 探索戦略
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// 有限差分勾配による逐次二次計画法（制約を不等式として直接扱う）
    Local,
    /// 罰則付き目的関数に対する差分進化
    Global,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Local => f.write_str("local"),
            Strategy::Global => f.write_str("global"),
        }
    }
}

/// 両戦略の設定
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SolverSettings {
    pub local: LocalSettings,
    pub global: GlobalSettings,
}

/// 反復上限までに収束判定を満たさなかったことの通知（致命的ではない）
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceWarning {
    pub strategy: Strategy,
    pub iterations: usize,
    pub message: String,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 探索が {} 回で収束しませんでした: {}",
            self.strategy, self.iterations, self.message
        )
    }
}

/// 最適化ドライバのエラー
#[derive(Error, Debug)]
pub enum OptimizationError {
    #[error("局所探索中に実行不能点に到達したため中断しました: {0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// 1つの解法が返す結果
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome<const N: usize> {
    pub x: [f64; N],
    pub objective: f64,
    pub max_violation: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
    pub message: String,
}

/// 最適化結果
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult<const N: usize> {
    pub strategy: Strategy,
    pub x: [f64; N],
    pub objective: f64,
    pub max_violation: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub warning: Option<ConvergenceWarning>,
}

impl<const N: usize> OptimizationResult<N> {
    pub fn converged(&self) -> bool {
        self.warning.is_none()
    }
}

/// 範囲の妥当性を確認する
pub fn validate_bounds<const N: usize>(bounds: &Bounds<N>) -> Result<(), ConfigurationError> {
    for (index, &(lower, upper)) in bounds.iter().enumerate() {
        if !(lower.is_finite() && upper.is_finite()) || lower > upper {
            return Err(ConfigurationError::InvalidBounds { index, lower, upper });
        }
    }
    Ok(())
}

/// 最大の制約違反量（全て満たしていれば 0）
pub fn max_violation(constraints: &[f64]) -> f64 {
    constraints.iter().fold(0.0_f64, |acc, c| acc.max(-c))
}

/// 範囲内に射影する
pub fn clip<const N: usize>(x: &[f64; N], bounds: &Bounds<N>) -> [f64; N] {
    let mut out = *x;
    for (v, &(lower, upper)) in out.iter_mut().zip(bounds.iter()) {
        *v = v.clamp(lower, upper);
    }
    out
}

/// 最適化を実行する
///
/// # 引数
/// - `problem`: 目的関数・制約・罰則付き目的関数を提供する問題
/// - `initial`: 初期点（範囲外の成分は範囲内に射影する）
/// - `bounds`: 各変数の閉区間
/// - `strategy`: 局所 (SQP) または大域 (差分進化)
/// - `settings`: 解法の設定
///
/// # 戻り値
/// - 最良点。収束しなかった場合も `Ok` で、`warning` に理由が入る
pub fn optimize<P, const N: usize>(
    problem: &P,
    initial: &[f64; N],
    bounds: &Bounds<N>,
    strategy: Strategy,
    settings: &SolverSettings,
) -> Result<OptimizationResult<N>, OptimizationError>
where
    P: ConstrainedProblem<N>,
{
    validate_bounds(bounds)?;
    let start = clip(initial, bounds);
    if start != *initial {
        warn!("初期点が範囲外のため範囲内に射影しました: {:?} -> {:?}", initial, start);
    }

    info!("{} 探索を開始します", strategy);
    let outcome = match strategy {
        Strategy::Local => local::minimize(problem, &start, bounds, &settings.local)?,
        Strategy::Global => {
            let outcome = global::minimize(problem, Some(&start), bounds, &settings.global);
            if settings.global.polish {
                polish(problem, outcome, bounds, &settings.local)
            } else {
                outcome
            }
        }
    };

    let warning = if outcome.converged {
        None
    } else {
        let w = ConvergenceWarning {
            strategy,
            iterations: outcome.iterations,
            message: outcome.message.clone(),
        };
        warn!("{}", w);
        Some(w)
    };
    info!(
        "{} 探索を終了しました: 目的関数 {:.6}, 最大制約違反 {:.3e}, 反復 {}, 評価 {}",
        strategy, outcome.objective, outcome.max_violation, outcome.iterations, outcome.evaluations
    );

    Ok(OptimizationResult {
        strategy,
        x: outcome.x,
        objective: outcome.objective,
        max_violation: outcome.max_violation,
        iterations: outcome.iterations,
        evaluations: outcome.evaluations,
        warning,
    })
}

/// 差分進化の最良点から局所探索をかけ、実行可能でより良ければ置き換える
fn polish<P, const N: usize>(
    problem: &P,
    outcome: SolverOutcome<N>,
    bounds: &Bounds<N>,
    settings: &LocalSettings,
) -> SolverOutcome<N>
where
    P: ConstrainedProblem<N>,
{
    match local::minimize(problem, &outcome.x, bounds, settings) {
        Ok(refined) => {
            let evaluations = outcome.evaluations + refined.evaluations;
            let feasible = refined.max_violation <= settings.feasibility_tolerance;
            let better = outcome.max_violation > settings.feasibility_tolerance
                || refined.objective < outcome.objective;
            if feasible && better {
                info!(
                    "局所探索で仕上げました: {:.6} -> {:.6}",
                    outcome.objective, refined.objective
                );
                SolverOutcome {
                    x: refined.x,
                    objective: refined.objective,
                    max_violation: refined.max_violation,
                    evaluations,
                    ..outcome
                }
            } else {
                SolverOutcome { evaluations, ..outcome }
            }
        }
        Err(e) => {
            warn!("仕上げの局所探索を中断しました: {}", e);
            outcome
        }
    }
}

/// 設計ベクトルに対する最適化
///
/// 最適点の設計ベクトルと最適化結果を返す。
pub fn optimize_design(
    evaluator: &SizingEvaluator,
    initial: &DesignVector,
    bounds: &Bounds<DESIGN_DIM>,
    strategy: Strategy,
    settings: &SolverSettings,
) -> Result<(DesignVector, OptimizationResult<DESIGN_DIM>), OptimizationError> {
    let result = optimize(evaluator, &initial.to_array(), bounds, strategy, settings)?;
    let design = DesignVector::from_array(result.x);
    for (label, value) in DESIGN_LABELS.iter().zip(result.x.iter()) {
        log::debug!("  {} = {:.6}", label, value);
    }
    Ok((design, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// min (x-3)² + (y-1)²  s.t.  x + y ≤ 2  （解は (2, 0)）
    struct Disk;

    impl ConstrainedProblem<2> for Disk {
        fn objective(&self, x: &[f64; 2]) -> Result<f64, DomainError> {
            Ok((x[0] - 3.0).powi(2) + (x[1] - 1.0).powi(2))
        }

        fn constraints(&self, x: &[f64; 2]) -> Result<Vec<f64>, DomainError> {
            Ok(vec![2.0 - x[0] - x[1]])
        }

        fn penalized_objective(&self, x: &[f64; 2]) -> Result<f64, DomainError> {
            let c = self.constraints(x)?[0];
            Ok(self.objective(x)? + 1e6 * (-c).max(0.0))
        }
    }

    #[test]
    fn test_clip_projects_into_bounds() {
        let bounds = [(0.0, 1.0), (-1.0, 1.0)];
        assert_eq!(clip(&[2.0, -3.0], &bounds), [1.0, -1.0]);
        assert_eq!(clip(&[0.5, 0.0], &bounds), [0.5, 0.0]);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let bounds = [(0.0, 1.0), (2.0, 1.0)];
        assert!(matches!(
            validate_bounds(&bounds),
            Err(ConfigurationError::InvalidBounds { index: 1, .. })
        ));
        let result = optimize(&Disk, &[0.0, 0.0], &bounds, Strategy::Local, &SolverSettings::default());
        assert!(matches!(result, Err(OptimizationError::Configuration(_))));
    }

    #[test]
    fn test_both_strategies_solve_disk_problem() {
        let bounds = [(-5.0, 5.0), (-5.0, 5.0)];
        let settings = SolverSettings {
            global: GlobalSettings {
                seed: Some(3),
                ..GlobalSettings::default()
            },
            ..SolverSettings::default()
        };
        for strategy in [Strategy::Local, Strategy::Global] {
            let result = optimize(&Disk, &[0.0, 0.0], &bounds, strategy, &settings).unwrap();
            assert!((result.x[0] - 2.0).abs() < 1e-2, "{}: {:?}", strategy, result.x);
            assert!(result.x[1].abs() < 1e-2, "{}: {:?}", strategy, result.x);
            assert!((result.objective - 2.0).abs() < 2e-2, "{}: {}", strategy, result.objective);
        }
    }

    #[test]
    fn test_max_violation_is_largest_negative_margin() {
        assert_eq!(max_violation(&[1.0, -0.5, -2.0]), 2.0);
        assert_eq!(max_violation(&[0.3, 0.0]), 0.0);
        assert_eq!(max_violation(&[]), 0.0);
    }
}
