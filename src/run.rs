// src/run.rs

use log::{info, warn};

use crate::config::{MissionConfig, OptimizerConfig, ReferenceParameters};
use crate::error::SizingError;
use crate::optimization::{clip, optimize_design, OptimizationResult};
use crate::sizing::{DesignVector, SizingEvaluator, SizingReport, DESIGN_DIM};

/// 1回のサイジング最適化の結果一式
#[derive(Debug, Clone)]
pub struct SizingRun {
    /// 範囲内に射影した初期点での評価（評価できなければ `None`）
    pub initial: Option<SizingReport>,
    pub result: OptimizationResult<DESIGN_DIM>,
    /// 最適点での全中間量
    pub report: SizingReport,
}

/// 設定から評価器を組み立て、最適化し、最適点を評価し直す
pub fn run_sizing(
    mission: &MissionConfig,
    reference: &ReferenceParameters,
    optimizer: &OptimizerConfig,
) -> Result<SizingRun, SizingError> {
    optimizer.validate()?;
    let evaluator = SizingEvaluator::new(
        mission.mission.clone(),
        mission.architecture,
        reference.clone(),
    )?
    .with_penalty_weight(optimizer.penalty_weight)?;

    let bounds = optimizer.bounds();
    let start = DesignVector::from_array(clip(&optimizer.initial.to_array(), &bounds));
    let initial = match evaluator.size(&start) {
        Ok(report) => {
            info!(
                "初期点: 目的関数 {:.6}, 最大制約違反 {:.3e}",
                report.objective,
                report.max_violation()
            );
            Some(report)
        }
        Err(e) => {
            warn!("初期点を評価できません: {}", e);
            None
        }
    };

    let (design, result) = optimize_design(
        &evaluator,
        &optimizer.initial,
        &bounds,
        optimizer.strategy,
        &optimizer.solver,
    )?;
    let report = evaluator.size(&design)?;

    let tolerance = optimizer.solver.local.feasibility_tolerance;
    if report.is_feasible(tolerance) {
        info!("最適点は全ての制約を満たしています（総質量 {:.3} kg）", report.mass.total);
    } else {
        warn!(
            "最適点が制約を満たしていません（最大違反 {:.3e} > {:.1e}）",
            report.max_violation(),
            tolerance
        );
    }

    Ok(SizingRun {
        initial,
        result,
        report,
    })
}
