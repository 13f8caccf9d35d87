// src/sizing/evaluator.rs

use crate::config::error::{ensure_positive, ConfigurationError};
use crate::config::mission::{Architecture, MissionSpecification, ObjectiveMode};
use crate::config::parameters::ReferenceParameters;
use crate::math::checked;
use crate::math::error::DomainError;
use crate::models::{battery, esc, frame, motor, propeller};
use crate::sizing::design::DesignVector;
use crate::sizing::report::{penalize, MassBreakdown, SizingReport, ThrustRequirement, CONSTRAINT_COUNT};

/// 罰則係数の既定値
pub const DEFAULT_PENALTY_WEIGHT: f64 = 1e9;

/// 評価結果のどの見え方を返すか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    Objective,
    PenalizedObjective,
    Constraints,
    FullReport,
}

/// 評価結果（`EvaluationMode` に対応）
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Objective(f64),
    PenalizedObjective(f64),
    Constraints([f64; CONSTRAINT_COUNT]),
    FullReport(Box<SizingReport>),
}

/// サイジング評価器
///
/// ミッション仕様・機体構成・基準パラメータを不変に保持し、
/// 設計ベクトルから全ての物理量を決まった順序で計算する。
/// 内部状態を持たないため、同じ入力には常に同じ結果を返す。
#[derive(Debug, Clone)]
pub struct SizingEvaluator {
    mission: MissionSpecification,
    architecture: Architecture,
    reference: ReferenceParameters,
    penalty_weight: f64,
}

impl SizingEvaluator {
    /// 設定を検証して評価器を作る
    pub fn new(
        mission: MissionSpecification,
        architecture: Architecture,
        reference: ReferenceParameters,
    ) -> Result<Self, ConfigurationError> {
        mission.validate()?;
        architecture.validate()?;
        reference.validate()?;
        Ok(Self {
            mission,
            architecture,
            reference,
            penalty_weight: DEFAULT_PENALTY_WEIGHT,
        })
    }

    /// 罰則係数を変更する
    pub fn with_penalty_weight(mut self, weight: f64) -> Result<Self, ConfigurationError> {
        ensure_positive("optimizer.penalty_weight", weight)?;
        self.penalty_weight = weight;
        Ok(self)
    }

    pub fn mission(&self) -> &MissionSpecification {
        &self.mission
    }

    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    pub fn reference(&self) -> &ReferenceParameters {
        &self.reference
    }

    pub fn penalty_weight(&self) -> f64 {
        self.penalty_weight
    }

    /// 全ての中間量を計算する（表示はしない）
    ///
    /// 質量 → 推力 → トルク → 部品質量 → 質量 の循環は、
    /// 仮定質量 `k_m·M_pay` から出発して最後に実際の質量を再計算し、
    /// その差を制約に回すことで断ち切る。
    pub fn size(&self, x: &DesignVector) -> Result<SizingReport, DomainError> {
        let env = &self.reference.environment;
        let g = env.gravity;
        let n_pro = f64::from(self.architecture.propeller_count());

        // 1. 仮定質量と推力要求
        let assumed_mass = x.k_m * self.mission.payload_mass;
        let thrust_hover = checked::div("thrust_hover", assumed_mass * g, n_pro)?;
        let thrust_takeoff = thrust_hover * (g + self.mission.takeoff_acceleration) / g;

        // 2. プロペラ
        let prop = propeller::size_propeller(
            &self.reference.propeller,
            env.air_density,
            x.beta,
            x.k_nd,
            thrust_hover,
            thrust_takeoff,
        )?;
        let voltage_estimate =
            x.k_vb * battery::estimated_voltage(&self.reference.voltage_law, prop.hover.power)?;

        // 3. モータ
        let mot = motor::size_motor(
            &self.reference.motor,
            &prop,
            voltage_estimate,
            x.k_mot,
            x.k_speed_mot,
        )?;

        // 4. バッテリと ESC
        let bat = battery::size_battery(
            &self.reference.battery,
            voltage_estimate,
            x.k_mb * self.mission.payload_mass,
            mot.hover.electrical_power * n_pro,
        )?;
        let controller = esc::size_esc(
            &self.reference.esc,
            &self.reference.voltage_law,
            mot.takeoff.electrical_power,
            bat.voltage,
            mot.takeoff.voltage,
        )?;

        // 5. フレーム
        let fra = frame::size_frame(
            &self.reference.frame,
            &self.architecture,
            prop.diameter,
            thrust_takeoff,
            x.k_d,
        )?;

        // 6. 実際の総質量
        let mut mass = MassBreakdown {
            propellers: prop.mass * n_pro,
            motors: mot.mass * n_pro,
            escs: controller.mass * n_pro,
            battery: bat.mass,
            frame: fra.mass,
            payload: self.mission.payload_mass,
            total: 0.0,
        };
        mass.total = checked::finite(
            "mass.total",
            mass.propellers + mass.motors + mass.escs + mass.battery + mass.frame + mass.payload,
        )?;

        let (objective, mission_margin) = match self.mission.objective {
            ObjectiveMode::MinimizeMass => (mass.total, bat.hover_time - self.mission.hover_time),
            ObjectiveMode::MaximizeHoverTime => (
                checked::div("objective", 1.0, bat.hover_time)?,
                self.mission.max_takeoff_mass - mass.total,
            ),
        };

        let constraints = [
            assumed_mass - mass.total,
            bat.voltage - mot.takeoff.voltage,
            mot.torque_max - prop.takeoff.torque,
            bat.voltage - controller.voltage,
            controller.voltage - mot.takeoff.voltage,
            mission_margin,
        ];
        for c in &constraints {
            checked::finite("constraint", *c)?;
        }

        Ok(SizingReport {
            design: *x,
            objective_mode: self.mission.objective,
            thrust: ThrustRequirement {
                assumed_mass,
                thrust_hover,
                thrust_takeoff,
            },
            propeller: prop,
            voltage_estimate,
            motor: mot,
            battery: bat,
            esc: controller,
            frame: fra,
            mass,
            objective,
            penalized_objective: penalize(objective, &constraints, self.penalty_weight),
            constraints,
        })
    }

    /// 指定した見え方で評価する。計算経路は常に同じ。
    pub fn evaluate(&self, x: &DesignVector, mode: EvaluationMode) -> Result<Evaluation, DomainError> {
        let report = self.size(x)?;
        Ok(match mode {
            EvaluationMode::Objective => Evaluation::Objective(report.objective),
            EvaluationMode::PenalizedObjective => {
                Evaluation::PenalizedObjective(report.penalized_objective)
            }
            EvaluationMode::Constraints => Evaluation::Constraints(report.constraints),
            EvaluationMode::FullReport => Evaluation::FullReport(Box::new(report)),
        })
    }

    pub fn objective(&self, x: &DesignVector) -> Result<f64, DomainError> {
        Ok(self.size(x)?.objective)
    }

    pub fn penalized_objective(&self, x: &DesignVector) -> Result<f64, DomainError> {
        Ok(self.size(x)?.penalized_objective)
    }

    pub fn constraints(&self, x: &DesignVector) -> Result<[f64; CONSTRAINT_COUNT], DomainError> {
        Ok(self.size(x)?.constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn evaluator(mode: ObjectiveMode) -> SizingEvaluator {
        let mission = MissionSpecification {
            objective: mode,
            ..MissionSpecification::default()
        };
        SizingEvaluator::new(mission, Architecture::default(), ReferenceParameters::default()).unwrap()
    }

    fn initial() -> DesignVector {
        DesignVector::from_array([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01])
    }

    #[test]
    fn test_views_are_projections_of_one_report() {
        let ev = evaluator(ObjectiveMode::MinimizeMass);
        let x = initial();
        let report = ev.size(&x).unwrap();
        assert_eq!(
            ev.evaluate(&x, EvaluationMode::Objective).unwrap(),
            Evaluation::Objective(report.objective)
        );
        assert_eq!(
            ev.evaluate(&x, EvaluationMode::PenalizedObjective).unwrap(),
            Evaluation::PenalizedObjective(report.penalized_objective)
        );
        assert_eq!(
            ev.evaluate(&x, EvaluationMode::Constraints).unwrap(),
            Evaluation::Constraints(report.constraints)
        );
        match ev.evaluate(&x, EvaluationMode::FullReport).unwrap() {
            Evaluation::FullReport(full) => assert_eq!(*full, report),
            other => panic!("Expected FullReport, got {:?}", other),
        }
    }

    /// 推力は総重量をプロペラ数で割ったもの、離陸推力は (g + a)/g 倍
    #[test]
    fn test_thrust_requirement() {
        let ev = evaluator(ObjectiveMode::MinimizeMass);
        let report = ev.size(&initial()).unwrap();
        assert_relative_eq!(report.thrust.assumed_mass, 320.0, max_relative = 1e-12);
        assert_relative_eq!(report.thrust.thrust_hover, 320.0 * 9.81 / 8.0, max_relative = 1e-12);
        assert_relative_eq!(
            report.thrust.thrust_takeoff,
            report.thrust.thrust_hover * 1.25,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_total_mass_is_sum_of_components() {
        let ev = evaluator(ObjectiveMode::MinimizeMass);
        let r = ev.size(&initial()).unwrap();
        let sum = 8.0 * (r.propeller.mass + r.motor.mass + r.esc.mass)
            + r.battery.mass
            + r.frame.mass
            + 100.0;
        assert_relative_eq!(r.mass.total, sum, max_relative = 1e-12);
        assert_eq!(r.objective, r.mass.total);
        assert_relative_eq!(r.constraints[0], 320.0 - r.mass.total, max_relative = 1e-12);
    }

    #[test]
    fn test_hover_mode_objective_is_reciprocal_time() {
        let ev = evaluator(ObjectiveMode::MaximizeHoverTime);
        let r = ev.size(&initial()).unwrap();
        assert!(r.battery.hover_time > 0.0);
        assert_relative_eq!(r.objective, 1.0 / r.battery.hover_time, max_relative = 1e-12);
        assert_relative_eq!(r.constraints[5], 360.0 - r.mass.total, max_relative = 1e-12);
    }

    #[test]
    fn test_penalized_objective_adds_weighted_violation() {
        let ev = evaluator(ObjectiveMode::MinimizeMass);
        let r = ev.size(&initial()).unwrap();
        let violation: f64 = r.constraints.iter().map(|c| (-c).max(0.0)).sum();
        assert_relative_eq!(
            r.penalized_objective,
            r.objective + DEFAULT_PENALTY_WEIGHT * violation,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_penalty_weight_must_be_positive() {
        let ev = evaluator(ObjectiveMode::MinimizeMass);
        assert!(ev.clone().with_penalty_weight(0.0).is_err());
        assert_eq!(ev.with_penalty_weight(1e3).unwrap().penalty_weight(), 1e3);
    }

    #[test]
    fn test_invalid_mission_rejected_at_construction() {
        let mission = MissionSpecification {
            hover_time: -1.0,
            ..MissionSpecification::default()
        };
        let result = SizingEvaluator::new(mission, Architecture::default(), ReferenceParameters::default());
        assert!(matches!(result, Err(ConfigurationError::NotPositive { .. })));
    }
}
