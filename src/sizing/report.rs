// src/sizing/report.rs

use std::fmt;

use crate::config::mission::ObjectiveMode;
use crate::models::{BatterySizing, EscSizing, FrameSizing, MotorSizing, PropellerSizing};
use crate::optimization::max_violation;
use crate::sizing::design::{DesignVector, DESIGN_LABELS};

/// 制約の数
pub const CONSTRAINT_COUNT: usize = 6;

/// 制約の名前（レポート用）
pub const CONSTRAINT_LABELS: [&str; CONSTRAINT_COUNT] = [
    "mass_margin",
    "battery_vs_motor_voltage",
    "motor_torque_margin",
    "battery_vs_esc_voltage",
    "esc_vs_motor_voltage",
    "mission_margin",
];

/// 推力要求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustRequirement {
    pub assumed_mass: f64,   // 仮定した総質量 (kg)
    pub thrust_hover: f64,   // プロペラ1枚あたりのホバリング推力 (N)
    pub thrust_takeoff: f64, // プロペラ1枚あたりの離陸推力 (N)
}

/// 質量の内訳（全数量分）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassBreakdown {
    pub propellers: f64,
    pub motors: f64,
    pub escs: f64,
    pub battery: f64,
    pub frame: f64,
    pub payload: f64,
    pub total: f64, // 再計算した実際の総質量 (kg)
}

/// 1回の評価で得られる全ての中間量
#[derive(Debug, Clone, PartialEq)]
pub struct SizingReport {
    pub design: DesignVector,
    pub objective_mode: ObjectiveMode,
    pub thrust: ThrustRequirement,
    pub propeller: PropellerSizing,
    pub voltage_estimate: f64,
    pub motor: MotorSizing,
    pub battery: BatterySizing,
    pub esc: EscSizing,
    pub frame: FrameSizing,
    pub mass: MassBreakdown,
    pub objective: f64,
    pub penalized_objective: f64,
    pub constraints: [f64; CONSTRAINT_COUNT],
}

/// 表示用の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Design,
    Thrust,
    Propeller,
    Motor,
    Battery,
    Esc,
    Frame,
    Mass,
    Constraint,
    Objective,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Design => "design",
            Category::Thrust => "thrust",
            Category::Propeller => "propeller",
            Category::Motor => "motor",
            Category::Battery => "battery",
            Category::Esc => "esc",
            Category::Frame => "frame",
            Category::Mass => "mass",
            Category::Constraint => "constraint",
            Category::Objective => "objective",
        };
        f.write_str(name)
    }
}

/// レポート表の1行
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub name: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub category: Category,
}

/// 制約違反量の合計 Σ|min(c, 0)|
pub fn total_violation(constraints: &[f64]) -> f64 {
    constraints.iter().map(|c| (-c).max(0.0)).sum()
}

/// 罰則付き目的関数 f + w·Σ|min(c, 0)|
pub fn penalize(objective: f64, constraints: &[f64], weight: f64) -> f64 {
    objective + weight * total_violation(constraints)
}

impl SizingReport {
    /// 最大の制約違反量（全て満たしていれば 0）
    pub fn max_violation(&self) -> f64 {
        max_violation(&self.constraints)
    }

    pub fn is_feasible(&self, tolerance: f64) -> bool {
        self.max_violation() <= tolerance
    }

    /// 表示用の (名前, 値, 単位, 分類) の一覧
    pub fn entries(&self) -> Vec<ReportEntry> {
        use Category::*;
        let p = &self.propeller;
        let m = &self.motor;
        let b = &self.battery;
        let e = &self.esc;
        let fr = &self.frame;
        let mass = &self.mass;

        let mut rows: Vec<(&'static str, f64, &'static str, Category)> = DESIGN_LABELS
            .iter()
            .zip(self.design.to_array())
            .map(|(name, value)| (*name, value, "-", Design))
            .collect();

        rows.extend([
            ("assumed_mass", self.thrust.assumed_mass, "kg", Thrust),
            ("thrust_hover", self.thrust.thrust_hover, "N", Thrust),
            ("thrust_takeoff", self.thrust.thrust_takeoff, "N", Thrust),
            ("ct", p.thrust_coefficient, "-", Propeller),
            ("cp", p.power_coefficient, "-", Propeller),
            ("diameter", p.diameter, "m", Propeller),
            ("propeller_mass", p.mass, "kg", Propeller),
            ("speed_takeoff", p.takeoff.speed * 60.0, "rpm", Propeller),
            ("speed_hover", p.hover.speed * 60.0, "rpm", Propeller),
            ("power_takeoff", p.takeoff.power, "W", Propeller),
            ("power_hover", p.hover.power, "W", Propeller),
            ("torque_takeoff", p.takeoff.torque, "N.m", Propeller),
            ("torque_hover", p.hover.torque, "N.m", Propeller),
            ("voltage_estimate", self.voltage_estimate, "V", Propeller),
            ("torque_nominal", m.torque_nominal, "N.m", Motor),
            ("torque_max", m.torque_max, "N.m", Motor),
            ("motor_mass", m.mass, "kg", Motor),
            ("torque_constant", m.torque_constant, "N.m/A", Motor),
            ("resistance", m.resistance, "Ohm", Motor),
            ("friction_torque", m.friction_torque, "N.m", Motor),
            ("current_hover", m.hover.current, "A", Motor),
            ("current_takeoff", m.takeoff.current, "A", Motor),
            ("voltage_hover", m.hover.voltage, "V", Motor),
            ("voltage_takeoff", m.takeoff.voltage, "V", Motor),
            ("electrical_power_hover", m.hover.electrical_power, "W", Motor),
            ("electrical_power_takeoff", m.takeoff.electrical_power, "W", Motor),
            ("cell_count", f64::from(b.cell_count), "-", Battery),
            ("battery_voltage", b.voltage, "V", Battery),
            ("battery_mass", b.mass, "kg", Battery),
            ("battery_energy", b.energy / 3600.0, "Wh", Battery),
            ("battery_capacity", b.capacity / 3600.0, "A.h", Battery),
            ("battery_current", b.current, "A", Battery),
            ("hover_time", b.hover_time, "min", Battery),
            ("esc_power", e.power, "W", Esc),
            ("esc_mass", e.mass, "kg", Esc),
            ("esc_voltage", e.voltage, "V", Esc),
            ("separation_angle", fr.separation_angle.to_degrees(), "deg", Frame),
            ("arm_length", fr.arm_length, "m", Frame),
            ("arm_outer_diameter", fr.outer_diameter, "m", Frame),
            ("arm_inner_diameter", fr.inner_diameter, "m", Frame),
            ("arm_wall_thickness", fr.wall_thickness, "m", Frame),
            ("arm_mass", fr.arm_mass, "kg", Frame),
            ("frame_mass", fr.mass, "kg", Frame),
            ("mass_propellers", mass.propellers, "kg", Mass),
            ("mass_motors", mass.motors, "kg", Mass),
            ("mass_escs", mass.escs, "kg", Mass),
            ("mass_battery", mass.battery, "kg", Mass),
            ("mass_frame", mass.frame, "kg", Mass),
            ("mass_payload", mass.payload, "kg", Mass),
            ("mass_total", mass.total, "kg", Mass),
        ]);

        let mission_unit = match self.objective_mode {
            ObjectiveMode::MinimizeMass => "min",
            ObjectiveMode::MaximizeHoverTime => "kg",
        };
        let units = ["kg", "V", "N.m", "V", "V", mission_unit];
        rows.extend(
            CONSTRAINT_LABELS
                .iter()
                .zip(self.constraints.iter())
                .zip(units)
                .map(|((name, value), unit)| (*name, *value, unit, Constraint)),
        );

        let objective_unit = match self.objective_mode {
            ObjectiveMode::MinimizeMass => "kg",
            ObjectiveMode::MaximizeHoverTime => "1/min",
        };
        rows.push(("objective", self.objective, objective_unit, Objective));
        rows.push(("penalized_objective", self.penalized_objective, objective_unit, Objective));

        rows.into_iter()
            .map(|(name, value, unit, category)| ReportEntry {
                name,
                value,
                unit,
                category,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_ignores_satisfied_constraints() {
        assert_eq!(total_violation(&[1.0, 0.0, 5.0]), 0.0);
        assert_eq!(penalize(10.0, &[1.0, 0.0, 5.0], 1e9), 10.0);
    }

    #[test]
    fn test_penalty_sums_violations() {
        assert_eq!(total_violation(&[-1.0, 2.0, -0.5]), 1.5);
        assert_eq!(penalize(10.0, &[-1.0, 2.0, -0.5], 100.0), 160.0);
    }
}
