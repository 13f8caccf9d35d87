// src/models/motor.rs

use crate::config::parameters::MotorReference;
use crate::math::checked;
use crate::math::error::DomainError;
use crate::models::propeller::{PropellerOperatingPoint, PropellerSizing};

// トルク比に対するスケーリング指数
const MASS_EXPONENT: f64 = 3.0 / 3.5;
const RESISTANCE_EXPONENT: f64 = -5.0 / 3.5;
const FRICTION_EXPONENT: f64 = 3.0 / 3.5;

/// ある運転点でのモータの電気的状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorOperatingPoint {
    pub current: f64,          // 電流 (A)
    pub voltage: f64,          // 電圧 (V)
    pub electrical_power: f64, // 電気入力 (W)
}

/// モータのサイジング結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorSizing {
    pub torque_nominal: f64,  // 定格トルク (N·m)
    pub torque_max: f64,      // 最大トルク (N·m)
    pub mass: f64,            // 1台あたり質量 (kg)
    pub torque_constant: f64, // トルク定数 (N·m/A)
    pub resistance: f64,      // 巻線抵抗 (Ω)
    pub friction_torque: f64, // 摩擦トルク (N·m)
    pub hover: MotorOperatingPoint,
    pub takeoff: MotorOperatingPoint,
}

/// 負荷トルクと角速度から電流・電圧を求める
///
/// I = (Q + Tf)/Kt, U = R·I + Kt·ω
pub fn operating_point(
    torque_constant: f64,
    resistance: f64,
    friction_torque: f64,
    load: &PropellerOperatingPoint,
) -> Result<MotorOperatingPoint, DomainError> {
    let current = checked::div("motor.current", load.torque + friction_torque, torque_constant)?;
    let voltage = resistance * current + torque_constant * load.angular_speed;
    Ok(MotorOperatingPoint {
        current,
        voltage,
        electrical_power: checked::finite("motor.electrical_power", voltage * current)?,
    })
}

/// モータのサイジング
///
/// # 引数
/// - `reference`: 基準モータ
/// - `propeller`: プロペラのサイジング結果（ホバリング/離陸の負荷）
/// - `voltage_estimate`: 要求バッテリ電圧の見積り (V)
/// - `k_mot`: トルクの過大評価係数
/// - `k_speed_mot`: 回転数の過大評価係数
///
/// # 戻り値
/// - 定格・質量・電気定数と2つの運転点
pub fn size_motor(
    reference: &MotorReference,
    propeller: &PropellerSizing,
    voltage_estimate: f64,
    k_mot: f64,
    k_speed_mot: f64,
) -> Result<MotorSizing, DomainError> {
    let torque_nominal = k_mot * propeller.hover.torque;
    let torque_ratio = checked::div("motor.torque_ratio", torque_nominal, reference.torque_nominal)?;
    let torque_max = reference.torque_max * torque_ratio;
    let mass = reference.mass * checked::powf("motor.mass", torque_ratio, MASS_EXPONENT)?;

    // 離陸角速度の k_speed_mot 倍で見積り電圧に達する巻線
    let torque_constant = checked::div(
        "motor.torque_constant",
        voltage_estimate,
        k_speed_mot * propeller.takeoff.angular_speed,
    )?;
    let resistance = reference.resistance
        * checked::powf("motor.resistance", torque_ratio, RESISTANCE_EXPONENT)?
        * (torque_constant / reference.torque_constant).powi(2);
    let friction_torque =
        reference.friction_torque * checked::powf("motor.friction_torque", torque_ratio, FRICTION_EXPONENT)?;

    let hover = operating_point(torque_constant, resistance, friction_torque, &propeller.hover)?;
    let takeoff = operating_point(torque_constant, resistance, friction_torque, &propeller.takeoff)?;

    Ok(MotorSizing {
        torque_nominal,
        torque_max,
        mass,
        torque_constant,
        resistance,
        friction_torque,
        hover,
        takeoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parameters::PropellerReference;
    use crate::models::propeller::size_propeller;
    use approx::assert_relative_eq;

    fn propeller() -> PropellerSizing {
        size_propeller(&PropellerReference::default(), 1.18, 0.33, 1.2, 392.4, 490.5).unwrap()
    }

    /// 基準トルクで定格を選ぶと基準モータの質量・摩擦に戻る
    #[test]
    fn test_reference_torque_reproduces_reference_motor() {
        let reference = MotorReference::default();
        let mut prop = propeller();
        prop.hover.torque = reference.torque_nominal;
        let motor = size_motor(&reference, &prop, 40.0, 1.0, 1.0).unwrap();
        assert_relative_eq!(motor.mass, reference.mass, max_relative = 1e-12);
        assert_relative_eq!(motor.friction_torque, reference.friction_torque, max_relative = 1e-12);
        assert_relative_eq!(motor.torque_max, reference.torque_max, max_relative = 1e-12);
    }

    #[test]
    fn test_operating_point_balances_voltage() {
        let motor = size_motor(&MotorReference::default(), &propeller(), 40.0, 1.1, 1.3).unwrap();
        let prop = propeller();
        let expected = motor.resistance * motor.takeoff.current
            + motor.torque_constant * prop.takeoff.angular_speed;
        assert_relative_eq!(motor.takeoff.voltage, expected, max_relative = 1e-12);
        assert!(motor.takeoff.current > motor.hover.current);
        assert!(motor.takeoff.electrical_power > prop.takeoff.power);
    }

    /// 回転数の余裕を増やすとトルク定数が下がり、電流が増える
    #[test]
    fn test_speed_oversizing_lowers_torque_constant() {
        let prop = propeller();
        let slow = size_motor(&MotorReference::default(), &prop, 40.0, 1.0, 1.0).unwrap();
        let fast = size_motor(&MotorReference::default(), &prop, 40.0, 1.0, 2.0).unwrap();
        assert_relative_eq!(fast.torque_constant, slow.torque_constant / 2.0, max_relative = 1e-12);
        assert!(fast.hover.current > slow.hover.current);
        assert_eq!(fast.mass, slow.mass);
    }
}
