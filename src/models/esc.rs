// src/models/esc.rs

use crate::config::parameters::{EscReference, VoltageLaw};
use crate::math::checked;
use crate::math::error::DomainError;
use crate::models::battery::estimated_voltage;

/// ESC のサイジング結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscSizing {
    pub power: f64,   // 定格電力 (W)
    pub mass: f64,    // 1台あたり質量 (kg)
    pub voltage: f64, // 定格電圧 (V)
}

/// ESC のサイジング
///
/// 離陸時のモータ電流をバッテリ電圧で流せる電力を定格とする。
pub fn size_esc(
    reference: &EscReference,
    law: &VoltageLaw,
    takeoff_power: f64,
    battery_voltage: f64,
    motor_voltage: f64,
) -> Result<EscSizing, DomainError> {
    let power = checked::div("esc.power", takeoff_power * battery_voltage, motor_voltage)?;
    let mass = reference.mass * checked::div("esc.power_ratio", power, reference.power)?;
    Ok(EscSizing {
        power,
        mass,
        voltage: estimated_voltage(law, power)?,
    })
}
