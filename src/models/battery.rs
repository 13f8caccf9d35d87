// src/models/battery.rs

use crate::config::parameters::{BatteryReference, VoltageLaw};
use crate::math::checked;
use crate::math::error::DomainError;

/// バッテリのサイジング結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatterySizing {
    pub cell_count: u32, // 直列セル数
    pub voltage: f64,    // 電圧 (V)
    pub mass: f64,       // 質量 (kg)
    pub energy: f64,     // エネルギー (J)
    pub capacity: f64,   // 容量 (A·s)
    pub current: f64,    // ホバリング時の放電電流 (A)
    pub hover_time: f64, // ホバリング時間 (min)
}

/// 電力から電圧を見積もる回帰則 U = a·P^b
pub fn estimated_voltage(law: &VoltageLaw, power: f64) -> Result<f64, DomainError> {
    Ok(law.coefficient * checked::powf("voltage_law", power, law.exponent)?)
}

/// バッテリのサイジング
///
/// # 引数
/// - `reference`: 基準バッテリ
/// - `voltage_estimate`: 要求電圧 (V)
/// - `mass`: バッテリ質量 (kg)
/// - `hover_power`: ホバリング時の全モータの電気入力 (W)
///
/// # 戻り値
/// - セル数・電圧・容量・ホバリング時間
pub fn size_battery(
    reference: &BatteryReference,
    voltage_estimate: f64,
    mass: f64,
    hover_power: f64,
) -> Result<BatterySizing, DomainError> {
    let cells = checked::div("battery.cell_count", voltage_estimate, reference.cell_voltage)?.ceil();
    if cells < 1.0 {
        return Err(DomainError::BelowMinimum {
            quantity: "battery.cell_count",
            value: cells,
            minimum: 1.0,
        });
    }
    let cell_count = cells as u32;
    let voltage = cells * reference.cell_voltage;

    let energy = reference.energy * checked::div("battery.mass_ratio", mass, reference.mass)?;
    let capacity = checked::div("battery.capacity", energy, voltage)?;
    let current = checked::div("battery.current", hover_power, voltage)?;
    let hover_time = checked::div("battery.hover_time", reference.usable_fraction * capacity, current)? / 60.0;

    Ok(BatterySizing {
        cell_count,
        voltage,
        mass,
        energy,
        capacity,
        current,
        hover_time,
    })
}
