// src/models/propeller.rs

use std::f64::consts::PI;

use crate::config::parameters::PropellerReference;
use crate::math::checked;
use crate::math::error::DomainError;

/// プロペラ質量のスケーリング指数（基準と同じ形状比を仮定）
const MASS_EXPONENT: f64 = 3.0;

/// ある運転点（ホバリング/離陸）でのプロペラの状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropellerOperatingPoint {
    pub thrust: f64,        // 推力 (N)
    pub speed: f64,         // 回転数 (Hz)
    pub angular_speed: f64, // 角速度 (rad/s)
    pub power: f64,         // 機械出力 (W)
    pub torque: f64,        // トルク (N·m)
}

/// プロペラのサイジング結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropellerSizing {
    pub thrust_coefficient: f64, // Ct (-)
    pub power_coefficient: f64,  // Cp (-)
    pub diameter: f64,           // 直径 (m)
    pub mass: f64,               // 1枚あたり質量 (kg)
    pub hover: PropellerOperatingPoint,
    pub takeoff: PropellerOperatingPoint,
}

/// 基準プロペラからの質量スケーリング M = M_ref·(D/D_ref)³
pub fn propeller_mass(reference: &PropellerReference, diameter: f64) -> Result<f64, DomainError> {
    let ratio = checked::div("propeller.diameter_ratio", diameter, reference.diameter)?;
    Ok(reference.mass * checked::powf("propeller.mass", ratio, MASS_EXPONENT)?)
}

/// 直径を固定したまま推力則 T = Ct·ρ·n²·D⁴ を解いて運転点を求める
///
/// # 引数
/// - `ct`, `cp`: 推力係数・動力係数
/// - `air_density`: 大気密度 (kg/m³)
/// - `diameter`: 直径 (m)
/// - `thrust`: 要求推力 (N)
///
/// # 戻り値
/// - 運転点（回転数・出力・トルク）
pub fn operating_point(
    ct: f64,
    cp: f64,
    air_density: f64,
    diameter: f64,
    thrust: f64,
) -> Result<PropellerOperatingPoint, DomainError> {
    let speed = checked::sqrt(
        "propeller.speed",
        checked::div("propeller.speed", thrust, ct * air_density * diameter.powi(4))?,
    )?;
    at_speed(ct, cp, air_density, diameter, speed)
}

/// 回転数 n から推力・出力 P = Cp·ρ·n³·D⁵・トルク P/ω を求める
fn at_speed(
    ct: f64,
    cp: f64,
    air_density: f64,
    diameter: f64,
    speed: f64,
) -> Result<PropellerOperatingPoint, DomainError> {
    let angular_speed = 2.0 * PI * speed;
    let thrust = ct * air_density * speed.powi(2) * diameter.powi(4);
    let power = checked::finite(
        "propeller.power",
        cp * air_density * speed.powi(3) * diameter.powi(5),
    )?;
    let torque = checked::div("propeller.torque", power, angular_speed)?;
    Ok(PropellerOperatingPoint {
        thrust,
        speed,
        angular_speed,
        power,
        torque,
    })
}

/// プロペラのサイジング
///
/// 離陸推力を n·D の上限（を `k_nd` で割った値）で出せる直径を決め、
/// その直径でホバリング運転点を求める。
///
/// # 引数
/// - `reference`: 基準プロペラと空力係数モデル
/// - `air_density`: 大気密度 (kg/m³)
/// - `beta`: ピッチ/直径比
/// - `k_nd`: 回転数の減速係数
/// - `thrust_hover`, `thrust_takeoff`: プロペラ1枚あたりの推力 (N)
pub fn size_propeller(
    reference: &PropellerReference,
    air_density: f64,
    beta: f64,
    k_nd: f64,
    thrust_hover: f64,
    thrust_takeoff: f64,
) -> Result<PropellerSizing, DomainError> {
    let ct = reference.thrust_coefficient(beta);
    let cp = reference.power_coefficient(beta);

    let nd = checked::div("propeller.nd", reference.nd_max, k_nd)?;
    let diameter = checked::sqrt(
        "propeller.diameter",
        checked::div("propeller.diameter", thrust_takeoff, ct * air_density * nd * nd)?,
    )?;
    let speed_takeoff = checked::div("propeller.speed_takeoff", nd, diameter)?;
    let takeoff = at_speed(ct, cp, air_density, diameter, speed_takeoff)?;
    let hover = operating_point(ct, cp, air_density, diameter, thrust_hover)?;

    Ok(PropellerSizing {
        thrust_coefficient: ct,
        power_coefficient: cp,
        diameter,
        mass: propeller_mass(reference, diameter)?,
        hover,
        takeoff,
    })
}
