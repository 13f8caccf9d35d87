// src/models/frame.rs

use std::f64::consts::PI;

use crate::config::mission::Architecture;
use crate::config::parameters::FrameReference;
use crate::math::checked;
use crate::math::error::DomainError;

/// フレームのサイジング結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSizing {
    pub separation_angle: f64, // 隣り合うアームのなす角 (rad)
    pub arm_length: f64,       // アーム長 (m)
    pub outer_diameter: f64,   // アーム外径 (m)
    pub inner_diameter: f64,   // アーム内径 (m)
    pub wall_thickness: f64,   // 肉厚 (m)
    pub arm_mass: f64,         // 全アームの質量 (kg)
    pub mass: f64,             // フレーム質量 (kg)
}

/// フレームのサイジング
///
/// 隣のプロペラと干渉しないアーム長を決め、アーム根元の曲げ応力が
/// 許容応力に等しくなる中空管の外径を求める。
///
/// # 引数
/// - `reference`: 材料とフレーム/アーム質量比
/// - `architecture`: アーム数とアームあたりのプロペラ数
/// - `propeller_diameter`: プロペラ直径 (m)
/// - `thrust_max`: プロペラ1枚あたりの最大推力 (N)
/// - `k_d`: 内径/外径比
pub fn size_frame(
    reference: &FrameReference,
    architecture: &Architecture,
    propeller_diameter: f64,
    thrust_max: f64,
    k_d: f64,
) -> Result<FrameSizing, DomainError> {
    let arms = f64::from(architecture.arms);
    let separation_angle = checked::div("frame.separation_angle", 2.0 * PI, arms)?;
    let arm_length = checked::div(
        "frame.arm_length",
        propeller_diameter,
        2.0 * (separation_angle / 2.0).sin(),
    )?;

    let bending_moment = thrust_max * f64::from(architecture.propellers_per_arm) * arm_length;
    let section = checked::div(
        "frame.outer_diameter",
        32.0 * bending_moment,
        PI * reference.max_stress * (1.0 - k_d.powi(4)),
    )?;
    let outer_diameter = checked::powf("frame.outer_diameter", section, 1.0 / 3.0)?;
    let inner_diameter = k_d * outer_diameter;

    let arm_mass = arms * PI / 4.0
        * (outer_diameter.powi(2) - inner_diameter.powi(2))
        * arm_length
        * reference.density;

    Ok(FrameSizing {
        separation_angle,
        arm_length,
        outer_diameter,
        inner_diameter,
        wall_thickness: (outer_diameter - inner_diameter) / 2.0,
        arm_mass,
        mass: arm_mass * reference.frame_to_arm_mass_ratio,
    })
}
