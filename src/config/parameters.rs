// src/config/parameters.rs

use serde::Deserialize;

use crate::config::error::{ensure_in_range, ensure_positive, ConfigurationError};
use crate::sizing::DESIGN_BOUNDS;

/// 1インチ (m)
pub const INCH: f64 = 0.0254;

/// 基準バッテリ（MK-quadro パック）
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BatteryReference {
    pub mass: f64,            // 基準質量 (kg)
    pub energy: f64,          // 基準エネルギー (J)
    pub cell_voltage: f64,    // 1セルあたりの電圧 (V)
    pub usable_fraction: f64, // 使用可能な容量の割合 (-)
}

/// 基準ESC（MK BL-Ctrl 2.0）
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EscReference {
    pub mass: f64,  // 基準質量 (kg)
    pub power: f64, // 定格電力 (W)
}

/// 基準モータ（AXI 5325/16 GOLD LINE）
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MotorReference {
    pub torque_nominal: f64,  // 定格トルク (N·m)
    pub torque_max: f64,      // 最大トルク (N·m)
    pub resistance: f64,      // 巻線抵抗 (Ω)
    pub mass: f64,            // 質量 (kg)
    pub torque_constant: f64, // トルク定数 (N·m/A)
    pub friction_torque: f64, // 無負荷時の摩擦トルク (N·m)
}

/// アーム材料（カーボン管）とフレームの経験則
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FrameReference {
    pub max_stress: f64,              // 許容応力 (Pa)
    pub density: f64,                 // 密度 (kg/m³)
    pub frame_to_arm_mass_ratio: f64, // フレーム質量 / アーム質量 (-)
}

/// 基準プロペラ（APC MR 静特性）
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PropellerReference {
    pub diameter: f64,    // 基準直径 (m)
    pub mass: f64,        // 基準質量 (kg)
    pub nd_max: f64,      // 回転数×直径の上限 (m/s)
    pub ct: [f64; 2],     // Ct = ct[0] + ct[1]·beta
    pub cp: [f64; 2],     // Cp = cp[0] + cp[1]·beta
    pub ct_derating: f64, // Ct の低減係数 (-)
}

/// 電圧と電力の回帰則 U = coefficient · P^exponent
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct VoltageLaw {
    pub coefficient: f64, // (V/W^exponent)
    pub exponent: f64,    // (-)
}

/// 大気と重力
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Environment {
    pub air_density: f64, // 大気密度 (kg/m³)
    pub gravity: f64,     // 重力加速度 (m/s²)
}

/// スケーリング則の基準となる部品パラメータ一式
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ReferenceParameters {
    pub battery: BatteryReference,
    pub esc: EscReference,
    pub motor: MotorReference,
    pub frame: FrameReference,
    pub propeller: PropellerReference,
    pub voltage_law: VoltageLaw,
    pub environment: Environment,
}

impl Default for BatteryReference {
    fn default() -> Self {
        Self {
            mass: 0.329,
            energy: 220.0 * 3600.0 * 0.329, // 220 Wh/kg
            cell_voltage: 3.7,
            usable_fraction: 0.8,
        }
    }
}

impl Default for EscReference {
    fn default() -> Self {
        Self {
            mass: 0.115,
            power: 3000.0,
        }
    }
}

impl Default for MotorReference {
    fn default() -> Self {
        Self {
            torque_nominal: 2.32,
            torque_max: 85.0 / 70.0 * 2.32,
            resistance: 0.03,
            mass: 0.575,
            torque_constant: 0.03,
            friction_torque: 0.03,
        }
    }
}

impl Default for FrameReference {
    fn default() -> Self {
        Self {
            max_stress: 280e6 / 4.0, // 安全率 4
            density: 1700.0,
            frame_to_arm_mass_ratio: 1.5,
        }
    }
}

impl Default for PropellerReference {
    fn default() -> Self {
        Self {
            diameter: 11.0 * INCH,
            mass: 0.53 * 0.0283, // 0.53 oz
            nd_max: 105_000.0 / 60.0 * INCH,
            ct: [4.27e-2, 1.44e-1],
            cp: [-1.48e-3, 9.72e-2],
            ct_derating: 0.9,
        }
    }
}

impl Default for VoltageLaw {
    fn default() -> Self {
        Self {
            coefficient: 1.84,
            exponent: 0.36,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            air_density: 1.18,
            gravity: 9.81,
        }
    }
}

impl PropellerReference {
    /// 推力係数（低減係数込み）
    pub fn thrust_coefficient(&self, beta: f64) -> f64 {
        self.ct_derating * (self.ct[0] + self.ct[1] * beta)
    }

    /// 動力係数
    pub fn power_coefficient(&self, beta: f64) -> f64 {
        self.cp[0] + self.cp[1] * beta
    }
}

impl ReferenceParameters {
    /// 全ての基準値が物理的に意味のある値か確認する
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let b = &self.battery;
        ensure_positive("battery.mass", b.mass)?;
        ensure_positive("battery.energy", b.energy)?;
        ensure_positive("battery.cell_voltage", b.cell_voltage)?;
        ensure_in_range("battery.usable_fraction", b.usable_fraction, f64::MIN_POSITIVE, 1.0)?;

        ensure_positive("esc.mass", self.esc.mass)?;
        ensure_positive("esc.power", self.esc.power)?;

        let m = &self.motor;
        ensure_positive("motor.torque_nominal", m.torque_nominal)?;
        ensure_positive("motor.torque_max", m.torque_max)?;
        ensure_positive("motor.resistance", m.resistance)?;
        ensure_positive("motor.mass", m.mass)?;
        ensure_positive("motor.torque_constant", m.torque_constant)?;
        ensure_positive("motor.friction_torque", m.friction_torque)?;

        let f = &self.frame;
        ensure_positive("frame.max_stress", f.max_stress)?;
        ensure_positive("frame.density", f.density)?;
        ensure_in_range("frame.frame_to_arm_mass_ratio", f.frame_to_arm_mass_ratio, 1.0, f64::MAX)?;

        let p = &self.propeller;
        ensure_positive("propeller.diameter", p.diameter)?;
        ensure_positive("propeller.mass", p.mass)?;
        ensure_positive("propeller.nd_max", p.nd_max)?;
        ensure_in_range("propeller.ct_derating", p.ct_derating, f64::MIN_POSITIVE, 1.0)?;
        // 係数モデルは一次式なので、beta の両端で正なら範囲全体で正
        let (beta_min, beta_max) = DESIGN_BOUNDS[0];
        for beta in [beta_min, beta_max] {
            let ct = p.thrust_coefficient(beta);
            if !(ct > 0.0 && ct.is_finite()) {
                return Err(ConfigurationError::Coefficient {
                    field: "propeller.ct",
                    beta,
                    value: ct,
                });
            }
            let cp = p.power_coefficient(beta);
            if !(cp > 0.0 && cp.is_finite()) {
                return Err(ConfigurationError::Coefficient {
                    field: "propeller.cp",
                    beta,
                    value: cp,
                });
            }
        }

        ensure_positive("voltage_law.coefficient", self.voltage_law.coefficient)?;
        ensure_positive("voltage_law.exponent", self.voltage_law.exponent)?;
        ensure_positive("environment.air_density", self.environment.air_density)?;
        ensure_positive("environment.gravity", self.environment.gravity)?;
        Ok(())
    }
}
