// src/config/mission.rs

use serde::Deserialize;

use crate::config::error::{ensure_positive, ConfigurationError};

/// 目的関数の種類
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveMode {
    /// 総質量の最小化（ホバリング時間は制約）
    MinimizeMass,
    /// ホバリング時間の最大化（最大離陸質量は制約）
    MaximizeHoverTime,
}

/// ミッション仕様（1回の最適化の間は不変）
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MissionSpecification {
    pub payload_mass: f64,         // ペイロード質量 (kg)
    pub takeoff_acceleration: f64, // 離陸加速度 (m/s²)
    pub hover_time: f64,           // 要求ホバリング時間 (min)
    pub max_takeoff_mass: f64,     // 最大離陸質量 (kg)
    pub objective: ObjectiveMode,
}

/// 機体構成（アーム数とアームあたりのプロペラ数）
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Architecture {
    pub arms: u32,
    pub propellers_per_arm: u32,
}

/// mission.yaml の内容
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct MissionConfig {
    pub mission: MissionSpecification,
    pub architecture: Architecture,
}

impl Default for MissionSpecification {
    fn default() -> Self {
        Self {
            payload_mass: 100.0,
            takeoff_acceleration: 0.25 * 9.81,
            hover_time: 25.0,
            max_takeoff_mass: 360.0,
            objective: ObjectiveMode::MinimizeMass,
        }
    }
}

impl Default for Architecture {
    fn default() -> Self {
        Self {
            arms: 4,
            propellers_per_arm: 2,
        }
    }
}

impl MissionSpecification {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ensure_positive("mission.payload_mass", self.payload_mass)?;
        ensure_positive("mission.takeoff_acceleration", self.takeoff_acceleration)?;
        ensure_positive("mission.hover_time", self.hover_time)?;
        ensure_positive("mission.max_takeoff_mass", self.max_takeoff_mass)?;
        Ok(())
    }
}

impl Architecture {
    /// プロペラ総数
    pub fn propeller_count(&self) -> u32 {
        self.arms * self.propellers_per_arm
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.arms < 2 {
            return Err(ConfigurationError::Architecture(format!(
                "アーム数は2以上が必要です（{}）",
                self.arms
            )));
        }
        if self.propellers_per_arm == 0 {
            return Err(ConfigurationError::Architecture(
                "アームあたりのプロペラ数が0です".to_string(),
            ));
        }
        Ok(())
    }
}

impl MissionConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.mission.validate()?;
        self.architecture.validate()
    }
}
