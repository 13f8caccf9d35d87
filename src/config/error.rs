// src/config/error.rs

use thiserror::Error;

/// 設定（ミッション仕様・基準パラメータ・最適化設定）の不備
///
/// 最適化を始める前に検出され、処理全体を中断する。
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("{field} は正の有限値である必要があります（値: {value}）")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} は [{min}, {max}] の範囲である必要があります（値: {value}）")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("設計変数 {index} の範囲が不正です（下限 {lower} > 上限 {upper}）")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },

    #[error("機体構成が不正です: {0}")]
    Architecture(String),

    #[error("{field} が設計変数の範囲内で正になりません（beta = {beta}, 値: {value}）")]
    Coefficient {
        field: &'static str,
        beta: f64,
        value: f64,
    },

    #[error("設定ファイル {path} を開けません: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("設定ファイル {path} の解析に失敗しました: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// 正の有限値であることを確認する
pub fn ensure_positive(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::NotPositive { field, value })
    }
}

/// 閉区間 [min, max] に入っていることを確認する
pub fn ensure_in_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigurationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
