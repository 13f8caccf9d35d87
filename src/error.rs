// src/error.rs

use thiserror::Error;

use crate::config::error::ConfigurationError;
use crate::math::error::DomainError;
use crate::optimization::OptimizationError;

/// クレート全体のエラー
#[derive(Error, Debug)]
pub enum SizingError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("最適点の評価に失敗しました: {0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Optimization(#[from] OptimizationError),

    #[error("レポートの出力に失敗しました: {0}")]
    Io(#[from] std::io::Error),
}
