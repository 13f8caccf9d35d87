// src/config/load_parameters.rs

use std::fs::File;
use std::path::Path;

use log::info;
use serde::de::DeserializeOwned;
use serde_yaml::from_reader;

use crate::config::error::ConfigurationError;
use crate::config::mission::MissionConfig;
use crate::config::optimizer::OptimizerConfig;
use crate::config::parameters::ReferenceParameters;

/// YAML ファイルを読み込む
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigurationError> {
    let file = File::open(path).map_err(|source| ConfigurationError::Io {
        path: path.display().to_string(),
        source,
    })?;
    from_reader(file).map_err(|source| ConfigurationError::Yaml {
        path: path.display().to_string(),
        source,
    })
}

/// ファイルが指定されていなければ既定値を使う
fn load_or_default<T: DeserializeOwned + Default>(
    path: Option<&Path>,
    what: &str,
) -> Result<T, ConfigurationError> {
    match path {
        Some(p) => {
            info!("{} を {} から読み込みます", what, p.display());
            load_yaml(p)
        }
        None => {
            info!("{} は既定値を使います", what);
            Ok(T::default())
        }
    }
}

/// ミッション仕様の読み込み
pub fn load_mission(path: Option<&Path>) -> Result<MissionConfig, ConfigurationError> {
    let config: MissionConfig = load_or_default(path, "ミッション仕様")?;
    config.validate()?;
    Ok(config)
}

/// 基準パラメータの読み込み
pub fn load_reference_parameters(path: Option<&Path>) -> Result<ReferenceParameters, ConfigurationError> {
    let params: ReferenceParameters = load_or_default(path, "基準パラメータ")?;
    params.validate()?;
    Ok(params)
}

/// 最適化設定の読み込み
pub fn load_optimizer_config(path: Option<&Path>) -> Result<OptimizerConfig, ConfigurationError> {
    let config: OptimizerConfig = load_or_default(path, "最適化設定")?;
    config.validate()?;
    Ok(config)
}
