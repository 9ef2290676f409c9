//! # Configuration Loader / 配置加载器
//!
//! Reads the TOML file and maps it to [`CoordinatorConfig`]. Pure data
//! loading: no validation and no defaults, those belong to
//! `np_app::CoordinatorPolicy`.
//! 仅纯数据加载，不做验证，不计算默认值。

use std::path::Path;

use anyhow::Context;
use np_core::CoordinatorConfig;

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// Missing sections or keys result in empty values.
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: impl AsRef<Path>) -> anyhow::Result<CoordinatorConfig> {
    let config_path = config_path.as_ref();
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    CoordinatorConfig::from_toml(&toml_value)
}
