//! # Pure Data Module / 纯数据模块
//!
//! Configuration DTOs mapped straight from TOML.
//!
//! This module contains data only: no validation, no default value
//! calculation. Missing keys become empty facts (empty string, `0`,
//! `None`); `np-app` turns them into a policy.
//! 此模块只包含数据结构定义，禁止验证逻辑与默认值计算。

use std::path::PathBuf;

/// Coordinator configuration DTO (pure data, no logic)
/// 协调器配置 DTO（纯数据，无逻辑）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Credential-store account holding the notes passphrase (may be empty)
    pub passphrase_account: String,

    /// Raw disable-warning policy, `"always"` or `"never"` (may be empty)
    pub disable_warning: String,

    /// Verification debounce delay in milliseconds, `0` when absent
    pub verification_debounce_ms: u64,

    /// Verification call timeout in seconds, `0` when absent
    pub verification_timeout_secs: u64,

    /// Preferences JSON path (path info only, no existence check)
    /// 偏好设置 JSON 路径（仅路径信息，不检查文件是否存在）
    pub preferences_path: PathBuf,

    /// Raw credential backend, `"keyring"` or `"file"` (may be empty)
    pub credential_backend: String,

    /// Directory for the file credential backend (may be empty)
    pub credential_dir: PathBuf,
}

impl CoordinatorConfig {
    /// Create CoordinatorConfig from TOML value
    /// 从 TOML 值创建 CoordinatorConfig
    ///
    /// Must not contain validation or default value logic.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let str_at = |section: &str, key: &str| -> String {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };
        let u64_at = |section: &str, key: &str| -> u64 {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_integer())
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(0)
        };

        Ok(Self {
            passphrase_account: str_at("encryption", "passphrase_account"),
            disable_warning: str_at("encryption", "disable_warning"),
            verification_debounce_ms: u64_at("verification", "debounce_ms"),
            verification_timeout_secs: u64_at("verification", "timeout_secs"),
            preferences_path: PathBuf::from(str_at("storage", "preferences_path")),
            credential_backend: str_at("storage", "credential_backend"),
            credential_dir: PathBuf::from(str_at("storage", "credential_dir")),
        })
    }

    /// Create empty CoordinatorConfig (all empty values)
    /// 创建空的 CoordinatorConfig
    pub fn empty() -> Self {
        Self {
            passphrase_account: String::new(),
            disable_warning: String::new(),
            verification_debounce_ms: 0,
            verification_timeout_secs: 0,
            preferences_path: PathBuf::new(),
            credential_backend: String::new(),
            credential_dir: PathBuf::new(),
        }
    }
}
