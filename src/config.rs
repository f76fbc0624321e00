//! # 配置模块
//!
//! 账本配置：从JSON文件读取，再用环境变量覆盖。

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 提交时如何处理不在集合中的花费哈希
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendPolicy {
    /// 任何花费哈希缺失或重复时拒绝整次提交
    #[default]
    Strict,
    /// 忽略缺失的花费哈希，提交永不失败
    Tolerant,
}

impl std::str::FromStr for SpendPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SpendPolicy::Strict),
            "tolerant" => Ok(SpendPolicy::Tolerant),
            _ => Err(ConfigError::InvalidEnv {
                var: ENV_SPEND_POLICY,
                value: s.to_string(),
            }),
        }
    }
}

pub const ENV_SPEND_POLICY: &str = "UHS_SPEND_POLICY";
pub const ENV_DISPLAY_COMMITS: &str = "UHS_DISPLAY_COMMITS";
pub const ENV_SNAPSHOT_PATH: &str = "UHS_SNAPSHOT_PATH";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// 账本配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// 提交策略
    pub spend_policy: SpendPolicy,
    /// 每次提交时是否以info级别打印紧凑交易
    pub display_commits: bool,
    /// 账本服务请求通道容量
    pub channel_capacity: usize,
    /// UHS快照路径
    pub snapshot_path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            spend_policy: SpendPolicy::Strict,
            display_commits: false,
            channel_capacity: 100,
            snapshot_path: None,
        }
    }
}

impl LedgerConfig {
    /// 从JSON文件读取配置，缺失的字段取默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用进程环境变量覆盖配置
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| env::var(name).ok())
    }

    /// 用给定的变量查找函数覆盖配置
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_SPEND_POLICY) {
            self.spend_policy = value.parse()?;
        }
        if let Some(value) = lookup(ENV_DISPLAY_COMMITS) {
            self.display_commits = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: ENV_DISPLAY_COMMITS,
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup(ENV_SNAPSHOT_PATH) {
            self.snapshot_path = Some(PathBuf::from(value));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.spend_policy, SpendPolicy::Strict);
        assert!(!config.display_commits);
        assert_eq!(config.channel_capacity, 100);
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LedgerConfig = serde_json::from_str(r#"{"spend_policy":"tolerant"}"#).unwrap();
        assert_eq!(config.spend_policy, SpendPolicy::Tolerant);
        assert_eq!(config.channel_capacity, 100);
    }

    #[test]
    fn test_from_file() {
        let path = env::temp_dir().join(format!("uhs_config_{}.json", std::process::id()));
        fs::write(&path, r#"{"display_commits":true,"snapshot_path":"uhs.json"}"#).unwrap();
        let config = LedgerConfig::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(config.display_commits);
        assert_eq!(config.snapshot_path, Some(PathBuf::from("uhs.json")));

        assert!(matches!(
            LedgerConfig::from_file(Path::new("/nonexistent/uhs.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = LedgerConfig::default()
            .apply_vars(vars(&[
                (ENV_SPEND_POLICY, "Tolerant"),
                (ENV_DISPLAY_COMMITS, "1"),
                (ENV_SNAPSHOT_PATH, "/tmp/uhs.json"),
            ]))
            .unwrap();
        assert_eq!(config.spend_policy, SpendPolicy::Tolerant);
        assert!(config.display_commits);
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/uhs.json")));
    }

    #[test]
    fn test_invalid_env_value() {
        let err = LedgerConfig::default()
            .apply_vars(vars(&[(ENV_SPEND_POLICY, "lenient")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_SPEND_POLICY, .. }));

        let err = LedgerConfig::default()
            .apply_vars(vars(&[(ENV_DISPLAY_COMMITS, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_DISPLAY_COMMITS, .. }));
    }
}
