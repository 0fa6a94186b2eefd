//! YAML 配置文件加载

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::Config;

pub const CONFIG_PATH_ENV: &str = "COZE_PROXY_CONFIG";
const CONFIG_DIR_NAME: &str = "coze-proxy";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析 YAML 配置失败: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("环境变量 {key} 的值无效: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

/// 默认配置文件路径：`<config_dir>/coze-proxy/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// 确定要加载的配置文件
///
/// 显式指定的路径（`COZE_PROXY_CONFIG`）总是返回，即使文件不存在，
/// 以便加载时报错；默认路径只有存在时才返回。
pub fn resolve_config_path<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(explicit) = lookup(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(explicit));
    }
    default_config_path().filter(|p| p.exists())
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let mut config: Config = serde_yaml::from_str(content)?;
    config.normalize();
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content)?;
    tracing::info!("[CONFIG] 已加载配置文件: {:?}", path);
    Ok(config)
}
