//! 配置管理模块
//!
//! 配置来源按优先级从低到高：
//! - 内置默认值
//! - YAML 配置文件（`COZE_PROXY_CONFIG` 或 `<config_dir>/coze-proxy/config.yaml`）
//! - 环境变量（`COZE_API_KEY`、`COZE_BOT_ID` 等）

mod env;
mod types;
mod yaml;

pub use env::{
    ENV_API_KEY, ENV_API_URL, ENV_BOT_ID, ENV_CORS, ENV_HOST, ENV_LOG_JSON, ENV_MAX_FILE_SIZE,
    ENV_PORT, ENV_REQUEST_TIMEOUT, ENV_STREAM,
};
pub use types::{
    Config, CozeConfig, CozeCredentials, LoggingConfig, ServerConfig, UploadConfig,
    DEFAULT_COZE_API_URL, DEFAULT_HOST, DEFAULT_MAX_FILE_SIZE, DEFAULT_PORT,
    DEFAULT_UPLOAD_FIELD,
};
pub use yaml::{
    default_config_path, load_config, parse_config, resolve_config_path, ConfigError,
    CONFIG_PATH_ENV,
};

/// 加载启动配置：配置文件（如有）+ 进程环境变量
pub fn load_startup_config() -> Result<Config, ConfigError> {
    let mut config = match resolve_config_path(|key| std::env::var(key).ok()) {
        Some(path) => load_config(&path)?,
        None => Config::default(),
    };
    config.apply_process_env()?;
    Ok(config)
}

#[cfg(test)]
mod tests;
