//! 环境变量覆盖
//!
//! 环境变量优先于配置文件。凭证缺失不会报错，只在请求时返回 500。

use super::types::Config;
use super::yaml::ConfigError;

pub const ENV_API_KEY: &str = "COZE_API_KEY";
pub const ENV_BOT_ID: &str = "COZE_BOT_ID";
pub const ENV_API_URL: &str = "COZE_API_URL";
pub const ENV_STREAM: &str = "COZE_STREAM";
pub const ENV_REQUEST_TIMEOUT: &str = "COZE_REQUEST_TIMEOUT_SECS";
pub const ENV_HOST: &str = "COZE_PROXY_HOST";
pub const ENV_PORT: &str = "COZE_PROXY_PORT";
pub const ENV_CORS: &str = "COZE_PROXY_CORS";
pub const ENV_MAX_FILE_SIZE: &str = "COZE_PROXY_MAX_FILE_SIZE";
pub const ENV_LOG_JSON: &str = "COZE_PROXY_LOG_JSON";

impl Config {
    /// 从进程环境变量加载覆盖项
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_API_KEY) {
            self.coze.api_key = Some(v);
        }
        if let Some(v) = lookup(ENV_BOT_ID) {
            self.coze.bot_id = Some(v);
        }
        if let Some(v) = lookup(ENV_API_URL) {
            self.coze.api_url = v;
        }
        if let Some(v) = lookup(ENV_STREAM) {
            self.coze.stream = parse_bool(ENV_STREAM, &v)?;
        }
        if let Some(v) = lookup(ENV_REQUEST_TIMEOUT) {
            let secs = parse_number(ENV_REQUEST_TIMEOUT, &v)?;
            self.coze.request_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(v) = lookup(ENV_HOST) {
            self.server.host = v;
        }
        if let Some(v) = lookup(ENV_PORT) {
            self.server.port = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_PORT,
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup(ENV_CORS) {
            self.server.cors = parse_bool(ENV_CORS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_FILE_SIZE) {
            // 0 表示不限制大小
            let size = parse_number(ENV_MAX_FILE_SIZE, &v)?;
            self.upload.max_file_size = (size > 0).then_some(size);
        }
        if let Some(v) = lookup(ENV_LOG_JSON) {
            self.logging.json = parse_bool(ENV_LOG_JSON, &v)?;
        }
        Ok(())
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_string(),
    })
}
