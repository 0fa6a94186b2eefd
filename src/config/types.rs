//! 配置类型定义

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_COZE_API_URL: &str = "https://api.coze.cn/open_api/v2/chat";
pub const DEFAULT_UPLOAD_FIELD: &str = "file";
/// 10 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// 主配置结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub coze: CozeConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// 统一 0 值语义：上传大小 0 表示不限制，超时 0 表示不设超时
    pub fn normalize(&mut self) {
        if self.upload.max_file_size == Some(0) {
            self.upload.max_file_size = None;
        }
        if self.coze.request_timeout_secs == Some(0) {
            self.coze.request_timeout_secs = None;
        }
    }
}

/// 服务器监听配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许浏览器跨域直接上传
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors: true,
        }
    }
}

/// Coze 上游配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CozeConfig {
    pub api_key: Option<String>,
    pub bot_id: Option<String>,
    pub api_url: String,
    /// true 时以 text/event-stream 方式请求并增量聚合
    pub stream: bool,
    /// 上游请求超时（秒），None 表示不设置
    pub request_timeout_secs: Option<u64>,
}

impl Default for CozeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            bot_id: None,
            api_url: DEFAULT_COZE_API_URL.to_string(),
            stream: true,
            request_timeout_secs: None,
        }
    }
}

/// 已解析的 Coze 凭证
#[derive(Clone, PartialEq, Eq)]
pub struct CozeCredentials {
    pub api_key: String,
    pub bot_id: String,
}

impl std::fmt::Debug for CozeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CozeCredentials")
            .field("api_key", &"***")
            .field("bot_id", &self.bot_id)
            .finish()
    }
}

impl CozeConfig {
    /// 解析凭证，空字符串视为未配置
    pub fn credentials(&self) -> Result<CozeCredentials, ProxyError> {
        let api_key = non_empty(&self.api_key).ok_or(ProxyError::MissingCredentials {
            missing: "COZE_API_KEY",
        })?;
        let bot_id = non_empty(&self.bot_id).ok_or(ProxyError::MissingCredentials {
            missing: "COZE_BOT_ID",
        })?;
        Ok(CozeCredentials {
            api_key: api_key.to_string(),
            bot_id: bot_id.to_string(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials().is_ok()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// 上传配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// multipart 中文件字段名
    pub field_name: String,
    /// 最大文件大小（字节），None 表示不限制
    pub max_file_size: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            field_name: DEFAULT_UPLOAD_FIELD.to_string(),
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// RUST_LOG 未设置时使用的过滤级别
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
