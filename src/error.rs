//! 代理错误类型
//!
//! 所有错误在处理器顶层统一转换为 `{"errorMessage": "..."}` JSON 响应。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::coze::ErrorBody;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// 请求中没有名为 file 的文件字段
    #[error("未找到上传的文件")]
    MissingFile,

    #[error("上传的文件为空")]
    EmptyFile,

    /// multipart 数据无法解析
    #[error("解析上传数据失败: {0}")]
    InvalidMultipart(String),

    #[error("文件大小超过限制: 最大 {limit} 字节 ({} MB)", .limit / (1024 * 1024))]
    FileTooLarge { limit: u64 },

    /// 环境变量中缺少 Coze 凭证
    #[error("服务器未配置Coze凭证 (缺少配置 {missing})，请在部署环境中设置环境变量 COZE_API_KEY 和 COZE_BOT_ID")]
    MissingCredentials { missing: &'static str },

    /// 上游返回非 2xx 状态码
    #[error("Coze API 返回错误: {body}")]
    Upstream { status: u16, body: String },

    #[error("Coze API未返回有效内容: {0}")]
    NoValidContent(String),

    #[error("请求 Coze API 失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("读取上传文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化请求体失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingFile | ProxyError::EmptyFile | ProxyError::InvalidMultipart(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::MissingCredentials { .. }
            | ProxyError::Upstream { .. }
            | ProxyError::NoValidContent(_)
            | ProxyError::Transport(_)
            | ProxyError::Io(_)
            | ProxyError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            tracing::warn!("[PROXY] 请求被拒绝 ({}): {}", status.as_u16(), self);
        } else {
            tracing::error!("[PROXY] 请求处理失败 ({}): {}", status.as_u16(), self);
        }

        (
            status,
            Json(ErrorBody {
                error_message: self.to_string(),
            }),
        )
            .into_response()
    }
}
