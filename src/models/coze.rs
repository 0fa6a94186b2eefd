//! Coze Chat API v2 数据模型
//!
//! 上游接口要求把文件信息以 JSON 字符串的形式放在 `query` 字段里，
//! 而不是嵌套对象，因此 `ChatRequestPayload::new` 会先序列化 `QueryPayload`。
//!
//! 对调用方返回的结构使用 camelCase 字段：`finalContent` / `errorMessage`。
use serde::{Deserialize, Serialize};

/// 消息类型：机器人回答
pub const ANSWER_MESSAGE_TYPE: &str = "answer";

/// 用户 ID 前缀，后接毫秒时间戳
pub const USER_ID_PREFIX: &str = "server_user_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_name: String,
    /// `data:<mime>;base64,<内容>`
    pub file_content_base64: String,
    pub file_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPayload {
    pub file_info: FileInfo,
}

/// 发送给 Coze 的请求体，字段顺序即线上顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequestPayload {
    pub bot_id: String,
    pub user: String,
    pub query: String,
    pub stream: bool,
}

impl ChatRequestPayload {
    pub fn new(
        bot_id: impl Into<String>,
        file_info: FileInfo,
        stream: bool,
        now_millis: i64,
    ) -> Result<Self, serde_json::Error> {
        let query = serde_json::to_string(&QueryPayload { file_info })?;
        Ok(Self {
            bot_id: bot_id.into(),
            user: format!("{USER_ID_PREFIX}{now_millis}"),
            query,
            stream,
        })
    }

    /// 解码 `query` 字段中的文件信息
    #[cfg(test)]
    pub fn decode_query(&self) -> Result<QueryPayload, serde_json::Error> {
        serde_json::from_str(&self.query)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CozeMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "type", default)]
    pub message_type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl CozeMessage {
    pub fn is_answer(&self) -> bool {
        self.message_type == ANSWER_MESSAGE_TYPE
    }
}

/// 非流式响应体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub messages: Vec<CozeMessage>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ChatResponse {
    /// 第一条 answer 消息（内容可能为空，由调用方判断）
    pub fn first_answer(&self) -> Option<&CozeMessage> {
        self.messages.iter().find(|m| m.is_answer())
    }
}

/// 流式响应中一行 `data:` 的内容
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamEvent {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub message: Option<CozeMessage>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub is_finish: Option<bool>,
}

impl StreamEvent {
    pub fn answer_fragment(&self) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|m| m.is_answer())
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySuccess {
    pub final_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_message: String,
}
