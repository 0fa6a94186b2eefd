//! Coze Provider - Coze Chat API v2
//!
//! 支持非流式（一次性 JSON）和流式（text/event-stream）两种调用方式，
//! 均只返回 answer 文本。不做重试。

use futures::StreamExt;
use reqwest::{header, Client};

use crate::config::{CozeConfig, CozeCredentials};
use crate::error::ProxyError;
use crate::models::coze::{ChatRequestPayload, ChatResponse};
use crate::stream::AnswerAggregator;

const EVENT_STREAM: &str = "text/event-stream";

/// 一次调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub content: String,
    pub conversation_id: Option<String>,
}

/// 构建上游 HTTP 客户端
pub fn build_client(config: &CozeConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(std::time::Duration::from_secs(secs));
    }
    builder.build()
}

pub struct CozeProvider {
    client: Client,
    api_url: String,
    credentials: CozeCredentials,
}

impl CozeProvider {
    pub fn new(client: Client, api_url: impl Into<String>, credentials: CozeCredentials) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            credentials,
        }
    }

    /// 从配置解析凭证并创建 Provider，凭证缺失时返回错误
    pub fn from_config(client: Client, config: &CozeConfig) -> Result<Self, ProxyError> {
        let credentials = config.credentials()?;
        Ok(Self::new(client, config.api_url.clone(), credentials))
    }

    pub fn bot_id(&self) -> &str {
        &self.credentials.bot_id
    }

    /// 按 payload.stream 选择调用方式
    pub async fn chat(&self, payload: &ChatRequestPayload) -> Result<ChatOutcome, ProxyError> {
        if payload.stream {
            self.chat_streaming(payload).await
        } else {
            self.chat_complete(payload).await
        }
    }

    async fn send(&self, payload: &ChatRequestPayload) -> Result<reqwest::Response, ProxyError> {
        let mut request = self
            .client
            .post(&self.api_url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.credentials.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload);
        if payload.stream {
            request = request.header(header::ACCEPT, EVENT_STREAM);
        }

        tracing::info!(
            "[COZE] 请求 {} (bot_id={}, stream={})",
            self.api_url,
            payload.bot_id,
            payload.stream
        );

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("[COZE] 上游返回错误: {} - {}", status, body);
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    /// 非流式：取第一条 answer 消息
    async fn chat_complete(&self, payload: &ChatRequestPayload) -> Result<ChatOutcome, ProxyError> {
        let body = self.send(payload).await?.text().await?;

        let result: ChatResponse = match serde_json::from_str(&body) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("[COZE] 响应不是有效 JSON: {}", e);
                return Err(ProxyError::NoValidContent(body));
            }
        };

        match result.first_answer() {
            Some(message) if !message.content.is_empty() => Ok(ChatOutcome {
                content: message.content.clone(),
                conversation_id: result.conversation_id.clone(),
            }),
            _ => Err(ProxyError::NoValidContent(body)),
        }
    }

    /// 流式：逐块读取并聚合 answer 片段
    async fn chat_streaming(
        &self,
        payload: &ChatRequestPayload,
    ) -> Result<ChatOutcome, ProxyError> {
        let resp = self.send(payload).await?;
        let mut stream = resp.bytes_stream();
        let mut aggregator = AnswerAggregator::new();
        let mut chunks = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            chunks += 1;
            aggregator.push_chunk(&chunk);
        }

        tracing::debug!(
            "[COZE] 流结束: chunks={}, answer_len={}",
            chunks,
            aggregator.answer().len()
        );

        let answer = aggregator.finish().ok_or_else(|| {
            ProxyError::NoValidContent("流式响应中没有 answer 消息".to_string())
        })?;

        if let Some(conversation_id) = &answer.conversation_id {
            tracing::debug!("[COZE] conversation_id={}", conversation_id);
        }

        Ok(ChatOutcome {
            content: answer.content,
            conversation_id: answer.conversation_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::coze::FileInfo;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CHAT_PATH: &str = "/open_api/v2/chat";

    fn provider(server: &MockServer) -> CozeProvider {
        CozeProvider::new(
            Client::new(),
            format!("{}{}", server.uri(), CHAT_PATH),
            CozeCredentials {
                api_key: "pat_test".into(),
                bot_id: "bot_test".into(),
            },
        )
    }

    fn payload(stream: bool) -> ChatRequestPayload {
        ChatRequestPayload::new(
            "bot_test",
            FileInfo {
                file_name: "a.txt".into(),
                file_content_base64: "data:text/plain;base64,aGk=".into(),
                file_type: "text/plain".into(),
            },
            stream,
            1,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_chat_complete_returns_first_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .and(header("authorization", "Bearer pat_test"))
            .and(body_partial_json(serde_json::json!({"bot_id": "bot_test", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "conversation_id": "c-1",
                "messages": [
                    {"type": "verbose", "content": "x"},
                    {"type": "answer", "content": "结果"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = provider(&server).chat(&payload(false)).await.unwrap();
        assert_eq!(outcome.content, "结果");
        assert_eq!(outcome.conversation_id.as_deref(), Some("c-1"));
    }

    #[tokio::test]
    async fn test_chat_complete_empty_answer_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"type": "answer", "content": ""}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server).chat(&payload(false)).await.unwrap_err();
        assert!(matches!(err, ProxyError::NoValidContent(_)));
    }

    #[tokio::test]
    async fn test_upstream_error_embeds_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let err = provider(&server).chat(&payload(true)).await.unwrap_err();
        match err {
            ProxyError::Upstream { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "token expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_chat_streaming_aggregates_answer() {
        let server = MockServer::start().await;
        let body = concat!(
            "event:message\n",
            "data: {\"event\":\"message\",\"message\":{\"type\":\"answer\",\"content\":\"Hel\"},\"conversation_id\":\"c-7\"}\n",
            "data: {not valid json}\n",
            "data: {\"event\":\"message\",\"message\":{\"type\":\"answer\",\"content\":\"lo\"}}\n",
            "data: {\"event\":\"done\"}\n",
        );
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .and(header("accept", "text/event-stream"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = provider(&server).chat(&payload(true)).await.unwrap();
        assert_eq!(outcome.content, "Hello");
        assert_eq!(outcome.conversation_id.as_deref(), Some("c-7"));
    }

    #[tokio::test]
    async fn test_chat_streaming_without_answer_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("data: {\"event\":\"done\"}\n", "text/event-stream"),
            )
            .mount(&server)
            .await;

        let err = provider(&server).chat(&payload(true)).await.unwrap_err();
        assert!(matches!(err, ProxyError::NoValidContent(_)));
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let config = CozeConfig::default();
        let err = CozeProvider::from_config(Client::new(), &config)
            .err()
            .unwrap();
        assert!(matches!(err, ProxyError::MissingCredentials { .. }));
    }
}
