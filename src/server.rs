//! HTTP API 服务器
use crate::config::Config;
use crate::error::ProxyError;
use crate::models::coze::{ChatRequestPayload, ErrorBody, ProxySuccess};
use crate::providers::coze::{build_client, CozeProvider};
use crate::upload::receive_upload;
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::Instrument;

/// multipart 边界和表单头的额外空间
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(mut config: Config) -> Result<Self, reqwest::Error> {
        config.normalize();
        let client = build_client(&config.coze)?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = match state.config.upload.max_file_size {
        Some(max) => DefaultBodyLimit::max(
            usize::try_from(max)
                .unwrap_or(usize::MAX)
                .saturating_add(MULTIPART_OVERHEAD),
        ),
        None => DefaultBodyLimit::disable(),
    };
    let proxy_route = post(proxy_upload).fallback(method_not_allowed);

    let mut router = Router::new()
        .route("/", proxy_route.clone())
        .route("/api/proxy", proxy_route)
        .route("/health", get(health))
        .layer(body_limit);

    // 浏览器页面直接上传时需要跨域
    if state.config.server.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

/// 启动服务器，直到 shutdown 完成
pub async fn run_server<F>(config: Config, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    let addr = listener.local_addr()?;
    let state = AppState::new(config)?;

    tracing::info!(
        "[SERVER] 流式模式: {}, 上传限制: {:?}, 凭证已配置: {}",
        state.config.coze.stream,
        state.config.upload.max_file_size,
        state.config.coze.has_credentials()
    );
    if !state.config.coze.has_credentials() {
        tracing::warn!("[SERVER] 未配置 COZE_API_KEY / COZE_BOT_ID，所有上传请求将返回 500");
    }

    let app = build_router(state);

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error_message: "Method Not Allowed".to_string(),
        }),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    streaming: bool,
    credentials_configured: bool,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        streaming: state.config.coze.stream,
        credentials_configured: state.config.coze.has_credentials(),
    })
}

async fn proxy_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("proxy", %request_id);

    match handle_upload(&state, multipart).instrument(span).await {
        Ok(content) => (
            StatusCode::OK,
            Json(ProxySuccess {
                final_content: content,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, ProxyError> {
    let mut multipart = multipart.map_err(|e| ProxyError::InvalidMultipart(e.body_text()))?;

    let upload = &state.config.upload;
    let file = receive_upload(&mut multipart, &upload.field_name, upload.max_file_size).await?;

    let provider = CozeProvider::from_config(state.client.clone(), &state.config.coze)?;

    let file_info = file.to_file_info().await?;
    let payload = ChatRequestPayload::new(
        provider.bot_id(),
        file_info,
        state.config.coze.stream,
        Utc::now().timestamp_millis(),
    )?;

    let outcome = provider.chat(&payload).await?;
    tracing::info!(
        "[PROXY] 处理完成: file={}, answer_len={}",
        file.original_filename,
        outcome.content.len()
    );

    Ok(outcome.content)
}
