//! Coze 文件上传代理
//!
//! 接收 multipart 文件上传，编码为 base64 data URI 后转发给 Coze Chat API，
//! 返回提取出的回答文本 `{"finalContent": "..."}`。

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod providers;
pub mod server;
pub mod stream;
pub mod upload;

pub use config::Config;
pub use error::ProxyError;
pub use server::{build_router, run_server, AppState};
