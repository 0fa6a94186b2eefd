//! 日志初始化
//!
//! RUST_LOG 优先；未设置时使用配置中的 `logging.level`。

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// 安装全局 subscriber，重复调用时忽略
pub fn init(config: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .with_target(false);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("日志系统初始化失败: {e}");
    }
}
