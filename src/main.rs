use coze_proxy_lib::{config, logger, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_startup_config()?;
    logger::init(&config.logging);

    tracing::info!(
        "[SERVER] coze-proxy v{} 启动中: {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.host,
        config.server.port
    );

    run_server(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("[SERVER] 监听退出信号失败: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("[SERVER] 收到退出信号，正在关闭");
    })
    .await
}
