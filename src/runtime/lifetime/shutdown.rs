use tokio::signal;
use tracing::{error, warn};

/// 等待 Ctrl+C，监听失败时永不返回，由服务器自身结束进程
pub async fn listen_for_shutdown() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");
}
