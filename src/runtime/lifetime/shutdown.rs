use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::startup::StartupContext;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C 信号
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, releasing resources...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// 执行关闭任务
///
/// Stops the sweeper and empties the registry, closes the log notifier and
/// gives the remote log worker a bounded window to drain its queue.
pub async fn perform_shutdown_tasks(ctx: StartupContext) {
    ctx.registry.shutdown();
    ctx.notifier.close();

    let Some(worker) = ctx.log_worker else {
        return;
    };

    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), worker).await {
        Ok(Ok(())) => info!("Remote log queue drained"),
        Ok(Err(e)) => error!("Remote log worker failed: {}", e),
        Err(_) => error!(
            "Remote log worker did not finish within {} seconds, pending events dropped",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
