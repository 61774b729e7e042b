//! 后台过期清理任务
//!
//! 惰性驱逐仍然是唯一的正确性保证，这里只负责回收内存。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::ShortcodeRegistry;

impl ShortcodeRegistry {
    /// 启动后台清理任务
    ///
    /// The task only holds a weak reference and exits once the registry is
    /// dropped; `shutdown()` aborts it. Starting again replaces the previous task.
    /// Must be called from within a tokio runtime.
    pub fn start_sweeper(self: &Arc<Self>, interval: Duration) {
        let weak = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // 第一次 tick 立即返回
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(registry) = weak.upgrade() else {
                    debug!("Sweeper: registry dropped, stopping");
                    break;
                };

                let removed = registry.sweep_expired();
                if removed > 0 {
                    debug!(
                        "Sweeper: removed {} expired entries, {} remain",
                        removed,
                        registry.len()
                    );
                }
            }
        });

        if let Some(previous) = self.sweeper.lock().replace(handle) {
            previous.abort();
        }

        info!("Expired-entry sweeper started (every {:?})", interval);
    }

    /// Whether a sweeper task is currently attached
    pub fn sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
