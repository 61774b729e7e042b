//! Remote log sink
//!
//! Fire-and-forget delivery of `{stack, level, package, message}` events to an
//! HTTP collector. `notify` only enqueues into a bounded channel; a background
//! worker posts each event with a global request timeout. Full queues drop
//! events and delivery failures are only visible in local tracing output.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use ureq::Agent;

use crate::config::RemoteLogConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Wire format expected by the collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub stack: String,
    pub level: LogLevel,
    pub package: String,
    pub message: String,
}

/// Best-effort notification channel; implementations must never block or fail
pub trait LogNotifier: Send + Sync {
    fn notify(&self, level: LogLevel, component: &str, message: &str);

    /// Stop accepting events; pending ones may still be delivered
    fn close(&self) {}

    fn info(&self, component: &str, message: &str) {
        self.notify(LogLevel::Info, component, message);
    }

    fn warn(&self, component: &str, message: &str) {
        self.notify(LogLevel::Warn, component, message);
    }

    fn error(&self, component: &str, message: &str) {
        self.notify(LogLevel::Error, component, message);
    }
}

/// 未配置远程日志时使用
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogNotifier for NullLogSink {
    fn notify(&self, _level: LogLevel, _component: &str, _message: &str) {}
}

/// HTTP 远程日志
pub struct RemoteLogSink {
    stack: String,
    tx: Mutex<Option<mpsc::Sender<LogEvent>>>,
}

impl RemoteLogSink {
    /// 创建 sink 并启动后台发送任务（需要在 tokio runtime 中调用）
    pub fn spawn(endpoint: &str, config: &RemoteLogConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(config.timeout_ms)))
            .build()
            .into();

        let worker = tokio::spawn(Self::run_worker(
            rx,
            agent,
            endpoint.to_string(),
            config.token.clone(),
        ));

        let sink = Self {
            stack: config.stack.clone(),
            tx: Mutex::new(Some(tx)),
        };
        (sink, worker)
    }

    async fn run_worker(
        mut rx: mpsc::Receiver<LogEvent>,
        agent: Agent,
        endpoint: String,
        token: Option<String>,
    ) {
        while let Some(event) = rx.recv().await {
            let agent = agent.clone();
            let endpoint = endpoint.clone();
            let token = token.clone();

            let delivery = tokio::task::spawn_blocking(move || {
                Self::deliver(&agent, &endpoint, token.as_deref(), &event)
            })
            .await;

            if let Err(e) = delivery {
                warn!("Remote log: delivery task failed: {}", e);
            }
        }
        debug!("Remote log: worker stopped");
    }

    fn deliver(agent: &Agent, endpoint: &str, token: Option<&str>, event: &LogEvent) {
        let mut request = agent.post(endpoint);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        match request.send_json(event) {
            Ok(resp) => trace!("Remote log: delivered ({})", resp.status()),
            Err(e) => debug!("Remote log: delivery to {} failed: {}", endpoint, e),
        }
    }
}

impl LogNotifier for RemoteLogSink {
    fn notify(&self, level: LogLevel, component: &str, message: &str) {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            return;
        };

        let event = LogEvent {
            stack: self.stack.clone(),
            level,
            package: component.to_string(),
            message: message.to_string(),
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("Remote log: queue full, event dropped"),
            Err(TrySendError::Closed(_)) => trace!("Remote log: worker gone, event dropped"),
        }
    }

    fn close(&self) {
        self.tx.lock().take();
    }
}

/// 根据配置构建日志通知器
///
/// Returns the worker handle when a remote endpoint is configured so that
/// shutdown can wait for pending deliveries.
pub fn build_log_notifier(config: &RemoteLogConfig) -> (Arc<dyn LogNotifier>, Option<JoinHandle<()>>) {
    match config.endpoint.as_deref().map(str::trim) {
        Some(endpoint) if !endpoint.is_empty() => {
            info!("Remote logging enabled, posting to {}", endpoint);
            let (sink, worker) = RemoteLogSink::spawn(endpoint, config);
            (Arc::new(sink), Some(worker))
        }
        _ => {
            debug!("Remote logging disabled (no endpoint configured)");
            (Arc::new(NullLogSink), None)
        }
    }
}
