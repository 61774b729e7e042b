use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::registry::ShortcodeRegistry;
use crate::services::{GeoIpLookup, GeoIpProvider, LinkService, LinkSettings, LogNotifier, build_log_notifier};

pub struct StartupContext {
    pub registry: Arc<ShortcodeRegistry>,
    pub link_service: Arc<LinkService>,
    pub notifier: Arc<dyn LogNotifier>,
    /// Remote log worker, awaited during shutdown
    pub log_worker: Option<JoinHandle<()>>,
}

/// 准备服务器启动的上下文
///
/// Builds the registry (with its sweeper), the geolocation provider and the
/// log notifier, then wires them into the link service. Must run inside a
/// tokio runtime.
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let registry = Arc::new(ShortcodeRegistry::with_system_clock());
    if config.links.sweep_interval_secs > 0 {
        registry.start_sweeper(Duration::from_secs(config.links.sweep_interval_secs));
    } else {
        info!("Expired-entry sweeper disabled, relying on lazy eviction only");
    }

    let geoip: Option<Arc<dyn GeoIpLookup>> = if config.geoip.enabled {
        Some(Arc::new(GeoIpProvider::new(&config.geoip)))
    } else {
        info!("GeoIP lookup disabled");
        None
    };

    let (notifier, log_worker) = build_log_notifier(&config.remote_log);

    let link_service = Arc::new(LinkService::new(
        Arc::clone(&registry),
        geoip,
        Arc::clone(&notifier),
        LinkSettings::from_config(config),
    ));

    info!(
        "Pre-startup completed in {:?} (public base URL: {})",
        start_time.elapsed(),
        link_service.settings().base_url
    );

    Ok(StartupContext {
        registry,
        link_service,
        notifier,
        log_worker,
    })
}
