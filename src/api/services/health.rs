use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{Responder, web};
use tracing::trace;

use crate::api::types::HealthResponse;
use crate::registry::ShortcodeRegistry;

use super::helpers::json_response;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        (chrono::Utc::now() - self.start_datetime)
            .num_seconds()
            .max(0) as u64
    }
}

/// Liveness probe; reads the registry size only
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        registry: web::Data<Arc<ShortcodeRegistry>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        json_response(
            StatusCode::OK,
            &HealthResponse {
                status: "healthy".to_string(),
                entries: registry.len(),
                uptime_secs: app_start_time.uptime_secs(),
            },
        )
    }
}

/// Health routes
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
}
