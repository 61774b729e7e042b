//! Redirect endpoint

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::trace;

use crate::errors::Result;
use crate::services::{ClickContext, LinkService};
use crate::utils::ip::extract_client_ip;
use crate::utils::is_valid_short_code;

use super::helpers::{error_from_snaplink, error_response};

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        link_service: web::Data<Arc<LinkService>>,
    ) -> impl Responder {
        let code = path.into_inner();

        if !is_valid_short_code(&code) {
            // 非法短码，直接 404（不查注册表）
            trace!("Invalid short code rejected: {}", &code);
            return error_response(StatusCode::NOT_FOUND, "Shortcode not found");
        }

        let ctx = ClickContext {
            referrer: req
                .headers()
                .get(header::REFERER)
                .and_then(|h| h.to_str().ok())
                .map(String::from),
            client_ip: extract_client_ip(&req),
        };

        redirect_to(link_service.resolve_link(&code, ctx).await)
    }

    /// `HEAD` 只报告跳转目标，不记录点击
    pub async fn handle_head(
        path: web::Path<String>,
        link_service: web::Data<Arc<LinkService>>,
    ) -> impl Responder {
        let code = path.into_inner();
        if !is_valid_short_code(&code) {
            return error_response(StatusCode::NOT_FOUND, "Shortcode not found");
        }
        redirect_to(link_service.peek_link(&code))
    }
}

fn redirect_to(target: Result<String>) -> HttpResponse {
    match target {
        Ok(target) => HttpResponse::Found()
            .insert_header((header::LOCATION, target))
            .insert_header((header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
            .finish(),
        Err(e) => error_from_snaplink(&e),
    }
}

/// Redirect routes (catch-all, register last)
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{shortcode}", web::get().to(RedirectService::handle_redirect))
        .route("/{shortcode}", web::head().to(RedirectService::handle_head))
}
