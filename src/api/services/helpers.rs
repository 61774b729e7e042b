//! API 帮助函数

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use tracing::debug;

use crate::api::types::ErrorBody;
use crate::errors::SnaplinkError;

/// JSON 请求体上限
pub const JSON_BODY_LIMIT: usize = 64 * 1024;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

/// 构建错误响应
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(
        status,
        &ErrorBody {
            error: message.to_string(),
        },
    )
}

/// 从 SnaplinkError 构建错误响应（自动映射 HTTP 状态码）
pub fn error_from_snaplink(err: &SnaplinkError) -> HttpResponse {
    error_response(err.http_status(), err.error_type())
}

/// Body extractor config: malformed or non-JSON bodies become `400 Invalid request body`
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(json_error_handler)
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected body for {} {}: {}", req.method(), req.path(), err);
    let response = error_response(StatusCode::BAD_REQUEST, "Invalid request body");
    InternalError::from_response(err, response).into()
}

/// Fallback for paths no route matches
pub async fn not_found() -> HttpResponse {
    error_from_snaplink(&SnaplinkError::not_found("No route"))
}
