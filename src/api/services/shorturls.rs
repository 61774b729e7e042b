//! Short URL creation endpoint

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{Responder, web};
use serde_json::Value;
use tracing::trace;

use crate::api::types::{CreateShortUrlRequest, CreateShortUrlResponse};
use crate::errors::{Result, SnaplinkError};
use crate::services::{CreateLinkRequest, LinkService};

use super::helpers::{error_from_snaplink, json_config, json_response};

pub struct ShortUrlService;

impl ShortUrlService {
    pub async fn create_short_url(
        body: web::Json<CreateShortUrlRequest>,
        link_service: web::Data<Arc<LinkService>>,
    ) -> impl Responder {
        let body = body.into_inner();
        trace!("Create request: {:?}", body);

        let result = parse_validity(body.validity.as_ref()).and_then(|validity| {
            link_service.create_link(CreateLinkRequest {
                url: body.url.unwrap_or_default(),
                validity,
                shortcode: body.shortcode,
            })
        });

        match result {
            Ok(created) => json_response(
                StatusCode::CREATED,
                &CreateShortUrlResponse::from(created),
            ),
            Err(e) => error_from_snaplink(&e),
        }
    }
}

/// `validity` 是任意 JSON 数字（分钟，可带小数）；`null` 视为未提供
///
/// Range checks happen in `LinkService::create_link`.
fn parse_validity(raw: Option<&Value>) -> Result<Option<f64>> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| {
            SnaplinkError::invalid_validity(format!("Validity is not representable: {}", n))
        }),
        Some(other) => Err(SnaplinkError::invalid_validity(format!(
            "Validity must be a number, got {}",
            other
        ))),
    }
}

/// Short URL routes
pub fn shorturl_routes() -> actix_web::Scope {
    web::scope("/shorturls")
        .app_data(json_config())
        .route("", web::post().to(ShortUrlService::create_short_url))
}
