//! HTTP request/response bodies

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::services::CreationResult;

/// `POST /shorturls` 请求体
///
/// `validity` stays untyped so that non-numeric values surface as
/// "Invalid validity" instead of a generic body error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateShortUrlRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub validity: Option<serde_json::Value>,
    #[serde(default)]
    pub shortcode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortUrlResponse {
    pub shortcode: String,
    pub url: String,
    /// 整数分钟输出为整数，其余保留小数
    pub validity: Number,
    pub expires_at: i64,
    pub short_url: String,
}

impl From<CreationResult> for CreateShortUrlResponse {
    fn from(result: CreationResult) -> Self {
        Self {
            shortcode: result.code,
            url: result.normalized_url,
            validity: minutes_to_number(result.validity_minutes),
            expires_at: result.expires_at,
            short_url: result.short_url,
        }
    }
}

fn minutes_to_number(minutes: f64) -> Number {
    if minutes.fract() == 0.0 && minutes >= 0.0 && minutes <= u64::MAX as f64 {
        Number::from(minutes as u64)
    } else {
        Number::from_f64(minutes).unwrap_or_else(|| Number::from(0u64))
    }
}

/// 错误响应体 `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub entries: usize,
    pub uptime_secs: u64,
}
