use serde::{Deserialize, Serialize};

use crate::services::GeoInfo;

/// Milliseconds per minute of validity
pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// One observed redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRecord {
    pub timestamp: i64,
    pub referrer: Option<String>,
    pub location: Option<GeoInfo>,
}

/// A stored short link and its click history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrlEntry {
    pub code: String,
    pub target_url: String,
    pub created_at: i64,
    pub expires_at: i64,
    #[serde(default)]
    pub clicks: Vec<ClickRecord>,
}

impl ShortUrlEntry {
    /// 创建新条目，`expires_at = created_at + validity_minutes * 60000`
    pub fn new(
        code: impl Into<String>,
        target_url: impl Into<String>,
        created_at: i64,
        validity_minutes: u64,
    ) -> Self {
        let lifetime = i64::try_from(validity_minutes)
            .unwrap_or(i64::MAX)
            .saturating_mul(MILLIS_PER_MINUTE);
        Self::with_lifetime_millis(code, target_url, created_at, lifetime)
    }

    /// 以毫秒给出存活时长，负值按 0 处理
    pub fn with_lifetime_millis(
        code: impl Into<String>,
        target_url: impl Into<String>,
        created_at: i64,
        lifetime_millis: i64,
    ) -> Self {
        Self {
            code: code.into(),
            target_url: target_url.into(),
            created_at,
            expires_at: created_at.saturating_add(lifetime_millis.max(0)),
            clicks: Vec::new(),
        }
    }

    /// Strictly past `expires_at`
    #[inline]
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    #[inline]
    pub fn click_count(&self) -> usize {
        self.clicks.len()
    }
}
