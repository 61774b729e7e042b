//! Link service
//!
//! Business logic behind the two public operations: creating a short link and
//! resolving one for a redirect. HTTP handlers stay thin and delegate here.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::StaticConfig;
use crate::errors::{Result, SnaplinkError};
use crate::registry::{ClickRecord, MILLIS_PER_MINUTE, ShortUrlEntry, ShortcodeRegistry};
use crate::services::geoip::{GeoInfo, GeoIpLookup};
use crate::services::remote_log::LogNotifier;
use crate::utils::ip::is_geo_lookup_candidate;
use crate::utils::{generate_random_code, is_reserved_code, is_valid_short_code, normalize_url};

// ============ Request/Response DTOs ============

/// Request to create a new link
#[derive(Debug, Clone, Default)]
pub struct CreateLinkRequest {
    /// Raw URL as submitted; a missing scheme is filled in
    pub url: String,
    /// Lifetime in minutes, fractions allowed (None = configured default)
    pub validity: Option<f64>,
    /// Caller-chosen code (None or empty = generate one)
    pub shortcode: Option<String>,
}

/// Result of link creation
#[derive(Debug, Clone, PartialEq)]
pub struct CreationResult {
    pub code: String,
    pub normalized_url: String,
    pub validity_minutes: f64,
    pub expires_at: i64,
    pub short_url: String,
}

/// Request metadata captured for a click
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub referrer: Option<String>,
    pub client_ip: Option<String>,
}

/// Tunables for link creation and resolution
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub base_url: String,
    pub default_validity_minutes: u64,
    pub code_length: usize,
    pub max_generation_attempts: u32,
    pub geo_timeout: Duration,
}

impl LinkSettings {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            base_url: config.server.base_url(),
            default_validity_minutes: config.links.default_validity_minutes,
            code_length: config.links.code_length.max(1),
            max_generation_attempts: config.links.max_generation_attempts.max(1),
            geo_timeout: Duration::from_millis(config.geoip.timeout_ms),
        }
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self::from_config(&StaticConfig::default())
    }
}

/// Minutes to milliseconds, rounded to the nearest millisecond
///
/// `as` saturates, so absurdly large values clamp to `i64::MAX`.
fn lifetime_millis(validity_minutes: f64) -> i64 {
    (validity_minutes * MILLIS_PER_MINUTE as f64).round() as i64
}

// ============ LinkService Implementation ============

pub struct LinkService {
    registry: Arc<ShortcodeRegistry>,
    geoip: Option<Arc<dyn GeoIpLookup>>,
    notifier: Arc<dyn LogNotifier>,
    settings: LinkSettings,
}

impl LinkService {
    pub fn new(
        registry: Arc<ShortcodeRegistry>,
        geoip: Option<Arc<dyn GeoIpLookup>>,
        notifier: Arc<dyn LogNotifier>,
        settings: LinkSettings,
    ) -> Self {
        Self {
            registry,
            geoip,
            notifier,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<ShortcodeRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    pub fn notifier(&self) -> &Arc<dyn LogNotifier> {
        &self.notifier
    }

    /// Fully qualified redirect URL for `code`
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.settings.base_url, code)
    }

    // ============ Creation ============

    /// Create a new short link
    pub fn create_link(&self, req: CreateLinkRequest) -> Result<CreationResult> {
        let normalized_url = normalize_url(&req.url).map_err(|e| {
            self.notifier.error("handler", "Invalid URL");
            warn!("Rejected URL '{}': {}", req.url, e);
            SnaplinkError::invalid_url(e.to_string())
        })?;

        let validity_minutes = match req.validity {
            None => self.settings.default_validity_minutes as f64,
            Some(v) if v.is_finite() && v >= 0.0 => v,
            Some(v) => {
                return Err(SnaplinkError::invalid_validity(format!(
                    "Validity must be a non-negative number of minutes, got {}",
                    v
                )));
            }
        };
        let lifetime_millis = lifetime_millis(validity_minutes);

        let preferred = req
            .shortcode
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let entry = match preferred {
            Some(code) => {
                if !is_valid_short_code(&code) {
                    return Err(SnaplinkError::invalid_shortcode(format!(
                        "Invalid short code '{}'. Only letters, digits, '-' and '_' allowed (max 64).",
                        code
                    )));
                }
                if is_reserved_code(&code) {
                    return Err(SnaplinkError::invalid_shortcode(format!(
                        "Short code '{}' is reserved",
                        code
                    )));
                }
                let entry = self.new_entry(code, &normalized_url, lifetime_millis);
                self.registry.insert(entry.clone()).inspect_err(|_| {
                    warn!("Preferred code '{}' is already in use", entry.code);
                })?;
                entry
            }
            None => self.insert_with_generated_code(&normalized_url, lifetime_millis)?,
        };

        info!(
            "LinkService: created '{}' -> '{}' (expires at {})",
            entry.code, entry.target_url, entry.expires_at
        );
        self.notifier
            .info("controller", &format!("Short URL created: {}", entry.code));

        Ok(CreationResult {
            short_url: self.short_url(&entry.code),
            code: entry.code,
            normalized_url,
            validity_minutes,
            expires_at: entry.expires_at,
        })
    }

    fn new_entry(&self, code: String, url: &str, lifetime_millis: i64) -> ShortUrlEntry {
        ShortUrlEntry::with_lifetime_millis(code, url, self.registry.now_millis(), lifetime_millis)
    }

    /// Generate codes until one is free, bounded by `max_generation_attempts`
    fn insert_with_generated_code(&self, url: &str, lifetime_millis: i64) -> Result<ShortUrlEntry> {
        for attempt in 1..=self.settings.max_generation_attempts {
            let code = generate_random_code(self.settings.code_length);
            if is_reserved_code(&code) || self.registry.has(&code) {
                debug!("Generated code '{}' collided (attempt {})", code, attempt);
                continue;
            }

            let entry = self.new_entry(code, url, lifetime_millis);
            match self.registry.insert(entry.clone()) {
                Ok(()) => return Ok(entry),
                // 并发插入抢先占用，重试
                Err(SnaplinkError::DuplicateCode(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        self.notifier
            .error("handler", "Could not allocate a unique shortcode");
        Err(SnaplinkError::code_space_exhausted(format!(
            "No free code of length {} after {} attempts",
            self.settings.code_length, self.settings.max_generation_attempts
        )))
    }

    // ============ Redirection ============

    /// Resolve `code` to its target and record the click
    ///
    /// Fails with `NotFound` for unknown codes and `Expired` (evicting the
    /// entry) for codes past their expiry.
    pub async fn resolve_link(&self, code: &str, ctx: ClickContext) -> Result<String> {
        let target = self.peek_link(code)?;

        let location = self.locate(ctx.client_ip.as_deref()).await;
        let click = ClickRecord {
            timestamp: self.registry.now_millis(),
            referrer: ctx.referrer.filter(|r| !r.is_empty()),
            location,
        };

        // The entry was live at lookup time; a click lost to a concurrent
        // expiry does not cancel the redirect.
        if let Err(e) = self.registry.record_click(code, click) {
            warn!("Click for '{}' dropped: {}", code, e);
        }

        info!("Redirecting {} -> {}", code, target);
        self.notifier
            .info("handler", &format!("Redirecting {} -> {}", code, target));

        Ok(target)
    }

    /// Same lookup as [`resolve_link`](Self::resolve_link) without recording a click
    ///
    /// Expired entries are still evicted.
    pub fn peek_link(&self, code: &str) -> Result<String> {
        self.registry.lookup_live(code).inspect_err(|e| {
            let note = match e {
                SnaplinkError::Expired(_) => format!("Expired: {}", code),
                _ => format!("Not found: {}", code),
            };
            warn!("{}", note);
            self.notifier.warn("handler", &note);
        })
    }

    /// Time-bounded geolocation; any failure or timeout means "no data"
    async fn locate(&self, ip: Option<&str>) -> Option<GeoInfo> {
        let geoip = self.geoip.as_ref()?;
        let ip = ip.filter(|ip| is_geo_lookup_candidate(ip))?;

        match tokio::time::timeout(self.settings.geo_timeout, geoip.lookup(ip)).await {
            Ok(info) => info.filter(|g| !g.is_empty()),
            Err(_) => {
                debug!(
                    "GeoIP lookup for {} exceeded {:?}, skipping location",
                    ip, self.settings.geo_timeout
                );
                None
            }
        }
    }
}
