//! Shortcode registry
//!
//! In-memory map from short code to [`ShortUrlEntry`]. Expiry is enforced
//! lazily on every access: an entry found past its `expires_at` is evicted
//! and treated as absent. An optional background sweep (see [`sweeper`])
//! reclaims entries that are never touched again.
//!
//! Compound operations ("check then insert", "check then evict then append")
//! run under the shard lock of the key, so they are atomic with respect to
//! other operations on the same code.

mod models;
pub mod sweeper;

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::errors::{Result, SnaplinkError};
use crate::utils::{Clock, SystemClock};

pub use models::{ClickRecord, MILLIS_PER_MINUTE, ShortUrlEntry};

pub struct ShortcodeRegistry {
    entries: DashMap<String, ShortUrlEntry>,
    clock: Arc<dyn Clock>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl ShortcodeRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            sweeper: Mutex::new(None),
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    #[inline]
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Whether a live entry exists for `code`
    pub fn has(&self, code: &str) -> bool {
        let now = self.now_millis();
        match self.entries.get(code) {
            Some(entry) if !entry.is_expired(now) => true,
            Some(entry) => {
                drop(entry);
                self.evict_if_expired(code, now);
                false
            }
            None => false,
        }
    }

    /// 插入新条目
    ///
    /// Fails with `DuplicateCode` while a live entry holds the code. An
    /// expired occupant is evicted and replaced.
    pub fn insert(&self, entry: ShortUrlEntry) -> Result<()> {
        let now = self.now_millis();

        match self.entries.entry(entry.code.clone()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired(now) {
                    return Err(SnaplinkError::duplicate_code(format!(
                        "Code '{}' is already registered",
                        entry.code
                    )));
                }
                debug!(
                    "Registry: replacing expired entry '{}' on insert",
                    entry.code
                );
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                trace!("Registry: inserted '{}'", entry.code);
                vacant.insert(entry);
            }
        }

        Ok(())
    }

    /// 读取条目（过期则驱逐并返回 None）
    pub fn get(&self, code: &str) -> Option<ShortUrlEntry> {
        let now = self.now_millis();
        let entry = self.entries.get(code)?;
        if entry.is_expired(now) {
            drop(entry);
            self.evict_if_expired(code, now);
            return None;
        }
        Some(entry.clone())
    }

    /// Returns the target of a live entry
    ///
    /// Distinguishes `Expired` (the entry was present but past expiry, and has
    /// now been evicted) from `NotFound`.
    pub fn lookup_live(&self, code: &str) -> Result<String> {
        let now = self.now_millis();

        let Some(entry) = self.entries.get(code) else {
            return Err(SnaplinkError::not_found(format!("Code '{}' not found", code)));
        };

        if !entry.is_expired(now) {
            return Ok(entry.target_url.clone());
        }

        let expires_at = entry.expires_at;
        drop(entry);
        self.evict_if_expired(code, now);

        Err(SnaplinkError::expired(format!(
            "Code '{}' expired at {}",
            code, expires_at
        )))
    }

    /// Appends a click to a live entry
    pub fn record_click(&self, code: &str, click: ClickRecord) -> Result<()> {
        let now = self.now_millis();

        {
            let Some(mut entry) = self.entries.get_mut(code) else {
                return Err(SnaplinkError::not_found(format!("Code '{}' not found", code)));
            };

            if !entry.is_expired(now) {
                entry.clicks.push(click);
                return Ok(());
            }
        }

        self.evict_if_expired(code, now);
        Err(SnaplinkError::expired(format!(
            "Code '{}' expired before the click was recorded",
            code
        )))
    }

    /// Number of stored entries, expired ones included until evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清理所有过期条目，返回清理数量
    pub fn sweep_expired(&self) -> usize {
        let now = self.now_millis();
        let mut removed = 0usize;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Stops the sweeper and drops every entry
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        let dropped = self.entries.len();
        self.entries.clear();
        info!("Registry shut down, {} entries dropped", dropped);
    }

    /// Remove `code` only if the stored entry is still expired at `now`;
    /// a fresh entry inserted concurrently under the same code survives.
    fn evict_if_expired(&self, code: &str, now: i64) -> bool {
        let evicted = self
            .entries
            .remove_if(code, |_, entry| entry.is_expired(now))
            .is_some();
        if evicted {
            debug!("Registry: evicted expired entry '{}'", code);
        }
        evicted
    }
}

impl Default for ShortcodeRegistry {
    fn default() -> Self {
        Self::with_system_clock()
    }
}
