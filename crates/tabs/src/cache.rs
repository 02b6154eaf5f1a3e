//! Bounded, timestamped snapshot of the most recently fetched tabs.
//!
//! Readers take a shared lock and always receive copies. Refreshes are
//! serialised by a separate mutex so the network fetch never happens under
//! the write lock; the write guard is held only for the swap.

use chrono::{DateTime, Duration, Local, Utc};
use std::fmt::Write as _;
use tabrelay_core::{Platform, Result, Tab};
use tabrelay_devices::TabSource;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct CacheState {
    entries: Vec<Tab>,
    last_updated: Option<DateTime<Utc>>,
    source: Option<Platform>,
}

pub struct TabCache {
    state: RwLock<CacheState>,
    capacity: usize,
    refresh_lock: Mutex<()>,
}

impl TabCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            capacity: capacity.max(1),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fetch from `source` and replace the cache with the first `capacity`
    /// tabs in fetch order. On failure the previous contents and timestamp
    /// stay as they were.
    pub async fn refresh(&self, source: &dyn TabSource, platform: Platform) -> Result<usize> {
        let _serialised = self.refresh_lock.lock().await;

        let mut tabs = match source.list().await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!(
                    platform = %platform,
                    error = %e,
                    "Tab cache refresh failed, keeping previous snapshot"
                );
                return Err(e);
            }
        };

        if tabs.len() > self.capacity {
            debug!(fetched = tabs.len(), capacity = self.capacity, "Truncating fetched tabs");
            tabs.truncate(self.capacity);
        }
        let count = tabs.len();

        {
            let mut state = self.state.write().await;
            state.entries = tabs;
            state.last_updated = Some(Utc::now());
            state.source = Some(platform);
        }

        info!(count, platform = %platform, "Tab cache refreshed");
        Ok(count)
    }

    pub async fn snapshot(&self) -> Vec<Tab> {
        self.state.read().await.entries.clone()
    }

    pub async fn is_populated(&self) -> bool {
        self.state.read().await.last_updated.is_some()
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_updated
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.read().await;
        CacheStatus {
            count: state.entries.len(),
            capacity: self.capacity,
            last_updated: state.last_updated,
            source: state.source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    pub count: usize,
    pub capacity: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub source: Option<Platform>,
}

impl CacheStatus {
    /// `None` when the cache has never been populated.
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_updated.map(|t| now - t)
    }

    pub fn render(&self) -> String {
        self.render_at(Utc::now())
    }

    pub fn render_at(&self, now: DateTime<Utc>) -> String {
        let mut out = String::from("📊 Tab Cache Status\n\n");
        let _ = writeln!(out, "📱 Cached Tabs: {}", self.count);
        let _ = writeln!(out, "🎯 Cache Limit: {}", self.capacity);

        let (Some(updated), Some(age)) = (self.last_updated, self.age_at(now)) else {
            out.push_str("⏰ Last Updated: Never (cache not populated)\n");
            out.push_str("📊 Status: Empty - use refresh_tab_cache tool to populate\n");
            return out;
        };

        let _ = writeln!(out, "⏰ Last Updated: {}", format_timestamp(updated));
        if let Some(platform) = self.source {
            let _ = writeln!(out, "📲 Source: {}", platform.display_name());
        }
        let _ = writeln!(out, "📊 Status: Active ({}/{} tabs)", self.count, self.capacity);
        let _ = writeln!(out, "{}", describe_age(age));
        out
    }
}

pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn describe_age(age: Duration) -> String {
    if age < Duration::minutes(1) {
        "🟢 Cache Age: Fresh (< 1 minute)".to_string()
    } else if age < Duration::hours(1) {
        format!("🟡 Cache Age: {} minutes", age.num_minutes())
    } else {
        format!("🔴 Cache Age: {} hours", age.num_hours())
    }
}
