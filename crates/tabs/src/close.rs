//! Safety-gated tab closing.
//!
//! Nothing is closed without `confirm = true`. Bulk requests resolve their
//! targets against a live listing, can be previewed with `dry_run`, and
//! keep going past individual failures so the caller gets an exact account
//! of what happened.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use tabrelay_core::{Error, Platform, Result, Tab};
use tabrelay_devices::TabSource;
use tracing::{debug, info, warn};

/// Close requests only work against the CDP HTTP endpoint Chrome exposes.
pub fn ensure_close_supported(platform: Platform) -> Result<()> {
    match platform {
        Platform::Android => Ok(()),
        other => Err(Error::Unsupported(format!(
            "tab closing is currently only supported for Android, not {}",
            other.display_name()
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct CloseTabRequest {
    pub tab_id: String,
    pub confirm: bool,
    pub platform: Platform,
}

impl CloseTabRequest {
    /// Checks that need no device. `Ok(Some(text))` is the confirmation
    /// prompt to hand back instead of closing anything.
    pub fn preflight(&self) -> Result<Option<String>> {
        ensure_close_supported(self.platform)?;
        if self.tab_id.trim().is_empty() {
            return Err(Error::Precondition("tabId is required".to_string()));
        }
        if !self.confirm {
            return Ok(Some(format!(
                "⚠️ WARNING: You are about to permanently close tab:\nID: {}\nPlatform: {}\n\n\
                 This action cannot be undone. To proceed, call this tool again with confirm=true.",
                self.tab_id, self.platform
            )));
        }
        Ok(None)
    }
}

/// Close one tab after confirming it exists in a fresh listing.
pub async fn close_single(source: &dyn TabSource, tab_id: &str) -> Result<()> {
    let live = source.list().await?;
    if !live.iter().any(|t| t.id == tab_id) {
        return Err(Error::NotFound(format!("tab with ID '{}' does not exist", tab_id)));
    }
    source.close(tab_id).await?;
    info!(tab_id, "Closed tab");
    Ok(())
}

/// `*` matches everything; otherwise case-insensitive containment.
pub fn matches_pattern(text: &str, pattern: &str) -> bool {
    pattern == "*" || text.to_lowercase().contains(&pattern.to_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct BulkCloseRequest {
    pub tab_ids: Vec<String>,
    pub filter_url: Option<String>,
    pub filter_title: Option<String>,
    pub confirm: bool,
    pub dry_run: bool,
    pub platform: Option<Platform>,
}

impl BulkCloseRequest {
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or(Platform::Android)
    }

    /// Explicit ids with blanks dropped and duplicates removed, first
    /// occurrence wins.
    pub fn explicit_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tab_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect()
    }

    fn filters(&self) -> (Option<&str>, Option<&str>) {
        fn present(f: &Option<String>) -> Option<&str> {
            f.as_deref().filter(|s| !s.is_empty())
        }
        (present(&self.filter_url), present(&self.filter_title))
    }

    /// Work out what would be closed given a live listing.
    pub fn resolve(&self, live: &[Tab]) -> Targets {
        let ids = self.explicit_ids();
        if !ids.is_empty() {
            let mut targets = Targets::default();
            for id in ids {
                match live.iter().find(|t| t.id == id) {
                    Some(tab) => targets.found.push(tab.clone()),
                    None => targets.missing.push(id),
                }
            }
            return targets;
        }

        let (url, title) = self.filters();
        if url.is_none() && title.is_none() {
            return Targets::default();
        }
        let found = live
            .iter()
            .filter(|t| url.map_or(true, |p| matches_pattern(&t.url, p)))
            .filter(|t| title.map_or(true, |p| matches_pattern(&t.title, p)))
            .cloned()
            .collect();
        Targets { found, missing: Vec::new() }
    }
}

/// Resolved selection: tabs present on the device, plus explicit ids that
/// were not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Targets {
    pub found: Vec<Tab>,
    pub missing: Vec<String>,
}

impl Targets {
    pub fn len(&self) -> usize {
        self.found.len() + self.missing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ids(&self) -> Vec<String> {
        self.found
            .iter()
            .map(|t| t.id.clone())
            .chain(self.missing.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseStatus {
    AllSucceeded,
    Partial,
    AllFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkCloseOutcome {
    pub requested: Vec<String>,
    pub succeeded: usize,
    pub failed: BTreeMap<String, String>,
}

impl BulkCloseOutcome {
    pub fn status(&self) -> CloseStatus {
        if self.failed.is_empty() {
            CloseStatus::AllSucceeded
        } else if self.succeeded > 0 {
            CloseStatus::Partial
        } else {
            CloseStatus::AllFailed
        }
    }

    pub fn render(&self) -> String {
        let total = self.requested.len();
        let mut out = match self.status() {
            CloseStatus::AllSucceeded => {
                return format!("✅ Successfully closed {} tabs", self.succeeded)
            }
            CloseStatus::Partial => format!(
                "⚠️ Partially successful: closed {}/{} tabs. Failed tabs:\n",
                self.succeeded, total
            ),
            CloseStatus::AllFailed => format!("❌ Failed to close all {} tabs:\n", total),
        };
        for (id, reason) in &self.failed {
            let _ = writeln!(out, "• {}: {}", id, reason);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BulkCloseResult {
    NothingSelected,
    DryRun(Targets),
    ConfirmationRequired { count: usize, platform: Platform },
    Executed(BulkCloseOutcome),
}

impl BulkCloseResult {
    pub fn render(&self) -> String {
        match self {
            Self::NothingSelected => "No tabs match the specified criteria.".to_string(),
            Self::DryRun(targets) => {
                let mut out = format!("🔍 DRY RUN: Would close {} tabs:\n\n", targets.len());
                for tab in &targets.found {
                    let _ = write!(
                        out,
                        "• {}\n  ID: {}\n  URL: {}\n\n",
                        tab.title, tab.id, tab.url
                    );
                }
                for id in &targets.missing {
                    let _ = write!(out, "• (not open on device)\n  ID: {}\n\n", id);
                }
                out.push_str(
                    "To actually close these tabs, call this tool again with dryRun=false \
                     and confirm=true.",
                );
                out
            }
            Self::ConfirmationRequired { count, platform } => format!(
                "⚠️ WARNING: You are about to permanently close {} tabs on {}.\n\n\
                 This action cannot be undone. \
                 To proceed, call this tool again with confirm=true.\n\n\
                 Tip: Use dryRun=true first to preview which tabs will be closed.",
                count, platform
            ),
            Self::Executed(outcome) => outcome.render(),
        }
    }
}

/// Resolve, gate and, when confirmed, execute a bulk close against `source`.
pub async fn close_bulk(
    source: &dyn TabSource,
    request: &BulkCloseRequest,
) -> Result<BulkCloseResult> {
    ensure_close_supported(request.platform())?;

    let live = source.list().await?;
    let targets = request.resolve(&live);
    debug!(found = targets.found.len(), missing = targets.missing.len(), "Resolved close targets");

    if targets.is_empty() {
        return Ok(BulkCloseResult::NothingSelected);
    }
    if request.dry_run {
        return Ok(BulkCloseResult::DryRun(targets));
    }
    if !request.confirm {
        return Ok(BulkCloseResult::ConfirmationRequired {
            count: targets.len(),
            platform: request.platform(),
        });
    }

    let mut outcome = BulkCloseOutcome {
        requested: targets.ids(),
        succeeded: 0,
        failed: BTreeMap::new(),
    };
    for id in &targets.missing {
        outcome
            .failed
            .insert(id.clone(), format!("tab with ID '{}' does not exist", id));
    }
    for tab in &targets.found {
        match source.close(&tab.id).await {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                warn!(tab_id = %tab.id, error = %e, "Failed to close tab");
                outcome.failed.insert(tab.id.clone(), e.to_string());
            }
        }
    }

    info!(
        requested = outcome.requested.len(),
        succeeded = outcome.succeeded,
        failed = outcome.failed.len(),
        "Bulk close finished"
    );
    Ok(BulkCloseResult::Executed(outcome))
}
