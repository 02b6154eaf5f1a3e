use std::time::Duration;
use tabrelay_core::{Error, Result, Tab};
use tracing::{debug, info};

use crate::source::TabSource;

/// Gap between consecutive opens; browsers drop requests fired back to back.
pub const RESTORE_PACING: Duration = Duration::from_millis(100);

/// Open every tab's URL on the device, in order.
///
/// Stops at the first failure, naming the position and title of the tab
/// that could not be opened. Tabs without a URL are skipped. Returns how
/// many tabs were opened.
pub async fn restore_tabs(source: &dyn TabSource, tabs: &[Tab]) -> Result<usize> {
    let mut opened = 0;
    for (index, tab) in tabs.iter().enumerate() {
        if tab.url.trim().is_empty() {
            debug!(index, title = %tab.title, "Skipping tab without URL");
            continue;
        }
        source.open(&tab.url).await.map_err(|e| {
            Error::Transport(format!("failed to restore tab {} ({}): {}", index, tab.title, e))
        })?;
        opened += 1;
        tokio::time::sleep(RESTORE_PACING).await;
    }
    info!(opened, total = tabs.len(), "Restored tabs");
    Ok(opened)
}
