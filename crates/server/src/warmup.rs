//! Background cache population at server startup.

use std::future::Future;
use std::time::Duration;

use tabrelay_core::{DriverOptions, Error, Platform, Result};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::tools::cache::refresh_from_device;
use crate::ToolContext;

pub const WARMUP_BUDGET: Duration = Duration::from_secs(15);

/// Run `task` in the background. Errors are logged as warnings and panics
/// are caught and logged; neither reaches the caller.
pub fn spawn_supervised<F>(name: &'static str, task: F) -> JoinHandle<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let inner = tokio::spawn(task);
    tokio::spawn(async move {
        match inner.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(task = name, error = %e, "Background task failed"),
            Err(join) if join.is_panic() => error!(task = name, "Background task panicked"),
            Err(join) => warn!(task = name, error = %join, "Background task cancelled"),
        }
    })
}

/// Populate the cache from the default Android setup so the first search has
/// something to work with.
pub fn start_warmup(ctx: ToolContext) -> JoinHandle<()> {
    spawn_supervised("cache-warmup", async move {
        let options = DriverOptions::default();
        let refresh = refresh_from_device(&ctx, Platform::Android, &options);
        let count = tokio::time::timeout(WARMUP_BUDGET, refresh)
            .await
            .map_err(|_| Error::Timeout(format!("cache warm-up exceeded {:?}", WARMUP_BUDGET)))??;
        info!(count, "Tab cache warmed up");
        Ok(())
    })
}
