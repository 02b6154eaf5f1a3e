use async_trait::async_trait;
use tabrelay_core::{Result, Tab};

/// Capability interface of a remote browser: list, open and close tabs.
#[async_trait]
pub trait TabSource: Send + Sync {
    /// Fetch the live tab list, in the order the browser reports it.
    async fn list(&self) -> Result<Vec<Tab>>;

    /// Open `url` in a new tab.
    async fn open(&self, url: &str) -> Result<()>;

    /// Close the tab with the given id.
    async fn close(&self, id: &str) -> Result<()>;
}
