//! HTTP side of the Chrome DevTools Protocol: the `/json/*` endpoints.
//!
//! Both Chrome on Android (through an ADB port forward) and
//! ios_webkit_debug_proxy expose this surface on localhost.

use async_trait::async_trait;
use std::time::Duration;
use tabrelay_core::{Error, Result, Tab};
use tracing::debug;

use crate::source::TabSource;

pub const ANDROID_LIST_PATH: &str = "/json/list";
pub const WEBKIT_LIST_PATH: &str = "/json";

pub struct CdpHttpClient {
    base_url: String,
    list_path: String,
    client: reqwest::Client,
}

impl CdpHttpClient {
    pub fn new(base_url: &str, list_path: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            list_path: list_path.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn list_url(&self) -> String {
        format!("{}{}", self.base_url, self.list_path)
    }

    fn new_tab_url(&self, url: &str) -> String {
        format!("{}/json/new?{}", self.base_url, urlencoding::encode(url))
    }

    fn close_url(&self, id: &str) -> String {
        format!("{}/json/close/{}", self.base_url, urlencoding::encode(id))
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timed out ({})", e)
    } else if e.is_connect() {
        format!("connection refused ({})", e)
    } else {
        e.to_string()
    }
}

#[async_trait]
impl TabSource for CdpHttpClient {
    async fn list(&self) -> Result<Vec<Tab>> {
        let url = self.list_url();
        debug!(url = %url, "Loading tabs");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                Error::Transport(format!("failed to fetch tabs from {}: {}", url, describe(&e)))
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "unexpected status {} from {}",
                status.as_u16(),
                url
            )));
        }

        let mut tabs: Vec<Tab> = resp.json().await.map_err(|e| {
            Error::Transport(format!("failed to decode tab list from {}: {}", url, e))
        })?;

        let listed = tabs.len();
        tabs.retain(|t| !t.id.is_empty());
        if tabs.len() < listed {
            debug!(skipped = listed - tabs.len(), "Skipped targets without an id");
        }
        debug!(count = tabs.len(), "Loaded tabs");
        Ok(tabs)
    }

    async fn open(&self, url: &str) -> Result<()> {
        let endpoint = self.new_tab_url(url);
        debug!(url, "Opening tab");

        let resp = self
            .client
            .put(&endpoint)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("failed to open {}: {}", url, describe(&e))))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "unexpected status {} opening {}",
                status.as_u16(),
                url
            )));
        }
        Ok(())
    }

    async fn close(&self, id: &str) -> Result<()> {
        let endpoint = self.close_url(id);
        debug!(tab_id = id, "Closing tab");

        let resp = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| {
                Error::Transport(format!("failed to close tab {}: {}", id, describe(&e)))
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "unexpected status {} closing tab {}",
                status.as_u16(),
                id
            )));
        }
        Ok(())
    }
}
