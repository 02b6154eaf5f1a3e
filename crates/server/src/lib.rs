//! Tool-call surface for AI-assistant hosts, served as JSON-RPC over stdio.

pub mod registry;
pub mod resources;
pub mod rpc;
pub mod server;
pub mod tools;
pub mod warmup;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tabrelay_core::{Config, DriverOptions, Error, Platform, Result};
use tabrelay_devices::{with_device, DeviceLocks, DriverFactory, TabSource};
use tabrelay_tabs::TabCache;

pub use registry::ToolRegistry;
pub use server::McpServer;

/// Shared state every tool call sees.
#[derive(Clone)]
pub struct ToolContext {
    pub config: Config,
    pub cache: Arc<TabCache>,
    pub drivers: Arc<dyn DriverFactory>,
    pub devices: Arc<DeviceLocks>,
}

impl ToolContext {
    pub fn new(config: Config, drivers: Arc<dyn DriverFactory>) -> Self {
        let cache = Arc::new(TabCache::new(config.cache_capacity));
        Self {
            config,
            cache,
            drivers,
            devices: Arc::new(DeviceLocks::new()),
        }
    }

    /// Run `op` against the device for `platform`. Concurrent calls on the
    /// same port queue up; the lock is held until the driver has stopped.
    pub async fn with_device<T, F, Fut>(
        &self,
        platform: Platform,
        options: &DriverOptions,
        budget: Duration,
        op: F,
    ) -> Result<T>
    where
        F: FnOnce(Arc<dyn TabSource>) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let _endpoint = self.devices.acquire(options.port).await;
        let driver = self.drivers.driver(platform, options);
        with_device(driver, budget, op).await
    }
}

pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Text handed back to the host. `is_error` marks results the host should
/// treat as a failed call while still showing the text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolReply {
    pub text: String,
    pub is_error: bool,
}

impl ToolReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;
    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }
    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<ToolReply>;
}

/// Decode tool arguments; a missing argument object counts as `{}`.
pub fn parse_args<T: DeserializeOwned>(params: Value) -> Result<T> {
    let params = if params.is_null() { Value::Object(Default::default()) } else { params };
    serde_json::from_value(params)
        .map_err(|e| Error::Validation(format!("invalid arguments: {}", e)))
}
