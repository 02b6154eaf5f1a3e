use std::sync::Arc;

use tabrelay_core::Config;
use tabrelay_devices::SystemDrivers;
use tabrelay_server::{McpServer, ToolContext, ToolRegistry};
use tracing::info;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env();
    info!(cache_capacity = config.cache_capacity, "Starting MCP server for tab transfer");

    let ctx = ToolContext::new(config.clone(), Arc::new(SystemDrivers::new(config)));
    let server = McpServer::new(ToolRegistry::with_defaults(), ctx);
    server.serve_stdio().await?;
    Ok(())
}
