use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tabrelay_core::{Error, Result};
use tracing::{debug, warn};

use crate::tools::cache::{CacheStatusTool, RefreshTabCacheTool};
use crate::tools::check::CheckEnvironmentTool;
use crate::tools::close::{CloseTabTool, CloseTabsBulkTool};
use crate::tools::copy::CopyTabsTool;
use crate::tools::reopen::ReopenTabsTool;
use crate::tools::search::SearchTabsTool;
use crate::{Tool, ToolContext, ToolReply};
use tabrelay_core::Platform;

#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, which is also the `tools/list` order.
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // Tab transfer
        registry.register(Arc::new(CopyTabsTool::new(Platform::Android)));
        registry.register(Arc::new(CopyTabsTool::new(Platform::Ios)));
        registry.register(Arc::new(ReopenTabsTool));

        // Diagnostics
        registry.register(Arc::new(CheckEnvironmentTool));

        // Cache
        registry.register(Arc::new(RefreshTabCacheTool));
        registry.register(Arc::new(CacheStatusTool));

        // Mutation
        registry.register(Arc::new(CloseTabTool));
        registry.register(Arc::new(CloseTabsBulkTool));

        registry.register(Arc::new(SearchTabsTool));

        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        debug!(name = schema.name, "Registering tool");
        if self.tools.insert(schema.name.to_string(), tool).is_none() {
            self.order.push(schema.name.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Tool descriptors in the shape MCP's `tools/list` returns.
    pub fn tool_definitions(&self) -> Vec<Value> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                let schema = tool.schema();
                json!({
                    "name": schema.name,
                    "description": schema.description,
                    "inputSchema": schema.parameters
                })
            })
            .collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub async fn execute(&self, name: &str, ctx: ToolContext, params: Value) -> Result<ToolReply> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Unknown tool: {}", name)))?;

        if let Err(e) = tool.validate(&params) {
            warn!(tool = name, error = %e, "Tool validation failed");
            return Err(e);
        }

        debug!(tool = name, "Executing tool");
        tool.execute(ctx, params).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
