use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tabrelay_core::{DriverOptions, Platform, Result};
use tabrelay_tabs::cache::format_timestamp;

use crate::tools::{device_option_properties, platform_or_android};
use crate::{parse_args, Tool, ToolContext, ToolReply, ToolSchema};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshArgs {
    #[serde(default)]
    platform: Option<String>,
    #[serde(flatten)]
    options: DriverOptions,
}

/// Fetch from a device and swap the result into the cache. Shared by the
/// tool and the startup warm-up.
pub async fn refresh_from_device(
    ctx: &ToolContext,
    platform: Platform,
    options: &DriverOptions,
) -> Result<usize> {
    let cache = ctx.cache.clone();
    ctx.with_device(platform, options, options.operation_budget(), |source| async move {
        cache.refresh(source.as_ref(), platform).await
    })
    .await
}

pub struct RefreshTabCacheTool;

#[async_trait]
impl Tool for RefreshTabCacheTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = device_option_properties(true);
        properties["platform"] = json!({
            "type": "string",
            "enum": ["android", "ios"],
            "description": "Device to fetch from (default: android)"
        });
        ToolSchema {
            name: "refresh_tab_cache",
            description: "Manually refresh the tab cache from the connected device.\n\n\
The cache is populated from Android at startup; use this to pick up the current browser \
state before search_tabs or reading tabs://current. On failure the previous cache is kept.",
            parameters: json!({
                "type": "object",
                "properties": properties
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        platform_or_android(params.get("platform").and_then(|v| v.as_str())).map(|_| ())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<ToolReply> {
        let args: RefreshArgs = parse_args(params)?;
        let platform = platform_or_android(args.platform.as_deref())?;
        let options = args.options.normalized();

        let count = refresh_from_device(&ctx, platform, &options).await?;
        let updated = ctx
            .cache
            .last_updated()
            .await
            .map(format_timestamp)
            .unwrap_or_default();
        Ok(ToolReply::text(format!(
            "✅ Tab cache refreshed successfully!\n\nCached {} tabs from {}\nLast updated: {}",
            count,
            platform.display_name(),
            updated
        )))
    }
}

pub struct CacheStatusTool;

#[async_trait]
impl Tool for CacheStatusTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "cache_status",
            description: "Show the tab cache: number of cached tabs, size limit, \
last update time and age.",
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<ToolReply> {
        Ok(ToolReply::text(ctx.cache.status().await.render()))
    }
}
