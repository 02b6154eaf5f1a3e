use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tabrelay_core::{DriverOptions, Result};
use tabrelay_tabs::{
    close_bulk, close_single, ensure_close_supported, BulkCloseRequest, BulkCloseResult,
    CloseStatus, CloseTabRequest,
};
use tracing::info;

use crate::tools::{platform_or_android, require_str};
use crate::{parse_args, Tool, ToolContext, ToolReply, ToolSchema};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloseTabArgs {
    #[serde(default)]
    tab_id: String,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    confirm: bool,
    #[serde(flatten)]
    options: DriverOptions,
}

const PLATFORM_DESCRIPTION: &str =
    "Target platform (default: android; only android is supported)";

pub struct CloseTabTool;

#[async_trait]
impl Tool for CloseTabTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "close_tab",
            description: "Close a single tab on an Android device by tab ID.\n\n\
⚠️ This cannot be undone. Without confirm=true the tool only describes what it would close.\n\
Get current tab IDs from copy_tabs_android, search_tabs or the tabs://current resource.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "tabId": {
                        "type": "string",
                        "description": "Unique ID of the tab to close"
                    },
                    "platform": {
                        "type": "string",
                        "description": PLATFORM_DESCRIPTION
                    },
                    "confirm": {
                        "type": "boolean",
                        "description": "Actually close the tab (default: false)"
                    }
                },
                "required": ["tabId"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        let platform = platform_or_android(params.get("platform").and_then(|v| v.as_str()))?;
        ensure_close_supported(platform)?;
        require_str(params, "tabId").map(|_| ())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<ToolReply> {
        let args: CloseTabArgs = parse_args(params)?;
        let request = CloseTabRequest {
            tab_id: args.tab_id.trim().to_string(),
            confirm: args.confirm,
            platform: platform_or_android(args.platform.as_deref())?,
        };
        if let Some(prompt) = request.preflight()? {
            return Ok(ToolReply::text(prompt));
        }

        let options = args.options.normalized();
        let tab_id = request.tab_id.clone();
        let budget = options.operation_budget();
        ctx.with_device(request.platform, &options, budget, |source| async move {
            close_single(source.as_ref(), &tab_id).await
        })
        .await?;

        Ok(ToolReply::text(format!("✅ Successfully closed tab: {}", request.tab_id)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloseTabsBulkArgs {
    #[serde(default)]
    tab_ids: Vec<String>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    filter_url: Option<String>,
    #[serde(default)]
    filter_title: Option<String>,
    #[serde(default)]
    confirm: bool,
    #[serde(default)]
    dry_run: bool,
    #[serde(flatten)]
    options: DriverOptions,
}

pub struct CloseTabsBulkTool;

#[async_trait]
impl Tool for CloseTabsBulkTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "close_tabs_bulk",
            description: "Close multiple tabs at once on an Android device, by ID or by filter.\n\n\
⚠️ This cannot be undone. Explicit tabIds take precedence over filters. Filters match \
case-insensitive substrings and are combined with AND; \"*\" matches every tab, and giving no \
ids and no filters selects nothing. Use dryRun=true first to preview, then confirm=true to close.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "tabIds": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Specific tab IDs to close"
                    },
                    "platform": {
                        "type": "string",
                        "description": PLATFORM_DESCRIPTION
                    },
                    "filterUrl": {
                        "type": "string",
                        "description": "Close tabs whose URL contains this text (\"*\" for all)"
                    },
                    "filterTitle": {
                        "type": "string",
                        "description": "Close tabs whose title contains this text (\"*\" for all)"
                    },
                    "confirm": {
                        "type": "boolean",
                        "description": "Actually close the tabs (default: false)"
                    },
                    "dryRun": {
                        "type": "boolean",
                        "description": "Preview the selection without closing anything \
                                        (default: false)"
                    }
                }
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        let platform = platform_or_android(params.get("platform").and_then(|v| v.as_str()))?;
        ensure_close_supported(platform)
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<ToolReply> {
        let args: CloseTabsBulkArgs = parse_args(params)?;
        let request = BulkCloseRequest {
            tab_ids: args.tab_ids,
            filter_url: args.filter_url,
            filter_title: args.filter_title,
            confirm: args.confirm,
            dry_run: args.dry_run,
            platform: Some(platform_or_android(args.platform.as_deref())?),
        };
        ensure_close_supported(request.platform())?;

        let options = args.options.normalized();
        let platform = request.platform();
        let budget = options.operation_budget();
        let result = ctx
            .with_device(platform, &options, budget, |source| async move {
                close_bulk(source.as_ref(), &request).await
            })
            .await?;

        Ok(reply_for(&result))
    }
}

fn reply_for(result: &BulkCloseResult) -> ToolReply {
    let BulkCloseResult::Executed(outcome) = result else {
        return ToolReply::text(result.render());
    };

    let status = outcome.status();
    info!(
        ?status,
        succeeded = outcome.succeeded,
        failed = outcome.failed.len(),
        "Bulk close reply"
    );
    let detail = json!({
        "status": status,
        "requested": outcome.requested,
        "succeeded": outcome.succeeded,
        "failed": outcome.failed,
    });
    let text = format!(
        "{}\n\n{}",
        result.render(),
        serde_json::to_string_pretty(&detail).unwrap_or_default()
    );
    match status {
        CloseStatus::AllFailed => ToolReply::error(text),
        CloseStatus::AllSucceeded | CloseStatus::Partial => ToolReply::text(text),
    }
}
