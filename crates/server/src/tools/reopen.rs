use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tabrelay_core::format::parse_tabs;
use tabrelay_core::{DriverOptions, Platform, Result};
use tabrelay_devices::restore::RESTORE_PACING;
use tabrelay_devices::restore_tabs;

use crate::tools::{device_option_properties, require_str};
use crate::{parse_args, Tool, ToolContext, ToolReply, ToolSchema};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReopenArgs {
    tabs_json: String,
    platform: String,
    #[serde(flatten)]
    options: DriverOptions,
}

pub struct ReopenTabsTool;

#[async_trait]
impl Tool for ReopenTabsTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = device_option_properties(false);
        properties["tabsJson"] = json!({
            "type": "string",
            "description": "Tab list previously produced by copy_tabs_android or \
copy_tabs_ios (JSON or YAML)"
        });
        properties["platform"] = json!({
            "type": "string",
            "enum": ["android", "ios"],
            "description": "Target platform"
        });
        ToolSchema {
            name: "reopen_tabs",
            description: "Restore saved tabs to a mobile device.\n\n\
Takes tabs exported by copy_tabs_android or copy_tabs_ios and opens each URL on the \
target device, in order.\n\
Prerequisites are the same as for the copy tools.",
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": ["tabsJson", "platform"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        require_str(params, "tabsJson")?;
        require_str(params, "platform")?.parse::<Platform>()?;
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<ToolReply> {
        let args: ReopenArgs = parse_args(params)?;
        let platform: Platform = args.platform.parse()?;
        let tabs = Arc::new(parse_tabs(&args.tabs_json)?);
        let options = args.options.normalized();

        let budget = options.operation_budget() + RESTORE_PACING * tabs.len() as u32;
        let to_open = tabs.clone();
        let opened = ctx
            .with_device(platform, &options, budget, |source| async move {
                restore_tabs(source.as_ref(), &to_open).await
            })
            .await?;

        Ok(ToolReply::text(format!(
            "Successfully restored {} of {} tabs to {} device",
            opened,
            tabs.len(),
            platform.display_name()
        )))
    }
}
