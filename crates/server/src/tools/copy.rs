use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tabrelay_core::{DriverOptions, OutputFormat, Platform, Result};
use tracing::info;

use crate::tools::device_option_properties;
use crate::{parse_args, Tool, ToolContext, ToolReply, ToolSchema};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CopyArgs {
    #[serde(flatten)]
    options: DriverOptions,
    #[serde(default)]
    format: Option<String>,
}

/// `copy_tabs_android` / `copy_tabs_ios`: fetch the live tab list.
pub struct CopyTabsTool {
    platform: Platform,
}

impl CopyTabsTool {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

const ANDROID_DESCRIPTION: &str = "Copy Chrome tabs from an Android device via ADB.\n\n\
Prerequisites:\n\
1. USB debugging enabled (Settings > Developer Options > USB Debugging)\n\
2. ADB installed and in PATH\n\
3. Chrome running on the device, connected over a data-capable USB cable\n\
4. Device unlocked and the USB debugging prompt accepted\n\n\
Common issues:\n\
- \"adb command not found\": brew install --cask android-platform-tools (macOS) \
or sudo apt install android-tools-adb (Linux)\n\
- \"device unauthorized\": tap \"Allow\" on the device's USB debugging prompt\n\
- \"connection refused\": restart ADB with 'adb kill-server && adb start-server'";

const IOS_DESCRIPTION: &str =
    "Copy Safari/Chrome tabs from an iOS device via ios_webkit_debug_proxy.\n\n\
Prerequisites:\n\
1. Web Inspector enabled (Settings > Safari > Advanced > Web Inspector)\n\
2. ios_webkit_debug_proxy installed and in PATH\n\
3. Device connected over USB, unlocked and trusting this computer\n\n\
Common issues:\n\
- \"ios_webkit_debug_proxy command not found\": brew install ios-webkit-debug-proxy\n\
- \"No targets found\": make sure the browser is running with open tabs";

#[async_trait]
impl Tool for CopyTabsTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = device_option_properties(self.platform == Platform::Android);
        properties["format"] = json!({
            "type": "string",
            "enum": ["json", "yaml"],
            "description": "Output format (default: json)"
        });
        let (name, description) = match self.platform {
            Platform::Android => ("copy_tabs_android", ANDROID_DESCRIPTION),
            Platform::Ios => ("copy_tabs_ios", IOS_DESCRIPTION),
        };
        ToolSchema {
            name,
            description,
            parameters: json!({
                "type": "object",
                "properties": properties
            }),
        }
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<ToolReply> {
        let args: CopyArgs = parse_args(params)?;
        let options = args.options.normalized();
        let format = OutputFormat::parse_or_default(args.format.as_deref());

        let budget = options.operation_budget();
        let tabs = ctx
            .with_device(self.platform, &options, budget, |source| async move {
                source.list().await
            })
            .await?;
        info!(platform = %self.platform, count = tabs.len(), "Copied tabs");

        let body = format.render_tabs(&tabs)?;
        Ok(ToolReply::text(format!(
            "Successfully copied {} tabs from {} device (format: {}):\n\n{}",
            tabs.len(),
            self.platform.display_name(),
            format,
            body
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{context, sample_tabs};
    use std::time::Duration;

    #[tokio::test]
    async fn test_copy_android_json() {
        let (ctx, devices) = context(sample_tabs());
        let reply = CopyTabsTool::new(Platform::Android)
            .execute(ctx, json!({"wait": 0}))
            .await
            .unwrap();
        assert!(!reply.is_error);
        assert!(reply
            .text
            .starts_with("Successfully copied 2 tabs from Android device (format: json)"));
        assert!(reply.text.contains("\"url\": \"https://go.dev/doc\""));
        assert_eq!(devices.starts(), 1);
        assert_eq!(devices.stops(), 1);
    }

    #[tokio::test]
    async fn test_copy_ios_yaml() {
        let (ctx, devices) = context(sample_tabs());
        let reply = CopyTabsTool::new(Platform::Ios)
            .execute(ctx, json!({"format": "yaml"}))
            .await
            .unwrap();
        assert!(reply.text.contains("from iOS device (format: yaml)"));
        assert!(reply.text.contains("- id: '1'"));
        assert_eq!(*devices.last_platform.lock().unwrap(), Some(Platform::Ios));
    }

    #[tokio::test]
    async fn test_copy_unknown_format_falls_back_to_json() {
        let (ctx, _) = context(sample_tabs());
        let reply = CopyTabsTool::new(Platform::Android)
            .execute(ctx, json!({"format": "xml"}))
            .await
            .unwrap();
        assert!(reply.text.contains("(format: json)"));
    }

    #[tokio::test]
    async fn test_copy_precondition_failure_propagates() {
        let (ctx, devices) = context(sample_tabs());
        devices.fail_start("no Android devices found");
        let err = CopyTabsTool::new(Platform::Android)
            .execute(ctx, Value::Null)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no Android devices found"));
        assert_eq!(devices.stops(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_copies_share_the_device_one_at_a_time() {
        let (ctx, devices) = context(sample_tabs());
        devices.hold_for(Duration::from_millis(50));
        let tool = CopyTabsTool::new(Platform::Android);
        let (a, b) = tokio::join!(
            tool.execute(ctx.clone(), json!({"wait": 0})),
            tool.execute(ctx.clone(), json!({"wait": 0})),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(devices.starts(), 2);
        assert_eq!(devices.stops(), 2);
        assert_eq!(devices.max_active(), 1);
    }

    #[tokio::test]
    async fn test_copies_on_different_ports_run_side_by_side() {
        let (ctx, devices) = context(sample_tabs());
        devices.hold_for(Duration::from_millis(50));
        let tool = CopyTabsTool::new(Platform::Android);
        let (a, b) = tokio::join!(
            tool.execute(ctx.clone(), json!({"wait": 0, "port": 9222})),
            tool.execute(ctx.clone(), json!({"wait": 0, "port": 9333})),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(devices.max_active(), 2);
    }

    #[test]
    fn test_ios_schema_has_no_adb_options() {
        let schema = CopyTabsTool::new(Platform::Ios).schema();
        assert_eq!(schema.name, "copy_tabs_ios");
        assert!(schema.parameters["properties"].get("socket").is_none());
        let schema = CopyTabsTool::new(Platform::Android).schema();
        assert!(schema.parameters["properties"].get("skipCleanup").is_some());
    }
}
