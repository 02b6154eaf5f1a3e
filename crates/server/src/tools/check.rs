use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tabrelay_core::Result;
use tabrelay_devices::probe::{diagnose, PlatformFilter};

use crate::{parse_args, Tool, ToolContext, ToolReply, ToolSchema};

#[derive(Debug, Default, Deserialize)]
struct CheckArgs {
    #[serde(default)]
    platform: Option<String>,
}

impl CheckArgs {
    fn filter(&self) -> Result<PlatformFilter> {
        self.platform.as_deref().unwrap_or("all").parse()
    }
}

pub struct CheckEnvironmentTool;

#[async_trait]
impl Tool for CheckEnvironmentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "check_environment",
            description: "Check system dependencies and device connectivity.\n\n\
Verifies the ADB installation, the ios_webkit_debug_proxy installation, and Android device \
authorization. Run this first when a copy or reopen fails; the report includes install \
commands and troubleshooting steps for anything missing.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "platform": {
                        "type": "string",
                        "enum": ["all", "android", "ios"],
                        "description": "Platform to check (default: all)"
                    }
                }
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        let args: CheckArgs = parse_args(params.clone())?;
        args.filter().map(|_| ())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<ToolReply> {
        let args: CheckArgs = parse_args(params)?;
        let report = diagnose(&ctx.config, args.filter()?).await;
        Ok(ToolReply::text(report.render()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_platform_filter() {
        assert!(CheckEnvironmentTool.validate(&json!({})).is_ok());
        assert!(CheckEnvironmentTool.validate(&json!({"platform": "ios"})).is_ok());
        assert!(CheckEnvironmentTool.validate(&json!({"platform": "palm"})).is_err());
    }

    #[tokio::test]
    async fn test_check_reports_missing_proxy() {
        let (mut ctx, _) = crate::tools::testing::context(vec![]);
        ctx.config.proxy_path = Some("/nonexistent/ios_webkit_debug_proxy".into());
        // Only meaningful where the proxy is genuinely absent from PATH.
        if which_proxy_installed() {
            return;
        }
        let reply = CheckEnvironmentTool
            .execute(ctx, json!({"platform": "ios"}))
            .await
            .unwrap();
        assert!(reply.text.starts_with("Environment Check Results:"));
        assert!(reply.text.contains("❌ iOS WebKit Debug Proxy"));
        assert!(reply.text.contains("ℹ️ iOS Device"));
        assert!(!reply.text.contains("ADB"));
    }

    fn which_proxy_installed() -> bool {
        ["/opt/homebrew/bin/ios_webkit_debug_proxy", "/usr/local/bin/ios_webkit_debug_proxy"]
            .iter()
            .any(|p| std::path::Path::new(p).exists())
            || std::env::var_os("PATH")
                .map(|paths| {
                    std::env::split_paths(&paths).any(|d| d.join("ios_webkit_debug_proxy").exists())
                })
                .unwrap_or(false)
    }
}
