//! Read-only documents the host can pull without calling a tool.

use serde_json::{json, Value};
use tabrelay_core::{Error, OutputFormat, Result};
use tabrelay_tabs::TabCache;

pub const CURRENT_TABS_URI: &str = "tabs://current";

/// Descriptors in the shape `resources/list` returns.
pub fn resource_definitions() -> Vec<Value> {
    vec![json!({
        "uri": CURRENT_TABS_URI,
        "name": "current_tabs",
        "description": "Currently loaded tabs (YAML format)",
        "mimeType": OutputFormat::Yaml.mime_type()
    })]
}

/// Contents for `resources/read`. The cache is rendered as it stands; an
/// unpopulated cache reads as an empty list.
pub async fn read_resource(uri: &str, cache: &TabCache) -> Result<Value> {
    if uri != CURRENT_TABS_URI {
        return Err(Error::NotFound(format!("Unknown resource: {}", uri)));
    }
    let tabs = cache.snapshot().await;
    let text = OutputFormat::Yaml.render_tabs(&tabs)?;
    Ok(json!({
        "contents": [{
            "uri": CURRENT_TABS_URI,
            "mimeType": OutputFormat::Yaml.mime_type(),
            "text": text
        }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabrelay_core::{Platform, Tab};
    use tabrelay_devices::TabSource;

    use crate::tools::testing::context;

    #[tokio::test]
    async fn test_current_tabs_as_yaml() {
        let (ctx, devices) = context(vec![Tab::new("1", "GitHub", "https://github.com/x")]);
        ctx.cache
            .refresh(devices.as_ref() as &dyn TabSource, Platform::Android)
            .await
            .unwrap();

        let value = read_resource(CURRENT_TABS_URI, &ctx.cache).await.unwrap();
        let content = &value["contents"][0];
        assert_eq!(content["mimeType"], "application/x-yaml");
        let text = content["text"].as_str().unwrap();
        assert!(text.contains("id: '1'"));
        assert!(text.contains("url: https://github.com/x"));
    }

    #[tokio::test]
    async fn test_unpopulated_cache_reads_empty_list() {
        let (ctx, _) = context(vec![]);
        let value = read_resource(CURRENT_TABS_URI, &ctx.cache).await.unwrap();
        assert_eq!(value["contents"][0]["text"].as_str().unwrap().trim(), "[]");
    }

    #[tokio::test]
    async fn test_unknown_uri() {
        let (ctx, _) = context(vec![]);
        let err = read_resource("tabs://history", &ctx.cache).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_definitions() {
        let defs = resource_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0]["name"], "current_tabs");
    }
}
