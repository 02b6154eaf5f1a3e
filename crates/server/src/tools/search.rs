use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tabrelay_core::{OutputFormat, Result};
use tabrelay_tabs::{SearchOutcome, SearchQuery};
use tracing::debug;

use crate::{parse_args, Tool, ToolContext, ToolReply, ToolSchema};

pub const NEVER_POPULATED_TEXT: &str =
    "No tabs are currently cached. Use refresh_tab_cache tool to populate cache first.";
pub const EMPTY_CACHE_TEXT: &str =
    "The tab cache is populated but the device had no open tabs at the last refresh.";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    #[serde(flatten)]
    query: SearchQuery,
    #[serde(default)]
    format: Option<String>,
}

pub struct SearchTabsTool;

#[async_trait]
impl Tool for SearchTabsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_tabs",
            description: "Search the cached tabs by title, URL or domain.\n\n\
Every given field must match (case-insensitive substring); results are ranked by relevance, \
best first. With no criteria every cached tab is listed. Searches the cache only, so run \
refresh_tab_cache first if the browser has changed.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Free text matched against title and URL"
                    },
                    "domain": {
                        "type": "string",
                        "description": "Only tabs whose URL contains this domain"
                    },
                    "title": {
                        "type": "string",
                        "description": "Only tabs whose title contains this text"
                    },
                    "url": {
                        "type": "string",
                        "description": "Only tabs whose URL contains this text"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results (default: 10)"
                    },
                    "format": {
                        "type": "string",
                        "enum": ["json", "yaml"],
                        "description": "Output format (default: json)"
                    }
                }
            }),
        }
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<ToolReply> {
        let args: SearchArgs = parse_args(params)?;
        let format = OutputFormat::parse_or_default(args.format.as_deref());

        let populated = ctx.cache.is_populated().await;
        let tabs = ctx.cache.snapshot().await;
        match SearchOutcome::evaluate(populated, &tabs, &args.query) {
            SearchOutcome::NeverPopulated => Ok(ToolReply::text(NEVER_POPULATED_TEXT)),
            SearchOutcome::EmptyCache => Ok(ToolReply::text(EMPTY_CACHE_TEXT)),
            SearchOutcome::Matches(results) => {
                debug!(cached = tabs.len(), matched = results.len(), "Searched tab cache");
                Ok(ToolReply::text(format!(
                    "🔍 Found {} tabs matching search criteria (format: {}):\n\n{}",
                    results.len(),
                    format,
                    format.render(&results)?
                )))
            }
        }
    }
}
