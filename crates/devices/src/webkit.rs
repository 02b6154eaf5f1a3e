//! Tab source for iOS Safari/Chrome reached through ios_webkit_debug_proxy.
//!
//! Listing uses the proxy's HTTP `/json` endpoint. The proxy has no
//! `/json/new`, so opening a tab evaluates `window.open(...)` in an existing
//! page over its inspector WebSocket.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tabrelay_core::{Error, Result, Tab};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::cdp::{CdpHttpClient, WEBKIT_LIST_PATH};
use crate::source::TabSource;

pub struct WebKitSource {
    http: CdpHttpClient,
    timeout: Duration,
}

impl WebKitSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: CdpHttpClient::new(base_url, WEBKIT_LIST_PATH, timeout)?,
            timeout,
        })
    }

    async fn evaluate_in_page(&self, expression: &str) -> Result<Value> {
        let targets = self.http.list().await?;
        let target = pick_page_target(&targets).ok_or_else(|| {
            Error::NotFound("no suitable target page found on the device".to_string())
        })?;
        let ws_url = page_socket_url(self.http.base_url(), &target.id)?;
        debug!(ws_url = %ws_url, "Evaluating in page");

        tokio::time::timeout(self.timeout, evaluate(&ws_url, expression))
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "no reply from {} after {}s",
                    ws_url,
                    self.timeout.as_secs()
                ))
            })?
    }
}

/// First page-like target; the inspector needs a live page to run script in.
pub fn pick_page_target(targets: &[Tab]) -> Option<&Tab> {
    targets.iter().find(|t| t.is_page())
}

pub fn page_socket_url(base_url: &str, target_id: &str) -> Result<String> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| Error::Config(format!("invalid base URL {}: {}", base_url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::Config(format!("base URL {} has no host", base_url)))?;
    let authority = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Ok(format!("ws://{}/devtools/page/{}", authority, target_id))
}

/// JSON string literals are valid JavaScript string literals.
pub fn open_expression(url: &str) -> String {
    format!("window.open({});", Value::String(url.to_string()))
}

async fn evaluate(ws_url: &str, expression: &str) -> Result<Value> {
    let (mut ws, _) = connect_async(ws_url)
        .await
        .map_err(|e| Error::Transport(format!("failed to connect to {}: {}", ws_url, e)))?;

    let command = json!({
        "id": 1,
        "method": "Runtime.evaluate",
        "params": { "expression": expression, "returnByValue": true },
    });
    ws.send(Message::Text(command.to_string()))
        .await
        .map_err(|e| Error::Transport(format!("failed to send to {}: {}", ws_url, e)))?;

    let reply = loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                let Ok(val) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                // Events carry no id; keep reading until our reply arrives.
                if val.get("id").and_then(|v| v.as_u64()) == Some(1) {
                    break val;
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(Error::Transport(format!("{} closed before replying", ws_url)));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(Error::Transport(format!("read error on {}: {}", ws_url, e)));
            }
        }
    };
    let _ = ws.close(None).await;

    if let Some(err) = reply.get("error") {
        return Err(Error::Transport(format!("inspector error: {}", err)));
    }
    Ok(reply.get("result").cloned().unwrap_or(Value::Null))
}

#[async_trait]
impl TabSource for WebKitSource {
    async fn list(&self) -> Result<Vec<Tab>> {
        self.http.list().await
    }

    async fn open(&self, url: &str) -> Result<()> {
        self.evaluate_in_page(&open_expression(url)).await?;
        Ok(())
    }

    async fn close(&self, id: &str) -> Result<()> {
        Err(Error::Unsupported(format!(
            "closing tab {} is not supported through ios_webkit_debug_proxy",
            id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_page_target_skips_workers() {
        let targets = vec![
            Tab::new("w", "", "").with_kind("service_worker"),
            Tab::new("p1", "First", "https://a"),
            Tab::new("p2", "Second", "https://b").with_kind("page"),
        ];
        assert_eq!(pick_page_target(&targets).unwrap().id, "p1");
        assert!(pick_page_target(&[]).is_none());
    }

    #[test]
    fn test_page_socket_url() {
        assert_eq!(
            page_socket_url("http://localhost:9222", "page-3").unwrap(),
            "ws://localhost:9222/devtools/page/page-3"
        );
        assert!(page_socket_url("not a url", "x").is_err());
    }

    #[test]
    fn test_open_expression_escapes_quotes() {
        assert_eq!(
            open_expression("https://x.dev/?q='a'\"b\""),
            r#"window.open("https://x.dev/?q='a'\"b\"");"#
        );
    }

    #[tokio::test]
    async fn test_close_is_unsupported() {
        let source = WebKitSource::new("http://localhost:9", Duration::from_secs(1)).unwrap();
        assert!(matches!(source.close("1").await, Err(Error::Unsupported(_))));
    }
}
