//! Newline-delimited JSON-RPC 2.0 over stdio, speaking the MCP method set.

use std::sync::Arc;

use serde_json::{json, Value};
use tabrelay_core::{Error, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::resources::{read_resource, resource_definitions};
use crate::rpc::{
    JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::warmup::start_warmup;
use crate::{ToolContext, ToolRegistry};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "tabrelay";

pub struct McpServer {
    registry: ToolRegistry,
    ctx: ToolContext,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, ctx: ToolContext) -> Self {
        Self { registry, ctx }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Handle one raw line. `None` means nothing should be written back.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(line) {
            Ok(msg) => self.handle_message(msg).await,
            Err(e) => {
                debug!(error = %e, "Unparsable request line");
                Some(to_value(JsonRpcResponse::failure(Value::Null, PARSE_ERROR, "Parse error")))
            }
        }
    }

    pub async fn handle_message(&self, msg: Value) -> Option<Value> {
        let id_hint = msg.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(msg) {
            Ok(r) => r,
            Err(e) => {
                let id = id_hint?;
                return Some(to_value(JsonRpcResponse::failure(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                )));
            }
        };

        if request.is_notification() || request.method.starts_with("notifications/") {
            debug!(method = %request.method, "Notification");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match self.dispatch(&request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::failure(id, code, message),
        };
        Some(to_value(response))
    }

    async fn dispatch(
        &self,
        request: &JsonRpcRequest,
    ) -> std::result::Result<Value, (i64, String)> {
        match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "resources": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.tool_definitions() })),
            "tools/call" => {
                let name = request
                    .params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or((INVALID_PARAMS, "Missing tool name".to_string()))?;
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or_else(|| json!({}));
                Ok(self.call_tool(name, arguments).await)
            }
            "resources/list" => Ok(json!({ "resources": resource_definitions() })),
            "resources/read" => {
                let uri = request
                    .params
                    .get("uri")
                    .and_then(|v| v.as_str())
                    .ok_or((INVALID_PARAMS, "Missing resource uri".to_string()))?;
                read_resource(uri, &self.ctx.cache)
                    .await
                    .map_err(|e| (INVALID_PARAMS, e.to_string()))
            }
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {}", other))),
        }
    }

    /// Tool failures are results, not protocol errors.
    async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        let outcome = self.registry.execute(name, self.ctx.clone(), arguments).await;
        let (text, is_error) = match outcome {
            Ok(reply) => (reply.text, reply.is_error),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                (e.to_string(), true)
            }
        };
        json!({
            "content": [{ "type": "text", "text": text }],
            "isError": is_error
        })
    }

    /// Serve until `reader` hits EOF. Each request runs on its own task;
    /// replies go out through a single writer, one JSON document per line.
    /// A line that is not UTF-8 gets a parse error like any other bad line.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(response) = rx.recv().await {
                let mut line = response.to_string();
                line.push('\n');
                writer.write_all(line.as_bytes()).await?;
                writer.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let mut reader = reader;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = match std::str::from_utf8(&buf) {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    debug!(error = %e, "Request line is not valid UTF-8");
                    let _ = tx.send(to_value(JsonRpcResponse::failure(
                        Value::Null,
                        PARSE_ERROR,
                        "Parse error",
                    )));
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_line(&line).await {
                    let _ = tx.send(response);
                }
            });
        }
        drop(tx);
        info!("Input closed, draining in-flight requests");

        writer_task
            .await
            .map_err(|e| Error::Other(format!("writer task failed: {}", e)))??;
        Ok(())
    }

    /// Start the cache warm-up and serve on the process's stdin/stdout.
    pub async fn serve_stdio(self) -> Result<()> {
        let server = Arc::new(self);
        info!(tools = server.registry.tool_names().len(), "MCP server ready on stdio");
        start_warmup(server.ctx.clone());
        server
            .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

fn to_value(response: JsonRpcResponse) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}
