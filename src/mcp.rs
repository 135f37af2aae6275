//! MCP (Model Context Protocol) JSON-RPC handler.
//!
//! Implements the [MCP specification](https://spec.modelcontextprotocol.io/)
//! over stdio: reads JSON-RPC 2.0 requests from stdin (one per line) and
//! writes responses to stdout. Requests are handled one at a time, in order.
//!
//! ## Supported methods
//!
//! | Method              | Description                      |
//! |---------------------|----------------------------------|
//! | `initialize`        | Handshake, returns capabilities  |
//! | `tools/list`        | List available tool definitions  |
//! | `tools/call`        | Execute a tool and return result |
//! | `ping`              | Liveness check                   |
//!
//! Notifications (`notifications/initialized`, `notifications/cancelled`) are
//! acknowledged silently. Cancellation is not honoured.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

use crate::client::Connector;
use crate::cluster::ClusterAdapter;
use crate::tools;

const SERVER_NAME: &str = "talos-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Run the MCP server on stdio, processing JSON-RPC requests until EOF.
pub async fn run_stdio<C: Connector>(cluster: ClusterAdapter<C>) {
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    serve(reader, tokio::io::stdout(), cluster).await;
}

/// Serve JSON-RPC lines from `reader`, writing responses to `writer`.
pub async fn serve<R, W, C>(mut reader: R, mut writer: W, mut cluster: ClusterAdapter<C>)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Connector,
{
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                error!("stdin read error: {}", e);
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                let response = error_response(Value::Null, PARSE_ERROR, format!("Parse error: {}", e));
                write_response(&mut writer, &response).await;
                continue;
            }
        };

        let id = request.get("id").cloned();
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");

        // Notifications (no id) are acknowledged silently
        let Some(id) = id else {
            match method {
                "notifications/initialized" | "notifications/cancelled" => {}
                _ => warn!("unknown notification: {}", method),
            }
            continue;
        };

        debug!("request {id}: {method}");
        let response = match method {
            "initialize" => result_response(id, handle_initialize()),
            "tools/list" => result_response(id, json!({ "tools": tools::tool_definitions() })),
            "tools/call" => handle_tools_call(id, &request, &mut cluster).await,
            "ping" => result_response(id, json!({})),
            _ => error_response(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ),
        };

        write_response(&mut writer, &response).await;
    }
}

/// Handle `initialize`: return protocol version, capabilities, and server info.
fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}

/// Handle `tools/call`: dispatch to the tool handler.
async fn handle_tools_call<C: Connector>(
    id: Value,
    request: &Value,
    cluster: &mut ClusterAdapter<C>,
) -> Value {
    let params = request.get("params").cloned().unwrap_or(json!({}));
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return error_response(id, INVALID_PARAMS, "Missing tool name".into());
    };
    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    let result = tools::handle_tool_call(name, &args, cluster).await;

    let mut response_result = json!({
        "content": result.content
    });
    if result.is_error {
        response_result["isError"] = json!(true);
    }
    result_response(id, response_result)
}

fn result_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

/// Write a JSON-RPC response (one line, flushed immediately).
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Value) {
    let mut output = serde_json::to_string(response).unwrap_or_default();
    output.push('\n');
    if let Err(e) = writer.write_all(output.as_bytes()).await {
        error!("stdout write error: {}", e);
    }
    if let Err(e) = writer.flush().await {
        error!("stdout flush error: {}", e);
    }
}
