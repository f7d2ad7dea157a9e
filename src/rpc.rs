use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::handlers;
use crate::kimai::KimaiApi;
use crate::tools;

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// One JSON-RPC 2.0 frame; a missing `id` marks it as a notification.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default = "empty_object")]
    arguments: Value,
}

fn empty_object() -> Value {
    json!({})
}

/// Serves MCP over line-delimited JSON-RPC.
///
/// Reads one request per line, writes one response line per request;
/// notifications produce no output. A failing tool call is still a
/// successful JSON-RPC response, so the loop only ends when the input
/// stream closes.
pub async fn serve<R, W>(reader: R, mut writer: W, client: &dyn KimaiApi) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("kimai-mcp listening on stdio");

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_line(&line, client).await {
            writer
                .write_all(response.to_string().as_bytes())
                .await
                .context("Failed to write response")?;
            writer.write_all(b"\n").await.context("Failed to write response")?;
            writer.flush().await.context("Failed to flush stdout")?;
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}

/// Handles one raw frame; returns the response document, or `None` for
/// notifications.
async fn handle_line(line: &str, client: &dyn KimaiApi) -> Option<Value> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(_) => return Some(error_response(Value::Null, PARSE_ERROR, "Parse error")),
    };
    if request.jsonrpc != "2.0" {
        let id = request.id.unwrap_or(Value::Null);
        return Some(error_response(id, INVALID_REQUEST, "Invalid request"));
    }

    let id = match request.id {
        Some(id) => id,
        None => {
            // Notifications (e.g. notifications/initialized) are acknowledged
            // by silence.
            debug!("notification: {}", request.method);
            return None;
        }
    };

    Some(match request.method.as_str() {
        "initialize" => result_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    }
                },
                "serverInfo": {
                    "name": "kimai-mcp",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "ping" => result_response(id, json!({})),
        "tools/list" => result_response(id, json!({ "tools": tools::tool_catalog() })),
        "tools/call" => match serde_json::from_value::<ToolCallParams>(request.params) {
            Ok(params) => {
                let text = handlers::call_tool(&params.name, params.arguments, client).await;
                let is_error = handlers::is_error_text(&text);
                result_response(
                    id,
                    json!({
                        "content": [{"type": "text", "text": text}],
                        "isError": is_error
                    }),
                )
            }
            Err(err) => error_response(
                id,
                INVALID_PARAMS,
                &format!("Invalid params for tools/call: {}", err),
            ),
        },
        _ => error_response(id, METHOD_NOT_FOUND, "Method not found"),
    })
}

fn result_response(id: Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn error_response(id: Value, code: i32, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}
