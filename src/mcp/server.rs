//! Server side: host a [`ToolProvider`] over a line-delimited stream.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info, warn};

use super::transport::LineTransport;
use super::types::*;
use crate::tools::{ToolError, ToolProvider};

/// Answer requests until the peer closes the stream.
pub async fn serve_provider<R, W>(
    provider: &dyn ToolProvider,
    reader: R,
    writer: W,
) -> Result<(), ToolError>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut transport = LineTransport::new(reader, writer);
    info!("Serving tool provider '{}'", provider.name());

    loop {
        let Some(line) = transport.read_line().await? else {
            break;
        };

        let message: Value = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Discarding malformed message: {}", e);
                transport
                    .write_message(&JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::PARSE_ERROR,
                        "Parse error",
                    ))
                    .await?;
                continue;
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                warn!("Ignoring message that is not a request: {}", e);
                continue;
            }
        };

        let Some(id) = request.id.clone() else {
            debug!("Notification {}", request.method);
            continue;
        };

        let response = match handle_request(provider, &request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::failure(id, code, message),
        };
        transport.write_message(&response).await?;
    }

    info!("Client closed the stream; stopping '{}'", provider.name());
    Ok(())
}

async fn handle_request(
    provider: &dyn ToolProvider,
    request: &JsonRpcRequest,
) -> Result<Value, (i64, String)> {
    match request.method.as_str() {
        METHOD_INITIALIZE => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {
                "name": provider.name(),
                "version": env!("CARGO_PKG_VERSION"),
            }
        })),
        METHOD_PING => Ok(json!({})),
        METHOD_LIST_TOOLS => {
            let tools = provider
                .list_tools()
                .await
                .map_err(|e| (JsonRpcError::INVALID_PARAMS, e.to_string()))?;
            Ok(json!({"tools": tools}))
        }
        METHOD_CALL_TOOL => {
            let params: CallToolParams = request
                .params
                .clone()
                .ok_or_else(|| "missing params".to_string())
                .and_then(|p| serde_json::from_value(p).map_err(|e| e.to_string()))
                .map_err(|e| (JsonRpcError::INVALID_PARAMS, e))?;

            debug!("tools/call {}", params.name);
            let result = match provider.call_tool(&params.name, params.arguments).await {
                Ok(payload) => CallToolResult::text(payload.to_string(), false),
                Err(e) => CallToolResult::text(e.to_string(), true),
            };
            serde_json::to_value(result).map_err(|e| (JsonRpcError::INVALID_PARAMS, e.to_string()))
        }
        other => Err((
            JsonRpcError::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    }
}
