//! Line-delimited JSON-RPC framing over any async reader/writer pair.

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use super::types::{JsonRpcRequest, JsonRpcResponse};
use crate::tools::ToolError;

/// One JSON message per line in each direction.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    next_id: u64,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            next_id: 1,
        }
    }

    /// Write one message followed by a newline.
    pub async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<(), ToolError> {
        let mut line = serde_json::to_string(message)?;
        trace!("-> {}", line);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read the next non-blank line. `None` at end of stream.
    pub async fn read_line(&mut self) -> Result<Option<String>, ToolError> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            trace!("<- {}", line);
            return Ok(Some(line.to_string()));
        }
    }

    /// Read the next non-blank line as JSON. `None` at end of stream.
    pub async fn read_message(&mut self) -> Result<Option<Value>, ToolError> {
        match self.read_line().await? {
            Some(line) => Ok(Some(serde_json::from_str(&line)?)),
            None => Ok(None),
        }
    }

    /// Send a request and wait for the response carrying its id. Messages
    /// with other ids, and server notifications, are skipped.
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, ToolError> {
        let id = self.next_id;
        self.next_id += 1;

        debug!("JSON-RPC request {} ({})", method, id);
        self.write_message(&JsonRpcRequest::new(id, method, params))
            .await?;

        loop {
            let message = self
                .read_message()
                .await?
                .ok_or_else(|| ToolError::transport("connection closed before response"))?;

            if message.get("id").and_then(Value::as_u64) != Some(id) {
                debug!("Skipping unrelated message while waiting for {}", id);
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(message)?;
            return response.into_result().map_err(|e| ToolError::Server {
                code: e.code,
                message: e.message,
            });
        }
    }

    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), ToolError> {
        self.write_message(&JsonRpcRequest::notification(method, params))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_request_skips_unrelated_lines() {
        let (client_end, server_end) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_end);
        let (server_read, mut server_write) = tokio::io::split(server_end);

        let server = tokio::spawn(async move {
            let mut reader = BufReader::new(server_read);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let req: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(req["method"], "tools/list");
            let replies = [
                json!({"jsonrpc": "2.0", "method": "notifications/progress"}).to_string(),
                String::new(),
                json!({"jsonrpc": "2.0", "id": 99, "result": {}}).to_string(),
                json!({"jsonrpc": "2.0", "id": req["id"], "result": {"tools": []}}).to_string(),
            ];
            for reply in replies {
                server_write
                    .write_all(format!("{reply}\n").as_bytes())
                    .await
                    .unwrap();
            }
        });

        let mut transport = LineTransport::new(BufReader::new(client_read), client_write);
        let result = transport.request("tools/list", None).await.unwrap();
        assert_eq!(result, json!({"tools": []}));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_response_maps_to_server_error() {
        let (client_end, server_end) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_end);
        let (_server_read, mut server_write) = tokio::io::split(server_end);

        server_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"error\":{\"code\":-32601,\"message\":\"Method not found\"}}\n")
            .await
            .unwrap();

        let mut transport = LineTransport::new(BufReader::new(client_read), client_write);
        let err = transport.request("bogus", None).await.unwrap_err();
        assert!(matches!(err, ToolError::Server { code: -32601, .. }));
    }

    #[tokio::test]
    async fn test_closed_stream_is_transport_error() {
        let (client_end, server_end) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_end);
        drop(server_end);

        let mut transport = LineTransport::new(BufReader::new(client_read), client_write);
        let err = transport.request("tools/list", None).await.unwrap_err();
        assert!(matches!(err, ToolError::Transport(_)));
    }
}
