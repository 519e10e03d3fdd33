use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::handlers;
use crate::mythic::MythicApi;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// Maximum bytes per JSON-RPC message (1 MiB).
const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// MCP server that communicates over stdio using newline-delimited JSON-RPC 2.0.
///
/// Owns the authenticated Mythic handle for the process lifetime; every tool
/// call borrows it.
pub struct McpServer<A: MythicApi> {
    api: A,
    initialized: bool,
}

impl<A: MythicApi> McpServer<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            initialized: false,
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut raw = Vec::new();

        loop {
            let line = read_bounded_line(&mut reader, &mut raw, MAX_MESSAGE_BYTES).await?;
            if line == Line::Eof {
                debug!("stdin closed, shutting down");
                break;
            }

            if line == Line::TooLarge {
                warn!("Message too large (limit {MAX_MESSAGE_BYTES} bytes)");
                write_response(
                    &mut stdout,
                    &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                ).await?;
                continue;
            }

            let trimmed = match std::str::from_utf8(&raw) {
                Ok(s) => s.trim(),
                Err(_) => {
                    write_response(
                        &mut stdout,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    ).await?;
                    continue;
                }
            };

            if trimmed.is_empty() {
                continue;
            }

            let req: JsonRpcRequest = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    warn!("Parse error: {e}");
                    write_response(
                        &mut stdout,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    ).await?;
                    continue;
                }
            };

            if let Some(resp) = self.handle(&req).await {
                write_response(&mut stdout, &resp).await?;
            }
        }

        Ok(())
    }

    /// Apply the version check and initialization gate, then dispatch.
    pub async fn handle(&mut self, req: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        if req.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_request(),
            ));
        }

        // Only `initialize` is allowed before the handshake completes
        if !self.initialized && req.method != "initialize" {
            if req.id.is_none() {
                return None;
            }
            return Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_request_with("Server not initialized"),
            ));
        }

        debug!(method = %req.method, "request");
        let resp = handlers::dispatch(req, &self.api).await;

        if req.method == "initialize" {
            self.initialized = true;
        }
        resp
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Eof,
    Complete,
    TooLarge,
}

/// Read one newline-terminated message into `raw`, holding at most
/// `limit + 1` bytes. The rest of an oversized line is consumed and dropped.
async fn read_bounded_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    raw: &mut Vec<u8>,
    limit: usize,
) -> std::io::Result<Line> {
    raw.clear();
    let n = (&mut *reader)
        .take(limit as u64 + 1)
        .read_until(b'\n', raw)
        .await?;
    if n == 0 {
        return Ok(Line::Eof);
    }
    if n <= limit {
        return Ok(Line::Complete);
    }

    if raw.last() != Some(&b'\n') {
        loop {
            let buf = reader.fill_buf().await?;
            if buf.is_empty() {
                break;
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    reader.consume(i + 1);
                    break;
                }
                None => {
                    let len = buf.len();
                    reader.consume(len);
                }
            }
        }
    }
    raw.clear();
    Ok(Line::TooLarge)
}

async fn write_response(
    stdout: &mut tokio::io::Stdout,
    resp: &JsonRpcResponse,
) -> Result<(), Box<dyn std::error::Error>> {
    let out = serde_json::to_string(resp)?;
    stdout.write_all(out.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_line_is_dropped_without_losing_the_next() {
        let input = format!("{}\n{{\"jsonrpc\":\"2.0\"}}\n", "x".repeat(64));
        let mut reader = input.as_bytes();
        let mut raw = Vec::new();

        assert_eq!(read_bounded_line(&mut reader, &mut raw, 32).await.unwrap(), Line::TooLarge);

        assert_eq!(read_bounded_line(&mut reader, &mut raw, 32).await.unwrap(), Line::Complete);
        assert_eq!(raw, b"{\"jsonrpc\":\"2.0\"}\n");

        assert_eq!(read_bounded_line(&mut reader, &mut raw, 32).await.unwrap(), Line::Eof);
    }

    #[tokio::test]
    async fn line_at_the_limit_is_accepted() {
        let mut reader: &[u8] = b"0123456789abcdef";
        let mut raw = Vec::new();

        assert_eq!(read_bounded_line(&mut reader, &mut raw, 16).await.unwrap(), Line::Complete);
        assert_eq!(raw.len(), 16);
    }
}
