//! Stdio transport: reads JSON-RPC from stdin, writes to stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::protocol::ProtocolHandler;
use crate::session::SessionState;
use crate::types::{JsonRpcResponse, McpError, McpResult, RequestId};

use super::framing;

/// Stdio transport for desktop MCP clients.
///
/// Stdio is one client per process, so the transport owns a single session.
pub struct StdioTransport {
    handler: Arc<ProtocolHandler>,
    session: SessionState,
    cancel: CancellationToken,
}

impl StdioTransport {
    pub fn new(handler: Arc<ProtocolHandler>) -> Self {
        Self {
            handler,
            session: SessionState::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the loop (without error) when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Run the transport loop: reads from stdin, writes to stdout.
    pub async fn run(&self) -> McpResult<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.run_with(reader, writer).await
    }

    /// Run the loop over arbitrary streams.
    ///
    /// Each line is fully handled, response written and flushed, before the
    /// next line is read. Returns `Ok` on end of input or cancellation.
    pub async fn run_with<R, W>(&self, mut reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        tracing::info!("Stdio transport started");

        loop {
            buf.clear();
            let bytes_read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!("Cancelled, stopping stdio transport");
                    break;
                }
                read = reader.read_until(b'\n', &mut buf) => read.map_err(McpError::Io)?,
            };

            if bytes_read == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break;
            }

            let parsed = std::str::from_utf8(&buf)
                .map_err(|e| McpError::ParseError(e.to_string()))
                .and_then(|line| {
                    if line.trim().is_empty() {
                        Ok(None)
                    } else {
                        framing::parse_message(line).map(Some)
                    }
                });

            let response = match parsed {
                Ok(None) => continue,
                Ok(Some(request)) => {
                    self.handler
                        .handle_message(&self.session, request, &self.cancel)
                        .await
                }
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    Some(e.to_json_rpc_error(RequestId::Null))
                }
            };

            if let Some(response) = response {
                write_response(&mut writer, &response).await?;
            }
        }

        Ok(())
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    let framed = framing::frame_message(response)?;
    writer
        .write_all(framed.as_bytes())
        .await
        .map_err(McpError::Io)?;
    writer.flush().await.map_err(McpError::Io)?;
    Ok(())
}
