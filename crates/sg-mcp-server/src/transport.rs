//! Stdio transport (spec.md §1 deliberately excludes wire framing from the
//! core; this is the thin collaborator-side plumbing grounded in the
//! teacher's own `mcp/transport.rs`).

use crate::protocol::JsonRpcMessage;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

pub struct StdioTransport {
    rx: mpsc::UnboundedReceiver<JsonRpcMessage>,
}

impl StdioTransport {
    pub fn new() -> (Self, mpsc::UnboundedSender<JsonRpcMessage>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::read_loop(inbound_tx));
        tokio::spawn(Self::write_loop(outbound_rx));

        (Self { rx: inbound_rx }, outbound_tx)
    }

    async fn read_loop(tx: mpsc::UnboundedSender<JsonRpcMessage>) {
        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("stdin closed, shutting down");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<JsonRpcMessage>(trimmed) {
                        Ok(message) => {
                            if tx.send(message).is_err() {
                                error!("failed to hand off parsed message");
                                break;
                            }
                        }
                        Err(e) => error!("failed to parse JSON-RPC message: {e}"),
                    }
                }
                Err(e) => {
                    error!("error reading stdin: {e}");
                    break;
                }
            }
        }
    }

    async fn write_loop(mut rx: mpsc::UnboundedReceiver<JsonRpcMessage>) {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    debug!("sending: {json}");
                    if stdout.write_all(json.as_bytes()).await.is_err()
                        || stdout.write_all(b"\n").await.is_err()
                        || stdout.flush().await.is_err()
                    {
                        error!("failed to write to stdout");
                        break;
                    }
                }
                Err(e) => error!("failed to serialize message: {e}"),
            }
        }
    }

    pub async fn recv(&mut self) -> Option<JsonRpcMessage> {
        self.rx.recv().await
    }
}
