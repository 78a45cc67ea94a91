use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::prompts::PromptRegistry;
use crate::rpc::{self, JsonRpcRequest, JsonRpcResponse};
use crate::server::McpServer;

/// Line-oriented JSON-RPC loop over stdin/stdout. Diagnostics go to stderr;
/// stdout carries protocol frames only.
pub async fn serve(server: Arc<McpServer>, prompts: Arc<PromptRegistry>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                let response =
                    JsonRpcResponse::error(None, rpc::PARSE_ERROR, format!("Parse error: {e}"));
                writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
                stdout.flush()?;
                continue;
            }
        };

        if let Some(response) = rpc::dispatch(&server, &prompts, request).await {
            writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
