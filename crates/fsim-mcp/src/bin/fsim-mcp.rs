use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use fsim_core::SystemRunner;
use fsim_mcp::config::{Config, Transport};
use fsim_mcp::http::{self, AppState};
use fsim_mcp::prompts::PromptRegistry;
use fsim_mcp::server::McpServer;
use fsim_mcp::session::SessionRegistry;
use fsim_mcp::stdio;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging goes to stderr; stdout may carry the stdio protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    let runner = Arc::new(SystemRunner::new());
    let server = Arc::new(McpServer::new(runner));
    let prompts = Arc::new(PromptRegistry::new());

    eprintln!("Starting fsim MCP server...");
    for schema in server.tool_schemas() {
        eprintln!("  - {}: {}", schema.name, schema.description);
    }

    match config.transport {
        Transport::Stdio => {
            eprintln!("Listening for JSON-RPC requests on stdin...");
            stdio::serve(server, prompts).await
        }
        Transport::Http => {
            let state = AppState {
                server,
                prompts,
                sessions: Arc::new(SessionRegistry::new()),
            };
            http::serve(state, &config.host, config.port).await
        }
    }
}
