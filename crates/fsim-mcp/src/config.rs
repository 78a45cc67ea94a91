use clap::{Parser, ValueEnum};

/// Server configuration. Precedence is CLI flag, then environment variable,
/// then the built-in default.
#[derive(Debug, Parser)]
#[command(name = "fsim-mcp", version, about = "MCP server for Flutter iOS simulator workflows")]
pub struct Config {
    /// Transport to serve on.
    #[arg(long, value_enum, env = "FSIM_TRANSPORT", default_value = "stdio")]
    pub transport: Transport,

    /// Bind address for the HTTP transport. 0.0.0.0 exposes it remotely.
    #[arg(long, env = "FSIM_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port for the HTTP transport.
    #[arg(long, env = "FSIM_PORT", default_value_t = 3001)]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Stdio,
    Http,
}
