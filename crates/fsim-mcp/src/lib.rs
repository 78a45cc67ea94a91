pub mod config;
pub mod http;
pub mod prompts;
pub mod rpc;
pub mod server;
pub mod session;
pub mod stdio;
pub mod tools;

pub use server::{Content, McpServer, Tool, ToolResponse, ToolSchema};
