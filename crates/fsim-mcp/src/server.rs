use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use fsim_core::{CommandRunner, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools;

/// One block of a tool response payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn png(bytes: &[u8]) -> Self {
        Content::Image {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: "image/png".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub content: Vec<Content>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

#[async_trait]
pub trait Tool: Send + Sync {
    async fn execute(&self, params: Value) -> Result<Vec<Content>>;
    fn schema(&self) -> &ToolSchema;
}

#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Registry of the Flutter/simulator tool kits.
pub struct McpServer {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl McpServer {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let mut server = Self {
            tools: HashMap::new(),
        };

        server.register(Arc::new(tools::BuildKit::new(runner.clone())));
        server.register(Arc::new(tools::ListDevicesKit::new(runner.clone())));
        server.register(Arc::new(tools::StartSimulatorKit::new(runner.clone())));
        server.register(Arc::new(tools::InstallKit::new(runner.clone())));
        server.register(Arc::new(tools::LaunchKit::new(runner.clone())));
        server.register(Arc::new(tools::ScreenshotKit::new(runner.clone())));
        server.register(Arc::new(tools::FullWorkflowKit::new(runner)));

        server
    }

    fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.schema().name.clone(), tool);
    }

    /// Tool schemas in a stable order for `tools/list`.
    pub fn tool_schemas(&self) -> Vec<&ToolSchema> {
        let mut schemas: Vec<&ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Executes a tool. This is the terminal error boundary: any failure is
    /// reframed as a response payload with the error flag set, never raised
    /// to the transport.
    pub async fn call_tool(&self, name: &str, params: Value) -> ToolResponse {
        let Some(tool) = self.tools.get(name) else {
            return ToolResponse {
                content: vec![Content::text(format!("Unknown tool: {name}"))],
                is_error: true,
            };
        };

        match tool.execute(params).await {
            Ok(content) => ToolResponse {
                content,
                is_error: false,
            },
            Err(e) => {
                tracing::debug!(tool = name, error = %e, "tool call failed");
                ToolResponse {
                    content: vec![Content::text(e.to_string())],
                    is_error: true,
                }
            }
        }
    }
}
