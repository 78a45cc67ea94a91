use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fsim_core::exec::CommandRunner;
use fsim_core::flutter::FlutterCli;
use fsim_core::simctl::{SimulatorControl, default_screenshot_name};
use fsim_core::workflow::{Workflow, WorkflowRequest};
use fsim_core::{Error, Result};
use serde_json::{Value, json};

use crate::server::{Content, Tool, ToolSchema};

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::InvalidParams(format!("missing {key} parameter")))
}

fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

fn optional_path(params: &Value, key: &str) -> Option<PathBuf> {
    optional_str(params, key).map(PathBuf::from)
}

pub struct BuildKit {
    schema: ToolSchema,
    flutter: FlutterCli,
}

impl BuildKit {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            schema: ToolSchema {
                name: "build".to_string(),
                description: "Build the Flutter app for the iOS simulator".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "project_path": {
                            "type": "string",
                            "description": "Flutter project directory (defaults to the current directory)"
                        }
                    }
                }),
            },
            flutter: FlutterCli::new(runner),
        }
    }
}

#[async_trait]
impl Tool for BuildKit {
    async fn execute(&self, params: Value) -> Result<Vec<Content>> {
        let project = optional_path(&params, "project_path");
        let output = self.flutter.build(project.as_deref()).await?;
        Ok(vec![Content::text(output.combined())])
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }
}

pub struct ListDevicesKit {
    schema: ToolSchema,
    flutter: FlutterCli,
}

impl ListDevicesKit {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            schema: ToolSchema {
                name: "list_devices".to_string(),
                description: "List devices visible to the Flutter toolchain".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            flutter: FlutterCli::new(runner),
        }
    }
}

#[async_trait]
impl Tool for ListDevicesKit {
    async fn execute(&self, _params: Value) -> Result<Vec<Content>> {
        let listing = self.flutter.list_devices().await?;
        Ok(vec![Content::text(listing)])
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }
}

pub struct StartSimulatorKit {
    schema: ToolSchema,
    simulator: SimulatorControl,
}

impl StartSimulatorKit {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            schema: ToolSchema {
                name: "start_simulator".to_string(),
                description: "Boot an iOS simulator and wait until it is ready".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "device_id": {
                            "type": "string",
                            "description": "Simulator identifier (UUID from list_devices)"
                        }
                    },
                    "required": ["device_id"]
                }),
            },
            simulator: SimulatorControl::new(runner),
        }
    }
}

#[async_trait]
impl Tool for StartSimulatorKit {
    async fn execute(&self, params: Value) -> Result<Vec<Content>> {
        let device_id = required_str(&params, "device_id")?;
        self.simulator.ensure_booted(device_id).await?;
        Ok(vec![Content::text(format!("Simulator {device_id} is booted"))])
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }
}

pub struct InstallKit {
    schema: ToolSchema,
    simulator: SimulatorControl,
}

impl InstallKit {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            schema: ToolSchema {
                name: "install".to_string(),
                description: "Install the built app bundle on a simulator".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "device_id": {
                            "type": "string",
                            "description": "Simulator identifier"
                        },
                        "project_path": {
                            "type": "string",
                            "description": "Flutter project directory (defaults to the current directory)"
                        }
                    },
                    "required": ["device_id"]
                }),
            },
            simulator: SimulatorControl::new(runner),
        }
    }
}

#[async_trait]
impl Tool for InstallKit {
    async fn execute(&self, params: Value) -> Result<Vec<Content>> {
        let device_id = required_str(&params, "device_id")?;
        let project = optional_path(&params, "project_path");
        let app_path = FlutterCli::app_bundle_path(project.as_deref());

        let output = self.simulator.install(device_id, &app_path).await?;
        let text = if output.combined().trim().is_empty() {
            format!("Installed {} on {device_id}", app_path.display())
        } else {
            output.combined()
        };
        Ok(vec![Content::text(text)])
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }
}

pub struct LaunchKit {
    schema: ToolSchema,
    flutter: FlutterCli,
    simulator: SimulatorControl,
}

impl LaunchKit {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            schema: ToolSchema {
                name: "launch".to_string(),
                description: "Launch the installed app on a simulator".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "device_id": {
                            "type": "string",
                            "description": "Simulator identifier"
                        },
                        "project_path": {
                            "type": "string",
                            "description": "Flutter project directory (defaults to the current directory)"
                        }
                    },
                    "required": ["device_id"]
                }),
            },
            flutter: FlutterCli::new(runner.clone()),
            simulator: SimulatorControl::new(runner),
        }
    }
}

#[async_trait]
impl Tool for LaunchKit {
    async fn execute(&self, params: Value) -> Result<Vec<Content>> {
        let device_id = required_str(&params, "device_id")?;
        let project = optional_path(&params, "project_path");

        let bundle_id = self.flutter.bundle_id(project.as_deref()).await?;
        if !self.simulator.is_app_installed(device_id, &bundle_id).await {
            return Err(Error::Precondition(format!(
                "{bundle_id} is not installed on {device_id}; run install first"
            )));
        }

        self.simulator.launch(device_id, &bundle_id).await?;
        Ok(vec![Content::text(format!(
            "Launched {bundle_id} on {device_id}"
        ))])
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }
}

pub struct ScreenshotKit {
    schema: ToolSchema,
    simulator: SimulatorControl,
}

impl ScreenshotKit {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            schema: ToolSchema {
                name: "screenshot".to_string(),
                description: "Capture a PNG screenshot of the booted simulator".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "filename": {
                            "type": "string",
                            "description": "Screenshot filename (defaults to a timestamped name)"
                        },
                        "output_dir": {
                            "type": "string",
                            "description": "Directory to write the screenshot into (defaults to the current directory)"
                        }
                    }
                }),
            },
            simulator: SimulatorControl::new(runner),
        }
    }
}

#[async_trait]
impl Tool for ScreenshotKit {
    async fn execute(&self, params: Value) -> Result<Vec<Content>> {
        let filename = optional_str(&params, "filename")
            .map(str::to_string)
            .unwrap_or_else(default_screenshot_name);
        let path = match optional_path(&params, "output_dir") {
            Some(dir) => dir.join(filename),
            None => PathBuf::from(filename),
        };

        let bytes = self.simulator.screenshot(&path).await?;
        Ok(vec![
            Content::text(format!("Screenshot saved to {}", path.display())),
            Content::png(&bytes),
        ])
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }
}

pub struct FullWorkflowKit {
    schema: ToolSchema,
    workflow: Workflow,
}

impl FullWorkflowKit {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            schema: ToolSchema {
                name: "full_workflow".to_string(),
                description:
                    "Build, boot, install, launch and screenshot in one sequential run".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "device_id": {
                            "type": "string",
                            "description": "Simulator identifier; discovered from list_devices when omitted"
                        },
                        "project_path": {
                            "type": "string",
                            "description": "Flutter project directory (defaults to the current directory)"
                        },
                        "screenshot_name": {
                            "type": "string",
                            "description": "Filename for the final screenshot (defaults to a timestamped name)"
                        }
                    }
                }),
            },
            workflow: Workflow::new(runner),
        }
    }
}

#[async_trait]
impl Tool for FullWorkflowKit {
    async fn execute(&self, params: Value) -> Result<Vec<Content>> {
        let request = WorkflowRequest {
            device_id: optional_str(&params, "device_id").map(str::to_string),
            project_path: optional_path(&params, "project_path"),
            screenshot_name: optional_str(&params, "screenshot_name").map(str::to_string),
        };

        let report = self.workflow.run(request).await?;
        let image = Content::png(&report.screenshot);
        Ok(vec![Content::text(report.narrative()), image])
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }
}
