use std::path::PathBuf;
use std::sync::Arc;

use crate::Error;
use crate::exec::CommandRunner;
use crate::flutter::FlutterCli;
use crate::simctl::{SimulatorControl, default_screenshot_name};

/// Append-only narrative of one workflow invocation.
#[derive(Debug, Default)]
pub struct StepLog {
    entries: Vec<String>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// Appends a stage's initiating line and returns its index, so a failure
    /// report can name the in-progress stage without peeking at the log tail.
    fn begin(&mut self, entry: impl Into<String>) -> usize {
        self.entries.push(entry.into());
        self.entries.len() - 1
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

/// Caller-facing parameters of the full workflow.
#[derive(Debug, Default, Clone)]
pub struct WorkflowRequest {
    pub device_id: Option<String>,
    pub project_path: Option<PathBuf>,
    pub screenshot_name: Option<String>,
}

/// Successful run: the complete step log plus the captured screenshot.
#[derive(Debug)]
pub struct WorkflowReport {
    pub log: Vec<String>,
    pub screenshot_path: PathBuf,
    pub screenshot: Vec<u8>,
}

impl WorkflowReport {
    pub fn narrative(&self) -> String {
        self.log.join("\n")
    }
}

/// Failure report: the stage in progress, the underlying error, and the log
/// lines completed before that stage began. Best-effort diagnostics only --
/// nothing that already happened is rolled back.
#[derive(Debug)]
pub struct WorkflowError {
    pub step: String,
    pub completed: Vec<String>,
    pub source: Error,
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Workflow failed at: {}", self.step)?;
        writeln!(f, "Error: {}", self.source)?;
        if self.completed.is_empty() {
            write!(f, "Completed steps: none")
        } else {
            write!(f, "Completed steps:")?;
            for line in &self.completed {
                write!(f, "\n  {line}")?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Sequential six-stage workflow: build, device resolution, simulator start,
/// install check, launch, screenshot. A failure at any stage halts the run
/// immediately; there are no stage retries beyond the boot poller's own loop.
pub struct Workflow {
    flutter: FlutterCli,
    simulator: SimulatorControl,
}

impl Workflow {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            flutter: FlutterCli::new(runner.clone()),
            simulator: SimulatorControl::new(runner),
        }
    }

    pub async fn run(
        &self,
        request: WorkflowRequest,
    ) -> std::result::Result<WorkflowReport, WorkflowError> {
        let mut log = StepLog::new();
        let project = request.project_path.as_deref();

        let mark = log.begin("Building Flutter app...");
        self.flutter
            .build(project)
            .await
            .map_err(|e| stage_error(&log, mark, e))?;
        log.push("✓ Build complete");

        let device_id = match request.device_id {
            Some(id) => {
                log.push(format!("✓ Using device {id} (provided)"));
                id
            }
            None => {
                let mark = log.begin("Finding iOS simulator...");
                let id = self
                    .flutter
                    .find_simulator()
                    .await
                    .map_err(|e| stage_error(&log, mark, e))?;
                log.push(format!("✓ Using device {id}"));
                id
            }
        };

        let mark = log.begin(format!("Starting simulator {device_id}..."));
        self.simulator
            .ensure_booted(&device_id)
            .await
            .map_err(|e| stage_error(&log, mark, e))?;
        log.push("✓ Simulator booted");

        let mark = log.begin("Checking if app is installed...");
        let bundle_id = self
            .flutter
            .bundle_id(project)
            .await
            .map_err(|e| stage_error(&log, mark, e))?;
        if self.simulator.is_app_installed(&device_id, &bundle_id).await {
            log.push("✓ App already installed");
        } else {
            let mark = log.begin("Installing app...");
            let app_path = FlutterCli::app_bundle_path(project);
            self.simulator
                .install(&device_id, &app_path)
                .await
                .map_err(|e| stage_error(&log, mark, e))?;
            log.push("✓ App installed");
        }

        let mark = log.begin(format!("Launching app {bundle_id}..."));
        self.simulator
            .launch(&device_id, &bundle_id)
            .await
            .map_err(|e| stage_error(&log, mark, e))?;
        log.push("✓ App launched");

        let screenshot_path = PathBuf::from(
            request
                .screenshot_name
                .unwrap_or_else(default_screenshot_name),
        );
        let mark = log.begin("Capturing screenshot...");
        let screenshot = self
            .simulator
            .screenshot(&screenshot_path)
            .await
            .map_err(|e| stage_error(&log, mark, e))?;
        log.push("✓ Screenshot captured");

        Ok(WorkflowReport {
            log: log.into_entries(),
            screenshot_path,
            screenshot,
        })
    }
}

fn stage_error(log: &StepLog, mark: usize, source: Error) -> WorkflowError {
    WorkflowError {
        step: log.entries()[mark].clone(),
        completed: log.entries()[..mark].to_vec(),
        source,
    }
}
