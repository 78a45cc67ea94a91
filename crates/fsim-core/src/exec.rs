use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{Error, Result};

/// Captured output of one completed external command.
///
/// Both streams are kept: toolchains like `flutter` routinely write warnings
/// to stderr on successful builds, so stderr is a non-fatal channel here.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn combined(&self) -> String {
        if self.stderr.trim().is_empty() {
            self.stdout.clone()
        } else if self.stdout.trim().is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs external commands to completion. No timeout is imposed at this layer;
/// callers that need bounded waiting poll on top of it.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<ExecOutput>;
}

/// `CommandRunner` backed by real subprocesses via `tokio::process`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<ExecOutput> {
        let command_display = command_line(program, args);
        tracing::debug!(command = %command_display, cwd = ?cwd, "running external command");

        let mut command = tokio::process::Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| Error::Spawn {
            command: command_display.clone(),
            source: e,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(Error::Execution {
                command: command_display,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(ExecOutput { stdout, stderr })
    }
}

pub(crate) fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Resolves an optional caller-supplied project path to a working directory.
pub fn project_dir(project_path: Option<&Path>) -> PathBuf {
    project_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
