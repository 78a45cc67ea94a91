#![allow(dead_code)]

use std::path::Path;

use async_trait::async_trait;
use fsim_core::{CommandRunner, Error, ExecOutput, Result};

type Handler = Box<dyn Fn(&str, &[&str]) -> Result<ExecOutput> + Send + Sync>;

/// Test double scripting subprocess behavior for tool kits.
pub struct ScriptedRunner {
    handler: Handler,
}

impl ScriptedRunner {
    pub fn new(handler: impl Fn(&str, &[&str]) -> Result<ExecOutput> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str], _cwd: Option<&Path>) -> Result<ExecOutput> {
        (self.handler)(program, args)
    }
}

pub fn ok(stdout: &str) -> Result<ExecOutput> {
    Ok(ExecOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

pub fn fail(command: &str) -> Result<ExecOutput> {
    Err(Error::Execution {
        command: command.to_string(),
        code: Some(1),
        stderr: "scripted failure".to_string(),
    })
}
