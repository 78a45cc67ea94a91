use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use fsim_core::{CommandRunner, Error, ExecOutput, Result};

type Handler = Box<dyn Fn(&str, &[&str]) -> Result<ExecOutput> + Send + Sync>;

/// Test double that scripts subprocess behavior and records every invocation.
pub struct ScriptedRunner {
    handler: Handler,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new(handler: impl Fn(&str, &[&str]) -> Result<ExecOutput> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str], _cwd: Option<&Path>) -> Result<ExecOutput> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().unwrap().push(line);
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
