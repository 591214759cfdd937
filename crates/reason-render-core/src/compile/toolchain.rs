//! External compiler invocation.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::workspace::Workspace;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// BuckleScript's build-everything command.
    pub fn bsb() -> Self {
        Self::new("bsb", &["-make-world"])
    }

    /// The webpack CLI; configuration arguments are added per invocation.
    pub fn webpack() -> Self {
        Self::new("webpack", &[])
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, if the process was not killed by a signal.
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run `spec` (plus `extra_args`) with `cwd` as working directory.
///
/// The child is killed if the returned future is dropped, which is what
/// makes timeouts around it effective.
pub async fn run_command(spec: &CommandSpec, extra_args: &[&str], cwd: &Path) -> std::io::Result<ProcessOutput> {
    let program = which::which(&spec.program).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found in PATH: {}", spec.program, e),
        )
    })?;

    tracing::debug!("Running `{}` in {}", spec, cwd.display());

    let output = Command::new(program)
        .args(&spec.args)
        .args(extra_args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    Ok(ProcessOutput {
        status: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Compiles the sources written into a workspace into JavaScript modules.
pub trait Compiler: Send + Sync {
    /// Compile everything in `workspace`, leaving the output next to it.
    fn compile(&self, workspace: &Workspace) -> impl Future<Output = Result<()>> + Send;
}

/// Runs a compiler command (by default `bsb -make-world`) inside the workspace.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    command: CommandSpec,
}

impl CommandCompiler {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }
}

impl Default for CommandCompiler {
    fn default() -> Self {
        Self::new(CommandSpec::bsb())
    }
}

impl Compiler for CommandCompiler {
    async fn compile(&self, workspace: &Workspace) -> Result<()> {
        let output = run_command(&self.command, &[], workspace.path())
            .await
            .map_err(|e| Error::Compile {
                command: self.command.to_string(),
                status: None,
                stdout: String::new(),
                stderr: e.to_string(),
            })?;

        if !output.success {
            tracing::error!("`{}` failed in {}", self.command, workspace.path().display());
            return Err(Error::Compile {
                command: self.command.to_string(),
                status: output.status,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        if !output.stdout.trim().is_empty() {
            tracing::debug!("{}", output.stdout.trim_end());
        }

        Ok(())
    }
}
