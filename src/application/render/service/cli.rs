use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::PathBuf,
    process::{Command, Output, Stdio},
    time::Instant,
};

use tracing::{debug, warn};

use crate::application::render::types::{PatternRenderer, RenderInvocation, RendererError};

/// Render collaborator backed by an external command line tool.
///
/// Invoked as `program [args..] <source> <target> <format> <width> <height>`,
/// synchronously, with the configured environment overrides and working
/// directory. Nothing is taken from ambient process state beyond what the
/// child inherits.
#[derive(Debug, Clone)]
pub struct CliPatternRenderer {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl CliPatternRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    fn command(&self, invocation: &RenderInvocation<'_>) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(invocation.source_path)
            .arg(invocation.target_path)
            .arg(invocation.format)
            .arg(invocation.width.to_string())
            .arg(invocation.height.to_string())
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = self.working_dir.as_ref() {
            command.current_dir(dir);
        }
        command
    }
}

impl PatternRenderer for CliPatternRenderer {
    fn render(&self, invocation: &RenderInvocation<'_>) -> Result<(), RendererError> {
        let started_at = Instant::now();
        let output = self.command(invocation).output().map_err(|err| {
            warn!(
                target = "application::render::cli",
                op = "cli::render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error_code = "spawn_cli",
                program = %self.program.display(),
                error = %err,
                "Failed to spawn pattern renderer"
            );
            match err.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    RendererError::Unavailable(err)
                }
                _ => RendererError::Io(err),
            }
        })?;

        if !output.status.success() {
            let exit_code = output.status.code();
            return Err(RendererError::Failed {
                exit_code,
                diagnostic: diagnostic_text(&output),
            });
        }

        debug!(
            target = "application::render::cli",
            op = "cli::render",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            target_path = %invocation.target_path.display(),
            "Pattern renderer exited successfully"
        );
        Ok(())
    }
}

/// Captured stdout and stderr, stderr first; a status line when both are empty.
fn diagnostic_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parts: Vec<&str> = [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        match output.status.code() {
            Some(code) => format!("pattern renderer exited with status {code}"),
            None => "pattern renderer terminated by signal".to_string(),
        }
    } else {
        parts.join("\n")
    }
}
