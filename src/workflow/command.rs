// src/workflow/command.rs

//! Shell command task.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::model::TaskConfig;
use crate::errors::WatchflowError;
use crate::workflow::{Task, TaskContext, TaskFuture};

/// Runs a shell command for the event path.
///
/// The command string is expanded with placeholders taken from the
/// context before it is handed to `sh -c` (`cmd /C` on Windows):
///
/// | placeholder | value                                          |
/// |-------------|------------------------------------------------|
/// | `{src}`     | event path                                     |
/// | `{target}`  | target left by the previous task, else `{src}` |
/// | `{dir}`     | parent directory of the event path             |
/// | `{name}`    | file name                                      |
/// | `{stem}`    | file name without extension                    |
/// | `{ext}`     | extension                                      |
#[derive(Debug, Clone)]
pub struct CommandTask {
    label: String,
    cmd: String,
    dir: Option<String>,
    target: Option<String>,
    fail_on_output: bool,
}

impl CommandTask {
    pub fn new(cmd: impl Into<String>) -> Self {
        let cmd = cmd.into();
        Self {
            label: cmd.clone(),
            cmd,
            dir: None,
            target: None,
            fail_on_output: false,
        }
    }

    pub fn from_config(cfg: &TaskConfig) -> Self {
        let mut task = Self::new(cfg.cmd.clone());
        if let Some(label) = &cfg.label {
            task.label = label.clone();
        }
        task.dir = cfg.dir.clone();
        task.target = cfg.target.clone();
        task.fail_on_output = cfg.fail_on_output;
        task
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Run the command from this (templated) working directory.
    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// After success, point `ctx.target` at this (templated) path.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Treat any stdout output as failure.
    pub fn fail_on_output(mut self, yes: bool) -> Self {
        self.fail_on_output = yes;
        self
    }

    async fn execute(&self, ctx: &mut TaskContext) -> crate::errors::Result<()> {
        // What the previous task in the chain left behind, or the event path
        // for the first task.
        let prev = if ctx.target.as_os_str().is_empty() {
            ctx.src.clone()
        } else {
            ctx.target.clone()
        };
        ctx.target = ctx.src.clone();
        ctx.buf.clear();

        let cmd = expand(&self.cmd, &ctx.src, &prev);
        let dir = self.dir.as_ref().map(|d| PathBuf::from(expand(d, &ctx.src, &prev)));
        let shown_dir = dir.clone().unwrap_or_else(|| parent_dir(&ctx.src));

        ctx.out
            .write_line(format!("{} ... {}", self.label, shown_dir.display()));

        info!(cmd = %cmd, src = ?ctx.src, "starting task process");

        // Build a shell command appropriate for the platform.
        let mut command = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&cmd);
            c
        };

        if let Some(dir) = &dir {
            command.current_dir(dir);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = command
            .output()
            .await
            .map_err(|e| WatchflowError::Task(format!("spawning '{cmd}': {e}")))?;

        ctx.buf.extend_from_slice(&output.stdout);
        ctx.err.write_all(&output.stderr);
        // Captured output is flushed whether or not the command succeeded.
        ctx.out.write_all(&ctx.buf);

        let code = output.status.code().unwrap_or(-1);
        debug!(cmd = %cmd, exit_code = code, "task process exited");

        if !output.status.success() {
            return Err(WatchflowError::Task(format!("'{cmd}' exited with status {code}")));
        }

        if self.fail_on_output && !ctx.buf.is_empty() {
            return Err(WatchflowError::Task("FAIL".to_string()));
        }

        if let Some(target) = &self.target {
            ctx.target = PathBuf::from(expand(target, &ctx.src, &prev));
        }

        ctx.out.write_line("ok");
        Ok(())
    }
}

impl Task for CommandTask {
    fn label(&self) -> &str {
        &self.label
    }

    fn run<'a>(&'a self, ctx: &'a mut TaskContext) -> TaskFuture<'a> {
        Box::pin(self.execute(ctx))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Substitute path placeholders in `template`.
pub fn expand(template: &str, src: &Path, target: &Path) -> String {
    let os = |s: Option<&std::ffi::OsStr>| {
        s.map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    template
        .replace("{src}", &src.to_string_lossy())
        .replace("{target}", &target.to_string_lossy())
        .replace("{dir}", &parent_dir(src).to_string_lossy())
        .replace("{name}", &os(src.file_name()))
        .replace("{stem}", &os(src.file_stem()))
        .replace("{ext}", &os(src.extension()))
}
