//! External command execution.
//!
//! Two modes:
//! - [`Cmd::run`] captures stdout/stderr and fails with stderr on non-zero exit.
//! - [`Cmd::run_forwarding`] streams both pipes line by line into the log as
//!   they arrive and hands back the last merged lines with the exit status.
//!   The caller interprets the status.

use anyhow::{bail, Context, Result};
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread;

/// Result of a captured command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Result of a forwarded command execution.
#[derive(Debug, Clone)]
pub struct ForwardedOutput {
    pub status: ExitStatus,
    /// The last lines of stdout and stderr, merged in arrival order.
    pub lines: VecDeque<String>,
}

impl ForwardedOutput {
    /// Exit code, or `None` if terminated by signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Last `n` kept lines of output joined with newlines.
    pub fn tail(&self, n: usize) -> String {
        let skip = self.lines.len().saturating_sub(n);
        self.lines
            .iter()
            .skip(skip)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            allow_fail: false,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Full command line, for logging.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult> {
        let output = self.command().output().with_context(|| {
            format!("Failed to execute '{}'. Is it installed?", self.program)
        })?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.allow_fail && !result.success() {
            let stderr = result.stderr_trimmed();
            if stderr.is_empty() {
                bail!("'{}' failed (exit code {})", self.program, result.code());
            } else {
                bail!(
                    "'{}' failed (exit code {}):\n{}",
                    self.program,
                    result.code(),
                    stderr
                );
            }
        }

        Ok(result)
    }

    /// Run the command, forwarding stdout and stderr to the log as they
    /// arrive. Only the last `keep` lines are held on to.
    ///
    /// Blocks until the process exits. Only a failure to spawn or wait is an
    /// error; the exit status is returned as-is.
    pub fn run_forwarding(self, keep: usize) -> io::Result<ForwardedOutput> {
        tracing::debug!("Running: {}", self.display());

        let mut child = self
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let lines = Mutex::new(VecDeque::with_capacity(keep));
        let program = self.program.as_str();

        thread::scope(|s| {
            let lines = &lines;
            if let Some(out) = stdout {
                s.spawn(move || forward(out, program, lines, keep));
            }
            if let Some(err) = stderr {
                s.spawn(move || forward(err, program, lines, keep));
            }
        });

        let status = child.wait()?;
        let lines = lines.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(ForwardedOutput { status, lines })
    }
}

fn forward(pipe: impl Read, program: &str, lines: &Mutex<VecDeque<String>>, keep: usize) {
    for line in BufReader::new(pipe).lines().map_while(|line| line.ok()) {
        tracing::info!(target: "fopctl::engine", "[{}] {}", program, line);
        if keep == 0 {
            continue;
        }
        let mut lines = lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() == keep {
            lines.pop_front();
        }
        lines.push_back(line);
    }
}
