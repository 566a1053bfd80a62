//! Child process execution.
//!
//! Every picker, plugin, clone and shell action goes through here. Calls
//! block until the child exits.

use std::ffi::OsStr;
use std::io::Write;
use std::process::{Command as ProcessCommand, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Result of executing a process.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Exit status of the process
    pub status: ExitStatus,

    /// Standard output (if captured)
    pub stdout: Option<String>,

    /// Standard error (if captured)
    pub stderr: Option<String>,

    /// Time taken to execute
    pub duration: Duration,
}

impl ExecutionResult {
    /// Check if the process succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Captured stderr, trimmed.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.as_deref().map_or("", str::trim)
    }
}

/// Process executor.
#[derive(Debug, Default, Clone)]
pub struct Executor {
    /// Capture stdout instead of passing it through
    pub capture_stdout: bool,

    /// Capture stderr instead of passing it through
    pub capture_stderr: bool,

    /// Text written to the child's stdin (stdin is inherited when unset)
    pub input: Option<String>,

    /// Extra environment variables
    pub env: Vec<(String, String)>,
}

impl Executor {
    /// Create a new executor that passes all stdio through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture stdout.
    #[must_use]
    pub fn capture_stdout(mut self, capture: bool) -> Self {
        self.capture_stdout = capture;
        self
    }

    /// Capture stderr.
    #[must_use]
    pub fn capture_stderr(mut self, capture: bool) -> Self {
        self.capture_stderr = capture;
        self
    }

    /// Feed text to the child's stdin.
    #[must_use]
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Set an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run `program` with `args` and wait for it to exit.
    pub fn run<P, I, S>(&self, program: P, args: I) -> std::io::Result<ExecutionResult>
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = ProcessCommand::new(program);
        cmd.args(args);
        self.execute(cmd)
    }

    /// Run a command line through the platform shell.
    pub fn run_shell(&self, command_line: &str) -> std::io::Result<ExecutionResult> {
        let (shell, shell_arg) = get_shell();
        self.run(shell, [shell_arg, command_line])
    }

    fn execute(&self, mut cmd: ProcessCommand) -> std::io::Result<ExecutionResult> {
        let start = Instant::now();

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd.stdin(if self.input.is_some() { Stdio::piped() } else { Stdio::inherit() });
        cmd.stdout(if self.capture_stdout { Stdio::piped() } else { Stdio::inherit() });
        cmd.stderr(if self.capture_stderr { Stdio::piped() } else { Stdio::inherit() });

        let mut child = cmd.spawn()?;

        // Feed stdin from a thread so a child that writes before it finishes
        // reading cannot deadlock against us.
        let writer = match (child.stdin.take(), self.input.clone()) {
            (Some(mut stdin), Some(input)) => Some(std::thread::spawn(move || {
                // A child that exits without reading everything closes the
                // pipe; that is its business, not an error here.
                let _ = stdin.write_all(input.as_bytes());
            })),
            _ => None,
        };

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        let duration = start.elapsed();

        Ok(ExecutionResult {
            status: output.status,
            stdout: self
                .capture_stdout
                .then(|| String::from_utf8_lossy(&output.stdout).into_owned()),
            stderr: self
                .capture_stderr
                .then(|| String::from_utf8_lossy(&output.stderr).into_owned()),
            duration,
        })
    }
}

/// Get the shell and argument for the current platform.
pub fn get_shell() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}
