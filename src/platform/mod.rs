//! Operating system integration.
//!
//! The launcher never talks to the desktop directly: listing and launching
//! applications, opening URLs and files, and copying to the clipboard all go
//! through a [`Platform`] passed in by the caller.

#[cfg(not(target_os = "macos"))]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

#[cfg(not(target_os = "macos"))]
pub use linux::LinuxPlatform;
#[cfg(target_os = "macos")]
pub use macos::MacPlatform;

use crate::core::{Executor, Item, PalError, PalResult};

/// Desktop capabilities used by palettes and the action dispatcher.
pub trait Platform {
    /// Platform name, for diagnostics.
    fn name(&self) -> &str;

    /// Installed applications as items with at least `name`.
    fn list_apps(&self) -> PalResult<Vec<Item>>;

    /// Launch an application previously returned by [`Platform::list_apps`].
    fn run_app(&self, app: &Item) -> PalResult<()>;

    /// Open a URL in the default browser.
    fn open_url(&self, url: &str) -> PalResult<()>;

    /// Open a file with its default application.
    fn open_file(&self, path: &str) -> PalResult<()>;

    /// Copy text to the clipboard.
    fn copy_to_clipboard(&self, text: &str) -> PalResult<()>;

    /// Run a command line through the shell, attached to the terminal.
    ///
    /// A non-zero exit is logged, not returned as an error.
    fn run_shell(&self, command_line: &str) -> PalResult<()> {
        tracing::debug!(command = command_line, "Running shell command");
        let result = Executor::new()
            .run_shell(command_line)
            .map_err(|e| PalError::Action(format!("failed to run shell: {e}")))?;
        if !result.success() {
            tracing::warn!(
                command = command_line,
                code = ?result.code(),
                "Command exited non-zero"
            );
        }
        Ok(())
    }
}

/// The platform for the running OS.
pub fn detect() -> Box<dyn Platform> {
    #[cfg(target_os = "macos")]
    {
        Box::new(MacPlatform)
    }
    #[cfg(not(target_os = "macos"))]
    {
        Box::new(LinuxPlatform::new())
    }
}

/// Spawn a program detached from our session and don't wait for it.
pub(crate) fn spawn_detached(program: &str, args: &[&str]) -> PalResult<()> {
    let mut cmd = std::process::Command::new(program);
    cmd.args(args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    cmd.spawn().map_err(|e| PalError::Action(format!("failed to run {program}: {e}")))?;
    Ok(())
}

/// Run a program feeding `text` on stdin and require success.
pub(crate) fn pipe_to(program: &str, args: &[&str], text: &str) -> PalResult<()> {
    let result = Executor::new()
        .input(text)
        .capture_stderr(true)
        .run(program, args)
        .map_err(|e| PalError::Action(format!("failed to run {program}: {e}")))?;
    if !result.success() {
        return Err(PalError::Action(format!(
            "{program} exited with {:?}: {}",
            result.code(),
            result.stderr_trimmed()
        )));
    }
    Ok(())
}
