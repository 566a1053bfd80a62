//! Plugin system error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::LineError;

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors that can occur while resolving or running plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Plugin executable not found.
    #[error("Plugin not found: {0}")]
    NotFound(PathBuf),

    /// A git reference with a `.` or `..` segment.
    #[error("Invalid plugin reference '{0}': '.' and '..' segments are not allowed")]
    InvalidRemote(String),

    /// `git` could not be run at all.
    #[error("git is required for remote plugins: {0}")]
    GitUnavailable(std::io::Error),

    /// `git clone` exited non-zero.
    #[error("Failed to clone {url} (exit code {code:?}): {stderr}")]
    CloneFailed { url: String, code: Option<i32>, stderr: String },

    /// `git pull` in a clone exited non-zero.
    #[error("Failed to update {} (exit code {code:?}): {stderr}", path.display())]
    UpdateFailed { path: PathBuf, code: Option<i32>, stderr: String },

    /// `<plugin> list` exited non-zero.
    #[error("Plugin {} list failed (exit code {code:?}): {stderr}", path.display())]
    ListFailed { path: PathBuf, code: Option<i32>, stderr: String },

    /// `<plugin> pick <name>` exited non-zero.
    #[error("Plugin {} pick '{name}' failed (exit code {code:?})", path.display())]
    PickFailed { path: PathBuf, name: String, code: Option<i32> },

    /// `<plugin> list` printed a line that is not JSON.
    #[error("Plugin {} printed a malformed item on {error}", path.display())]
    MalformedOutput {
        path: PathBuf,
        #[source]
        error: LineError,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
