//! External executable palettes.
//!
//! A plugin is any executable that understands two invocations:
//!
//! - `<plugin> list` prints one JSON object per line on stdout
//! - `<plugin> pick <name>` acts on the item called `name` and exits 0
//!
//! Both run with `PAL_PALETTE` set to the palette name and
//! `PAL_PLUGIN_CONFIG` set to the palette's configuration as JSON.

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::error::{PluginError, PluginResult};
use crate::core::{parse_json_lines, ExecutionResult, Executor};

/// Environment variable carrying the palette name.
pub const PALETTE_ENV: &str = "PAL_PALETTE";

/// Environment variable carrying the palette config as JSON.
pub const PLUGIN_CONFIG_ENV: &str = "PAL_PLUGIN_CONFIG";

/// An executable speaking the list/pick protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecPlugin {
    path: PathBuf,
    palette: String,
    config_json: String,
}

impl ExecPlugin {
    /// Create a plugin for `palette` backed by the executable at `path`.
    pub fn new(path: impl Into<PathBuf>, palette: impl Into<String>, config: &Value) -> Self {
        Self { path: path.into(), palette: palette.into(), config_json: config.to_string() }
    }

    /// Executable path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `list` and parse its output.
    ///
    /// The whole output is read before anything is parsed; a malformed line
    /// fails the listing.
    pub fn list(&self) -> PluginResult<Vec<Value>> {
        tracing::debug!(plugin = %self.path.display(), "Listing plugin");
        let result = self.run(["list"], true)?;

        if !result.success() {
            return Err(PluginError::ListFailed {
                path: self.path.clone(),
                code: result.code(),
                stderr: result.stderr_trimmed().to_string(),
            });
        }

        let stdout = result.stdout.unwrap_or_default();
        parse_json_lines(&stdout)
            .map_err(|error| PluginError::MalformedOutput { path: self.path.clone(), error })
    }

    /// Run `pick <name>` attached to the terminal.
    pub fn pick(&self, name: &str) -> PluginResult<()> {
        tracing::debug!(plugin = %self.path.display(), name, "Plugin pick");
        let result = self.run(["pick", name], false)?;

        if !result.success() {
            return Err(PluginError::PickFailed {
                path: self.path.clone(),
                name: name.to_string(),
                code: result.code(),
            });
        }
        Ok(())
    }

    fn run<const N: usize>(&self, args: [&str; N], capture: bool) -> PluginResult<ExecutionResult> {
        Executor::new()
            .capture_stdout(capture)
            .capture_stderr(capture)
            .env(PALETTE_ENV, self.palette.as_str())
            .env(PLUGIN_CONFIG_ENV, self.config_json.as_str())
            .run(&self.path, args)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => PluginError::NotFound(self.path.clone()),
                _ => PluginError::Io(e),
            })
    }
}
