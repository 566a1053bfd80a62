//! Error types shared by the core, palettes and pickers.

use thiserror::Error;

use crate::plugin::PluginError;

/// Result type for palette, picker and runner operations.
pub type PalResult<T> = Result<T, PalError>;

/// A line of newline-delimited JSON that failed to parse.
#[derive(Debug, Error)]
#[error("line {line}: {source}")]
pub struct LineError {
    /// 1-based line number in the listing.
    pub line: usize,

    /// Underlying parse failure.
    #[source]
    pub source: serde_json::Error,
}

/// Errors that can occur while resolving, listing, picking or dispatching.
#[derive(Debug, Error)]
pub enum PalError {
    /// No palette with this name is configured or built in.
    #[error("Palette not found: {0}")]
    PaletteNotFound(String),

    /// No picker with this name is configured or built in.
    #[error("Picker not found: {0}")]
    PickerNotFound(String),

    /// A picker is configured with a driver that does not exist.
    #[error("Picker '{picker}' uses unknown driver '{driver}' (expected fzf or rofi)")]
    UnknownDriver { picker: String, driver: String },

    /// A palette listing contained a malformed line.
    #[error("Malformed item in {source_name}: {error}")]
    MalformedItem {
        source_name: String,
        #[source]
        error: LineError,
    },

    /// No item with this name in the palette.
    #[error("No item named '{name}' in palette '{palette}'")]
    ItemNotFound { palette: String, name: String },

    /// A combine palette includes itself, directly or through another member.
    #[error("Palette '{0}' includes itself")]
    IncludeCycle(String),

    /// A builtin palette could not read where its items live.
    #[error("Palette '{palette}' could not be listed: {reason}")]
    Source { palette: String, reason: String },

    /// The picker binary could not be run.
    #[error("Picker failed: {0}")]
    Picker(String),

    /// An action handler could not be run.
    #[error("Action failed: {0}")]
    Action(String),

    /// Replay cache could not be read or written.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Plugin resolution or protocol failure.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
