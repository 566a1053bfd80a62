//! Items from configuration: inline `data` or a JSON-lines `data_file`.

use serde_json::Value;

use super::{find_by_name, PaletteSource, PickOutcome};
use crate::core::{
    expand_path, parse_json_lines, Dispatch, Dispatcher, PalError, PalResult, PaletteConfig,
};
use crate::platform::Platform;

/// Data source for a palette config: `data` wins over `data_file`.
pub(super) fn source(config: &PaletteConfig) -> PaletteSource {
    match (&config.data, &config.data_file) {
        (Some(data), _) => PaletteSource::Static(data.clone()),
        (None, Some(file)) => PaletteSource::JsonLines(expand_path(file)),
        (None, None) => PaletteSource::Static(Vec::new()),
    }
}

impl PaletteSource {
    /// Items of a data source; other sources have none.
    pub(super) fn list_data(&self, palette: &str) -> PalResult<Vec<Value>> {
        match self {
            Self::Static(items) => Ok(items.clone()),
            Self::JsonLines(path) => {
                tracing::debug!(palette, path = %path.display(), "Reading data file");
                let content = std::fs::read_to_string(path).map_err(|e| {
                    PalError::Config(format!("cannot read data file {}: {e}", path.display()))
                })?;
                parse_json_lines(&content).map_err(|error| PalError::MalformedItem {
                    source_name: path.display().to_string(),
                    error,
                })
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// Dispatch the first item called `name`.
pub(super) fn pick(items: &[Value], name: &str, platform: &dyn Platform) -> PalResult<PickOutcome> {
    let Some(item) = find_by_name(items, name) else {
        return Ok(PickOutcome::NotFound);
    };

    if Dispatcher::new(platform).dispatch(&item)? == Dispatch::Unhandled {
        tracing::warn!(item = name, "Item has no action to run");
    }
    Ok(PickOutcome::Done)
}
