//! Palette items.
//!
//! An item is an open JSON object. Only a handful of keys mean anything to
//! the launcher itself: `name` (falling back to `id`), `desc`, `icon`, the
//! action fields `cmd`, `url`, `file`, `copy`, and the internal `_palette`
//! tag added by the combine palette.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::LineError;

/// Key under which the combine palette records an item's origin.
pub const PALETTE_TAG: &str = "_palette";

/// Action fields in dispatch priority order.
pub const ACTION_FIELDS: [&str; 4] = ["cmd", "url", "file", "copy"];

/// A selectable palette entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Map<String, Value>);

impl Item {
    /// Create an item with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(name.into()));
        Self(map)
    }

    /// Wrap a JSON value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Set a string field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), Value::String(value.into()));
        self
    }

    /// Display and selection key.
    ///
    /// Uses `name`, then `id`, then the empty string. Non-string values are
    /// rendered as JSON text.
    pub fn name(&self) -> String {
        self.0.get("name").or_else(|| self.0.get("id")).map(display_value).unwrap_or_default()
    }

    /// Description, if any.
    pub fn desc(&self) -> Option<String> {
        self.0.get("desc").map(display_value).filter(|s| !s.is_empty())
    }

    /// Icon hint, if any.
    pub fn icon(&self) -> Option<String> {
        self.0.get("icon").map(display_value).filter(|s| !s.is_empty())
    }

    /// Get a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Name of the palette this item was aggregated from.
    pub fn palette_tag(&self) -> Option<&str> {
        self.get_str(PALETTE_TAG)
    }

    /// Tag the item with its originating palette.
    pub fn tag_palette(&mut self, palette: &str) {
        self.0.insert(PALETTE_TAG.to_string(), Value::String(palette.to_string()));
    }

    /// First action field present, in priority order.
    pub fn action(&self) -> Option<Action<'_>> {
        ACTION_FIELDS.iter().find_map(|key| {
            let value = self.get_str(key)?;
            Some(match *key {
                "cmd" => Action::Command(value),
                "url" => Action::Url(value),
                "file" => Action::File(value),
                _ => Action::Copy(value),
            })
        })
    }

    /// Convert back into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// An action an item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// Shell command.
    Command(&'a str),
    /// URL to open.
    Url(&'a str),
    /// File to open.
    File(&'a str),
    /// Text to copy to the clipboard.
    Copy(&'a str),
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse newline-delimited JSON.
///
/// Blank lines are skipped. The first malformed line aborts parsing.
pub fn parse_json_lines(text: &str) -> Result<Vec<Value>, LineError> {
    let mut values = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value =
            serde_json::from_str(line).map_err(|source| LineError { line: idx + 1, source })?;
        values.push(value);
    }
    Ok(values)
}
