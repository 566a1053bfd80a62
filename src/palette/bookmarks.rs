//! Browser bookmarks.
//!
//! Chrome and Chromium keep bookmarks in a JSON file. Firefox keeps them in
//! `places.sqlite`, which is queried with the `sqlite3` command on a copy so
//! the lock held by a running browser does not matter. Every item carries a
//! `url`, so a selection is opened without coming back to the palette.
//!
//! ```toml
//! [palettes.bookmarks]
//! browser = "chromium"          # firefox (default), chrome, chromium
//! bookmarks_file = "~/Bookmarks" # optional, found automatically
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use super::{data, PickOutcome};
use crate::core::{expand_path, Executor, PalError, PalResult, PaletteConfig};
use crate::platform::Platform;

const FIREFOX_QUERY: &str = "SELECT b.title, p.url FROM moz_bookmarks b \
     JOIN moz_places p ON b.fk = p.id \
     WHERE b.type = 1 AND b.title IS NOT NULL AND p.url NOT LIKE 'place:%' \
     ORDER BY b.id";

/// Browsers whose bookmarks can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Firefox,
    Chrome,
    Chromium,
}

impl Browser {
    /// Look up a browser by its config name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "firefox" => Some(Self::Firefox),
            "chrome" | "google-chrome" => Some(Self::Chrome),
            "chromium" => Some(Self::Chromium),
            _ => None,
        }
    }

    /// Config name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Firefox => "firefox",
            Self::Chrome => "chrome",
            Self::Chromium => "chromium",
        }
    }
}

/// Which browser to read and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkSettings {
    /// Browser whose format `file` is in
    pub browser: Browser,

    /// Bookmarks file; looked up in the browser's profile when unset
    pub file: Option<PathBuf>,
}

impl BookmarkSettings {
    /// Settings from the palette's `browser` and `bookmarks_file` keys.
    pub fn from_config(config: &PaletteConfig) -> PalResult<Self> {
        let name = config.extra_str("browser").unwrap_or("firefox");
        let browser = Browser::from_name(name).ok_or_else(|| {
            PalError::Config(format!(
                "unsupported browser '{name}' (expected firefox, chrome or chromium)"
            ))
        })?;

        Ok(Self { browser, file: config.extra_str("bookmarks_file").map(expand_path) })
    }
}

pub(super) fn list(palette: &str, settings: &BookmarkSettings) -> PalResult<Vec<Value>> {
    let Some(file) = settings.file.clone().or_else(|| default_file(settings.browser)) else {
        tracing::warn!(palette, browser = settings.browser.name(), "No bookmarks file found");
        return Ok(Vec::new());
    };
    tracing::debug!(palette, path = %file.display(), "Reading bookmarks");

    match settings.browser {
        Browser::Chrome | Browser::Chromium => {
            let content = std::fs::read_to_string(&file)
                .map_err(|e| source_error(palette, format!("{}: {e}", file.display())))?;
            let root: Value = serde_json::from_str(&content)
                .map_err(|e| source_error(palette, format!("{}: {e}", file.display())))?;

            let mut items = Vec::new();
            chrome_items(&root, &mut items);
            Ok(items)
        }
        Browser::Firefox => firefox_items(palette, &file),
    }
}

pub(super) fn pick(
    palette: &str,
    settings: &BookmarkSettings,
    platform: &dyn Platform,
    name: &str,
) -> PalResult<PickOutcome> {
    data::pick(&list(palette, settings)?, name, platform)
}

fn source_error(palette: &str, reason: String) -> PalError {
    PalError::Source { palette: palette.to_string(), reason }
}

/// First existing bookmarks file for `browser` in the usual profile places.
fn default_file(browser: Browser) -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    match browser {
        Browser::Chrome => ["google-chrome", "Google/Chrome"]
            .iter()
            .map(|dir| config_dir.join(dir).join("Default/Bookmarks"))
            .find(|path| path.is_file()),
        Browser::Chromium => ["chromium", "Chromium"]
            .iter()
            .map(|dir| config_dir.join(dir).join("Default/Bookmarks"))
            .find(|path| path.is_file()),
        Browser::Firefox => {
            let roots = [
                dirs::home_dir().map(|home| home.join(".mozilla/firefox")),
                Some(config_dir.join("Firefox/Profiles")),
            ];
            roots
                .into_iter()
                .flatten()
                .filter_map(|root| firefox_profile(&root))
                .map(|profile| profile.join("places.sqlite"))
                .find(|path| path.is_file())
        }
    }
}

/// The `*.default-release` profile under `root`, else any `default` one.
fn firefox_profile(root: &Path) -> Option<PathBuf> {
    let mut profiles: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    profiles.sort();

    profiles
        .iter()
        .find(|p| dir_name(p).ends_with(".default-release"))
        .or_else(|| profiles.iter().find(|p| dir_name(p).contains("default")))
        .cloned()
}

fn dir_name(path: &Path) -> &str {
    path.file_name().and_then(OsStr::to_str).unwrap_or_default()
}

/// Walk a Chrome `Bookmarks` tree collecting `url` nodes in order.
fn chrome_items(node: &Value, items: &mut Vec<Value>) {
    let Some(node) = node.as_object() else {
        return;
    };

    if node.get("type").and_then(Value::as_str) == Some("url") {
        let name = node.get("name").and_then(Value::as_str).unwrap_or_default();
        if let Some(url) = node.get("url").and_then(Value::as_str) {
            items.push(json!({ "name": name, "url": url, "icon": "bookmark" }));
        }
    }

    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            chrome_items(child, items);
        }
    }
    if let Some(roots) = node.get("roots").and_then(Value::as_object) {
        for root in roots.values() {
            chrome_items(root, items);
        }
    }
}

fn firefox_items(palette: &str, places: &Path) -> PalResult<Vec<Value>> {
    let copy = tempfile::Builder::new().prefix("pal-places").suffix(".sqlite").tempfile()?;
    std::fs::copy(places, copy.path())
        .map_err(|e| source_error(palette, format!("{}: {e}", places.display())))?;

    let args = [OsStr::new("-json"), copy.path().as_os_str(), OsStr::new(FIREFOX_QUERY)];
    let result = Executor::new()
        .capture_stdout(true)
        .capture_stderr(true)
        .run("sqlite3", args)
        .map_err(|e| source_error(palette, format!("cannot run sqlite3: {e}")))?;
    if !result.success() {
        return Err(source_error(
            palette,
            format!("sqlite3 exited with {:?}: {}", result.code(), result.stderr_trimmed()),
        ));
    }

    parse_firefox_rows(result.stdout.as_deref().unwrap_or_default())
        .map_err(|e| source_error(palette, format!("unexpected sqlite3 output: {e}")))
}

/// Items from `sqlite3 -json` rows of `title` and `url`.
fn parse_firefox_rows(output: &str) -> Result<Vec<Value>, serde_json::Error> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<Value> = serde_json::from_str(output)?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let title = row.get("title").and_then(Value::as_str)?;
            let url = row.get("url").and_then(Value::as_str)?;
            Some(json!({ "name": title, "url": url, "icon": "bookmark" }))
        })
        .collect())
}
