//! Linux / freedesktop platform.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{pipe_to, spawn_detached, Platform};
use crate::core::{Item, PalError, PalResult};

/// Desktop entry field codes (`%f`, `%U`, ...) that launchers substitute.
static FIELD_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%[fFuUdDnNickvm]").unwrap());

/// freedesktop.org platform: `.desktop` entries, `xdg-open`, wl-copy/xclip.
#[derive(Debug, Clone)]
pub struct LinuxPlatform {
    app_dirs: Vec<PathBuf>,
}

impl LinuxPlatform {
    /// Platform reading applications from the XDG data directories.
    pub fn new() -> Self {
        let mut app_dirs = Vec::new();
        if let Some(data_home) = dirs::data_dir() {
            app_dirs.push(data_home.join("applications"));
        }
        let data_dirs = std::env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
            app_dirs.push(Path::new(dir).join("applications"));
        }
        Self { app_dirs }
    }

    /// Platform reading applications from specific directories.
    pub fn with_app_dirs(app_dirs: Vec<PathBuf>) -> Self {
        Self { app_dirs }
    }
}

impl Default for LinuxPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for LinuxPlatform {
    fn name(&self) -> &str {
        "linux"
    }

    fn list_apps(&self) -> PalResult<Vec<Item>> {
        let mut seen = HashSet::new();
        let mut apps = Vec::new();

        for dir in &self.app_dirs {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            let mut paths: Vec<_> = entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|e| e == "desktop"))
                .collect();
            paths.sort();

            for path in paths {
                let Some(file_name) = path.file_name().map(|n| n.to_os_string()) else {
                    continue;
                };
                // earlier directories shadow later ones
                if !seen.insert(file_name) {
                    continue;
                }
                match std::fs::read_to_string(&path) {
                    Ok(content) => apps.extend(parse_desktop_entry(&path, &content)),
                    Err(e) => tracing::debug!(path = %path.display(), error = %e, "Skipping entry"),
                }
            }
        }

        apps.sort_by_key(|app| app.name().to_lowercase());
        Ok(apps)
    }

    fn run_app(&self, app: &Item) -> PalResult<()> {
        let exec = app
            .get_str("exec")
            .ok_or_else(|| PalError::Action(format!("app '{}' has no exec", app.name())))?;
        let command_line = clean_exec(exec);
        tracing::debug!(app = %app.name(), command = %command_line, "Launching app");
        spawn_detached("sh", &["-c", &command_line])
    }

    fn open_url(&self, url: &str) -> PalResult<()> {
        spawn_detached("xdg-open", &[url])
    }

    fn open_file(&self, path: &str) -> PalResult<()> {
        let expanded = crate::core::expand_path(path);
        spawn_detached("xdg-open", &[&expanded.to_string_lossy()])
    }

    fn copy_to_clipboard(&self, text: &str) -> PalResult<()> {
        if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            pipe_to("wl-copy", &[], text)
        } else {
            pipe_to("xclip", &["-selection", "clipboard"], text)
        }
    }
}

/// Parse the `[Desktop Entry]` group of a `.desktop` file.
///
/// Returns `None` for hidden entries and anything that is not an application.
fn parse_desktop_entry(path: &Path, content: &str) -> Option<Item> {
    let mut in_entry = false;
    let mut name = None;
    let mut icon = None;
    let mut exec = None;
    let mut comment = None;
    let mut kind = None;
    let mut hidden = false;

    for line in content.lines().map(str::trim) {
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "Type" => kind = Some(value),
            "Name" => name = Some(value),
            "Icon" => icon = Some(value),
            "Exec" => exec = Some(value),
            "Comment" => comment = Some(value),
            "NoDisplay" | "Hidden" => hidden |= value.eq_ignore_ascii_case("true"),
            _ => {}
        }
    }

    if hidden || kind.as_deref() != Some("Application") {
        return None;
    }

    let name = name.unwrap_or_else(|| {
        path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    });
    let mut item = Item::new(name)
        .with("exec", exec.unwrap_or_default())
        .with("path", path.to_string_lossy());
    if let Some(icon) = icon {
        item = item.with("icon", icon);
    }
    if let Some(comment) = comment {
        item = item.with("desc", comment);
    }
    Some(item)
}

/// Strip desktop entry field codes from an `Exec` line.
fn clean_exec(exec: &str) -> String {
    let cleaned = FIELD_CODE.replace_all(exec, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
