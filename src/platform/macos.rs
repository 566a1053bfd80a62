//! macOS platform.

use std::path::PathBuf;

use super::{pipe_to, spawn_detached, Platform};
use crate::core::{Item, PalError, PalResult};

/// macOS platform: `.app` bundles, `open`, `pbcopy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacPlatform;

impl MacPlatform {
    fn app_dirs() -> Vec<PathBuf> {
        let mut app_dirs =
            vec![PathBuf::from("/Applications"), PathBuf::from("/System/Applications")];
        if let Some(home) = dirs::home_dir() {
            app_dirs.push(home.join("Applications"));
        }
        app_dirs
    }
}

impl Platform for MacPlatform {
    fn name(&self) -> &str {
        "macos"
    }

    fn list_apps(&self) -> PalResult<Vec<Item>> {
        let mut apps = Vec::new();
        for dir in Self::app_dirs() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for path in entries.filter_map(Result::ok).map(|e| e.path()) {
                if path.extension().is_none_or(|e| e != "app") {
                    continue;
                }
                let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                    continue;
                };
                apps.push(Item::new(name).with("path", path.to_string_lossy()));
            }
        }
        apps.sort_by_key(|app| app.name().to_lowercase());
        Ok(apps)
    }

    fn run_app(&self, app: &Item) -> PalResult<()> {
        let path = app
            .get_str("path")
            .ok_or_else(|| PalError::Action(format!("app '{}' has no path", app.name())))?;
        spawn_detached("open", &["-a", path])
    }

    fn open_url(&self, url: &str) -> PalResult<()> {
        spawn_detached("open", &[url])
    }

    fn open_file(&self, path: &str) -> PalResult<()> {
        let expanded = crate::core::expand_path(path);
        spawn_detached("open", &[&expanded.to_string_lossy()])
    }

    fn copy_to_clipboard(&self, text: &str) -> PalResult<()> {
        pipe_to("pbcopy", &[], text)
    }
}
