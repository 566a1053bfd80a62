//! Cloned plugin repositories.
//!
//! Clones are created on demand by the resolver and never refreshed
//! automatically; `pal plugins update` pulls them explicitly.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::{PluginError, PluginResult};
use crate::core::Executor;

/// A cloned plugin repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledRemote {
    /// `host/owner/repo`
    pub name: String,

    /// Clone directory
    pub path: PathBuf,

    /// HEAD commit, when it can be read
    pub head: Option<HeadInfo>,
}

/// Summary of a clone's HEAD commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadInfo {
    /// Abbreviated commit id
    pub short_id: String,

    /// First line of the commit message
    pub summary: String,

    /// Commit time, `YYYY-MM-DD`
    pub date: String,
}

/// List clones under `root` (laid out as `host/owner/repo`), sorted by name.
pub fn installed(root: &Path) -> Vec<InstalledRemote> {
    let mut remotes: Vec<InstalledRemote> = WalkDir::new(root)
        .min_depth(3)
        .max_depth(3)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir() && entry.path().join(".git").exists())
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(root).ok()?;
            let name: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
            Some(InstalledRemote {
                name: name.join("/"),
                path: entry.path().to_path_buf(),
                head: head_info(entry.path()),
            })
        })
        .collect();

    remotes.sort_by(|a, b| a.name.cmp(&b.name));
    remotes
}

/// Fast-forward a clone to its upstream.
pub fn update(clone_dir: &Path) -> PluginResult<()> {
    tracing::info!(path = %clone_dir.display(), "Updating plugin");
    let args: [&OsStr; 4] =
        [OsStr::new("-C"), clone_dir.as_os_str(), OsStr::new("pull"), OsStr::new("--ff-only")];
    let result = Executor::new()
        .capture_stderr(true)
        .run("git", args)
        .map_err(PluginError::GitUnavailable)?;

    if !result.success() {
        return Err(PluginError::UpdateFailed {
            path: clone_dir.to_path_buf(),
            code: result.code(),
            stderr: result.stderr_trimmed().to_string(),
        });
    }
    Ok(())
}

/// Read HEAD of the repository at `path`.
#[cfg(feature = "git")]
pub fn head_info(path: &Path) -> Option<HeadInfo> {
    use chrono::TimeZone;

    let repo = git2::Repository::open(path).ok()?;
    let commit = repo.head().ok()?.peel_to_commit().ok()?;
    let short_id = commit.as_object().short_id().ok()?.as_str()?.to_string();
    let date = chrono::Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    Some(HeadInfo { short_id, summary: commit.summary().unwrap_or_default().to_string(), date })
}

/// Read HEAD of the repository at `path`.
#[cfg(not(feature = "git"))]
pub fn head_info(_path: &Path) -> Option<HeadInfo> {
    None
}
