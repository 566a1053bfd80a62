//! Replay cache for the fast path.
//!
//! One JSON file per (picker, palette) holds the exact picker invocation and
//! the items it was built from. The fast path reads it before configuration
//! loads, so the cache root comes from the environment, never the config file.
//!
//! Entries are never invalidated automatically. `pal cache clear` and
//! `pal run --refresh` are the only ways to drop a stale listing.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{PalError, PalResult};
use super::item::Item;

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "PAL_CACHE_DIR";

/// Subdirectory of the cache root holding replay entries.
const REPLAY_DIR: &str = "fe";

/// Cache root: `$PAL_CACHE_DIR`, else `<platform cache dir>/pal`.
pub fn default_cache_root() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("pal")
}

/// A picker process invocation: argument vector plus stdin text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Program followed by its arguments
    pub cmd: Vec<String>,

    /// Text written to the picker's stdin
    pub input: String,
}

/// One persisted listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Exact picker invocation
    #[serde(flatten)]
    pub invocation: Invocation,

    /// Items in display order; the picker's index points into this list
    pub items: Vec<Item>,

    /// Driver whose output format the picker speaks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

/// A cache file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFile {
    /// Picker name, decoded from the directory name
    pub picker: String,
    /// Palette name, decoded from the file name
    pub palette: String,
    /// File path
    pub path: PathBuf,
}

/// Replay cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct ReplayCache {
    root: PathBuf,
}

impl ReplayCache {
    /// Create a cache under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a cache under [`default_cache_root`].
    pub fn from_env() -> Self {
        Self::new(default_cache_root())
    }

    /// Directory holding all entries.
    pub fn dir(&self) -> PathBuf {
        self.root.join(REPLAY_DIR)
    }

    /// Path of the entry for a (picker, palette) pair.
    pub fn entry_path(&self, picker: &str, palette: &str) -> PathBuf {
        self.dir().join(file_component(picker)).join(format!("{}.json", file_component(palette)))
    }

    /// Load an entry.
    ///
    /// A missing file is a miss. So is an unreadable or corrupt one: a
    /// concurrent writer may have left it half written, and the cold path
    /// will rewrite it.
    pub fn load(&self, picker: &str, palette: &str) -> Option<CacheEntry> {
        let path = self.entry_path(picker, palette);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable cache entry");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt cache entry");
                None
            }
        }
    }

    /// Persist an entry, replacing any previous one atomically.
    pub fn store(&self, picker: &str, palette: &str, entry: &CacheEntry) -> PalResult<PathBuf> {
        let path = self.entry_path(picker, palette);
        let dir = path.parent().ok_or_else(|| PalError::Cache("invalid cache path".into()))?;
        std::fs::create_dir_all(dir)?;

        let content =
            serde_json::to_string(entry).map_err(|e| PalError::Cache(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.persist(&path).map_err(|e| PalError::Cache(e.to_string()))?;

        tracing::info!(path = %path.display(), items = entry.items.len(), "Wrote cache entry");
        Ok(path)
    }

    /// All entries on disk, sorted by picker then palette.
    pub fn list(&self) -> PalResult<Vec<CacheFile>> {
        let dir = self.dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&dir).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| PalError::Cache(e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            let picker = path.parent().and_then(Path::file_name);
            let palette = path.file_stem();
            if let (Some(picker), Some(palette)) = (picker, palette) {
                files.push(CacheFile {
                    picker: name_of(&picker.to_string_lossy()),
                    palette: name_of(&palette.to_string_lossy()),
                    path: path.to_path_buf(),
                });
            }
        }

        files.sort_by(|a, b| (&a.picker, &a.palette).cmp(&(&b.picker, &b.palette)));
        Ok(files)
    }

    /// Remove entries, optionally filtered by picker and/or palette.
    ///
    /// Returns the number of files removed.
    pub fn clear(&self, picker: Option<&str>, palette: Option<&str>) -> PalResult<usize> {
        let mut removed = 0;
        for file in self.list()? {
            if picker.is_some_and(|p| p != file.picker) {
                continue;
            }
            if palette.is_some_and(|p| p != file.palette) {
                continue;
            }
            std::fs::remove_file(&file.path)?;
            tracing::debug!(path = %file.path.display(), "Removed cache entry");
            removed += 1;
        }
        Ok(removed)
    }
}

/// Encode a name as a single path component.
///
/// Percent-encoding keeps distinct names in distinct files. Dot-only names
/// are encoded as well so they never mean the current or parent directory.
fn file_component(name: &str) -> String {
    match name {
        "" => "%".to_string(),
        "." | ".." => name.replace('.', "%2E"),
        _ => urlencoding::encode(name).into_owned(),
    }
}

/// Inverse of [`file_component`].
fn name_of(component: &str) -> String {
    if component == "%" {
        return String::new();
    }
    urlencoding::decode(component).map_or_else(|_| component.to_string(), Cow::into_owned)
}
