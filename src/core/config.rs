//! Configuration management for pal.
//!
//! The embedded defaults are parsed into a TOML tree, the user's file is
//! deep-merged over them, and the result is deserialized into typed structs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Documented default configuration, also used as the `pal init` template.
pub const DEFAULT_CONFIG: &str = include_str!("../defaults.toml");

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PAL_CONFIG";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Filesystem locations
    pub paths: PathsConfig,

    /// Picker settings by picker name
    pub pickers: BTreeMap<String, PickerConfig>,

    /// Palette settings by palette name
    pub palettes: BTreeMap<String, PaletteConfig>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Picker used when none is given on the command line
    pub default_picker: String,

    /// Palette used when none is given on the command line
    pub default_palette: String,
}

/// Plugin and cache locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding bare-name plugins
    pub plugins_dir: String,

    /// Root for cloned plugins (defaults to the platform cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Hosts whose `host/owner/repo` bases are cloned with git
    pub git_hosts: Vec<String>,
}

/// Settings for one picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Driver speaking this picker's protocol (defaults to the picker name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    /// Binary to run (defaults to the driver's binary)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,

    /// Extra arguments appended after the driver's flags
    pub args: Vec<String>,
}

/// Settings for one palette.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Builtin name, path, plugin name or `host/owner/repo[/path]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    /// List from `data`/`data_file` instead of the palette source
    pub auto_list: bool,

    /// Dispatch selections from item fields only, never through the palette
    pub auto_pick: bool,

    /// Persist the picker invocation for the fast path
    pub cache: bool,

    /// Inline items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<serde_json::Value>>,

    /// JSON-lines file with items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,

    /// Member palettes of a combine palette, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// Palette-specific settings forwarded to plugins
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Config {
    /// Load configuration.
    ///
    /// Looks for the user file in:
    /// 1. `explicit` (the `--config` flag)
    /// 2. `$PAL_CONFIG`
    /// 3. `.pal.toml` in the current directory
    /// 4. `~/.config/pal/config.toml`
    ///
    /// Falls back to the defaults when none exists.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match Self::find_user_file(explicit)? {
            Some(path) => Self::load_from_file(&path),
            None => Self::from_toml_str(""),
        }
    }

    /// Load configuration from a specific file, merged over the defaults.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config");
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        Self::from_toml_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))
    }

    /// Parse a user config string and merge it over the defaults.
    pub fn from_toml_str(user: &str) -> anyhow::Result<Self> {
        let mut tree: toml::Value = toml::from_str(DEFAULT_CONFIG)?;
        let overlay: toml::Value = toml::from_str(user)?;
        merge(&mut tree, overlay);
        Ok(tree.try_into()?)
    }

    /// Locate the user config file, if any.
    pub fn find_user_file(explicit: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Ok(Some(path.to_path_buf()));
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            let path = PathBuf::from(path);
            if !path.exists() {
                anyhow::bail!("Config file not found: {} (from {CONFIG_ENV})", path.display());
            }
            return Ok(Some(path));
        }

        let local_config = PathBuf::from(".pal.toml");
        if local_config.exists() {
            return Ok(Some(local_config));
        }

        Ok(Self::user_config_path().filter(|p| p.exists()))
    }

    /// Path of the global user config file.
    pub fn user_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pal"))
    }

    /// Write the defaults template to the global config file.
    pub fn init(force: bool) -> anyhow::Result<PathBuf> {
        let path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if path.exists() && !force {
            anyhow::bail!("Config already exists: {} (use --force to overwrite)", path.display());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, DEFAULT_CONFIG)?;

        Ok(path)
    }

    /// Settings for a palette.
    ///
    /// Builtin palettes resolve without a config section.
    pub fn palette(&self, name: &str) -> Option<PaletteConfig> {
        self.palettes.get(name).cloned().or_else(|| {
            crate::palette::BuiltinPalette::from_name(name).map(|_| PaletteConfig::default())
        })
    }
}

impl PaletteConfig {
    /// Resolution target, defaulting to the palette name.
    pub fn base_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.base.as_deref().unwrap_or(name)
    }

    /// A palette-specific string setting.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(serde_json::Value::as_str)
    }
}

impl PathsConfig {
    /// Expanded plugins directory.
    pub fn plugins_dir(&self) -> PathBuf {
        expand_path(&self.plugins_dir)
    }

    /// Expanded cache root.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.as_deref().map(expand_path).unwrap_or_else(crate::core::default_cache_root)
    }

    /// Directory where git-hosted plugins are cloned.
    pub fn clone_dir(&self) -> PathBuf {
        self.cache_dir().join("plugins")
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { default_picker: "fzf".to_string(), default_palette: "combine".to_string() }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            plugins_dir: "~/.config/pal/plugins".to_string(),
            cache_dir: None,
            git_hosts: ["github.com", "gitlab.com", "codeberg.org", "bitbucket.org"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Expand `~` and environment variables in a path.
///
/// Unknown variables are left as written.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// Deep-merge `overlay` into `base`: tables merge by key, anything else replaces.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
