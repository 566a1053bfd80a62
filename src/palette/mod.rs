//! Palettes: named item sources plus what to do with a selection.
//!
//! A palette's `base` decides its source. Builtins run in process; anything
//! else is an external executable speaking the plugin protocol.
//!
//! | base       | lists                                   | pick                      |
//! |------------|-----------------------------------------|---------------------------|
//! | `commands` | `data`, else `data_file`                | dispatch the item         |
//! | `combine`  | every `include` member, tagged          | delegate to the member    |
//! | `apps`     | installed applications                  | launch the application    |
//! | `palettes` | configured palettes                     | open the chosen palette   |
//! | `ssh`      | hosts from ssh config and `known_hosts` | `ssh <host>`              |
//! | `bookmarks`| browser bookmarks                       | open the bookmark         |
//! | plugin     | `<plugin> list`                         | `<plugin> pick <name>`    |

mod apps;
mod bookmarks;
mod combine;
mod data;
mod ssh;

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::core::{Config, Item, PalError, PalResult, PaletteConfig};
use crate::platform::Platform;
use crate::plugin::{ExecPlugin, GitCloner, PluginLocation, PluginResolver};

pub use bookmarks::{BookmarkSettings, Browser};
pub use ssh::SshSettings;

/// Palettes implemented in process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinPalette {
    /// Items from configuration or a JSON-lines file
    Commands,
    /// Aggregate of other palettes
    Combine,
    /// Installed desktop applications
    Apps,
    /// Index of configured palettes
    Palettes,
    /// Hosts from the SSH client configuration
    Ssh,
    /// Browser bookmarks
    Bookmarks,
}

impl BuiltinPalette {
    /// All builtins.
    pub const ALL: [Self; 6] =
        [Self::Commands, Self::Combine, Self::Apps, Self::Palettes, Self::Ssh, Self::Bookmarks];

    /// Look up a builtin by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Builtin name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Combine => "combine",
            Self::Apps => "apps",
            Self::Palettes => "palettes",
            Self::Ssh => "ssh",
            Self::Bookmarks => "bookmarks",
        }
    }
}

/// Everything palettes need from the outside world.
#[derive(Clone)]
pub struct PaletteContext<'a> {
    /// Merged configuration
    pub config: &'a Config,

    /// Desktop capabilities
    pub platform: &'a dyn Platform,

    /// Clones git-hosted plugins
    pub cloner: &'a dyn GitCloner,

    /// Combine palettes currently being expanded, outermost first
    ancestry: Vec<String>,
}

impl<'a> PaletteContext<'a> {
    /// Create a top-level context.
    pub fn new(config: &'a Config, platform: &'a dyn Platform, cloner: &'a dyn GitCloner) -> Self {
        Self { config, platform, cloner, ancestry: Vec::new() }
    }

    /// Context for the members of the combine palette `name`.
    fn descend(&self, name: &str) -> Self {
        let mut child = self.clone();
        child.ancestry.push(name.to_string());
        child
    }

    fn is_expanding(&self, name: &str) -> bool {
        self.ancestry.iter().any(|a| a == name)
    }
}

/// A member palette that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFailure {
    /// Member palette name
    pub palette: String,

    /// Error message
    pub reason: String,
}

/// Items produced by a palette.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    /// Items in display order
    pub items: Vec<Value>,

    /// Aggregated members that failed and were skipped
    pub failures: Vec<MemberFailure>,
}

impl Listing {
    /// A listing without failures.
    pub fn new(items: Vec<Value>) -> Self {
        Self { items, failures: Vec::new() }
    }
}

/// What a palette did with a picked name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// The pick was handled.
    Done,
    /// The caller should open this palette next.
    Open(String),
    /// No item with that name.
    NotFound,
}

/// Where a palette gets its items from.
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteSource {
    /// Inline items.
    Static(Vec<Value>),
    /// JSON-lines file.
    JsonLines(PathBuf),
    /// Members of a combine palette, in order.
    Combine(Vec<String>),
    /// Installed applications.
    Apps,
    /// Configured palettes.
    Index,
    /// SSH hosts.
    Ssh(SshSettings),
    /// Browser bookmarks.
    Bookmarks(BookmarkSettings),
    /// External executable.
    Plugin(ExecPlugin),
}

/// A resolved palette.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    config: PaletteConfig,
    source: PaletteSource,
}

impl Palette {
    /// Resolve the palette called `name`.
    ///
    /// May clone a git-hosted plugin.
    pub fn resolve(name: &str, ctx: &PaletteContext<'_>) -> PalResult<Self> {
        let config =
            ctx.config.palette(name).ok_or_else(|| PalError::PaletteNotFound(name.to_string()))?;
        let base = config.base_or(name);

        let location = PluginResolver::new(&ctx.config.paths, ctx.cloner).resolve(base)?;
        tracing::debug!(palette = name, base, ?location, "Resolved palette");

        let source = match location {
            PluginLocation::Builtin(BuiltinPalette::Commands) => data::source(&config),
            PluginLocation::Builtin(BuiltinPalette::Combine) => {
                PaletteSource::Combine(config.include.clone())
            }
            PluginLocation::Builtin(BuiltinPalette::Apps) => PaletteSource::Apps,
            PluginLocation::Builtin(BuiltinPalette::Palettes) => PaletteSource::Index,
            PluginLocation::Builtin(BuiltinPalette::Ssh) => {
                PaletteSource::Ssh(SshSettings::from_config(&config))
            }
            PluginLocation::Builtin(BuiltinPalette::Bookmarks) => {
                PaletteSource::Bookmarks(BookmarkSettings::from_config(&config)?)
            }
            PluginLocation::Local(path) | PluginLocation::Git { executable: path, .. } => {
                let settings = serde_json::to_value(&config)
                    .map_err(|e| PalError::Config(format!("palette '{name}': {e}")))?;
                PaletteSource::Plugin(ExecPlugin::new(path, name, &settings))
            }
        };

        Ok(Self { name: name.to_string(), config, source })
    }

    /// Palette name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Palette settings.
    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    /// Item source.
    pub fn source(&self) -> &PaletteSource {
        &self.source
    }

    /// Whether selections are dispatched from item fields only.
    pub fn auto_pick(&self) -> bool {
        self.config.auto_pick
    }

    /// Produce the palette's items.
    ///
    /// With `auto_list` set, items come from `data`/`data_file` whatever the
    /// source.
    pub fn list(&self, ctx: &PaletteContext<'_>) -> PalResult<Listing> {
        if self.config.auto_list {
            return data::source(&self.config).list_data(&self.name).map(Listing::new);
        }

        match &self.source {
            PaletteSource::Static(_) | PaletteSource::JsonLines(_) => {
                self.source.list_data(&self.name).map(Listing::new)
            }
            PaletteSource::Combine(members) => Ok(combine::list(&self.name, members, ctx)),
            PaletteSource::Apps => apps::list(ctx.platform).map(Listing::new),
            PaletteSource::Index => Ok(Listing::new(index(&self.name, ctx.config))),
            PaletteSource::Ssh(settings) => Ok(Listing::new(ssh::list(settings))),
            PaletteSource::Bookmarks(settings) => {
                bookmarks::list(&self.name, settings).map(Listing::new)
            }
            PaletteSource::Plugin(plugin) => Ok(Listing::new(plugin.list()?)),
        }
    }

    /// Act on the item called `name`.
    pub fn pick(&self, ctx: &PaletteContext<'_>, name: &str) -> PalResult<PickOutcome> {
        tracing::debug!(palette = %self.name, name, "Palette pick");
        match &self.source {
            PaletteSource::Static(_) | PaletteSource::JsonLines(_) => {
                let items = self.source.list_data(&self.name)?;
                data::pick(&items, name, ctx.platform)
            }
            PaletteSource::Combine(members) => combine::pick(&self.name, members, ctx, name),
            PaletteSource::Apps => apps::pick(ctx.platform, name),
            PaletteSource::Index => Ok(if ctx.config.palettes.contains_key(name) {
                PickOutcome::Open(name.to_string())
            } else {
                PickOutcome::NotFound
            }),
            PaletteSource::Ssh(settings) => ssh::pick(settings, ctx.platform, name),
            PaletteSource::Bookmarks(settings) => {
                bookmarks::pick(&self.name, settings, ctx.platform, name)
            }
            PaletteSource::Plugin(plugin) => {
                plugin.pick(name)?;
                Ok(PickOutcome::Done)
            }
        }
    }
}

/// First item in `items` whose name is `name`.
pub(crate) fn find_by_name(items: &[Value], name: &str) -> Option<Item> {
    items.iter().filter_map(|v| Item::from_value(v.clone())).find(|item| item.name() == name)
}

fn index(own_name: &str, config: &Config) -> Vec<Value> {
    config
        .palettes
        .iter()
        .filter(|(name, _)| name.as_str() != own_name)
        .map(|(name, palette)| {
            json!({ "name": name, "desc": palette.base_or(name), "icon": "folder" })
        })
        .collect()
}
