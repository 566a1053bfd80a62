//! Core types and functionality for pal.
//!
//! This module contains the fundamental data structures used throughout
//! the launcher: items, configuration, errors, process execution, the
//! replay cache and the action dispatcher.

mod cache;
mod config;
mod dispatch;
mod error;
mod executor;
mod item;

pub use cache::{
    default_cache_root, CacheEntry, CacheFile, Invocation, ReplayCache, CACHE_DIR_ENV,
};
pub use config::{
    expand_path, Config, GeneralConfig, PaletteConfig, PathsConfig, PickerConfig, CONFIG_ENV,
    DEFAULT_CONFIG,
};
pub use dispatch::{ActionKind, Dispatch, Dispatcher};
pub use error::{LineError, PalError, PalResult};
pub use executor::{get_shell, ExecutionResult, Executor};
pub use item::{parse_json_lines, Action, Item, ACTION_FIELDS, PALETTE_TAG};
