#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::match_wildcard_for_single_variants)]

//! # pal
//!
//! A launcher: pick an item from a palette in fzf or rofi, then act on it.
//!
//! A palette is a named item source. Items are JSON objects; an item with a
//! `cmd`, `url`, `file` or `copy` field is acted on directly, anything else
//! is handed back to the palette that listed it.
//!
//! ## Features
//!
//! - **Builtin palettes**: commands from config, installed apps, a combined
//!   view and an index of palettes
//! - **Plugins**: any executable that prints JSON lines, local or cloned
//!   from a git host on first use
//! - **Replay cache**: cacheable palettes skip configuration and plugins
//!   entirely on the next run
//!
//! ## Quick Start
//!
//! ```bash
//! # Combined palette in fzf
//! pal
//!
//! # A specific picker and palette
//! pal run rofi apps
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unnecessary_literal_bound)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::redundant_clone)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::use_self)]

pub mod core;
pub mod palette;
pub mod picker;
pub mod platform;
pub mod plugin;
pub mod runner;

// Re-export commonly used types
pub use crate::core::{Config, Item, PalError, PalResult, ReplayCache};
pub use palette::{BuiltinPalette, Palette, PaletteContext};
pub use picker::{Picker, PickerDriver};
pub use plugin::{PluginError, PluginResult};
pub use runner::{replay_cached, FastPath, RunOutcome, Runner, Services};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "pal";
