//! Plugin runtime.
//!
//! Plugins are external executables used as palettes. A palette's `base`
//! string is resolved to a builtin, a local executable or an executable in a
//! git repository that is cloned on first use.
//!
//! # Example Configuration
//!
//! ```toml
//! [palettes.ssh]
//! base = "github.com/someone/pal-plugins/ssh"
//! hosts_file = "~/.ssh/config"
//! ```
//!
//! The plugin sees `hosts_file` in `PAL_PLUGIN_CONFIG`.

mod error;
mod exec;
pub mod remote;
mod resolver;

pub use error::{PluginError, PluginResult};
pub use exec::{ExecPlugin, PALETTE_ENV, PLUGIN_CONFIG_ENV};
pub use remote::{HeadInfo, InstalledRemote};
pub use resolver::{GitCli, GitCloner, GitRemote, PluginLocation, PluginResolver};
