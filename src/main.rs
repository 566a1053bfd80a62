//! pal - pick an item from a palette and act on it.
//!
//! Palettes list items, pickers (fzf, rofi) show them, and the selection is
//! either acted on directly or handed back to its palette.

#![allow(clippy::single_match_else)]

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pal::core::{ActionKind, Config, Dispatcher, Item, ReplayCache, DEFAULT_CONFIG};
use pal::picker::SystemProcess;
use pal::plugin::{remote, GitCli, GitRemote};
use pal::{platform, replay_cached, BuiltinPalette, FastPath, Runner, Services};

/// Pick an item from a palette and act on it
#[derive(Parser)]
#[command(name = "pal")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the default search path
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a palette in a picker (default)
    Run {
        /// Picker to use (defaults to general.default_picker)
        picker: Option<String>,

        /// Palette to show (defaults to general.default_palette)
        palette: Option<String>,

        /// Ignore and rebuild the replay cache entry
        #[arg(long)]
        refresh: bool,
    },

    /// Print a palette's items without a picker
    List {
        /// Palette to list (defaults to general.default_palette)
        palette: Option<String>,

        /// Output format (jsonl, text)
        #[arg(short, long, default_value = "jsonl")]
        format: String,
    },

    /// Act on an item by name, as if it had been picked
    Pick {
        /// Palette the item belongs to
        palette: String,

        /// Item name
        name: String,
    },

    /// Perform one action on a value, without a palette
    Action {
        /// Action to perform (cmd, url, file, copy)
        kind: String,

        /// Value to act on; read from stdin when omitted
        value: Option<String>,
    },

    /// List configured palettes
    Palettes,

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,

        /// Print the built-in defaults
        #[arg(long, conflicts_with = "path")]
        defaults: bool,
    },

    /// Write the default config to the user config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Manage the replay cache
    Cache {
        #[command(subcommand)]
        operation: CacheOperation,
    },

    /// Manage plugins cloned from git hosts
    Plugins {
        #[command(subcommand)]
        operation: PluginsOperation,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheOperation {
    /// List cache entries
    List,

    /// Remove cache entries
    Clear {
        /// Only entries for this picker
        picker: Option<String>,

        /// Only entries for this palette
        palette: Option<String>,
    },

    /// Print the cache directory
    Path,
}

#[derive(Subcommand)]
enum PluginsOperation {
    /// List cloned plugins
    List,

    /// Pull cloned plugins (fast-forward only)
    Update {
        /// Only this plugin (`host/owner/repo`)
        name: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    // The picker owns the terminal and handles Ctrl+C itself; pal just waits
    // for it to exit.
    if let Err(e) = ctrlc::set_handler(|| {}) {
        tracing::debug!(error = %e, "Could not install Ctrl+C handler");
    }

    let config_path = cli.config.as_deref();

    // Handle commands
    match cli.command {
        None => {
            cmd_run(config_path, None, None, false)?;
        }
        Some(Commands::Run { picker, palette, refresh }) => {
            cmd_run(config_path, picker, palette, refresh)?;
        }
        Some(Commands::List { palette, format }) => {
            cmd_list(config_path, palette, &format)?;
        }
        Some(Commands::Pick { palette, name }) => {
            cmd_pick(config_path, &palette, &name)?;
        }
        Some(Commands::Action { kind, value }) => {
            cmd_action(&kind, value)?;
        }
        Some(Commands::Palettes) => {
            cmd_palettes(config_path)?;
        }
        Some(Commands::Config { path, defaults }) => {
            cmd_config(config_path, path, defaults)?;
        }
        Some(Commands::Init { force }) => {
            cmd_init(force)?;
        }
        Some(Commands::Cache { operation }) => {
            cmd_cache(operation)?;
        }
        Some(Commands::Plugins { operation }) => {
            cmd_plugins(config_path, operation)?;
        }
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

/// Show a palette in a picker.
///
/// When both names are given, a cached invocation is replayed before any
/// configuration is loaded.
fn cmd_run(
    config_path: Option<&Path>,
    picker: Option<String>,
    palette: Option<String>,
    refresh: bool,
) -> Result<()> {
    let cache = ReplayCache::from_env();
    let platform = platform::detect();

    if let (Some(picker), Some(palette), false) = (&picker, &palette, refresh) {
        match replay_cached(&cache, picker, palette, &SystemProcess, platform.as_ref())? {
            FastPath::Replayed(dispatch) => {
                tracing::debug!(?dispatch, "Served from cache");
                return Ok(());
            }
            FastPath::Miss => {
                tracing::debug!(picker = %picker, palette = %palette, "Cache miss");
            }
        }
    }

    let config = Config::load(config_path)?;
    let picker = picker.unwrap_or_else(|| config.general.default_picker.clone());
    let palette = palette.unwrap_or_else(|| config.general.default_palette.clone());

    if refresh {
        cache.clear(Some(&picker), Some(&palette))?;
    }

    let services =
        Services { platform: platform.as_ref(), process: &SystemProcess, cloner: &GitCli };
    let runner = Runner::new(&config, &picker, services).with_cache(cache);
    let outcome = runner.run_palette(&palette)?;
    tracing::debug!(?outcome, "Run finished");

    Ok(())
}

/// Print a palette's items.
fn cmd_list(config_path: Option<&Path>, palette: Option<String>, format: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    let palette = palette.unwrap_or_else(|| config.general.default_palette.clone());
    let platform = platform::detect();

    let services =
        Services { platform: platform.as_ref(), process: &SystemProcess, cloner: &GitCli };
    let runner = Runner::new(&config, &config.general.default_picker, services);
    let listing = runner.list_palette(&palette)?;

    match format {
        "jsonl" | "json" => {
            for item in &listing.items {
                println!("{}", serde_json::to_string(item)?);
            }
        }
        "text" => {
            for item in listing.items.into_iter().filter_map(Item::from_value) {
                match item.desc() {
                    Some(desc) => println!("{}\t{}", item.name(), desc),
                    None => println!("{}", item.name()),
                }
            }
        }
        other => anyhow::bail!("Unknown format: {other}. Supported: jsonl, text"),
    }

    Ok(())
}

/// Act on an item by name.
fn cmd_pick(config_path: Option<&Path>, palette: &str, name: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    let platform = platform::detect();

    let services =
        Services { platform: platform.as_ref(), process: &SystemProcess, cloner: &GitCli };
    let runner = Runner::new(&config, &config.general.default_picker, services);
    let outcome = runner.pick_item(palette, name)?;
    tracing::debug!(?outcome, "Pick finished");

    Ok(())
}

/// Perform one action on a bare value.
fn cmd_action(kind: &str, value: Option<String>) -> Result<()> {
    let Some(kind) = ActionKind::from_field(kind) else {
        anyhow::bail!("Unknown action: {kind}. Supported: cmd, url, file, copy");
    };

    let value = match value {
        Some(value) => value,
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            input.trim_end().to_string()
        }
    };
    if value.is_empty() {
        anyhow::bail!("Nothing to {}: the value is empty", kind.field());
    }

    let platform = platform::detect();
    Dispatcher::new(platform.as_ref()).perform(kind, &value)?;
    Ok(())
}

/// List configured palettes without resolving them.
fn cmd_palettes(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    for (name, palette) in &config.palettes {
        let base = palette.base_or(name);
        let kind = if BuiltinPalette::from_name(base).is_some() {
            "builtin"
        } else {
            match GitRemote::parse(base, &config.paths.git_hosts) {
                Ok(Some(_)) => "git",
                Ok(None) => "plugin",
                Err(_) => "invalid",
            }
        };
        println!("{name}\t{base}\t{kind}");
    }

    Ok(())
}

/// Show configuration.
fn cmd_config(config_path: Option<&Path>, show_path: bool, defaults: bool) -> Result<()> {
    if defaults {
        print!("{DEFAULT_CONFIG}");
        return Ok(());
    }

    if show_path {
        match Config::find_user_file(config_path)?.or_else(Config::user_config_path) {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine config directory"),
        }
        return Ok(());
    }

    let config = Config::load(config_path)?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

/// Write the defaults template.
fn cmd_init(force: bool) -> Result<()> {
    let path = Config::init(force)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Manage the replay cache.
fn cmd_cache(operation: CacheOperation) -> Result<()> {
    let cache = ReplayCache::from_env();

    match operation {
        CacheOperation::List => {
            let files = cache.list()?;
            if files.is_empty() {
                println!("No cache entries.");
            }
            for file in files {
                println!("{}\t{}\t{}", file.picker, file.palette, file.path.display());
            }
        }
        CacheOperation::Clear { picker, palette } => {
            let removed = cache.clear(picker.as_deref(), palette.as_deref())?;
            println!("Removed {removed} cache entr{}", if removed == 1 { "y" } else { "ies" });
        }
        CacheOperation::Path => {
            println!("{}", cache.dir().display());
        }
    }

    Ok(())
}

/// Manage cloned plugins.
fn cmd_plugins(config_path: Option<&Path>, operation: PluginsOperation) -> Result<()> {
    let config = Config::load(config_path)?;
    let installed = remote::installed(&config.paths.clone_dir());

    match operation {
        PluginsOperation::List => {
            if installed.is_empty() {
                println!("No plugins cloned.");
                println!("\nPlugins are cloned on first use of a palette such as:");
                println!("  [palettes.notes]");
                println!("  base = \"github.com/owner/repo/notes\"");
                return Ok(());
            }

            for plugin in &installed {
                match &plugin.head {
                    Some(head) => println!(
                        "{}\t{}\t{}\t{}",
                        plugin.name, head.short_id, head.date, head.summary
                    ),
                    None => println!("{}", plugin.name),
                }
            }
        }
        PluginsOperation::Update { name } => {
            let targets: Vec<_> = installed
                .iter()
                .filter(|p| name.as_deref().is_none_or(|n| n == p.name))
                .collect();
            if let (Some(name), true) = (&name, targets.is_empty()) {
                anyhow::bail!("Plugin not cloned: {name}");
            }

            let mut failed = 0;
            for plugin in targets {
                match remote::update(&plugin.path) {
                    Ok(()) => println!("Updated {}", plugin.name),
                    Err(e) => {
                        eprintln!("{}: {e}", plugin.name);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} plugin(s) failed to update");
            }
        }
    }

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "pal", &mut io::stdout());
}
