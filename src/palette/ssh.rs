//! Hosts from the SSH client configuration.
//!
//! `Host` lines of the config file (following `Include`) and unhashed
//! `known_hosts` entries are listed; patterns and bare IP addresses are
//! left out. Picking a host runs `ssh <host>`, prefixed by the palette's
//! `terminal` command when one is set.
//!
//! ```toml
//! [palettes.ssh]
//! terminal = "alacritty -e"   # optional
//! ssh_config = "~/.ssh/config"
//! known_hosts = false         # or a path
//! ```

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::{json, Value};

use super::PickOutcome;
use crate::core::{expand_path, PalResult, PaletteConfig};
use crate::platform::Platform;

const DEFAULT_CONFIG: &str = "~/.ssh/config";
const DEFAULT_KNOWN_HOSTS: &str = "~/.ssh/known_hosts";

/// Include nesting limit, as in OpenSSH.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Where hosts come from and how they are opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshSettings {
    /// Client configuration file
    pub config_file: PathBuf,

    /// `known_hosts` file, when it is listed at all
    pub known_hosts: Option<PathBuf>,

    /// Command prefix that runs a program in a new terminal
    pub terminal: Option<String>,
}

impl SshSettings {
    /// Settings from the palette's `ssh_config`, `known_hosts` and
    /// `terminal` keys.
    pub fn from_config(config: &PaletteConfig) -> Self {
        let known_hosts = match config.extra.get("known_hosts") {
            Some(Value::Bool(false)) => None,
            Some(Value::String(path)) => Some(expand_path(path)),
            _ => Some(expand_path(DEFAULT_KNOWN_HOSTS)),
        };

        Self {
            config_file: expand_path(config.extra_str("ssh_config").unwrap_or(DEFAULT_CONFIG)),
            known_hosts,
            terminal: config.extra_str("terminal").filter(|t| !t.is_empty()).map(String::from),
        }
    }

    /// Shell command line connecting to `host`.
    pub fn command(&self, host: &str) -> String {
        let ssh = format!("ssh {}", shell_quote(host));
        match &self.terminal {
            Some(terminal) => format!("{terminal} {ssh}"),
            None => ssh,
        }
    }
}

pub(super) fn list(settings: &SshSettings) -> Vec<Value> {
    hosts(settings)
        .into_iter()
        .map(|host| json!({ "name": host, "icon": "network-server" }))
        .collect()
}

pub(super) fn pick(
    settings: &SshSettings,
    platform: &dyn Platform,
    name: &str,
) -> PalResult<PickOutcome> {
    if !hosts(settings).contains(name) {
        return Ok(PickOutcome::NotFound);
    }
    platform.run_shell(&settings.command(name))?;
    Ok(PickOutcome::Done)
}

/// Hosts from both sources, sorted and deduplicated.
fn hosts(settings: &SshSettings) -> BTreeSet<String> {
    let mut hosts = BTreeSet::new();
    read_config(&settings.config_file, 0, &mut hosts);

    if let Some(path) = &settings.known_hosts {
        match std::fs::read_to_string(path) {
            Ok(content) => hosts.extend(known_hosts(&content)),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "No known_hosts"),
        }
    }
    hosts
}

fn read_config(path: &Path, depth: usize, hosts: &mut BTreeSet<String>) {
    if depth > MAX_INCLUDE_DEPTH {
        tracing::warn!(path = %path.display(), "ssh config includes nest too deep");
        return;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Skipping ssh config");
            return;
        }
    };
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    for (keyword, args) in directives(&content) {
        if keyword.eq_ignore_ascii_case("host") {
            hosts.extend(args.into_iter().filter(|h| !is_pattern(h)).map(String::from));
        } else if keyword.eq_ignore_ascii_case("include") {
            for pattern in args {
                for file in include_files(base_dir, pattern) {
                    read_config(&file, depth + 1, hosts);
                }
            }
        }
    }
}

/// `(keyword, arguments)` for each directive line.
fn directives(content: &str) -> impl Iterator<Item = (&str, Vec<&str>)> {
    content.lines().filter_map(|line| {
        let line = line.trim();
        if line.starts_with('#') {
            return None;
        }
        let (keyword, rest) = line.split_once(|c: char| c.is_whitespace() || c == '=')?;
        let args = rest
            .trim_start_matches(|c: char| c.is_whitespace() || c == '=')
            .split_whitespace()
            .take_while(|arg| !arg.starts_with('#'))
            .collect();
        Some((keyword, args))
    })
}

/// Files named by an `Include` argument. Relative paths are taken from the
/// including file's directory; `*` and `?` match within the file name.
fn include_files(base_dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let expanded = expand_path(pattern);
    let path = if expanded.is_absolute() { expanded } else { base_dir.join(expanded) };

    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    if !name.contains(['*', '?']) {
        return vec![path];
    }

    let (Some(matcher), Some(dir)) = (glob_regex(name), path.parent()) else {
        return Vec::new();
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .filter(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(|n| matcher.is_match(n)))
        .collect();
    files.sort();
    files
}

fn glob_regex(glob: &str) -> Option<Regex> {
    let mut pattern = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).ok()
}

/// Host names from `known_hosts` content.
///
/// Hashed entries, marker lines (`@revoked`, `@cert-authority`) and IP
/// addresses are skipped. `[host]:port` yields `host`.
fn known_hosts(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(['#', '@', '|']))
        .filter_map(|line| line.split_whitespace().next())
        .flat_map(|field| field.split(','))
        .map(|host| {
            host.strip_prefix('[').and_then(|h| h.split_once(']')).map_or(host, |(h, _)| h)
        })
        .filter(|host| !host.is_empty() && !is_pattern(host) && host.parse::<IpAddr>().is_err())
        .map(String::from)
}

fn is_pattern(host: &str) -> bool {
    host.contains(['*', '?', '!'])
}

fn shell_quote(word: &str) -> String {
    let plain = |c: char| c.is_ascii_alphanumeric() || "-._@:%+/".contains(c);
    if !word.is_empty() && word.chars().all(plain) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
