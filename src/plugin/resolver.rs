//! Resolution of a palette `base` string to where its implementation lives.
//!
//! A base is one of:
//! - a builtin palette name (`commands`, `combine`, `apps`, `palettes`,
//!   `ssh`, `bookmarks`)
//! - an absolute path to an executable
//! - `host/owner/repo[/sub/path]` on a known git host, cloned on first use
//! - a relative path containing `/`, taken from the working directory
//! - a bare plugin name, looked up in the plugins directory

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::error::{PluginError, PluginResult};
use crate::core::{Executor, PathsConfig};
use crate::palette::BuiltinPalette;

/// Resolved form of a `base` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginLocation {
    /// In-process palette.
    Builtin(BuiltinPalette),

    /// Executable on the local filesystem.
    Local(PathBuf),

    /// Executable inside a cloned git repository.
    Git {
        /// Root of the clone
        clone_dir: PathBuf,
        /// Executable inside the clone
        executable: PathBuf,
    },
}

impl PluginLocation {
    /// Executable to run, if this is not a builtin.
    pub fn executable(&self) -> Option<&Path> {
        match self {
            Self::Builtin(_) => None,
            Self::Local(path) => Some(path),
            Self::Git { executable, .. } => Some(executable),
        }
    }
}

/// A `host/owner/repo[/sub/path]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRemote {
    pub host: String,
    pub owner: String,
    pub repo: String,
    /// Path segments inside the repository
    pub sub_path: Vec<String>,
}

impl GitRemote {
    /// Parse a base string whose first segment is one of `hosts`.
    ///
    /// Returns `Ok(None)` when `base` is not a git reference at all. A `.`
    /// or `..` segment is an error, since every segment becomes a path
    /// component under the clone root.
    pub fn parse(base: &str, hosts: &[String]) -> PluginResult<Option<Self>> {
        let segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
        let [host, owner, repo, sub_path @ ..] = segments.as_slice() else {
            return Ok(None);
        };
        if !hosts.iter().any(|h| h == host) {
            return Ok(None);
        }
        if segments.iter().any(|s| matches!(*s, "." | "..")) {
            return Err(PluginError::InvalidRemote(base.to_string()));
        }

        let repo = repo.trim_end_matches(".git");
        if repo.is_empty() || repo == "." || repo == ".." {
            return Err(PluginError::InvalidRemote(base.to_string()));
        }

        Ok(Some(Self {
            host: (*host).to_string(),
            owner: (*owner).to_string(),
            repo: repo.to_string(),
            sub_path: sub_path.iter().map(ToString::to_string).collect(),
        }))
    }

    /// HTTPS clone URL.
    pub fn url(&self) -> String {
        format!("https://{}/{}/{}.git", self.host, self.owner, self.repo)
    }

    /// Clone directory under `root`, mirroring `host/owner/repo`.
    pub fn clone_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.host).join(&self.owner).join(&self.repo)
    }

    /// Executable inside a clone: the sub-path, or the repo name.
    pub fn executable(&self, clone_dir: &Path) -> PathBuf {
        if self.sub_path.is_empty() {
            clone_dir.join(&self.repo)
        } else {
            self.sub_path.iter().fold(clone_dir.to_path_buf(), |path, seg| path.join(seg))
        }
    }
}

/// Performs shallow clones.
pub trait GitCloner {
    /// Clone `url` into `dest` with depth 1.
    fn clone_shallow(&self, url: &str, dest: &Path) -> PluginResult<()>;
}

/// Clones by running the `git` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl GitCloner for GitCli {
    fn clone_shallow(&self, url: &str, dest: &Path) -> PluginResult<()> {
        let args: [&OsStr; 4] =
            [OsStr::new("clone"), OsStr::new("--depth=1"), OsStr::new(url), dest.as_os_str()];
        let result = Executor::new()
            .capture_stderr(true)
            .run("git", args)
            .map_err(PluginError::GitUnavailable)?;

        if !result.success() {
            return Err(PluginError::CloneFailed {
                url: url.to_string(),
                code: result.code(),
                stderr: result.stderr_trimmed().to_string(),
            });
        }
        Ok(())
    }
}

/// Maps base strings to [`PluginLocation`]s.
pub struct PluginResolver<'a> {
    paths: &'a PathsConfig,
    cloner: &'a dyn GitCloner,
}

impl<'a> PluginResolver<'a> {
    /// Create a resolver.
    pub fn new(paths: &'a PathsConfig, cloner: &'a dyn GitCloner) -> Self {
        Self { paths, cloner }
    }

    /// Resolve `base`, cloning a git-hosted plugin if it is not present yet.
    ///
    /// An existing clone directory is trusted as is; it is never pulled or
    /// verified here.
    pub fn resolve(&self, base: &str) -> PluginResult<PluginLocation> {
        if let Some(builtin) = BuiltinPalette::from_name(base) {
            return Ok(PluginLocation::Builtin(builtin));
        }

        let path = Path::new(base);
        if path.is_absolute() {
            return Ok(PluginLocation::Local(path.to_path_buf()));
        }

        if let Some(remote) = GitRemote::parse(base, &self.paths.git_hosts)? {
            let clone_dir = remote.clone_dir(&self.paths.clone_dir());
            if !clone_dir.exists() {
                if let Some(parent) = clone_dir.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let url = remote.url();
                tracing::info!(url = %url, dest = %clone_dir.display(), "Cloning plugin");
                self.cloner.clone_shallow(&url, &clone_dir)?;
            }
            let executable = remote.executable(&clone_dir);
            return Ok(PluginLocation::Git { clone_dir, executable });
        }

        if base.contains('/') {
            return Ok(PluginLocation::Local(std::env::current_dir()?.join(path)));
        }

        Ok(PluginLocation::Local(self.paths.plugins_dir().join(base)))
    }
}
