//! Version-control metadata for dependency records
//!
//! Each dependency recorded in the ledger carries, when available, the git
//! branch, a `git describe` label and the remote URLs of the repository
//! holding it. The metadata is obtained with the system `git` command and
//! memoized per directory for the lifetime of the process, so one
//! resolution run queries each directory at most once.
//!
//! A directory outside any repository, or a host without `git`, is not an
//! error: the dependency simply carries no metadata.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, OnceLock};

use log::debug;
use serde::{Deserialize, Serialize};

/// Git metadata for the directory owning a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    /// Current branch (`HEAD` when detached).
    pub branch: String,
    /// Output of `git describe --always --tags --dirty`.
    pub describe: String,
    /// Remote URLs, one `name url` entry per remote.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remotes: Vec<String>,
}

/// Run `git` in `dir`, returning trimmed stdout on success.
fn run_git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(|e| debug!("git {} failed to start in {}: {}", args.join(" "), dir.display(), e))
        .ok()?;

    if !output.status.success() {
        debug!(
            "git {} in {}: {}",
            args.join(" "),
            dir.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Query git for metadata about `dir` without memoization.
pub fn probe(dir: &Path) -> Option<GitInfo> {
    let branch = run_git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    let describe = run_git(dir, &["describe", "--always", "--tags", "--dirty"]).unwrap_or_default();
    let remotes = run_git(dir, &["remote", "-v"])
        .map(|out| parse_remotes(&out))
        .unwrap_or_default();

    Some(GitInfo {
        branch,
        describe,
        remotes,
    })
}

/// Collapse `git remote -v` output into unique `name url` entries.
fn parse_remotes(output: &str) -> Vec<String> {
    let mut remotes: Vec<String> = Vec::new();
    for line in output.lines() {
        // <name>\t<url> (fetch|push)
        let mut parts = line.split_whitespace();
        if let (Some(name), Some(url)) = (parts.next(), parts.next()) {
            let entry = format!("{} {}", name, url);
            if !remotes.contains(&entry) {
                remotes.push(entry);
            }
        }
    }
    remotes
}

/// Per-directory memo of git metadata.
#[derive(Debug, Default)]
pub struct GitInfoCache {
    cache: Mutex<HashMap<PathBuf, Option<GitInfo>>>,
}

impl GitInfoCache {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the metadata for `dir`, or compute and remember it
    pub fn get_or_probe<F>(&self, dir: &Path, prober: F) -> Option<GitInfo>
    where
        F: FnOnce(&Path) -> Option<GitInfo>,
    {
        // A poisoned lock only means another thread panicked mid-insert; the
        // map itself is still usable.
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = cache.get(dir) {
                return cached.clone();
            }
        }

        let info = prober(dir);

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(dir.to_path_buf(), info.clone());
        info
    }

    /// Number of directories probed so far.
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True if nothing has been probed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Git metadata for the directory owning `path`, memoized per process.
///
/// Queries the realpath of `path` (its parent when `path` is a file).
pub fn git_info_for(path: &Path) -> Option<GitInfo> {
    static SHARED: OnceLock<GitInfoCache> = OnceLock::new();

    let real = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let dir = if real.is_dir() {
        real
    } else {
        real.parent().map(Path::to_path_buf)?
    };

    SHARED.get_or_init(GitInfoCache::new).get_or_probe(&dir, probe)
}
