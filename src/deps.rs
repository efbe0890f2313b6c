//! # Dependency Ledger
//!
//! Every load produces a [`Dependencies`] ledger alongside the resolved tree.
//! It records each file consulted while resolving (with mtime, content hash
//! and git metadata) and each optional include that could not be found.
//!
//! The ledger serves two purposes:
//!
//! - **Cache invalidation.** [`Dependencies::have_deps_changed`] is the only
//!   staleness oracle the cache store uses. A cached result is stale if any
//!   recorded file vanished or was modified after the entry was written, or
//!   if a previously missing optional include has since appeared.
//! - **Provenance.** The ledger can be saved next to pipeline outputs so a
//!   run records exactly which configuration files, at which versions,
//!   produced it.
//!
//! Entries are keyed by absolute path. The first writer of a path wins, so
//! merging ledgers from nested includes never overwrites the metadata
//! captured when a file was first seen.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::git::{git_info_for, GitInfo};
use crate::packages::PackageRegistry;
use crate::path::{glob_match, normalize};

/// Extra string attributes attached to a dependency record.
pub type Attributes = BTreeMap<String, String>;

/// A file or directory consulted during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DependencyRecord {
    /// Modification time, seconds since the Unix epoch. Zero for pointer
    /// and missing entries.
    #[serde(default)]
    pub mtime: f64,
    /// Human-readable local modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime_str: Option<String>,
    /// SHA-256 of the file contents (files only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Git metadata for the owning directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
    /// For pointer-only entries, the dependency this one is accounted under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<PathBuf>,
    /// The path did not exist when recorded.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
    /// Caller-supplied extra attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: Attributes,
}

/// An optional include that could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedInclude {
    /// Path that was looked for (for package includes, the spec as written).
    pub path: PathBuf,
    /// File whose `_include` asked for it.
    pub origin: PathBuf,
    /// Package qualifier, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Path relative to the package install location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<PathBuf>,
}

/// The per-load ledger of consulted files and failed optional includes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependencies {
    #[serde(default)]
    deps: IndexMap<PathBuf, DependencyRecord>,
    #[serde(default)]
    failed: IndexMap<PathBuf, FailedInclude>,
}

/// Seconds since the Unix epoch as a float.
pub fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn content_hash(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(content) => Some(hex::encode(Sha256::digest(&content))),
        Err(e) => {
            debug!("cannot hash {}: {}", path.display(), e);
            None
        }
    }
}

impl Dependencies {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `path` with full metadata.
    pub fn add(&mut self, path: impl AsRef<Path>) {
        self.add_dependency(path, None, false, Attributes::new());
    }

    /// Track `path`.
    ///
    /// - With `origin`, a pointer-only entry is recorded.
    /// - With `missing`, or when the path does not exist, a sentinel entry is
    ///   recorded that reads as stale as soon as the path appears.
    /// - Otherwise mtime, content hash (files only) and git metadata are
    ///   captured.
    ///
    /// Already-tracked paths are left untouched.
    pub fn add_dependency(
        &mut self,
        path: impl AsRef<Path>,
        origin: Option<&Path>,
        missing: bool,
        attrs: Attributes,
    ) {
        let path = normalize(path.as_ref());
        if self.deps.contains_key(&path) {
            return;
        }

        let record = if let Some(origin) = origin {
            DependencyRecord {
                origin: Some(normalize(origin)),
                attrs,
                ..Default::default()
            }
        } else {
            match (missing, file_mtime(&path)) {
                (false, Some(mtime)) => DependencyRecord {
                    mtime: epoch_seconds(mtime),
                    mtime_str: Some(
                        DateTime::<Local>::from(mtime)
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string(),
                    ),
                    hash: if path.is_dir() {
                        None
                    } else {
                        content_hash(&path)
                    },
                    git: git_info_for(&path),
                    attrs,
                    ..Default::default()
                },
                _ => DependencyRecord {
                    missing: true,
                    attrs,
                    ..Default::default()
                },
            }
        };

        self.deps.insert(path, record);
    }

    /// Record an optional include that could not be found.
    pub fn add_failure(
        &mut self,
        path: impl AsRef<Path>,
        origin: impl AsRef<Path>,
        package: Option<&str>,
        file_name: Option<&Path>,
    ) {
        let key = if package.is_some() {
            path.as_ref().to_path_buf()
        } else {
            normalize(path.as_ref())
        };
        self.failed.entry(key.clone()).or_insert_with(|| FailedInclude {
            path: key,
            origin: normalize(origin.as_ref()),
            package: package.map(str::to_string),
            file_name: file_name.map(Path::to_path_buf),
        });
    }

    /// Collapse every tracked path matching one of `patterns` into a
    /// pointer-only entry under `directory`, then track `directory` itself.
    ///
    /// Keeps the ledger small when many files come from one wildcard.
    pub fn replace(
        &mut self,
        patterns: &[impl AsRef<str>],
        directory: impl AsRef<Path>,
        attrs: Attributes,
    ) -> Result<()> {
        let directory = normalize(directory.as_ref());

        let mut matched = Vec::new();
        for path in self.deps.keys() {
            for pattern in patterns {
                if glob_match(pattern.as_ref(), path)? {
                    matched.push(path.clone());
                    break;
                }
            }
        }

        for path in matched {
            if path == directory {
                continue;
            }
            self.deps.insert(
                path,
                DependencyRecord {
                    origin: Some(directory.clone()),
                    ..Default::default()
                },
            );
        }

        self.add_dependency(&directory, None, false, attrs);
        Ok(())
    }

    /// Merge `other` into this ledger. Existing entries win; failures are
    /// unioned.
    pub fn update(&mut self, other: &Dependencies) {
        for (path, record) in &other.deps {
            if !self.deps.contains_key(path) {
                self.deps.insert(path.clone(), record.clone());
            }
        }
        for (path, failure) in &other.failed {
            if !self.failed.contains_key(path) {
                self.failed.insert(path.clone(), failure.clone());
            }
        }
    }

    /// True if anything recorded here changed after `reference`.
    ///
    /// A change is any tracked path that no longer exists or carries a newer
    /// mtime, any missing sentinel whose path now exists, or any failed
    /// optional include whose target can now be found.
    pub fn have_deps_changed(&self, reference: SystemTime, packages: &PackageRegistry) -> bool {
        let reference = epoch_seconds(reference);

        for (path, record) in &self.deps {
            let mtime = file_mtime(path);
            if record.missing {
                if mtime.is_some() {
                    debug!("previously missing dependency {} now exists", path.display());
                    return true;
                }
                continue;
            }
            match mtime {
                None => {
                    debug!("dependency {} no longer exists", path.display());
                    return true;
                }
                Some(mtime) if epoch_seconds(mtime) > reference => {
                    debug!("dependency {} modified", path.display());
                    return true;
                }
                Some(_) => {}
            }
        }

        for failure in self.failed.values() {
            let target = match (&failure.package, &failure.file_name) {
                (Some(package), Some(file_name)) => packages.resolve(package, file_name),
                (Some(_), None) => None,
                (None, _) => Some(failure.path.clone()),
            };
            if let Some(target) = target {
                if target.exists() {
                    debug!("optional include {} now exists", target.display());
                    return true;
                }
            }
        }

        false
    }

    /// Record for `path`, if tracked.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&DependencyRecord> {
        self.deps.get(&normalize(path.as_ref()))
    }

    /// True if `path` is tracked.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.deps.contains_key(&normalize(path.as_ref()))
    }

    /// Tracked dependencies in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &DependencyRecord)> {
        self.deps.iter().map(|(p, r)| (p.as_path(), r))
    }

    /// Failed optional includes in insertion order.
    pub fn failures(&self) -> impl Iterator<Item = &FailedInclude> {
        self.failed.values()
    }

    /// Number of tracked dependencies.
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// True if no dependency is tracked.
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Write the ledger as YAML for provenance reporting.
    pub fn save(&self, filename: impl AsRef<Path>) -> Result<()> {
        let filename = filename.as_ref();
        if let Some(parent) = filename.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(filename, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Read a ledger written by [`save`](Self::save).
    pub fn from_file(filename: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(filename.as_ref())?;
        Ok(serde_yaml::from_str(&content)?)
    }
}
