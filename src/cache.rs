//! On-disk cache of resolved configuration
//!
//! Each entry maps an ordered list of input files (plus caller-supplied
//! extra keys) to the `(tree, ledger)` pair produced by resolving them.
//! Entries live as individual YAML blobs under the cache root, named by a
//! SHA-256 digest of the key material.
//!
//! The key never depends on file contents. Staleness is decided at lookup
//! time: an entry is discarded if any input file is newer than the entry, or
//! if the stored ledger reports a changed dependency relative to the
//! entry's own mtime.
//!
//! Every fault while reading the cache degrades to a miss. A payload that
//! fails to deserialize is deleted so the next save can replace it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::defaults::ENGINE_VERSION;
use crate::deps::{Attributes, Dependencies};
use crate::error::{Error, Result};
use crate::packages::PackageRegistry;
use crate::path::normalize;
use crate::tree::ConfigTree;

const ENTRY_EXTENSION: &str = "yml";

/// Compute the cache key for an ordered list of inputs and extra keys.
pub fn cache_key(paths: &[PathBuf], extra_keys: &[String]) -> String {
    let mut hasher = Sha256::new();
    for path in paths {
        hasher.update(normalize(path).to_string_lossy().as_bytes());
        hasher.update([0u8]);
    }
    // Separates the path list from the extras so ["a"] + ["b"] and
    // ["a", "b"] + [] digest differently.
    hasher.update([0xffu8]);
    for key in extra_keys {
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// The persisted payload.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    engine: String,
    inputs: Vec<PathBuf>,
    tree: ConfigTree,
    deps: Dependencies,
}

/// Summary of one cache entry, for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntryInfo {
    /// Digest naming the entry.
    pub key: String,
    /// Input files the entry was computed from (empty if unreadable).
    pub inputs: Vec<PathBuf>,
    /// Size of the blob in bytes.
    pub size: u64,
    /// When the entry was written.
    pub modified: Option<SystemTime>,
    /// Location of the blob.
    pub path: PathBuf,
}

/// Hash-keyed on-disk cache of resolved trees.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    packages: PackageRegistry,
}

impl CacheStore {
    /// Cache rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            packages: PackageRegistry::new(),
        }
    }

    /// Package registry used to re-check failed package includes.
    pub fn with_packages(mut self, packages: PackageRegistry) -> Self {
        self.packages = packages;
        self
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the blob for `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, ENTRY_EXTENSION))
    }

    /// Look up a still-valid entry for `paths` and `extra_keys`.
    pub fn load_cache(
        &self,
        paths: &[PathBuf],
        extra_keys: &[String],
    ) -> Option<(ConfigTree, Dependencies)> {
        if !self.root.is_dir() {
            return None;
        }

        let key = cache_key(paths, extra_keys);
        let entry = self.entry_path(&key);
        let entry_mtime = fs::metadata(&entry).and_then(|m| m.modified()).ok()?;

        for path in paths {
            match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(mtime) if mtime <= entry_mtime => {}
                _ => {
                    debug!("cache miss for {}: input changed", path.display());
                    return None;
                }
            }
        }

        let envelope: CacheEnvelope = match fs::read_to_string(&entry)
            .map_err(Error::from)
            .and_then(|text| serde_yaml::from_str(&text).map_err(Error::from))
        {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("discarding corrupt cache entry {}: {}", entry.display(), e);
                self.discard(&entry);
                return None;
            }
        };

        if envelope.engine != ENGINE_VERSION {
            debug!(
                "discarding cache entry {} written by {}",
                entry.display(),
                envelope.engine
            );
            self.discard(&entry);
            return None;
        }

        if envelope.deps.have_deps_changed(entry_mtime, &self.packages) {
            debug!("cache miss for {}: dependencies changed", entry.display());
            return None;
        }

        debug!("cache hit {}", entry.display());
        Some((envelope.tree, envelope.deps))
    }

    /// Persist `(tree, deps)` for `paths` and `extra_keys`.
    ///
    /// Adds the running engine itself to `deps` first, so entries written by
    /// another build are never reused.
    pub fn save_cache(
        &self,
        paths: &[PathBuf],
        tree: &ConfigTree,
        deps: &mut Dependencies,
        extra_keys: &[String],
    ) -> Result<()> {
        if let Ok(exe) = std::env::current_exe() {
            deps.add_dependency(
                exe,
                None,
                false,
                Attributes::from([("engine".to_string(), ENGINE_VERSION.to_string())]),
            );
        }

        fs::create_dir_all(&self.root)?;

        let key = cache_key(paths, extra_keys);
        let entry = self.entry_path(&key);
        let envelope = CacheEnvelope {
            engine: ENGINE_VERSION.to_string(),
            inputs: paths.iter().map(|p| normalize(p)).collect(),
            tree: tree.clone(),
            deps: deps.clone(),
        };
        let payload = serde_yaml::to_string(&envelope)?;

        // Write-then-rename so concurrent readers never see a partial blob.
        let staging = self
            .root
            .join(format!(".{}.{}.tmp", key, std::process::id()));
        fs::write(&staging, payload)?;
        fs::rename(&staging, &entry)?;

        info!("cached {} input(s) as {}", paths.len(), entry.display());
        Ok(())
    }

    /// List entries under the cache root, sorted by key.
    pub fn entries(&self) -> Result<Vec<CacheEntryInfo>> {
        let mut entries = Vec::new();
        if !self.root.is_dir() {
            return Ok(entries);
        }

        for item in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .flatten()
        {
            let path = item.path();
            let Some(key) = entry_key(path) else {
                continue;
            };
            let metadata = item.metadata().map_err(|e| Error::Cache {
                message: format!("cannot stat {}: {}", path.display(), e),
            })?;
            let inputs = fs::read_to_string(path)
                .ok()
                .and_then(|text| serde_yaml::from_str::<CacheEnvelope>(&text).ok())
                .map(|envelope| envelope.inputs)
                .unwrap_or_default();

            entries.push(CacheEntryInfo {
                key,
                inputs,
                size: metadata.len(),
                modified: metadata.modified().ok(),
                path: path.to_path_buf(),
            });
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Delete the entry for `key`. Returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let entry = self.entry_path(key);
        if !entry.exists() {
            return Ok(false);
        }
        fs::remove_file(&entry).map_err(|e| Error::Cache {
            message: format!("cannot remove {}: {}", entry.display(), e),
        })?;
        Ok(true)
    }

    /// Delete every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.entries()?;
        for entry in &entries {
            self.remove(&entry.key)?;
        }
        Ok(entries.len())
    }

    fn discard(&self, entry: &Path) {
        if let Err(e) = fs::remove_file(entry) {
            debug!("cannot remove cache entry {}: {}", entry.display(), e);
        }
    }
}

/// Key of a cache blob path, if the file name looks like one.
fn entry_key(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    (stem.len() == 64 && stem.chars().all(|c| c.is_ascii_hexdigit())).then(|| stem.to_string())
}
