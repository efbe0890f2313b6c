//! # Reference Resolver
//!
//! Removes `_include`, `_use`, `_flatten` and `_flatten_sep` from a tree.
//!
//! For every mapping node:
//!
//! 1. `_flatten` / `_flatten_sep` are taken off the node. They shape the
//!    content pulled in by the node's directives, not the node's own keys.
//! 2. Until a pass substitutes nothing (at most [`MAX_SUBSTITUTIONS`] passes):
//!    - `_include` files are loaded, flattened and merged in listing order,
//!      then placed underneath the node's own keys;
//!    - `_use` names are looked up in the reuse sources, merged in listing
//!      order, resolved, flattened and placed underneath the node's own keys.
//! 3. Every remaining mapping or sequence value is resolved the same way.
//!
//! The node's own keys always win, over both included and reused content.
//!
//! Reuse sources are an ordered list of trees; the first tree holding a
//! present value at the dotted name wins. With self-reference enabled the
//! first source is the document being resolved, and it is rebound at the
//! node's path after every substitution so later lookups see what has
//! already been resolved.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_yaml::{Mapping, Value};

use crate::defaults::MAX_SUBSTITUTIONS;
use crate::deps::Dependencies;
use crate::directive::{directive_list, FlattenSpec, IncludeSpec, INCLUDE_KEY, USE_KEY};
use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::path::{child_location, index_location, normalize, parse_path, PathSegment};
use crate::tree::{empty_map, flatten, key_to_string, lookup, merge_into, set_path, ConfigTree};

/// Resolves the directives of one document.
pub(crate) struct Resolver<'a> {
    loader: &'a Loader,
    owner: PathBuf,
    /// Files currently being included, outermost first, ending with `owner`.
    chain: Vec<PathBuf>,
    includes: bool,
    /// `None` leaves `_use` in place for the including document to resolve.
    sources: Option<Vec<ConfigTree>>,
    self_ref: bool,
    include_path_field: Option<String>,
    deps: Dependencies,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(loader: &'a Loader, owner: &Path) -> Self {
        let owner = normalize(owner);
        Self {
            loader,
            chain: vec![owner.clone()],
            owner,
            includes: true,
            sources: None,
            self_ref: false,
            include_path_field: None,
            deps: Dependencies::new(),
        }
    }

    pub(crate) fn with_chain(mut self, chain: Vec<PathBuf>) -> Self {
        self.chain = chain;
        self
    }

    pub(crate) fn includes(mut self, enabled: bool) -> Self {
        self.includes = enabled;
        self
    }

    /// Enable `_use` against `sources`. With `self_ref`, `sources[0]` must be
    /// the document being resolved.
    pub(crate) fn with_sources(mut self, sources: Vec<ConfigTree>, self_ref: bool) -> Self {
        self.self_ref = self_ref && !sources.is_empty();
        self.sources = Some(sources);
        self
    }

    pub(crate) fn include_path_field(mut self, field: Option<String>) -> Self {
        self.include_path_field = field;
        self
    }

    /// Resolve `tree`, labelling errors with `location`.
    pub(crate) fn resolve(
        mut self,
        tree: ConfigTree,
        location: &str,
    ) -> Result<(ConfigTree, Dependencies)> {
        let root: Option<Vec<PathSegment>> = self.self_ref.then(Vec::new);
        let tree = self.resolve_node(tree, location, root.as_deref(), 0)?;
        Ok((tree, self.deps))
    }

    fn error(&self, location: &str, message: impl Into<String>) -> Error {
        Error::resolution(location, self.owner.display().to_string(), message)
    }

    fn limit_error(&self, location: &str) -> Error {
        self.error(
            location,
            format!("recursion limit of {} substitutions exceeded", MAX_SUBSTITUTIONS),
        )
    }

    fn resolve_node(
        &mut self,
        node: ConfigTree,
        location: &str,
        self_path: Option<&[PathSegment]>,
        depth: usize,
    ) -> Result<ConfigTree> {
        match node {
            Value::Mapping(map) => self.resolve_map(map, location, self_path, depth),
            Value::Sequence(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let item_path = self_path.map(|p| extended(p, PathSegment::Index(index)));
                    resolved.push(self.resolve_node(
                        item,
                        &index_location(location, index),
                        item_path.as_deref(),
                        depth,
                    )?);
                }
                Ok(Value::Sequence(resolved))
            }
            scalar => Ok(scalar),
        }
    }

    fn resolve_map(
        &mut self,
        mut conf: Mapping,
        location: &str,
        self_path: Option<&[PathSegment]>,
        depth: usize,
    ) -> Result<ConfigTree> {
        let spec = FlattenSpec::take(&mut conf).map_err(|m| self.error(location, m))?;

        let mut passes = 0;
        loop {
            let pending_include = self.includes && conf.contains_key(INCLUDE_KEY);
            let pending_use = self.sources.is_some() && conf.contains_key(USE_KEY);
            if !pending_include && !pending_use {
                break;
            }
            if passes >= MAX_SUBSTITUTIONS {
                return Err(self.limit_error(location));
            }
            passes += 1;

            if pending_include {
                if let Some(value) = conf.shift_remove(INCLUDE_KEY) {
                    let included = self.include(&value, location, &spec)?;
                    conf = underlay(included, conf);
                    self.rebind(self_path, &conf);
                }
            }

            // Included content may itself carry `_use`.
            if self.sources.is_some() {
                if let Some(value) = conf.shift_remove(USE_KEY) {
                    let base = self.reuse(&value, location, &spec, depth)?;
                    conf = underlay(base, conf);
                    self.rebind(self_path, &conf);
                }
            }
        }

        let mut resolved = Mapping::with_capacity(conf.len());
        for (key, value) in conf {
            let value = if value.is_mapping() || value.is_sequence() {
                let name = key_to_string(&key);
                let child_path = self_path.map(|p| extended(p, PathSegment::Key(name.clone())));
                self.resolve_node(
                    value,
                    &child_location(location, &name),
                    child_path.as_deref(),
                    depth,
                )?
            } else {
                value
            };
            resolved.insert(key, value);
        }

        Ok(Value::Mapping(resolved))
    }

    /// Load and merge the files named by an `_include` value.
    fn include(&mut self, value: &Value, location: &str, spec: &FlattenSpec) -> Result<ConfigTree> {
        let entries = directive_list(INCLUDE_KEY, value).map_err(|m| self.error(location, m))?;

        let mut merged = empty_map();
        for entry in &entries {
            let include = IncludeSpec::parse(entry).map_err(|m| self.error(location, m))?;
            let Some(path) = self.find_include(&include, entry, location)? else {
                continue;
            };

            if self.chain.contains(&path) {
                let cycle: Vec<String> = self
                    .chain
                    .iter()
                    .chain(std::iter::once(&path))
                    .map(|p| p.display().to_string())
                    .collect();
                return Err(self.error(location, format!("include cycle: {}", cycle.join(" -> "))));
            }

            debug!("{}: including {}", self.owner.display(), path.display());
            let (tree, deps) = self.loader.load_included(
                &path,
                &self.chain,
                location,
                self.include_path_field.as_deref(),
            )?;
            self.deps.update(&deps);

            if !tree.is_mapping() {
                return Err(self.error(
                    location,
                    format!("included file {} does not contain a mapping", path.display()),
                ));
            }
            merge_into(&mut merged, &flatten(&tree, spec.depth, &spec.sep));
        }

        Ok(merged)
    }

    /// Find the file an include entry refers to.
    ///
    /// Returns `None` for a missing optional include, after recording a
    /// failure for every place it was looked for.
    fn find_include(
        &mut self,
        include: &IncludeSpec,
        raw: &str,
        location: &str,
    ) -> Result<Option<PathBuf>> {
        let loader = self.loader;
        let config = loader.config();
        let relative = Path::new(&include.path);

        let candidates: Vec<PathBuf> = if let Some(package) = &include.package {
            config.packages.resolve(package, relative).into_iter().collect()
        } else if relative.is_absolute() {
            vec![relative.to_path_buf()]
        } else {
            let own_dir = self.owner.parent().map(Path::to_path_buf).unwrap_or_default();
            std::iter::once(own_dir)
                .chain(config.include_paths.iter().cloned())
                .map(|dir| normalize(&dir.join(relative)))
                .collect()
        };

        if let Some(found) = candidates.iter().find(|c| c.is_file()) {
            return Ok(Some(normalize(found)));
        }

        if !include.optional {
            let searched = if candidates.is_empty() {
                format!("package '{}' not found", include.package.as_deref().unwrap_or_default())
            } else {
                candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            return Err(self.error(
                location,
                format!("include '{}' not found (searched: {})", raw, searched),
            ));
        }

        if include.warn {
            warn!(
                "{}: optional include '{}' not found",
                self.owner.display(),
                raw
            );
        }

        match &include.package {
            Some(package) => {
                self.deps
                    .add_failure(raw, &self.owner, Some(package), Some(relative));
            }
            None => {
                for candidate in &candidates {
                    self.deps.add_failure(candidate, &self.owner, None, None);
                }
            }
        }

        Ok(None)
    }

    /// Build the resolved base for a `_use` value.
    fn reuse(
        &mut self,
        value: &Value,
        location: &str,
        spec: &FlattenSpec,
        depth: usize,
    ) -> Result<ConfigTree> {
        let names = directive_list(USE_KEY, value).map_err(|m| self.error(location, m))?;

        let mut base = empty_map();
        for name in &names {
            let segments = parse_path(name);
            let found = self
                .sources
                .as_ref()
                .and_then(|sources| sources.iter().find_map(|tree| lookup(tree, &segments)))
                .cloned();
            let Some(section) = found else {
                return Err(self.error(location, format!("unknown section '{}' in {}", name, USE_KEY)));
            };
            if !section.is_mapping() {
                return Err(self.error(
                    location,
                    format!("section '{}' used by {} is not a mapping", name, USE_KEY),
                ));
            }
            merge_into(&mut base, &section);
        }

        if depth >= MAX_SUBSTITUTIONS {
            return Err(self.limit_error(location));
        }
        // The base is not part of the document, so it never rebinds.
        let base = self.resolve_node(base, location, None, depth + 1)?;
        Ok(flatten(&base, spec.depth, &spec.sep))
    }

    /// Point the self-reference source at the node's current form.
    fn rebind(&mut self, self_path: Option<&[PathSegment]>, conf: &Mapping) {
        let Some(path) = self_path else {
            return;
        };
        if let Some(root) = self.sources.as_mut().and_then(|s| s.first_mut()) {
            set_path(root, path, Value::Mapping(conf.clone()));
        }
    }
}

fn extended(path: &[PathSegment], segment: PathSegment) -> Vec<PathSegment> {
    let mut extended = path.to_vec();
    extended.push(segment);
    extended
}

/// Place `conf` on top of `base`; `conf` wins.
fn underlay(base: ConfigTree, conf: Mapping) -> Mapping {
    let mut merged = match base {
        Value::Mapping(map) => map,
        _ => Mapping::new(),
    };
    for (key, value) in conf {
        match merged.get_mut(&key) {
            Some(existing) if existing.is_mapping() && value.is_mapping() => {
                merge_into(existing, &value);
            }
            _ => {
                merged.insert(key, value);
            }
        }
    }
    merged
}
