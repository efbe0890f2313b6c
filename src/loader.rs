//! # Loader API
//!
//! [`Loader::load`] turns one file into a resolved tree and its dependency
//! ledger. [`Loader::load_nested`] does the same for a list of files and
//! assembles the results into a mapping of named sections.
//!
//! Both consult the [`CacheStore`] first when the loader has a cache
//! directory, and write their result back on a miss. Files pulled in by
//! `_include` go through the same path, so each included file is cached on
//! its own as well.
//!
//! ```no_run
//! use recipe_config::config::LoaderConfig;
//! use recipe_config::loader::{LoadOptions, Loader};
//!
//! let loader = Loader::new(LoaderConfig::from_env());
//! let (tree, deps) = loader.load("recipe.yml", LoadOptions::new())?;
//! println!("{} files consulted", deps.len());
//! # let _ = tree;
//! # Ok::<(), recipe_config::error::Error>(())
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::cache::CacheStore;
use crate::config::LoaderConfig;
use crate::deps::{Attributes, Dependencies};
use crate::error::{Error, Result};
use crate::parser::{DocumentParser, YamlParser};
use crate::path::{glob_base_dir, normalize};
use crate::resolver::Resolver;
use crate::schema::Schema;
use crate::tree::ConfigTree;

/// Options for [`Loader::load`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Trees searched, in order, for `_use` names.
    pub use_sources: Option<Vec<ConfigTree>>,
    /// Name of the document; used as the location label when `location` is
    /// unset.
    pub name: Option<String>,
    /// Dotted location label prefixed to errors.
    pub location: Option<String>,
    /// Follow `_include` directives.
    pub includes: bool,
    /// Search the document itself for `_use` names, ahead of `use_sources`.
    pub self_refs: bool,
    /// Store each loaded file's absolute path under this top-level key.
    pub include_path_field: Option<String>,
    /// Consult and update the persistent cache.
    pub use_cache: bool,
    /// Extra strings distinguishing cache entries.
    pub cache_keys: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_sources: None,
            name: None,
            location: None,
            includes: true,
            self_refs: true,
            include_path_field: None,
            use_cache: true,
            cache_keys: Vec::new(),
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_sources(mut self, sources: Vec<ConfigTree>) -> Self {
        self.use_sources = Some(sources);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn includes(mut self, enabled: bool) -> Self {
        self.includes = enabled;
        self
    }

    pub fn self_refs(mut self, enabled: bool) -> Self {
        self.self_refs = enabled;
        self
    }

    pub fn include_path_field(mut self, field: impl Into<String>) -> Self {
        self.include_path_field = Some(field.into());
        self
    }

    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_keys.push(key.into());
        self
    }
}

/// How a nested load names each section.
#[derive(Default)]
pub enum SectionName {
    /// The file name without its extension.
    #[default]
    FileStem,
    /// A string field of the loaded section, falling back to the file stem.
    Field(String),
    /// A caller-supplied function of the file and its loaded section.
    Custom(Box<dyn Fn(&Path, &ConfigTree) -> String>),
}

impl fmt::Debug for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionName::FileStem => f.write_str("FileStem"),
            SectionName::Field(field) => f.debug_tuple("Field").field(field).finish(),
            SectionName::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl SectionName {
    fn section_name(&self, path: &Path, section: &ConfigTree) -> String {
        let stem = || {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        match self {
            SectionName::FileStem => stem(),
            SectionName::Field(field) => section
                .get(field.as_str())
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(stem),
            SectionName::Custom(name) => name(path, section),
        }
    }

    /// `None` when the naming cannot be described by a cache key.
    fn cache_key(&self) -> Option<String> {
        match self {
            SectionName::FileStem => Some("name=stem".to_string()),
            SectionName::Field(field) => Some(format!("name=field:{}", field)),
            SectionName::Custom(_) => None,
        }
    }
}

/// Options for [`Loader::load_nested`].
#[derive(Debug, Default)]
pub struct NestedOptions {
    /// Defaults and type checks merged into every section.
    pub schema: Option<Schema>,
    /// Trees searched for `_use` names in every file.
    pub use_sources: Option<Vec<ConfigTree>>,
    /// Dotted location label prefixed to errors.
    pub location: Option<String>,
    /// How sections are named.
    pub name: SectionName,
    /// Store each loaded file's absolute path under this top-level key.
    pub include_path_field: Option<String>,
    /// Skip the persistent cache when `true`.
    pub no_cache: bool,
    /// Extra strings distinguishing cache entries.
    pub cache_keys: Vec<String>,
}

impl NestedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn use_sources(mut self, sources: Vec<ConfigTree>) -> Self {
        self.use_sources = Some(sources);
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn name(mut self, name: SectionName) -> Self {
        self.name = name;
        self
    }

    pub fn include_path_field(mut self, field: impl Into<String>) -> Self {
        self.include_path_field = Some(field.into());
        self
    }

    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.no_cache = !enabled;
        self
    }

    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_keys.push(key.into());
        self
    }

    fn file_options(&self) -> LoadOptions {
        LoadOptions {
            use_sources: self.use_sources.clone(),
            location: self.location.clone(),
            include_path_field: self.include_path_field.clone(),
            use_cache: !self.no_cache,
            cache_keys: self.cache_keys.clone(),
            ..LoadOptions::default()
        }
    }
}

/// Sections of a typed nested load, keyed by section name in file order.
pub type NestedSections<T> = IndexMap<String, T>;

/// One file's request, shared by top-level and included loads.
struct FileRequest<'r> {
    path: PathBuf,
    location: String,
    includes: bool,
    /// `None` defers `_use` to the including document.
    sources: Option<Vec<ConfigTree>>,
    self_refs: bool,
    include_path_field: Option<&'r str>,
    chain: Vec<PathBuf>,
    /// `None` bypasses the cache.
    cache_keys: Option<Vec<String>>,
}

/// Loads and resolves configuration documents.
pub struct Loader {
    config: LoaderConfig,
    parser: Box<dyn DocumentParser>,
    cache: Option<CacheStore>,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Loader {
    /// Loader parsing YAML, caching under `config.cache_dir` if set.
    pub fn new(config: LoaderConfig) -> Self {
        let cache = config
            .cache_dir
            .as_ref()
            .map(|dir| CacheStore::new(dir).with_packages(config.packages.clone()));
        Self {
            config,
            parser: Box::new(YamlParser),
            cache,
        }
    }

    /// Replace the document parser.
    pub fn with_parser(mut self, parser: Box<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The cache store, if caching is configured.
    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }

    /// Load and resolve one file.
    pub fn load(
        &self,
        path: impl AsRef<Path>,
        options: LoadOptions,
    ) -> Result<(ConfigTree, Dependencies)> {
        let path = normalize(path.as_ref());
        let cache_keys = self.load_cache_keys(&options);
        let location = options
            .location
            .or(options.name)
            .unwrap_or_default();

        self.load_file(FileRequest {
            chain: vec![path.clone()],
            path,
            location,
            includes: options.includes,
            sources: Some(options.use_sources.unwrap_or_default()),
            self_refs: options.self_refs,
            include_path_field: options.include_path_field.as_deref(),
            cache_keys,
        })
    }

    /// Resolve an in-memory tree as if it had been read from `owner`.
    ///
    /// Never cached. Relative includes are searched from `owner`'s directory.
    pub fn resolve(
        &self,
        tree: ConfigTree,
        owner: impl AsRef<Path>,
        options: LoadOptions,
    ) -> Result<(ConfigTree, Dependencies)> {
        let mut sources = options.use_sources.unwrap_or_default();
        if options.self_refs {
            sources.insert(0, tree.clone());
        }
        let location = options.location.or(options.name).unwrap_or_default();
        Resolver::new(self, owner.as_ref())
            .includes(options.includes)
            .with_sources(sources, options.self_refs)
            .include_path_field(options.include_path_field)
            .resolve(tree, &location)
    }

    /// Load a file named by an `_include`. `_use` is left for the includer.
    pub(crate) fn load_included(
        &self,
        path: &Path,
        chain: &[PathBuf],
        location: &str,
        include_path_field: Option<&str>,
    ) -> Result<(ConfigTree, Dependencies)> {
        let mut chain = chain.to_vec();
        chain.push(normalize(path));

        self.load_file(FileRequest {
            path: normalize(path),
            location: location.to_string(),
            includes: true,
            sources: None,
            self_refs: false,
            include_path_field,
            chain,
            cache_keys: Some(self.settings_keys("included", include_path_field)),
        })
    }

    fn load_file(&self, request: FileRequest<'_>) -> Result<(ConfigTree, Dependencies)> {
        let inputs = [request.path.clone()];
        let store = request
            .cache_keys
            .as_ref()
            .and_then(|keys| self.cache.as_ref().map(|store| (store, keys)));

        if let Some((store, keys)) = store {
            if let Some(hit) = store.load_cache(&inputs, keys) {
                return Ok(hit);
            }
        }

        let raw = self.parser.parse(&request.path)?;
        let mut deps = Dependencies::new();
        deps.add(&request.path);

        let mut resolver = Resolver::new(self, &request.path)
            .with_chain(request.chain)
            .includes(request.includes)
            .include_path_field(request.include_path_field.map(str::to_string));
        if let Some(mut sources) = request.sources {
            if request.self_refs {
                sources.insert(0, raw.clone());
            }
            resolver = resolver.with_sources(sources, request.self_refs);
        }

        let (mut tree, resolved_deps) = resolver.resolve(raw, &request.location)?;
        deps.update(&resolved_deps);

        if let (Some(field), Value::Mapping(map)) = (request.include_path_field, &mut tree) {
            map.insert(
                Value::String(field.to_string()),
                Value::String(request.path.display().to_string()),
            );
        }

        if let Some((store, keys)) = store {
            if let Err(e) = store.save_cache(&inputs, &tree, &mut deps, keys) {
                warn!("cannot cache {}: {}", request.path.display(), e);
            }
        }

        Ok((tree, deps))
    }

    /// Load every file in `paths` as a named section.
    ///
    /// Returns a mapping of section name to resolved section, in file order.
    /// A later file whose section name repeats an earlier one replaces it.
    pub fn load_nested(
        &self,
        paths: &[impl AsRef<Path>],
        options: NestedOptions,
    ) -> Result<(ConfigTree, Dependencies)> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| normalize(p.as_ref())).collect();
        let cache_keys = self.nested_cache_keys(&options);
        let store = cache_keys
            .as_ref()
            .and_then(|keys| self.cache.as_ref().map(|store| (store, keys)));

        if let Some((store, keys)) = store {
            if let Some(hit) = store.load_cache(&paths, keys) {
                return Ok(hit);
            }
        }

        let (sections, mut deps) = self.assemble(&paths, &options)?;
        let mut tree = Mapping::with_capacity(sections.len());
        for (name, (_, section)) in sections {
            tree.insert(Value::String(name), section);
        }
        let tree = Value::Mapping(tree);

        if let Some((store, keys)) = store {
            if let Err(e) = store.save_cache(&paths, &tree, &mut deps, keys) {
                warn!("cannot cache nested load of {} file(s): {}", paths.len(), e);
            }
        }

        Ok((tree, deps))
    }

    /// Like [`load_nested`](Self::load_nested), deserializing every section
    /// into `T`.
    ///
    /// Only the per-file cache is consulted.
    pub fn load_nested_typed<T: DeserializeOwned>(
        &self,
        paths: &[impl AsRef<Path>],
        options: NestedOptions,
    ) -> Result<(NestedSections<T>, Dependencies)> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| normalize(p.as_ref())).collect();
        let (sections, deps) = self.assemble(&paths, &options)?;

        let mut typed = NestedSections::with_capacity(sections.len());
        for (name, (path, section)) in sections {
            let value: T = serde_yaml::from_value(section).map_err(|e| {
                Error::schema(path.display().to_string(), format!("section '{}': {}", name, e))
            })?;
            typed.insert(name, value);
        }
        Ok((typed, deps))
    }

    /// Load every file matching a glob pattern as a named section.
    ///
    /// Matches are loaded in sorted order. In the returned ledger the
    /// matched files are accounted under the pattern's base directory.
    pub fn load_nested_glob(
        &self,
        pattern: &str,
        options: NestedOptions,
    ) -> Result<(ConfigTree, Dependencies)> {
        let pattern = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            normalize(Path::new(".")).join(pattern).display().to_string()
        };

        let mut paths = Vec::new();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => debug!("skipping unreadable match for {}: {}", pattern, e),
            }
        }
        paths.sort();

        let (tree, mut deps) = self.load_nested(&paths, options)?;
        deps.replace(&[pattern.as_str()], glob_base_dir(&pattern), Attributes::new())?;
        Ok((tree, deps))
    }

    /// Load each file and name its section. Values carry the source file.
    fn assemble(
        &self,
        paths: &[PathBuf],
        options: &NestedOptions,
    ) -> Result<(IndexMap<String, (PathBuf, ConfigTree)>, Dependencies)> {
        let mut sections: IndexMap<String, (PathBuf, ConfigTree)> = IndexMap::new();
        let mut deps = Dependencies::new();

        for path in paths {
            let (section, section_deps) = self.load(path, options.file_options())?;
            deps.update(&section_deps);

            let name = options.name.section_name(path, &section);
            let section = match &options.schema {
                Some(schema) => schema.apply(&section, path)?,
                None => section,
            };

            if let Some((previous, _)) = sections.get(&name) {
                warn!(
                    "section '{}' from {} replaces the one from {}",
                    name,
                    path.display(),
                    previous.display()
                );
            }
            sections.insert(name, (path.clone(), section));
        }

        Ok((sections, deps))
    }

    /// Cache keys for a top-level load, `None` when it must not be cached.
    fn load_cache_keys(&self, options: &LoadOptions) -> Option<Vec<String>> {
        if !options.use_cache || (options.use_sources.is_some() && options.cache_keys.is_empty()) {
            return None;
        }
        let mode = format!(
            "load includes={} self-refs={}",
            options.includes, options.self_refs
        );
        let mut keys = self.settings_keys(&mode, options.include_path_field.as_deref());
        keys.extend(options.cache_keys.iter().cloned());
        Some(keys)
    }

    fn nested_cache_keys(&self, options: &NestedOptions) -> Option<Vec<String>> {
        if options.no_cache || (options.use_sources.is_some() && options.cache_keys.is_empty()) {
            return None;
        }
        let naming = options.name.cache_key();
        if naming.is_none() && options.cache_keys.is_empty() {
            return None;
        }
        let mut keys = self.settings_keys("nested", options.include_path_field.as_deref());
        keys.extend(naming);
        keys.extend(options.schema.as_ref().map(Schema::cache_key));
        keys.extend(options.cache_keys.iter().cloned());
        Some(keys)
    }

    /// Keys describing every loader setting that changes a result.
    fn settings_keys(&self, mode: &str, include_path_field: Option<&str>) -> Vec<String> {
        let mut keys = vec![format!("mode={}", mode)];
        keys.extend(self.config.include_path_keys());
        keys.extend(
            self.config
                .packages
                .registered()
                .map(|(name, dir)| format!("package={}={}", name, dir.display())),
        );
        keys.extend(
            self.config
                .packages
                .search_roots()
                .iter()
                .map(|root| format!("package-root={}", root.display())),
        );
        if let Some(field) = include_path_field {
            keys.push(format!("include-path-field={}", field));
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use tempfile::TempDir;

    fn yaml(text: &str) -> ConfigTree {
        serde_yaml::from_str(text).unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn loader() -> Loader {
        Loader::new(LoaderConfig::new())
    }

    #[test]
    fn test_load_records_file_and_includes() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "inc.yml", "a: 1\n");
        let root = write(temp.path(), "root.yml", "_include: inc.yml\nb: 2\n");

        let (tree, deps) = loader().load(&root, LoadOptions::new()).unwrap();
        assert_eq!(tree, yaml("a: 1\nb: 2"));
        assert!(deps.contains(&root));
        assert!(deps.contains(temp.path().join("inc.yml")));
        assert_eq!(deps.iter().next().unwrap().0, normalize(&root));
    }

    #[test]
    fn test_include_path_field() {
        let temp = TempDir::new().unwrap();
        let root = write(temp.path(), "root.yml", "a: 1\n");
        let (tree, _) = loader()
            .load(&root, LoadOptions::new().include_path_field("source"))
            .unwrap();
        assert_eq!(tree["source"], Value::String(normalize(&root).display().to_string()));
    }

    #[test]
    fn test_location_label_in_errors() {
        let temp = TempDir::new().unwrap();
        let root = write(temp.path(), "root.yml", "x: {_use: missing}\n");
        let err = loader()
            .load(&root, LoadOptions::new().name("recipe"))
            .unwrap_err();
        match err {
            Error::Resolution { location, .. } => assert_eq!(location, "recipe.x"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_use_without_self_refs_is_error() {
        let temp = TempDir::new().unwrap();
        let root = write(temp.path(), "root.yml", "a: {k: 1}\nb: {_use: a}\n");
        let err = loader()
            .load(&root, LoadOptions::new().self_refs(false))
            .unwrap_err();
        assert!(err.is_resolution());
    }

    #[test]
    fn test_resolve_in_memory_tree() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "inc.yml", "a: 1\n");
        let (tree, deps) = loader()
            .resolve(
                yaml("_include: inc.yml\nb: 2"),
                temp.path().join("virtual.yml"),
                LoadOptions::new(),
            )
            .unwrap();
        assert_eq!(tree, yaml("a: 1\nb: 2"));
        assert!(deps.contains(temp.path().join("inc.yml")));
    }

    #[test]
    fn test_nested_names_and_schema() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "wsclean.yml", "image: wsclean\n");
        let b = write(temp.path(), "cubical.yml", "image: cubical\nname: cc\n");
        let schema = Schema::new(yaml("image: null\nthreads: 1\nname: null"));

        let (tree, deps) = loader()
            .load_nested(
                &[a.clone(), b.clone()],
                NestedOptions::new()
                    .schema(schema)
                    .name(SectionName::Field("name".into())),
            )
            .unwrap();

        let names: Vec<&str> = tree
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(names, vec!["wsclean", "cc"]);
        assert_eq!(tree["wsclean"]["threads"], yaml("1"));
        assert!(deps.contains(&a) && deps.contains(&b));
    }

    #[test]
    fn test_nested_custom_names() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a.yml", "x: 1\n");
        let (tree, _) = loader()
            .load_nested(
                &[a],
                NestedOptions::new().name(SectionName::Custom(Box::new(|path, _| {
                    format!("cab_{}", path.file_stem().unwrap().to_string_lossy())
                }))),
            )
            .unwrap();
        assert_eq!(tree, yaml("cab_a: {x: 1}"));
    }

    #[test]
    fn test_nested_schema_error_names_file() {
        let temp = TempDir::new().unwrap();
        let bad = write(temp.path(), "bad.yml", "threads: many\n");
        let err = loader()
            .load_nested(
                &[bad],
                NestedOptions::new().schema(Schema::new(yaml("threads: 1"))),
            )
            .unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("bad.yml"));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Cab {
        image: String,
        #[serde(default)]
        threads: u32,
    }

    #[test]
    fn test_nested_typed() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "wsclean.yml", "image: wsclean\nthreads: 8\n");
        let b = write(temp.path(), "aoflagger.yml", "image: aoflagger\n");

        let (cabs, _) = loader()
            .load_nested_typed::<Cab>(&[a, b], NestedOptions::new())
            .unwrap();
        assert_eq!(cabs.keys().collect::<Vec<_>>(), vec!["wsclean", "aoflagger"]);
        assert_eq!(cabs["wsclean"].threads, 8);
        assert_eq!(cabs["aoflagger"].image, "aoflagger");
    }

    #[test]
    fn test_nested_typed_error_names_file() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "broken.yml", "threads: 8\n");
        let err = loader()
            .load_nested_typed::<Cab>(&[a], NestedOptions::new())
            .unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("broken.yml"));
    }

    #[test]
    fn test_nested_glob_collapses_ledger() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "cabs/b.yml", "image: b\n");
        write(temp.path(), "cabs/a.yml", "image: a\n");
        let pattern = format!("{}/cabs/*.yml", temp.path().display());

        let (tree, deps) = loader()
            .load_nested_glob(&pattern, NestedOptions::new())
            .unwrap();
        let names: Vec<&str> = tree
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let cabs = normalize(&temp.path().join("cabs"));
        assert_eq!(
            deps.get(temp.path().join("cabs/a.yml")).unwrap().origin,
            Some(cabs.clone())
        );
        assert!(deps.get(&cabs).unwrap().origin.is_none());
    }

    #[test]
    fn test_cache_keys_follow_settings() {
        let plain = loader();
        let with_root = Loader::new(LoaderConfig::new().with_include_path("/opt/recipes"));
        let options = LoadOptions::new();
        assert_ne!(
            plain.load_cache_keys(&options),
            with_root.load_cache_keys(&options)
        );
        assert_ne!(
            plain.load_cache_keys(&options),
            plain.load_cache_keys(&LoadOptions::new().self_refs(false))
        );
        assert!(plain
            .load_cache_keys(&LoadOptions::new().use_sources(vec![]))
            .is_none());
        assert!(plain
            .load_cache_keys(&LoadOptions::new().use_sources(vec![]).cache_key("v1"))
            .is_some());
    }
}
