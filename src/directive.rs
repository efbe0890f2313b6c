//! Directive parsing
//!
//! Four reserved keys drive resolution:
//!
//! - `_include`: one file name or a list of them. Each name may carry a
//!   trailing flag list (`file.yml[optional]`, `file.yml[optional,warn]`) and
//!   a leading package qualifier (`(mypkg)cabs/file.yml`).
//! - `_use`: one dotted section name or a list of them.
//! - `_flatten`: a non-negative depth for the flatten transform.
//! - `_flatten_sep`: the separator the flatten transform joins keys with.

use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::tree::type_name;

pub const INCLUDE_KEY: &str = "_include";
pub const USE_KEY: &str = "_use";
pub const FLATTEN_KEY: &str = "_flatten";
pub const FLATTEN_SEP_KEY: &str = "_flatten_sep";

/// Default separator for `_flatten`.
pub const DEFAULT_FLATTEN_SEP: &str = "__";

/// A parsed `_include` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSpec {
    /// Path as written, with flags and package qualifier stripped.
    pub path: String,
    /// Package whose install location the path is relative to.
    pub package: Option<String>,
    /// Missing targets are recorded instead of raising.
    pub optional: bool,
    /// Emit a warning when an optional target is missing.
    pub warn: bool,
}

fn flags_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)\s*\[([^\[\]]*)\]\s*$").expect("valid flags regex"))
}

fn package_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\(([^()]+)\)(.+)$").expect("valid package regex"))
}

impl IncludeSpec {
    /// Parse an include entry. Errors are plain messages; the resolver adds
    /// location and file context.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut text = raw.trim();
        let mut optional = false;
        let mut warn = false;

        if let Some(caps) = flags_regex().captures(text) {
            for flag in caps[2].split(',').map(|f| f.trim().to_lowercase()) {
                match flag.as_str() {
                    "optional" => optional = true,
                    "warn" => {
                        optional = true;
                        warn = true;
                    }
                    "" => {}
                    other => return Err(format!("unknown include flag '{}' in '{}'", other, raw)),
                }
            }
            text = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        }

        let (package, path) = match package_regex().captures(text) {
            Some(caps) => (Some(caps[1].trim().to_string()), caps[2].trim().to_string()),
            None => (None, text.to_string()),
        };

        if path.is_empty() {
            return Err(format!("empty include path in '{}'", raw));
        }

        Ok(IncludeSpec {
            path,
            package,
            optional,
            warn,
        })
    }
}

/// Read a directive value that is either one string or a list of strings.
pub fn directive_list(key: &str, value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(format!(
                    "{} entries must be strings, got {}",
                    key,
                    type_name(other)
                )),
            })
            .collect(),
        other => Err(format!(
            "{} must be a string or a list of strings, got {}",
            key,
            type_name(other)
        )),
    }
}

/// Flatten settings captured from a node before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenSpec {
    pub depth: usize,
    pub sep: String,
}

impl Default for FlattenSpec {
    fn default() -> Self {
        Self {
            depth: 0,
            sep: DEFAULT_FLATTEN_SEP.to_string(),
        }
    }
}

impl FlattenSpec {
    /// Remove `_flatten` and `_flatten_sep` from `map` and return them.
    pub fn take(map: &mut Mapping) -> Result<Self, String> {
        let mut spec = FlattenSpec::default();

        if let Some(depth) = map.shift_remove(FLATTEN_KEY) {
            spec.depth = match &depth {
                Value::Number(n) => n
                    .as_u64()
                    .map(|d| d as usize)
                    .ok_or_else(|| format!("{} must be a non-negative integer, got {}", FLATTEN_KEY, n))?,
                Value::Null => 0,
                other => {
                    return Err(format!(
                        "{} must be an integer, got {}",
                        FLATTEN_KEY,
                        type_name(other)
                    ))
                }
            };
        }

        if let Some(sep) = map.shift_remove(FLATTEN_SEP_KEY) {
            spec.sep = match sep {
                Value::String(s) => s,
                other => {
                    return Err(format!(
                        "{} must be a string, got {}",
                        FLATTEN_SEP_KEY,
                        type_name(&other)
                    ))
                }
            };
        }

        Ok(spec)
    }
}
