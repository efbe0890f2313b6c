//! Common schema for nested sections
//!
//! A [`Schema`] is a tree of defaults. Applying it to a section fills in every
//! field the section leaves out and checks that the fields it does set have
//! the same kind of value as the schema's. A null in the schema accepts any
//! value, and an integer is accepted where the schema holds a float.
//!
//! In strict mode a section may not introduce keys the schema does not know.

use std::path::Path;

use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::parser::{DocumentParser, YamlParser};
use crate::path::child_location;
use crate::tree::{key_to_string, merge, type_name, ConfigTree};

/// Defaults and type expectations shared by every section of a nested load.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    defaults: ConfigTree,
    strict: bool,
}

impl Schema {
    /// Schema with the given defaults.
    pub fn new(defaults: ConfigTree) -> Self {
        Self {
            defaults,
            strict: false,
        }
    }

    /// Read the defaults from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(YamlParser.parse(path.as_ref())?))
    }

    /// Reject keys the schema does not define.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn defaults(&self) -> &ConfigTree {
        &self.defaults
    }

    /// Check `section` against the schema and fill in defaults.
    ///
    /// `file` names the section's source in errors.
    pub fn apply(&self, section: &ConfigTree, file: &Path) -> Result<ConfigTree> {
        self.check(&self.defaults, section, "", file)?;
        Ok(merge(&self.defaults, section))
    }

    /// Stable text describing the schema, for cache keys.
    pub(crate) fn cache_key(&self) -> String {
        format!(
            "schema strict={} {}",
            self.strict,
            serde_yaml::to_string(&self.defaults).unwrap_or_default()
        )
    }

    fn check(&self, expected: &Value, actual: &Value, location: &str, file: &Path) -> Result<()> {
        let mismatch = |expected: &Value| {
            Error::schema(
                file.display().to_string(),
                format!(
                    "'{}' should be a {}, got {}",
                    if location.is_empty() { "<root>" } else { location },
                    type_name(expected),
                    type_name(actual)
                ),
            )
        };

        match (expected, actual) {
            (Value::Null, _) | (_, Value::Null) => Ok(()),
            (Value::Mapping(expected_map), Value::Mapping(actual_map)) => {
                for (key, value) in actual_map {
                    let name = key_to_string(key);
                    let child = child_location(location, &name);
                    match expected_map.get(key) {
                        Some(slot) => self.check(slot, value, &child, file)?,
                        None if self.strict => {
                            return Err(Error::schema(
                                file.display().to_string(),
                                format!("unknown field '{}'", child),
                            ))
                        }
                        None => {}
                    }
                }
                Ok(())
            }
            (Value::Number(e), Value::Number(a)) => {
                if e.is_f64() || !a.is_f64() {
                    Ok(())
                } else {
                    Err(mismatch(expected))
                }
            }
            (Value::Bool(_), Value::Bool(_))
            | (Value::String(_), Value::String(_))
            | (Value::Sequence(_), Value::Sequence(_))
            | (Value::Tagged(_), Value::Tagged(_)) => Ok(()),
            _ => Err(mismatch(expected)),
        }
    }
}
