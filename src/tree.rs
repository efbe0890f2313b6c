//! Configuration tree algebra
//!
//! A configuration tree is a `serde_yaml::Value`: scalars, ordered mappings
//! and sequences. This module provides the operations the resolver is built
//! from:
//!
//! - Merge-with-override, where maps merge recursively and every other value
//!   kind is replaced by the overlay
//! - The `_flatten` transform collapsing nested maps into joined keys
//! - Path-indexed lookup and replacement
//! - Directive detection

use serde_yaml::{Mapping, Value};

use crate::path::PathSegment;

/// The configuration tree model.
pub type ConfigTree = Value;

/// Prefix reserved for directive keys.
pub const DIRECTIVE_PREFIX: char = '_';

/// An empty mapping node.
pub fn empty_map() -> ConfigTree {
    Value::Mapping(Mapping::new())
}

/// Merge `overlay` on top of `base`, returning the combined tree.
///
/// Mappings merge key by key, recursing where both sides hold a mapping.
/// For every other combination the overlay value wins outright, so sequences
/// are replaced rather than concatenated.
pub fn merge(base: &ConfigTree, overlay: &ConfigTree) -> ConfigTree {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay);
    merged
}

/// In-place variant of [`merge`].
pub fn merge_into(target: &mut ConfigTree, overlay: &ConfigTree) {
    match (target, overlay) {
        (Value::Mapping(target_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_mapping() && value.is_mapping() => {
                        merge_into(existing, value);
                    }
                    Some(existing) => *existing = value.clone(),
                    None => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

/// Collapse nested mappings up to `depth` levels into `parent<sep>child` keys.
///
/// `depth == 0` and non-mapping trees are returned unchanged. With depth 1,
/// `{a: {b: 1, c: 2}}` becomes `{a__b: 1, a__c: 2}`.
pub fn flatten(tree: &ConfigTree, depth: usize, sep: &str) -> ConfigTree {
    match tree {
        Value::Mapping(map) if depth > 0 => {
            let mut flat = Mapping::new();
            for (key, value) in map {
                match value {
                    Value::Mapping(_) => {
                        let prefix = key_to_string(key);
                        if let Value::Mapping(inner) = flatten(value, depth - 1, sep) {
                            for (inner_key, inner_value) in inner {
                                let joined = format!("{}{}{}", prefix, sep, key_to_string(&inner_key));
                                flat.insert(Value::String(joined), inner_value);
                            }
                        }
                    }
                    _ => {
                        flat.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Mapping(flat)
        }
        _ => tree.clone(),
    }
}

/// Walk `segments` through `tree`.
///
/// Returns `None` when any segment is absent or the value found is null.
pub fn lookup<'a>(tree: &'a ConfigTree, segments: &[PathSegment]) -> Option<&'a ConfigTree> {
    let mut current = tree;
    for segment in segments {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Mapping(map)) => map.get(key.as_str())?,
            (PathSegment::Index(idx), Value::Sequence(seq)) => seq.get(*idx)?,
            (PathSegment::Index(idx), Value::Mapping(map)) => {
                map.get(Value::Number((*idx as u64).into()))?
            }
            _ => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Replace the subtree at `segments` with `value`.
///
/// Returns `false` if the path does not exist in `tree`; nothing is created.
pub fn set_path(tree: &mut ConfigTree, segments: &[PathSegment], value: ConfigTree) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        *tree = value;
        return true;
    };

    let mut current = tree;
    for segment in parents {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Mapping(map)) => match map.get_mut(key.as_str()) {
                Some(next) => next,
                None => return false,
            },
            (PathSegment::Index(idx), Value::Sequence(seq)) => match seq.get_mut(*idx) {
                Some(next) => next,
                None => return false,
            },
            _ => return false,
        };
    }

    match (last, current) {
        (PathSegment::Key(key), Value::Mapping(map)) => match map.get_mut(key.as_str()) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        },
        (PathSegment::Index(idx), Value::Sequence(seq)) => match seq.get_mut(*idx) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        },
        _ => false,
    }
}

/// True if `key` is a reserved directive key.
pub fn is_directive_key(key: &Value) -> bool {
    key.as_str()
        .map(|k| k.starts_with(DIRECTIVE_PREFIX))
        .unwrap_or(false)
}

/// True if any map at any depth still carries a directive key.
pub fn has_directives(tree: &ConfigTree) -> bool {
    match tree {
        Value::Mapping(map) => map
            .iter()
            .any(|(key, value)| is_directive_key(key) || has_directives(value)),
        Value::Sequence(seq) => seq.iter().any(has_directives),
        _ => false,
    }
}

/// Render a mapping key as a string.
pub fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Get a human-readable type name for a tree node.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_path;

    fn yaml(text: &str) -> ConfigTree {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_merge_overlay_wins_for_scalars() {
        let merged = merge(&yaml("a: 1\nb: 1"), &yaml("b: 2\nc: 2"));
        assert_eq!(merged, yaml("a: 1\nb: 2\nc: 2"));
    }

    #[test]
    fn test_merge_recurses_into_maps() {
        let merged = merge(&yaml("x: {p: 1, q: 1}"), &yaml("x: {q: 2}"));
        assert_eq!(merged, yaml("x: {p: 1, q: 2}"));
    }

    #[test]
    fn test_merge_replaces_sequences() {
        let merged = merge(&yaml("a: [1, 2, 3]"), &yaml("a: [4]"));
        assert_eq!(merged, yaml("a: [4]"));
    }

    #[test]
    fn test_merge_type_mismatch_takes_overlay() {
        let merged = merge(&yaml("a: {b: 1}"), &yaml("a: 5"));
        assert_eq!(merged, yaml("a: 5"));
    }

    #[test]
    fn test_merge_preserves_base_key_order() {
        let merged = merge(&yaml("a: 1\nb: 2"), &yaml("c: 3\na: 9"));
        let keys: Vec<String> = merged
            .as_mapping()
            .unwrap()
            .keys()
            .map(key_to_string)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_flatten_one_level() {
        let flat = flatten(&yaml("a: {b: 1, c: 2}\nd: 3"), 1, "__");
        assert_eq!(flat, yaml("a__b: 1\na__c: 2\nd: 3"));
    }

    #[test]
    fn test_flatten_depth_limits() {
        let tree = yaml("a: {b: {c: 1}}");
        assert_eq!(flatten(&tree, 1, "__"), yaml("a__b: {c: 1}"));
        assert_eq!(flatten(&tree, 2, "."), yaml("a.b.c: 1"));
        assert_eq!(flatten(&tree, 0, "__"), tree);
    }

    #[test]
    fn test_lookup() {
        let tree = yaml("cabs: {wsclean: {image: stimela/wsclean}}\nsteps: [{cab: a}, {cab: b}]");
        assert_eq!(
            lookup(&tree, &parse_path("cabs.wsclean.image")),
            Some(&yaml("stimela/wsclean"))
        );
        assert_eq!(lookup(&tree, &parse_path("steps[1].cab")), Some(&yaml("b")));
        assert_eq!(lookup(&tree, &parse_path("cabs.missing")), None);
        assert_eq!(lookup(&tree, &parse_path("cabs.wsclean.image.deeper")), None);
    }

    #[test]
    fn test_lookup_null_is_absent() {
        let tree = yaml("a: null");
        assert_eq!(lookup(&tree, &parse_path("a")), None);
    }

    #[test]
    fn test_set_path() {
        let mut tree = yaml("a: {b: 1}\nl: [1, 2]");
        assert!(set_path(&mut tree, &parse_path("a.b"), yaml("2")));
        assert!(set_path(&mut tree, &parse_path("l[1]"), yaml("9")));
        assert!(!set_path(&mut tree, &parse_path("a.missing.c"), yaml("3")));
        assert_eq!(tree, yaml("a: {b: 2}\nl: [1, 9]"));
    }

    #[test]
    fn test_set_path_root() {
        let mut tree = yaml("a: 1");
        assert!(set_path(&mut tree, &[], yaml("b: 2")));
        assert_eq!(tree, yaml("b: 2"));
    }

    #[test]
    fn test_has_directives() {
        assert!(has_directives(&yaml("a: {_use: b}")));
        assert!(has_directives(&yaml("l: [{_include: x.yml}]")));
        assert!(!has_directives(&yaml("a: {b: _not_a_key}")));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(&yaml("1")), "integer");
        assert_eq!(type_name(&yaml("1.5")), "float");
        assert_eq!(type_name(&yaml("x")), "string");
        assert_eq!(type_name(&yaml("[1]")), "sequence");
    }
}
