//! Property-based tests for the tree algebra and resolution.
//!
//! Trees are generated without directive keys, so every property below is
//! about plain configuration data.

#[cfg(test)]
mod proptest_tests {
    use std::path::Path;

    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};

    use crate::config::LoaderConfig;
    use crate::loader::{LoadOptions, Loader};
    use crate::path::{parse_path, PathSegment};
    use crate::tree::{empty_map, flatten, has_directives, lookup, merge, ConfigTree};

    fn scalar() -> impl Strategy<Value = ConfigTree> {
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::Bool),
            "[a-z ]{0,8}".prop_map(Value::String),
        ]
    }

    fn tree() -> impl Strategy<Value = ConfigTree> {
        scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(|entries| {
                    let mut map = Mapping::new();
                    for (key, value) in entries {
                        map.insert(Value::String(key), value);
                    }
                    Value::Mapping(map)
                }),
            ]
        })
    }

    fn mapping_tree() -> impl Strategy<Value = ConfigTree> {
        prop::collection::btree_map("[a-z]{1,4}", tree(), 0..5).prop_map(|entries| {
            let mut map = Mapping::new();
            for (key, value) in entries {
                map.insert(Value::String(key), value);
            }
            Value::Mapping(map)
        })
    }

    // ============================================================================
    // merge property tests
    // ============================================================================

    proptest! {
        /// Property: the empty mapping is an identity on both sides of merge
        #[test]
        fn merge_empty_is_identity(t in mapping_tree()) {
            prop_assert_eq!(&merge(&t, &empty_map()), &t);
            prop_assert_eq!(&merge(&empty_map(), &t), &t);
        }

        /// Property: merging a tree with itself changes nothing
        #[test]
        fn merge_is_idempotent(t in mapping_tree()) {
            prop_assert_eq!(merge(&t, &t), t);
        }

        /// Property: every top-level key of the overlay ends up in the result
        #[test]
        fn merge_keeps_overlay_keys(base in mapping_tree(), overlay in mapping_tree()) {
            let merged = merge(&base, &overlay);
            for (key, value) in overlay.as_mapping().unwrap() {
                let slot = merged.as_mapping().unwrap().get(key).unwrap();
                if !value.is_mapping() {
                    prop_assert_eq!(slot, value);
                }
            }
        }
    }

    // ============================================================================
    // flatten property tests
    // ============================================================================

    proptest! {
        /// Property: depth 0 leaves the tree untouched
        #[test]
        fn flatten_depth_zero_is_identity(t in tree()) {
            prop_assert_eq!(flatten(&t, 0, "__"), t);
        }

        /// Property: flattening only ever removes nesting
        #[test]
        fn flatten_never_adds_directives(t in mapping_tree(), depth in 0usize..4) {
            prop_assert!(!has_directives(&flatten(&t, depth, "__")));
        }
    }

    // ============================================================================
    // lookup and resolution property tests
    // ============================================================================

    proptest! {
        /// Property: a dotted path of plain keys parses to one segment per key
        #[test]
        fn parse_path_splits_plain_keys(keys in prop::collection::vec("[a-z]{1,6}", 1..5)) {
            let segments = parse_path(&keys.join("."));
            let expected: Vec<PathSegment> = keys.into_iter().map(PathSegment::Key).collect();
            prop_assert_eq!(segments, expected);
        }

        /// Property: every top-level non-null value can be looked up by its key
        #[test]
        fn lookup_finds_top_level_values(t in mapping_tree()) {
            for (key, value) in t.as_mapping().unwrap() {
                let key = key.as_str().unwrap();
                let found = lookup(&t, &[PathSegment::Key(key.to_string())]);
                prop_assert_eq!(found, Some(value));
            }
        }

        /// Property: resolving a directive-free tree is a no-op
        #[test]
        fn resolve_directive_free_is_noop(t in mapping_tree()) {
            let loader = Loader::new(LoaderConfig::new());
            let (resolved, deps) = loader
                .resolve(t.clone(), Path::new("generated.yml"), LoadOptions::new())
                .unwrap();
            prop_assert_eq!(resolved, t);
            prop_assert!(deps.is_empty());
        }
    }
}
