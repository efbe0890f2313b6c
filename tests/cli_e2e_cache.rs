//! End-to-end tests for the `recipe-config cache` command.
//!
//! These tests invoke the actual CLI binary and validate cache command behavior
//! from a user's perspective.

#[allow(dead_code)]
mod common;
use common::prelude::*;

/// Populate the fixture's cache with one entry.
fn resolve_once(fixture: &RecipeFixture) {
    fixture
        .command()
        .args(["resolve", "recipe.yml"])
        .assert()
        .success();
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_cache_help() {
    let fixture = RecipeFixture::new();
    fixture
        .command()
        .args(["cache", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Manage the configuration cache"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_cache_list_empty() {
    let fixture = RecipeFixture::new();
    fixture
        .command()
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cache entries found"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_cache_list_after_resolve() {
    let fixture = RecipeFixture::new().with_file("recipe.yml", "a: 1\n");
    resolve_once(&fixture);

    fixture
        .command()
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recipe.yml"))
        .stdout(predicate::str::contains("Total: 1 entries"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_cache_list_json() {
    let fixture = RecipeFixture::new().with_file("recipe.yml", "a: 1\n");
    resolve_once(&fixture);

    let output = fixture
        .command()
        .args(["cache", "list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["key"].as_str().unwrap().len(), 64);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_cache_clean_requires_filter() {
    let fixture = RecipeFixture::new();
    fixture
        .command()
        .args(["cache", "clean"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No filter specified"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_cache_clean_dry_run_keeps_entries() {
    let fixture = RecipeFixture::new().with_file("recipe.yml", "a: 1\n");
    resolve_once(&fixture);

    fixture
        .command()
        .args(["cache", "clean", "--all", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run mode"));

    fixture
        .command()
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 1 entries"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_cache_clean_all() {
    let fixture = RecipeFixture::new().with_file("recipe.yml", "a: 1\n");
    resolve_once(&fixture);

    fixture
        .command()
        .args(["cache", "clean", "--all", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 cache entries."));

    fixture
        .command()
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cache entries found"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_cache_clean_older_than_skips_fresh_entries() {
    let fixture = RecipeFixture::new().with_file("recipe.yml", "a: 1\n");
    resolve_once(&fixture);

    fixture
        .command()
        .args(["cache", "clean", "--older-than", "1d", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cache entries match"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_cache_clean_rejects_bad_duration() {
    let fixture = RecipeFixture::new();
    fixture
        .command()
        .args(["cache", "clean", "--older-than", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid duration format"));
}
