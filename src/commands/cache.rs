//! # Cache Command Implementation
//!
//! This module implements the `cache` subcommand, which manages the on-disk
//! cache of resolved configuration.
//!
//! ## Subcommands
//!
//! - **`list`**: Display every cache entry with its input files
//! - **`clean`**: Remove entries, all of them or those older than a duration
//!
//! Deleting entries is always safe: the next load recomputes them.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use recipe_config::cache::{CacheEntryInfo, CacheStore};
use recipe_config::defaults::{default_cache_root, CACHE_ENV};

/// Manage the configuration cache
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// The root directory for the configuration cache.
    ///
    /// If not provided, it defaults to the system's cache directory
    /// (e.g., `~/.cache/recipe-config` on Linux).
    #[arg(long, value_name = "DIR", env = CACHE_ENV)]
    pub cache_root: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List all cache entries
    List(ListArgs),
    /// Remove cache entries
    Clean(CleanArgs),
}

/// Arguments for the cache list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cache clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Show what would be deleted without actually deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Delete all cache entries
    #[arg(long, conflicts_with = "older_than")]
    pub all: bool,

    /// Delete entries older than the specified duration
    ///
    /// Duration format: number followed by unit (s, m, h, d, w)
    /// Examples: "30d", "7d", "1h", "30m", "2w"
    #[arg(long, value_name = "DURATION")]
    pub older_than: Option<String>,

    /// Skip confirmation prompt and delete immediately
    #[arg(long)]
    pub yes: bool,
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs) -> Result<()> {
    let store = CacheStore::new(args.cache_root.unwrap_or_else(default_cache_root));
    match args.command {
        CacheSubcommand::List(list_args) => execute_list(&store, list_args),
        CacheSubcommand::Clean(clean_args) => execute_clean(&store, clean_args),
    }
}

/// Execute the `cache list` command.
fn execute_list(store: &CacheStore, args: ListArgs) -> Result<()> {
    let entries = store
        .entries()
        .with_context(|| format!("Failed to read cache {}", store.root().display()))?;

    if args.json {
        let json: Vec<serde_json::Value> = entries.iter().map(entry_json).collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No cache entries found in: {}", store.root().display());
        return Ok(());
    }

    println!("Cache entries in {}:\n", store.root().display());
    println!("{:<16} {:>10}  {}", "KEY", "SIZE", "INPUTS");
    println!("{}", "-".repeat(80));
    for entry in &entries {
        println!(
            "{:<16} {:>10}  {}",
            &entry.key[..16],
            format_size(entry.size),
            describe_inputs(entry)
        );
    }
    let total: u64 = entries.iter().map(|e| e.size).sum();
    println!("\nTotal: {} entries ({})", entries.len(), format_size(total));
    Ok(())
}

/// Execute the `cache clean` command.
fn execute_clean(store: &CacheStore, args: CleanArgs) -> Result<()> {
    let threshold = match (&args.older_than, args.all) {
        (Some(text), _) => Some(parse_duration(text).with_context(|| {
            format!(
                "Invalid duration format: '{}'. Expected format: number followed by unit (s, m, h, d, w)",
                text
            )
        })?),
        (None, true) => None,
        (None, false) => anyhow::bail!(
            "No filter specified. Use --all to remove every entry or --older-than DURATION"
        ),
    };

    let entries = store
        .entries()
        .with_context(|| format!("Failed to read cache {}", store.root().display()))?;
    let selected = select_for_cleanup(&entries, threshold, SystemTime::now());

    if selected.is_empty() {
        println!("No cache entries match the specified criteria.");
        return Ok(());
    }

    println!("Cache entries to be deleted:\n");
    for entry in &selected {
        println!(
            "  {} {} ({})",
            &entry.key[..16],
            describe_inputs(entry),
            format_size(entry.size)
        );
    }
    let total: u64 = selected.iter().map(|e| e.size).sum();
    println!("\nTotal: {} entries ({})", selected.len(), format_size(total));

    if args.dry_run {
        println!("\nDry run mode - no changes were made.");
        return Ok(());
    }

    if !args.yes {
        print!("\nDo you want to delete these cache entries? (y/N): ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Clean cancelled.");
            return Ok(());
        }
    }

    let mut deleted = 0;
    for entry in &selected {
        match store.remove(&entry.key) {
            Ok(_) => deleted += 1,
            Err(e) => eprintln!("  Failed to delete {}: {}", entry.path.display(), e),
        }
    }
    println!("\nDeleted {} cache entries.", deleted);
    if deleted < selected.len() {
        anyhow::bail!("Failed to delete {} cache entries", selected.len() - deleted);
    }
    Ok(())
}

/// Entries to delete: all of them, or those at least `threshold` old.
///
/// Entries whose age cannot be determined are included.
fn select_for_cleanup(
    entries: &[CacheEntryInfo],
    threshold: Option<Duration>,
    now: SystemTime,
) -> Vec<CacheEntryInfo> {
    entries
        .iter()
        .filter(|entry| match (threshold, entry.modified) {
            (None, _) => true,
            (Some(threshold), Some(modified)) => now
                .duration_since(modified)
                .map(|age| age >= threshold)
                .unwrap_or(false),
            (Some(_), None) => true,
        })
        .cloned()
        .collect()
}

fn describe_inputs(entry: &CacheEntryInfo) -> String {
    match entry.inputs.as_slice() {
        [] => "(unreadable)".to_string(),
        [single] => single.display().to_string(),
        [first, rest @ ..] => format!("{} (+{} more)", first.display(), rest.len()),
    }
}

fn entry_json(entry: &CacheEntryInfo) -> serde_json::Value {
    serde_json::json!({
        "key": entry.key,
        "inputs": entry.inputs,
        "size": entry.size,
        "modified": entry
            .modified
            .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs()),
    })
}

/// Parse a duration string into a Duration
///
/// Format: number followed by unit (s, m, h, d, w)
/// Examples: "30d", "7d", "1h", "30m", "2w"
fn parse_duration(text: &str) -> Result<Duration> {
    let text = text.trim().to_lowercase();
    let split = text
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(text.len());
    if split == 0 {
        anyhow::bail!("Duration must start with a number");
    }

    let (number, unit) = text.split_at(split);
    let number: f64 = number
        .parse()
        .with_context(|| format!("Invalid number in duration: '{}'", number))?;
    let unit_seconds = match unit {
        "s" | "sec" | "second" | "seconds" => 1.0,
        "m" | "min" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hour" | "hours" => 3600.0,
        "d" | "day" | "days" => 86400.0,
        "w" | "week" | "weeks" => 604800.0,
        _ => anyhow::bail!(
            "Invalid duration unit: '{}'. Valid units: s, m, h, d, w",
            unit
        ),
    };

    Duration::try_from_secs_f64(number * unit_seconds)
        .with_context(|| format!("Duration out of range: '{}'", text))
}

/// Format size in human-readable format
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key_char: char, age: Option<u64>, now: SystemTime) -> CacheEntryInfo {
        CacheEntryInfo {
            key: key_char.to_string().repeat(64),
            inputs: vec![PathBuf::from("/r/recipe.yml")],
            size: 10,
            modified: age.map(|secs| now - Duration::from_secs(secs)),
            path: PathBuf::from(format!("/cache/{}.yml", key_char)),
        }
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604800));
        assert_eq!(parse_duration("1w").unwrap(), Duration::from_secs(604800));
        assert_eq!(parse_duration(" 1.5H ").unwrap(), Duration::from_secs(5400));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("d").is_err());
        assert!(parse_duration("10y").is_err());
        assert!(parse_duration("1.2.3d").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }

    #[test]
    fn test_select_for_cleanup() {
        let now = SystemTime::now();
        let entries = vec![
            entry('a', Some(10), now),
            entry('b', Some(86400 * 10), now),
            entry('c', None, now),
        ];

        assert_eq!(select_for_cleanup(&entries, None, now).len(), 3);

        let old = select_for_cleanup(&entries, Some(Duration::from_secs(86400)), now);
        let keys: Vec<char> = old.iter().map(|e| e.key.chars().next().unwrap()).collect();
        assert_eq!(keys, vec!['b', 'c']);
    }

    #[test]
    fn test_describe_inputs() {
        let now = SystemTime::now();
        let mut e = entry('a', None, now);
        assert_eq!(describe_inputs(&e), "/r/recipe.yml");
        e.inputs.push(PathBuf::from("/r/other.yml"));
        assert_eq!(describe_inputs(&e), "/r/recipe.yml (+1 more)");
        e.inputs.clear();
        assert_eq!(describe_inputs(&e), "(unreadable)");
    }
}
