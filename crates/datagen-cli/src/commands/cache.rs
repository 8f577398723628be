//! Generation record commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use walkdir::WalkDir;

use crate::cache::{HashCache, CACHE_DIR};

/// Files and bytes under an output root, excluding the record itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutputStats {
    pub files: usize,
    pub total_size_bytes: u64,
}

/// Walks `out_root` counting generated files.
pub fn output_stats(out_root: &Path) -> OutputStats {
    let mut stats = OutputStats::default();
    let walker = WalkDir::new(out_root)
        .into_iter()
        .filter_entry(|e| e.depth() != 1 || e.file_name() != CACHE_DIR);

    for entry in walker.filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            stats.files += 1;
            stats.total_size_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }
    stats
}

/// Show the generation record of an output root
pub fn info(out: &str) -> Result<ExitCode> {
    let out_root = Path::new(out);
    let cache = HashCache::load(out_root)
        .with_context(|| format!("Failed to load generation record under {}", out))?;

    println!("{}", "Generation Record".cyan().bold());
    println!("  {}: {}", "Record".dimmed(), cache.path().display());
    println!("  {}: {}", "Entry count".dimmed(), cache.previous_len());
    println!(
        "  {}: {}",
        "Last updated".dimmed(),
        cache.updated_at().unwrap_or("never")
    );

    let stats = output_stats(out_root);
    println!("  {}: {}", "Output files".dimmed(), stats.files);

    let size_mb = stats.total_size_bytes as f64 / (1024.0 * 1024.0);
    if size_mb >= 1.0 {
        println!("  {}: {:.2} MB", "Total size".dimmed(), size_mb);
    } else {
        let size_kb = stats.total_size_bytes as f64 / 1024.0;
        println!("  {}: {:.2} KB", "Total size".dimmed(), size_kb);
    }

    Ok(ExitCode::SUCCESS)
}

/// Delete the generation record, forcing a full rewrite next run
pub fn clear(out: &str) -> Result<ExitCode> {
    println!("{}", "Clearing generation record...".cyan().bold());

    let removed = HashCache::clear(Path::new(out))
        .with_context(|| format!("Failed to clear generation record under {}", out))?;

    if removed {
        println!("  {} Removed {}", "SUCCESS".green().bold(), HashCache::record_path(Path::new(out)).display());
    } else {
        println!("  {}", "No generation record".dimmed());
    }

    Ok(ExitCode::SUCCESS)
}
