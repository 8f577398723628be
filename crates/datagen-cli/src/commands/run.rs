//! Run command: generate everything a manifest declares.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use crate::generator::RunReport;
use crate::manifest::Manifest;

/// Generate the outputs of `manifest` under `out`.
///
/// # Returns
/// Exit code 0 if every output was written or up to date, 1 if any output
/// failed to write.
pub fn run(manifest: &str, out: &str, prune: bool, json: bool) -> Result<ExitCode> {
    let manifest_path = Path::new(manifest);
    let base_dir = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let loaded = Manifest::load(manifest_path)
        .with_context(|| format!("Failed to load manifest: {}", manifest))?;
    let mod_id = loaded.mod_id.clone();

    if !json {
        println!(
            "{} {} {}",
            "Generating".cyan().bold(),
            mod_id.white().bold(),
            format!("-> {}", out).dimmed()
        );
    }

    let generator = loaded.into_generator(base_dir, out)?.with_prune(prune);
    let report = generator
        .run()
        .with_context(|| format!("Generation failed for {}", mod_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.failed() > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_report(report: &RunReport) {
    for provider in &report.providers {
        println!(
            "  {} {} written, {} up to date{}",
            format!("{}:", provider.name).bold(),
            provider.pass.written.len().to_string().green(),
            provider.pass.skipped.len(),
            if provider.pass.failed.is_empty() {
                String::new()
            } else {
                format!(", {} failed", provider.pass.failed.len())
                    .red()
                    .to_string()
            }
        );
        for (output, reason) in &provider.pass.failed {
            println!("    {} {}: {}", "FAIL".red().bold(), output, reason.dimmed());
        }
    }

    if !report.stale.is_empty() {
        let verb = if report.pruned { "Removed" } else { "Stale" };
        println!(
            "  {} {} {}",
            verb.yellow().bold(),
            report.stale.len(),
            if report.stale.len() == 1 { "output" } else { "outputs" }
        );
        for output in &report.stale {
            println!("    {}", output.dimmed());
        }
    }

    let status = if report.failed() == 0 {
        "SUCCESS".green().bold()
    } else {
        "FAILED".red().bold()
    };
    println!(
        "{} {} written, {} up to date, {} failed",
        status,
        report.written(),
        report.skipped(),
        report.failed()
    );
}
