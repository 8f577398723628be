//! datagen CLI - generates mod textures and tags from a manifest
//!
//! Outputs are fingerprinted; unchanged outputs are never rewritten.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use datagen_cli::commands;

/// datagen - Mod Data Generation
#[derive(Parser)]
#[command(name = "datagen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log per-output decisions (overridden by RUST_LOG)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every texture and tag a manifest declares
    Run {
        /// Path to the manifest JSON file
        #[arg(short, long)]
        manifest: String,

        /// Output root directory
        #[arg(short, long)]
        out: String,

        /// Delete outputs the previous run produced but this one did not
        #[arg(long)]
        prune: bool,

        /// Print the run report as JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Manage the generation record of an output root
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Print the raster fingerprint of a PNG
    Fingerprint {
        /// Path to the PNG file
        input: String,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show record location, entry count and output size
    Info {
        /// Output root directory
        #[arg(short, long)]
        out: String,
    },
    /// Delete the record so every output is rewritten next run
    Clear {
        /// Output root directory
        #[arg(short, long)]
        out: String,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            manifest,
            out,
            prune,
            json,
        } => commands::run::run(&manifest, &out, prune, json),
        Commands::Cache { command } => match command {
            CacheCommands::Info { out } => commands::cache::info(&out),
            CacheCommands::Clear { out } => commands::cache::clear(&out),
        },
        Commands::Fingerprint { input } => commands::fingerprint::run(&input),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
