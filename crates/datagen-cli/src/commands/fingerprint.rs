//! Fingerprint command: print the raster fingerprint of a PNG.

use anyhow::{Context, Result};
use datagen_texture::png;
use std::path::Path;
use std::process::ExitCode;

pub fn run(input: &str) -> Result<ExitCode> {
    let raster = png::read_raster_file(Path::new(input))
        .with_context(|| format!("Failed to read PNG: {}", input))?;
    println!("{}", raster.fingerprint());
    Ok(ExitCode::SUCCESS)
}
