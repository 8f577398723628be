//! datagen CLI library.
//!
//! The generation pass behind the `datagen` binary: the generation record,
//! resource lookup, texture and tag providers, the [`generator::DataGenerator`]
//! that drives them, and manifest-driven generation.
//!
//! ```no_run
//! use datagen_cli::manifest::Manifest;
//! use std::path::Path;
//!
//! let manifest = Manifest::load(Path::new("datagen.json"))?;
//! let report = manifest.into_generator(Path::new("."), "generated")?.run()?;
//! println!("{} written", report.written());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod commands;
pub mod generator;
pub mod manifest;
pub mod output;
pub mod provider;
pub mod resources;
pub mod tags;

pub use generator::{DataGenerator, GeneratorError, RunReport};
pub use provider::{DataProvider, GeneratedTexture, ProviderError, TextureProvider};
pub use tags::TagsProvider;
