//! The data generator: runs every registered provider once against one
//! output root and one generation record.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{CacheError, HashCache};
use crate::output::{OutputSink, PassReport};
use crate::provider::{DataProvider, ProviderError, TextureOutputs, TextureProvider};
use crate::tags::{TagOutputs, TagsProvider};

/// Errors that stop a generation run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("duplicate provider name: {0}")]
    DuplicateProvider(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("provider '{name}' failed: {source}")]
    Provider {
        name: String,
        #[source]
        source: ProviderError,
    },
}

/// Report of one provider within a run.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderReport {
    pub name: String,
    #[serde(flatten)]
    pub pass: PassReport,
}

/// Report of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub providers: Vec<ProviderReport>,
    /// Outputs from the previous run that no provider produced this time.
    pub stale: Vec<String>,
    /// Whether stale outputs were deleted from disk.
    pub pruned: bool,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.providers.iter().map(|p| p.pass.written.len()).sum()
    }

    pub fn skipped(&self) -> usize {
        self.providers.iter().map(|p| p.pass.skipped.len()).sum()
    }

    pub fn failed(&self) -> usize {
        self.providers.iter().map(|p| p.pass.failed.len()).sum()
    }
}

/// A set of providers sharing an output root.
pub struct DataGenerator {
    out_root: PathBuf,
    providers: Vec<Box<dyn DataProvider>>,
    prune: bool,
}

impl DataGenerator {
    pub fn new(out_root: impl Into<PathBuf>) -> Self {
        Self {
            out_root: out_root.into(),
            providers: Vec::new(),
            prune: false,
        }
    }

    /// Delete outputs from the previous run that nothing produced this run.
    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    pub fn out_root(&self) -> &Path {
        &self.out_root
    }

    /// Registers a provider. Names must be unique.
    pub fn add_provider(&mut self, provider: Box<dyn DataProvider>) -> Result<(), GeneratorError> {
        let name = provider.name();
        if self.providers.iter().any(|p| p.name() == name) {
            return Err(GeneratorError::DuplicateProvider(name));
        }
        self.providers.push(provider);
        Ok(())
    }

    pub fn add_textures<P: TextureProvider + 'static>(
        &mut self,
        provider: P,
    ) -> Result<(), GeneratorError> {
        self.add_provider(Box::new(TextureOutputs(provider)))
    }

    pub fn add_tags<P: TagsProvider + 'static>(&mut self, provider: P) -> Result<(), GeneratorError> {
        self.add_provider(Box::new(TagOutputs(provider)))
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Runs every provider in registration order.
    ///
    /// If a provider fails, the run stops. Outputs already confirmed are
    /// still recorded, so they are not rewritten next time.
    pub fn run(&self) -> Result<RunReport, GeneratorError> {
        let cache = HashCache::load(&self.out_root)?;
        let mut sink = OutputSink::new(&self.out_root, cache);
        let mut report = RunReport {
            pruned: self.prune,
            ..RunReport::default()
        };

        for provider in &self.providers {
            let name = provider.name();
            info!(provider = %name, "starting provider");

            match provider.run(&mut sink) {
                Ok(pass) => {
                    info!(
                        provider = %name,
                        written = pass.written.len(),
                        skipped = pass.skipped.len(),
                        failed = pass.failed.len(),
                        "finished provider"
                    );
                    report.providers.push(ProviderReport { name, pass });
                }
                Err(source) => {
                    sink.cache().save()?;
                    return Err(GeneratorError::Provider { name, source });
                }
            }
        }

        // Without pruning, stale entries stay recorded so a later pruning run
        // still finds their files.
        report.stale = if self.prune {
            sink.cache_mut().drop_stale()
        } else {
            sink.cache().stale()
        };
        if self.prune {
            for output in &report.stale {
                if !is_contained(output) {
                    warn!(output = %output, "refusing to remove output outside the output root");
                    continue;
                }
                let path = sink.resolve(output);
                match fs::remove_file(&path) {
                    Ok(()) => info!(output = %output, "removed stale output"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => warn!(output = %output, error = %e, "couldn't remove stale output"),
                }
            }
        }

        sink.cache().save()?;
        Ok(report)
    }
}

/// Whether a recorded output path stays under the output root.
fn is_contained(output: &str) -> bool {
    let path = Path::new(output);
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}
