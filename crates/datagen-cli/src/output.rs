//! Writing generated outputs under the output root.
//!
//! Every provider hands its finished outputs to an [`OutputSink`], which
//! decides from the generation record whether the file must be written, and
//! writes it through a temporary file renamed into place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use datagen_core::Fingerprint;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::cache::HashCache;

/// Per-output write failure. These are logged and reported, never fatal.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("couldn't create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't encode output: {0}")]
    Encode(String),

    #[error("couldn't write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputStatus {
    /// Content changed or the file was missing; it was written.
    Written,
    /// Fingerprint unchanged and file present; nothing was written.
    Skipped,
    /// The write failed; the record entry was dropped.
    Failed(String),
}

/// Outcome of one provider's pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Outputs written, relative to the output root.
    pub written: Vec<String>,
    /// Outputs left untouched.
    pub skipped: Vec<String>,
    /// Outputs that failed to write, with the reason.
    pub failed: Vec<(String, String)>,
}

impl PassReport {
    pub fn push(&mut self, output: String, status: OutputStatus) {
        match status {
            OutputStatus::Written => self.written.push(output),
            OutputStatus::Skipped => self.skipped.push(output),
            OutputStatus::Failed(reason) => self.failed.push((output, reason)),
        }
    }

    /// Total outputs the provider produced.
    pub fn total(&self) -> usize {
        self.written.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Destination of one generation run: the output root plus its record.
#[derive(Debug)]
pub struct OutputSink {
    out_root: PathBuf,
    cache: HashCache,
}

impl OutputSink {
    pub fn new(out_root: impl Into<PathBuf>, cache: HashCache) -> Self {
        Self {
            out_root: out_root.into(),
            cache,
        }
    }

    pub fn out_root(&self) -> &Path {
        &self.out_root
    }

    pub fn cache(&self) -> &HashCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut HashCache {
        &mut self.cache
    }

    /// Absolute path of an output.
    pub fn resolve(&self, output: &str) -> PathBuf {
        self.out_root.join(output)
    }

    /// Saves one output.
    ///
    /// `encode` is only called when the output actually has to be written.
    /// The fingerprint is recorded only once the file is in place; on failure
    /// the error is logged and the record entry dropped.
    pub fn save(
        &mut self,
        output: &str,
        fingerprint: Fingerprint,
        encode: impl FnOnce() -> Result<Vec<u8>, WriteError>,
    ) -> OutputStatus {
        let target = self.resolve(output);

        if self.cache.is_current(output, &fingerprint) && target.is_file() {
            debug!(output, "up to date");
            self.cache.keep(output, fingerprint);
            return OutputStatus::Skipped;
        }

        match encode().and_then(|bytes| write_atomic(&target, &bytes)) {
            Ok(()) => {
                info!(output, %fingerprint, "wrote");
                self.cache.record(output, fingerprint);
                OutputStatus::Written
            }
            Err(e) => {
                error!(output, error = %e, "couldn't save output");
                self.cache.invalidate(output);
                OutputStatus::Failed(e.to_string())
            }
        }
    }
}

/// Writes `bytes` to `target`, creating parent directories. The data goes
/// to a temporary file in the same directory first, so a failed write never
/// leaves a truncated file behind.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let write_err = |source| WriteError::Write {
        path: target.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(target).map_err(|e| write_err(e.error))?;
    Ok(())
}
