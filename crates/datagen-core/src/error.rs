//! Error types for identities and tag declarations.

use thiserror::Error;

use crate::location::ResourceLocation;

/// Errors from parsing or validating a [`ResourceLocation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// Namespace contains characters outside `[a-z0-9_.-]` or is empty.
    #[error("invalid namespace '{namespace}' in '{input}' (expected {pattern})")]
    InvalidNamespace {
        input: String,
        namespace: String,
        pattern: &'static str,
    },

    /// Path contains characters outside `[a-z0-9_./-]` or is empty.
    #[error("invalid path '{path}' in '{input}' (expected {pattern})")]
    InvalidPath {
        input: String,
        path: String,
        pattern: &'static str,
    },

    /// Path has an empty, `.` or `..` segment and could escape its root.
    #[error("invalid path '{path}' in '{input}' (segments must not be empty, '.' or '..')")]
    InvalidSegment { input: String, path: String },
}

/// Errors from building a tag set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// The same tag was declared twice in one provider.
    #[error("duplicate tag declaration: {0}")]
    DuplicateTag(ResourceLocation),

    /// A tag entry could not be parsed.
    #[error("invalid tag entry '{entry}': {source}")]
    InvalidEntry {
        entry: String,
        #[source]
        source: LocationError,
    },
}

/// Errors from decoding a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerprintError {
    #[error("fingerprint must be 64 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("fingerprint contains a non-hex character")]
    InvalidHex,
}
