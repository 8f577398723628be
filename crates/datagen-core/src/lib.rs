//! Shared types for mod data generation.
//!
//! This crate holds the pieces every generator agrees on:
//!
//! - [`location`]: `namespace:path` identities and the output paths they map to
//! - [`hash`]: BLAKE3 content fingerprints used to skip redundant writes
//! - [`tag`]: tag declarations and their JSON form
//! - [`error`]: error types for the above
//!
//! # Example
//!
//! ```
//! use datagen_core::{Fingerprint, ResourceLocation};
//!
//! let id = ResourceLocation::parse("examplemod:item/gear").unwrap();
//! assert_eq!(id.texture_output_path(), "assets/examplemod/textures/item/gear.png");
//!
//! let fp = Fingerprint::of_bytes(b"pixels");
//! assert_eq!(fp.to_hex().len(), 64);
//! ```

pub mod error;
pub mod hash;
pub mod location;
pub mod tag;

pub use error::{FingerprintError, LocationError, TagError};
pub use hash::{Fingerprint, FingerprintHasher};
pub use location::{ResourceLocation, DEFAULT_NAMESPACE};
pub use tag::{TagBuilder, TagEntry, TagKind, TagSet};
