//! Texture building blocks for mod data generation.
//!
//! This crate provides the in-memory side of texture generation: a packed
//! ARGB [`Raster`], the pixel filters generators compose, and a PNG codec
//! whose output is byte-identical for identical rasters.
//!
//! # Features
//!
//! - **Colour utilities**: validated ARGB packing, HSB conversion, hex parsing
//! - **Filters**: level adjustment, grayscale, hue/saturation/brightness shift
//! - **Compositing**: region fill, blit, crop
//! - **Deterministic PNG**: fixed compression settings, any-format decoding
//!
//! # Example
//!
//! ```
//! use datagen_texture::color::rgb;
//! use datagen_texture::filter::{adjust_levels, grayscale, Levels};
//! use datagen_texture::{Raster, Region};
//!
//! let mut raster = Raster::new(16, 16, rgb(200, 120, 40).unwrap()).unwrap();
//! let all = Region::full(&raster);
//! grayscale(&mut raster, all).unwrap();
//! adjust_levels(&mut raster, all, Levels::gamma(1.5)).unwrap();
//!
//! let fingerprint = raster.fingerprint();
//! assert_eq!(fingerprint.to_hex().len(), 64);
//! ```

pub mod color;
pub mod filter;
pub mod png;
pub mod raster;

// Re-export main types for convenience
pub use color::ColorError;
pub use filter::{FilterError, HsbShift, Levels};
pub use png::{PngConfig, PngError};
pub use raster::{Raster, RasterError, Region};
