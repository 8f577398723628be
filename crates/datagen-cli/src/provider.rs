//! Data providers and the texture generation pass.
//!
//! A [`DataProvider`] is one named unit of generation. Texture generators
//! implement [`TextureProvider`], which only enumerates finished rasters; the
//! [`TextureOutputs`] adapter owns fingerprinting and I/O.

use std::collections::HashSet;

use datagen_core::{LocationError, ResourceLocation, TagError};
use datagen_texture::{png, ColorError, FilterError, PngConfig, Raster, RasterError};
use thiserror::Error;
use tracing::debug;

use crate::output::{OutputSink, PassReport, WriteError};
use crate::resources::LookupError;

/// Hard failures that abort a provider's pass.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("duplicate texture {0}")]
    DuplicateTexture(ResourceLocation),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("{0}")]
    Other(String),
}

/// One named unit of generation.
pub trait DataProvider {
    /// Display name; unique within a generator.
    fn name(&self) -> String;

    /// Produces every output into `sink`.
    fn run(&self, sink: &mut OutputSink) -> Result<PassReport, ProviderError>;
}

/// A finished texture and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTexture {
    pub raster: Raster,
    pub id: ResourceLocation,
}

impl GeneratedTexture {
    pub fn new(raster: Raster, id: ResourceLocation) -> Self {
        Self { raster, id }
    }
}

/// Lazily enumerated textures of a provider.
pub type TextureIter<'a> = Box<dyn Iterator<Item = Result<GeneratedTexture, ProviderError>> + 'a>;

/// A generator of textures for one mod.
///
/// `textures` must return a fresh sequence on every call.
pub trait TextureProvider {
    /// Identifier of the mod the textures belong to.
    fn mod_id(&self) -> &str;

    /// Every texture this provider generates.
    fn textures(&self) -> TextureIter<'_>;

    /// Encoder settings for this provider's PNGs.
    fn png_config(&self) -> PngConfig {
        PngConfig::default()
    }
}

/// Runs a [`TextureProvider`] as a [`DataProvider`].
#[derive(Debug)]
pub struct TextureOutputs<P>(pub P);

impl<P: TextureProvider> DataProvider for TextureOutputs<P> {
    fn name(&self) -> String {
        format!("Textures: {}", self.0.mod_id())
    }

    fn run(&self, sink: &mut OutputSink) -> Result<PassReport, ProviderError> {
        let config = self.0.png_config();
        let mut seen = HashSet::new();
        let mut report = PassReport::default();

        for texture in self.0.textures() {
            let GeneratedTexture { raster, id } = texture?;
            if !seen.insert(id.clone()) {
                return Err(ProviderError::DuplicateTexture(id));
            }

            let output = id.texture_output_path();
            let fingerprint = raster.fingerprint();
            debug!(%id, %fingerprint, "generated texture");

            let status = sink.save(&output, fingerprint, || {
                png::encode_raster(&raster, &config).map_err(|e| WriteError::Encode(e.to_string()))
            });
            report.push(output, status);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::HashCache;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct Fixed {
        textures: Vec<(u32, &'static str)>,
        calls: Cell<usize>,
    }

    impl TextureProvider for Fixed {
        fn mod_id(&self) -> &str {
            "testmod"
        }

        fn textures(&self) -> TextureIter<'_> {
            self.calls.set(self.calls.get() + 1);
            Box::new(self.textures.iter().map(|&(color, id)| -> Result<_, ProviderError> {
                Ok(GeneratedTexture::new(
                    Raster::new(2, 2, color)?,
                    ResourceLocation::parse(id)?,
                ))
            }))
        }
    }

    fn fixed(textures: Vec<(u32, &'static str)>) -> TextureOutputs<Fixed> {
        TextureOutputs(Fixed {
            textures,
            calls: Cell::new(0),
        })
    }

    #[test]
    fn test_name() {
        assert_eq!(fixed(vec![]).name(), "Textures: testmod");
    }

    #[test]
    fn test_writes_each_texture() {
        let tmp = TempDir::new().unwrap();
        let mut sink = OutputSink::new(tmp.path(), HashCache::empty(tmp.path()));
        let provider = fixed(vec![
            (0xFFFF_0000, "testmod:item/red"),
            (0xFF00_FF00, "testmod:block/green"),
        ]);

        let report = provider.run(&mut sink).unwrap();
        assert_eq!(
            report.written,
            vec![
                "assets/testmod/textures/item/red.png".to_string(),
                "assets/testmod/textures/block/green.png".to_string(),
            ]
        );
        let red = png::read_raster_file(&tmp.path().join("assets/testmod/textures/item/red.png"))
            .unwrap();
        assert_eq!(red, Raster::new(2, 2, 0xFFFF_0000).unwrap());
        assert_eq!(provider.0.calls.get(), 1);
    }

    #[test]
    fn test_duplicate_identity_aborts() {
        let tmp = TempDir::new().unwrap();
        let mut sink = OutputSink::new(tmp.path(), HashCache::empty(tmp.path()));
        let provider = fixed(vec![
            (0xFFFF_0000, "testmod:item/same"),
            (0xFF00_FF00, "testmod:item/same"),
        ]);

        let err = provider.run(&mut sink).unwrap_err();
        assert!(matches!(err, ProviderError::DuplicateTexture(ref id) if id.path() == "item/same"));

        // The first one was committed; the duplicate never overwrote it.
        let on_disk =
            png::read_raster_file(&tmp.path().join("assets/testmod/textures/item/same.png"))
                .unwrap();
        assert_eq!(on_disk.get(0, 0), 0xFFFF_0000);
    }

    #[test]
    fn test_provider_error_propagates() {
        struct Broken;
        impl TextureProvider for Broken {
            fn mod_id(&self) -> &str {
                "broken"
            }
            fn textures(&self) -> TextureIter<'_> {
                Box::new(std::iter::once(Err(ProviderError::Other("no".into()))))
            }
        }

        let tmp = TempDir::new().unwrap();
        let mut sink = OutputSink::new(tmp.path(), HashCache::empty(tmp.path()));
        assert!(TextureOutputs(Broken).run(&mut sink).is_err());
    }

    #[test]
    fn test_write_failure_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("assets/testmod/textures")).unwrap();
        // A file where the "item" directory should be.
        std::fs::write(tmp.path().join("assets/testmod/textures/item"), b"").unwrap();

        let mut sink = OutputSink::new(tmp.path(), HashCache::empty(tmp.path()));
        let provider = fixed(vec![
            (0xFFFF_0000, "testmod:item/blocked"),
            (0xFF00_FF00, "testmod:block/fine"),
        ]);

        let report = provider.run(&mut sink).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "assets/testmod/textures/item/blocked.png");
        assert_eq!(report.written, vec!["assets/testmod/textures/block/fine.png".to_string()]);
        assert!(sink.cache().previous("assets/testmod/textures/item/blocked.png").is_none());
        assert!(!sink
            .cache()
            .entries()
            .contains_key("assets/testmod/textures/item/blocked.png"));

    }
}
