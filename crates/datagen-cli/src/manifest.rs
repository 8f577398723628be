//! Manifest-driven generation.
//!
//! A manifest is a JSON file listing the textures and tags of one mod:
//!
//! ```json
//! {
//!   "mod_id": "examplemod",
//!   "resource_roots": ["resources"],
//!   "textures": [
//!     { "id": "examplemod:item/dull_ingot",
//!       "source": "minecraft:item/iron_ingot",
//!       "ops": [{ "op": "grayscale" }, { "op": "levels", "gamma": 1.4 }] },
//!     { "id": "examplemod:block/blank", "size": [16, 16], "fill": "#ff202020" }
//!   ],
//!   "tags": [{ "kind": "items", "id": "forge:ingots/dull", "values": ["examplemod:dull_ingot"] }]
//! }
//! ```
//!
//! Resource roots are resolved relative to the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use datagen_core::{ResourceLocation, TagError, TagKind, TagSet};
use datagen_texture::{color, filter, HsbShift, Levels, Raster, Region};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::generator::{DataGenerator, GeneratorError};
use crate::provider::{GeneratedTexture, ProviderError, TextureIter, TextureProvider};
use crate::resources::{get_texture, resolve_root, DirectoryResources};
use crate::tags::TagsProvider;

/// Errors from loading or checking a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("texture {id}: {reason}")]
    InvalidTexture { id: ResourceLocation, reason: String },

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// Everything one mod generates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub mod_id: String,

    /// Directories searched for source textures, in order.
    #[serde(default)]
    pub resource_roots: Vec<PathBuf>,

    #[serde(default)]
    pub textures: Vec<TextureRecipe>,

    #[serde(default)]
    pub tags: Vec<TagRecipe>,
}

/// How to build one texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextureRecipe {
    pub id: ResourceLocation,

    /// Existing texture to start from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ResourceLocation>,

    /// `[width, height]` of a blank canvas, used when there is no source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[u32; 2]>,

    /// Canvas colour; transparent if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,

    #[serde(default)]
    pub ops: Vec<TextureOp>,
}

/// One step applied to a texture, in order. `region` is `[x, y, w, h]` and
/// defaults to the whole image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TextureOp {
    Grayscale {
        #[serde(default)]
        region: Option<[u32; 4]>,
    },
    Levels {
        #[serde(default = "default_gamma")]
        gamma: f64,
        #[serde(default)]
        in_low: i32,
        #[serde(default = "default_high")]
        in_high: i32,
        #[serde(default)]
        out_low: i32,
        #[serde(default = "default_high")]
        out_high: i32,
        #[serde(default)]
        region: Option<[u32; 4]>,
    },
    Hsb {
        #[serde(default)]
        hue: f32,
        #[serde(default)]
        saturation: f32,
        #[serde(default)]
        brightness: f32,
        #[serde(default)]
        region: Option<[u32; 4]>,
    },
    Fill {
        color: String,
        #[serde(default)]
        region: Option<[u32; 4]>,
    },
    /// Copies another texture on top, with its corner at `(x, y)`.
    Overlay {
        source: ResourceLocation,
        #[serde(default)]
        x: u32,
        #[serde(default)]
        y: u32,
    },
}

fn default_gamma() -> f64 {
    1.0
}

fn default_high() -> i32 {
    255
}

fn default_kind() -> TagKind {
    TagKind::Items
}

/// One tag declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagRecipe {
    #[serde(default = "default_kind")]
    pub kind: TagKind,
    pub id: ResourceLocation,
    #[serde(default)]
    pub replace: bool,
    /// Entries: `ns:path`, `#ns:path` for a tag, `?ns:path` for optional.
    #[serde(default)]
    pub values: Vec<String>,
}

impl Manifest {
    /// Reads and checks a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let json = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&json).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks what serde cannot: each texture has exactly one base and every
    /// colour parses.
    pub fn validate(&self) -> Result<(), ManifestError> {
        for recipe in &self.textures {
            let invalid = |reason: String| ManifestError::InvalidTexture {
                id: recipe.id.clone(),
                reason,
            };

            match (&recipe.source, recipe.size) {
                (Some(_), Some(_)) => {
                    return Err(invalid("has both a source and a size".into()));
                }
                (None, None) => {
                    return Err(invalid("needs either a source or a size".into()));
                }
                (None, Some([w, h])) if w == 0 || h == 0 => {
                    return Err(invalid(format!("size must be non-zero, got {}x{}", w, h)));
                }
                _ => {}
            }

            let colors = recipe.fill.iter().chain(recipe.ops.iter().filter_map(|op| match op {
                TextureOp::Fill { color, .. } => Some(color),
                _ => None,
            }));
            for c in colors {
                color::parse_hex(c).map_err(|e| invalid(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Builds a generator writing to `out_root`, resolving resource roots
    /// against `base_dir`.
    pub fn into_generator(
        self,
        base_dir: &Path,
        out_root: impl Into<PathBuf>,
    ) -> Result<DataGenerator, ManifestError> {
        let resources = DirectoryResources::new(
            self.resource_roots
                .iter()
                .map(|root| resolve_root(base_dir, root)),
        );

        let mut generator = DataGenerator::new(out_root);
        if !self.textures.is_empty() {
            generator.add_textures(ManifestTextures {
                mod_id: self.mod_id.clone(),
                recipes: self.textures,
                resources,
            })?;
        }

        for kind in [TagKind::Items, TagKind::Blocks] {
            let recipes: Vec<_> = self.tags.iter().filter(|t| t.kind == kind).cloned().collect();
            if !recipes.is_empty() {
                generator.add_tags(ManifestTags {
                    mod_id: self.mod_id.clone(),
                    kind,
                    recipes,
                })?;
            }
        }

        Ok(generator)
    }
}

/// Textures of a manifest.
#[derive(Debug)]
pub struct ManifestTextures {
    mod_id: String,
    recipes: Vec<TextureRecipe>,
    resources: DirectoryResources,
}

impl ManifestTextures {
    pub fn new(mod_id: impl Into<String>, recipes: Vec<TextureRecipe>, resources: DirectoryResources) -> Self {
        Self {
            mod_id: mod_id.into(),
            recipes,
            resources,
        }
    }

    /// Builds one texture. `Ok(None)` means a source texture could not be
    /// decoded and the recipe is skipped.
    fn build(&self, recipe: &TextureRecipe) -> Result<Option<GeneratedTexture>, ProviderError> {
        let mut raster = match (&recipe.source, recipe.size) {
            (Some(source), _) => match get_texture(&self.resources, source)? {
                Some(raster) => raster,
                None => {
                    warn!(id = %recipe.id, %source, "skipping texture, source unreadable");
                    return Ok(None);
                }
            },
            (None, Some([w, h])) => {
                let fill = match &recipe.fill {
                    Some(hex) => color::parse_hex(hex)?,
                    None => 0,
                };
                Raster::new(w, h, fill)?
            }
            (None, None) => {
                return Err(ProviderError::Other(format!(
                    "texture {} needs either a source or a size",
                    recipe.id
                )))
            }
        };

        for op in &recipe.ops {
            if !self.apply(&mut raster, op)? {
                warn!(id = %recipe.id, "skipping texture, overlay unreadable");
                return Ok(None);
            }
        }

        Ok(Some(GeneratedTexture::new(raster, recipe.id.clone())))
    }

    /// Applies one step. Returns `false` if an overlay could not be decoded.
    fn apply(&self, raster: &mut Raster, op: &TextureOp) -> Result<bool, ProviderError> {
        match op {
            TextureOp::Grayscale { region } => {
                let region = region_or_full(*region, raster);
                filter::grayscale(raster, region)?;
            }
            TextureOp::Levels {
                gamma,
                in_low,
                in_high,
                out_low,
                out_high,
                region,
            } => {
                let levels = Levels {
                    gamma: *gamma,
                    in_low: *in_low,
                    in_high: *in_high,
                    out_low: *out_low,
                    out_high: *out_high,
                };
                let region = region_or_full(*region, raster);
                filter::adjust_levels(raster, region, levels)?;
            }
            TextureOp::Hsb {
                hue,
                saturation,
                brightness,
                region,
            } => {
                let shift = HsbShift::new(*hue, *saturation, *brightness);
                let region = region_or_full(*region, raster);
                filter::adjust_hsb(raster, region, shift)?;
            }
            TextureOp::Fill { color, region } => {
                let argb = color::parse_hex(color)?;
                let region = region_or_full(*region, raster);
                raster.fill_region(region, argb)?;
            }
            TextureOp::Overlay { source, x, y } => match get_texture(&self.resources, source)? {
                Some(top) => raster.blit(&top, *x, *y),
                None => return Ok(false),
            },
        }
        Ok(true)
    }
}

fn region_or_full(region: Option<[u32; 4]>, raster: &Raster) -> Region {
    match region {
        Some([x, y, w, h]) => Region::new(x, y, w, h),
        None => Region::full(raster),
    }
}

impl TextureProvider for ManifestTextures {
    fn mod_id(&self) -> &str {
        &self.mod_id
    }

    fn textures(&self) -> TextureIter<'_> {
        Box::new(self.recipes.iter().filter_map(move |r| self.build(r).transpose()))
    }
}

/// Tags of one registry from a manifest.
#[derive(Debug)]
pub struct ManifestTags {
    mod_id: String,
    kind: TagKind,
    recipes: Vec<TagRecipe>,
}

impl TagsProvider for ManifestTags {
    fn mod_id(&self) -> &str {
        &self.mod_id
    }

    fn kind(&self) -> TagKind {
        self.kind
    }

    fn add_tags(&self, tags: &mut TagSet) -> Result<(), TagError> {
        for recipe in &self.recipes {
            let builder = tags.declare(recipe.id.clone())?;
            builder.replace(recipe.replace);
            for value in &recipe.values {
                builder.add_entry(value)?;
            }
        }
        Ok(())
    }
}
