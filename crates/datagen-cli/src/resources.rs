//! Lookup of existing resources, such as source textures to derive from.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use datagen_core::{LocationError, ResourceLocation};
use datagen_texture::{png, Raster};
use thiserror::Error;
use tracing::error;

/// Errors from resource lookup that abort generation.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("texture {0} does not exist in any known resource root")]
    NotFound(ResourceLocation),

    #[error(transparent)]
    Location(#[from] LocationError),
}

/// Somewhere resources can be found.
pub trait ResourceSource {
    /// Whether the resource exists.
    fn exists(&self, resource: &ResourceLocation) -> bool;

    /// Opens the resource for reading.
    fn open(&self, resource: &ResourceLocation) -> io::Result<Box<dyn Read>>;
}

/// Resource roots on disk, searched in order. A resource `ns:path` lives at
/// `<root>/assets/ns/path`.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResources {
    roots: Vec<PathBuf>,
}

impl DirectoryResources {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    pub fn add_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// First file on disk that provides `resource`.
    pub fn resolve(&self, resource: &ResourceLocation) -> Option<PathBuf> {
        let relative = resource.asset_path();
        self.roots
            .iter()
            .map(|root| root.join(&relative))
            .find(|path| path.is_file())
    }
}

impl ResourceSource for DirectoryResources {
    fn exists(&self, resource: &ResourceLocation) -> bool {
        self.resolve(resource).is_some()
    }

    fn open(&self, resource: &ResourceLocation) -> io::Result<Box<dyn Read>> {
        let path = self.resolve(resource).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", resource))
        })?;
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Reads the texture `texture` (i.e. `ns:textures/<path>.png`).
///
/// Fails if no source has it. A texture that exists but cannot be read or
/// decoded is logged and returns `Ok(None)`; the caller decides what to do
/// without it.
pub fn get_texture(
    source: &dyn ResourceSource,
    texture: &ResourceLocation,
) -> Result<Option<Raster>, LookupError> {
    let resource = texture.texture_resource()?;
    if !source.exists(&resource) {
        return Err(LookupError::NotFound(resource));
    }

    let reader = match source.open(&resource) {
        Ok(reader) => reader,
        Err(e) => {
            error!(%texture, error = %e, "couldn't read texture");
            return Ok(None);
        }
    };

    match png::read_raster(reader) {
        Ok(raster) => Ok(Some(raster)),
        Err(e) => {
            error!(%texture, error = %e, "couldn't read texture");
            Ok(None)
        }
    }
}

/// Resolves a root relative to `base` unless it is already absolute.
pub fn resolve_root(base: &Path, root: &Path) -> PathBuf {
    if root.is_absolute() {
        root.to_path_buf()
    } else {
        base.join(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagen_texture::PngConfig;
    use std::fs;
    use tempfile::TempDir;

    fn loc(s: &str) -> ResourceLocation {
        ResourceLocation::parse(s).unwrap()
    }

    fn put_texture(root: &Path, id: &str, raster: &Raster) {
        let path = root.join(loc(id).texture_resource().unwrap().asset_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        png::write_raster(raster, &path, &PngConfig::default()).unwrap();
    }

    #[test]
    fn test_get_texture_decodes() {
        let tmp = TempDir::new().unwrap();
        let raster = Raster::new(4, 4, 0xFF33_6699).unwrap();
        put_texture(tmp.path(), "mymod:item/gear", &raster);

        let resources = DirectoryResources::new([tmp.path().to_path_buf()]);
        let found = get_texture(&resources, &loc("mymod:item/gear")).unwrap();
        assert_eq!(found, Some(raster));
    }

    #[test]
    fn test_get_texture_missing_is_error() {
        let tmp = TempDir::new().unwrap();
        let resources = DirectoryResources::new([tmp.path().to_path_buf()]);
        let err = get_texture(&resources, &loc("mymod:item/nope")).unwrap_err();
        match err {
            LookupError::NotFound(resource) => {
                assert_eq!(resource.to_string(), "mymod:textures/item/nope.png")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_get_texture_corrupt_is_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("assets/mymod/textures/item/bad.png");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"definitely not a png").unwrap();

        let resources = DirectoryResources::new([tmp.path().to_path_buf()]);
        assert_eq!(get_texture(&resources, &loc("mymod:item/bad")).unwrap(), None);
    }

    #[test]
    fn test_roots_searched_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        put_texture(first.path(), "mymod:item/gear", &Raster::new(1, 1, 0xFF00_0001).unwrap());
        put_texture(second.path(), "mymod:item/gear", &Raster::new(1, 1, 0xFF00_0002).unwrap());
        put_texture(second.path(), "mymod:item/only2", &Raster::new(1, 1, 0xFF00_0003).unwrap());

        let mut resources = DirectoryResources::default();
        resources.add_root(first.path());
        resources.add_root(second.path());

        let gear = get_texture(&resources, &loc("mymod:item/gear")).unwrap().unwrap();
        assert_eq!(gear.get(0, 0), 0xFF00_0001);
        let only2 = get_texture(&resources, &loc("mymod:item/only2")).unwrap().unwrap();
        assert_eq!(only2.get(0, 0), 0xFF00_0003);
    }

    #[test]
    fn test_resolve_root() {
        let base = Path::new("/work/pack");
        assert_eq!(resolve_root(base, Path::new("res")), PathBuf::from("/work/pack/res"));
        assert_eq!(resolve_root(base, Path::new("/abs")), PathBuf::from("/abs"));
    }
}
