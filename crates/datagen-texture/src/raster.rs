//! In-memory raster images.

use datagen_core::Fingerprint;
use thiserror::Error;

use crate::color;

/// Errors from raster construction and region access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("region {region} lies outside a {width}x{height} image")]
    RegionOutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },

    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    DataLength { expected: usize, actual: usize },
}

/// A rectangle of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The region covering a whole raster.
    pub fn full(raster: &Raster) -> Self {
        Self::new(0, 0, raster.width, raster.height)
    }

    /// Whether this region fits inside a `width x height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        right <= width as u64 && bottom <= height as u64
    }

    /// Row-major iterator over every `(x, y)` in the region.
    pub fn coords(&self) -> impl Iterator<Item = (u32, u32)> {
        let Region {
            x,
            y,
            width,
            height,
        } = *self;
        (y..y + height).flat_map(move |py| (x..x + width).map(move |px| (px, py)))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}x{}]",
            self.x, self.y, self.width, self.height
        )
    }
}

/// A 2D image of packed ARGB pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Raster {
    /// Creates a raster filled with one colour.
    pub fn new(width: u32, height: u32, fill: u32) -> Result<Self, RasterError> {
        let size = Self::pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![fill; size],
        })
    }

    /// Creates a fully transparent raster.
    pub fn transparent(width: u32, height: u32) -> Result<Self, RasterError> {
        Self::new(width, height, 0)
    }

    /// Builds a raster from 8-bit RGBA bytes.
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Self, RasterError> {
        let size = Self::pixel_count(width, height)?;
        let expected = size * 4;
        if data.len() != expected {
            return Err(RasterError::DataLength {
                expected,
                actual: data.len(),
            });
        }

        let pixels = data
            .chunks_exact(4)
            .map(|p| color::pack(p[3], p[0], p[1], p[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    fn pixel_count(width: u32, height: u32) -> Result<usize, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        (width as usize)
            .checked_mul(height as usize)
            .ok_or(RasterError::InvalidDimensions { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Get a pixel at the given coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[self.index(x, y)]
    }

    /// Set a pixel at the given coordinates.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, argb: u32) {
        let idx = self.index(x, y);
        self.pixels[idx] = argb;
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Fails unless `region` lies inside this raster.
    pub fn check_region(&self, region: Region) -> Result<(), RasterError> {
        if region.fits(self.width, self.height) {
            Ok(())
        } else {
            Err(RasterError::RegionOutOfBounds {
                region,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Applies `f` to every pixel in `region`.
    pub fn map_region(
        &mut self,
        region: Region,
        mut f: impl FnMut(u32) -> u32,
    ) -> Result<(), RasterError> {
        self.check_region(region)?;
        for (x, y) in region.coords() {
            let idx = self.index(x, y);
            self.pixels[idx] = f(self.pixels[idx]);
        }
        Ok(())
    }

    /// Fills `region` with one colour.
    pub fn fill_region(&mut self, region: Region, argb: u32) -> Result<(), RasterError> {
        self.map_region(region, |_| argb)
    }

    /// Copies `src` into this raster with its top-left corner at `(x, y)`.
    /// Pixels falling outside this raster are dropped.
    pub fn blit(&mut self, src: &Raster, x: u32, y: u32) {
        let w = src.width.min(self.width.saturating_sub(x));
        let h = src.height.min(self.height.saturating_sub(y));
        for sy in 0..h {
            for sx in 0..w {
                self.set(x + sx, y + sy, src.get(sx, sy));
            }
        }
    }

    /// Copies `region` out into a new raster.
    pub fn sub_image(&self, region: Region) -> Result<Raster, RasterError> {
        self.check_region(region)?;
        let mut out = Raster::transparent(region.width, region.height)?;
        for (x, y) in region.coords() {
            out.set(x - region.x, y - region.y, self.get(x, y));
        }
        Ok(out)
    }

    /// Convert to 8-bit RGBA bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for &pixel in &self.pixels {
            let [a, r, g, b] = color::unpack(pixel);
            bytes.extend_from_slice(&[r, g, b, a]);
        }
        bytes
    }

    /// Content fingerprint: BLAKE3 over width, height, then every pixel
    /// row-major as little-endian ARGB.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Fingerprint::hasher();
        hasher.update_u32(self.width).update_u32(self.height);
        for &pixel in &self.pixels {
            hasher.update_u32(pixel);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty() {
        assert_eq!(
            Raster::transparent(0, 4),
            Err(RasterError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn test_get_set_row_major() {
        let mut raster = Raster::transparent(3, 2).unwrap();
        raster.set(2, 1, 0xFF11_2233);
        assert_eq!(raster.get(2, 1), 0xFF11_2233);
        assert_eq!(raster.pixels()[5], 0xFF11_2233);
    }

    #[test]
    fn test_rgba8_roundtrip() {
        let mut raster = Raster::new(2, 2, 0x8001_0203).unwrap();
        raster.set(1, 0, 0xFFAA_BBCC);
        let bytes = raster.to_rgba8();
        assert_eq!(&bytes[0..4], &[0x01, 0x02, 0x03, 0x80]);
        assert_eq!(&bytes[4..8], &[0xAA, 0xBB, 0xCC, 0xFF]);
        assert_eq!(Raster::from_rgba8(2, 2, &bytes).unwrap(), raster);
        assert!(matches!(
            Raster::from_rgba8(2, 2, &bytes[..12]),
            Err(RasterError::DataLength { expected: 16, .. })
        ));
    }

    #[test]
    fn test_region_bounds() {
        let raster = Raster::transparent(16, 16).unwrap();
        assert!(raster.check_region(Region::new(0, 0, 16, 16)).is_ok());
        assert!(raster.check_region(Region::new(8, 8, 8, 8)).is_ok());
        assert!(raster.check_region(Region::new(8, 8, 9, 8)).is_err());
        assert!(raster.check_region(Region::new(u32::MAX, 0, 2, 1)).is_err());
    }

    #[test]
    fn test_fill_and_sub_image() {
        let mut raster = Raster::transparent(4, 4).unwrap();
        raster
            .fill_region(Region::new(1, 1, 2, 2), 0xFFFF_0000)
            .unwrap();
        assert_eq!(raster.get(0, 0), 0);
        assert_eq!(raster.get(2, 2), 0xFFFF_0000);
        assert_eq!(raster.get(3, 3), 0);

        let sub = raster.sub_image(Region::new(1, 1, 2, 2)).unwrap();
        assert!(sub.pixels().iter().all(|&p| p == 0xFFFF_0000));
    }

    #[test]
    fn test_blit_clips() {
        let mut dst = Raster::transparent(4, 4).unwrap();
        let src = Raster::new(3, 3, 0xFF00_FF00).unwrap();
        dst.blit(&src, 2, 2);
        assert_eq!(dst.get(3, 3), 0xFF00_FF00);
        assert_eq!(dst.get(1, 1), 0);
        assert_eq!(dst.pixels().iter().filter(|&&p| p != 0).count(), 4);

        dst.blit(&src, 10, 10);
        assert_eq!(dst.pixels().iter().filter(|&&p| p != 0).count(), 4);
    }

    #[test]
    fn test_fingerprint_equal_for_equal_pixels() {
        let a = Raster::new(8, 8, 0xFF12_3456).unwrap();
        let b = Raster::new(8, 8, 0xFF12_3456).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_any_pixel() {
        let base = Raster::new(8, 8, 0xFF12_3456).unwrap();
        let fp = base.fingerprint();
        for (x, y) in Region::full(&base).coords() {
            let mut changed = base.clone();
            changed.set(x, y, 0xFF12_3457);
            assert_ne!(changed.fingerprint(), fp, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_fingerprint_includes_dimensions() {
        let wide = Raster::new(4, 1, 0xFF00_0000).unwrap();
        let tall = Raster::new(1, 4, 0xFF00_0000).unwrap();
        assert_ne!(wide.fingerprint(), tall.fingerprint());
    }

    #[test]
    fn test_index_does_not_wrap_past_u32() {
        // Pixel storage is never touched; only the index arithmetic.
        let huge = Raster {
            width: 100_000,
            height: 100_000,
            pixels: Vec::new(),
        };
        assert_eq!(huge.index(7, 50_000), 5_000_000_007);
        assert_eq!(huge.index(99_999, 99_999), 9_999_999_999);
    }
}
