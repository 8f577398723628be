//! Deterministic PNG reader and writer.
//!
//! Uses fixed compression settings so that the same raster always encodes to
//! the same bytes.

use std::io::{Read, Write};
use std::path::Path;

use png::{BitDepth, ColorType, Compression, Decoder, Encoder, FilterType, Transformations};
use thiserror::Error;

use crate::raster::{Raster, RasterError};

/// Errors from PNG operations.
#[derive(Debug, Error)]
pub enum PngError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("PNG decoding error: {0}")]
    Decoding(#[from] png::DecodingError),

    #[error("Invalid image: {0}")]
    Raster(#[from] RasterError),

    #[error("Unsupported color type: {0:?}")]
    UnsupportedColor(ColorType),
}

/// PNG export configuration for deterministic output.
#[derive(Debug, Clone)]
pub struct PngConfig {
    /// Compression level. Use a fixed value for determinism.
    pub compression: Compression,
    /// Filter type. Use a fixed value for determinism.
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

impl PngConfig {
    /// Create config optimized for file size (slower, but deterministic).
    pub fn best_compression() -> Self {
        Self {
            compression: Compression::Best,
            filter: FilterType::Paeth,
        }
    }

    /// Create config optimized for speed (faster, but larger files).
    pub fn fast() -> Self {
        Self {
            compression: Compression::Fast,
            filter: FilterType::NoFilter,
        }
    }
}

/// Write a raster to a PNG file.
pub fn write_raster(raster: &Raster, path: &Path, config: &PngConfig) -> Result<(), PngError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_raster_to_writer(raster, &mut writer, config)?;
    writer.flush()?;
    Ok(())
}

/// Write a raster as RGBA PNG to any writer.
pub fn write_raster_to_writer<W: Write>(
    raster: &Raster,
    writer: W,
    config: &PngConfig,
) -> Result<(), PngError> {
    let mut encoder = Encoder::new(writer, raster.width(), raster.height());
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    // The png crate doesn't add timestamps or other variable metadata.
    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&raster.to_rgba8())?;
    png_writer.finish()?;

    Ok(())
}

/// Encode a raster into an in-memory PNG.
pub fn encode_raster(raster: &Raster, config: &PngConfig) -> Result<Vec<u8>, PngError> {
    let mut data = Vec::new();
    write_raster_to_writer(raster, &mut data, config)?;
    Ok(data)
}

/// Decode a PNG of any colour type and bit depth into a raster.
pub fn read_raster<R: Read>(reader: R) -> Result<Raster, PngError> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let bytes = &buf[..info.buffer_size()];

    let rgba: Vec<u8> = match info.color_type {
        ColorType::Rgba => bytes.to_vec(),
        ColorType::Rgb => bytes
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        ColorType::GrayscaleAlpha => bytes
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        ColorType::Grayscale => bytes.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        other => return Err(PngError::UnsupportedColor(other)),
    };

    Ok(Raster::from_rgba8(info.width, info.height, &rgba)?)
}

/// Decode a PNG file into a raster.
pub fn read_raster_file(path: &Path) -> Result<Raster, PngError> {
    let file = std::fs::File::open(path)?;
    read_raster(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Region;
    use std::io::Cursor;

    fn sample() -> Raster {
        let mut raster = Raster::transparent(16, 8).unwrap();
        for (x, y) in Region::full(&raster).coords() {
            raster.set(x, y, crate::color::pack((x * 16) as u8, (y * 32) as u8, 7, 200));
        }
        raster
    }

    #[test]
    fn test_encode_deterministic() {
        let raster = sample();
        let config = PngConfig::default();
        let data1 = encode_raster(&raster, &config).unwrap();
        let data2 = encode_raster(&raster, &config).unwrap();
        assert_eq!(data1, data2, "PNG data should be identical");
    }

    #[test]
    fn test_decode_rgba_preserves_pixels() {
        let raster = sample();
        for config in [PngConfig::default(), PngConfig::best_compression(), PngConfig::fast()] {
            let data = encode_raster(&raster, &config).unwrap();
            let decoded = read_raster(Cursor::new(data)).unwrap();
            assert_eq!(decoded, raster);
        }
    }

    fn encode_with(color: ColorType, depth: BitDepth, width: u32, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = Encoder::new(&mut out, width, 1);
            encoder.set_color(color);
            encoder.set_depth(depth);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        out
    }

    #[test]
    fn test_decode_rgb_is_opaque() {
        let data = encode_with(ColorType::Rgb, BitDepth::Eight, 2, &[1, 2, 3, 4, 5, 6]);
        let raster = read_raster(Cursor::new(data)).unwrap();
        assert_eq!(raster.pixels(), &[0xFF01_0203, 0xFF04_0506]);
    }

    #[test]
    fn test_decode_grayscale_variants() {
        let gray = encode_with(ColorType::Grayscale, BitDepth::Eight, 2, &[0x10, 0xF0]);
        let raster = read_raster(Cursor::new(gray)).unwrap();
        assert_eq!(raster.pixels(), &[0xFF10_1010, 0xFFF0_F0F0]);

        let gray_alpha = encode_with(ColorType::GrayscaleAlpha, BitDepth::Eight, 1, &[0x20, 0x80]);
        let raster = read_raster(Cursor::new(gray_alpha)).unwrap();
        assert_eq!(raster.pixels(), &[0x8020_2020]);
    }

    #[test]
    fn test_decode_sixteen_bit_strips() {
        let data = encode_with(
            ColorType::Rgba,
            BitDepth::Sixteen,
            1,
            &[0xAB, 0x00, 0xCD, 0x00, 0xEF, 0x00, 0xFF, 0xFF],
        );
        let raster = read_raster(Cursor::new(data)).unwrap();
        assert_eq!(raster.pixels(), &[0xFFAB_CDEF]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = read_raster(Cursor::new(b"not a png".to_vec())).unwrap_err();
        assert!(matches!(err, PngError::Decoding(_)));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        let raster = sample();
        write_raster(&raster, &path, &PngConfig::default()).unwrap();
        assert_eq!(read_raster_file(&path).unwrap(), raster);
    }
}
