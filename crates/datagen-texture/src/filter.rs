//! Per-pixel filters over a rectangular region.
//!
//! Every filter validates its arguments and the region before touching any
//! pixel, and never changes the alpha channel.

use thiserror::Error;

use crate::color::{self, ALPHA_MASK};
use crate::raster::{Raster, RasterError, Region};

/// Errors from filter application.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("invalid level adjustment: {0}")]
    InvalidLevels(String),
}

/// Parameters of a level adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    /// Exponent applied to the normalized input; must be positive.
    pub gamma: f64,
    pub in_low: i32,
    pub in_high: i32,
    pub out_low: i32,
    pub out_high: i32,
}

impl Levels {
    /// Full-range levels with the given exponent.
    pub const fn gamma(gamma: f64) -> Self {
        Self {
            gamma,
            in_low: 0,
            in_high: 255,
            out_low: 0,
            out_high: 255,
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        let fail = |msg: String| Err(FilterError::InvalidLevels(msg));

        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return fail(format!("gamma must be positive, got {}", self.gamma));
        }
        if self.in_low < 0 || self.in_high > 255 || self.in_low >= self.in_high {
            return fail(format!(
                "input range must satisfy 0 <= low < high <= 255, got [{}, {}]",
                self.in_low, self.in_high
            ));
        }
        if self.out_low < 0 || self.out_high > 255 || self.out_low >= self.out_high {
            return fail(format!(
                "output range must satisfy 0 <= low < high <= 255, got [{}, {}]",
                self.out_low, self.out_high
            ));
        }
        Ok(())
    }

    /// Maps one channel value. Assumes `self` is valid.
    ///
    /// The result is truncated toward zero, not rounded.
    pub fn apply(&self, value: u8) -> u8 {
        let v = value as i32;
        if v - self.in_low < 0 {
            return self.out_low as u8;
        }
        if v >= self.in_high {
            return self.out_high as u8;
        }

        let t = (v - self.in_low) as f64 / (self.in_high - self.in_low) as f64;
        let out = self.out_low as f64 + (self.out_high - self.out_low) as f64 * t.powf(self.gamma);
        out.clamp(0.0, 255.0) as u8
    }
}

/// Remaps the RGB channels of `region` through `levels`.
pub fn adjust_levels(raster: &mut Raster, region: Region, levels: Levels) -> Result<(), FilterError> {
    levels.validate()?;
    raster.check_region(region)?;

    raster.map_region(region, |pixel| {
        let [_, r, g, b] = color::unpack(pixel);
        (pixel & ALPHA_MASK)
            | color::pack(0, levels.apply(r), levels.apply(g), levels.apply(b))
    })?;
    Ok(())
}

/// Luma of an RGB triple, rounded half up.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = r as f64 * 0.299 + g as f64 * 0.587 + b as f64 * 0.114;
    (y + 0.5).floor().min(255.0) as u8
}

/// Replaces the RGB of every pixel in `region` with its luma.
pub fn grayscale(raster: &mut Raster, region: Region) -> Result<(), FilterError> {
    raster.map_region(region, |pixel| {
        let [_, r, g, b] = color::unpack(pixel);
        let y = luma(r, g, b);
        (pixel & ALPHA_MASK) | color::pack(0, y, y, y)
    })?;
    Ok(())
}

/// Deltas added in hue/saturation/brightness space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HsbShift {
    /// Fraction of a full hue turn; wraps.
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl HsbShift {
    pub const fn new(hue: f32, saturation: f32, brightness: f32) -> Self {
        Self {
            hue,
            saturation,
            brightness,
        }
    }

    /// Shifts one packed colour, keeping its alpha.
    pub fn apply(&self, pixel: u32) -> u32 {
        let [a, r, g, b] = color::unpack(pixel);
        let [h, s, v] = color::rgb_to_hsb(r, g, b);

        let h = h + self.hue;
        let s = (s + self.saturation).clamp(0.0, 1.0);
        let v = (v + self.brightness).clamp(0.0, 1.0);

        let rgb = color::hsb_to_rgb(h, s, v) & color::RGB_MASK;
        ((a as u32) << 24) | rgb
    }
}

/// Shifts hue, saturation and brightness of every pixel in `region`.
pub fn adjust_hsb(raster: &mut Raster, region: Region, shift: HsbShift) -> Result<(), FilterError> {
    raster.map_region(region, |pixel| shift.apply(pixel))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> Raster {
        let mut raster = Raster::transparent(16, 16).unwrap();
        for (x, y) in Region::full(&raster).coords() {
            let i = y * 16 + x;
            let a = (i * 7 % 256) as u8;
            raster.set(x, y, color::pack(a, i as u8, (255 - i) as u8, (i * 3 % 256) as u8));
        }
        raster
    }

    #[test]
    fn test_levels_identity() {
        let levels = Levels::gamma(1.0);
        for v in 0..=255u8 {
            assert_eq!(levels.apply(v), v, "value {}", v);
        }

        let mut raster = gradient();
        let before = raster.clone();
        adjust_levels(&mut raster, Region::full(&before), levels).unwrap();
        assert_eq!(raster, before);
    }

    #[test]
    fn test_levels_clamp_outside_input_range() {
        let levels = Levels {
            gamma: 0.7,
            in_low: 40,
            in_high: 200,
            out_low: 10,
            out_high: 240,
        };
        for v in 0..40u8 {
            assert_eq!(levels.apply(v), 10);
        }
        for v in 200..=255u8 {
            assert_eq!(levels.apply(v), 240);
        }
        assert_eq!(levels.apply(40), 10);
    }

    #[test]
    fn test_levels_truncates() {
        // 255 * (128/255)^2 = 64.25...
        assert_eq!(Levels::gamma(2.0).apply(128), 64);
        // 255 * (100/255)^0.5 = 159.68...
        assert_eq!(Levels::gamma(0.5).apply(100), 159);
    }

    #[test]
    fn test_levels_validation_touches_nothing() {
        let mut raster = gradient();
        let before = raster.clone();
        let region = Region::full(&before);

        let bad = [
            Levels::gamma(0.0),
            Levels::gamma(-1.0),
            Levels::gamma(f64::NAN),
            Levels { in_low: 10, in_high: 10, ..Levels::gamma(1.0) },
            Levels { in_low: -1, ..Levels::gamma(1.0) },
            Levels { in_high: 256, ..Levels::gamma(1.0) },
            Levels { out_low: 200, out_high: 100, ..Levels::gamma(1.0) },
            Levels { out_high: 300, ..Levels::gamma(1.0) },
        ];
        for levels in bad {
            assert!(matches!(
                adjust_levels(&mut raster, region, levels),
                Err(FilterError::InvalidLevels(_))
            ));
        }
        assert_eq!(raster, before);
    }

    #[test]
    fn test_levels_region_only_and_alpha_kept() {
        let mut raster = Raster::new(4, 4, 0x7F80_8080).unwrap();
        adjust_levels(&mut raster, Region::new(0, 0, 2, 4), Levels::gamma(2.0)).unwrap();
        assert_eq!(raster.get(0, 0), 0x7F40_4040);
        assert_eq!(raster.get(3, 3), 0x7F80_8080);
    }

    #[test]
    fn test_out_of_bounds_region_rejected() {
        let mut raster = gradient();
        let before = raster.clone();
        let err = grayscale(&mut raster, Region::new(10, 10, 10, 10)).unwrap_err();
        assert!(matches!(err, FilterError::Raster(RasterError::RegionOutOfBounds { .. })));
        assert_eq!(raster, before);
    }

    #[test]
    fn test_luma_rounding() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        // 0.299 * 255 = 76.245
        assert_eq!(luma(255, 0, 0), 76);
        // 0.587 * 255 = 149.685
        assert_eq!(luma(0, 255, 0), 150);
        // 0.114 * 255 = 29.07
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_grayscale_idempotent() {
        let mut raster = gradient();
        let region = Region::full(&raster);
        grayscale(&mut raster, region).unwrap();
        let once = raster.clone();
        grayscale(&mut raster, region).unwrap();
        assert_eq!(raster, once);

        for &pixel in once.pixels() {
            let [_, r, g, b] = color::unpack(pixel);
            assert!(r == g && g == b);
        }
    }

    #[test]
    fn test_grayscale_keeps_alpha() {
        let mut raster = gradient();
        let before = raster.clone();
        grayscale(&mut raster, Region::full(&before)).unwrap();
        for (a, b) in raster.pixels().iter().zip(before.pixels()) {
            assert_eq!(a & ALPHA_MASK, b & ALPHA_MASK);
        }
    }

    #[test]
    fn test_hsb_zero_shift_near_identity() {
        let mut raster = gradient();
        let before = raster.clone();
        adjust_hsb(&mut raster, Region::full(&before), HsbShift::default()).unwrap();
        for (after, orig) in raster.pixels().iter().zip(before.pixels()) {
            let a = color::unpack(*after);
            let o = color::unpack(*orig);
            assert_eq!(a[0], o[0]);
            for c in 1..4 {
                assert!(
                    (a[c] as i32 - o[c] as i32).abs() <= 1,
                    "{:08x} vs {:08x}",
                    after,
                    orig
                );
            }
        }
    }

    #[test]
    fn test_hsb_preserves_alpha_for_any_shift() {
        let shifts = [
            HsbShift::new(0.5, 0.0, 0.0),
            HsbShift::new(-3.3, 2.0, -2.0),
            HsbShift::new(0.1, -1.0, 1.0),
        ];
        for shift in shifts {
            let mut raster = gradient();
            let before = raster.clone();
            adjust_hsb(&mut raster, Region::full(&before), shift).unwrap();
            for (a, b) in raster.pixels().iter().zip(before.pixels()) {
                assert_eq!(a & ALPHA_MASK, b & ALPHA_MASK);
            }
        }
    }

    #[test]
    fn test_hsb_clamps() {
        let red = 0xFFFF_0000;
        assert_eq!(HsbShift::new(0.0, 0.0, -5.0).apply(red), 0xFF00_0000);
        assert_eq!(HsbShift::new(0.0, -5.0, 0.0).apply(red), 0xFFFF_FFFF);
        // a third of a turn moves red to green
        assert_eq!(HsbShift::new(1.0 / 3.0, 0.0, 0.0).apply(red), 0xFF00_FF00);
    }
}
