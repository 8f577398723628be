//! Packed ARGB colour utilities.
//!
//! Pixels are stored as a single `u32` laid out as `0xAARRGGBB`. Composing a
//! colour from separate channels validates that every channel is in [0, 255].

use thiserror::Error;

/// Mask selecting the alpha byte of a packed colour.
pub const ALPHA_MASK: u32 = 0xFF00_0000;

/// Mask selecting the RGB bytes of a packed colour.
pub const RGB_MASK: u32 = 0x00FF_FFFF;

/// Errors from colour composition and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("{channel} channel out of range: {value} (expected 0-255)")]
    ChannelOutOfRange { channel: Channel, value: i32 },

    #[error("invalid hex colour '{0}' (expected #rrggbb or #aarrggbb)")]
    InvalidHex(String),
}

/// A colour channel, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Alpha,
    Red,
    Green,
    Blue,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Channel::Alpha => "alpha",
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        };
        f.write_str(name)
    }
}

fn check_channel(channel: Channel, value: i32) -> Result<u32, ColorError> {
    if (0..=255).contains(&value) {
        Ok(value as u32)
    } else {
        Err(ColorError::ChannelOutOfRange { channel, value })
    }
}

/// Packs four channels into `0xAARRGGBB`.
///
/// # Example
/// ```
/// use datagen_texture::color::argb;
///
/// assert_eq!(argb(255, 16, 32, 48).unwrap(), 0xFF10_2030);
/// assert!(argb(255, 256, 0, 0).is_err());
/// ```
pub fn argb(a: i32, r: i32, g: i32, b: i32) -> Result<u32, ColorError> {
    let a = check_channel(Channel::Alpha, a)?;
    let r = check_channel(Channel::Red, r)?;
    let g = check_channel(Channel::Green, g)?;
    let b = check_channel(Channel::Blue, b)?;
    Ok((a << 24) | (r << 16) | (g << 8) | b)
}

/// Packs an opaque colour (alpha = 255).
pub fn rgb(r: i32, g: i32, b: i32) -> Result<u32, ColorError> {
    argb(255, r, g, b)
}

/// Packs channels that are already known to be in range.
#[inline]
pub const fn pack(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub const fn alpha(color: u32) -> u8 {
    (color >> 24) as u8
}

#[inline]
pub const fn red(color: u32) -> u8 {
    (color >> 16) as u8
}

#[inline]
pub const fn green(color: u32) -> u8 {
    (color >> 8) as u8
}

#[inline]
pub const fn blue(color: u32) -> u8 {
    color as u8
}

/// Splits a packed colour into `[a, r, g, b]`.
#[inline]
pub const fn unpack(color: u32) -> [u8; 4] {
    [alpha(color), red(color), green(color), blue(color)]
}

/// Parses `#rrggbb` (opaque) or `#aarrggbb`.
pub fn parse_hex(input: &str) -> Result<u32, ColorError> {
    let invalid = || ColorError::InvalidHex(input.to_string());
    let hex = input.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
    match hex.len() {
        6 => Ok(ALPHA_MASK | value),
        8 => Ok(value),
        _ => Err(invalid()),
    }
}

/// Converts 8-bit RGB to hue, saturation, brightness.
///
/// Hue is a fraction of a full turn in [0, 1); saturation and brightness are
/// in [0, 1].
pub fn rgb_to_hsb(r: u8, g: u8, b: u8) -> [f32; 3] {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let cmax = r.max(g).max(b);
    let cmin = r.min(g).min(b);

    let brightness = cmax as f32 / 255.0;
    let saturation = if cmax != 0 {
        (cmax - cmin) as f32 / cmax as f32
    } else {
        0.0
    };

    if saturation == 0.0 {
        return [0.0, saturation, brightness];
    }

    let span = (cmax - cmin) as f32;
    let redc = (cmax - r) as f32 / span;
    let greenc = (cmax - g) as f32 / span;
    let bluec = (cmax - b) as f32 / span;

    let hue = if r == cmax {
        bluec - greenc
    } else if g == cmax {
        2.0 + redc - bluec
    } else {
        4.0 + greenc - redc
    };

    let hue = hue / 6.0;
    let hue = if hue < 0.0 { hue + 1.0 } else { hue };

    [hue, saturation, brightness]
}

/// Converts hue, saturation, brightness to an opaque packed colour.
///
/// Hue wraps: only its fractional part is used, so `1.25` and `-0.75` both
/// mean a quarter turn.
pub fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> u32 {
    let to_byte = |v: f32| (v * 255.0 + 0.5) as u8;

    if saturation == 0.0 {
        let v = to_byte(brightness);
        return pack(255, v, v, v);
    }

    // A tiny negative hue rounds up to exactly one turn.
    let mut h = (hue - hue.floor()) * 6.0;
    if h >= 6.0 {
        h = 0.0;
    }
    let f = h - h.floor();
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));

    let (r, g, b) = match h as i32 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    };

    pack(255, to_byte(r), to_byte(g), to_byte(b))
}
