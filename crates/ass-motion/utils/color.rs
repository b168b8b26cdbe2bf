//! ASS color and alpha codecs
//!
//! Override tags carry colors as `&HBBGGRR&` and alpha as `&HAA&`, both in
//! hexadecimal with the trailing ampersand frequently omitted. Style fields
//! carry colors as `&HAABBGGRR`, where the top byte is the alpha channel.

use super::errors::{MotionError, Result};
use super::math::{clamp, lerp};

/// RGB color as used by `\c`, `\1c`–`\4c`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Create a color from its components
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse an ASS BGR color string
    ///
    /// Accepts `&HBBGGRR&`, `&HBBGGRR`, lowercase `&h` and eight digit
    /// `&HAABBGGRR` forms. For the eight digit form the alpha byte is ignored;
    /// use [`parse_style_colour`] to keep it.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::InvalidColor` for anything else.
    pub fn parse(text: &str) -> Result<Self> {
        parse_style_colour(text).map(|(color, _)| color)
    }

    /// Format as an override tag value (`&HBBGGRR&`)
    #[must_use]
    pub fn to_ass(self) -> String {
        format!("&H{:02X}{:02X}{:02X}&", self.b, self.g, self.r)
    }

    /// Component-wise interpolation, rounded to the nearest byte
    #[must_use]
    pub fn interpolate(self, to: Self, progress: f64) -> Self {
        Self {
            r: lerp_byte(self.r, to.r, progress),
            g: lerp_byte(self.g, to.g, progress),
            b: lerp_byte(self.b, to.b, progress),
        }
    }
}

/// Parse a color string, returning the color and its alpha byte
///
/// Six digit values report an alpha of `0` (opaque in ASS terms).
///
/// # Errors
///
/// Returns `MotionError::InvalidColor` if the text is not a hex color.
pub fn parse_style_colour(text: &str) -> Result<(Color, u8)> {
    let hex = strip_hex(text).ok_or_else(|| MotionError::InvalidColor(text.to_string()))?;
    if hex.is_empty() || hex.len() > 8 {
        return Err(MotionError::InvalidColor(text.to_string()));
    }

    let value = u32::from_str_radix(hex, 16)
        .map_err(|_| MotionError::InvalidColor(format!("Invalid hex value: {hex}")))?;

    let color = Color {
        r: (value & 0xFF) as u8,
        g: ((value >> 8) & 0xFF) as u8,
        b: ((value >> 16) & 0xFF) as u8,
    };
    let alpha = if hex.len() > 6 {
        ((value >> 24) & 0xFF) as u8
    } else {
        0
    };
    Ok((color, alpha))
}

/// Parse an ASS alpha string (`&HAA&`)
///
/// # Errors
///
/// Returns `MotionError::InvalidColor` if the text is not a hex byte.
pub fn parse_alpha(text: &str) -> Result<u8> {
    let hex = strip_hex(text).ok_or_else(|| MotionError::InvalidColor(text.to_string()))?;
    if hex.is_empty() {
        return Err(MotionError::InvalidColor(text.to_string()));
    }
    let value = u32::from_str_radix(hex, 16)
        .map_err(|_| MotionError::InvalidColor(format!("Invalid hex value: {hex}")))?;
    Ok((value & 0xFF) as u8)
}

/// Format an alpha byte as an override tag value (`&HAA&`)
#[must_use]
pub fn format_alpha(alpha: u8) -> String {
    format!("&H{alpha:02X}&")
}

/// Interpolate two alpha bytes, rounded to the nearest byte
#[must_use]
pub fn interpolate_alpha(from: u8, to: u8, progress: f64) -> u8 {
    lerp_byte(from, to, progress)
}

fn lerp_byte(from: u8, to: u8, progress: f64) -> u8 {
    clamp(lerp(f64::from(from), f64::from(to), progress).round(), 0.0, 255.0) as u8
}

fn strip_hex(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("&H")
        .or_else(|| trimmed.strip_prefix("&h"))
        .unwrap_or(trimmed);
    let body = body.strip_suffix('&').unwrap_or(body);
    body.chars().all(|c| c.is_ascii_hexdigit()).then_some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bgr_colors() {
        assert_eq!(Color::parse("&H0000FF&").unwrap(), Color::new(255, 0, 0));
        assert_eq!(Color::parse("&H00FF00").unwrap(), Color::new(0, 255, 0));
        assert_eq!(Color::parse("&hFF0000&").unwrap(), Color::new(0, 0, 255));
        assert!(Color::parse("invalid").is_err());
        assert!(Color::parse("&H&").is_err());
    }

    #[test]
    fn parse_style_colours_with_alpha() {
        let (color, alpha) = parse_style_colour("&H80FFFFFF").unwrap();
        assert_eq!(color, Color::new(255, 255, 255));
        assert_eq!(alpha, 0x80);

        let (_, alpha) = parse_style_colour("&H00FFFFFF").unwrap();
        assert_eq!(alpha, 0);
    }

    #[test]
    fn color_round_trip_format() {
        let color = Color::new(0x12, 0x34, 0x56);
        assert_eq!(color.to_ass(), "&H563412&");
        assert_eq!(Color::parse(&color.to_ass()).unwrap(), color);
    }

    #[test]
    fn alpha_codec() {
        assert_eq!(parse_alpha("&H80&").unwrap(), 0x80);
        assert_eq!(parse_alpha("&HFF").unwrap(), 0xFF);
        assert!(parse_alpha("&HZZ&").is_err());
        assert_eq!(format_alpha(0x0A), "&H0A&");
    }

    #[test]
    fn interpolation() {
        let from = Color::new(0, 0, 0);
        let to = Color::new(255, 100, 10);
        assert_eq!(from.interpolate(to, 0.5), Color::new(128, 50, 5));
        assert_eq!(interpolate_alpha(0, 255, 1.0), 255);
        assert_eq!(interpolate_alpha(0, 255, 0.0), 0);
    }
}
