//! Style records and the style lookup collaborator
//!
//! Holds the subset of a `[V4+ Styles]` entry the motion engine reads when it
//! needs a default for a tag the line does not set explicitly. Values are
//! already decoded; reading styles out of a script file is the caller's job.

use std::collections::HashMap;
use std::hash::BuildHasher;

use ahash::AHashMap;

use crate::utils::{parse_style_colour, Color, Result};

/// Style definition as seen by the motion engine
///
/// # Examples
///
/// ```rust
/// use ass_motion::script::Style;
///
/// let style = Style {
///     name: "Sign".to_string(),
///     scale_x: 120.0,
///     ..Style::default()
/// };
///
/// assert_eq!(style.scale_x, 120.0);
/// assert_eq!(style.alignment, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Style name (unique within a script)
    pub name: String,

    /// Font size in points
    pub font_size: f64,

    /// Primary fill color
    pub primary_colour: Color,

    /// Secondary (karaoke) color
    pub secondary_colour: Color,

    /// Outline color
    pub outline_colour: Color,

    /// Shadow color
    pub back_colour: Color,

    /// Alpha bytes for primary, secondary, outline and shadow (0 = opaque)
    pub alphas: [u8; 4],

    /// Horizontal scale percentage
    pub scale_x: f64,

    /// Vertical scale percentage
    pub scale_y: f64,

    /// Character spacing in pixels
    pub spacing: f64,

    /// Z rotation in degrees
    pub angle: f64,

    /// Outline width
    pub outline: f64,

    /// Shadow depth
    pub shadow: f64,

    /// Numpad alignment (1-9)
    pub alignment: u8,

    /// Left margin in pixels
    pub margin_l: i32,

    /// Right margin in pixels
    pub margin_r: i32,

    /// Vertical margin in pixels
    pub margin_v: i32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            name: String::from("Default"),
            font_size: 48.0,
            primary_colour: Color::new(255, 255, 255),
            secondary_colour: Color::new(255, 0, 0),
            outline_colour: Color::new(0, 0, 0),
            back_colour: Color::new(0, 0, 0),
            alphas: [0, 0, 0, 0],
            scale_x: 100.0,
            scale_y: 100.0,
            spacing: 0.0,
            angle: 0.0,
            outline: 2.0,
            shadow: 2.0,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
        }
    }
}

impl Style {
    /// Set a color slot (1-4) from an `&HAABBGGRR` style field
    ///
    /// # Errors
    ///
    /// Returns `MotionError::InvalidColor` if the field is not a hex color.
    pub fn set_colour_field(&mut self, slot: usize, field: &str) -> Result<()> {
        let (color, alpha) = parse_style_colour(field)?;
        match slot {
            1 => self.primary_colour = color,
            2 => self.secondary_colour = color,
            3 => self.outline_colour = color,
            _ => self.back_colour = color,
        }
        self.alphas[slot.clamp(1, 4) - 1] = alpha;
        Ok(())
    }

    /// Color for a slot in `\1c`–`\4c` numbering
    #[must_use]
    pub const fn colour(&self, slot: usize) -> Color {
        match slot {
            1 => self.primary_colour,
            2 => self.secondary_colour,
            3 => self.outline_colour,
            _ => self.back_colour,
        }
    }

    /// Alpha for a slot in `\1a`–`\4a` numbering
    #[must_use]
    pub fn alpha(&self, slot: usize) -> u8 {
        self.alphas[slot.clamp(1, 4) - 1]
    }
}

/// Resolves style names to style records
pub trait StyleLookup {
    /// Look a style up by name, `None` if the script has no such style
    fn style(&self, name: &str) -> Option<&Style>;
}

impl StyleLookup for [Style] {
    fn style(&self, name: &str) -> Option<&Style> {
        self.iter().find(|style| style.name == name)
    }
}

impl StyleLookup for Vec<Style> {
    fn style(&self, name: &str) -> Option<&Style> {
        self.as_slice().style(name)
    }
}

impl<S: BuildHasher> StyleLookup for HashMap<String, Style, S> {
    fn style(&self, name: &str) -> Option<&Style> {
        self.get(name)
    }
}

impl StyleLookup for AHashMap<String, Style> {
    fn style(&self, name: &str) -> Option<&Style> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_fields() {
        let mut style = Style::default();
        style.set_colour_field(3, "&H8000FF00").unwrap();
        assert_eq!(style.colour(3), Color::new(0, 255, 0));
        assert_eq!(style.alpha(3), 0x80);
        assert!(style.set_colour_field(1, "nope").is_err());
    }

    #[test]
    fn lookup_by_name() {
        let styles = vec![
            Style::default(),
            Style {
                name: "Sign".to_string(),
                angle: 15.0,
                ..Style::default()
            },
        ];
        assert_eq!(styles.style("Sign").map(|s| s.angle), Some(15.0));
        assert!(styles.style("Missing").is_none());

        let mut map = AHashMap::new();
        map.insert("Default".to_string(), Style::default());
        assert!(map.style("Default").is_some());
    }
}
