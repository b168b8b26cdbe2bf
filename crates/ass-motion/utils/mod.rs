//! Shared utilities: math helpers, ASS color codecs and the crate error type

pub mod color;
pub mod errors;
pub mod math;

pub use color::{format_alpha, interpolate_alpha, parse_alpha, parse_style_colour, Color};
pub use errors::{MotionError, Result};
pub use math::{clamp, datan2, dcos, dsin, floor_to, format_number, lerp, round_to};
