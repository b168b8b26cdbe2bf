//! Coordinate rewriting for ASS drawing commands
//!
//! Vector clips are drawings: command letters followed by coordinate pairs.
//! Rewriting keeps every command letter and maps each pair in order.

use std::sync::OnceLock;

use regex::Regex;

use crate::tags::registry::{compile, NUM};
use crate::utils::format_number;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| compile(&format!(r"[A-Za-z]|{NUM}")))
}

/// Map every coordinate pair of `drawing` through `map`
///
/// Output tokens are space separated and numbers rounded to `places`. A
/// trailing unpaired number is kept as is.
pub fn map_drawing<F>(drawing: &str, places: u32, mut map: F) -> String
where
    F: FnMut(f64, f64) -> (f64, f64),
{
    let mut tokens: Vec<String> = Vec::new();
    let mut pending: Option<f64> = None;

    for token in token_pattern().find_iter(drawing) {
        let text = token.as_str();
        match text.parse::<f64>() {
            Ok(value) => match pending.take() {
                Some(x) => {
                    let (x, y) = map(x, value);
                    tokens.push(format_number(x, places));
                    tokens.push(format_number(y, places));
                }
                None => pending = Some(value),
            },
            Err(_) => {
                if let Some(x) = pending.take() {
                    tokens.push(format_number(x, places));
                }
                tokens.push(text.to_string());
            }
        }
    }
    if let Some(x) = pending {
        tokens.push(format_number(x, places));
    }
    tokens.join(" ")
}

/// Vector form of a rectangular clip
#[must_use]
pub fn rect_to_drawing(x1: f64, y1: f64, x2: f64, y2: f64, places: u32) -> String {
    let n = |v: f64| format_number(v, places);
    format!(
        "m {} {} l {} {} {} {} {} {}",
        n(x1),
        n(y1),
        n(x2),
        n(y1),
        n(x2),
        n(y2),
        n(x1),
        n(y2)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_pairs_and_keeps_commands() {
        let out = map_drawing("m 0 0 l 10 0 10 10", 2, |x, y| (x + 1.0, y * 2.0));
        assert_eq!(out, "m 1 0 l 11 0 11 20");
    }

    #[test]
    fn compact_drawings() {
        let out = map_drawing("m0,0l5.5,-2", 1, |x, y| (x, y));
        assert_eq!(out, "m 0 0 l 5.5 -2");
    }

    #[test]
    fn rectangle_as_drawing() {
        assert_eq!(
            rect_to_drawing(0.0, 0.0, 100.0, 50.0, 2),
            "m 0 0 l 100 0 100 50 0 50"
        );
    }
}
