//! Typed override tag values
//!
//! Every value the engine reads out of an override tag is parsed into a
//! [`TagValue`] according to the owning tag's [`TagKind`]. Values interpolate
//! per kind: numbers linearly, colors per component, alpha per byte and
//! multi-value tags per coordinate.

use smallvec::SmallVec;

use crate::utils::{format_alpha, format_number, interpolate_alpha, lerp, parse_alpha, Color};

/// Value type carried by an override tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// Single number (`\fscx120`)
    Number,
    /// Free text (`\rStyleName`, vector clip drawings)
    Text,
    /// Alpha byte (`\alpha&H80&`)
    Alpha,
    /// BGR color (`\1c&HFFFFFF&`)
    Color,
    /// Comma separated numbers (`\pos(1,2)`, `\clip(0,0,10,10)`)
    Multi,
    /// Nested `\t(...)` animation
    Transform,
}

/// Parsed tag value
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Number(f64),
    Text(String),
    Alpha(u8),
    Color(Color),
    Multi(SmallVec<[f64; 4]>),
}

impl TagValue {
    /// Parse raw tag text as the given kind
    ///
    /// Returns `None` when the text does not fit the kind. Callers treat that
    /// as "leave the tag alone".
    #[must_use]
    pub fn parse(kind: TagKind, raw: &str) -> Option<Self> {
        match kind {
            TagKind::Number => raw.trim().parse::<f64>().ok().map(Self::Number),
            TagKind::Alpha => parse_alpha(raw).ok().map(Self::Alpha),
            TagKind::Color => Color::parse(raw).ok().map(Self::Color),
            TagKind::Multi => parse_numbers(raw).map(Self::Multi),
            TagKind::Text | TagKind::Transform => Some(Self::Text(raw.to_string())),
        }
    }

    /// Format as tag value text, numbers rounded to `places` decimals
    #[must_use]
    pub fn format(&self, places: u32) -> String {
        match self {
            Self::Number(value) => format_number(*value, places),
            Self::Text(text) => text.clone(),
            Self::Alpha(alpha) => format_alpha(*alpha),
            Self::Color(color) => color.to_ass(),
            Self::Multi(values) => values
                .iter()
                .map(|value| format_number(*value, places))
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Interpolate towards `to` at `progress` in `[0, 1]`
    ///
    /// Values of different kinds, or multi-values of different arity, snap
    /// to `to` once progress reaches 1 and hold `self` before that.
    #[must_use]
    pub fn interpolate(&self, to: &Self, progress: f64) -> Self {
        match (self, to) {
            (Self::Number(from), Self::Number(target)) => {
                Self::Number(lerp(*from, *target, progress))
            }
            (Self::Alpha(from), Self::Alpha(target)) => {
                Self::Alpha(interpolate_alpha(*from, *target, progress))
            }
            (Self::Color(from), Self::Color(target)) => {
                Self::Color(from.interpolate(*target, progress))
            }
            (Self::Multi(from), Self::Multi(target)) if from.len() == target.len() => Self::Multi(
                from.iter()
                    .zip(target.iter())
                    .map(|(a, b)| lerp(*a, *b, progress))
                    .collect(),
            ),
            _ if progress >= 1.0 => to.clone(),
            _ => self.clone(),
        }
    }

    /// Numeric value, if this is a number
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// Parse a comma separated list of numbers
pub(crate) fn parse_numbers(raw: &str) -> Option<SmallVec<[f64; 4]>> {
    raw.split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn parse_by_kind() {
        assert_eq!(
            TagValue::parse(TagKind::Number, "120.5"),
            Some(TagValue::Number(120.5))
        );
        assert_eq!(TagValue::parse(TagKind::Number, "abc"), None);
        assert_eq!(
            TagValue::parse(TagKind::Alpha, "&H80&"),
            Some(TagValue::Alpha(0x80))
        );
        assert_eq!(
            TagValue::parse(TagKind::Multi, "1, 2.5,3"),
            Some(TagValue::Multi(smallvec![1.0, 2.5, 3.0]))
        );
        assert_eq!(TagValue::parse(TagKind::Multi, "1,x"), None);
    }

    #[test]
    fn format_values() {
        assert_eq!(TagValue::Number(100.0).format(2), "100");
        assert_eq!(TagValue::Alpha(255).format(2), "&HFF&");
        assert_eq!(
            TagValue::Multi(smallvec![1.234, 5.0]).format(1),
            "1.2,5"
        );
        assert_eq!(
            TagValue::Color(Color::new(255, 0, 0)).format(0),
            "&H0000FF&"
        );
    }

    #[test]
    fn interpolate_same_kind() {
        let from = TagValue::Number(100.0);
        let to = TagValue::Number(200.0);
        assert_eq!(from.interpolate(&to, 0.25), TagValue::Number(125.0));

        let from = TagValue::Multi(smallvec![0.0, 0.0, 10.0, 10.0]);
        let to = TagValue::Multi(smallvec![10.0, 10.0, 20.0, 30.0]);
        assert_eq!(
            from.interpolate(&to, 0.5),
            TagValue::Multi(smallvec![5.0, 5.0, 15.0, 20.0])
        );

        let from = TagValue::Alpha(0);
        let to = TagValue::Alpha(0xFF);
        assert_eq!(from.interpolate(&to, 0.5), TagValue::Alpha(128));
    }

    #[test]
    fn interpolate_mismatched_kinds_snaps() {
        let from = TagValue::Number(1.0);
        let to = TagValue::Text("x".to_string());
        assert_eq!(from.interpolate(&to, 0.5), from);
        assert_eq!(from.interpolate(&to, 1.0), to);
    }
}
