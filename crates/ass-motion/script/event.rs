//! Dialogue records exchanged with the document model
//!
//! A `Dialogue` is the plain value the caller hands in for every selected
//! subtitle line and receives back for every generated line. Times are in
//! milliseconds.

/// One subtitle event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dialogue {
    /// Layer for rendering order
    pub layer: i32,

    /// Start time in milliseconds
    pub start_time: i64,

    /// End time in milliseconds
    pub end_time: i64,

    /// Style name reference
    pub style: String,

    /// Actor/character name
    pub actor: String,

    /// Left margin override (0 = use style)
    pub margin_l: i32,

    /// Right margin override (0 = use style)
    pub margin_r: i32,

    /// Vertical margin override (0 = use style)
    pub margin_v: i32,

    /// Effect field
    pub effect: String,

    /// Text with override blocks
    pub text: String,

    /// Whether this is a comment line
    pub comment: bool,
}

impl Dialogue {
    /// Create a dialogue line with the given timing, style and text
    #[must_use]
    pub fn new(start_time: i64, end_time: i64, style: &str, text: &str) -> Self {
        Self {
            start_time,
            end_time,
            style: style.to_string(),
            text: text.to_string(),
            ..Self::default()
        }
    }

    /// Line duration in milliseconds
    #[must_use]
    pub const fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        let line = Dialogue::new(1000, 2500, "Default", "{\\an7}Hello");
        assert_eq!(line.duration(), 1500);
        assert_eq!(line.style, "Default");
        assert!(!line.comment);
        assert_eq!(line.layer, 0);
    }
}
