//! Static table of the override tags the motion engine understands
//!
//! The registry is built once per process and never mutated. Each entry knows
//! how to find its tag inside override text (a compiled pattern with `tag`
//! and `value` capture groups), what type of value it carries, how it behaves
//! under deduplication and which style field supplies its default.
//!
//! # Flags
//!
//! - `GLOBAL` tags apply to the whole line and survive deduplication once
//!   (`\pos`, `\an`, `\clip`, ...)
//! - `REPEATABLE` tags may be given many times; the last one in a block wins
//! - `TRANSFORMABLE` tags may appear inside `\t(...)`
//!
//! # Example
//!
//! ```rust
//! use ass_motion::tags::{registry, TagId};
//!
//! let pos = registry().def(TagId::Pos);
//! let found = pos.find_all(r"{\an7\pos(10,20)}Text");
//! assert_eq!(found[0].value, "10,20");
//! assert_eq!(pos.emit("1,2"), r"\pos(1,2)");
//! ```

use std::ops::Range;
use std::sync::OnceLock;

use ahash::AHashMap;
use regex::Regex;

use super::value::{TagKind, TagValue};
use crate::script::Style;

/// Number as written inside override tags
pub(crate) const NUM: &str = r"-?(?:\d+(?:\.\d*)?|\.\d+)";

bitflags::bitflags! {
    /// Deduplication and animation behaviour of a tag
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TagFlags: u8 {
        /// One instance per line, first occurrence wins
        const GLOBAL = 1 << 0;
        /// Last occurrence within a block wins
        const REPEATABLE = 1 << 1;
        /// Legal inside `\t(...)`
        const TRANSFORMABLE = 1 << 2;
    }
}

/// Style field a tag falls back to when the line does not set it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleField {
    ScaleX,
    ScaleY,
    Angle,
    Outline,
    Shadow,
    FontSize,
    Spacing,
    Alignment,
    /// Color slot 1-4
    Colour(u8),
    /// Alpha slot 1-4
    Alpha(u8),
}

impl StyleField {
    /// Read this field from a style
    #[must_use]
    pub fn read(self, style: &Style) -> TagValue {
        match self {
            Self::ScaleX => TagValue::Number(style.scale_x),
            Self::ScaleY => TagValue::Number(style.scale_y),
            Self::Angle => TagValue::Number(style.angle),
            Self::Outline => TagValue::Number(style.outline),
            Self::Shadow => TagValue::Number(style.shadow),
            Self::FontSize => TagValue::Number(style.font_size),
            Self::Spacing => TagValue::Number(style.spacing),
            Self::Alignment => TagValue::Number(f64::from(style.alignment)),
            Self::Colour(slot) => TagValue::Color(style.colour(usize::from(slot))),
            Self::Alpha(slot) => TagValue::Alpha(style.alpha(usize::from(slot))),
        }
    }
}

/// Identifier of every registered tag
///
/// The discriminant doubles as the index into the registry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagId {
    Fscx,
    Fscy,
    Align,
    Frz,
    Frx,
    Fry,
    Z,
    Bord,
    Xbord,
    Ybord,
    Shad,
    Xshad,
    Yshad,
    Blur,
    Be,
    Fs,
    Fsp,
    Fax,
    Fay,
    Color1,
    Color2,
    Color3,
    Color4,
    Alpha,
    Alpha1,
    Alpha2,
    Alpha3,
    Alpha4,
    Pos,
    Org,
    Move,
    Fade,
    Fad,
    RectClip,
    RectIclip,
    VectClip,
    VectIclip,
    Transform,
    Karaoke,
    KaraokeFill,
    KaraokeOutline,
    Reset,
}

impl TagId {
    /// Every tag in registry order
    pub const ALL: [Self; 42] = [
        Self::Fscx,
        Self::Fscy,
        Self::Align,
        Self::Frz,
        Self::Frx,
        Self::Fry,
        Self::Z,
        Self::Bord,
        Self::Xbord,
        Self::Ybord,
        Self::Shad,
        Self::Xshad,
        Self::Yshad,
        Self::Blur,
        Self::Be,
        Self::Fs,
        Self::Fsp,
        Self::Fax,
        Self::Fay,
        Self::Color1,
        Self::Color2,
        Self::Color3,
        Self::Color4,
        Self::Alpha,
        Self::Alpha1,
        Self::Alpha2,
        Self::Alpha3,
        Self::Alpha4,
        Self::Pos,
        Self::Org,
        Self::Move,
        Self::Fade,
        Self::Fad,
        Self::RectClip,
        Self::RectIclip,
        Self::VectClip,
        Self::VectIclip,
        Self::Transform,
        Self::Karaoke,
        Self::KaraokeFill,
        Self::KaraokeOutline,
        Self::Reset,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Pairs where only the first occurring member of the line is kept
///
/// A line holds one clip, so every pair of clip forms conflicts.
pub const CONFLICTING_PAIRS: [(TagId, TagId); 8] = [
    (TagId::Move, TagId::Pos),
    (TagId::Fade, TagId::Fad),
    (TagId::RectClip, TagId::RectIclip),
    (TagId::VectClip, TagId::VectIclip),
    (TagId::RectClip, TagId::VectClip),
    (TagId::RectIclip, TagId::VectIclip),
    (TagId::RectClip, TagId::VectIclip),
    (TagId::RectIclip, TagId::VectClip),
];

/// VSFilterMod tags sharing the `\r` prefix
const RESET_EXTENSIONS: [&str; 5] = ["ndx", "ndy", "ndz", "nds", "nd"];

/// One tag occurrence found in override text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMatch<'t> {
    /// Byte offset of the leading backslash
    pub start: usize,
    /// Byte offset one past the end of the tag
    pub end: usize,
    /// Captured value text
    pub value: &'t str,
}

impl TagMatch<'_> {
    /// Byte range of the whole tag
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Definition of a single override tag
#[derive(Debug)]
pub struct TagDef {
    pub id: TagId,
    /// Registry name (`"fscx"`, `"rectClip"`, ...)
    pub name: &'static str,
    /// Spelling used when emitting the tag
    pub spelling: &'static str,
    pub kind: TagKind,
    pub flags: TagFlags,
    /// Tags that override this one when they occur later in the same block
    pub affected_by: &'static [TagId],
    pub style_field: Option<StyleField>,
    parens: bool,
    pattern: Regex,
}

impl TagDef {
    /// Compiled pattern with `tag` and `value` groups
    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }

    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.flags.contains(TagFlags::GLOBAL)
    }

    #[must_use]
    pub const fn is_repeatable(&self) -> bool {
        self.flags.contains(TagFlags::REPEATABLE)
    }

    #[must_use]
    pub const fn is_transformable(&self) -> bool {
        self.flags.contains(TagFlags::TRANSFORMABLE)
    }

    /// Render the tag with the given value text
    #[must_use]
    pub fn emit(&self, value: &str) -> String {
        if self.parens {
            format!("{}({value})", self.spelling)
        } else {
            format!("{}{value}", self.spelling)
        }
    }

    /// Render the tag with a typed value
    #[must_use]
    pub fn emit_value(&self, value: &TagValue, places: u32) -> String {
        self.emit(&value.format(places))
    }

    /// All occurrences of this tag in `text`, in order
    #[must_use]
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<TagMatch<'t>> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let value = caps.name("value").map_or("", |m| m.as_str());
                if self.id == TagId::Reset && is_reset_extension(value) {
                    return None;
                }
                Some(TagMatch {
                    start: whole.start(),
                    end: whole.end(),
                    value,
                })
            })
            .collect()
    }

    /// First occurrence of this tag in `text`
    #[must_use]
    pub fn find_first<'t>(&self, text: &'t str) -> Option<TagMatch<'t>> {
        self.find_all(text).into_iter().next()
    }

    /// Whether `text` contains this tag
    #[must_use]
    pub fn occurs_in(&self, text: &str) -> bool {
        self.find_first(text).is_some()
    }

    /// Parse a captured value as this tag's kind
    #[must_use]
    pub fn parse_value(&self, raw: &str) -> Option<TagValue> {
        TagValue::parse(self.kind, raw)
    }

    /// Default value taken from a style, or the kind's zero
    ///
    /// Kinds without a meaningful zero (clips, text) have no default.
    #[must_use]
    pub fn style_default(&self, style: &Style) -> Option<TagValue> {
        if let Some(field) = self.style_field {
            return Some(field.read(style));
        }
        match self.kind {
            TagKind::Number => Some(TagValue::Number(0.0)),
            TagKind::Alpha => Some(TagValue::Alpha(0)),
            TagKind::Color | TagKind::Multi | TagKind::Text | TagKind::Transform => None,
        }
    }
}

/// `\rnd`-family tags are not style resets
fn is_reset_extension(value: &str) -> bool {
    RESET_EXTENSIONS.iter().any(|prefix| {
        value.strip_prefix(prefix).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        })
    })
}

/// Process-wide tag table
#[derive(Debug)]
pub struct TagRegistry {
    defs: Vec<TagDef>,
    by_name: AHashMap<&'static str, TagId>,
}

impl TagRegistry {
    fn build() -> Self {
        let defs: Vec<TagDef> = TagId::ALL.iter().map(|&id| definition(id)).collect();
        let by_name = defs.iter().map(|def| (def.name, def.id)).collect();
        Self { defs, by_name }
    }

    /// Definition for a tag id
    #[must_use]
    pub fn def(&self, id: TagId) -> &TagDef {
        &self.defs[id.index()]
    }

    /// Look a definition up by registry name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TagDef> {
        self.by_name.get(name).map(|id| self.def(*id))
    }

    /// All definitions in registry order
    pub fn iter(&self) -> impl Iterator<Item = &TagDef> {
        self.defs.iter()
    }

    /// Tags legal inside `\t(...)`
    pub fn transformable(&self) -> impl Iterator<Item = &TagDef> {
        self.defs.iter().filter(|def| def.is_transformable())
    }

    /// Tags kept once per line
    pub fn globals(&self) -> impl Iterator<Item = &TagDef> {
        self.defs.iter().filter(|def| def.is_global())
    }

    /// Tags kept once per block
    pub fn repeatables(&self) -> impl Iterator<Item = &TagDef> {
        self.defs.iter().filter(|def| def.is_repeatable())
    }
}

/// Shared registry, built on first use
pub fn registry() -> &'static TagRegistry {
    static REGISTRY: OnceLock<TagRegistry> = OnceLock::new();
    REGISTRY.get_or_init(TagRegistry::build)
}

/// Shorthand for `registry().def(id)`
#[must_use]
pub fn tag(id: TagId) -> &'static TagDef {
    registry().def(id)
}

pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in tag pattern must compile")
}

fn simple(name: &str) -> String {
    format!(r"(?P<tag>\\{name})(?P<value>{NUM})")
}

fn numbers(name: &str, count: usize) -> String {
    let list = vec![NUM; count].join(r"\s*,\s*");
    format!(r"(?P<tag>\\{name})\(\s*(?P<value>{list})\s*\)")
}

fn hex(name: &str) -> String {
    format!(r"(?P<tag>\\{name})(?P<value>&[Hh][0-9A-Fa-f]+&?)")
}

fn vector(name: &str) -> String {
    format!(r"(?P<tag>\\{name})\(\s*(?P<value>(?:(?:\d+\s*,\s*)?[mnlbspc][^)]*)?)\)")
}

fn definition(id: TagId) -> TagDef {
    use StyleField as F;
    use TagFlags as Fl;
    use TagKind as K;

    let repeat_anim = Fl::REPEATABLE | Fl::TRANSFORMABLE;

    let (name, spelling, kind, flags, affected_by, style_field, parens, pattern): (
        &'static str,
        &'static str,
        TagKind,
        TagFlags,
        &'static [TagId],
        Option<StyleField>,
        bool,
        String,
    ) = match id {
        TagId::Fscx => ("fscx", r"\fscx", K::Number, repeat_anim, &[], Some(F::ScaleX), false, simple("fscx")),
        TagId::Fscy => ("fscy", r"\fscy", K::Number, repeat_anim, &[], Some(F::ScaleY), false, simple("fscy")),
        TagId::Align => (
            "an",
            r"\an",
            K::Number,
            Fl::GLOBAL,
            &[],
            Some(F::Alignment),
            false,
            String::from(r"(?P<tag>\\an)(?P<value>[1-9])"),
        ),
        TagId::Frz => ("frz", r"\frz", K::Number, repeat_anim, &[], Some(F::Angle), false, simple("frz?")),
        TagId::Frx => ("frx", r"\frx", K::Number, repeat_anim, &[], None, false, simple("frx")),
        TagId::Fry => ("fry", r"\fry", K::Number, repeat_anim, &[], None, false, simple("fry")),
        TagId::Z => ("z", r"\z", K::Number, Fl::REPEATABLE, &[], None, false, simple("z")),
        TagId::Bord => ("bord", r"\bord", K::Number, repeat_anim, &[], Some(F::Outline), false, simple("bord")),
        TagId::Xbord => (
            "xbord",
            r"\xbord",
            K::Number,
            repeat_anim,
            &[TagId::Bord],
            Some(F::Outline),
            false,
            simple("xbord"),
        ),
        TagId::Ybord => (
            "ybord",
            r"\ybord",
            K::Number,
            repeat_anim,
            &[TagId::Bord],
            Some(F::Outline),
            false,
            simple("ybord"),
        ),
        TagId::Shad => ("shad", r"\shad", K::Number, repeat_anim, &[], Some(F::Shadow), false, simple("shad")),
        TagId::Xshad => (
            "xshad",
            r"\xshad",
            K::Number,
            repeat_anim,
            &[TagId::Shad],
            Some(F::Shadow),
            false,
            simple("xshad"),
        ),
        TagId::Yshad => (
            "yshad",
            r"\yshad",
            K::Number,
            repeat_anim,
            &[TagId::Shad],
            Some(F::Shadow),
            false,
            simple("yshad"),
        ),
        TagId::Blur => ("blur", r"\blur", K::Number, repeat_anim, &[], None, false, simple("blur")),
        TagId::Be => ("be", r"\be", K::Number, repeat_anim, &[], None, false, simple("be")),
        TagId::Fs => ("fs", r"\fs", K::Number, repeat_anim, &[], Some(F::FontSize), false, simple("fs")),
        TagId::Fsp => ("fsp", r"\fsp", K::Number, repeat_anim, &[], Some(F::Spacing), false, simple("fsp")),
        TagId::Fax => ("fax", r"\fax", K::Number, repeat_anim, &[], None, false, simple("fax")),
        TagId::Fay => ("fay", r"\fay", K::Number, repeat_anim, &[], None, false, simple("fay")),
        TagId::Color1 => ("1c", r"\1c", K::Color, repeat_anim, &[], Some(F::Colour(1)), false, hex("1?c")),
        TagId::Color2 => ("2c", r"\2c", K::Color, repeat_anim, &[], Some(F::Colour(2)), false, hex("2c")),
        TagId::Color3 => ("3c", r"\3c", K::Color, repeat_anim, &[], Some(F::Colour(3)), false, hex("3c")),
        TagId::Color4 => ("4c", r"\4c", K::Color, repeat_anim, &[], Some(F::Colour(4)), false, hex("4c")),
        TagId::Alpha => ("alpha", r"\alpha", K::Alpha, repeat_anim, &[], Some(F::Alpha(1)), false, hex("alpha")),
        TagId::Alpha1 => (
            "1a",
            r"\1a",
            K::Alpha,
            repeat_anim,
            &[TagId::Alpha],
            Some(F::Alpha(1)),
            false,
            hex("1a"),
        ),
        TagId::Alpha2 => (
            "2a",
            r"\2a",
            K::Alpha,
            repeat_anim,
            &[TagId::Alpha],
            Some(F::Alpha(2)),
            false,
            hex("2a"),
        ),
        TagId::Alpha3 => (
            "3a",
            r"\3a",
            K::Alpha,
            repeat_anim,
            &[TagId::Alpha],
            Some(F::Alpha(3)),
            false,
            hex("3a"),
        ),
        TagId::Alpha4 => (
            "4a",
            r"\4a",
            K::Alpha,
            repeat_anim,
            &[TagId::Alpha],
            Some(F::Alpha(4)),
            false,
            hex("4a"),
        ),
        TagId::Pos => ("pos", r"\pos", K::Multi, Fl::GLOBAL, &[], None, true, numbers("pos", 2)),
        TagId::Org => ("org", r"\org", K::Multi, Fl::GLOBAL, &[], None, true, numbers("org", 2)),
        TagId::Move => {
            let four = vec![NUM; 4].join(r"\s*,\s*");
            let pattern = format!(
                r"(?P<tag>\\move)\(\s*(?P<value>{four}(?:\s*,\s*{NUM}\s*,\s*{NUM})?)\s*\)"
            );
            ("move", r"\move", K::Multi, Fl::GLOBAL, &[], None, true, pattern)
        }
        TagId::Fade => ("fade", r"\fade", K::Multi, Fl::GLOBAL, &[], None, true, numbers("fade", 7)),
        TagId::Fad => ("fad", r"\fad", K::Multi, Fl::GLOBAL, &[], None, true, numbers("fad", 2)),
        TagId::RectClip => (
            "rectClip",
            r"\clip",
            K::Multi,
            Fl::GLOBAL | Fl::TRANSFORMABLE,
            &[],
            None,
            true,
            numbers("clip", 4),
        ),
        TagId::RectIclip => (
            "rectIclip",
            r"\iclip",
            K::Multi,
            Fl::GLOBAL | Fl::TRANSFORMABLE,
            &[],
            None,
            true,
            numbers("iclip", 4),
        ),
        TagId::VectClip => ("vectClip", r"\clip", K::Text, Fl::GLOBAL, &[], None, true, vector("clip")),
        TagId::VectIclip => ("vectIclip", r"\iclip", K::Text, Fl::GLOBAL, &[], None, true, vector("iclip")),
        TagId::Transform => (
            "t",
            r"\t",
            K::Transform,
            Fl::empty(),
            &[],
            None,
            true,
            String::from(r"(?P<tag>\\t)\((?P<value>[^)]*)\)"),
        ),
        TagId::Karaoke => (
            "k",
            r"\k",
            K::Number,
            Fl::empty(),
            &[],
            None,
            false,
            String::from(r"(?P<tag>\\k)(?P<value>-?\d+)"),
        ),
        TagId::KaraokeFill => (
            "kf",
            r"\kf",
            K::Number,
            Fl::empty(),
            &[],
            None,
            false,
            String::from(r"(?P<tag>\\(?:kf|K))(?P<value>-?\d+)"),
        ),
        TagId::KaraokeOutline => (
            "ko",
            r"\ko",
            K::Number,
            Fl::empty(),
            &[],
            None,
            false,
            String::from(r"(?P<tag>\\ko)(?P<value>-?\d+)"),
        ),
        TagId::Reset => (
            "r",
            r"\r",
            K::Text,
            Fl::empty(),
            &[],
            None,
            false,
            String::from(r"(?P<tag>\\r)(?P<value>[^\\}\x{F0000}-\x{FFFFD}]*)"),
        ),
    };

    TagDef {
        id,
        name,
        spelling,
        kind,
        flags,
        affected_by,
        style_field,
        parens,
        pattern: compile(&pattern),
    }
}
