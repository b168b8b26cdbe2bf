//! Per-line working record and the text passes that run on it
//!
//! A [`MotionLine`] is a mutable copy of one dialogue event for the duration
//! of an apply operation. The free functions in this module operate on raw
//! line text and are what the methods delegate to:
//!
//! - [`deduplicate_tags`] - one instance of each global tag per line, the last
//!   repeatable tag per block, empty blocks and clips removed
//! - [`shift_karaoke`] - drop or shorten syllables that already elapsed
//! - [`default_position`] - where libass puts an unpositioned line
//!
//! Only text inside `{...}` override blocks is treated as tags.

use std::ops::Range;
use std::sync::OnceLock;

use ahash::AHashMap;
use regex::Regex;

use super::drawing::{map_drawing, rect_to_drawing};
use super::transform::{self, PriorState, Transform};
use crate::script::{Dialogue, FrameTimes, Style};
use crate::tags::registry::compile;
use crate::tags::{registry, tag, TagDef, TagId, TagMatch, TagValue, CONFLICTING_PAIRS};
use crate::utils::{clamp, format_alpha, format_number, lerp, round_to};

/// Stands in for an empty block that was present before deduplication
const EMPTY_BLOCK: &str = "\u{1}";

fn empty_clip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| compile(r"\\i?clip\(\s*\)"))
}

fn legacy_align_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| compile(r"\\a(\d+)"))
}

/// Byte spans of every `{...}` block, braces included
#[must_use]
pub fn block_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut open = None;
    for (i, c) in text.char_indices() {
        match c {
            '{' => open = Some(i),
            '}' => {
                if let Some(start) = open.take() {
                    spans.push(start..i + 1);
                }
            }
            _ => {}
        }
    }
    spans
}

/// Occurrences of a tag that sit inside override blocks
#[must_use]
pub fn find_in_blocks<'t>(def: &TagDef, text: &'t str) -> Vec<TagMatch<'t>> {
    let spans = block_spans(text);
    def.find_all(text)
        .into_iter()
        .filter(|m| spans.iter().any(|span| span.start < m.start && m.end < span.end))
        .collect()
}

/// Replace byte ranges of `text`, ranges sorted and non-overlapping
pub(crate) fn splice(text: &str, edits: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (range, replacement) in edits {
        if range.start < last {
            continue;
        }
        out.push_str(&text[last..range.start]);
        out.push_str(replacement);
        last = range.end;
    }
    out.push_str(&text[last..]);
    out
}

fn remove(text: &str, matches: &[TagMatch<'_>]) -> String {
    let mut edits: Vec<(Range<usize>, String)> =
        matches.iter().map(|m| (m.range(), String::new())).collect();
    edits.sort_by_key(|(range, _)| range.start);
    splice(text, &edits)
}

/// Remove redundant tags
///
/// Adjacent blocks are merged first. Then, for each conflicting pair, the
/// member that occurs later loses entirely; each global tag keeps its first
/// occurrence; each repeatable tag keeps its last occurrence per block.
/// Blocks and `\clip()` left empty are dropped while blocks that were empty
/// on input are kept in place. Running it twice gives the same text.
#[must_use]
pub fn deduplicate_tags(text: &str) -> String {
    let mut text = text.replace("{}", EMPTY_BLOCK).replace("}{", "");

    // Empty placeholders such as `\clip()` never win a conflict.
    let first_set = |id: TagId, text: &str| {
        find_in_blocks(tag(id), text)
            .iter()
            .find(|m| !m.value.trim().is_empty())
            .map(|m| m.start)
    };
    for (a, b) in CONFLICTING_PAIRS {
        let first_a = first_set(a, &text);
        let first_b = first_set(b, &text);
        if let (Some(pa), Some(pb)) = (first_a, first_b) {
            let loser = if pa < pb { b } else { a };
            let found = find_in_blocks(tag(loser), &text);
            text = remove(&text, &found);
        }
    }

    for def in registry().globals() {
        let found = find_in_blocks(def, &text);
        if found.len() > 1 {
            text = remove(&text, &found[1..]);
        }
    }

    let mut edits = Vec::new();
    for span in block_spans(&text) {
        let block = &text[span.clone()];
        let mut doomed: Vec<Range<usize>> = Vec::new();
        for def in registry().repeatables() {
            let found = def.find_all(block);
            if let Some((_, earlier)) = found.split_last() {
                doomed.extend(earlier.iter().map(|m| span.start + m.start..span.start + m.end));
            }
        }
        doomed.sort_by_key(|range| range.start);
        edits.extend(doomed.into_iter().map(|range| (range, String::new())));
    }
    text = splice(&text, &edits);

    let text = empty_clip_pattern().replace_all(&text, "");
    text.replace("{}", "").replace(EMPTY_BLOCK, "{}")
}

/// Remove every empty `{}` block
#[must_use]
pub fn strip_empty_blocks(text: &str) -> String {
    let mut text = text.to_string();
    while text.contains("{}") {
        text = text.replace("{}", "");
    }
    text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KaraokeKind {
    Plain,
    Fill,
    Outline,
}

/// Shift karaoke timing forward by `shift_cs` centiseconds
///
/// Syllables that fully elapsed lose their tag. The syllable in progress is
/// shortened; a `\kf` in progress keeps its full sweep behind a negative
/// `\k` so the fill continues where it was.
#[must_use]
pub fn shift_karaoke(text: &str, shift_cs: i64) -> String {
    if shift_cs <= 0 {
        return text.to_string();
    }

    let mut found: Vec<(TagMatch<'_>, KaraokeKind)> = Vec::new();
    for (id, kind) in [
        (TagId::Karaoke, KaraokeKind::Plain),
        (TagId::KaraokeFill, KaraokeKind::Fill),
        (TagId::KaraokeOutline, KaraokeKind::Outline),
    ] {
        found.extend(find_in_blocks(tag(id), text).into_iter().map(|m| (m, kind)));
    }
    found.sort_by_key(|(m, _)| m.start);

    let mut remaining = shift_cs;
    let mut edits = Vec::new();
    for (m, kind) in found {
        if remaining <= 0 {
            break;
        }
        let Ok(duration) = m.value.parse::<i64>() else {
            continue;
        };
        if duration <= remaining {
            edits.push((m.range(), String::new()));
            remaining -= duration;
            continue;
        }

        let replacement = match kind {
            KaraokeKind::Fill => format!(r"\k-{remaining}{}", &text[m.range()]),
            KaraokeKind::Plain => tag(TagId::Karaoke).emit(&(duration - remaining).to_string()),
            KaraokeKind::Outline => {
                tag(TagId::KaraokeOutline).emit(&(duration - remaining).to_string())
            }
        };
        edits.push((m.range(), replacement));
        remaining = 0;
    }
    splice(text, &edits)
}

/// Default position of a line without `\pos`
///
/// Columns come from `alignment % 3`, rows from `ceil(alignment / 3)`.
#[must_use]
pub fn default_position(
    alignment: u8,
    margins: (i32, i32, i32),
    res_x: f64,
    res_y: f64,
) -> (f64, f64) {
    let (margin_l, margin_r, margin_v) = (
        f64::from(margins.0),
        f64::from(margins.1),
        f64::from(margins.2),
    );
    let x = match alignment % 3 {
        1 => margin_l,
        2 => margin_l + (res_x - margin_l - margin_r) / 2.0,
        _ => res_x - margin_r,
    };
    let y = match alignment.div_ceil(3) {
        1 => res_y - margin_v,
        2 => res_y / 2.0,
        _ => margin_v,
    };
    (x, y)
}

/// Numpad alignment for a legacy `\a` value
#[must_use]
pub const fn legacy_alignment(value: u32) -> u8 {
    match value {
        1 => 1,
        2 => 2,
        3 => 3,
        5 => 7,
        6 => 8,
        7 => 9,
        9 => 4,
        10 => 5,
        11 => 6,
        _ => 2,
    }
}

/// Opacity of a seven-argument `\fade` at `time` ms
#[must_use]
pub fn fade_alpha(args: &[f64; 7], time: f64) -> f64 {
    let [a1, a2, a3, t1, t2, t3, t4] = *args;
    let ramp = |from: f64, to: f64, start: f64, end: f64| {
        if end <= start {
            to
        } else {
            lerp(from, to, clamp((time - start) / (end - start), 0.0, 1.0))
        }
    };
    if time < t1 {
        a1
    } else if time < t2 {
        ramp(a1, a2, t1, t2)
    } else if time < t3 {
        a2
    } else if time < t4 {
        ramp(a2, a3, t3, t4)
    } else {
        a3
    }
}

/// Parsed `\move` arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRecord {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub t1: Option<f64>,
    pub t2: Option<f64>,
}

impl MoveRecord {
    /// Parse the value of a `\move` tag
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let numbers = crate::tags::value::parse_numbers(value)?;
        match numbers.as_slice() {
            [x1, y1, x2, y2] => Some(Self {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
                t1: None,
                t2: None,
            }),
            [x1, y1, x2, y2, t1, t2] => Some(Self {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
                t1: Some(*t1),
                t2: Some(*t2),
            }),
            _ => None,
        }
    }

    /// Position at `time` ms into a line lasting `duration` ms
    #[must_use]
    pub fn position_at(&self, time: f64, duration: f64) -> (f64, f64) {
        let (t1, t2) = match (self.t1, self.t2) {
            (Some(t1), Some(t2)) if t1 != 0.0 || t2 != 0.0 => (t1, t2),
            _ => (0.0, duration),
        };
        let progress = if t2 <= t1 {
            if time >= t2 {
                1.0
            } else {
                0.0
            }
        } else {
            clamp((time - t1) / (t2 - t1), 0.0, 1.0)
        };
        (
            lerp(self.x1, self.x2, progress),
            lerp(self.y1, self.y2, progress),
        )
    }
}

/// Working copy of one dialogue event
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MotionLine {
    pub text: String,
    pub style: String,
    pub actor: String,
    pub effect: String,
    pub layer: i32,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub comment: bool,
    pub start_time: i64,
    pub end_time: i64,

    /// Numpad alignment in effect
    pub alignment: u8,
    /// Explicit or default position
    pub x_position: f64,
    pub y_position: f64,
    pub move_record: Option<MoveRecord>,

    /// Transforms lifted out of `text`
    pub transforms: Vec<Transform>,
    /// Style the line refers to
    pub style_record: Style,
    /// Style defaults of the transformable tags
    pub style_tag_defaults: AHashMap<TagId, TagValue>,

    pub was_linear: bool,
    pub transforms_tokenized: bool,
    pub has_org: bool,
    pub has_clip: bool,
    /// Time since the source line's start, in centiseconds
    pub karaoke_shift: i64,
    /// Shift for transform times on detokenize, in ms
    pub transform_shift: i64,
}

impl MotionLine {
    /// Working copy of a dialogue event
    #[must_use]
    pub fn from_dialogue(line: &Dialogue) -> Self {
        Self {
            text: line.text.clone(),
            style: line.style.clone(),
            actor: line.actor.clone(),
            effect: line.effect.clone(),
            layer: line.layer,
            margin_l: line.margin_l,
            margin_r: line.margin_r,
            margin_v: line.margin_v,
            comment: line.comment,
            start_time: line.start_time,
            end_time: line.end_time,
            alignment: 2,
            x_position: 0.0,
            y_position: 0.0,
            move_record: None,
            transforms: Vec::new(),
            style_record: Style::default(),
            style_tag_defaults: AHashMap::new(),
            was_linear: false,
            transforms_tokenized: false,
            has_org: false,
            has_clip: false,
            karaoke_shift: 0,
            transform_shift: 0,
        }
    }

    /// Dialogue event carrying this line's current state
    #[must_use]
    pub fn to_dialogue(&self) -> Dialogue {
        Dialogue {
            layer: self.layer,
            start_time: self.start_time,
            end_time: self.end_time,
            style: self.style.clone(),
            actor: self.actor.clone(),
            margin_l: self.margin_l,
            margin_r: self.margin_r,
            margin_v: self.margin_v,
            effect: self.effect.clone(),
            text: self.text.clone(),
            comment: self.comment,
        }
    }

    #[must_use]
    pub const fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }

    /// First and one-past-last video frame of the line
    pub fn frame_range<T: FrameTimes + ?Sized>(&self, timebase: &T) -> (i64, i64) {
        (
            timebase.frame_from_ms(self.start_time),
            timebase.frame_from_ms(self.end_time),
        )
    }

    /// Seed style defaults from the line's style
    pub fn set_style(&mut self, style: &Style) {
        self.style_record = style.clone();
        self.style_tag_defaults = registry()
            .transformable()
            .filter_map(|def| def.style_default(style).map(|value| (def.id, value)))
            .collect();
    }

    /// Lift `\t(...)` out of the text, re-lifting if already tokenized
    pub fn tokenize_transforms(&mut self) {
        if self.transforms_tokenized {
            self.text = transform::detokenize(&self.text, &self.transforms, 0, 0);
        }
        let (text, transforms) = transform::tokenize_transforms(&self.text, self.duration());
        self.text = text;
        self.transforms = transforms;
        self.transforms_tokenized = true;
    }

    /// Put transforms back, shifted by `shift` ms
    pub fn detokenize_transforms(&mut self, shift: i64, line_duration: i64) {
        self.text = transform::detokenize(&self.text, &self.transforms, shift, line_duration);
        self.transforms.clear();
        self.transforms_tokenized = false;
    }

    /// Replace transforms with their literal values at `time` ms
    pub fn interpolate_transforms(&mut self, time: f64, prior: &PriorState, places: u32) {
        self.text = transform::interpolate(&self.text, &self.transforms, time, prior, places);
        self.transforms.clear();
        self.transforms_tokenized = false;
    }

    /// Add a transform and return its slot character
    pub fn push_transform(&mut self, start: f64, end: f64, effect: &str) -> Option<char> {
        let index = self.transforms.len();
        let slot = transform::slot_char(index)?;
        self.transforms
            .push(Transform::new(index, start, end, 1.0, effect));
        self.transforms_tokenized = true;
        Some(slot)
    }

    /// Rewrite `\fad(in,out)` as the equivalent seven-argument `\fade`
    pub fn convert_fad_to_fade(&mut self) {
        let duration = self.duration() as f64;
        let edits: Vec<(Range<usize>, String)> = find_in_blocks(tag(TagId::Fad), &self.text)
            .into_iter()
            .filter_map(|m| {
                let numbers = crate::tags::value::parse_numbers(m.value)?;
                let [fade_in, fade_out] = numbers.as_slice() else {
                    return None;
                };
                let value = format!(
                    "255,0,255,0,{},{},{}",
                    format_number(*fade_in, 2),
                    format_number(duration - fade_out, 2),
                    format_number(duration, 2)
                );
                Some((m.range(), tag(TagId::Fade).emit(&value)))
            })
            .collect();
        self.text = splice(&self.text, &edits);
    }

    pub fn deduplicate_tags(&mut self) {
        self.text = deduplicate_tags(&self.text);
    }

    pub fn strip_empty_blocks(&mut self) {
        self.text = strip_empty_blocks(&self.text);
    }

    pub fn shift_karaoke(&mut self, shift_cs: i64) {
        self.text = shift_karaoke(&self.text, shift_cs);
    }

    /// Whether the tag occurs in any override block
    #[must_use]
    pub fn has_tag(&self, id: TagId) -> bool {
        !find_in_blocks(tag(id), &self.text).is_empty()
    }

    /// Contents of the leading override block, empty if there is none
    #[must_use]
    pub fn first_block(&self) -> &str {
        match block_spans(&self.text).first() {
            Some(span) if span.start == 0 => &self.text[1..span.end - 1],
            _ => "",
        }
    }

    /// Make sure the text starts with an override block
    pub fn ensure_leading_block(&mut self) {
        if !self.text.starts_with('{') || block_spans(&self.text).first().map(|s| s.start) != Some(0)
        {
            self.text.insert_str(0, "{}");
        }
    }

    /// Insert tags at the start of the leading block
    pub fn insert_into_first_block(&mut self, tags: &str) {
        if tags.is_empty() {
            return;
        }
        self.ensure_leading_block();
        self.text.insert_str(1, tags);
    }

    /// Find alignment and position, computing the default position if unset
    ///
    /// Returns whether the line already carried `\pos` or `\move`.
    pub fn extract_metrics(&mut self, res_x: f64, res_y: f64) -> bool {
        self.convert_legacy_alignment();
        self.alignment = find_in_blocks(tag(TagId::Align), &self.text)
            .first()
            .and_then(|m| m.value.parse().ok())
            .unwrap_or(self.style_record.alignment);

        if let Some((x, y)) = find_in_blocks(tag(TagId::Pos), &self.text)
            .first()
            .and_then(|m| pair(m.value))
        {
            self.x_position = x;
            self.y_position = y;
            return true;
        }

        if let Some(record) = find_in_blocks(tag(TagId::Move), &self.text)
            .first()
            .and_then(|m| MoveRecord::parse(m.value))
        {
            self.x_position = record.x1;
            self.y_position = record.y1;
            self.move_record = Some(record);
            return true;
        }

        let pick = |line: i32, style: i32| if line != 0 { line } else { style };
        let margins = (
            pick(self.margin_l, self.style_record.margin_l),
            pick(self.margin_r, self.style_record.margin_r),
            pick(self.margin_v, self.style_record.margin_v),
        );
        (self.x_position, self.y_position) = default_position(self.alignment, margins, res_x, res_y);
        false
    }

    fn convert_legacy_alignment(&mut self) {
        if self.has_tag(TagId::Align) {
            return;
        }
        let spans = block_spans(&self.text);
        let found = legacy_align_pattern().captures_iter(&self.text).find_map(|caps| {
            let whole = caps.get(0)?;
            let inside = spans
                .iter()
                .any(|span| span.start < whole.start() && whole.end() < span.end);
            let value: u32 = caps.get(1)?.as_str().parse().ok()?;
            inside.then_some((whole.range(), value))
        });
        if let Some((range, value)) = found {
            let replacement = tag(TagId::Align).emit(&legacy_alignment(value).to_string());
            self.text.replace_range(range, &replacement);
        }
    }

    /// Replace `\move` with the `\pos` it reaches at `time` ms
    pub fn move_to_pos(&mut self, time: f64, places: u32) {
        let duration = self.duration() as f64;
        let Some((range, record)) = find_in_blocks(tag(TagId::Move), &self.text)
            .first()
            .and_then(|m| MoveRecord::parse(m.value).map(|record| (m.range(), record)))
        else {
            return;
        };
        let (x, y) = record.position_at(time, duration);
        let value = format!("{},{}", format_number(x, places), format_number(y, places));
        self.text
            .replace_range(range, &tag(TagId::Pos).emit(&value));
        self.x_position = x;
        self.y_position = y;
        self.move_record = None;
    }

    /// Fade arguments of the first `\fade`
    #[must_use]
    pub fn fade_args(&self) -> Option<[f64; 7]> {
        let found = find_in_blocks(tag(TagId::Fade), &self.text);
        let numbers = crate::tags::value::parse_numbers(found.first()?.value)?;
        numbers.as_slice().try_into().ok()
    }

    /// Move every `\fade` time by `shift` ms
    pub fn shift_fade(&mut self, shift: i64) {
        let shift = shift as f64;
        let edits: Vec<(Range<usize>, String)> = find_in_blocks(tag(TagId::Fade), &self.text)
            .into_iter()
            .filter_map(|m| {
                let numbers = crate::tags::value::parse_numbers(m.value)?;
                let parts: Vec<String> = numbers
                    .iter()
                    .enumerate()
                    .map(|(i, v)| format_number(if i >= 3 { v + shift } else { *v }, 2))
                    .collect();
                Some((m.range(), tag(TagId::Fade).emit(&parts.join(","))))
            })
            .collect();
        self.text = splice(&self.text, &edits);
    }

    /// Evaluate the fade at `time` ms and fold it into the alpha tags
    ///
    /// Each alpha `a` becomes `a + f * (255 - a) / 255` where `f` is the fade
    /// opacity. Lines without alpha tags get a bare `\alpha`.
    pub fn fold_fade(&mut self, time: f64) {
        let Some(args) = self.fade_args() else {
            return;
        };
        let fade = clamp(fade_alpha(&args, time), 0.0, 255.0);
        let without_fade = remove(&self.text, &find_in_blocks(tag(TagId::Fade), &self.text));
        self.text = without_fade;

        const ALPHAS: [TagId; 5] = [
            TagId::Alpha,
            TagId::Alpha1,
            TagId::Alpha2,
            TagId::Alpha3,
            TagId::Alpha4,
        ];
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        for id in ALPHAS {
            let def = tag(id);
            for m in find_in_blocks(def, &self.text) {
                let Some(TagValue::Alpha(alpha)) = def.parse_value(m.value) else {
                    continue;
                };
                let a = f64::from(alpha);
                let folded = clamp(round_to(a + fade * (255.0 - a) / 255.0, 0), 0.0, 255.0);
                edits.push((m.range(), def.emit(&format_alpha(folded as u8))));
            }
        }

        if !edits.is_empty() {
            edits.sort_by_key(|(range, _)| range.start);
            self.text = splice(&self.text, &edits);
        }

        // The leading text takes the style alpha unless its own block sets one.
        let first = self.first_block();
        if !ALPHAS.iter().any(|id| tag(*id).occurs_in(first)) {
            let alpha = tag(TagId::Alpha).emit(&format_alpha(fade.round() as u8));
            self.insert_into_first_block(&alpha);
        }
    }

    /// Normalize clips for tracking
    ///
    /// Vector clips written with a scale factor (`\clip(2,m ...)`) are
    /// rewritten in plain coordinates. With `rect_to_vector`, rectangular
    /// clips become the equivalent vector clip.
    pub fn normalize_clips(&mut self, rect_to_vector: bool, places: u32) {
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        for id in [TagId::VectClip, TagId::VectIclip] {
            let def = tag(id);
            for m in find_in_blocks(def, &self.text) {
                let Some((scale, drawing)) = m.value.split_once(',') else {
                    continue;
                };
                let Ok(scale) = scale.trim().parse::<i32>() else {
                    continue;
                };
                let factor = 2f64.powi(scale.max(1) - 1);
                let plain = map_drawing(drawing, places, |x, y| (x / factor, y / factor));
                edits.push((m.range(), def.emit(&plain)));
            }
        }

        if rect_to_vector {
            for (rect, vect) in [
                (TagId::RectClip, TagId::VectClip),
                (TagId::RectIclip, TagId::VectIclip),
            ] {
                for m in find_in_blocks(tag(rect), &self.text) {
                    let Some(numbers) = crate::tags::value::parse_numbers(m.value) else {
                        continue;
                    };
                    if let [x1, y1, x2, y2] = numbers.as_slice() {
                        let drawing = rect_to_drawing(*x1, *y1, *x2, *y2, places);
                        edits.push((m.range(), tag(vect).emit(&drawing)));
                    }
                }
            }
        }

        edits.sort_by_key(|(range, _)| range.start);
        self.text = splice(&self.text, &edits);
        self.has_clip = self.has_any_clip();
    }

    /// Whether the line carries a non-empty clip of any form
    #[must_use]
    pub fn has_any_clip(&self) -> bool {
        [TagId::RectClip, TagId::RectIclip, TagId::VectClip, TagId::VectIclip]
            .into_iter()
            .any(|id| find_in_blocks(tag(id), &self.text).iter().any(|m| !m.value.trim().is_empty()))
    }

    /// Remove `\clip()` placeholders that were never filled
    pub fn strip_empty_clips(&mut self) {
        self.text = empty_clip_pattern().replace_all(&self.text, "").into_owned();
    }

    /// Tag state of every override block before any transform runs
    ///
    /// Each block starts from the previous block's state (the first from the
    /// style defaults) and takes the last value of every transformable tag in
    /// it. A tag listed in another tag's `affected_by` wins when it comes
    /// later in the block. `\r` restores the style defaults.
    #[must_use]
    pub fn collect_prior_inline_tags(&self) -> PriorState {
        let seed = &self.style_tag_defaults;
        let mut state = seed.clone();
        let mut blocks = Vec::new();

        for span in block_spans(&self.text) {
            let block = &self.text[span];
            let scope = match tag(TagId::Reset).find_all(block).last() {
                Some(reset) => {
                    state.clone_from(seed);
                    &block[reset.end..]
                }
                None => block,
            };

            let mut last: AHashMap<TagId, (usize, TagValue)> = AHashMap::new();
            for def in registry().transformable() {
                if let Some((m, value)) = def
                    .find_all(scope)
                    .last()
                    .and_then(|m| def.parse_value(m.value).map(|value| (*m, value)))
                {
                    last.insert(def.id, (m.start, value));
                }
            }

            for def in registry().transformable() {
                let mut winner = last.get(&def.id).cloned();
                for source in def.affected_by {
                    if let Some((at, value)) = last.get(source) {
                        if winner.as_ref().map_or(true, |(own, _)| at > own) {
                            winner = Some((*at, value.clone()));
                        }
                    }
                }
                if let Some((_, value)) = winner {
                    state.insert(def.id, value);
                }
            }
            blocks.push(state.clone());
        }
        blocks
    }
}

/// Parse an `x,y` pair
pub(crate) fn pair(value: &str) -> Option<(f64, f64)> {
    let numbers = crate::tags::value::parse_numbers(value)?;
    match numbers.as_slice() {
        [x, y] => Some((*x, *y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(text: &str) -> MotionLine {
        let mut line = MotionLine::from_dialogue(&Dialogue::new(0, 1000, "Default", text));
        line.set_style(&Style::default());
        line
    }

    #[test]
    fn dedup_globals_and_repeatables() {
        let text = r"{\pos(1,2)\fscx50\fscx60}{\pos(3,4)\fscx70}Hi{\an7\an8}";
        assert_eq!(deduplicate_tags(text), r"{\pos(1,2)\fscx70}Hi{\an7}");
    }

    #[test]
    fn dedup_conflicting_pairs() {
        assert_eq!(
            deduplicate_tags(r"{\move(0,0,1,1)\pos(5,5)}x"),
            r"{\move(0,0,1,1)}x"
        );
        assert_eq!(
            deduplicate_tags(r"{\fad(10,20)\fade(255,0,255,0,1,2,3)}x"),
            r"{\fad(10,20)}x"
        );
        assert_eq!(
            deduplicate_tags(r"{\iclip(0,0,1,1)\clip(0,0,2,2)}x"),
            r"{\iclip(0,0,1,1)}x"
        );
    }

    #[test]
    fn dedup_rect_and_vector_clips() {
        assert_eq!(
            deduplicate_tags(r"{\clip(0,0,1,1)\clip(m 0 0 l 1 1)}x"),
            r"{\clip(0,0,1,1)}x"
        );
        assert_eq!(
            deduplicate_tags(r"{\iclip(m 0 0 l 1 1)}a{\iclip(0,0,1,1)}b"),
            r"{\iclip(m 0 0 l 1 1)}ab"
        );
        assert_eq!(
            deduplicate_tags(r"{\clip(m 0 0 l 1 1)\iclip(0,0,1,1)}x"),
            r"{\clip(m 0 0 l 1 1)}x"
        );
        assert_eq!(
            deduplicate_tags(r"{\clip()\clip(0,0,1,1)}x"),
            r"{\clip(0,0,1,1)}x"
        );
    }

    #[test]
    fn dedup_keeps_original_empty_blocks() {
        assert_eq!(deduplicate_tags(r"a{}b{\clip()}c"), "a{}bc");
        let once = deduplicate_tags(r"{\pos(1,1)}{}{\pos(2,2)}");
        assert_eq!(once, r"{\pos(1,1)}{}");
        assert_eq!(deduplicate_tags(&once), once);
    }

    #[test]
    fn dedup_ignores_text_outside_blocks() {
        let text = r"{\pos(1,1)}\pos(2,2)";
        assert_eq!(deduplicate_tags(text), text);
    }

    #[test]
    fn karaoke_shift_shortens_and_drops() {
        assert_eq!(shift_karaoke(r"{\k50}a{\k30}b", 4), r"{\k46}a{\k30}b");
        assert_eq!(shift_karaoke(r"{\k50}a{\k30}b", 60), r"{}a{\k20}b");
        assert_eq!(shift_karaoke(r"{\k50}a{\k30}b", 80), r"{}a{}b");
        assert_eq!(shift_karaoke(r"{\kf50}a", 10), r"{\k-10\kf50}a");
        assert_eq!(shift_karaoke(r"{\ko50}a", 0), r"{\ko50}a");
    }

    #[test]
    fn default_positions() {
        let margins = (10, 20, 30);
        assert_eq!(default_position(1, margins, 640.0, 480.0), (10.0, 450.0));
        assert_eq!(default_position(2, margins, 640.0, 480.0), (315.0, 450.0));
        assert_eq!(default_position(6, margins, 640.0, 480.0), (620.0, 240.0));
        assert_eq!(default_position(7, margins, 640.0, 480.0), (10.0, 30.0));
    }

    #[test]
    fn metrics_from_tags_or_defaults() {
        let mut l = line(r"{\an7\pos(100,200)}x");
        assert!(l.extract_metrics(640.0, 480.0));
        assert_eq!((l.alignment, l.x_position, l.y_position), (7, 100.0, 200.0));

        let mut l = line(r"{\move(1,2,3,4)}x");
        assert!(l.extract_metrics(640.0, 480.0));
        assert!(l.move_record.is_some());

        let mut l = line("plain");
        l.margin_v = 40;
        assert!(!l.extract_metrics(640.0, 480.0));
        assert_eq!((l.x_position, l.y_position), (320.0, 440.0));

        let mut l = line(r"{\a6}x");
        l.extract_metrics(640.0, 480.0);
        assert_eq!(l.alignment, 8);
        assert_eq!(l.text, r"{\an8}x");
    }

    #[test]
    fn fad_becomes_fade() {
        let mut l = line(r"{\fad(100,200)}x");
        l.convert_fad_to_fade();
        assert_eq!(l.text, r"{\fade(255,0,255,0,100,800,1000)}x");
    }

    #[test]
    fn fade_folding() {
        let args = [255.0, 0.0, 255.0, 0.0, 100.0, 800.0, 1000.0];
        assert_eq!(fade_alpha(&args, 0.0), 255.0);
        assert_eq!(fade_alpha(&args, 50.0), 127.5);
        assert_eq!(fade_alpha(&args, 500.0), 0.0);
        assert_eq!(fade_alpha(&args, 1000.0), 255.0);

        let mut l = line(r"{\fade(255,0,255,0,100,800,1000)\1a&H00&\3a&H80&}x");
        l.fold_fade(50.0);
        assert_eq!(l.text, r"{\1a&H80&\3a&HC0&}x");

        let mut l = line(r"{\fade(255,0,255,0,100,800,1000)}x");
        l.fold_fade(0.0);
        assert_eq!(l.text, r"{\alpha&HFF&}x");

        let mut l = line(r"{\fade(255,0,255,0,100,800,1000)}a{\1a&H00&}b");
        l.fold_fade(0.0);
        assert_eq!(l.text, r"{\alpha&HFF&}a{\1a&HFF&}b");
    }

    #[test]
    fn fade_shift() {
        let mut l = line(r"{\fade(255,0,255,0,100,800,1000)}x");
        l.shift_fade(-40);
        assert_eq!(l.text, r"{\fade(255,0,255,-40,60,760,960)}x");
    }

    #[test]
    fn move_becomes_pos() {
        let mut l = line(r"{\move(0,0,100,50,0,500)}x");
        l.move_to_pos(250.0, 2);
        assert_eq!(l.text, r"{\pos(50,25)}x");

        let mut l = line(r"{\move(0,0,100,50)}x");
        l.move_to_pos(0.0, 2);
        assert_eq!(l.text, r"{\pos(0,0)}x");
    }

    #[test]
    fn clip_normalization() {
        let mut l = line(r"{\clip(2,m 0 0 l 20 0 20 20)}x");
        l.normalize_clips(false, 2);
        assert_eq!(l.text, r"{\clip(m 0 0 l 10 0 10 10)}x");
        assert!(l.has_clip);

        let mut l = line(r"{\iclip(0,0,10,20)}x");
        l.normalize_clips(true, 2);
        assert_eq!(l.text, r"{\iclip(m 0 0 l 10 0 10 20 0 20)}x");
    }

    #[test]
    fn leading_block_insertion() {
        let mut l = line("Hello{\\i1}there");
        l.insert_into_first_block(r"\pos(1,2)");
        assert_eq!(l.text, r"{\pos(1,2)}Hello{\i1}there");
        assert_eq!(l.first_block(), r"\pos(1,2)");

        let mut l = line(r"{\an5}x");
        l.insert_into_first_block(r"\fscx100");
        assert_eq!(l.text, r"{\fscx100\an5}x");
    }

    #[test]
    fn prior_state_precedence() {
        let mut style = Style::default();
        style.outline = 3.0;
        let mut l = line(r"{\xbord5\bord1}a{\fscx120}b{\bord2\xbord7}c{\r}d");
        l.set_style(&style);
        let prior = l.collect_prior_inline_tags();
        assert_eq!(prior.len(), 4);

        assert_eq!(prior[0][&TagId::Xbord], TagValue::Number(1.0));
        assert_eq!(prior[0][&TagId::Bord], TagValue::Number(1.0));
        assert_eq!(prior[1][&TagId::Xbord], TagValue::Number(1.0));
        assert_eq!(prior[1][&TagId::Fscx], TagValue::Number(120.0));
        assert_eq!(prior[2][&TagId::Xbord], TagValue::Number(7.0));
        assert_eq!(prior[2][&TagId::Ybord], TagValue::Number(2.0));
        assert_eq!(prior[3][&TagId::Xbord], TagValue::Number(3.0));
        assert_eq!(prior[3][&TagId::Fscx], TagValue::Number(100.0));
    }

    #[test]
    fn retokenize_is_stable() {
        let mut l = line(r"{\t(0,100,\fscx120)}x");
        l.tokenize_transforms();
        let first = l.text.clone();
        l.tokenize_transforms();
        assert_eq!(l.text, first);
        assert_eq!(l.transforms.len(), 1);
        l.detokenize_transforms(0, 0);
        assert_eq!(l.text, r"{\t(0,100,\fscx120)}x");
    }
}
