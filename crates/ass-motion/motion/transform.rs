//! `\t(...)` extraction, re-emission and interpolation
//!
//! Transforms are lifted out of the line text before any line-level tag pass
//! runs. Each one is replaced by a single substitution character taken from a
//! Unicode private use plane; the character encodes the transform's index in
//! the owning line's list. Tags inside a transform are therefore invisible to
//! deduplication, tag completion and motion callbacks that match on the line
//! text, and come back untouched when the line is finalized.
//!
//! # Example
//!
//! ```rust
//! use ass_motion::motion::transform::{detokenize, tokenize_transforms};
//!
//! let text = r"{\fscx100\t(0,500,\fscx150)}Grow";
//! let (tokenized, transforms) = tokenize_transforms(text, 2000);
//! assert_eq!(transforms.len(), 1);
//! assert!(!tokenized.contains(r"\t("));
//!
//! assert_eq!(detokenize(&tokenized, &transforms, 0, 0), text);
//! assert_eq!(
//!     detokenize(&tokenized, &transforms, -200, 0),
//!     r"{\fscx100\t(-200,300,\fscx150)}Grow"
//! );
//! ```

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::tags::{registry, tag, TagId, TagValue};
use crate::utils::{clamp, format_number};

/// First code point used for substitution slots
const SLOT_BASE: u32 = 0xF0000;
/// Last usable code point in the slot plane
const SLOT_LAST: u32 = 0xFFFFD;

/// Tag states per override block, see `MotionLine::collect_prior_inline_tags`
pub type PriorState = Vec<AHashMap<TagId, TagValue>>;

/// One `\t(...)` occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Slot index in the owning line
    pub index: usize,
    /// Original text, emitted verbatim when unshifted
    pub raw: String,
    /// Start time relative to line start (ms)
    pub start: f64,
    /// End time relative to line start (ms)
    pub end: f64,
    pub accel: f64,
    /// Whether times were written explicitly
    pub has_times: bool,
    /// Whether acceleration was written explicitly
    pub has_accel: bool,
    /// Tag text inside the transform
    pub effect: String,
    /// Parsed end values in effect order
    pub values: SmallVec<[(TagId, TagValue); 4]>,
}

impl Transform {
    /// Build a transform with explicit times
    #[must_use]
    pub fn new(index: usize, start: f64, end: f64, accel: f64, effect: &str) -> Self {
        let mut transform = Self {
            index,
            raw: String::new(),
            start,
            end,
            accel,
            has_times: true,
            has_accel: accel != 1.0,
            effect: String::new(),
            values: SmallVec::new(),
        };
        transform.set_effect(effect);
        transform
    }

    /// Replace the effect text, rebuilding parsed values and raw text
    pub fn set_effect(&mut self, effect: &str) {
        self.effect = effect.to_string();
        self.values = parse_effect(effect);
        self.raw = self.format(0.0);
    }

    /// Transform text with times moved by `shift` ms
    #[must_use]
    pub fn format(&self, shift: f64) -> String {
        let mut params = Vec::with_capacity(3);
        if self.has_times || shift != 0.0 {
            params.push(format_number(self.start + shift, 2));
            params.push(format_number(self.end + shift, 2));
        }
        if self.has_accel {
            params.push(format_number(self.accel, 2));
        }
        params.push(self.effect.clone());
        tag(TagId::Transform).emit(&params.join(","))
    }

    /// Interpolation progress at `time`, accelerated and clamped to `[0, 1]`
    #[must_use]
    pub fn progress(&self, time: f64) -> f64 {
        let linear = if self.end <= self.start {
            if time >= self.end {
                1.0
            } else {
                0.0
            }
        } else {
            (time - self.start) / (self.end - self.start)
        };
        let clamped = clamp(linear, 0.0, 1.0);
        if self.accel == 1.0 || self.accel <= 0.0 {
            clamped
        } else {
            clamped.powf(self.accel)
        }
    }

    /// Substitution character for this transform
    #[must_use]
    pub fn slot(&self) -> Option<char> {
        slot_char(self.index)
    }
}

/// Substitution character for a slot index
#[must_use]
pub fn slot_char(index: usize) -> Option<char> {
    let code = SLOT_BASE.checked_add(u32::try_from(index).ok()?)?;
    if code > SLOT_LAST {
        return None;
    }
    char::from_u32(code)
}

/// Slot index encoded by a substitution character
#[must_use]
pub fn slot_index(c: char) -> Option<usize> {
    let code = u32::from(c);
    (SLOT_BASE..=SLOT_LAST)
        .contains(&code)
        .then(|| (code - SLOT_BASE) as usize)
}

fn parse_effect(effect: &str) -> SmallVec<[(TagId, TagValue); 4]> {
    let mut found: Vec<(usize, TagId, TagValue)> = Vec::new();
    for def in registry().transformable() {
        for m in def.find_all(effect) {
            if let Some(value) = def.parse_value(m.value) {
                found.push((m.start, def.id, value));
            }
        }
    }
    found.sort_by_key(|(start, _, _)| *start);
    found.into_iter().map(|(_, id, value)| (id, value)).collect()
}

/// Split `\t` contents into numeric parameters and effect text
fn parse_transform(index: usize, raw: &str, inner: &str, line_duration: i64) -> Option<Transform> {
    let effect_start = inner.find('\\')?;
    let params: Vec<f64> = inner[..effect_start]
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect::<Option<_>>()?;
    let effect = &inner[effect_start..];

    let (start, end, accel, has_times, has_accel) = match params.as_slice() {
        [] => (0.0, line_duration as f64, 1.0, false, false),
        [accel] => (0.0, line_duration as f64, *accel, false, true),
        [t1, t2] => (*t1, *t2, 1.0, true, false),
        [t1, t2, accel] => (*t1, *t2, *accel, true, true),
        _ => return None,
    };

    Some(Transform {
        index,
        raw: raw.to_string(),
        start,
        end,
        accel,
        has_times,
        has_accel,
        effect: effect.to_string(),
        values: parse_effect(effect),
    })
}

/// Byte length of a balanced `(...)` group starting at `open`
fn balanced_len(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(offset + 1);
                }
            }
            '}' => return None,
            _ => {}
        }
    }
    None
}

/// Replace every `\t(...)` inside override blocks with a substitution slot
///
/// `line_duration` resolves transforms without explicit times. Transforms
/// that cannot be parsed stay in the text as they are.
#[must_use]
pub fn tokenize_transforms(text: &str, line_duration: i64) -> (String, Vec<Transform>) {
    let mut output = String::with_capacity(text.len());
    let mut transforms = Vec::new();
    let mut in_block = false;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        if in_block && rest.starts_with(r"\t(") {
            let open = pos + 2;
            if let Some(len) = balanced_len(text, open) {
                let raw = &text[pos..open + len];
                let inner = &text[open + 1..open + len - 1];
                let index = transforms.len();
                if let (Some(slot), Some(transform)) =
                    (slot_char(index), parse_transform(index, raw, inner, line_duration))
                {
                    output.push(slot);
                    transforms.push(transform);
                    pos = open + len;
                    continue;
                }
            }
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        match c {
            '{' => in_block = true,
            '}' => in_block = false,
            _ => {}
        }
        output.push(c);
        pos += c.len_utf8();
    }

    (output, transforms)
}

/// Put transforms back into `text`, shifting their times by `shift` ms
///
/// Unshifted transforms are emitted byte for byte. When `line_duration` is
/// positive, transforms starting at or after it are dropped.
#[must_use]
pub fn detokenize(text: &str, transforms: &[Transform], shift: i64, line_duration: i64) -> String {
    let mut output = String::with_capacity(text.len());
    for c in text.chars() {
        let Some(transform) = slot_index(c).and_then(|index| transforms.get(index)) else {
            output.push(c);
            continue;
        };

        let shift = shift as f64;
        if line_duration > 0 && transform.start + shift >= line_duration as f64 {
            continue;
        }
        if shift == 0.0 {
            output.push_str(&transform.raw);
        } else {
            output.push_str(&transform.format(shift));
        }
    }
    output
}

/// Replace every slot with the literal tag values at `time` ms
///
/// `prior` holds the tag state of each override block before any transform
/// runs. Transforms of the same block chain: a later transform on a tag
/// starts from the value an earlier one reached. A transform result carries
/// into later blocks until an inline tag changes that tag again.
#[must_use]
pub fn interpolate(
    text: &str,
    transforms: &[Transform],
    time: f64,
    prior: &PriorState,
    places: u32,
) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chained: AHashMap<TagId, (usize, TagValue)> = AHashMap::new();
    let mut block: Option<usize> = None;

    for c in text.chars() {
        if c == '{' {
            block = Some(block.map_or(0, |b| b + 1));
        }
        let Some(transform) = slot_index(c).and_then(|index| transforms.get(index)) else {
            output.push(c);
            continue;
        };

        let b = block.unwrap_or(0);
        let state = prior.get(b);
        let progress = transform.progress(time);
        for (id, target) in &transform.values {
            let inline = state.and_then(|s| s.get(id));
            let before = match chained.get(id) {
                Some((from_block, value))
                    if *from_block == b || prior.get(*from_block).and_then(|s| s.get(id)) == inline =>
                {
                    Some(value.clone())
                }
                _ => inline.cloned(),
            };
            let value = before.map_or_else(
                || target.clone(),
                |before| before.interpolate(target, progress),
            );
            output.push_str(&tag(*id).emit_value(&value, places));
            chained.insert(*id, (b, value));
        }
    }
    output
}
