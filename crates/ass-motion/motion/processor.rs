//! Apply operation orchestration
//!
//! [`MotionProcessor::apply`] runs one complete motion application:
//!
//! 1. Parse the main (and optional clip) tracking data
//! 2. Check the data covers exactly the frames of the selected lines
//! 3. Reverse the data if requested, pick reference frames, flatten the
//!    channels not applied
//! 4. Prepare every line (tag normalization and completion)
//! 5. Generate output lines per input line
//! 6. Finalize the text and merge identical neighbouring lines
//!
//! Nothing is returned for a batch that fails steps 1 or 2.
//!
//! # Example
//!
//! ```rust
//! use ass_motion::config::MotionOptions;
//! use ass_motion::motion::MotionProcessor;
//! use ass_motion::script::{ConstantFrameRate, Dialogue, Style};
//!
//! let data = "Adobe After Effects 6.0 Keyframe Data\n\
//!             \tSource Width\t100\n\tSource Height\t100\n\
//!             Position\n\t1\t0\t0\n\t2\t10\t0\n\
//!             End of Keyframe Data\n";
//! let styles = vec![Style { alignment: 7, margin_l: 0, margin_r: 0, margin_v: 0, ..Style::default() }];
//! let fps = ConstantFrameRate::new(25, 1);
//! let options = MotionOptions::default().position(true);
//!
//! let processor = MotionProcessor::new(&fps, &styles, 100.0, 100.0, options);
//! let outcome = processor
//!     .apply(&[Dialogue::new(0, 80, "Default", "Hello")], data, None)
//!     .unwrap();
//!
//! assert_eq!(outcome.lines.len(), 2);
//! assert_eq!(outcome.lines[1].text, r"{\pos(10,0)}Hello");
//! ```

use log::{debug, warn};

use super::handler::{merge_position_transforms, MotionHandler};
use super::line::{find_in_blocks, MotionLine};
use crate::config::{ClipTrackOptions, MotionConfig, MotionOptions};
use crate::data::DataHandler;
use crate::script::{Dialogue, FrameTimes, Style, StyleLookup};
use crate::tags::{tag, TagId};
use crate::utils::{format_number, MotionError, Result};

/// Result of a successful apply operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyOutcome {
    /// Generated lines, grouped per input line in input order
    pub lines: Vec<Dialogue>,
    /// Recoverable problems worth showing to the user
    pub warnings: Vec<String>,
}

/// Runs motion application against a timebase and a style table
pub struct MotionProcessor<'a, T: ?Sized, S: ?Sized> {
    timebase: &'a T,
    styles: &'a S,
    res_x: f64,
    res_y: f64,
    options: MotionOptions,
    clip_options: Option<ClipTrackOptions>,
}

impl<'a, T, S> MotionProcessor<'a, T, S>
where
    T: FrameTimes + ?Sized,
    S: StyleLookup + ?Sized,
{
    /// Create a processor for a script of `res_x` by `res_y`
    #[must_use]
    pub fn new(timebase: &'a T, styles: &'a S, res_x: f64, res_y: f64, options: MotionOptions) -> Self {
        Self {
            timebase,
            styles,
            res_x,
            res_y,
            options,
            clip_options: None,
        }
    }

    /// Create a processor from saved options
    #[must_use]
    pub fn from_config(timebase: &'a T, styles: &'a S, res_x: f64, res_y: f64, config: MotionConfig) -> Self {
        Self {
            clip_options: config.clip,
            ..Self::new(timebase, styles, res_x, res_y, config.main)
        }
    }

    /// Options for separate clip data
    #[must_use]
    pub fn with_clip_options(mut self, clip_options: ClipTrackOptions) -> Self {
        self.clip_options = Some(clip_options);
        self
    }

    /// Apply tracking data to `lines`
    ///
    /// `main_data` and `clip_data` are tracking data text or paths to data
    /// files. The returned lines replace the input lines; each input line
    /// contributes its generated lines in order of start time.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::NoLines` for an empty selection,
    /// `MotionError::DataParse` when tracking data cannot be parsed and
    /// `MotionError::LengthMismatch` when its frame count differs from the
    /// frames spanned by the lines.
    pub fn apply(&self, lines: &[Dialogue], main_data: &str, clip_data: Option<&str>) -> Result<ApplyOutcome> {
        if lines.is_empty() {
            return Err(MotionError::NoLines);
        }

        let mut main = DataHandler::parse(main_data, self.res_x, self.res_y)?;
        let mut clip = clip_data
            .map(|data| DataHandler::parse(data, self.res_x, self.res_y))
            .transpose()?;

        let ranges: Vec<(i64, i64)> = lines
            .iter()
            .map(|line| {
                (
                    self.timebase.frame_from_ms(line.start_time),
                    self.timebase.frame_from_ms(line.end_time),
                )
            })
            .collect();
        let active = ranges.iter().filter(|(start, end)| end > start);
        let (Some(collection_start), Some(collection_end)) = (
            active.clone().map(|(start, _)| *start).min(),
            active.map(|(_, end)| *end).max(),
        ) else {
            debug!("no selected line covers a frame");
            return Ok(ApplyOutcome {
                lines: lines.to_vec(),
                warnings: Vec::new(),
            });
        };
        let total = usize::try_from(collection_end - collection_start).unwrap_or(0);

        for data in std::iter::once(&main).chain(clip.as_ref()) {
            if !data.check_length(total) {
                return Err(MotionError::LengthMismatch {
                    expected: total,
                    actual: data.length(),
                });
            }
        }

        let mut warnings = Vec::new();
        let options = self.options.clone().normalized();
        let clip_options = (clip.is_some() || options.clip_only)
            .then(|| self.clip_options.clone().unwrap_or_default().normalized());

        if options.reverse_tracking {
            main.reverse_data();
        }
        let reference = resolve_reference_frame(
            options.start_frame,
            options.relative,
            collection_start,
            main.length(),
            &mut warnings,
        );
        main.add_reference_frame(reference);
        main.strip_fields(match (&clip, &clip_options) {
            (None, Some(clip_options)) => clip_options.channels(),
            _ => options.channels(),
        });

        if let (Some(clip), Some(clip_options)) = (clip.as_mut(), clip_options.as_ref()) {
            if clip_options.reverse_tracking {
                clip.reverse_data();
            }
            let reference = resolve_reference_frame(
                clip_options.start_frame,
                clip_options.relative,
                collection_start,
                clip.length(),
                &mut warnings,
            );
            clip.add_reference_frame(reference);
            clip.strip_fields(clip_options.channels());
        }

        let handler = MotionHandler::new(&options, clip_options.as_ref(), &main, clip.as_ref());
        let rect_to_vector = clip_options.as_ref().map_or(options.rc_to_vc, |clip| clip.rc_to_vc)
            || main.is_drawing()
            || clip.as_ref().is_some_and(DataHandler::is_drawing);

        let mut output = Vec::with_capacity(lines.len());
        for (line, (start, end)) in lines.iter().zip(&ranges) {
            if end <= start {
                output.push(line.clone());
                continue;
            }
            let prepared = self.prepare(line, &options, handler.tracks_clips(), rect_to_vector);
            let mut group: Vec<Dialogue> = handler
                .apply_motion(&prepared, self.timebase, collection_start)
                .into_iter()
                .map(finalize)
                .collect();
            group.sort_by_key(|line| line.start_time);
            output.extend(combine_identical_lines(group));
        }

        Ok(ApplyOutcome {
            lines: output,
            warnings,
        })
    }

    /// Normalize and complete the tags of one line
    fn prepare(
        &self,
        dialogue: &Dialogue,
        options: &MotionOptions,
        tracks_clips: bool,
        rect_to_vector: bool,
    ) -> MotionLine {
        let mut line = MotionLine::from_dialogue(dialogue);
        let style = self.styles.style(&dialogue.style).cloned().unwrap_or_default();
        line.set_style(&style);

        line.tokenize_transforms();
        line.convert_fad_to_fade();
        line.tokenize_transforms();
        line.deduplicate_tags();

        if options.clip_only {
            let text = line.text.clone();
            line.extract_metrics(self.res_x, self.res_y);
            line.text = text;
        } else {
            if !line.extract_metrics(self.res_x, self.res_y) {
                let value = format!(
                    "{},{}",
                    format_number(line.x_position, options.pos_round),
                    format_number(line.y_position, options.pos_round)
                );
                line.insert_into_first_block(&tag(TagId::Pos).emit(&value));
            }

            let present = line.first_block().to_string();
            let mut missing = missing_tags(&style, &present, options);
            missing.push_str(&missing_alpha_tags(&line, &style, options));
            line.insert_into_first_block(&missing);

            self.complete_reset_tags(&mut line, options);
        }

        line.has_org = line.has_tag(TagId::Org);

        if tracks_clips {
            line.normalize_clips(rect_to_vector, options.pos_round);
            if !line.has_clip && !line.has_tag(TagId::VectClip) {
                line.insert_into_first_block(&tag(TagId::VectClip).emit(""));
            }
        } else {
            line.has_clip = line.has_any_clip();
        }
        line
    }

    /// Complete the tags following each `\r` from the style it names
    ///
    /// A reset naming an unknown style is left alone.
    fn complete_reset_tags(&self, line: &mut MotionLine, options: &MotionOptions) {
        let blocks = super::line::block_spans(&line.text);
        let mut inserts = Vec::new();
        for m in find_in_blocks(tag(TagId::Reset), &line.text) {
            let name = m.value.trim();
            let style = if name.is_empty() {
                line.style_record.clone()
            } else if let Some(style) = self.styles.style(name) {
                style.clone()
            } else {
                debug!("\\r{name} names no known style, left untouched");
                continue;
            };
            let Some(block) = blocks.iter().find(|span| span.contains(&m.start)) else {
                continue;
            };
            let after = &line.text[m.end..block.end];
            let missing = missing_tags(&style, after, options);
            if !missing.is_empty() {
                inserts.push((m.end, missing));
            }
        }
        for (at, tags) in inserts.into_iter().rev() {
            line.text.insert_str(at, &tags);
        }
    }
}

/// Tags the options track that `present` lacks, with the style's values
fn missing_tags(style: &Style, present: &str, options: &MotionOptions) -> String {
    let wanted = [
        (options.x_scale, TagId::Fscx, options.scale_round),
        (options.x_scale, TagId::Fscy, options.scale_round),
        (options.border, TagId::Bord, options.scale_round),
        (options.shadow, TagId::Shad, options.scale_round),
        (options.z_rotation, TagId::Frz, options.rot_round),
        (options.x_rotation, TagId::Frx, options.rot_round),
        (options.y_rotation, TagId::Fry, options.rot_round),
        (options.z_position, TagId::Z, options.pos_round),
    ];
    let mut tags = String::new();
    for (enabled, id, places) in wanted {
        let def = tag(id);
        if !enabled || def.occurs_in(present) {
            continue;
        }
        if let Some(value) = def.style_default(style) {
            tags.push_str(&def.emit_value(&value, places));
        }
    }
    tags
}

/// Alpha tags a fade needs to fold into
///
/// Only needed when transitions are baked and the line has no `\alpha`.
fn missing_alpha_tags(line: &MotionLine, style: &Style, options: &MotionOptions) -> String {
    if !options.kill_trans || !line.has_tag(TagId::Fade) || line.has_tag(TagId::Alpha) {
        return String::new();
    }
    let karaoke = [TagId::Karaoke, TagId::KaraokeFill, TagId::KaraokeOutline]
        .into_iter()
        .any(|id| line.has_tag(id));
    let wanted = [
        (true, TagId::Alpha1),
        (karaoke, TagId::Alpha2),
        (style.outline > 0.0 || line.has_tag(TagId::Bord), TagId::Alpha3),
        (style.shadow > 0.0 || line.has_tag(TagId::Shad), TagId::Alpha4),
    ];
    let present = line.first_block();
    let mut tags = String::new();
    for (needed, id) in wanted {
        let def = tag(id);
        if !needed || def.occurs_in(present) {
            continue;
        }
        if let Some(value) = def.style_default(style) {
            tags.push_str(&def.emit_value(&value, 0));
        }
    }
    tags
}

/// Turn a generated line back into a dialogue event
fn finalize(mut line: MotionLine) -> Dialogue {
    if line.was_linear {
        line.detokenize_transforms(0, 0);
        line.text = merge_position_transforms(&line.text);
        line.strip_empty_clips();
        line.strip_empty_blocks();
    } else {
        line.deduplicate_tags();
        let duration = line.duration();
        line.detokenize_transforms(line.transform_shift, duration);
        line.shift_karaoke(line.karaoke_shift);
        line.strip_empty_blocks();
    }
    line.to_dialogue()
}

/// Resolve the user's start frame to a 1-based index into the data
///
/// In relative mode `0` means the first frame and negative values count
/// back from the last. In absolute mode `requested` is a video frame and
/// `collection_start` the first video frame of the selection. Results
/// outside `[1, length]` are clamped and a warning is recorded.
pub fn resolve_reference_frame(
    requested: i64,
    relative: bool,
    collection_start: i64,
    length: usize,
    warnings: &mut Vec<String>,
) -> usize {
    let length = i64::try_from(length).unwrap_or(i64::MAX).max(1);
    let frame = if relative {
        match requested {
            0 => 1,
            v if v < 0 => length + v + 1,
            v => v,
        }
    } else {
        requested - collection_start + 1
    };

    let clamped = frame.clamp(1, length);
    if clamped != frame {
        let message = format!(
            "reference frame {requested} is outside the tracked range, using frame {clamped}"
        );
        warn!("{message}");
        warnings.push(message);
    }
    usize::try_from(clamped).unwrap_or(1)
}

/// Merge neighbouring lines that differ only in timing
///
/// A line is merged into the previous one when every field but the times
/// matches and it starts exactly where the previous one ends. Callers
/// combining across groups should sort by start time first.
#[must_use]
pub fn combine_identical_lines(lines: Vec<Dialogue>) -> Vec<Dialogue> {
    let mut combined: Vec<Dialogue> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(last) = combined.last_mut() {
            if last.end_time == line.start_time && same_content(last, &line) {
                last.end_time = line.end_time;
                continue;
            }
        }
        combined.push(line);
    }
    combined
}

fn same_content(a: &Dialogue, b: &Dialogue) -> bool {
    a.text == b.text
        && a.style == b.style
        && a.layer == b.layer
        && a.actor == b.actor
        && a.effect == b.effect
        && a.margin_l == b.margin_l
        && a.margin_r == b.margin_r
        && a.margin_v == b.margin_v
        && a.comment == b.comment
}
