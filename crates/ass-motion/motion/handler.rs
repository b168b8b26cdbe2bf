//! Per-frame tag rewriting
//!
//! A [`MotionHandler`] is built once per apply operation. It turns the
//! options into an ordered callback table and then generates output lines
//! for each prepared [`MotionLine`], either as one line carrying `\move` and
//! `\t` (linear mode) or as one line per video frame.
//!
//! Position callbacks come before clip callbacks in the table: in absolute
//! mode the position callback records the offset it applied and the clip
//! callbacks of the same pass reuse it.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::drawing::map_drawing;
use super::line::{find_in_blocks, pair, splice, MotionLine};
use crate::config::{ClipTrackOptions, MotionOptions};
use crate::data::{DataHandler, FrameState};
use crate::script::FrameTimes;
use crate::tags::registry::{compile, NUM};
use crate::tags::value::parse_numbers;
use crate::tags::{tag, TagId};
use crate::utils::{datan2, dcos, dsin, floor_to, format_number};

/// Rotation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Value rewrite applied to one tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    /// `\pos` moved with the tracked point
    Position,
    /// `\pos` replaced by the tracked point
    AbsolutePosition,
    Origin,
    /// Multiplied by the horizontal scale ratio
    XScale,
    /// Multiplied by the vertical scale ratio
    YScale,
    Blur,
    Rotation(Axis),
    ZPosition,
    RectClip,
    /// Vector clip coordinates moved with the tracked point
    VectorClip,
    /// Vector clip replaced by the frame's tracked drawing
    DrawingClip,
}

impl Callback {
    #[must_use]
    pub const fn is_clip(self) -> bool {
        matches!(self, Self::RectClip | Self::VectorClip | Self::DrawingClip)
    }

    /// New value text for a tag, or `None` to leave it untouched
    ///
    /// Values that do not parse are left untouched.
    pub fn evaluate(self, value: &str, frame: &mut FrameContext<'_>) -> Option<String> {
        let p = frame.precision;
        let state = &frame.main;
        match self {
            Self::Position | Self::Origin => {
                let (x, y) = pair(value)?;
                let (x, y) = position_math(x, y, state);
                Some(format_pair(x, y, p.position))
            }
            Self::AbsolutePosition => {
                let (x, y) = pair(value)?;
                frame.x_delta = state.x_current - x;
                frame.y_delta = state.y_current - y;
                Some(format_pair(state.x_current, state.y_current, p.position))
            }
            Self::XScale => number(value, |v| v * state.x_ratio, p.scale),
            Self::YScale => number(value, |v| v * state.y_ratio, p.scale),
            Self::Blur => number(
                value,
                |v| v * (1.0 - (1.0 - state.x_ratio) * p.blur_scale),
                p.scale,
            ),
            Self::Rotation(axis) => {
                let diff = match axis {
                    Axis::X => state.x_rotation_diff,
                    Axis::Y => state.y_rotation_diff,
                    Axis::Z => state.z_rotation_diff,
                };
                number(value, |v| v + diff, p.rotation)
            }
            Self::ZPosition => number(value, |v| v + state.z_current - state.z_start, p.position),
            Self::RectClip => {
                let numbers = parse_numbers(value)?;
                let [x1, y1, x2, y2] = numbers.as_slice() else {
                    return None;
                };
                let (x1, y1) = frame.clip_point(*x1, *y1, false);
                let (x2, y2) = frame.clip_point(*x2, *y2, false);
                Some(format!(
                    "{},{}",
                    format_pair(x1, y1, p.position),
                    format_pair(x2, y2, p.position)
                ))
            }
            Self::VectorClip => {
                if value.trim().is_empty() {
                    return None;
                }
                Some(map_drawing(value, p.position, |x, y| {
                    frame.clip_point(x, y, true)
                }))
            }
            Self::DrawingClip => frame.drawing.map(str::to_string),
        }
    }
}

fn number<F: Fn(f64) -> f64>(value: &str, map: F, places: u32) -> Option<String> {
    let v: f64 = value.trim().parse().ok()?;
    Some(format_number(map(v), places))
}

fn format_pair(x: f64, y: f64, places: u32) -> String {
    format!("{},{}", format_number(x, places), format_number(y, places))
}

/// Move a point with the tracked object
///
/// The offset from the reference position is scaled by the scale ratios,
/// rotated by the z rotation delta and added to the current position. A
/// point at the reference position with no movement maps to itself.
#[must_use]
pub fn position_math(x: f64, y: f64, state: &FrameState) -> (f64, f64) {
    transform_point(x, y, state, state.z_rotation_diff)
}

fn transform_point(x: f64, y: f64, state: &FrameState, rotation: f64) -> (f64, f64) {
    let dx = (x - state.x_start) * state.x_ratio;
    let dy = (y - state.y_start) * state.y_ratio;
    let radius = dx.hypot(dy);
    let angle = datan2(dy, dx);
    (
        state.x_current + radius * dcos(angle - rotation),
        state.y_current + radius * dsin(angle - rotation),
    )
}

/// Decimal places and blur scaling used when writing values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precision {
    pub position: u32,
    pub scale: u32,
    pub rotation: u32,
    pub blur_scale: f64,
}

impl From<&MotionOptions> for Precision {
    fn from(options: &MotionOptions) -> Self {
        Self {
            position: options.pos_round,
            scale: options.scale_round,
            rotation: options.rot_round,
            blur_scale: options.blur_scale,
        }
    }
}

/// Tracking state seen by the callbacks of one frame
#[derive(Debug, Clone)]
pub struct FrameContext<'a> {
    pub main: FrameState,
    /// State of separate clip data
    pub clip: Option<FrameState>,
    /// Tracked drawing for drawing-clip data
    pub drawing: Option<&'a str>,
    /// Absolute position mode is active
    pub absolute: bool,
    /// Offset applied by the absolute position callback
    pub x_delta: f64,
    pub y_delta: f64,
    pub precision: Precision,
}

impl FrameContext<'_> {
    fn clip_point(&self, x: f64, y: f64, rotate: bool) -> (f64, f64) {
        match &self.clip {
            Some(state) => transform_point(x, y, state, if rotate { state.z_rotation_diff } else { 0.0 }),
            None if self.absolute => (x + self.x_delta, y + self.y_delta),
            None => transform_point(
                x,
                y,
                &self.main,
                if rotate { self.main.z_rotation_diff } else { 0.0 },
            ),
        }
    }
}

fn position_transform_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        compile(&format!(
            r"\\pos\(({NUM}),({NUM})\)\\t\(({NUM}),({NUM}),\\pos\(({NUM}),({NUM})\)\)"
        ))
    })
}

/// Merge `\pos(a)\t(t1,t2,\pos(b))` into `\move(a,b,t1,t2)`
#[must_use]
pub fn merge_position_transforms(text: &str) -> String {
    position_transform_pattern()
        .replace_all(text, r"\move($1,$2,$5,$6,$3,$4)")
        .into_owned()
}

/// Callback table and per-line generation for one apply operation
#[derive(Debug)]
pub struct MotionHandler<'a> {
    options: &'a MotionOptions,
    main: &'a DataHandler,
    clip: Option<&'a DataHandler>,
    callbacks: Vec<(TagId, Callback)>,
    tracks_clips: bool,
}

impl<'a> MotionHandler<'a> {
    /// Build the callback table
    ///
    /// `clip_options` selects the clip callbacks when given; otherwise the
    /// main options do. Clip callbacks read `clip` data when present.
    #[must_use]
    pub fn new(
        options: &'a MotionOptions,
        clip_options: Option<&ClipTrackOptions>,
        main: &'a DataHandler,
        clip: Option<&'a DataHandler>,
    ) -> Self {
        let callbacks = build_callbacks(options, clip_options, main, clip);
        debug!(
            "callback table: {}",
            callbacks
                .iter()
                .map(|(id, _)| tag(*id).name)
                .collect::<Vec<_>>()
                .join(" ")
        );
        Self {
            options,
            main,
            clip,
            callbacks,
            tracks_clips: clip.is_some()
                || clip_options.is_some()
                || options.clip_only
                || options.tracks_clips()
                || main.is_drawing(),
        }
    }

    /// Tag and callback pairs in dispatch order
    #[must_use]
    pub fn callbacks(&self) -> &[(TagId, Callback)] {
        &self.callbacks
    }

    /// Whether clips are tracked in this operation
    #[must_use]
    pub const fn tracks_clips(&self) -> bool {
        self.tracks_clips
    }

    fn has_drawing_data(&self) -> bool {
        self.main.is_drawing() || self.clip.is_some_and(DataHandler::is_drawing)
    }

    /// Whether a line is written as a single line with `\move` and `\t`
    ///
    /// Moving origins and tracked clips cannot be expressed with a single
    /// transform, so those lines always get one line per frame.
    #[must_use]
    pub fn use_linear(&self, line: &MotionLine) -> bool {
        self.options.linear
            && !(self.options.origin && line.has_org)
            && !(self.tracks_clips && (line.has_clip || self.has_drawing_data()))
    }

    /// Generate the output lines of one prepared line
    ///
    /// `collection_start` is the first video frame of the whole selection.
    /// Lines covering no frame come back unchanged.
    pub fn apply_motion<T: FrameTimes + ?Sized>(
        &self,
        line: &MotionLine,
        timebase: &T,
        collection_start: i64,
    ) -> Vec<MotionLine> {
        let (start_frame, end_frame) = line.frame_range(timebase);
        if end_frame <= start_frame {
            return vec![line.clone()];
        }
        if self.use_linear(line) {
            debug!("line at {} ms: linear", line.start_time);
            vec![self.linear(line, timebase, collection_start)]
        } else {
            debug!("line at {} ms: one line per frame", line.start_time);
            self.non_linear(line, timebase, collection_start)
        }
    }

    /// Tracking state for one frame of `line`
    ///
    /// In absolute mode the clip offset starts out as the tracked point
    /// minus the line's position, so clips move even when no `\pos`
    /// callback runs in the same pass.
    fn context(&self, line: &MotionLine, frame: usize) -> FrameContext<'a> {
        let drawing = self
            .clip
            .and_then(|clip| clip.drawing_for(frame))
            .or_else(|| self.main.drawing_for(frame));
        let main = self.main.state_at(frame);
        let (x_delta, y_delta) = if self.options.abs_pos {
            (main.x_current - line.x_position, main.y_current - line.y_position)
        } else {
            (0.0, 0.0)
        };
        FrameContext {
            main,
            clip: self
                .clip
                .filter(|clip| !clip.is_drawing())
                .map(|clip| clip.state_at(frame)),
            drawing,
            absolute: self.options.abs_pos,
            x_delta,
            y_delta,
            precision: Precision::from(self.options),
        }
    }

    /// Run every callback over the tags of `text`
    ///
    /// With `in_blocks` only tags inside override blocks are rewritten;
    /// transform effects are passed with `in_blocks` unset.
    pub fn dispatch(&self, text: &str, frame: &mut FrameContext<'_>, in_blocks: bool) -> String {
        let mut text = text.to_string();
        for (id, callback) in &self.callbacks {
            let def = tag(*id);
            let found = if in_blocks {
                find_in_blocks(def, &text)
            } else {
                def.find_all(&text)
            };
            let edits: Vec<_> = found
                .into_iter()
                .filter_map(|m| {
                    callback
                        .evaluate(m.value, frame)
                        .map(|value| (m.range(), def.emit(&value)))
                })
                .collect();
            if !edits.is_empty() {
                text = splice(&text, &edits);
            }
        }
        text
    }

    fn linear<T: FrameTimes + ?Sized>(
        &self,
        line: &MotionLine,
        timebase: &T,
        collection_start: i64,
    ) -> MotionLine {
        let (start_frame, end_frame) = line.frame_range(timebase);
        let midpoint = |frame: i64| {
            (timebase.ms_from_frame(frame) + timebase.ms_from_frame(frame + 1)).div_euclid(2)
        };
        let begin = (midpoint(start_frame) - line.start_time) as f64;
        let end = (midpoint(end_frame - 1) - line.start_time) as f64;

        let mut out = line.clone();
        out.move_to_pos(0.0, self.options.pos_round);

        let mut first = self.context(&out, relative_frame(start_frame, collection_start));
        let mut last = self.context(&out, relative_frame(end_frame - 1, collection_start));

        for (id, callback) in &self.callbacks {
            let def = tag(*id);
            let text = out.text.clone();
            let mut edits = Vec::new();
            for m in find_in_blocks(def, &text) {
                let (Some(from), Some(to)) = (
                    callback.evaluate(m.value, &mut first),
                    callback.evaluate(m.value, &mut last),
                ) else {
                    continue;
                };
                let mut replacement = def.emit(&from);
                if from != to {
                    if let Some(slot) = out.push_transform(begin, end, &def.emit(&to)) {
                        replacement.push(slot);
                    }
                }
                edits.push((m.range(), replacement));
            }
            if !edits.is_empty() {
                out.text = splice(&text, &edits);
            }
        }

        out.was_linear = true;
        out
    }

    fn non_linear<T: FrameTimes + ?Sized>(
        &self,
        line: &MotionLine,
        timebase: &T,
        collection_start: i64,
    ) -> Vec<MotionLine> {
        let (start_frame, end_frame) = line.frame_range(timebase);
        let kill_trans = self.options.kill_trans;
        let places = self
            .options
            .pos_round
            .max(self.options.scale_round)
            .max(self.options.rot_round);
        let prior = if kill_trans && !line.transforms.is_empty() {
            line.collect_prior_inline_tags()
        } else {
            Vec::new()
        };
        let has_fade = line.has_tag(TagId::Fade);

        let mut output = Vec::with_capacity((end_frame - start_frame) as usize);
        for frame in (start_frame..end_frame).rev() {
            let start = if frame == start_frame {
                line.start_time
            } else {
                floor_to(timebase.ms_from_frame(frame), 10)
            };
            let end = if frame == end_frame - 1 {
                line.end_time
            } else {
                floor_to(timebase.ms_from_frame(frame + 1), 10)
            };
            if end <= start {
                debug!("frame {frame} has no duration after rounding, skipped");
                continue;
            }
            let delta = start - line.start_time;

            let mut out = line.clone();
            if kill_trans {
                out.interpolate_transforms(delta as f64, &prior, places);
                if has_fade {
                    out.fold_fade(delta as f64);
                }
            } else if has_fade {
                out.shift_fade(-delta);
            }
            out.move_to_pos(delta as f64, self.options.pos_round);

            let mut context = self.context(&out, relative_frame(frame, collection_start));
            out.text = self.dispatch(&out.text, &mut context, true);
            if !kill_trans {
                for transform in &mut out.transforms {
                    let effect = self.dispatch(&transform.effect, &mut context, false);
                    if effect != transform.effect {
                        transform.set_effect(&effect);
                    }
                }
            }

            out.start_time = start;
            out.end_time = end;
            out.karaoke_shift = (delta as f64 / 10.0).round() as i64;
            out.transform_shift = -delta;
            out.was_linear = false;
            output.push(out);
        }
        output
    }
}

/// 1-based index into the tracking data for a video frame
fn relative_frame(frame: i64, collection_start: i64) -> usize {
    usize::try_from(frame - collection_start + 1).unwrap_or(1).max(1)
}

fn build_callbacks(
    options: &MotionOptions,
    clip_options: Option<&ClipTrackOptions>,
    main: &DataHandler,
    clip: Option<&DataHandler>,
) -> Vec<(TagId, Callback)> {
    if main.is_drawing() {
        return vec![
            (TagId::VectClip, Callback::DrawingClip),
            (TagId::VectIclip, Callback::DrawingClip),
        ];
    }

    let mut table = Vec::new();
    if !options.clip_only {
        let mut add = |enabled: bool, entries: &[(TagId, Callback)]| {
            if enabled {
                table.extend_from_slice(entries);
            }
        };
        let position = if options.abs_pos {
            Callback::AbsolutePosition
        } else {
            Callback::Position
        };
        add(options.x_position || options.y_position, &[(TagId::Pos, position)]);
        add(options.origin, &[(TagId::Org, Callback::Origin)]);
        add(
            options.x_scale,
            &[(TagId::Fscx, Callback::XScale), (TagId::Fscy, Callback::YScale)],
        );
        add(
            options.border,
            &[
                (TagId::Bord, Callback::XScale),
                (TagId::Xbord, Callback::XScale),
                (TagId::Ybord, Callback::YScale),
            ],
        );
        add(
            options.shadow,
            &[
                (TagId::Shad, Callback::XScale),
                (TagId::Xshad, Callback::XScale),
                (TagId::Yshad, Callback::YScale),
            ],
        );
        add(options.blur, &[(TagId::Blur, Callback::Blur)]);
        add(options.x_rotation, &[(TagId::Frx, Callback::Rotation(Axis::X))]);
        add(options.y_rotation, &[(TagId::Fry, Callback::Rotation(Axis::Y))]);
        add(options.z_rotation, &[(TagId::Frz, Callback::Rotation(Axis::Z))]);
        add(options.z_position, &[(TagId::Z, Callback::ZPosition)]);
    }

    let (rect, vect) = clip_options.map_or((options.rect_clip, options.vect_clip), |clip| {
        (clip.rect_clip, clip.vect_clip)
    });
    let drawing_clip = clip.is_some_and(DataHandler::is_drawing);
    if rect && !drawing_clip {
        table.push((TagId::RectClip, Callback::RectClip));
        table.push((TagId::RectIclip, Callback::RectClip));
    }
    if vect || drawing_clip {
        let callback = if drawing_clip {
            Callback::DrawingClip
        } else {
            Callback::VectorClip
        };
        table.push((TagId::VectClip, callback));
        table.push((TagId::VectIclip, callback));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{ConstantFrameRate, Dialogue, Style};

    const TWO_FRAMES: &str = "Adobe After Effects 6.0 Keyframe Data\n\
        \tUnits Per Second\t25\n\tSource Width\t100\n\tSource Height\t100\n\
        Position\n\tFrame\tX pixels\tY pixels\tZ pixels\n\t1\t0\t0\t0\n\t2\t10\t0\t0\n\
        Scale\n\tFrame\tX percent\tY percent\tZ percent\n\t1\t100\t100\t100\n\t2\t200\t50\t100\n\
        Rotation\n\tFrame\tDegrees\n\t1\t0\n\t2\t-90\n\
        End of Keyframe Data\n";

    fn data() -> DataHandler {
        let mut data = DataHandler::parse(TWO_FRAMES, 100.0, 100.0).unwrap();
        data.add_reference_frame(1);
        data
    }

    fn identity() -> FrameState {
        FrameState {
            x_start: 5.0,
            y_start: 7.0,
            x_current: 5.0,
            y_current: 7.0,
            ..FrameState::default()
        }
    }

    fn context(state: FrameState) -> FrameContext<'static> {
        FrameContext {
            main: state,
            clip: None,
            drawing: None,
            absolute: false,
            x_delta: 0.0,
            y_delta: 0.0,
            precision: Precision::from(&MotionOptions::default()),
        }
    }

    #[test]
    fn position_math_fixed_point() {
        assert_eq!(position_math(5.0, 7.0, &identity()), (5.0, 7.0));
    }

    #[test]
    fn position_math_rotates_and_scales() {
        let state = FrameState {
            x_current: 100.0,
            y_current: 100.0,
            x_ratio: 2.0,
            y_ratio: 2.0,
            z_rotation_diff: 90.0,
            ..FrameState::default()
        };
        let (x, y) = position_math(10.0, 0.0, &state);
        assert!((x - 100.0).abs() < 1e-9);
        assert!((y + 20.0 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn scalar_callbacks() {
        let state = FrameState {
            x_ratio: 1.5,
            y_ratio: 0.5,
            z_rotation_diff: 12.5,
            z_start: 1.0,
            z_current: 4.0,
            ..FrameState::default()
        };
        let mut frame = context(state);
        assert_eq!(Callback::XScale.evaluate("100", &mut frame).as_deref(), Some("150"));
        assert_eq!(Callback::YScale.evaluate("3", &mut frame).as_deref(), Some("1.5"));
        assert_eq!(Callback::Blur.evaluate("2", &mut frame).as_deref(), Some("3"));
        assert_eq!(
            Callback::Rotation(Axis::Z).evaluate("10", &mut frame).as_deref(),
            Some("22.5")
        );
        assert_eq!(Callback::ZPosition.evaluate("2", &mut frame).as_deref(), Some("5"));
        assert_eq!(Callback::XScale.evaluate("abc", &mut frame), None);
    }

    #[test]
    fn absolute_position_shares_delta_with_clips() {
        let state = FrameState {
            x_current: 50.0,
            y_current: 60.0,
            ..FrameState::default()
        };
        let mut frame = FrameContext {
            absolute: true,
            ..context(state)
        };
        assert_eq!(
            Callback::AbsolutePosition.evaluate("10,20", &mut frame).as_deref(),
            Some("50,60")
        );
        assert_eq!(
            Callback::RectClip.evaluate("0,0,10,10", &mut frame).as_deref(),
            Some("40,40,50,50")
        );
        assert_eq!(
            Callback::VectorClip.evaluate("m 0 0 l 10 0", &mut frame).as_deref(),
            Some("m 40 40 l 50 40")
        );
        assert_eq!(Callback::VectorClip.evaluate("", &mut frame), None);
    }

    #[test]
    fn callback_table_order() {
        let main = data();
        let options = MotionOptions::default()
            .position(true)
            .scale(true)
            .rotation(true)
            .clips(true);
        let handler = MotionHandler::new(&options, None, &main, None);
        let ids: Vec<TagId> = handler.callbacks().iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec![
                TagId::Pos,
                TagId::Fscx,
                TagId::Fscy,
                TagId::Bord,
                TagId::Xbord,
                TagId::Ybord,
                TagId::Shad,
                TagId::Xshad,
                TagId::Yshad,
                TagId::Blur,
                TagId::Frz,
                TagId::RectClip,
                TagId::RectIclip,
                TagId::VectClip,
                TagId::VectIclip,
            ]
        );

        let clip_only = options.clone().clip_only(true);
        let handler = MotionHandler::new(&clip_only, None, &main, None);
        assert!(handler.callbacks().iter().all(|(_, callback)| callback.is_clip()));
    }

    #[test]
    fn merges_position_pairs() {
        assert_eq!(
            merge_position_transforms(r"{\pos(0,0)\t(20,60,\pos(10,0))}x"),
            r"{\move(0,0,10,0,20,60)}x"
        );
        assert_eq!(merge_position_transforms(r"{\pos(1,2)}x"), r"{\pos(1,2)}x");
    }

    fn prepared(text: &str) -> MotionLine {
        let mut line = MotionLine::from_dialogue(&Dialogue::new(0, 80, "Default", text));
        line.set_style(&Style::default());
        line.tokenize_transforms();
        line
    }

    #[test]
    fn non_linear_frames_descend() {
        let main = data();
        let options = MotionOptions::default().position(true).scale(true);
        let handler = MotionHandler::new(&options, None, &main, None);
        let fps = ConstantFrameRate::new(25, 1);

        let lines = handler.apply_motion(&prepared(r"{\pos(0,0)\fscx100}x"), &fps, 0);
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].start_time, lines[0].end_time), (40, 80));
        assert_eq!(lines[0].text, r"{\pos(10,0)\fscx200}x");
        assert_eq!(lines[0].karaoke_shift, 4);
        assert_eq!(lines[0].transform_shift, -40);
        assert_eq!((lines[1].start_time, lines[1].end_time), (0, 40));
        assert_eq!(lines[1].text, r"{\pos(0,0)\fscx100}x");
    }

    #[test]
    fn karaoke_shift_rounds_to_centiseconds() {
        let main = data();
        let options = MotionOptions::default().position(true);
        let handler = MotionHandler::new(&options, None, &main, None);
        let fps = ConstantFrameRate::new(25, 1);

        let mut line = MotionLine::from_dialogue(&Dialogue::new(5, 80, "Default", r"{\k50}x"));
        line.set_style(&Style::default());
        line.tokenize_transforms();

        let lines = handler.apply_motion(&line, &fps, 0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].start_time, 40);
        assert_eq!(lines[0].karaoke_shift, 4);
        assert_eq!(lines[0].transform_shift, -35);
        assert_eq!(lines[1].karaoke_shift, 0);
    }

    #[test]
    fn absolute_clip_offset_without_position_callback() {
        let main = data();
        let options = MotionOptions::default().clip_only(true).abs_pos(true);
        let handler = MotionHandler::new(&options, None, &main, None);
        let fps = ConstantFrameRate::new(25, 1);

        let mut line = prepared(r"{\pos(10,10)\clip(0,0,10,10)}x");
        line.x_position = 10.0;
        line.y_position = 10.0;
        let lines = handler.apply_motion(&line, &fps, 0);
        assert_eq!(lines[0].text, r"{\pos(10,10)\clip(0,-10,10,0)}x");
        assert_eq!(lines[1].text, r"{\pos(10,10)\clip(-10,-10,0,0)}x");
    }

    #[test]
    fn transform_effects_follow_the_frame() {
        let main = data();
        let options = MotionOptions::default().scale(true);
        let handler = MotionHandler::new(&options, None, &main, None);
        let fps = ConstantFrameRate::new(25, 1);

        let lines = handler.apply_motion(&prepared(r"{\t(0,80,\fscx150)}x"), &fps, 0);
        assert_eq!(lines[0].transforms[0].effect, r"\fscx300");
        assert_eq!(lines[1].transforms[0].effect, r"\fscx150");
    }

    #[test]
    fn linear_line_gets_move() {
        let main = data();
        let options = MotionOptions::default().position(true).linear(true);
        let handler = MotionHandler::new(&options, None, &main, None);
        let fps = ConstantFrameRate::new(25, 1);

        let lines = handler.apply_motion(&prepared(r"{\pos(0,0)}x"), &fps, 0);
        assert_eq!(lines.len(), 1);
        let mut line = lines[0].clone();
        assert!(line.was_linear);
        line.detokenize_transforms(0, 0);
        assert_eq!(merge_position_transforms(&line.text), r"{\move(0,0,10,0,20,60)}x");
    }

    #[test]
    fn origin_and_clips_force_per_frame_output() {
        let main = data();
        let options = MotionOptions {
            origin: true,
            ..MotionOptions::default().position(true).linear(true)
        };
        let handler = MotionHandler::new(&options, None, &main, None);
        let mut line = prepared(r"{\org(1,1)\pos(0,0)}x");
        line.has_org = true;
        assert!(!handler.use_linear(&line));
        line.has_org = false;
        assert!(handler.use_linear(&line));

        let clips = MotionOptions::default().position(true).clips(true).linear(true);
        let handler = MotionHandler::new(&clips, None, &main, None);
        line.has_clip = true;
        assert!(!handler.use_linear(&line));
    }
}
