//! Tracking data: parsing, reference frames and per-frame state
//!
//! A [`DataHandler`] owns one parsed tracking data set for the duration of an
//! apply operation. After parsing, the caller picks a reference frame; every
//! later query reports the tracked state of a frame relative to it.
//!
//! # Formats
//!
//! - [`keyframes`] - After Effects keyframe text (position/scale/rotation)
//! - [`rotoshape`] - Shake rotoshape text (one clip drawing per frame)
//!
//! # Example
//!
//! ```rust
//! use ass_motion::data::DataHandler;
//!
//! let text = "Adobe After Effects 6.0 Keyframe Data\n\
//!             \tSource Width\t100\n\tSource Height\t100\n\
//!             Position\n\t0\t0\t0\n\t1\t10\t0\n\
//!             End of Keyframe Data\n";
//!
//! let mut data = DataHandler::new();
//! assert!(data.best_effort_parse(text, 100.0, 100.0));
//! assert!(data.check_length(2));
//!
//! data.add_reference_frame(1);
//! let state = data.calculate_current_state(2);
//! assert_eq!(state.x_current - state.x_start, 10.0);
//! ```

pub mod keyframes;
pub mod rotoshape;

use std::path::Path;

use log::debug;

pub use keyframes::{is_keyframe_data, parse_keyframes, KeyframeSeries, Sample};
pub use rotoshape::{is_rotoshape_data, parse_rotoshape};

use crate::utils::{MotionError, Result};

bitflags::bitflags! {
    /// Tracking channels an operation applies
    ///
    /// Channels left out are flattened by [`DataHandler::strip_fields`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Channels: u8 {
        const X_POSITION = 1 << 0;
        const Y_POSITION = 1 << 1;
        const Z_POSITION = 1 << 2;
        const SCALE = 1 << 3;
        const X_ROTATION = 1 << 4;
        const Y_ROTATION = 1 << 5;
        const Z_ROTATION = 1 << 6;
    }
}

/// Parsed tracking data
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingData {
    /// Numeric position/scale/rotation channels
    Keyframes(KeyframeSeries),
    /// Pre-rendered clip drawings, one per frame
    Drawings(Vec<String>),
}

/// Tracked state of one frame relative to the reference frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub x_start: f64,
    pub y_start: f64,
    pub z_start: f64,
    pub x_current: f64,
    pub y_current: f64,
    pub z_current: f64,
    /// Current x scale over reference x scale
    pub x_ratio: f64,
    /// Current y scale over reference y scale
    pub y_ratio: f64,
    pub x_rotation_diff: f64,
    pub y_rotation_diff: f64,
    pub z_rotation_diff: f64,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            x_start: 0.0,
            y_start: 0.0,
            z_start: 0.0,
            x_current: 0.0,
            y_current: 0.0,
            z_current: 0.0,
            x_ratio: 1.0,
            y_ratio: 1.0,
            x_rotation_diff: 0.0,
            y_rotation_diff: 0.0,
            z_rotation_diff: 0.0,
        }
    }
}

/// One tracking data set plus its reference and current frame state
#[derive(Debug, Clone, Default)]
pub struct DataHandler {
    data: Option<TrackingData>,
    reference: usize,
    start: Sample,
    state: FrameState,
}

impl DataHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `input` as literal data, or as a path to a data file
    ///
    /// # Errors
    ///
    /// Returns `MotionError::DataParse` if no supported format matches.
    pub fn parse(input: &str, res_x: f64, res_y: f64) -> Result<Self> {
        let mut handler = Self::new();
        if handler.best_effort_parse(input, res_x, res_y) {
            Ok(handler)
        } else {
            Err(MotionError::data_parse(
                "input is neither keyframe data, rotoshape data nor a readable data file",
            ))
        }
    }

    /// Try every supported format, then retry them on `input` read as a path
    pub fn best_effort_parse(&mut self, input: &str, res_x: f64, res_y: f64) -> bool {
        if self.parse_text(input, res_x, res_y) {
            return true;
        }

        let path = input.trim();
        if path.is_empty() || path.contains('\n') {
            return false;
        }
        match std::fs::read_to_string(Path::new(path)) {
            Ok(contents) => {
                debug!("reading tracking data from {path}");
                self.parse_text(&contents, res_x, res_y)
            }
            Err(err) => {
                debug!("tracking data is not a readable path: {err}");
                false
            }
        }
    }

    fn parse_text(&mut self, text: &str, res_x: f64, res_y: f64) -> bool {
        let parsed = if is_keyframe_data(text) {
            parse_keyframes(text, res_x, res_y).map(TrackingData::Keyframes)
        } else if is_rotoshape_data(text) {
            parse_rotoshape(text, res_y).map(TrackingData::Drawings)
        } else {
            return false;
        };

        match parsed {
            Ok(data) => {
                debug!(
                    "parsed {} frames of {} data",
                    data_len(&data),
                    if matches!(data, TrackingData::Keyframes(_)) { "keyframe" } else { "rotoshape" }
                );
                self.data = Some(data);
                true
            }
            Err(err) => {
                debug!("{err}");
                false
            }
        }
    }

    /// Parsed data, if any
    #[must_use]
    pub const fn data(&self) -> Option<&TrackingData> {
        self.data.as_ref()
    }

    /// Keyframe channels, if this is numeric data
    #[must_use]
    pub const fn keyframes(&self) -> Option<&KeyframeSeries> {
        match &self.data {
            Some(TrackingData::Keyframes(series)) => Some(series),
            _ => None,
        }
    }

    /// Number of frames in the data
    #[must_use]
    pub fn length(&self) -> usize {
        self.data.as_ref().map_or(0, data_len)
    }

    /// Whether the data is a drawing-path series
    #[must_use]
    pub const fn is_drawing(&self) -> bool {
        matches!(self.data, Some(TrackingData::Drawings(_)))
    }

    /// Drawing for a 1-based frame index
    #[must_use]
    pub fn drawing_for(&self, frame: usize) -> Option<&str> {
        match &self.data {
            Some(TrackingData::Drawings(drawings)) => {
                drawings.get(frame.checked_sub(1)?).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Whether the data covers exactly `total_frames`
    #[must_use]
    pub fn check_length(&self, total_frames: usize) -> bool {
        self.length() == total_frames
    }

    /// Reverse the frame order in place
    pub fn reverse_data(&mut self) {
        match &mut self.data {
            Some(TrackingData::Keyframes(series)) => series.reverse(),
            Some(TrackingData::Drawings(drawings)) => drawings.reverse(),
            None => {}
        }
    }

    /// Use a 1-based frame as the baseline for later state queries
    ///
    /// Out-of-range frames are clamped. Drawing data has no numeric baseline.
    pub fn add_reference_frame(&mut self, frame: usize) {
        let Some(series) = self.keyframes() else {
            return;
        };
        let index = clamp_index(frame, series.len());
        self.start = series.sample(index);
        self.reference = index + 1;
    }

    /// Reference frame chosen by [`add_reference_frame`](Self::add_reference_frame)
    #[must_use]
    pub const fn reference_frame(&self) -> usize {
        self.reference
    }

    /// State of a 1-based frame relative to the reference frame
    #[must_use]
    pub fn state_at(&self, frame: usize) -> FrameState {
        let Some(series) = self.keyframes() else {
            return FrameState::default();
        };
        let current = series.sample(clamp_index(frame, series.len()));
        let start = &self.start;

        FrameState {
            x_start: start.x,
            y_start: start.y,
            z_start: start.z,
            x_current: current.x,
            y_current: current.y,
            z_current: current.z,
            x_ratio: ratio(current.x_scale, start.x_scale),
            y_ratio: ratio(current.y_scale, start.y_scale),
            x_rotation_diff: current.x_rotation - start.x_rotation,
            y_rotation_diff: current.y_rotation - start.y_rotation,
            z_rotation_diff: current.z_rotation - start.z_rotation,
        }
    }

    /// Recompute and store the state of a 1-based frame
    pub fn calculate_current_state(&mut self, frame: usize) -> FrameState {
        self.state = self.state_at(frame);
        self.state
    }

    /// State stored by the last [`calculate_current_state`](Self::calculate_current_state)
    #[must_use]
    pub const fn current_state(&self) -> &FrameState {
        &self.state
    }

    /// Flatten every channel not in `keep` to its reference value
    ///
    /// Later deltas and ratios for a flattened channel are then no-ops.
    pub fn strip_fields(&mut self, keep: Channels) {
        let start = self.start;
        let Some(TrackingData::Keyframes(series)) = &mut self.data else {
            return;
        };

        let flatten = |channel: &mut Vec<f64>, value: f64| channel.iter_mut().for_each(|v| *v = value);
        if !keep.contains(Channels::X_POSITION) {
            flatten(&mut series.x_position, start.x);
        }
        if !keep.contains(Channels::Y_POSITION) {
            flatten(&mut series.y_position, start.y);
        }
        if !keep.contains(Channels::Z_POSITION) {
            flatten(&mut series.z_position, start.z);
        }
        if !keep.contains(Channels::SCALE) {
            flatten(&mut series.x_scale, start.x_scale);
            flatten(&mut series.y_scale, start.y_scale);
        }
        if !keep.contains(Channels::X_ROTATION) {
            flatten(&mut series.x_rotation, start.x_rotation);
        }
        if !keep.contains(Channels::Y_ROTATION) {
            flatten(&mut series.y_rotation, start.y_rotation);
        }
        if !keep.contains(Channels::Z_ROTATION) {
            flatten(&mut series.z_rotation, start.z_rotation);
        }
    }
}

fn data_len(data: &TrackingData) -> usize {
    match data {
        TrackingData::Keyframes(series) => series.len(),
        TrackingData::Drawings(drawings) => drawings.len(),
    }
}

fn clamp_index(frame: usize, len: usize) -> usize {
    frame.clamp(1, len.max(1)) - 1
}

fn ratio(current: f64, start: f64) -> f64 {
    if start == 0.0 {
        1.0
    } else {
        current / start
    }
}
