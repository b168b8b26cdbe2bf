//! Option structs for an apply operation
//!
//! Both structs serialize with camelCase keys. Missing keys keep their
//! defaults and unknown keys are ignored, so option files written by older
//! or newer versions still load.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::Channels;

/// Options for applying main tracking data
///
/// # Examples
///
/// ```rust
/// use ass_motion::config::MotionOptions;
///
/// let options = MotionOptions::default()
///     .position(true)
///     .scale(true)
///     .linear(true);
///
/// assert!(options.x_position && options.y_position);
/// assert!(options.relative);
/// assert_eq!(options.start_frame, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
#[allow(clippy::struct_excessive_bools)]
pub struct MotionOptions {
    pub x_position: bool,
    pub y_position: bool,
    /// Track `\org` as well as `\pos`
    pub origin: bool,
    /// Write the raw tracked position instead of offsetting the line's own
    pub abs_pos: bool,
    /// Track `\fscx`/`\fscy`
    pub x_scale: bool,
    pub border: bool,
    pub shadow: bool,
    pub blur: bool,
    /// How strongly blur follows scale (1.0 = proportionally)
    pub blur_scale: f64,
    pub x_rotation: bool,
    pub y_rotation: bool,
    pub z_rotation: bool,
    pub z_position: bool,
    pub rect_clip: bool,
    pub vect_clip: bool,
    /// Convert rectangular clips to vector clips before tracking
    pub rc_to_vc: bool,
    /// Bake `\t` and fades into literal per-frame values
    pub kill_trans: bool,
    /// Emit one line with `\move`/`\t` instead of one line per frame
    pub linear: bool,
    /// Only transform clips
    pub clip_only: bool,
    /// `start_frame` counts from the first tracked frame rather than the video
    pub relative: bool,
    pub start_frame: i64,
    pub reverse_tracking: bool,
    /// Decimal places for positions and clip coordinates
    pub pos_round: u32,
    /// Decimal places for scale, border, shadow and blur
    pub scale_round: u32,
    /// Decimal places for rotations
    pub rot_round: u32,
}

impl Default for MotionOptions {
    fn default() -> Self {
        Self {
            x_position: false,
            y_position: false,
            origin: false,
            abs_pos: false,
            x_scale: false,
            border: false,
            shadow: false,
            blur: false,
            blur_scale: 1.0,
            x_rotation: false,
            y_rotation: false,
            z_rotation: false,
            z_position: false,
            rect_clip: false,
            vect_clip: false,
            rc_to_vc: false,
            kill_trans: false,
            linear: false,
            clip_only: false,
            relative: true,
            start_frame: 1,
            reverse_tracking: false,
            pos_round: 2,
            scale_round: 2,
            rot_round: 2,
        }
    }
}

impl MotionOptions {
    /// Track both position axes
    #[must_use]
    pub const fn position(mut self, enabled: bool) -> Self {
        self.x_position = enabled;
        self.y_position = enabled;
        self
    }

    /// Track scale together with border, shadow and blur
    #[must_use]
    pub const fn scale(mut self, enabled: bool) -> Self {
        self.x_scale = enabled;
        self.border = enabled;
        self.shadow = enabled;
        self.blur = enabled;
        self
    }

    /// Track z rotation
    #[must_use]
    pub const fn rotation(mut self, enabled: bool) -> Self {
        self.z_rotation = enabled;
        self
    }

    /// Track rectangular and vector clips
    #[must_use]
    pub const fn clips(mut self, enabled: bool) -> Self {
        self.rect_clip = enabled;
        self.vect_clip = enabled;
        self
    }

    #[must_use]
    pub const fn linear(mut self, enabled: bool) -> Self {
        self.linear = enabled;
        self
    }

    #[must_use]
    pub const fn kill_trans(mut self, enabled: bool) -> Self {
        self.kill_trans = enabled;
        self
    }

    #[must_use]
    pub const fn clip_only(mut self, enabled: bool) -> Self {
        self.clip_only = enabled;
        self
    }

    /// Replace `\pos` with the tracked point instead of moving it
    #[must_use]
    pub const fn abs_pos(mut self, enabled: bool) -> Self {
        self.abs_pos = enabled;
        self
    }

    /// Reference frame and how to read it
    #[must_use]
    pub const fn start_frame(mut self, frame: i64, relative: bool) -> Self {
        self.start_frame = frame;
        self.relative = relative;
        self
    }

    #[must_use]
    pub const fn reverse_tracking(mut self, enabled: bool) -> Self {
        self.reverse_tracking = enabled;
        self
    }

    /// Whether any clip form is tracked with the main data
    #[must_use]
    pub const fn tracks_clips(&self) -> bool {
        self.rect_clip || self.vect_clip || self.rc_to_vc
    }

    /// Channels the main data must keep
    #[must_use]
    pub fn channels(&self) -> Channels {
        let mut channels = Channels::empty();
        channels.set(Channels::X_POSITION, self.x_position);
        channels.set(Channels::Y_POSITION, self.y_position);
        channels.set(Channels::Z_POSITION, self.z_position);
        channels.set(
            Channels::SCALE,
            self.x_scale || self.border || self.shadow || self.blur,
        );
        channels.set(Channels::X_ROTATION, self.x_rotation);
        channels.set(Channels::Y_ROTATION, self.y_rotation);
        channels.set(Channels::Z_ROTATION, self.z_rotation);
        channels
    }

    /// Options with derived fields resolved
    ///
    /// Rect-to-vector conversion needs both clip forms tracked.
    #[must_use]
    pub const fn normalized(mut self) -> Self {
        if self.rc_to_vc {
            self.rect_clip = true;
            self.vect_clip = true;
        }
        self
    }
}

/// Options for applying separate clip tracking data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
#[allow(clippy::struct_excessive_bools)]
pub struct ClipTrackOptions {
    pub x_position: bool,
    pub y_position: bool,
    pub x_scale: bool,
    pub z_rotation: bool,
    pub rect_clip: bool,
    pub vect_clip: bool,
    pub rc_to_vc: bool,
    pub relative: bool,
    pub start_frame: i64,
    pub reverse_tracking: bool,
}

impl Default for ClipTrackOptions {
    fn default() -> Self {
        Self {
            x_position: true,
            y_position: true,
            x_scale: true,
            z_rotation: true,
            rect_clip: true,
            vect_clip: true,
            rc_to_vc: false,
            relative: true,
            start_frame: 1,
            reverse_tracking: false,
        }
    }
}

impl ClipTrackOptions {
    /// Channels the clip data must keep
    #[must_use]
    pub fn channels(&self) -> Channels {
        let mut channels = Channels::empty();
        channels.set(Channels::X_POSITION, self.x_position);
        channels.set(Channels::Y_POSITION, self.y_position);
        channels.set(Channels::SCALE, self.x_scale);
        channels.set(Channels::Z_ROTATION, self.z_rotation);
        channels
    }

    /// Options with derived fields resolved
    #[must_use]
    pub const fn normalized(mut self) -> Self {
        if self.rc_to_vc {
            self.rect_clip = true;
            self.vect_clip = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = MotionOptions::default();
        assert!(options.relative);
        assert_eq!(options.start_frame, 1);
        assert_eq!(options.blur_scale, 1.0);
        assert!(!options.linear);
        assert_eq!(options.channels(), Channels::empty());
    }

    #[test]
    fn channels_follow_options() {
        let options = MotionOptions::default().position(true).scale(true);
        let channels = options.channels();
        assert!(channels.contains(Channels::X_POSITION | Channels::Y_POSITION | Channels::SCALE));
        assert!(!channels.contains(Channels::Z_ROTATION));

        let clip = ClipTrackOptions {
            x_scale: false,
            ..ClipTrackOptions::default()
        };
        assert!(!clip.channels().contains(Channels::SCALE));
    }

    #[test]
    fn rect_to_vector_forces_both_clips() {
        let options = MotionOptions {
            rc_to_vc: true,
            ..MotionOptions::default()
        }
        .normalized();
        assert!(options.rect_clip && options.vect_clip);

        let clip = ClipTrackOptions {
            rc_to_vc: true,
            rect_clip: false,
            vect_clip: false,
            ..ClipTrackOptions::default()
        }
        .normalized();
        assert!(clip.rect_clip && clip.vect_clip);
    }
}
