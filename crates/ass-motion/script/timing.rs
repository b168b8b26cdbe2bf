//! Frame/time conversion collaborator
//!
//! The engine never decodes video. It asks a `FrameTimes` implementation
//! which frame is on screen at a given millisecond and when a frame starts.

/// Video timebase conversion
pub trait FrameTimes {
    /// Frame displayed at `ms`
    fn frame_from_ms(&self, ms: i64) -> i64;

    /// Start time of `frame` in milliseconds
    fn ms_from_frame(&self, frame: i64) -> i64;
}

/// Constant frame rate timebase expressed as a rational
///
/// # Examples
///
/// ```rust
/// use ass_motion::script::{ConstantFrameRate, FrameTimes};
///
/// let fps = ConstantFrameRate::new(25, 1);
/// assert_eq!(fps.ms_from_frame(3), 120);
/// assert_eq!(fps.frame_from_ms(119), 2);
/// assert_eq!(fps.frame_from_ms(120), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantFrameRate {
    numerator: i64,
    denominator: i64,
}

impl ConstantFrameRate {
    /// Create a timebase of `numerator / denominator` frames per second
    ///
    /// A zero component is replaced with one.
    #[must_use]
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator: i64::from(numerator.max(1)),
            denominator: i64::from(denominator.max(1)),
        }
    }

    /// Frames per second as a float
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl FrameTimes for ConstantFrameRate {
    fn frame_from_ms(&self, ms: i64) -> i64 {
        let mut frame = (ms * self.numerator).div_euclid(1000 * self.denominator);
        // ms_from_frame floors, so the estimate can trail by one frame
        while self.ms_from_frame(frame + 1) <= ms {
            frame += 1;
        }
        while frame > 0 && self.ms_from_frame(frame) > ms {
            frame -= 1;
        }
        frame
    }

    fn ms_from_frame(&self, frame: i64) -> i64 {
        (frame * 1000 * self.denominator).div_euclid(self.numerator)
    }
}

/// Timebase built from two conversion closures
pub struct FrameTimeFns<F, G> {
    /// Millisecond to frame conversion
    pub frame_from_ms: F,
    /// Frame to millisecond conversion
    pub ms_from_frame: G,
}

impl<F, G> FrameTimes for FrameTimeFns<F, G>
where
    F: Fn(i64) -> i64,
    G: Fn(i64) -> i64,
{
    fn frame_from_ms(&self, ms: i64) -> i64 {
        (self.frame_from_ms)(ms)
    }

    fn ms_from_frame(&self, frame: i64) -> i64 {
        (self.ms_from_frame)(frame)
    }
}
