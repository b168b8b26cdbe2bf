//! Motion application engine
//!
//! # Modules
//!
//! - [`transform`] - `\t(...)` substitution slots and interpolation
//! - [`drawing`] - coordinate rewriting for vector clips
//! - [`line`] - `MotionLine` and the tag text passes
//! - [`handler`] - callback table, linear and per-frame generation
//! - [`processor`] - the complete apply operation

pub mod drawing;
pub mod handler;
pub mod line;
pub mod processor;
pub mod transform;

pub use handler::{position_math, Axis, Callback, FrameContext, MotionHandler, Precision};
pub use line::{deduplicate_tags, default_position, shift_karaoke, MotionLine, MoveRecord};
pub use processor::{combine_identical_lines, resolve_reference_frame, ApplyOutcome, MotionProcessor};
pub use transform::{PriorState, Transform};
