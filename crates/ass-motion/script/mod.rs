//! Document-model collaborators
//!
//! The motion engine does not parse or write subtitle files. These types are
//! the narrow boundary it needs from the editor around it:
//!
//! - [`event`] - `Dialogue` records going in and out of an apply operation
//! - [`style`] - `Style` defaults and the `StyleLookup` trait
//! - [`timing`] - `FrameTimes` frame/millisecond conversion

pub mod event;
pub mod style;
pub mod timing;

pub use event::Dialogue;
pub use style::{Style, StyleLookup};
pub use timing::{ConstantFrameRate, FrameTimeFns, FrameTimes};
