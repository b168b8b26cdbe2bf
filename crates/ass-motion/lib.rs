//! # ASS-RS Motion
//!
//! Motion-tracking tag transform engine for ASS (Advanced `SubStation` Alpha)
//! subtitles. Takes per-frame tracking data exported from motion-tracking
//! tools and rewrites the override tags of subtitle lines so positioned and
//! clipped text follows the tracked object across the video.
//!
//! ## Features
//!
//! - **Tracking data**: After Effects keyframe text and Shake rotoshape clip paths
//! - **Two output modes**: one line with `\move` and `\t`, or one line per frame
//! - **Tag normalization**: deduplication, missing-tag completion from styles,
//!   `\r` reset handling and `\t` isolation through substitution slots
//! - **Transform baking**: `\t` and `\fade` evaluated to literal per-frame values
//! - **Option persistence**: camelCase JSON via `serde` (default feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use ass_motion::{ConstantFrameRate, Dialogue, MotionOptions, MotionProcessor, Style};
//!
//! let data = "Adobe After Effects 6.0 Keyframe Data\n\
//!             \tUnits Per Second\t25\n\
//!             \tSource Width\t100\n\
//!             \tSource Height\t100\n\
//!             Position\n\
//!             \tFrame\tX pixels\tY pixels\n\
//!             \t1\t0\t0\n\
//!             \t2\t10\t0\n\
//!             End of Keyframe Data\n";
//!
//! let styles = vec![Style { alignment: 7, margin_l: 0, margin_r: 0, margin_v: 0, ..Style::default() }];
//! let fps = ConstantFrameRate::new(25, 1);
//! let options = MotionOptions::default().position(true).linear(true);
//!
//! let outcome = MotionProcessor::new(&fps, &styles, 100.0, 100.0, options)
//!     .apply(&[Dialogue::new(0, 80, "Default", "Hello")], data, None)?;
//!
//! assert_eq!(outcome.lines[0].text, r"{\move(0,0,10,0,20,60)}Hello");
//! # Ok::<(), ass_motion::MotionError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]

pub mod config;
pub mod data;
pub mod motion;
pub mod script;
pub mod tags;
pub mod utils;

pub use config::{ClipTrackOptions, MotionConfig, MotionOptions};
pub use data::{Channels, DataHandler, FrameState, TrackingData};
pub use motion::{ApplyOutcome, MotionHandler, MotionLine, MotionProcessor, Transform};
pub use script::{ConstantFrameRate, Dialogue, FrameTimeFns, FrameTimes, Style, StyleLookup};
pub use tags::{registry, TagId, TagValue};
pub use utils::{MotionError, Result};

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
