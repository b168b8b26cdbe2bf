//! Override tag registry and typed tag values
//!
//! The registry drives every text pass of the engine: deduplication walks
//! the global and repeatable tags, tag completion inserts style defaults for
//! missing tags, and transform interpolation reads the transformable set.
//!
//! # Modules
//!
//! - [`registry`] - `TagDef` table, flags and the shared `registry()` singleton
//! - [`value`] - `TagKind`/`TagValue` parsing, formatting and interpolation

pub mod registry;
pub mod value;

pub use registry::{
    registry, tag, StyleField, TagDef, TagFlags, TagId, TagMatch, TagRegistry,
    CONFLICTING_PAIRS,
};
pub use value::{TagKind, TagValue};
