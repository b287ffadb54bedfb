//! Compact vector path descriptions reduced to point sequences.
//!
//! Only endpoint density matters to the effects that consume these paths, so
//! every coordinate pair is kept as a polyline vertex and curve control
//! points are not evaluated.

mod parse;

pub use parse::{parse_path, PathSet, MIN_DRAWABLE_POINTS};
