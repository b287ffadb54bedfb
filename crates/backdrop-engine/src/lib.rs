//! Backdrop engine crate.
//!
//! This crate owns the drawing surfaces, frame timing and color math used by
//! the effect layer. It knows nothing about individual effects.

pub mod device;
pub mod raster;
pub mod surface;
pub mod time;

pub mod coords;
pub mod logging;
pub mod paint;
pub mod path;
