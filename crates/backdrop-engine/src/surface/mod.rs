//! Drawing surface lifecycle.
//!
//! A surface is one native drawing context (GPU or 2D raster) plus the
//! drawable element that the host container displays. [`SurfaceLifecycle`]
//! is the only place either is created or destroyed.

mod container;
mod handle;
mod lifecycle;

pub use container::{Container, ElementId, HeadlessContainer};
pub use handle::{NativeContext, SurfaceHandle, SurfaceKind};
pub use lifecycle::{SurfaceLifecycle, SurfaceOptions};
