//! Coordinate and size types shared by the surfaces and the effect backends.
//!
//! Canonical CPU space:
//! - Physical pixels of the drawing surface
//! - Origin top-left
//! - +X right, +Y down

mod extent;
mod vec2;

pub use extent::Extent;
pub use vec2::Vec2;
