//! 2D raster drawing context.
//!
//! A `tiny-skia` pixmap stands in for a canvas element's 2D context. The
//! pixel data is premultiplied RGBA8.

mod blur;
mod canvas;

pub use blur::box_blur;
pub use canvas::{skia_color, RasterCanvas};
