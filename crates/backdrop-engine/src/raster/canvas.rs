use anyhow::{Context, Result};
use tiny_skia::Pixmap;

use crate::coords::Extent;
use crate::paint::Rgb;

/// Owned 2D raster context.
///
/// Sized in physical pixels; never smaller than 1x1.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    pixmap: Pixmap,
}

impl RasterCanvas {
    pub fn new(size: Extent) -> Result<Self> {
        let size = size.at_least_one();
        let pixmap = Pixmap::new(size.width, size.height)
            .with_context(|| format!("failed to allocate {}x{} pixmap", size.width, size.height))?;
        Ok(Self { pixmap })
    }

    #[inline]
    pub fn size(&self) -> Extent {
        Extent::new(self.pixmap.width(), self.pixmap.height())
    }

    /// Reallocates the backing pixmap when the size changes.
    ///
    /// Contents are discarded; every backend repaints the full surface on
    /// each frame.
    pub fn resize(&mut self, size: Extent) -> Result<()> {
        let size = size.at_least_one();
        if size == self.size() {
            return Ok(());
        }
        *self = Self::new(size)?;
        Ok(())
    }

    /// Clears to fully transparent.
    #[inline]
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    #[inline]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    #[inline]
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Returns true when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }
}

/// Converts a palette color plus opacity into a `tiny-skia` color.
///
/// Inputs are clamped, so this never fails.
pub fn skia_color(color: Rgb, alpha: f32) -> tiny_skia::Color {
    let c = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    tiny_skia::Color::from_rgba(c(color.r), c(color.g), c(color.b), c(alpha))
        .unwrap_or(tiny_skia::Color::TRANSPARENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_canvas_is_blank_and_at_least_one_pixel() {
        let canvas = RasterCanvas::new(Extent::new(0, 0)).unwrap();
        assert_eq!(canvas.size(), Extent::new(1, 1));
        assert!(canvas.is_blank());
    }

    #[test]
    fn resize_reallocates() {
        let mut canvas = RasterCanvas::new(Extent::new(4, 4)).unwrap();
        canvas.pixmap_mut().fill(tiny_skia::Color::WHITE);
        canvas.resize(Extent::new(8, 2)).unwrap();
        assert_eq!(canvas.size(), Extent::new(8, 2));
        assert!(canvas.is_blank());
    }

    #[test]
    fn skia_color_clamps_inputs() {
        let c = skia_color(Rgb::new(2.0, -1.0, f32::NAN), 3.0);
        assert_eq!(c.red(), 1.0);
        assert_eq!(c.green(), 0.0);
        assert_eq!(c.blue(), 0.0);
        assert_eq!(c.alpha(), 1.0);
    }
}
