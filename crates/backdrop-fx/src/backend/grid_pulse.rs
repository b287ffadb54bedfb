use anyhow::{Context, Result};
use backdrop_engine::coords::Extent;
use backdrop_engine::paint::{Palette, Rgb};
use backdrop_engine::raster::skia_color;
use backdrop_engine::surface::SurfaceHandle;
use tiny_skia::{Paint, PathBuilder, Rect, Stroke, Transform};

use crate::config::EffectConfig;
use crate::motion::{sample_keyframes, Easing, Timeline};

const CELL_OPACITY: [f32; 3] = [0.0, 0.08, 0.0];
const BORDER_ALPHA: f32 = 0.05;

const SKEW_X_DEG: f32 = -48.0;
const SKEW_Y_DEG: f32 = 14.0;
const GRID_SCALE: f32 = 0.675;
const GRID_SHIFT: f32 = 0.1;

/// Timing of one cell.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub timeline: Timeline,
}

/// Draws `rows * cols` cell timings, row-major. Drawn once per mount.
pub fn generate_cells(rows: u32, cols: u32, rng: &mut fastrand::Rng) -> Vec<Cell> {
    let mut cells = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let duration = 3.0 + rng.f32() * 4.0;
            let delay = rng.f32() * 5.0;
            cells.push(Cell {
                row,
                col,
                timeline: Timeline::new(duration, delay),
            });
        }
    }
    cells
}

/// Maps the flat grid onto the skewed, shrunken plane.
///
/// Equivalent to `skewX(-48deg) skewY(14deg) scale(0.675) translateX(10%)`
/// about the center of a `width` x `height` box.
pub fn grid_transform(width: f32, height: f32) -> Transform {
    let (cx, cy) = (width / 2.0, height / 2.0);
    Transform::from_translate(cx, cy)
        .pre_concat(Transform::from_skew(SKEW_X_DEG.to_radians().tan(), 0.0))
        .pre_concat(Transform::from_skew(0.0, SKEW_Y_DEG.to_radians().tan()))
        .pre_concat(Transform::from_scale(GRID_SCALE, GRID_SCALE))
        .pre_concat(Transform::from_translate(GRID_SHIFT * width, 0.0))
        .pre_concat(Transform::from_translate(-cx, -cy))
}

/// Skewed grid of cells that fade in and out independently.
pub struct GridPulseField {
    cells: Vec<Cell>,
    rows: u32,
    cols: u32,
    color: Rgb,
    playback_rate: f32,
    initialized: bool,
}

impl Default for GridPulseField {
    fn default() -> Self {
        Self::new()
    }
}

impl GridPulseField {
    pub fn new() -> Self {
        let config = EffectConfig::defaults(crate::EffectKind::Boxes);
        Self {
            cells: Vec::new(),
            rows: config.rows,
            cols: config.cols,
            color: config.box_color,
            playback_rate: config.speed,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells use the configured box color; the palette is not consulted.
    pub fn init(
        &mut self,
        surface: &SurfaceHandle,
        config: &EffectConfig,
        _palette: &Palette,
    ) -> Result<()> {
        surface
            .raster()
            .context("grid pulse field needs a raster surface")?;

        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        self.rows = config.rows;
        self.cols = config.cols;
        self.cells = generate_cells(config.rows, config.cols, &mut rng);
        self.color = config.box_color;
        self.playback_rate = config.speed;
        self.initialized = true;

        log::debug!("grid pulse field generated {}x{} cells", self.rows, self.cols);
        Ok(())
    }

    pub fn render_frame(&mut self, surface: &mut SurfaceHandle, elapsed_ms: f64) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        let Some(canvas) = surface.raster_mut() else {
            return Ok(());
        };

        canvas.clear();
        let size = canvas.size();
        let (width, height) = (size.width as f32, size.height as f32);
        let cell_w = width / self.cols.max(1) as f32;
        let cell_h = height / self.rows.max(1) as f32;
        let transform = grid_transform(width, height);
        let t = (elapsed_ms / 1000.0) as f32 * self.playback_rate;
        let pixmap = canvas.pixmap_mut();
        let border = Stroke {
            width: 1.0,
            ..Stroke::default()
        };

        for cell in &self.cells {
            let Some(progress) = cell.timeline.progress(t) else {
                continue;
            };
            let opacity = sample_keyframes(&CELL_OPACITY, progress, Easing::EaseInOut);
            if opacity <= 0.0 {
                continue;
            }

            let x = cell.col as f32 * cell_w;
            let y = cell.row as f32 * cell_h;
            let Some(rect) = Rect::from_xywh(x, y, cell_w, cell_h) else {
                continue;
            };

            let mut fill = Paint::default();
            fill.set_color(skia_color(self.color, opacity));
            pixmap.fill_rect(rect, &fill, transform, None);

            // The border fades with the cell.
            let Some(inner) = Rect::from_xywh(x + 0.5, y + 0.5, cell_w - 1.0, cell_h - 1.0) else {
                continue;
            };
            let outline = PathBuilder::from_rect(inner);
            let mut edge = Paint::default();
            edge.set_color(skia_color(Rgb::white(), BORDER_ALPHA * opacity));
            pixmap.stroke_path(&outline, &edge, &border, transform, None);
        }
        Ok(())
    }

    /// Cells are laid out from the current size every frame.
    pub fn resize(&mut self, _size: Extent) {}

    pub fn dispose(&mut self) -> Result<()> {
        self.cells.clear();
        self.initialized = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_engine::surface::{HeadlessContainer, SurfaceKind, SurfaceLifecycle};

    fn config(rows: u32, cols: u32, seed: u64) -> EffectConfig {
        EffectConfig {
            rows,
            cols,
            seed: Some(seed),
            ..EffectConfig::defaults(crate::EffectKind::Boxes)
        }
    }

    fn mounted(config: &EffectConfig) -> (GridPulseField, SurfaceHandle) {
        let mut container = HeadlessContainer::new(Extent::new(200, 150));
        let surface = SurfaceLifecycle::default()
            .acquire(&mut container, SurfaceKind::Raster)
            .unwrap();
        let mut fx = GridPulseField::new();
        fx.init(&surface, config, &Palette::default()).unwrap();
        (fx, surface)
    }

    #[test]
    fn cell_count_is_rows_times_cols() {
        let (fx, _surface) = mounted(&config(3, 7, 1));
        assert_eq!(fx.cells().len(), 21);
        assert_eq!(fx.cells()[7].row, 1);
        assert_eq!(fx.cells()[7].col, 0);
    }

    #[test]
    fn generated_timings_stay_in_range() {
        let mut rng = fastrand::Rng::with_seed(99);
        for cell in generate_cells(4, 4, &mut rng) {
            assert!((3.0..7.0).contains(&cell.timeline.duration_s));
            assert!((0.0..5.0).contains(&cell.timeline.delay_s));
        }
    }

    #[test]
    fn transform_moves_the_center_by_the_skewed_shift() {
        let t = grid_transform(200.0, 100.0);
        let mut p = [tiny_skia::Point::from_xy(100.0, 50.0)];
        t.map_points(&mut p);
        // translateX(10%) scaled by 0.675, then skewY, then skewX.
        let shift = 0.1 * 200.0 * GRID_SCALE;
        let dy = shift * SKEW_Y_DEG.to_radians().tan();
        let dx = shift + dy * SKEW_X_DEG.to_radians().tan();
        assert!((p[0].x - (100.0 + dx)).abs() < 1e-3);
        assert!((p[0].y - (50.0 + dy)).abs() < 1e-3);
    }

    #[test]
    fn nothing_shows_before_any_delay_elapses_then_cells_pulse() {
        let (mut fx, mut surface) = mounted(&config(4, 4, 5));
        let min_delay = fx
            .cells()
            .iter()
            .map(|c| c.timeline.delay_s)
            .fold(f32::INFINITY, f32::min);
        if min_delay > 0.01 {
            fx.render_frame(&mut surface, 0.0).unwrap();
            assert!(surface.raster().unwrap().is_blank());
        }

        fx.render_frame(&mut surface, 6_500.0).unwrap();
        assert!(!surface.raster().unwrap().is_blank());
    }

    #[test]
    fn render_after_dispose_is_a_noop() {
        let (mut fx, mut surface) = mounted(&config(2, 2, 5));
        fx.dispose().unwrap();
        fx.render_frame(&mut surface, 6_500.0).unwrap();
        assert!(surface.raster().unwrap().is_blank());
    }
}
