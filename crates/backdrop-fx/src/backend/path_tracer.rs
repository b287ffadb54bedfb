use anyhow::{Context, Result};
use backdrop_engine::coords::{Extent, Vec2};
use backdrop_engine::paint::{Palette, Rgb};
use backdrop_engine::path::PathSet;
use backdrop_engine::raster::{box_blur, skia_color};
use backdrop_engine::surface::SurfaceHandle;
use tiny_skia::{Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use crate::config::EffectConfig;

/// Flowing curves, authored in a 1440x890 frame.
pub const FLOW_PATHS: [&str; 5] = [
    "M0 663C145.5 663 191 666.265 269 647C326.5 630 339.5 621 397.5 566C439 531.5 455 529.5 490 523C509.664 519.348 521 503.736 538 504.236C553.591 504.236 562.429 514.739 584.66 522.749C592.042 525.408 600.2 526.237 607.356 523.019C624.755 515.195 641.446 496.324 657 496.735C673.408 496.735 693.545 519.572 712.903 526.769C718.727 528.934 725.184 528.395 730.902 525.965C751.726 517.115 764.085 497.106 782 496.735",
    "M0 587.5C147 587.5 277 587.5 310 573.5C348 563 392.5 543.5 408 535C434 523.5 426 526.235 479 515.235C494 512.729 523 510.435 534.5 512.735C554.5 516.735 555.5 523.235 576 523.735C592 523.735 616 496.735 633 497.235C648.671 497.235 661.31 515.052 684.774 524.942C692.004 527.989 700.2 528.738 707.349 525.505",
    "M0 514C147.5 514.333 294.5 513.735 380.5 513.735C405.976 514.94 422.849 515.228 436.37 515.123C477.503 514.803 518.631 506.605 559.508 511.197C564.04 511.706 569.162 512.524 575 513.735C588 516.433 616 521.702 627.5 519.402C647.5 515.402 659 499.235 680.5 499.235",
    "M0 438.5C150.5 438.5 261 438.318 323.5 456.5C351 464.5 387.517 484.001 423.5 494.5C447.371 501.465 472 503.735 487 507.735C503.786 512.212 504.5 516.808 523 518.735C547 521.235 564.814 501.235 584.5 501.235",
    "M0.5 364C145.288 362.349 195 361.5 265.5 378C322 391.223 399.182 457.5 411 467.5C424.176 478.649 456.916 491.677 496.259 502.699C498.746 503.396 501.16 504.304 503.511 505.374C517.104 511.558 541.149 520.911 551.5 521.236",
];

/// Stroke colors, cycled by path index.
pub const TRACE_COLORS: [Rgb; 5] = [
    Rgb::from_u8(0xff, 0xb7, 0xc5),
    Rgb::from_u8(0xff, 0xdd, 0xb7),
    Rgb::from_u8(0xb1, 0xc5, 0xff),
    Rgb::from_u8(0x4f, 0xab, 0xff),
    Rgb::from_u8(0x07, 0x6e, 0xff),
];

const REFERENCE_WIDTH: f32 = 1440.0;
const REFERENCE_HEIGHT: f32 = 890.0;

/// Global progress wraps back to 0 once it passes this value.
pub const PROGRESS_WRAP: f32 = 2.0;

/// Progress lag of each path behind the previous one.
pub const PATH_OFFSET_STEP: f32 = 0.1;

const GLOW_BLUR_RADIUS: u32 = 5;
const GLOW_OPACITY: f32 = 0.3;

/// Global drawing progress in `[0, PROGRESS_WRAP]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProgressCycle {
    value: f32,
    speed: f32,
}

impl ProgressCycle {
    pub fn new(speed: f32) -> Self {
        let speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
        Self { value: 0.0, speed }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Steps once and returns the new value. Never exceeds the wrap point.
    pub fn advance(&mut self) -> f32 {
        self.value += self.speed;
        if self.value > PROGRESS_WRAP {
            self.value = 0.0;
        }
        self.value
    }

    /// Progress of path `index`, lagging by `index * PATH_OFFSET_STEP`.
    pub fn path_progress(&self, index: usize) -> f32 {
        (self.value - index as f32 * PATH_OFFSET_STEP).clamp(0.0, 1.0)
    }

    /// How many of `point_count` points of path `index` are drawn.
    pub fn visible_points(&self, index: usize, point_count: usize) -> usize {
        (point_count as f32 * self.path_progress(index)).floor() as usize
    }
}

/// Draws the flow paths progressively, each twice: a crisp stroke and a
/// blurred glow on top.
pub struct ProceduralPathTracer {
    paths: PathSet,
    progress: ProgressCycle,
    line_width: f32,
    glow: Option<Pixmap>,
    initialized: bool,
}

impl Default for ProceduralPathTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProceduralPathTracer {
    pub fn new() -> Self {
        let config = EffectConfig::defaults(crate::EffectKind::Gemini);
        Self {
            paths: PathSet::default(),
            progress: ProgressCycle::new(config.speed),
            line_width: config.line_width,
            glow: None,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn progress(&self) -> &ProgressCycle {
        &self.progress
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    /// The palette is not used: the trace colors are fixed.
    pub fn init(
        &mut self,
        surface: &SurfaceHandle,
        config: &EffectConfig,
        _palette: &Palette,
    ) -> Result<()> {
        surface
            .raster()
            .context("path tracer needs a raster surface")?;

        self.paths = PathSet::parse_all(FLOW_PATHS);
        self.progress = ProgressCycle::new(config.speed);
        self.line_width = config.line_width;
        self.glow = None;
        self.initialized = true;

        log::debug!("path tracer loaded {} paths", self.paths.len());
        Ok(())
    }

    pub fn render_frame(&mut self, surface: &mut SurfaceHandle, _elapsed_ms: f64) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        let Some(canvas) = surface.raster_mut() else {
            return Ok(());
        };

        self.progress.advance();
        canvas.clear();

        let size = canvas.size();
        let mut glow = match self.glow.take() {
            Some(mut glow) if glow.width() == size.width && glow.height() == size.height => {
                glow.fill(tiny_skia::Color::TRANSPARENT);
                glow
            }
            _ => Pixmap::new(size.width, size.height).context("failed to allocate glow layer")?,
        };

        let scale_x = size.width as f32 / REFERENCE_WIDTH;
        let scale_y = size.height as f32 / REFERENCE_HEIGHT;
        let stroke = Stroke {
            width: self.line_width,
            ..Stroke::default()
        };

        let mut drawn = 0usize;
        for (index, points) in self.paths.iter() {
            let visible = self.progress.visible_points(index, points.len());
            if visible < 2 {
                continue;
            }
            let Some(path) = trace(&points[..visible], scale_x, scale_y) else {
                continue;
            };

            let mut paint = Paint::default();
            paint.set_color(skia_color(TRACE_COLORS[index % TRACE_COLORS.len()], 1.0));
            paint.anti_alias = true;

            canvas
                .pixmap_mut()
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            glow.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            drawn += 1;
        }

        if drawn > 0 {
            box_blur(&mut glow, GLOW_BLUR_RADIUS);
            canvas.pixmap_mut().draw_pixmap(
                0,
                0,
                glow.as_ref(),
                &PixmapPaint {
                    opacity: GLOW_OPACITY,
                    ..PixmapPaint::default()
                },
                Transform::identity(),
                None,
            );
        }

        self.glow = Some(glow);
        Ok(())
    }

    /// The glow layer is reallocated on the next frame.
    pub fn resize(&mut self, _size: Extent) {
        self.glow = None;
    }

    pub fn dispose(&mut self) -> Result<()> {
        self.paths.clear();
        self.glow = None;
        self.initialized = false;
        Ok(())
    }
}

/// Polyline through `points`, scaled from the reference frame.
fn trace(points: &[Vec2], scale_x: f32, scale_y: f32) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    let p = first.scale(scale_x, scale_y);
    pb.move_to(p.x, p.y);
    for point in rest {
        let p = point.scale(scale_x, scale_y);
        pb.line_to(p.x, p.y);
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_engine::surface::{HeadlessContainer, SurfaceKind, SurfaceLifecycle};

    fn raster_surface(width: u32, height: u32) -> (HeadlessContainer, SurfaceHandle) {
        let mut container = HeadlessContainer::new(Extent::new(width, height));
        let handle = SurfaceLifecycle::default()
            .acquire(&mut container, SurfaceKind::Raster)
            .unwrap();
        (container, handle)
    }

    fn fast_config() -> EffectConfig {
        EffectConfig {
            speed: 0.1,
            ..EffectConfig::defaults(crate::EffectKind::Gemini)
        }
    }

    // ── progress ─────────────────────────────────────────────────────────

    #[test]
    fn progress_wraps_to_exactly_zero() {
        let mut cycle = ProgressCycle::new(0.3);
        let mut wrapped = false;
        for _ in 0..100 {
            let v = cycle.advance();
            assert!((0.0..=PROGRESS_WRAP).contains(&v), "read {v}");
            if v == 0.0 {
                wrapped = true;
            }
        }
        assert!(wrapped);
    }

    #[test]
    fn progress_reaching_the_wrap_point_is_kept() {
        let mut cycle = ProgressCycle::new(0.5);
        for _ in 0..4 {
            cycle.advance();
        }
        assert_eq!(cycle.value(), 2.0);
        assert_eq!(cycle.advance(), 0.0);
    }

    #[test]
    fn later_paths_lag_behind() {
        let mut cycle = ProgressCycle::new(0.25);
        cycle.advance();
        assert_eq!(cycle.path_progress(0), 0.25);
        assert!((cycle.path_progress(2) - 0.05).abs() < 1e-6);
        assert_eq!(cycle.path_progress(4), 0.0);
        assert_eq!(cycle.visible_points(0, 10), 2);
        assert_eq!(cycle.visible_points(4, 10), 0);
    }

    #[test]
    fn negative_speed_is_treated_as_stopped() {
        let mut cycle = ProgressCycle::new(-1.0);
        assert_eq!(cycle.advance(), 0.0);
    }

    // ── rendering ────────────────────────────────────────────────────────

    #[test]
    fn built_in_paths_all_parse() {
        let paths = PathSet::parse_all(FLOW_PATHS);
        assert_eq!(paths.len(), FLOW_PATHS.len());
        assert!(paths.iter().all(|(_, p)| p.len() > 10));
    }

    #[test]
    fn first_frames_are_blank_until_enough_points_show() {
        let (_container, mut surface) = raster_surface(144, 89);
        let mut fx = ProceduralPathTracer::new();
        fx.init(&surface, &EffectConfig::defaults(crate::EffectKind::Gemini), &Palette::default())
            .unwrap();

        fx.render_frame(&mut surface, 0.0).unwrap();
        assert!(surface.raster().unwrap().is_blank());
    }

    #[test]
    fn traces_appear_as_progress_grows() {
        let (_container, mut surface) = raster_surface(144, 89);
        let mut fx = ProceduralPathTracer::new();
        fx.init(&surface, &fast_config(), &Palette::default()).unwrap();

        for i in 0..5 {
            fx.render_frame(&mut surface, i as f64 * 33.0).unwrap();
        }
        assert!(!surface.raster().unwrap().is_blank());
    }

    #[test]
    fn dropped_path_does_not_shift_later_colors() {
        let (_container, mut surface) = raster_surface(144, 89);
        let mut fx = ProceduralPathTracer::new();
        let config = EffectConfig {
            speed: 0.6,
            ..EffectConfig::defaults(crate::EffectKind::Gemini)
        };
        fx.init(&surface, &config, &Palette::default()).unwrap();
        fx.paths = PathSet::parse_all(["M7 7", "M0 445 L360 445 L720 445 L1080 445 L1440 445"]);

        fx.render_frame(&mut surface, 0.0).unwrap();
        fx.render_frame(&mut surface, 33.0).unwrap();

        // Second input path: second trace color, not the first.
        let px = surface.raster().unwrap().pixmap().pixel(72, 44).unwrap().demultiply();
        assert!(px.alpha() > 200, "alpha {}", px.alpha());
        assert!(px.green() > 200, "green {}", px.green());
    }

    #[test]
    fn render_before_init_and_after_dispose_is_a_noop() {
        let (_container, mut surface) = raster_surface(64, 64);
        let mut fx = ProceduralPathTracer::new();
        fx.render_frame(&mut surface, 0.0).unwrap();
        assert_eq!(fx.progress().value(), 0.0);

        fx.init(&surface, &fast_config(), &Palette::default()).unwrap();
        fx.dispose().unwrap();
        fx.dispose().unwrap();
        fx.render_frame(&mut surface, 10.0).unwrap();
        assert!(surface.raster().unwrap().is_blank());
    }

    #[test]
    fn resize_is_picked_up_by_next_frame() {
        let (mut container, mut surface) = raster_surface(64, 64);
        let lifecycle = SurfaceLifecycle::default();
        let mut fx = ProceduralPathTracer::new();
        fx.init(&surface, &fast_config(), &Palette::default()).unwrap();
        fx.render_frame(&mut surface, 0.0).unwrap();

        lifecycle.resize(&mut surface, 128, 32).unwrap();
        fx.resize(Extent::new(128, 32));
        fx.render_frame(&mut surface, 33.0).unwrap();

        assert_eq!(surface.raster().unwrap().size(), Extent::new(128, 32));
        lifecycle.release(&mut container, &mut surface).unwrap();
    }
}
