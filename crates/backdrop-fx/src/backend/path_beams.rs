use anyhow::{Context, Result};
use backdrop_engine::coords::{Extent, Vec2};
use backdrop_engine::paint::{Palette, Rgb};
use backdrop_engine::path::PathSet;
use backdrop_engine::raster::skia_color;
use backdrop_engine::surface::SurfaceHandle;
use tiny_skia::{GradientStop, LinearGradient, Paint, PathBuilder, Point, SpreadMode, Stroke, Transform};

use crate::config::EffectConfig;
use crate::motion::{sample_keyframes, Easing, Timeline};

/// Ten parallel sweeping curves, authored in a 696x316 view box.
pub const SWEEP_PATHS: [&str; 10] = [
    "M-380 -189C-380 -189 -312 216 152 343C616 470 684 875 684 875",
    "M-373 -197C-373 -197 -305 208 159 335C623 462 691 867 691 867",
    "M-366 -205C-366 -205 -298 200 166 327C630 454 698 859 698 859",
    "M-359 -213C-359 -213 -291 192 173 319C637 446 705 851 705 851",
    "M-352 -221C-352 -221 -284 184 180 311C644 438 712 843 712 843",
    "M-345 -229C-345 -229 -277 176 187 303C651 430 719 835 719 835",
    "M-338 -237C-338 -237 -270 168 194 295C658 422 726 827 726 827",
    "M-331 -245C-331 -245 -263 160 201 287C665 414 733 819 733 819",
    "M-324 -253C-324 -253 -256 152 208 279C672 406 740 811 740 811",
    "M-317 -261C-317 -261 -249 144 215 271C679 398 747 803 747 803",
];

const VIEW_BOX_WIDTH: f32 = 696.0;
const VIEW_BOX_HEIGHT: f32 = 316.0;

/// Opacity over one cycle, eased per segment.
pub const SWEEP_OPACITY: [f32; 5] = [0.0, 0.3, 0.6, 0.3, 0.0];

const STROKE_WIDTH: f32 = 0.5;
const STROKE_OPACITY: f32 = 0.1;

const CYAN: Rgb = Rgb::from_u8(0x18, 0xcc, 0xfc);
const VIOLET: Rgb = Rgb::from_u8(0x63, 0x44, 0xf5);
const PURPLE: Rgb = Rgb::from_u8(0xae, 0x48, 0xff);

/// Cycle of path `index`: each path runs half a second longer and starts
/// 0.3 s later than the previous one.
pub fn sweep_timeline(index: usize) -> Timeline {
    Timeline::new(4.0 + index as f32 * 0.5, index as f32 * 0.3)
}

/// Drawn fraction and opacity at cycle `progress`.
pub fn sweep_frame(progress: f32) -> (f32, f32) {
    let length = Easing::EaseInOut.apply(progress.clamp(0.0, 1.0));
    let opacity = sample_keyframes(&SWEEP_OPACITY, progress, Easing::EaseInOut);
    (length, opacity)
}

/// Maps the view box onto `size`, covering it and centered (`slice`).
pub fn view_box_transform(size: Extent) -> Transform {
    let (w, h) = (size.width as f32, size.height as f32);
    let s = (w / VIEW_BOX_WIDTH).max(h / VIEW_BOX_HEIGHT);
    let tx = (w - VIEW_BOX_WIDTH * s) / 2.0;
    let ty = (h - VIEW_BOX_HEIGHT * s) / 2.0;
    Transform::from_row(s, 0.0, 0.0, s, tx, ty)
}

/// The first `fraction` of the polyline through `points`, by arc length.
pub fn partial_polyline(points: &[Vec2], fraction: f32) -> Vec<Vec2> {
    let total: f32 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let mut budget = total * fraction.clamp(0.0, 1.0);
    let mut out = vec![first];

    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let len = a.distance(b);
        if len <= budget {
            out.push(b);
            budget -= len;
            continue;
        }
        if budget > 0.0 {
            out.push(a.lerp(b, budget / len));
        }
        break;
    }
    out
}

/// Curved beams drawing themselves in along fixed paths, each on its own
/// staggered cycle.
pub struct PathBeamField {
    paths: PathSet,
    timelines: Vec<Timeline>,
    playback_rate: f32,
    initialized: bool,
}

impl Default for PathBeamField {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBeamField {
    pub fn new() -> Self {
        Self {
            paths: PathSet::default(),
            timelines: Vec::new(),
            playback_rate: 1.0,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    /// Colors are fixed; the palette is not used.
    pub fn init(
        &mut self,
        surface: &SurfaceHandle,
        config: &EffectConfig,
        _palette: &Palette,
    ) -> Result<()> {
        surface
            .raster()
            .context("path beams need a raster surface")?;

        self.paths = PathSet::parse_all(SWEEP_PATHS);
        self.timelines = (0..SWEEP_PATHS.len()).map(sweep_timeline).collect();
        self.playback_rate = config.speed;
        self.initialized = true;

        log::debug!("path beams loaded {} paths", self.paths.len());
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
        let transform = view_box_transform(canvas.size());
        let t = (elapsed_ms / 1000.0) as f32 * self.playback_rate;
        let stroke = Stroke {
            width: STROKE_WIDTH,
            ..Stroke::default()
        };
        let pixmap = canvas.pixmap_mut();

        for (index, points) in self.paths.iter() {
            let Some(progress) = self.timelines.get(index).and_then(|tl| tl.progress(t)) else {
                continue;
            };
            let (length, opacity) = sweep_frame(progress);
            let alpha = STROKE_OPACITY * opacity;
            if alpha <= 0.0 {
                continue;
            }

            let visible = partial_polyline(points, length);
            let Some(path) = polyline(&visible) else {
                continue;
            };
            let Some(shader) = sweep_gradient(alpha) else {
                continue;
            };
            let paint = Paint {
                shader,
                anti_alias: true,
                ..Paint::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }
        Ok(())
    }

    /// Blanks the canvas while the host is hidden.
    pub fn suspend(&mut self, surface: &mut SurfaceHandle) {
        if let Some(canvas) = surface.raster_mut() {
            canvas.clear();
        }
    }

    /// The view box transform is taken from the canvas every frame.
    pub fn resize(&mut self, _size: Extent) {}

    pub fn dispose(&mut self) -> Result<()> {
        self.paths.clear();
        self.timelines.clear();
        self.initialized = false;
        Ok(())
    }
}

/// Horizontal ramp across the view box: a hard cyan edge at the left,
/// violet at a third, fading out in purple.
fn sweep_gradient(alpha: f32) -> Option<tiny_skia::Shader<'static>> {
    LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(VIEW_BOX_WIDTH, 0.0),
        vec![
            GradientStop::new(0.0, skia_color(CYAN, 0.0)),
            GradientStop::new(0.0, skia_color(CYAN, alpha)),
            GradientStop::new(0.325, skia_color(VIOLET, alpha)),
            GradientStop::new(1.0, skia_color(PURPLE, 0.0)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
}

fn polyline(points: &[Vec2]) -> Option<tiny_skia::Path> {
    if points.len() < 2 {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(points[0].x, points[0].y);
    for p in &points[1..] {
        pb.line_to(p.x, p.y);
    }
    pb.finish()
}
