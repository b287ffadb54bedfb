use anyhow::{Context, Result};
use backdrop_engine::coords::Extent;
use backdrop_engine::paint::{Palette, Rgb};
use backdrop_engine::raster::skia_color;
use backdrop_engine::surface::SurfaceHandle;
use tiny_skia::{GradientStop, LinearGradient, Paint, Point, Rect, SpreadMode, Transform};

use crate::config::EffectConfig;
use crate::motion::{sample_keyframes, Easing, Timeline};

/// Horizontal pixels per beam.
pub const BEAM_SPACING_PX: u32 = 100;

/// Height of the visible light strip of each beam.
pub const STRIP_HEIGHT_PX: f32 = 128.0;

const BEAM_OPACITY: [f32; 4] = [0.0, 1.0, 1.0, 0.0];

/// One beam: where it falls, how it is tilted and when.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Beam {
    /// Left edge as a percentage of the container width.
    pub x_percent: f32,
    pub rotate_deg: f32,
    pub timeline: Timeline,
}

/// Number of beams for a container width.
pub fn beam_count(width: u32) -> usize {
    (width / BEAM_SPACING_PX) as usize
}

/// Draws `count` beams. Each value is drawn once; nothing re-randomizes later.
pub fn generate_beams(count: usize, rng: &mut fastrand::Rng) -> Vec<Beam> {
    (0..count)
        .map(|i| {
            let x_percent = i as f32 / count as f32 * 100.0 + rng.f32() * 10.0;
            let duration = 4.0 + rng.f32() * 8.0;
            let delay = rng.f32() * 4.0;
            let rotate_deg = -5.0 + rng.f32() * 10.0;
            Beam {
                x_percent,
                rotate_deg,
                timeline: Timeline::new(duration, delay),
            }
        })
        .collect()
}

/// Falling vertical light beams plus a faint line along the bottom edge.
pub struct VectorBeamField {
    beams: Vec<Beam>,
    playback_rate: f32,
    accent: Rgb,
    highlight: Rgb,
    initialized: bool,
}

impl Default for VectorBeamField {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorBeamField {
    pub fn new() -> Self {
        let palette = Palette::default();
        Self {
            beams: Vec::new(),
            playback_rate: 1.0,
            accent: palette.source(),
            highlight: palette.source().lighten(0.25),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    /// Beam count follows the container width at mount; later resizes keep
    /// the same beams.
    pub fn init(
        &mut self,
        surface: &SurfaceHandle,
        config: &EffectConfig,
        palette: &Palette,
    ) -> Result<()> {
        let canvas = surface
            .raster()
            .context("beam field needs a raster surface")?;

        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        self.beams = generate_beams(beam_count(canvas.size().width), &mut rng);
        self.playback_rate = config.speed;
        self.accent = palette.source();
        self.highlight = palette.source().lighten(0.25);
        self.initialized = true;

        log::debug!("beam field generated {} beams", self.beams.len());
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
        let t = (elapsed_ms / 1000.0) as f32 * self.playback_rate;
        let pixmap = canvas.pixmap_mut();

        for beam in &self.beams {
            let Some(progress) = beam.timeline.progress(t) else {
                continue;
            };
            let opacity = sample_keyframes(&BEAM_OPACITY, progress, Easing::Linear);
            if opacity <= 0.0 {
                continue;
            }

            // The beam element spans the full height and falls from -100 %
            // to 200 % of it; the strip sits at its top.
            let x = beam.x_percent / 100.0 * width;
            let offset_y = (-1.0 + 3.0 * progress) * height;
            let transform = Transform::from_translate(0.0, offset_y)
                .pre_concat(Transform::from_rotate_at(beam.rotate_deg, x + 0.5, height / 2.0));

            let Some(rect) = Rect::from_xywh(x, 0.0, 1.0, STRIP_HEIGHT_PX) else {
                continue;
            };
            let Some(shader) = LinearGradient::new(
                Point::from_xy(x, 0.0),
                Point::from_xy(x, STRIP_HEIGHT_PX),
                vec![
                    GradientStop::new(0.0, skia_color(self.accent, 0.0)),
                    GradientStop::new(1.0 / 3.0, skia_color(self.accent, 0.5 * opacity)),
                    GradientStop::new(2.0 / 3.0, skia_color(self.highlight, 0.8 * opacity)),
                    GradientStop::new(1.0, skia_color(self.highlight, 0.0)),
                ],
                SpreadMode::Pad,
                Transform::identity(),
            ) else {
                continue;
            };

            let paint = Paint {
                shader,
                anti_alias: true,
                ..Paint::default()
            };
            pixmap.fill_rect(rect, &paint, transform, None);
        }

        draw_collision_line(pixmap, self.accent, width, height);
        Ok(())
    }

    /// Beams are laid out in percentages; nothing to recompute.
    pub fn resize(&mut self, _size: Extent) {}

    pub fn dispose(&mut self) -> Result<()> {
        self.beams.clear();
        self.initialized = false;
        Ok(())
    }
}

/// 1 px line along the bottom, fading in toward the middle.
fn draw_collision_line(pixmap: &mut tiny_skia::Pixmap, accent: Rgb, width: f32, height: f32) {
    let Some(rect) = Rect::from_xywh(0.0, height - 1.0, width, 1.0) else {
        return;
    };
    let Some(shader) = LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(width, 0.0),
        vec![
            GradientStop::new(0.0, skia_color(accent, 0.0)),
            GradientStop::new(0.5, skia_color(accent, 0.2)),
            GradientStop::new(1.0, skia_color(accent, 0.0)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    ) else {
        return;
    };
    let paint = Paint {
        shader,
        ..Paint::default()
    };
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}
