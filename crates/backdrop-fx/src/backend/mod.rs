//! Effect backends.
//!
//! Every variant follows the same contract:
//! - `init` once, after the surface is acquired
//! - `render_frame` any number of times; a no-op before `init`, after
//!   `dispose`, or on a released surface
//! - `resize` between frames; the next frame uses the new size
//! - `dispose` any number of times
//!
//! Backends never own the surface. The controller lends it for each call.

mod beam_field;
mod grid_pulse;
mod path_beams;
mod path_tracer;
mod shader_noise;

pub use beam_field::{beam_count, generate_beams, Beam, VectorBeamField};
pub use grid_pulse::{generate_cells, grid_transform, Cell, GridPulseField};
pub use path_beams::{
    partial_polyline, sweep_frame, sweep_timeline, view_box_transform, PathBeamField, SWEEP_OPACITY,
    SWEEP_PATHS,
};
pub use path_tracer::{
    ProceduralPathTracer, ProgressCycle, FLOW_PATHS, PATH_OFFSET_STEP, PROGRESS_WRAP, TRACE_COLORS,
};
pub use shader_noise::{ShaderNoiseField, TIME_STEP};

use anyhow::Result;
use backdrop_engine::coords::Extent;
use backdrop_engine::paint::Palette;
use backdrop_engine::surface::{SurfaceHandle, SurfaceKind};

use crate::config::{EffectConfig, EffectKind};

/// One concrete rendering strategy.
pub enum EffectBackend {
    ShaderNoiseField(ShaderNoiseField),
    ProceduralPathTracer(ProceduralPathTracer),
    VectorBeamField(VectorBeamField),
    GridPulseField(GridPulseField),
    PathBeamField(PathBeamField),
}

impl EffectBackend {
    pub fn new(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Aurora => EffectBackend::ShaderNoiseField(ShaderNoiseField::new()),
            EffectKind::Gemini => EffectBackend::ProceduralPathTracer(ProceduralPathTracer::new()),
            EffectKind::Beams => EffectBackend::VectorBeamField(VectorBeamField::new()),
            EffectKind::Boxes => EffectBackend::GridPulseField(GridPulseField::new()),
            EffectKind::Trails => EffectBackend::PathBeamField(PathBeamField::new()),
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            EffectBackend::ShaderNoiseField(_) => EffectKind::Aurora,
            EffectBackend::ProceduralPathTracer(_) => EffectKind::Gemini,
            EffectBackend::VectorBeamField(_) => EffectKind::Beams,
            EffectBackend::GridPulseField(_) => EffectKind::Boxes,
            EffectBackend::PathBeamField(_) => EffectKind::Trails,
        }
    }

    #[inline]
    pub fn surface_kind(&self) -> SurfaceKind {
        self.kind().surface_kind()
    }

    pub fn is_initialized(&self) -> bool {
        match self {
            EffectBackend::ShaderNoiseField(b) => b.is_initialized(),
            EffectBackend::ProceduralPathTracer(b) => b.is_initialized(),
            EffectBackend::VectorBeamField(b) => b.is_initialized(),
            EffectBackend::GridPulseField(b) => b.is_initialized(),
            EffectBackend::PathBeamField(b) => b.is_initialized(),
        }
    }

    pub fn init(
        &mut self,
        surface: &SurfaceHandle,
        config: &EffectConfig,
        palette: &Palette,
    ) -> Result<()> {
        match self {
            EffectBackend::ShaderNoiseField(b) => b.init(surface, config, palette),
            EffectBackend::ProceduralPathTracer(b) => b.init(surface, config, palette),
            EffectBackend::VectorBeamField(b) => b.init(surface, config, palette),
            EffectBackend::GridPulseField(b) => b.init(surface, config, palette),
            EffectBackend::PathBeamField(b) => b.init(surface, config, palette),
        }
    }

    pub fn render_frame(&mut self, surface: &mut SurfaceHandle, elapsed_ms: f64) -> Result<()> {
        match self {
            EffectBackend::ShaderNoiseField(b) => b.render_frame(surface, elapsed_ms),
            EffectBackend::ProceduralPathTracer(b) => b.render_frame(surface, elapsed_ms),
            EffectBackend::VectorBeamField(b) => b.render_frame(surface, elapsed_ms),
            EffectBackend::GridPulseField(b) => b.render_frame(surface, elapsed_ms),
            EffectBackend::PathBeamField(b) => b.render_frame(surface, elapsed_ms),
        }
    }

    /// Called when the host hides the region. Only the path beams blank
    /// their canvas; the others keep their last frame.
    pub fn suspend(&mut self, surface: &mut SurfaceHandle) {
        if let EffectBackend::PathBeamField(b) = self {
            b.suspend(surface);
        }
    }

    pub fn resize(&mut self, size: Extent) {
        match self {
            EffectBackend::ShaderNoiseField(b) => b.resize(size),
            EffectBackend::ProceduralPathTracer(b) => b.resize(size),
            EffectBackend::VectorBeamField(b) => b.resize(size),
            EffectBackend::GridPulseField(b) => b.resize(size),
            EffectBackend::PathBeamField(b) => b.resize(size),
        }
    }

    pub fn dispose(&mut self) -> Result<()> {
        match self {
            EffectBackend::ShaderNoiseField(b) => b.dispose(),
            EffectBackend::ProceduralPathTracer(b) => b.dispose(),
            EffectBackend::VectorBeamField(b) => b.dispose(),
            EffectBackend::GridPulseField(b) => b.dispose(),
            EffectBackend::PathBeamField(b) => b.dispose(),
        }
    }
}

impl std::fmt::Debug for EffectBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectBackend")
            .field("kind", &self.kind())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
