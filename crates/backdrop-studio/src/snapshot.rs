use std::path::Path;

use anyhow::{Context, Result};
use backdrop_engine::coords::Extent;
use backdrop_engine::surface::{HeadlessContainer, SurfaceOptions};
use backdrop_engine::time::DEFAULT_FRAME_INTERVAL_MS;
use backdrop_fx::{ControllerState, EffectController};
use tiny_skia::{IntSize, Pixmap};

use crate::cli::MountSetup;

/// Host frame spacing; a hair over the cap so every simulated frame ticks.
const HOST_FRAME_MS: f64 = DEFAULT_FRAME_INTERVAL_MS + 0.5;

/// Mounts the effect in a windowless container, drives `frames` host
/// frames and writes the final surface contents to `out`.
pub fn run(setup: &MountSetup, size: Extent, frames: u32, out: &Path) -> Result<()> {
    let pixmap = render(setup, size, frames)?;
    pixmap
        .save_png(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    log::info!(
        "wrote {}x{} {} snapshot to {}",
        pixmap.width(),
        pixmap.height(),
        setup.kind,
        out.display()
    );
    Ok(())
}

pub fn render(setup: &MountSetup, size: Extent, frames: u32) -> Result<Pixmap> {
    let mut controller = EffectController::from_theme(
        HeadlessContainer::new(size),
        setup.kind,
        &setup.settings,
        &setup.theme,
        SurfaceOptions::default(),
    );
    controller.mount(setup.enabled, setup.reduced_motion);
    if controller.state() != ControllerState::Running {
        anyhow::bail!(
            "{} effect did not start (disabled, reduced motion or no surface; see log)",
            setup.kind
        );
    }

    let mut rendered = 0;
    for i in 0..frames {
        if controller.on_host_frame(f64::from(i) * HOST_FRAME_MS) {
            rendered += 1;
        }
    }
    log::debug!("rendered {rendered} of {frames} host frames");

    let surface = controller
        .surface()
        .context("effect stopped while rendering; see log")?;
    let rgba = surface.snapshot_rgba()?;
    let drawn = surface.size().at_least_one();
    let int_size = IntSize::from_wh(drawn.width, drawn.height).context("empty snapshot")?;

    // Both surface kinds hand out premultiplied RGBA8.
    let pixmap = Pixmap::from_vec(rgba, int_size).context("snapshot size mismatch")?;
    controller.unmount();
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_engine::paint::StaticTheme;
    use backdrop_fx::EffectKind;
    use serde_json::{Map, Value};

    fn setup(kind: EffectKind, enabled: bool) -> MountSetup {
        let mut settings = Map::new();
        settings.insert("seed".into(), Value::from(7));
        // Enough path progress to show every trace within 200 frames.
        let speed = if kind == EffectKind::Gemini { 0.005 } else { 1.0 };
        settings.insert("speed".into(), Value::from(speed));
        MountSetup {
            kind,
            settings,
            theme: StaticTheme::new(),
            enabled,
            reduced_motion: false,
        }
    }

    #[test]
    fn raster_effects_render_to_a_pixmap() {
        for kind in [EffectKind::Gemini, EffectKind::Beams, EffectKind::Boxes] {
            let pixmap = render(&setup(kind, true), Extent::new(200, 120), 200).unwrap();
            assert_eq!((pixmap.width(), pixmap.height()), (200, 120));
            assert!(pixmap.pixels().iter().any(|p| p.alpha() > 0), "{kind} is blank");
        }
    }

    #[test]
    fn disabled_effect_is_an_error() {
        assert!(render(&setup(EffectKind::Beams, false), Extent::new(50, 50), 5).is_err());
    }
}
