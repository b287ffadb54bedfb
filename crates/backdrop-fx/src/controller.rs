//! Mount/unmount orchestration for one background region.
//!
//! ```text
//! Disabled → Mounting → Running ⇄ Suspended
//!                          ↓          ↓
//!                       Disposing → Disabled
//! ```
//!
//! The controller is the failure boundary of the effect layer: anything
//! that goes wrong below it is logged and ends in `Disabled`.

use backdrop_engine::paint::{current_accent_color, derive_palette, Palette, ThemeSource};
use backdrop_engine::surface::{Container, SurfaceHandle, SurfaceLifecycle, SurfaceOptions};
use backdrop_engine::time::FrameScheduler;
use serde_json::{Map, Value};

use crate::backend::EffectBackend;
use crate::config::{EffectConfig, EffectKind};
use crate::flag::{CachedFlag, FlagSource};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Disabled,
    Mounting,
    Running,
    Suspended,
    Disposing,
}

/// Owns the container, the surface and the backend of one mounted effect.
///
/// The host drives it: `mount`/`unmount` for the component lifetime,
/// `on_host_frame` from its per-frame callback, `resize` and `set_hidden`
/// from its observers.
pub struct EffectController<C: Container> {
    container: C,
    kind: EffectKind,
    config: EffectConfig,
    palette: Palette,
    lifecycle: SurfaceLifecycle,
    backend: EffectBackend,
    scheduler: FrameScheduler,
    surface: Option<SurfaceHandle>,
    state: ControllerState,

    mounted: bool,
    enabled: bool,
    hidden: bool,
    /// Reduced motion as read at mount; fixed until unmount.
    reduced_motion: bool,

    frames_rendered: u64,
}

impl<C: Container> EffectController<C> {
    /// Config and palette are snapshots: changing either means building a
    /// new controller.
    pub fn new(
        container: C,
        kind: EffectKind,
        config: EffectConfig,
        palette: Palette,
        options: SurfaceOptions,
    ) -> Self {
        Self {
            container,
            kind,
            config,
            palette,
            lifecycle: SurfaceLifecycle::new(options),
            backend: EffectBackend::new(kind),
            scheduler: FrameScheduler::new(),
            surface: None,
            state: ControllerState::Disabled,
            mounted: false,
            enabled: false,
            hidden: false,
            reduced_motion: false,
            frames_rendered: 0,
        }
    }

    /// Sanitizes `settings` and derives the palette from the theme accent.
    pub fn from_theme(
        container: C,
        kind: EffectKind,
        settings: &Map<String, Value>,
        theme: &dyn ThemeSource,
        options: SurfaceOptions,
    ) -> Self {
        let config = EffectConfig::from_settings(kind, settings);
        let palette = derive_palette(current_accent_color(theme));
        Self::new(container, kind, config, palette, options)
    }

    #[inline]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    #[inline]
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    #[inline]
    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Frames rendered since the last activation.
    #[inline]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    #[inline]
    pub fn surface(&self) -> Option<&SurfaceHandle> {
        self.surface.as_ref()
    }

    #[inline]
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Direct access for host bookkeeping (e.g. recording a new size).
    /// Children owned by the controller must not be touched.
    #[inline]
    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    #[inline]
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// True while the host should keep calling [`on_host_frame`](Self::on_host_frame).
    #[inline]
    pub fn wants_frames(&self) -> bool {
        self.state == ControllerState::Running
    }

    // ── lifetime ─────────────────────────────────────────────────────────

    /// Mounts the region. Reduced motion is read here once; while it is set
    /// the controller stays `Disabled` until unmounted.
    pub fn mount(&mut self, enabled: bool, reduced_motion: bool) {
        if self.mounted {
            self.unmount();
        }
        self.mounted = true;
        self.enabled = enabled;
        self.reduced_motion = reduced_motion;
        log::info!(
            "mounting {} background (enabled: {enabled}, reduced motion: {reduced_motion})",
            self.kind
        );

        if reduced_motion {
            log::info!("reduced motion requested; {} background stays off", self.kind);
            return;
        }
        if enabled {
            self.activate();
        }
    }

    /// Tears everything down. Safe in any state.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.teardown();
        self.mounted = false;
        self.enabled = false;
        self.reduced_motion = false;
        log::info!("{} background unmounted", self.kind);
    }

    /// Applies a new value of the enable flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !self.mounted {
            return;
        }

        if enabled {
            if self.state == ControllerState::Disabled && !self.reduced_motion {
                self.activate();
            }
        } else {
            self.teardown();
        }
    }

    /// Reads the flag through its cache and applies it.
    pub fn refresh_flag<S: FlagSource>(&mut self, flag: &mut CachedFlag<S>) {
        let enabled = flag.is_enabled();
        self.set_enabled(enabled);
    }

    /// Applies a host visibility change. No resources are released.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        self.scheduler.set_hidden(hidden);
        self.state = match (self.state, hidden) {
            (ControllerState::Running, true) => {
                if let Some(surface) = self.surface.as_mut() {
                    self.backend.suspend(surface);
                }
                ControllerState::Suspended
            }
            (ControllerState::Suspended, false) => ControllerState::Running,
            (state, _) => state,
        };
    }

    // ── per frame ────────────────────────────────────────────────────────

    /// Host per-frame callback. Returns true when a frame was rendered.
    ///
    /// A render error tears the effect down.
    pub fn on_host_frame(&mut self, now_ms: f64) -> bool {
        if self.state != ControllerState::Running {
            return false;
        }
        let Some(tick) = self.scheduler.advance(now_ms) else {
            return false;
        };
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        match self.backend.render_frame(surface, tick.elapsed_ms) {
            Ok(()) => {
                self.frames_rendered += 1;
                true
            }
            Err(err) => {
                log::error!("{} background failed to render, disabling: {err:#}", self.kind);
                self.teardown();
                false
            }
        }
    }

    /// Synchronizes the surface and the backend with a new container size.
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let Err(err) = self.lifecycle.resize(surface, width, height) {
            log::warn!("failed to resize {} surface: {err:#}", self.kind);
            return;
        }
        self.backend.resize(surface.size());
    }

    // ── internals ────────────────────────────────────────────────────────

    fn activate(&mut self) {
        self.state = ControllerState::Mounting;
        self.frames_rendered = 0;

        let mut surface = match self.lifecycle.acquire(&mut self.container, self.kind.surface_kind()) {
            Ok(surface) => surface,
            Err(err) => {
                log::error!("no surface for {} background: {err:#}", self.kind);
                self.state = ControllerState::Disabled;
                return;
            }
        };

        // Fresh backend per activation; nothing carries over from a previous one.
        self.backend = EffectBackend::new(self.kind);
        if let Err(err) = self.backend.init(&surface, &self.config, &self.palette) {
            log::error!("{} background failed to initialize: {err:#}", self.kind);
            if let Err(err) = self.backend.dispose() {
                log::error!("dispose after failed init: {err:#}");
            }
            if let Err(err) = self.lifecycle.release(&mut self.container, &mut surface) {
                log::error!("release after failed init: {err:#}");
            }
            self.state = ControllerState::Disabled;
            return;
        }

        self.surface = Some(surface);
        self.scheduler.start();
        self.scheduler.set_hidden(self.hidden);
        self.state = if self.hidden {
            ControllerState::Suspended
        } else {
            ControllerState::Running
        };
        log::debug!("{} background {:?}", self.kind, self.state);
    }

    /// Stop, dispose, release; each step runs even if an earlier one failed.
    fn teardown(&mut self) {
        if self.state == ControllerState::Disabled && self.surface.is_none() {
            return;
        }
        self.state = ControllerState::Disposing;

        self.scheduler.stop();

        if let Err(err) = self.backend.dispose() {
            log::error!("{} background dispose failed: {err:#}", self.kind);
        }

        if let Some(mut surface) = self.surface.take() {
            if let Err(err) = self.lifecycle.release(&mut self.container, &mut surface) {
                log::error!("{} surface release failed: {err:#}", self.kind);
            }
        }

        self.state = ControllerState::Disabled;
        log::debug!("{} background disabled", self.kind);
    }
}

impl<C: Container> Drop for EffectController<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<C: Container> std::fmt::Debug for EffectController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectController")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("mounted", &self.mounted)
            .field("enabled", &self.enabled)
            .field("frames_rendered", &self.frames_rendered)
            .finish()
    }
}
