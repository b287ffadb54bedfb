use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use backdrop_engine::coords::Extent;
use backdrop_engine::surface::{Container, ElementId, SurfaceKind, SurfaceOptions};
use backdrop_fx::EffectController;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::cli::MountSetup;
use crate::present::RasterPresenter;

/// A winit window acting as the effect's container.
///
/// The window itself is the drawable: GPU surfaces present straight into it,
/// raster canvases go through a [`RasterPresenter`].
struct WindowContainer {
    window: Arc<Window>,
    children: Vec<ElementId>,
}

impl Container for WindowContainer {
    fn content_size(&self) -> Extent {
        let size = self.window.inner_size();
        Extent::new(size.width, size.height)
    }

    fn append_child(&mut self, element: ElementId) {
        self.children.push(element);
    }

    fn remove_child(&mut self, element: ElementId) -> bool {
        let before = self.children.len();
        self.children.retain(|&e| e != element);
        before != self.children.len()
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn gpu_target(&self) -> Option<wgpu::SurfaceTarget<'static>> {
        Some(wgpu::SurfaceTarget::from(self.window.clone()))
    }
}

/// Opens a window and runs the effect until it is closed.
pub fn run(setup: MountSetup, size: Extent) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut host = StudioHost {
        setup,
        initial_size: size,
        controller: None,
        presenter: None,
        started: Instant::now(),
    };

    event_loop
        .run_app(&mut host)
        .context("winit event loop terminated with error")?;
    Ok(())
}

struct StudioHost {
    setup: MountSetup,
    initial_size: Extent,
    controller: Option<EffectController<WindowContainer>>,
    /// Only for raster effects; GPU effects own the window surface.
    presenter: Option<RasterPresenter>,
    started: Instant,
}

impl StudioHost {
    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(format!("backdrop: {}", self.setup.kind))
            .with_inner_size(PhysicalSize::new(
                self.initial_size.width,
                self.initial_size.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        if self.setup.kind.surface_kind() == SurfaceKind::Raster {
            let inner = window.inner_size();
            let target = wgpu::SurfaceTarget::from(window.clone());
            self.presenter = Some(RasterPresenter::new(
                target,
                Extent::new(inner.width, inner.height),
            )?);
        }

        let container = WindowContainer {
            window: window.clone(),
            children: Vec::new(),
        };
        let mut controller = EffectController::from_theme(
            container,
            self.setup.kind,
            &self.setup.settings,
            &self.setup.theme,
            SurfaceOptions::default(),
        );
        controller.mount(self.setup.enabled, self.setup.reduced_motion);
        if !controller.wants_frames() {
            log::warn!("effect is not running ({:?}); the window stays empty", controller.state());
        }

        self.controller = Some(controller);
        window.request_redraw();
        Ok(())
    }
}

impl ApplicationHandler for StudioHost {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.controller.is_some() {
            return;
        }
        if let Err(e) = self.mount(event_loop) {
            log::error!("failed to open studio window: {e:#}");
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(controller) = &self.controller {
            if controller.wants_frames() {
                controller.container().window.request_redraw();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let now = self.now_ms();
        let Some(controller) = self.controller.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                controller.unmount();
                self.controller = None;
                self.presenter = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.resize(Extent::new(size.width, size.height));
                }
                controller.resize(size.width, size.height);
            }
            WindowEvent::Occluded(hidden) => {
                controller.set_hidden(hidden);
            }
            WindowEvent::RedrawRequested => {
                if !controller.on_host_frame(now) {
                    return;
                }
                let Some(presenter) = self.presenter.as_mut() else {
                    return;
                };
                let Some(canvas) = controller.surface().and_then(|s| s.raster()) else {
                    return;
                };
                if let Err(e) = presenter.present(canvas.pixmap()) {
                    log::error!("failed to present frame, closing: {e:#}");
                    controller.unmount();
                    self.controller = None;
                    self.presenter = None;
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}
