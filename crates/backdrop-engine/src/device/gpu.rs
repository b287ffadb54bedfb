use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use wgpu::SurfaceError;

use crate::coords::Extent;

use super::surface::{self, OFFSCREEN_FORMAT};
use super::{GpuFrame, GpuInit, SurfaceErrorAction};

const READBACK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Where frames end up.
enum RenderTarget {
    /// Swapchain bound to a host window.
    Window {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    /// Texture owned by the context; the host reads it back.
    Offscreen { texture: wgpu::Texture },
}

/// Owns wgpu core objects and one render target.
///
/// This type is the GPU flavour of a native drawing context:
/// - creates and stores Device/Queue
/// - creates and configures a window Surface, or an offscreen texture when
///   the host has no window to offer
/// - acquires frames and provides an encoder + view for rendering
///
/// Dropping the context releases every GPU object it created.
pub struct GpuContext {
    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Active render target.
    target: RenderTarget,

    /// Color format of the render target.
    format: wgpu::TextureFormat,

    /// Current drawable size in physical pixels.
    size: Extent,
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("format", &self.format)
            .field("size", &self.size)
            .field("presentable", &self.is_presentable())
            .finish()
    }
}

impl GpuContext {
    /// Creates a GPU context.
    ///
    /// With `window`, frames are presented to that window's surface;
    /// otherwise they are rendered into an offscreen texture.
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(
        window: Option<wgpu::SurfaceTarget<'static>>,
        size: Extent,
        init: &GpuInit,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = match window {
            Some(window) => Some(
                instance
                    .create_surface(window)
                    .context("failed to create wgpu surface")?,
            ),
            None => None,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: surface.as_ref(),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("backdrop device"),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits.clone().using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let drawable = size.at_least_one();

        let (target, format) = match surface {
            Some(surface) => {
                let caps = surface.get_capabilities(&adapter);
                let format = surface::choose_surface_format(&caps, init.prefer_srgb)
                    .context("no supported surface formats")?;
                let alpha_mode = surface::choose_alpha_mode(&caps, init.alpha_mode);

                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format,
                    width: drawable.width,
                    height: drawable.height,
                    present_mode: init.present_mode,
                    alpha_mode,
                    view_formats: vec![],
                    desired_maximum_frame_latency: init.desired_maximum_frame_latency,
                };
                surface.configure(&device, &config);

                (RenderTarget::Window { surface, config }, format)
            }
            None => {
                let texture = surface::create_offscreen_texture(&device, drawable);
                (RenderTarget::Offscreen { texture }, OFFSCREEN_FORMAT)
            }
        };

        log::debug!(
            "gpu context ready: {:?} {}x{} ({})",
            format,
            drawable.width,
            drawable.height,
            adapter.get_info().name
        );

        Ok(Self {
            device,
            queue,
            target,
            format,
            size,
        })
    }

    /// Returns the render target's color format.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> Extent {
        self.size
    }

    /// True when frames go to a window surface rather than a texture.
    pub fn is_presentable(&self) -> bool {
        matches!(self.target, RenderTarget::Window { .. })
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Resizes the render target.
    ///
    /// wgpu does not support 0x0 targets; in that case only the recorded size
    /// changes and reconfiguration is deferred to the next non-empty resize.
    pub fn resize(&mut self, new_size: Extent) {
        self.size = new_size;
        if new_size.is_empty() {
            return;
        }

        match &mut self.target {
            RenderTarget::Window { surface, config } => {
                config.width = new_size.width;
                config.height = new_size.height;
                surface.configure(&self.device, config);
            }
            RenderTarget::Offscreen { texture } => {
                *texture = surface::create_offscreen_texture(&self.device, new_size);
            }
        }
    }

    /// Acquires the next target texture and creates an encoder.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let (surface_texture, view) = match &self.target {
            RenderTarget::Window { surface, .. } => {
                let st = surface.get_current_texture()?;
                let view = st.texture.create_view(&wgpu::TextureViewDescriptor::default());
                (Some(st), view)
            }
            RenderTarget::Offscreen { texture } => {
                (None, texture.create_view(&wgpu::TextureViewDescriptor::default()))
            }
        };

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("backdrop frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents window frames.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        if let Some(st) = surface_texture {
            st.present();
        }
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        match &self.target {
            RenderTarget::Window { surface, config } => {
                surface::map_surface_error(surface, &self.device, config, err)
            }
            RenderTarget::Offscreen { .. } => SurfaceErrorAction::SkipFrame,
        }
    }

    /// Copies the offscreen target back to the CPU as tightly packed RGBA8.
    ///
    /// Window targets cannot be read back and return an error.
    pub fn read_pixels(&self) -> Result<Vec<u8>> {
        let RenderTarget::Offscreen { texture } = &self.target else {
            anyhow::bail!("window surfaces cannot be read back");
        };

        let width = texture.width();
        let height = texture.height();
        let unpadded = width * 4;
        let padded = surface::align_to(unpadded, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("backdrop readback"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("backdrop readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(READBACK_TIMEOUT),
            })
            .context("gpu poll failed during readback")?;
        receiver
            .recv_timeout(READBACK_TIMEOUT)
            .context("readback map timed out")?
            .context("failed to map readback buffer")?;

        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks_exact(padded as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        readback.unmap();

        Ok(pixels)
    }
}
