use anyhow::{Context, Result};
use backdrop_engine::coords::Extent;
use backdrop_engine::device::{GpuContext, GpuInit, SurfaceErrorAction};
use tiny_skia::Pixmap;

/// Texture format for uploaded canvas bytes.
///
/// Canvas bytes are sRGB encoded. An sRGB target re-encodes on write, so the
/// texture decodes on read to keep the bytes unchanged end to end.
pub fn upload_format(target: wgpu::TextureFormat) -> wgpu::TextureFormat {
    if target.is_srgb() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

struct CanvasTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: Extent,
}

/// Shows raster canvases in a window: uploads each frame's pixmap and
/// draws it with one full-surface triangle over black.
pub struct RasterPresenter {
    gpu: GpuContext,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    canvas: Option<CanvasTexture>,
    warned_skip: bool,
}

impl RasterPresenter {
    pub fn new(target: wgpu::SurfaceTarget<'static>, size: Extent) -> Result<Self> {
        let gpu = pollster::block_on(GpuContext::new(Some(target), size, &GpuInit::default()))
            .context("failed to set up window presentation")?;
        let device = gpu.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("studio blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("studio blit bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("studio blit pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("studio blit pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.format(),
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            gpu,
            pipeline,
            bind_group_layout,
            canvas: None,
            warned_skip: false,
        })
    }

    pub fn resize(&mut self, size: Extent) {
        self.gpu.resize(size);
    }

    /// Uploads `pixmap` and presents it. Transient surface errors drop the
    /// frame; only an unrecoverable surface is an error.
    pub fn present(&mut self, pixmap: &Pixmap) -> Result<()> {
        if self.gpu.size().is_empty() {
            return Ok(());
        }
        let size = Extent::new(pixmap.width(), pixmap.height());
        self.upload(pixmap, size);
        let Some(canvas) = self.canvas.as_ref() else {
            return Ok(());
        };

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => match self.gpu.handle_surface_error(err.clone()) {
                SurfaceErrorAction::Fatal => anyhow::bail!("window surface lost: {err}"),
                action => {
                    if !self.warned_skip {
                        log::warn!("studio skipped a frame ({action:?}): {err}");
                        self.warned_skip = true;
                    }
                    return Ok(());
                }
            },
        };

        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("studio blit pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &canvas.bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }

        self.gpu.submit(frame);
        Ok(())
    }

    /// Writes the pixmap into the canvas texture, recreating it on a size
    /// change.
    fn upload(&mut self, pixmap: &Pixmap, size: Extent) {
        if self.canvas.as_ref().is_none_or(|c| c.size != size) {
            self.canvas = Some(self.create_canvas(size));
        }
        let Some(canvas) = self.canvas.as_ref() else {
            return;
        };

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &canvas.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixmap.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size.width * 4),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_canvas(&self, size: Extent) -> CanvasTexture {
        let device = self.gpu.device();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("studio canvas texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: upload_format(self.gpu.format()),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("studio canvas bind group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });
        CanvasTexture {
            texture,
            bind_group,
            size,
        }
    }
}
