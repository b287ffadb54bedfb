use std::time::Duration;

use anyhow::{Context, Result};
use backdrop_engine::coords::Extent;
use backdrop_engine::device::{GpuContext, SurfaceErrorAction};
use backdrop_engine::paint::{ColorRamp, Palette};
use backdrop_engine::surface::SurfaceHandle;
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::config::EffectConfig;

/// Shader time added per tick, scaled by `speed`.
pub const TIME_STEP: f32 = 0.01;

const DISPOSE_TIMEOUT: Duration = Duration::from_millis(500);

// ── GPU types ─────────────────────────────────────────────────────────────

/// Mirrors `Params` in `noise_field.wgsl` (80 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct NoiseUniform {
    pub color_stops: [[f32; 4]; 3],
    pub resolution: [f32; 2],
    pub time: f32,
    pub amplitude: f32,
    pub blend: f32,
    pub radial_mask: f32,
    pub srgb_target: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct TriangleVertex {
    pos: [f32; 2],
}

impl TriangleVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TriangleVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// One oversized triangle covering all of clip space.
const FULL_SURFACE_TRIANGLE: [TriangleVertex; 3] = [
    TriangleVertex { pos: [-1.0, -1.0] },
    TriangleVertex { pos: [3.0, -1.0] },
    TriangleVertex { pos: [-1.0, 3.0] },
];

fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

/// Compiled program and its buffers. Dropping it frees every GPU object.
struct NoisePipeline {
    device: wgpu::Device,
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    triangle_vbo: wgpu::Buffer,
}

impl NoisePipeline {
    fn new(gpu: &GpuContext, initial: &NoiseUniform) -> Self {
        let device = gpu.device();
        let format = gpu.format();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("backdrop noise shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/noise_field.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("backdrop noise bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<NoiseUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("backdrop noise pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("backdrop noise pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[TriangleVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("backdrop noise ubo"),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("backdrop noise bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let triangle_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("backdrop noise triangle"),
            contents: bytemuck::cast_slice(&FULL_SURFACE_TRIANGLE),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            device: device.clone(),
            format,
            pipeline,
            bind_group,
            uniform_buffer,
            triangle_vbo,
        }
    }
}

// ── backend ───────────────────────────────────────────────────────────────

/// Simplex noise field colored through the palette ramp, drawn with one
/// full-surface triangle per frame.
pub struct ShaderNoiseField {
    ramp: ColorRamp,
    speed: f32,
    amplitude: f32,
    blend: f32,
    radial_mask: bool,
    time: f32,
    resolution: Extent,
    gpu: Option<NoisePipeline>,
    warned_skip: bool,
}

impl Default for ShaderNoiseField {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderNoiseField {
    pub fn new() -> Self {
        let config = EffectConfig::defaults(crate::EffectKind::Aurora);
        Self {
            ramp: Palette::default().ramp(),
            speed: config.speed,
            amplitude: config.amplitude,
            blend: config.blend,
            radial_mask: config.show_radial_gradient,
            time: 0.0,
            resolution: Extent::default(),
            gpu: None,
            warned_skip: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    /// Current value of the time uniform.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn init(
        &mut self,
        surface: &SurfaceHandle,
        config: &EffectConfig,
        palette: &Palette,
    ) -> Result<()> {
        let gpu = surface
            .gpu()
            .context("noise field needs a GPU surface")?;

        self.ramp = palette.ramp();
        self.speed = config.speed;
        self.amplitude = config.amplitude;
        self.blend = config.blend;
        self.radial_mask = config.show_radial_gradient;
        self.time = 0.0;
        self.resolution = surface.size();

        let uniform = self.uniform(gpu.format().is_srgb());
        self.gpu = Some(NoisePipeline::new(gpu, &uniform));
        log::debug!("noise field compiled for {:?}", gpu.format());
        Ok(())
    }

    pub(crate) fn advance_time(&mut self) {
        self.time += self.speed * TIME_STEP;
    }

    pub(crate) fn uniform(&self, srgb_target: bool) -> NoiseUniform {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        NoiseUniform {
            color_stops: self.ramp.to_uniform(),
            resolution: self.resolution.at_least_one().as_f32(),
            time: self.time,
            amplitude: self.amplitude,
            blend: self.blend,
            radial_mask: flag(self.radial_mask),
            srgb_target: flag(srgb_target),
            _pad: 0.0,
        }
    }

    /// Advances time by one step and draws.
    ///
    /// Returns an error only when the surface is unrecoverable.
    pub fn render_frame(&mut self, surface: &mut SurfaceHandle, _elapsed_ms: f64) -> Result<()> {
        if self.gpu.is_none() {
            return Ok(());
        }
        let Some(gpu) = surface.gpu_mut() else {
            return Ok(());
        };

        self.advance_time();
        let Some(noise) = self.gpu.as_ref() else {
            return Ok(());
        };
        let uniform = self.uniform(noise.format.is_srgb());
        gpu.queue()
            .write_buffer(&noise.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        let mut frame = match gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => match gpu.handle_surface_error(err.clone()) {
                SurfaceErrorAction::Fatal => {
                    anyhow::bail!("GPU surface lost beyond recovery: {err}")
                }
                action => {
                    if !self.warned_skip {
                        log::warn!("noise field skipped a frame ({action:?}): {err}");
                        self.warned_skip = true;
                    }
                    return Ok(());
                }
            },
        };

        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("backdrop noise pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&noise.pipeline);
            rpass.set_bind_group(0, &noise.bind_group, &[]);
            rpass.set_vertex_buffer(0, noise.triangle_vbo.slice(..));
            rpass.draw(0..3, 0..1);
        }

        gpu.submit(frame);
        Ok(())
    }

    /// Takes effect in the next frame's resolution uniform.
    pub fn resize(&mut self, size: Extent) {
        self.resolution = size;
    }

    /// Waits for submitted work, then frees the program and buffers.
    pub fn dispose(&mut self) -> Result<()> {
        let Some(noise) = self.gpu.take() else {
            return Ok(());
        };
        noise
            .device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(DISPOSE_TIMEOUT),
            })
            .context("failed to drain GPU queue on dispose")?;
        Ok(())
    }
}
