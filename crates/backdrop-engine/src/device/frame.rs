/// Represents a single acquired frame.
///
/// This object is short-lived and must be submitted promptly. Holding a
/// surface texture prevents acquisition of subsequent frames.
pub struct GpuFrame {
    /// Present only for window-backed targets.
    pub surface_texture: Option<wgpu::SurfaceTexture>,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
