/// Initialization parameters for the GPU layer.
///
/// Background effects are decorative; defaults favor low power and
/// portability over throughput.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Palette colors are authored as sRGB values and written as-is, so the
    /// default asks for a non-sRGB format. Renderers must check
    /// `TextureFormat::is_srgb` on the chosen format either way.
    pub prefer_srgb: bool,

    /// Adapter power preference.
    pub power_preference: wgpu::PowerPreference,

    /// Present mode (swap behavior) for window-backed targets.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            power_preference: wgpu::PowerPreference::LowPower,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: Some(wgpu::CompositeAlphaMode::PreMultiplied),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}
