/// Device and swapchain options.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Pick an sRGB swapchain format when the surface offers one.
    pub prefer_srgb: bool,

    pub present_mode: wgpu::PresentMode,

    /// Falls back to the first supported mode when unsupported.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,

    /// Glass targets are bounded by `max_texture_dimension_2d` from these.
    pub required_limits: wgpu::Limits,

    /// Hint only; support depends on platform and backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
