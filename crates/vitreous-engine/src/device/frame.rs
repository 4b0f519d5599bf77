/// One acquired swapchain image and the encoder recording into it.
///
/// Holding a frame blocks acquisition of the next one; hand it back to
/// [`Gpu::submit`](super::Gpu::submit) within the same redraw.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
