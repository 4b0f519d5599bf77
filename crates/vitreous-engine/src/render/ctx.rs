use crate::coords::Viewport;
use crate::device::GpuFrame;

/// Device handles and window metrics for swapchain rendering.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    /// Window size in logical pixels.
    pub viewport: Viewport,
}

/// Encoder and colour view of the frame being recorded.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    pub fn from_frame(frame: &'a mut GpuFrame) -> Self {
        Self {
            encoder: &mut frame.encoder,
            color_view: &frame.view,
        }
    }

    /// Clears the frame to `color` before surfaces are composited.
    pub fn clear(&mut self, color: wgpu::Color) {
        let _pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vitreous clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}
