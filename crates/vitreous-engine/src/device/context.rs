use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::render::GpuBackend;

use super::surface;
use super::{GpuFrame, GpuInit, SurfaceErrorAction};

/// Device, queue and the window's swapchain.
///
/// Glass surfaces render into their own offscreen targets through a
/// [`GpuBackend`] sharing this device; the swapchain only receives the final
/// composite.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    /// Physical pixels.
    size: PhysicalSize<u32>,
}

impl<'w> Gpu<'w> {
    /// Binds a swapchain to `window`. Blocks on nothing; callers drive the
    /// future (the window runtime uses `pollster`).
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(
            size.width > 0 && size.height > 0,
            "cannot bind a swapchain to a zero-sized window"
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no adapter can present to this window")?;

        let (device, queue) = request_device(&adapter, &init).await?;

        let caps = surface.get_capabilities(&adapter);
        let config = surface::swapchain_config(&caps, size, &init)
            .context("surface reports no usable formats")?;
        surface.configure(&device, &config);

        let info = adapter.get_info();
        log::info!(
            "gpu: {} ({:?}), swapchain {:?} {}x{}, max target {} px",
            info.name,
            info.backend,
            config.format,
            config.width,
            config.height,
            device.limits().max_texture_dimension_2d
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Backend for glass surfaces, sharing this device and queue.
    pub fn surface_backend(&self) -> GpuBackend {
        GpuBackend::new(self.device.clone(), self.queue.clone())
    }

    /// Reconfigures the swapchain after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    /// Acquires the next swapchain image with a fresh encoder.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture.texture.create_view(&Default::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vitreous frame encoder"),
            });
        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the frame's commands and presents it.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }

    /// Maps a swapchain error to what the frame loop should do next.
    pub fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        surface::map_surface_error(&self.surface, &self.device, &self.config, self.size, err)
    }
}

async fn request_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("vitreous device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}
