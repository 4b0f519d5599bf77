use winit::dpi::PhysicalSize;

use super::{GpuInit, SurfaceErrorAction};

/// Swapchain configuration for a window of `size`, or `None` if the surface
/// offers no formats.
pub(crate) fn swapchain_config(
    caps: &wgpu::SurfaceCapabilities,
    size: PhysicalSize<u32>,
    init: &GpuInit,
) -> Option<wgpu::SurfaceConfiguration> {
    Some(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: choose_surface_format(caps, init.prefer_srgb)?,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: init.present_mode,
        alpha_mode: choose_alpha_mode(caps, init.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    })
}

const SRGB_FORMATS: [wgpu::TextureFormat; 2] = [
    wgpu::TextureFormat::Bgra8UnormSrgb,
    wgpu::TextureFormat::Rgba8UnormSrgb,
];

/// First sRGB format the surface supports (when preferred), else its first format.
pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *caps.formats.first()?;
    let srgb = SRGB_FORMATS.into_iter().find(|f| caps.formats.contains(f));
    Some(srgb.filter(|_| prefer_srgb).unwrap_or(first))
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

fn is_drawable(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

/// Records `new_size` and reconfigures, unless the window is minimised.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if is_drawable(new_size) {
        config.width = new_size.width;
        config.height = new_size.height;
        surface.configure(device, config);
    }
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    use wgpu::SurfaceError as E;
    match err {
        E::Lost | E::Outdated => {
            if is_drawable(size) {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        E::OutOfMemory => SurfaceErrorAction::Fatal,
        E::Timeout | E::Other => SurfaceErrorAction::SkipFrame,
    }
}
