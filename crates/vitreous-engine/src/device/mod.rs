//! GPU device and window swapchain.
//!
//! - [`Gpu`] owns Instance/Adapter/Device/Queue and the window surface
//! - [`GpuFrame`] is one acquired swapchain image plus its encoder
//! - [`Gpu::surface_backend`] hands glass surfaces their own `wgpu` backend

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
