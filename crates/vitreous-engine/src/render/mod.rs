//! GPU side of glass surfaces.
//!
//! - [`SurfaceBackend`] is the seam the composition runtime draws through
//! - [`GpuBackend`] implements it with one offscreen `wgpu` target per surface
//! - [`Presenter`] composites those targets onto the window frame
//!
//! Surface targets use texcoord y = 0 at the top; screen rects are logical
//! pixels with a top-left origin.

mod backend;
mod ctx;
mod gpu_backend;
mod presenter;
mod uniforms;

pub use backend::{BackendError, SurfaceBackend, SurfaceDraw};
pub use ctx::{RenderCtx, RenderTarget};
pub use gpu_backend::{GpuBackend, TARGET_FORMAT};
pub use presenter::{PresentItem, Presenter};
pub use uniforms::{
    NestedGeometry, NestedUniforms, QuadVertex, StandaloneUniforms, SurfaceUniforms, QUAD_VERTICES,
};
