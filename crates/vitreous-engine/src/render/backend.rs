use thiserror::Error;

use crate::compose::SurfaceId;
use crate::coords::PixelSize;
use crate::program::{ShaderProgram, ShaderVariant};

use super::SurfaceUniforms;

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// No drawing target could be obtained for the surface.
    #[error("no drawing target for {id}: {reason}")]
    ResourceUnavailable { id: SurfaceId, reason: String },

    #[error("{0} has no drawing target")]
    UnknownSurface(SurfaceId),

    #[error("{0} has no installed program")]
    NoProgram(SurfaceId),

    /// A nested draw named a parent whose target is missing or empty.
    #[error("parent {parent} of {id} has no readable target")]
    ParentUnavailable { id: SurfaceId, parent: SurfaceId },
}

/// One frame push for one surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceDraw {
    pub uniforms: SurfaceUniforms,
    /// Target sampled by a nested draw.
    pub parent: Option<SurfaceId>,
}

/// GPU side of the composition runtime.
///
/// Each surface owns one offscreen target. The runtime drives targets through
/// this trait so it can run against `wgpu` or a recording fake.
pub trait SurfaceBackend {
    /// Creates an (empty) drawing target for `id`.
    fn allocate(&mut self, id: SurfaceId) -> Result<(), BackendError>;

    /// Resizes the target; its previous contents are discarded.
    fn configure(&mut self, id: SurfaceId, size: PixelSize) -> Result<(), BackendError>;

    /// Binds a validated program to the surface, replacing any previous one.
    fn install_program(
        &mut self,
        id: SurfaceId,
        variant: ShaderVariant,
        program: &ShaderProgram,
    ) -> Result<(), BackendError>;

    /// Renders the surface's material into its own target.
    fn draw(&mut self, id: SurfaceId, draw: &SurfaceDraw) -> Result<(), BackendError>;

    /// Drops the target and every GPU object tied to it.
    fn release(&mut self, id: SurfaceId);

    /// Submits the draws recorded since the last flush.
    fn flush(&mut self);
}
