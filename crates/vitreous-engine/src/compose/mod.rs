//! Composition of glass surfaces.
//!
//! - [`CompositionTree`] owns surfaces and their parent/child links
//! - [`GlassRuntime`] walks each surface through its lifecycle and pushes
//!   frames through a [`SurfaceBackend`](crate::render::SurfaceBackend)
//! - [`LayoutHost`] is the embedding layout system that measures surfaces
//!
//! Nothing here measures or draws synchronously. Structural changes queue
//! work on a [`DeferredQueue`] that the next [`GlassRuntime::tick`] drains.

mod deferred;
mod geometry;
mod host;
mod id;
mod runtime;
mod scheduler;
mod surface;
mod tree;

#[cfg(test)]
mod testing;

pub use deferred::{Deferred, DeferredQueue, Task};
pub use geometry::{resolve_geometry, screen_rect, ResolvedGeometry};
pub use host::LayoutHost;
pub use id::SurfaceId;
pub use runtime::{FrameReport, GlassRuntime};
pub use scheduler::{Cadence, FrameScheduler, SchedulerConfig};
pub use surface::{Geometry, Surface, SurfaceEvent, SurfaceHandle, SurfaceRole, SurfaceState};
pub use tree::{CompositionTree, TreeError};
