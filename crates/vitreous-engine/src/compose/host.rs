use crate::config::ContentExtent;
use crate::coords::Rect;

use super::SurfaceId;

/// The layout system glass surfaces are embedded in.
///
/// The runtime never lays anything out itself. It asks the host where a
/// surface ended up and tells it when a shape forces a different extent.
/// Compositing a blurred backdrop behind root surfaces is also up to the host.
pub trait LayoutHost {
    /// On-display rect of `id` in logical pixels, or `None` until laid out.
    fn measure(&self, id: SurfaceId) -> Option<Rect>;

    /// Adopts a content- or shape-forced extent for `id`.
    fn apply_extent(&mut self, id: SurfaceId, extent: ContentExtent);

    /// `id` was destroyed.
    fn forget(&mut self, _id: SurfaceId) {}
}
