use crate::config::GlassConfig;
use crate::coords::{PixelSize, Rect};
use crate::shape::ShapeKind;

use super::SurfaceId;

/// Whether a surface composites itself or refracts its parent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    Root,
    Nested,
}

/// Lifecycle of a surface.
///
/// ```text
/// Uninitialized -> LayoutPending -> GeometryResolved -> StandaloneReady
///                                                    \-> NestedPending -> NestedReady
/// ```
///
/// `Invalid` is terminal: the surface's program failed to compile or link.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceState {
    Uninitialized,
    LayoutPending,
    GeometryResolved,
    StandaloneReady,
    NestedPending,
    NestedReady,
    Invalid,
}

impl SurfaceState {
    #[inline]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::StandaloneReady | Self::NestedReady)
    }
}

/// Resolved on-display geometry of a surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geometry {
    /// Target size in pixels.
    pub size: PixelSize,
    /// Radius after shape overrides.
    pub radius: f32,
    /// Classification of `size` + `radius`.
    pub shape: ShapeKind,
    /// Last known screen rect, logical pixels.
    pub screen_rect: Rect,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            size: PixelSize::ZERO,
            radius: 0.0,
            shape: ShapeKind::RoundedRect,
            screen_rect: Rect::default(),
        }
    }
}

/// One glass surface in the composition tree.
#[derive(Debug, Clone)]
pub struct Surface {
    pub(crate) id: SurfaceId,
    pub(crate) config: GlassConfig,
    pub(crate) state: SurfaceState,
    pub(crate) parent: Option<SurfaceId>,
    pub(crate) children: Vec<SurfaceId>,
    pub(crate) geometry: Geometry,
    /// Radius the geometry overrides start from.
    pub(crate) authored_radius: f32,
    /// Bumped whenever deferred work queued for this surface must be voided.
    pub(crate) epoch: u64,
    /// A target has been configured at `geometry.size`.
    pub(crate) target_configured: bool,
    pub(crate) draw_failed: bool,
}

impl Surface {
    pub(crate) fn new(id: SurfaceId, config: GlassConfig) -> Self {
        let authored_radius = config.corner_radius_px;
        Self {
            id,
            config,
            state: SurfaceState::Uninitialized,
            parent: None,
            children: Vec::new(),
            geometry: Geometry::default(),
            authored_radius,
            epoch: 0,
            target_configured: false,
            draw_failed: false,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn config(&self) -> &GlassConfig {
        &self.config
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn parent(&self) -> Option<SurfaceId> {
        self.parent
    }

    /// Children in paint order.
    pub fn children(&self) -> &[SurfaceId] {
        &self.children
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn is_nested_child(&self) -> bool {
        self.parent.is_some()
    }

    pub fn role(&self) -> SurfaceRole {
        if self.is_nested_child() {
            SurfaceRole::Nested
        } else {
            SurfaceRole::Root
        }
    }

    /// Drops geometry and voids outstanding deferred work.
    pub(crate) fn reset(&mut self) {
        self.state = SurfaceState::Uninitialized;
        self.geometry = Geometry::default();
        self.target_configured = false;
        self.draw_failed = false;
        self.epoch += 1;
    }
}

/// What a host needs to place a surface's visual.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceHandle {
    pub id: SurfaceId,
    pub screen_rect: Rect,
    pub radius: f32,
}

/// Observable lifecycle change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    StateChanged {
        id: SurfaceId,
        from: SurfaceState,
        to: SurfaceState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_follows_parent_link() {
        let mut s = Surface::new(SurfaceId(1), GlassConfig::default());
        assert_eq!(s.role(), SurfaceRole::Root);
        s.parent = Some(SurfaceId(0));
        assert_eq!(s.role(), SurfaceRole::Nested);
        assert!(s.is_nested_child());
    }

    #[test]
    fn reset_voids_epoch_and_geometry() {
        let mut s = Surface::new(SurfaceId(1), GlassConfig::default());
        s.state = SurfaceState::StandaloneReady;
        s.geometry.size = PixelSize::new(10, 10);
        s.reset();
        assert_eq!(s.state(), SurfaceState::Uninitialized);
        assert_eq!(s.geometry().size, PixelSize::ZERO);
        assert_eq!(s.epoch, 1);
    }

    #[test]
    fn only_ready_states_are_ready() {
        assert!(SurfaceState::StandaloneReady.is_ready());
        assert!(SurfaceState::NestedReady.is_ready());
        assert!(!SurfaceState::NestedPending.is_ready());
        assert!(!SurfaceState::Invalid.is_ready());
    }
}
