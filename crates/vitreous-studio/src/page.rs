use std::collections::HashMap;

use vitreous_engine::compose::{LayoutHost, SurfaceId};
use vitreous_engine::config::ContentExtent;
use vitreous_engine::coords::{Rect, Vec2};

/// Gap between the top of the page and the first card.
pub const PAGE_TOP: f32 = 160.0;
pub const CARD_MAX_WIDTH: f32 = 720.0;
pub const CARD_HEIGHT: f32 = 200.0;
const CARD_MARGIN: f32 = 40.0;

#[derive(Debug, Clone, Copy)]
enum Slot {
    /// Horizontally centred card at a page offset.
    Card { top: f32 },
    /// Placed at `offset` inside another element's box.
    Inset { parent: SurfaceId, offset: Vec2 },
}

#[derive(Debug, Clone, Copy)]
struct Element {
    slot: Slot,
    size: Vec2,
}

/// Minimal scrolling page that lays out glass surfaces.
///
/// Cards stretch with the window up to [`CARD_MAX_WIDTH`]; insets keep their
/// own (usually content-driven) size.
#[derive(Debug, Default)]
pub struct Page {
    viewport: Vec2,
    scroll_y: f32,
    elements: HashMap<SurfaceId, Element>,
    /// Extents pushed before the element was placed.
    pending: HashMap<SurfaceId, Vec2>,
}

impl Page {
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        for el in self.elements.values_mut() {
            if let Slot::Card { .. } = el.slot {
                el.size.x = card_width(width);
            }
        }
    }

    pub fn scroll_by(&mut self, dy: f32) {
        self.scroll_y = (self.scroll_y - dy).max(0.0);
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn place_card(&mut self, id: SurfaceId, top: f32) {
        let size = Vec2::new(card_width(self.viewport.x), CARD_HEIGHT);
        self.elements.insert(id, Element { slot: Slot::Card { top }, size });
    }

    pub fn place_inset(&mut self, id: SurfaceId, parent: SurfaceId, offset: Vec2) {
        let size = self.pending.remove(&id).unwrap_or_default();
        self.elements.insert(id, Element { slot: Slot::Inset { parent, offset }, size });
    }

    fn page_rect(&self, id: SurfaceId) -> Option<Rect> {
        let el = self.elements.get(&id)?;
        let origin = match el.slot {
            Slot::Card { top } => Vec2::new((self.viewport.x - el.size.x) * 0.5, top),
            Slot::Inset { parent, offset } => self.page_rect(parent)?.origin + offset,
        };
        Some(Rect::from_origin_size(origin, el.size))
    }
}

fn card_width(viewport_width: f32) -> f32 {
    (viewport_width - 2.0 * CARD_MARGIN).clamp(0.0, CARD_MAX_WIDTH)
}

impl LayoutHost for Page {
    fn measure(&self, id: SurfaceId) -> Option<Rect> {
        if self.viewport.x <= 0.0 {
            return None;
        }
        let rect = self.page_rect(id)?;
        (!rect.is_empty()).then(|| rect.translated(Vec2::new(0.0, -self.scroll_y)))
    }

    fn apply_extent(&mut self, id: SurfaceId, extent: ContentExtent) {
        let size = Vec2::new(extent.width, extent.height);
        match self.elements.get_mut(&id) {
            Some(el) => el.size = size,
            None => {
                self.pending.insert(id, size);
            }
        }
    }

    fn forget(&mut self, id: SurfaceId) {
        self.elements.remove(&id);
        self.pending.remove(&id);
    }
}
