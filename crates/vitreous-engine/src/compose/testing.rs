//! Headless doubles for runtime tests.

use std::collections::HashMap;

use crate::config::ContentExtent;
use crate::coords::{PixelSize, Rect, Vec2};
use crate::program::{ShaderProgram, ShaderVariant};
use crate::render::{BackendError, SurfaceBackend, SurfaceDraw};

use super::{LayoutHost, SurfaceId};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Allocate(SurfaceId),
    Configure(SurfaceId, PixelSize),
    Install(SurfaceId, ShaderVariant),
    Draw(SurfaceId, SurfaceDraw),
    Release(SurfaceId),
    Flush,
}

/// Backend that records every call and keeps just enough state to reject
/// draws the GPU would reject.
#[derive(Debug)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    pub fail_allocate: bool,
    pub max_dimension: u32,
    sizes: HashMap<SurfaceId, PixelSize>,
    programs: HashMap<SurfaceId, ShaderVariant>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            fail_allocate: false,
            max_dimension: 8192,
            sizes: HashMap::new(),
            programs: HashMap::new(),
        }
    }
}

impl RecordingBackend {
    pub fn draws(&self) -> Vec<SurfaceId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(id, _) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn last_draw(&self, id: SurfaceId) -> Option<SurfaceDraw> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Draw(d, draw) if *d == id => Some(*draw),
            _ => None,
        })
    }

    pub fn configures(&self, id: SurfaceId) -> Vec<PixelSize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Configure(d, size) if *d == id => Some(*size),
                _ => None,
            })
            .collect()
    }

    pub fn program(&self, id: SurfaceId) -> Option<ShaderVariant> {
        self.programs.get(&id).copied()
    }

    pub fn is_allocated(&self, id: SurfaceId) -> bool {
        self.sizes.contains_key(&id)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl SurfaceBackend for RecordingBackend {
    fn allocate(&mut self, id: SurfaceId) -> Result<(), BackendError> {
        self.calls.push(Call::Allocate(id));
        if self.fail_allocate {
            return Err(BackendError::ResourceUnavailable { id, reason: "test".into() });
        }
        self.sizes.insert(id, PixelSize::ZERO);
        Ok(())
    }

    fn configure(&mut self, id: SurfaceId, size: PixelSize) -> Result<(), BackendError> {
        self.calls.push(Call::Configure(id, size));
        if size.width > self.max_dimension || size.height > self.max_dimension {
            return Err(BackendError::ResourceUnavailable { id, reason: "too large".into() });
        }
        let slot = self.sizes.get_mut(&id).ok_or(BackendError::UnknownSurface(id))?;
        *slot = size;
        Ok(())
    }

    fn install_program(
        &mut self,
        id: SurfaceId,
        variant: ShaderVariant,
        _program: &ShaderProgram,
    ) -> Result<(), BackendError> {
        self.calls.push(Call::Install(id, variant));
        if !self.sizes.contains_key(&id) {
            return Err(BackendError::UnknownSurface(id));
        }
        self.programs.insert(id, variant);
        Ok(())
    }

    fn draw(&mut self, id: SurfaceId, draw: &SurfaceDraw) -> Result<(), BackendError> {
        if !self.sizes.contains_key(&id) {
            return Err(BackendError::UnknownSurface(id));
        }
        if !self.programs.contains_key(&id) {
            return Err(BackendError::NoProgram(id));
        }
        if let Some(parent) = draw.parent {
            if self.sizes.get(&parent).is_none_or(|s| s.is_empty()) {
                return Err(BackendError::ParentUnavailable { id, parent });
            }
        }
        self.calls.push(Call::Draw(id, *draw));
        Ok(())
    }

    fn release(&mut self, id: SurfaceId) {
        self.calls.push(Call::Release(id));
        self.sizes.remove(&id);
        self.programs.remove(&id);
    }

    fn flush(&mut self) {
        self.calls.push(Call::Flush);
    }
}

/// Layout host with rects set directly by the test.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub rects: HashMap<SurfaceId, Rect>,
    pub applied: Vec<(SurfaceId, ContentExtent)>,
    pub forgotten: Vec<SurfaceId>,
}

impl FakeHost {
    pub fn place(&mut self, id: SurfaceId, x: f32, y: f32, w: f32, h: f32) {
        self.rects.insert(id, Rect::new(x, y, w, h));
    }

    pub fn last_extent(&self, id: SurfaceId) -> Option<ContentExtent> {
        self.applied.iter().rev().find(|(i, _)| *i == id).map(|(_, e)| *e)
    }
}

impl LayoutHost for FakeHost {
    fn measure(&self, id: SurfaceId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    fn apply_extent(&mut self, id: SurfaceId, extent: ContentExtent) {
        self.applied.push((id, extent));
        if let Some(rect) = self.rects.get_mut(&id) {
            rect.size = Vec2::new(extent.width, extent.height);
        }
    }

    fn forget(&mut self, id: SurfaceId) {
        self.forgotten.push(id);
        self.rects.remove(&id);
    }
}
