use std::collections::HashMap;

use thiserror::Error;

use crate::config::GlassConfig;

use super::{Surface, SurfaceId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("{0} does not exist")]
    UnknownSurface(SurfaceId),

    #[error("{child} already has parent {parent}")]
    AlreadyParented { child: SurfaceId, parent: SurfaceId },

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: SurfaceId, child: SurfaceId },

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: SurfaceId, child: SurfaceId },

    #[error("{0} is already mounted")]
    AlreadyMounted(SurfaceId),
}

/// Owning registry of surfaces and their parent/child links.
///
/// A surface is either a mounted root, a descendant of one, or detached
/// (no parent, not mounted). Only mounted subtrees take part in paint order.
#[derive(Debug, Default)]
pub struct CompositionTree {
    next_id: u64,
    surfaces: HashMap<SurfaceId, Surface>,
    /// Mounted roots in creation/mount order.
    roots: Vec<SurfaceId>,
}

impl CompositionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new mounted root.
    pub fn insert(&mut self, config: GlassConfig) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(id, Surface::new(id, config));
        self.roots.push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(&id)
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.get_mut(&id)
    }

    fn require(&self, id: SurfaceId) -> Result<&Surface, TreeError> {
        self.surfaces.get(&id).ok_or(TreeError::UnknownSurface(id))
    }

    pub fn roots(&self) -> &[SurfaceId] {
        &self.roots
    }

    /// `true` if `id` is, or descends from, a mounted root.
    pub fn is_mounted(&self, id: SurfaceId) -> bool {
        self.root_of(id).is_some_and(|root| self.roots.contains(&root))
    }

    fn root_of(&self, id: SurfaceId) -> Option<SurfaceId> {
        let mut cur = self.surfaces.get(&id)?;
        while let Some(parent) = cur.parent {
            cur = self.surfaces.get(&parent)?;
        }
        Some(cur.id)
    }

    /// `true` if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: SurfaceId, id: SurfaceId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.surfaces.get(&c).and_then(|s| s.parent);
        }
        false
    }

    /// Appends `child` to `parent`'s children.
    pub fn link(&mut self, parent: SurfaceId, child: SurfaceId) -> Result<(), TreeError> {
        self.require(parent)?;
        let existing = self.require(child)?.parent;
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }
        if let Some(existing) = existing {
            return Err(TreeError::AlreadyParented { child, parent: existing });
        }

        self.roots.retain(|r| *r != child);
        if let Some(c) = self.surfaces.get_mut(&child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.surfaces.get_mut(&parent) {
            p.children.push(child);
        }
        Ok(())
    }

    /// Removes `child` from `parent`. The child is left detached.
    pub fn unlink(&mut self, parent: SurfaceId, child: SurfaceId) -> Result<(), TreeError> {
        self.require(parent)?;
        if self.require(child)?.parent != Some(parent) {
            return Err(TreeError::NotAChild { parent, child });
        }
        if let Some(p) = self.surfaces.get_mut(&parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.surfaces.get_mut(&child) {
            c.parent = None;
        }
        Ok(())
    }

    /// Makes a detached surface a mounted root again.
    pub fn mount(&mut self, id: SurfaceId) -> Result<(), TreeError> {
        let s = self.require(id)?;
        if let Some(parent) = s.parent {
            return Err(TreeError::AlreadyParented { child: id, parent });
        }
        if self.roots.contains(&id) {
            return Err(TreeError::AlreadyMounted(id));
        }
        self.roots.push(id);
        Ok(())
    }

    /// `id` followed by its descendants, pre-order.
    pub fn subtree(&self, id: SurfaceId) -> Vec<SurfaceId> {
        let mut out = Vec::new();
        self.visit_pre_order(id, &mut out);
        out
    }

    fn visit_pre_order(&self, id: SurfaceId, out: &mut Vec<SurfaceId>) {
        let Some(s) = self.surfaces.get(&id) else { return; };
        out.push(id);
        for child in &s.children {
            self.visit_pre_order(*child, out);
        }
    }

    /// Mounted surfaces, parents before children.
    ///
    /// Roots come in mount order; children pre-order by insertion.
    pub fn paint_order(&self) -> Vec<SurfaceId> {
        let mut out = Vec::with_capacity(self.surfaces.len());
        for root in &self.roots {
            self.visit_pre_order(*root, &mut out);
        }
        out
    }

    /// Removes `id` and its descendants, returning them in pre-order.
    pub fn remove_subtree(&mut self, id: SurfaceId) -> Vec<Surface> {
        let ids = self.subtree(id);
        if let Some(parent) = self.surfaces.get(&id).and_then(|s| s.parent) {
            if let Some(p) = self.surfaces.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        self.roots.retain(|r| *r != id);
        ids.into_iter()
            .filter_map(|i| self.surfaces.remove(&i))
            .collect()
    }
}
