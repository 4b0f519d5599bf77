use std::fmt;

/// Handle to a surface in a [`CompositionTree`](super::CompositionTree).
///
/// Ids are handed out monotonically and never reused, so a stale id can only
/// ever miss, never alias a newer surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub(crate) u64);

impl SurfaceId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}
