use std::collections::HashMap;
use std::time::Duration;

use super::SurfaceId;

/// Tuning for the composition runtime's deferred work.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Poll interval while a nested surface waits for its parent.
    pub nested_retry: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            nested_retry: Duration::from_millis(100),
        }
    }
}

/// How often a registered surface gets a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cadence {
    /// Only after [`FrameScheduler::request`].
    OnDemand,
    /// On every tick.
    EveryFrame,
}

#[derive(Debug, Copy, Clone)]
struct Entry {
    cadence: Cadence,
    pending: bool,
}

/// Decides which surfaces receive a frame on a tick.
///
/// Holds ids only. Unregistering cancels a surface immediately.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    entries: HashMap<SurfaceId, Entry>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id`. On-demand surfaces start with a pending frame.
    pub fn register(&mut self, id: SurfaceId, cadence: Cadence) {
        self.entries.insert(id, Entry { cadence, pending: cadence == Cadence::OnDemand });
    }

    pub fn unregister(&mut self, id: SurfaceId) {
        self.entries.remove(&id);
    }

    pub fn is_registered(&self, id: SurfaceId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn cadence(&self, id: SurfaceId) -> Option<Cadence> {
        self.entries.get(&id).map(|e| e.cadence)
    }

    /// Asks for one frame. Ignored for unregistered surfaces.
    pub fn request(&mut self, id: SurfaceId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.pending = true;
        }
    }

    /// Requests a frame for every on-demand surface.
    pub fn request_on_demand(&mut self) {
        for entry in self.entries.values_mut() {
            if entry.cadence == Cadence::OnDemand {
                entry.pending = true;
            }
        }
    }

    /// `true` if any surface would get a frame on the next tick.
    pub fn has_work(&self) -> bool {
        self.entries
            .values()
            .any(|e| e.pending || e.cadence == Cadence::EveryFrame)
    }

    /// Surfaces due this tick, following `order`. Clears pending requests.
    pub fn take_due(&mut self, order: &[SurfaceId]) -> Vec<SurfaceId> {
        let mut due = Vec::new();
        for id in order {
            let Some(entry) = self.entries.get_mut(id) else { continue; };
            match entry.cadence {
                Cadence::EveryFrame => due.push(*id),
                Cadence::OnDemand if entry.pending => {
                    entry.pending = false;
                    due.push(*id);
                }
                Cadence::OnDemand => {}
            }
        }
        due
    }
}
