use std::time::Instant;

use super::SurfaceId;

/// Work the runtime postpones instead of doing synchronously.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Task {
    /// Measure the surface and apply shape overrides.
    ResolveGeometry(SurfaceId),
    /// Try to bind a nested surface to its parent's target.
    NestedSetup(SurfaceId),
}

impl Task {
    pub fn surface(self) -> SurfaceId {
        match self {
            Self::ResolveGeometry(id) | Self::NestedSetup(id) => id,
        }
    }
}

/// A task tagged with the epoch of the surface it was queued for.
///
/// A surface bumps its epoch when detached; tasks carrying an older epoch
/// must be dropped when they come due.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Deferred {
    pub task: Task,
    pub epoch: u64,
}

/// Next-tick queue plus deadline timers.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    next_tick: Vec<Deferred>,
    timers: Vec<(Instant, Deferred)>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task` for the next tick. Duplicates collapse into one entry.
    pub fn defer(&mut self, task: Task, epoch: u64) {
        let item = Deferred { task, epoch };
        if !self.next_tick.contains(&item) {
            self.next_tick.push(item);
        }
    }

    /// Queues `task` for the first tick at or after `at`.
    pub fn defer_until(&mut self, at: Instant, task: Task, epoch: u64) {
        self.timers.push((at, Deferred { task, epoch }));
    }

    /// Everything due at `now`: next-tick work in queue order, then expired
    /// timers by deadline. Work queued while running these lands in the
    /// following tick.
    pub fn take_due(&mut self, now: Instant) -> Vec<Deferred> {
        let mut due = std::mem::take(&mut self.next_tick);

        let mut expired: Vec<(Instant, Deferred)> = Vec::new();
        self.timers.retain(|(at, item)| {
            if *at <= now {
                expired.push((*at, *item));
                false
            } else {
                true
            }
        });
        expired.sort_by_key(|(at, _)| *at);
        due.extend(expired.into_iter().map(|(_, item)| item));
        due
    }

    pub fn is_empty(&self) -> bool {
        self.next_tick.is_empty() && self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.next_tick.len() + self.timers.len()
    }

    /// Earliest timer deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|(at, _)| *at).min()
    }
}
