use log::{debug, error, trace, warn};

use crate::config::{ConfigError, GlassConfig};
use crate::coords::{PixelSize, Rect};
use crate::program::{ProgramCache, ShaderVariant};
use crate::render::{
    NestedGeometry, NestedUniforms, StandaloneUniforms, SurfaceBackend, SurfaceDraw,
    SurfaceUniforms,
};
use crate::text::{AverageAdvance, TextMeasure};
use crate::time::{Clock, FrameClock, FrameTime, SystemClock};

use super::{
    resolve_geometry, screen_rect, Cadence, CompositionTree, DeferredQueue, FrameScheduler,
    Geometry, LayoutHost, SchedulerConfig, Surface, SurfaceEvent, SurfaceHandle, SurfaceId,
    SurfaceRole, SurfaceState, Task, TreeError,
};

/// What one [`GlassRuntime::tick`] did.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub time: FrameTime,
    /// Deferred tasks executed.
    pub tasks_run: usize,
    /// Deferred tasks dropped because their surface was detached or destroyed.
    pub stale_tasks: usize,
    /// Surfaces drawn, in paint order.
    pub drawn: Vec<SurfaceId>,
}

/// Owns the composition tree and drives every surface through its lifecycle.
///
/// Single-threaded: the host calls [`tick`](Self::tick) once per display
/// frame. All layout work is deferred to a later tick, never done inside
/// `create_surface`/`attach`/`detach`.
pub struct GlassRuntime<B, H, C = SystemClock> {
    backend: B,
    host: H,
    clock: C,
    config: SchedulerConfig,

    tree: CompositionTree,
    deferred: DeferredQueue,
    scheduler: FrameScheduler,
    programs: ProgramCache,
    text: Box<dyn TextMeasure>,
    frame_clock: FrameClock,
    events: Vec<SurfaceEvent>,
}

impl<B: SurfaceBackend, H: LayoutHost> GlassRuntime<B, H, SystemClock> {
    pub fn new(backend: B, host: H) -> Self {
        Self::with_clock(backend, host, SystemClock)
    }
}

impl<B: SurfaceBackend, H: LayoutHost, C: Clock> GlassRuntime<B, H, C> {
    pub fn with_clock(backend: B, host: H, clock: C) -> Self {
        Self {
            backend,
            host,
            clock,
            config: SchedulerConfig::default(),
            tree: CompositionTree::new(),
            deferred: DeferredQueue::new(),
            scheduler: FrameScheduler::new(),
            programs: ProgramCache::new(),
            text: Box::new(AverageAdvance::default()),
            frame_clock: FrameClock::new(),
            events: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Measure used to size surfaces that carry text content.
    pub fn with_text_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.text = Box::new(measure);
        self
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn tree(&self) -> &CompositionTree {
        &self.tree
    }

    pub fn programs_mut(&mut self) -> &mut ProgramCache {
        &mut self.programs
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.tree.get(id)
    }

    pub fn state(&self, id: SurfaceId) -> Option<SurfaceState> {
        self.tree.get(id).map(Surface::state)
    }

    /// Resolved target size; zero until geometry has been resolved.
    pub fn current_pixel_size(&self, id: SurfaceId) -> PixelSize {
        self.tree
            .get(id)
            .map_or(PixelSize::ZERO, |s| s.geometry.size)
    }

    pub fn handle(&self, id: SurfaceId) -> Option<SurfaceHandle> {
        let s = self.tree.get(id)?;
        Some(SurfaceHandle {
            id,
            screen_rect: self.current_rect(s),
            radius: s.geometry.radius,
        })
    }

    /// Handles of drawable surfaces in paint order.
    pub fn visible_handles(&self) -> Vec<SurfaceHandle> {
        self.tree
            .paint_order()
            .into_iter()
            .filter_map(|id| {
                let s = self.tree.get(id)?;
                (s.state.is_ready() && !s.geometry.size.is_empty()).then(|| SurfaceHandle {
                    id,
                    screen_rect: self.current_rect(s),
                    radius: s.geometry.radius,
                })
            })
            .collect()
    }

    /// Lifecycle changes since the last call.
    pub fn take_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }

    /// `true` if the next tick has deferred work or frames to push.
    pub fn wants_tick(&self) -> bool {
        !self.deferred.is_empty() || self.scheduler.has_work()
    }

    /// Earliest pending retry, for hosts that sleep between ticks.
    pub fn next_deadline(&self) -> Option<std::time::Instant> {
        self.deferred.next_deadline()
    }

    // ── surface lifecycle ─────────────────────────────────────────────────

    /// Registers a new root surface and starts its initialisation.
    ///
    /// Content-sized surfaces push their intrinsic extent to the host here.
    pub fn create_surface(&mut self, config: GlassConfig) -> Result<SurfaceId, ConfigError> {
        config.validate()?;
        let extent = config.content_extent(self.text.as_ref());

        let id = self.tree.insert(config);
        debug!("{id} created");

        if let Some(extent) = extent {
            if let Some(s) = self.tree.get_mut(id) {
                s.authored_radius = extent.radius;
            }
            self.host.apply_extent(id, extent);
        }

        self.initialize(id);
        Ok(id)
    }

    /// Nests `child` under `parent`. The child switches to the nested
    /// material once its parent is ready.
    pub fn attach(&mut self, parent: SurfaceId, child: SurfaceId) -> Result<(), TreeError> {
        self.tree.link(parent, child)?;
        self.scheduler.unregister(child);
        let state = match self.tree.get_mut(child) {
            Some(c) => {
                c.epoch += 1;
                c.state
            }
            None => return Ok(()),
        };
        debug!("{child} attached under {parent}");

        if self.tree.is_mounted(child) {
            match state {
                SurfaceState::Uninitialized => self.initialize(child),
                SurfaceState::Invalid => {}
                _ => {
                    self.set_state(child, SurfaceState::LayoutPending);
                    self.defer_resolve(child);
                }
            }
            for id in self.tree.subtree(child).into_iter().skip(1) {
                match self.state(id) {
                    Some(SurfaceState::Uninitialized) => self.initialize(id),
                    Some(SurfaceState::NestedReady) => self.suspend_nested(id),
                    _ => {}
                }
            }
        } else {
            for id in self.tree.subtree(child) {
                self.release_surface(id);
            }
        }

        self.defer_resolve(parent);
        Ok(())
    }

    /// Unlinks `child` and releases its GPU resources.
    ///
    /// Descendants stay linked under `child` and are released with it. The
    /// whole subtree comes back through [`mount`](Self::mount) or
    /// [`attach`](Self::attach), or goes away through
    /// [`destroy`](Self::destroy).
    pub fn detach(&mut self, parent: SurfaceId, child: SurfaceId) -> Result<(), TreeError> {
        self.tree.unlink(parent, child)?;
        for id in self.tree.subtree(child) {
            self.release_surface(id);
        }
        debug!("{child} detached from {parent}");

        self.defer_resolve(parent);
        Ok(())
    }

    /// Mounts a detached surface as a new root.
    pub fn mount(&mut self, id: SurfaceId) -> Result<(), TreeError> {
        self.tree.mount(id)?;
        for sid in self.tree.subtree(id) {
            self.initialize(sid);
        }
        Ok(())
    }

    /// Removes `id` and its descendants for good.
    pub fn destroy(&mut self, id: SurfaceId) -> Result<(), TreeError> {
        let parent = self
            .tree
            .get(id)
            .ok_or(TreeError::UnknownSurface(id))?
            .parent;

        for s in self.tree.remove_subtree(id) {
            self.scheduler.unregister(s.id);
            self.backend.release(s.id);
            self.host.forget(s.id);
            debug!("{} destroyed", s.id);
        }
        if let Some(parent) = parent {
            self.defer_resolve(parent);
        }
        Ok(())
    }

    // ── host notifications ───────────────────────────────────────────────

    /// The page scrolled: roots push a frame on the next tick.
    pub fn notify_scroll(&mut self) {
        trace!("scroll");
        self.scheduler.request_on_demand();
    }

    /// The viewport or layout changed size: re-resolve every mounted
    /// surface on the next tick.
    pub fn notify_resize(&mut self) {
        for id in self.tree.paint_order() {
            self.defer_resolve(id);
        }
        self.scheduler.request_on_demand();
    }

    /// One surface's layout changed.
    pub fn relayout(&mut self, id: SurfaceId) {
        self.defer_resolve(id);
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Runs due deferred work, then pushes frames in paint order.
    pub fn tick(&mut self) -> FrameReport {
        let now = self.clock.now();
        let time = self.frame_clock.tick_at(now);
        let mut report = FrameReport {
            time,
            tasks_run: 0,
            stale_tasks: 0,
            drawn: Vec::new(),
        };

        for item in self.deferred.take_due(now) {
            let id = item.task.surface();
            if self.tree.get(id).is_none_or(|s| s.epoch != item.epoch) {
                trace!("dropping stale {:?}", item.task);
                report.stale_tasks += 1;
                continue;
            }
            report.tasks_run += 1;
            match item.task {
                Task::ResolveGeometry(id) => self.resolve(id),
                Task::NestedSetup(id) => self.nested_setup(id, now),
            }
        }

        let order = self.tree.paint_order();
        for id in self.scheduler.take_due(&order) {
            if self.draw_surface(id) {
                report.drawn.push(id);
            }
        }
        if !report.drawn.is_empty() {
            self.backend.flush();
        }
        report
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn set_state(&mut self, id: SurfaceId, to: SurfaceState) {
        let Some(s) = self.tree.get_mut(id) else { return; };
        let from = s.state;
        if from == to {
            return;
        }
        s.state = to;
        debug!("{id}: {from:?} -> {to:?}");
        self.events.push(SurfaceEvent::StateChanged { id, from, to });
        if !to.is_ready() {
            self.scheduler.unregister(id);
        }
    }

    fn defer_resolve(&mut self, id: SurfaceId) {
        if let Some(s) = self.tree.get(id) {
            self.deferred.defer(Task::ResolveGeometry(id), s.epoch);
        }
    }

    fn initialize(&mut self, id: SurfaceId) {
        if self.state(id) != Some(SurfaceState::Uninitialized) || !self.tree.is_mounted(id) {
            return;
        }
        if let Err(err) = self.backend.allocate(id) {
            warn!("{err}");
            return;
        }
        self.set_state(id, SurfaceState::LayoutPending);
        self.defer_resolve(id);
    }

    fn release_surface(&mut self, id: SurfaceId) {
        self.scheduler.unregister(id);
        self.backend.release(id);
        let Some(s) = self.tree.get_mut(id) else { return; };
        let from = s.state;
        s.reset();
        if from != SurfaceState::Uninitialized {
            debug!("{id}: {from:?} -> Uninitialized");
            self.events.push(SurfaceEvent::StateChanged {
                id,
                from,
                to: SurfaceState::Uninitialized,
            });
        }
    }

    fn current_rect(&self, s: &Surface) -> Rect {
        self.host
            .measure(s.id)
            .map_or(s.geometry.screen_rect, |m| screen_rect(m, s.geometry.size))
    }

    fn resolve(&mut self, id: SurfaceId) {
        let Some(s) = self.tree.get(id) else { return; };
        if matches!(s.state, SurfaceState::Uninitialized | SurfaceState::Invalid) {
            return;
        }
        let (shape, authored_radius, epoch) = (s.config.shape, s.authored_radius, s.epoch);

        let Some(measured) = self.host.measure(id) else {
            trace!("{id}: not laid out yet, retrying next tick");
            self.deferred.defer(Task::ResolveGeometry(id), epoch);
            return;
        };

        let resolved = resolve_geometry(shape, authored_radius, measured);
        if let Some(forced) = resolved.forced {
            self.host.apply_extent(id, forced);
        }

        let Some(s) = self.tree.get_mut(id) else { return; };
        let size_changed = s.geometry.size != resolved.size;
        let needs_configure = size_changed || !s.target_configured;
        s.geometry = Geometry {
            size: resolved.size,
            radius: resolved.radius,
            shape: resolved.shape,
            screen_rect: screen_rect(measured, resolved.size),
        };
        let state = s.state;
        let role = s.role();
        let children = s.children.clone();

        if needs_configure {
            if let Err(err) = self.backend.configure(id, resolved.size) {
                warn!("{err}");
                self.release_surface(id);
                return;
            }
            if let Some(s) = self.tree.get_mut(id) {
                s.target_configured = true;
            }
            debug!(
                "{id}: resolved {}x{} radius {} as {:?}",
                resolved.size.width, resolved.size.height, resolved.radius, resolved.shape
            );
            for child in children {
                self.defer_resolve(child);
            }
            self.scheduler.request(id);
        }

        if state == SurfaceState::LayoutPending {
            self.set_state(id, SurfaceState::GeometryResolved);
            match role {
                SurfaceRole::Root => self.activate_standalone(id),
                SurfaceRole::Nested => {
                    self.set_state(id, SurfaceState::NestedPending);
                    self.deferred.defer(Task::NestedSetup(id), epoch);
                }
            }
        }
    }

    fn activate_standalone(&mut self, id: SurfaceId) {
        if self.install(id, ShaderVariant::Standalone) {
            self.set_state(id, SurfaceState::StandaloneReady);
            self.scheduler.register(id, Cadence::OnDemand);
        }
    }

    fn nested_setup(&mut self, id: SurfaceId, now: std::time::Instant) {
        let Some(s) = self.tree.get(id) else { return; };
        if s.state != SurfaceState::NestedPending {
            return;
        }
        let Some(parent) = s.parent else { return; };
        let epoch = s.epoch;

        if !self.tree.get(parent).is_some_and(|p| p.state.is_ready()) {
            trace!(
                "{id}: parent {parent} not ready, retrying in {:?}",
                self.config.nested_retry
            );
            self.deferred
                .defer_until(now + self.config.nested_retry, Task::NestedSetup(id), epoch);
            return;
        }

        if self.install(id, ShaderVariant::Nested) {
            self.set_state(id, SurfaceState::NestedReady);
            self.scheduler.register(id, Cadence::EveryFrame);
        }
    }

    /// Sends a ready nested surface back to polling, e.g. after its parent
    /// was re-parented and must finish its own nested setup first.
    fn suspend_nested(&mut self, id: SurfaceId) {
        let Some(epoch) = self.tree.get(id).map(|s| s.epoch) else { return; };
        self.set_state(id, SurfaceState::NestedPending);
        self.deferred.defer(Task::NestedSetup(id), epoch);
    }

    /// Compiles (or fetches) `variant` and hands it to the backend.
    fn install(&mut self, id: SurfaceId, variant: ShaderVariant) -> bool {
        let program = match self.programs.get(variant) {
            Ok(program) => program,
            Err(err) => {
                error!("{id}: {err}");
                self.set_state(id, SurfaceState::Invalid);
                return false;
            }
        };
        if let Err(err) = self.backend.install_program(id, variant, &program) {
            warn!("{err}");
            self.release_surface(id);
            return false;
        }
        true
    }

    fn draw_surface(&mut self, id: SurfaceId) -> bool {
        let Some(s) = self.tree.get(id) else { return false; };
        if !s.state.is_ready() || s.geometry.size.is_empty() {
            return false;
        }
        let rect = self.current_rect(s);

        let draw = match s.parent {
            None => SurfaceDraw {
                uniforms: SurfaceUniforms::Standalone(StandaloneUniforms::new(
                    s.geometry.size,
                    s.geometry.radius,
                    &s.config,
                )),
                parent: None,
            },
            Some(parent) => {
                let Some(p) = self.tree.get(parent) else { return false; };
                let geometry = NestedGeometry {
                    size: s.geometry.size,
                    center: rect.center(),
                    radius: s.geometry.radius,
                    parent_size: p.geometry.size,
                    parent_center: self.current_rect(p).center(),
                };
                SurfaceDraw {
                    uniforms: SurfaceUniforms::Nested(NestedUniforms::new(&geometry, &s.config)),
                    parent: Some(parent),
                }
            }
        };

        let result = self.backend.draw(id, &draw);
        let Some(s) = self.tree.get_mut(id) else { return false; };
        s.geometry.screen_rect = rect;
        match result {
            Ok(()) => {
                s.draw_failed = false;
                true
            }
            Err(err) => {
                if !s.draw_failed {
                    warn!("{err}");
                }
                s.draw_failed = true;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::compose::testing::{Call, FakeHost, RecordingBackend};
    use crate::shape::ShapeKind;
    use crate::time::ManualClock;

    type TestRuntime = GlassRuntime<RecordingBackend, FakeHost, ManualClock>;

    fn runtime() -> (TestRuntime, ManualClock) {
        let clock = ManualClock::new();
        let rt = GlassRuntime::with_clock(
            RecordingBackend::default(),
            FakeHost::default(),
            clock.clone(),
        )
        .with_text_measure(AverageAdvance { advance_em: 0.5 });
        (rt, clock)
    }

    fn transitions(events: &[SurfaceEvent], id: SurfaceId) -> Vec<SurfaceState> {
        let mut out = Vec::new();
        for SurfaceEvent::StateChanged { id: e, from, to } in events {
            if *e == id {
                if out.is_empty() {
                    out.push(*from);
                }
                out.push(*to);
            }
        }
        out
    }

    fn root_config() -> GlassConfig {
        GlassConfig::default()
            .with_corner_radius(44.0)
            .with_tint_opacity(0.1)
            .with_blur_radius(40.0)
    }

    /// Root at (0,0) 720x200 with a pill button placed at its content extent.
    fn root_with_pill(rt: &mut TestRuntime) -> (SurfaceId, SurfaceId) {
        let root = rt.create_surface(root_config()).unwrap();
        let child = rt
            .create_surface(GlassConfig::button("Liquid", 22.0).with_shape(ShapeKind::Pill))
            .unwrap();
        let extent = rt.host().last_extent(child).unwrap();
        rt.host_mut().place(root, 0.0, 0.0, 720.0, 200.0);
        rt.host_mut().place(child, 40.0, 40.0, extent.width, extent.height);
        rt.attach(root, child).unwrap();
        (root, child)
    }

    /// Root 720x200, a 300x120 panel inside it, and a pill button inside the
    /// panel.
    fn three_levels(rt: &mut TestRuntime) -> (SurfaceId, SurfaceId, SurfaceId) {
        let root = rt.create_surface(root_config()).unwrap();
        let panel = rt.create_surface(GlassConfig::default()).unwrap();
        let button = rt
            .create_surface(GlassConfig::button("Go", 20.0).with_shape(ShapeKind::Pill))
            .unwrap();
        let extent = rt.host().last_extent(button).unwrap();
        rt.host_mut().place(root, 0.0, 0.0, 720.0, 200.0);
        rt.host_mut().place(panel, 40.0, 40.0, 300.0, 120.0);
        rt.host_mut().place(button, 60.0, 60.0, extent.width, extent.height);
        rt.attach(root, panel).unwrap();
        rt.attach(panel, button).unwrap();
        (root, panel, button)
    }

    fn reached_at(events: &[SurfaceEvent], id: SurfaceId, state: SurfaceState) -> Option<usize> {
        events.iter().position(|e| {
            matches!(e, SurfaceEvent::StateChanged { id: i, to, .. } if *i == id && *to == state)
        })
    }

    // ── scenarios ─────────────────────────────────────────────────────────

    #[test]
    fn root_and_pill_child_walk_to_nested_ready() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        assert_eq!(rt.state(root), Some(SurfaceState::LayoutPending));
        assert_eq!(rt.current_pixel_size(child), PixelSize::ZERO);

        let first = rt.tick();
        assert_eq!(rt.state(root), Some(SurfaceState::StandaloneReady));
        assert_eq!(rt.state(child), Some(SurfaceState::NestedPending));
        assert_eq!(first.drawn, vec![root]);

        let second = rt.tick();
        assert_eq!(rt.state(child), Some(SurfaceState::NestedReady));
        assert_eq!(second.drawn, vec![child]);

        let events = rt.take_events();
        assert_eq!(
            transitions(&events, child),
            vec![
                SurfaceState::Uninitialized,
                SurfaceState::LayoutPending,
                SurfaceState::GeometryResolved,
                SurfaceState::NestedPending,
                SurfaceState::NestedReady,
            ]
        );
        assert_eq!(rt.backend().program(root), Some(ShaderVariant::Standalone));
        assert_eq!(rt.backend().program(child), Some(ShaderVariant::Nested));
    }

    #[test]
    fn pill_child_uniforms_follow_content_extent() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        rt.tick();
        rt.tick();

        // "Liquid": 6 * 11 px + 44 px padding, height ceil(2.5 * 22)
        assert_eq!(rt.current_pixel_size(child), PixelSize::new(110, 55));
        let Some(SurfaceDraw { uniforms: SurfaceUniforms::Nested(u), parent }) =
            rt.backend().last_draw(child)
        else {
            panic!("child was not drawn with nested uniforms");
        };
        assert_eq!(parent, Some(root));
        assert_eq!(u.border_radius, 27.5);
        assert_eq!(u.container_size, [720.0, 200.0]);
        assert_eq!(u.blur_radius, 2.0);
        assert_eq!(u.fixed_background, 1.0);
        assert_eq!(u.button_position, [95.0, 67.5]);
        assert_eq!(u.container_position, [360.0, 100.0]);
    }

    #[test]
    fn nested_frames_repeat_while_roots_wait_for_requests() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        rt.tick();
        rt.tick();

        for _ in 0..3 {
            assert_eq!(rt.tick().drawn, vec![child]);
        }
        rt.notify_scroll();
        assert_eq!(rt.tick().drawn, vec![root, child]);
    }

    #[test]
    fn detaching_a_ready_child_stops_its_frames() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        rt.tick();
        rt.tick();

        rt.detach(root, child).unwrap();
        assert_eq!(rt.state(child), Some(SurfaceState::Uninitialized));
        assert!(rt.backend().calls.contains(&Call::Release(child)));
        assert!(!rt.backend().is_allocated(child));
        assert!(rt.surface(root).unwrap().children().is_empty());
        assert!(!rt.surface(child).unwrap().is_nested_child());

        rt.backend_mut().clear_calls();
        for _ in 0..3 {
            assert!(!rt.tick().drawn.contains(&child));
        }
        assert_eq!(
            rt.detach(root, child),
            Err(TreeError::NotAChild { parent: root, child })
        );
    }

    #[test]
    fn pill_root_resize_recomputes_radius_before_next_frame() {
        let (mut rt, _clock) = runtime();
        let root = rt
            .create_surface(GlassConfig::default().with_shape(ShapeKind::Pill))
            .unwrap();
        rt.host_mut().place(root, 0.0, 0.0, 720.0, 200.0);
        rt.tick();
        assert_eq!(rt.surface(root).unwrap().geometry().radius, 100.0);

        rt.host_mut().place(root, 0.0, 0.0, 900.0, 260.0);
        rt.notify_resize();
        let report = rt.tick();

        let geometry = *rt.surface(root).unwrap().geometry();
        assert_eq!(geometry.radius, 130.0);
        assert_eq!(geometry.shape, ShapeKind::Pill);
        assert_eq!(rt.backend().configures(root).last(), Some(&PixelSize::new(900, 260)));
        assert_eq!(report.drawn, vec![root]);
        let draw = rt.backend().last_draw(root).unwrap();
        assert_eq!(draw.uniforms.border_radius(), 130.0);
        assert_eq!(draw.uniforms.resolution(), [900.0, 260.0]);
        assert_eq!(rt.host().last_extent(root).map(|e| e.radius), Some(130.0));
    }

    #[test]
    fn resize_reaches_children_before_their_next_frame() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        rt.tick();
        rt.tick();

        rt.host_mut().place(root, 0.0, 0.0, 900.0, 260.0);
        rt.notify_resize();
        let report = rt.tick();
        assert_eq!(report.drawn, vec![root, child]);

        let Some(SurfaceDraw { uniforms: SurfaceUniforms::Nested(u), .. }) =
            rt.backend().last_draw(child)
        else {
            panic!("child was not drawn");
        };
        assert_eq!(u.container_size, [900.0, 260.0]);
        assert_eq!(u.texture_size, [900.0, 260.0]);
    }

    // ── deeper nesting ────────────────────────────────────────────────────

    #[test]
    fn grandchild_becomes_ready_after_its_nested_parent() {
        let (mut rt, _clock) = runtime();
        let (root, panel, button) = three_levels(&mut rt);

        rt.tick();
        assert_eq!(rt.state(panel), Some(SurfaceState::NestedPending));
        assert_eq!(rt.state(button), Some(SurfaceState::NestedPending));
        rt.tick();
        assert_eq!(rt.state(panel), Some(SurfaceState::NestedReady));
        assert_eq!(rt.state(button), Some(SurfaceState::NestedReady));

        let events = rt.take_events();
        let root_ready = reached_at(&events, root, SurfaceState::StandaloneReady).unwrap();
        let panel_ready = reached_at(&events, panel, SurfaceState::NestedReady).unwrap();
        let button_ready = reached_at(&events, button, SurfaceState::NestedReady).unwrap();
        assert!(root_ready < panel_ready);
        assert!(panel_ready < button_ready);

        let Some(SurfaceDraw { parent, .. }) = rt.backend().last_draw(button) else {
            panic!("button was not drawn");
        };
        assert_eq!(parent, Some(panel));
    }

    #[test]
    fn resizing_a_nested_parent_reaches_its_children_in_the_same_tick() {
        let (mut rt, _clock) = runtime();
        let (_root, panel, button) = three_levels(&mut rt);
        rt.tick();
        rt.tick();

        rt.host_mut().place(panel, 40.0, 40.0, 400.0, 150.0);
        rt.relayout(panel);
        let report = rt.tick();
        assert_eq!(report.drawn, vec![panel, button]);
        assert_eq!(rt.current_pixel_size(panel), PixelSize::new(400, 150));

        let Some(SurfaceDraw { uniforms: SurfaceUniforms::Nested(u), .. }) =
            rt.backend().last_draw(button)
        else {
            panic!("button was not drawn with nested uniforms");
        };
        assert_eq!(u.container_size, [400.0, 150.0]);
        assert_eq!(u.texture_size, [400.0, 150.0]);
    }

    #[test]
    fn detached_subtree_stays_linked_and_is_destroyed_whole() {
        let (mut rt, _clock) = runtime();
        let (root, panel, button) = three_levels(&mut rt);
        rt.tick();
        rt.tick();

        rt.detach(root, panel).unwrap();
        assert_eq!(rt.surface(button).unwrap().parent(), Some(panel));
        assert_eq!(rt.state(panel), Some(SurfaceState::Uninitialized));
        assert_eq!(rt.state(button), Some(SurfaceState::Uninitialized));
        assert!(!rt.backend().is_allocated(button));

        rt.destroy(panel).unwrap();
        assert!(rt.surface(panel).is_none());
        assert!(rt.surface(button).is_none());
        assert_eq!(rt.tree().len(), 1);
        assert_eq!(rt.host().forgotten, vec![panel, button]);
    }

    #[test]
    fn remounted_subtree_is_reinitialised_whole() {
        let (mut rt, _clock) = runtime();
        let (root, panel, button) = three_levels(&mut rt);
        rt.tick();
        rt.tick();
        rt.detach(root, panel).unwrap();

        rt.mount(panel).unwrap();
        assert_eq!(rt.state(panel), Some(SurfaceState::LayoutPending));
        assert_eq!(rt.state(button), Some(SurfaceState::LayoutPending));

        rt.tick();
        assert_eq!(rt.state(panel), Some(SurfaceState::StandaloneReady));
        assert_eq!(rt.state(button), Some(SurfaceState::NestedPending));
        rt.tick();
        assert_eq!(rt.state(button), Some(SurfaceState::NestedReady));
        assert_eq!(rt.backend().program(panel), Some(ShaderVariant::Standalone));
        assert_eq!(rt.backend().program(button), Some(ShaderVariant::Nested));
    }

    #[test]
    fn reparented_surface_holds_back_its_ready_children() {
        let (mut rt, clock) = runtime();
        let (card, button) = root_with_pill(&mut rt);
        let outer = rt.create_surface(root_config()).unwrap();
        rt.host_mut().place(outer, 0.0, 0.0, 1000.0, 600.0);
        rt.tick();
        rt.tick();
        assert_eq!(rt.state(button), Some(SurfaceState::NestedReady));

        rt.attach(outer, card).unwrap();
        assert_eq!(rt.state(card), Some(SurfaceState::LayoutPending));
        assert_eq!(rt.state(button), Some(SurfaceState::NestedPending));

        rt.backend_mut().clear_calls();
        rt.tick();
        rt.tick();
        assert_eq!(rt.state(card), Some(SurfaceState::NestedReady));
        assert_eq!(rt.state(button), Some(SurfaceState::NestedPending));
        assert!(!rt.backend().draws().contains(&button));

        clock.advance(Duration::from_millis(100));
        rt.tick();
        assert_eq!(rt.state(button), Some(SurfaceState::NestedReady));
        assert_eq!(rt.backend().program(card), Some(ShaderVariant::Nested));

        let events = rt.take_events();
        let last_ready = |id: SurfaceId| {
            events.iter().rposition(|e| {
                matches!(e, SurfaceEvent::StateChanged { id: i, to: SurfaceState::NestedReady, .. } if *i == id)
            })
        };
        let (card_ready, button_ready) = (last_ready(card).unwrap(), last_ready(button).unwrap());
        assert!(card_ready < button_ready);
    }

    // ── nested setup polling ─────────────────────────────────────────────

    #[test]
    fn child_polls_until_parent_is_ready() {
        let (mut rt, clock) = runtime();
        let root = rt.create_surface(root_config()).unwrap();
        let child = rt.create_surface(GlassConfig::button("Ok", 22.0)).unwrap();
        rt.host_mut().place(child, 10.0, 10.0, 88.0, 55.0);
        rt.attach(root, child).unwrap();

        // Root not laid out yet: it keeps retrying, the child waits.
        rt.tick();
        rt.tick();
        assert_eq!(rt.state(root), Some(SurfaceState::LayoutPending));
        assert_eq!(rt.state(child), Some(SurfaceState::NestedPending));

        clock.advance(Duration::from_millis(50));
        rt.host_mut().place(root, 0.0, 0.0, 720.0, 200.0);
        rt.tick();
        assert_eq!(rt.state(root), Some(SurfaceState::StandaloneReady));
        assert_eq!(rt.state(child), Some(SurfaceState::NestedPending));

        clock.advance(Duration::from_millis(50));
        rt.tick();
        assert_eq!(rt.state(child), Some(SurfaceState::NestedReady));

        let events = rt.take_events();
        assert!(
            reached_at(&events, root, SurfaceState::StandaloneReady)
                < reached_at(&events, child, SurfaceState::NestedReady)
        );
    }

    #[test]
    fn retry_interval_is_configurable() {
        let (rt, clock) = runtime();
        let mut rt = rt.with_config(SchedulerConfig {
            nested_retry: Duration::from_millis(10),
        });
        let root = rt.create_surface(root_config()).unwrap();
        let child = rt.create_surface(GlassConfig::default()).unwrap();
        rt.host_mut().place(child, 0.0, 0.0, 50.0, 50.0);
        rt.attach(root, child).unwrap();
        rt.tick();
        rt.tick();

        rt.host_mut().place(root, 0.0, 0.0, 200.0, 200.0);
        rt.tick();
        clock.advance(Duration::from_millis(10));
        rt.tick();
        assert_eq!(rt.state(child), Some(SurfaceState::NestedReady));
    }

    // ── deferral ──────────────────────────────────────────────────────────

    #[test]
    fn measurement_is_never_synchronous() {
        let (mut rt, _clock) = runtime();
        let root = rt.create_surface(root_config()).unwrap();
        rt.host_mut().place(root, 0.0, 0.0, 100.0, 100.0);
        assert!(rt.backend().configures(root).is_empty());
        rt.tick();
        assert_eq!(rt.backend().configures(root), vec![PixelSize::new(100, 100)]);
    }

    #[test]
    fn re_resolution_without_size_change_is_idempotent() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        rt.tick();
        rt.tick();
        let before = *rt.surface(child).unwrap().geometry();

        rt.notify_resize();
        rt.notify_resize();
        rt.tick();
        rt.relayout(child);
        rt.tick();

        assert_eq!(rt.backend().configures(root).len(), 1);
        assert_eq!(rt.backend().configures(child).len(), 1);
        assert_eq!(*rt.surface(child).unwrap().geometry(), before);
        assert_eq!(rt.state(child), Some(SurfaceState::NestedReady));
    }

    #[test]
    fn work_queued_before_detach_becomes_a_no_op() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        rt.detach(root, child).unwrap();

        let report = rt.tick();
        assert!(report.stale_tasks > 0);
        assert_eq!(rt.state(child), Some(SurfaceState::Uninitialized));
        assert!(rt.backend().configures(child).is_empty());
        assert_eq!(rt.state(root), Some(SurfaceState::StandaloneReady));
    }

    // ── shape invariants ──────────────────────────────────────────────────

    #[test]
    fn circle_root_resolves_to_square() {
        let (mut rt, _clock) = runtime();
        let root = rt
            .create_surface(GlassConfig::default().with_shape(ShapeKind::Circle))
            .unwrap();
        rt.host_mut().place(root, 0.0, 0.0, 100.0, 90.0);
        rt.tick();

        let g = *rt.surface(root).unwrap().geometry();
        assert_eq!(g.size, PixelSize::new(100, 100));
        assert_eq!(g.radius, 50.0);
        assert_eq!(g.shape, ShapeKind::Circle);
        assert_eq!(rt.host().rects[&root].size.y, 100.0);
    }

    #[test]
    fn circle_button_content_is_square() {
        let (mut rt, _clock) = runtime();
        let id = rt
            .create_surface(GlassConfig::button("+", 20.0).with_shape(ShapeKind::Circle))
            .unwrap();
        let extent = rt.host().last_extent(id).unwrap();
        assert_eq!((extent.width, extent.height, extent.radius), (50.0, 50.0, 25.0));
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn broken_nested_program_only_invalidates_that_surface() {
        let (mut rt, _clock) = runtime();
        rt.programs_mut().set_source(ShaderVariant::Nested, "fn broken(");
        let (root, child) = root_with_pill(&mut rt);
        rt.tick();
        rt.tick();

        assert_eq!(rt.state(child), Some(SurfaceState::Invalid));
        assert_eq!(rt.state(root), Some(SurfaceState::StandaloneReady));
        rt.notify_scroll();
        assert_eq!(rt.tick().drawn, vec![root]);
    }

    #[test]
    fn unavailable_target_leaves_surface_uninitialized() {
        let (mut rt, _clock) = runtime();
        rt.backend_mut().fail_allocate = true;
        let id = rt.create_surface(root_config()).unwrap();
        assert_eq!(rt.state(id), Some(SurfaceState::Uninitialized));
        assert_eq!(rt.current_pixel_size(id), PixelSize::ZERO);
        assert!(rt.tick().drawn.is_empty());
    }

    #[test]
    fn oversized_target_is_released() {
        let (mut rt, _clock) = runtime();
        rt.backend_mut().max_dimension = 512;
        let id = rt.create_surface(root_config()).unwrap();
        rt.host_mut().place(id, 0.0, 0.0, 2000.0, 100.0);
        rt.tick();
        assert_eq!(rt.state(id), Some(SurfaceState::Uninitialized));
        assert!(!rt.backend().is_allocated(id));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (mut rt, _clock) = runtime();
        let err = rt
            .create_surface(GlassConfig::default().with_tint_opacity(2.0))
            .unwrap_err();
        assert_eq!(err, ConfigError::TintOutOfRange(2.0));
        assert!(rt.tree().is_empty());
    }

    #[test]
    fn structural_misuse_is_reported() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        assert_eq!(rt.attach(child, root), Err(TreeError::Cycle { parent: child, child: root }));
        let other = rt.create_surface(root_config()).unwrap();
        assert_eq!(
            rt.attach(other, child),
            Err(TreeError::AlreadyParented { child, parent: root })
        );
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn destroy_removes_subtree() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        rt.tick();
        rt.tick();

        rt.destroy(root).unwrap();
        assert!(rt.surface(root).is_none());
        assert!(rt.surface(child).is_none());
        assert_eq!(rt.host().forgotten, vec![root, child]);
        assert!(rt.tick().drawn.is_empty());
        assert_eq!(rt.destroy(root), Err(TreeError::UnknownSurface(root)));
    }

    #[test]
    fn detached_surface_can_be_remounted_as_root() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        rt.tick();
        rt.tick();
        rt.detach(root, child).unwrap();

        rt.mount(child).unwrap();
        assert_eq!(rt.state(child), Some(SurfaceState::LayoutPending));
        rt.tick();
        assert_eq!(rt.state(child), Some(SurfaceState::StandaloneReady));
        assert_eq!(rt.backend().program(child), Some(ShaderVariant::Standalone));
    }

    #[test]
    fn visible_handles_follow_paint_order() {
        let (mut rt, _clock) = runtime();
        let (root, child) = root_with_pill(&mut rt);
        assert!(rt.visible_handles().is_empty());
        rt.tick();
        rt.tick();

        let handles = rt.visible_handles();
        assert_eq!(handles.iter().map(|h| h.id).collect::<Vec<_>>(), vec![root, child]);
        assert_eq!(handles[0].radius, 44.0);
        assert_eq!(handles[1].screen_rect, Rect::new(40.0, 40.0, 110.0, 55.0));
        assert_eq!(rt.handle(child), Some(handles[1]));
        assert!(rt.wants_tick());
    }
}
