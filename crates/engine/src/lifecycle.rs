use globeview_assets::AssetStore;
use globeview_common::{EngineConfig, Extent, FrameRequest, GeoEntity, ListenerId, Orientation};
use globeview_input::InteractionController;
use globeview_kernel::{AnimationScheduler, AnimationState};
use globeview_render::{FrameStatus, FrameView, PerspectiveCamera, RenderError, RenderSurface};
use globeview_scene::{Scene, build_scene};

use crate::host::{EngineError, Host, HostEvent, ListenerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Init,
    Running,
    Disposed,
}

/// A globe mounted into a [`Host`].
///
/// The engine is `Running` from the moment [`GlobeEngine::initialize`]
/// returns until [`GlobeEngine::dispose`] (or drop). Disposal is idempotent.
pub struct GlobeEngine<H: Host> {
    host: H,
    phase: EnginePhase,
    scene: Scene,
    assets: AssetStore,
    surface: Option<H::Surface>,
    camera: PerspectiveCamera,
    controller: InteractionController,
    scheduler: AnimationScheduler,
    listeners: Vec<(ListenerKind, ListenerId)>,
    extent: Extent,
    frames_rendered: u64,
}

impl<H: Host> GlobeEngine<H> {
    /// Build the scene, acquire a surface, register listeners and schedule
    /// the first frame.
    ///
    /// Every fallible step runs before the first listener is added, so on
    /// error the host has nothing to release.
    pub fn initialize(
        mut host: H,
        entities: &[GeoEntity],
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let _span = tracing::info_span!("engine_initialize", preset = %config.preset).entered();

        let extent = host.container_extent().ok_or(EngineError::NotMounted)?;
        config.validate()?;

        let mut assets = AssetStore::new();
        let scene = build_scene(entities, config, &mut assets)?;
        let surface = host.create_surface(extent.clamped(), &scene, &assets)?;
        let camera = PerspectiveCamera::new(&config.camera, extent);

        let mut engine = Self {
            host,
            phase: EnginePhase::Init,
            scene,
            assets,
            surface: Some(surface),
            camera,
            controller: InteractionController::new(&config.motion),
            scheduler: AnimationScheduler::new(config.motion, config.stars.rotation_speed),
            listeners: Vec::with_capacity(2),
            extent,
            frames_rendered: 0,
        };

        for kind in [ListenerKind::PointerMove, ListenerKind::Resize] {
            let id = engine.host.add_listener(kind);
            engine.listeners.push((kind, id));
        }
        let first = engine.host.request_frame();
        // A fresh scheduler is Idle, so start cannot fail here.
        if let Err(e) = engine.scheduler.start(first) {
            tracing::warn!(error = %e, "animation scheduler refused to start");
        }
        engine.phase = EnginePhase::Running;

        tracing::info!(
            entities = entities.len(),
            markers = engine.scene.markers.len(),
            width = extent.width,
            height = extent.height,
            "globe engine running"
        );
        Ok(engine)
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn surface(&self) -> Option<&H::Surface> {
        self.surface.as_ref()
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn state(&self) -> &AnimationState {
        self.scheduler.state()
    }

    pub fn target(&self) -> Orientation {
        self.controller.target()
    }

    /// Last container bounds seen, before clamping.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Re-read the container bounds and apply them to the camera and surface.
    ///
    /// No-op once disposed or while the container is unmounted. A zero-sized
    /// container is clamped to one pixel.
    pub fn resize(&mut self) {
        if self.phase != EnginePhase::Running {
            tracing::debug!(phase = ?self.phase, "resize ignored");
            return;
        }
        let Some(extent) = self.host.container_extent() else {
            tracing::debug!("resize ignored: container not mounted");
            return;
        };
        let _span = tracing::info_span!("engine_resize", width = extent.width, height = extent.height)
            .entered();
        self.extent = extent;
        self.camera.set_extent(extent);
        if let Some(surface) = &mut self.surface {
            surface.resize(extent.clamped());
        }
    }

    /// Dispatch an event from one of the engine's listeners.
    ///
    /// Events for listeners that are not registered, including every event
    /// after disposal, are dropped.
    pub fn handle_event(&mut self, event: HostEvent) {
        if self.phase != EnginePhase::Running {
            tracing::debug!(?event, "late event dropped");
            return;
        }
        if !self.listeners.iter().any(|(kind, _)| *kind == event.kind()) {
            tracing::warn!(?event, "event for unregistered listener dropped");
            return;
        }
        match event {
            HostEvent::PointerMoved { x, y } => {
                self.controller.pointer_moved(x, y, self.extent);
            }
            HostEvent::Resized => self.resize(),
        }
    }

    /// Run one animation tick for `frame`, render, and schedule the next frame.
    ///
    /// Returns `Ok(false)` when the token is stale or the engine is not
    /// running. Only frames the surface reports as presented count towards
    /// [`GlobeEngine::frames_rendered`]. A render failure is returned after
    /// the next frame has been scheduled, so the host decides whether to
    /// keep going.
    pub fn on_frame(&mut self, frame: FrameRequest) -> Result<bool, RenderError> {
        if self.phase != EnginePhase::Running {
            tracing::trace!(frame = frame.0, "frame after dispose ignored");
            return Ok(false);
        }
        let target = self.controller.target();
        let Some(state) = self.scheduler.on_frame(frame, target) else {
            return Ok(false);
        };

        let rendered = match &mut self.surface {
            Some(surface) => surface.render(&FrameView {
                scene: &self.scene,
                assets: &self.assets,
                state,
                camera: &self.camera,
            }),
            None => Err(RenderError::Detached),
        };
        match rendered {
            Ok(FrameStatus::Presented) => self.frames_rendered += 1,
            Ok(FrameStatus::Skipped) => {
                tracing::trace!(frame = frame.0, "surface skipped frame");
            }
            Err(_) => {}
        }

        let next = self.host.request_frame();
        if let Err(e) = self.scheduler.rearm(next) {
            tracing::warn!(error = %e, "could not rearm scheduler");
            self.host.cancel_frame(next);
        }
        rendered.map(|_| true)
    }

    /// Tear down in order: listeners, scheduler, surface detach, resource
    /// release. Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.phase == EnginePhase::Disposed {
            return;
        }
        let _span = tracing::info_span!("engine_dispose").entered();

        for (kind, id) in self.listeners.drain(..) {
            tracing::debug!(?kind, "removing listener");
            self.host.remove_listener(id);
        }
        if let Some(pending) = self.scheduler.cancel() {
            self.host.cancel_frame(pending);
        }
        let mut released = 0;
        if let Some(mut surface) = self.surface.take() {
            surface.detach();
            released = surface.release_resources();
        }
        let assets = self.assets.clear();
        self.phase = EnginePhase::Disposed;

        tracing::info!(
            ticks = self.scheduler.state().tick,
            frames = self.frames_rendered,
            released,
            assets,
            "globe engine disposed"
        );
    }
}

impl<H: Host> Drop for GlobeEngine<H> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::QualityPreset;
    use globeview_render::OffscreenSurface;
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeSet;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateSurface(Extent),
        AddListener(ListenerKind, ListenerId),
        RemoveListener(ListenerId),
        RequestFrame(FrameRequest),
        CancelFrame(FrameRequest),
        Render,
        Detach,
        Release,
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    struct RecordingSurface {
        inner: OffscreenSurface,
        log: Log,
        skip: Rc<Cell<bool>>,
    }

    impl RenderSurface for RecordingSurface {
        fn resize(&mut self, extent: Extent) {
            self.inner.resize(extent);
        }

        fn render(&mut self, frame: &FrameView<'_>) -> Result<FrameStatus, RenderError> {
            self.log.borrow_mut().push(Call::Render);
            if self.skip.get() {
                return Ok(FrameStatus::Skipped);
            }
            self.inner.render(frame)
        }

        fn detach(&mut self) {
            self.log.borrow_mut().push(Call::Detach);
            self.inner.detach();
        }

        fn release_resources(&mut self) -> usize {
            self.log.borrow_mut().push(Call::Release);
            self.inner.release_resources()
        }
    }

    struct MockHost {
        extent: Rc<RefCell<Option<Extent>>>,
        fail_surface: bool,
        skip_frames: Rc<Cell<bool>>,
        next_frame: u64,
        log: Log,
    }

    impl MockHost {
        fn new(extent: Extent) -> Self {
            Self {
                extent: Rc::new(RefCell::new(Some(extent))),
                fail_surface: false,
                skip_frames: Rc::default(),
                next_frame: 0,
                log: Log::default(),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.log.borrow().clone()
        }
    }

    impl Host for MockHost {
        type Surface = RecordingSurface;

        fn container_extent(&self) -> Option<Extent> {
            *self.extent.borrow()
        }

        fn create_surface(
            &mut self,
            extent: Extent,
            _scene: &Scene,
            _assets: &AssetStore,
        ) -> Result<RecordingSurface, RenderError> {
            if self.fail_surface {
                return Err(RenderError::SurfaceUnavailable("no context".into()));
            }
            self.log.borrow_mut().push(Call::CreateSurface(extent));
            Ok(RecordingSurface {
                inner: OffscreenSurface::new(extent),
                log: self.log.clone(),
                skip: self.skip_frames.clone(),
            })
        }

        fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
            let id = ListenerId::new();
            self.log.borrow_mut().push(Call::AddListener(kind, id));
            id
        }

        fn remove_listener(&mut self, id: ListenerId) {
            self.log.borrow_mut().push(Call::RemoveListener(id));
        }

        fn request_frame(&mut self) -> FrameRequest {
            self.next_frame += 1;
            let frame = FrameRequest(self.next_frame);
            self.log.borrow_mut().push(Call::RequestFrame(frame));
            frame
        }

        fn cancel_frame(&mut self, frame: FrameRequest) {
            self.log.borrow_mut().push(Call::CancelFrame(frame));
        }
    }

    fn config() -> EngineConfig {
        let mut cfg = EngineConfig::preset(QualityPreset::Lite);
        cfg.stars.count = 20;
        cfg
    }

    fn entities() -> Vec<GeoEntity> {
        vec![
            GeoEntity::new("BLR", 77.5946, 12.9716, 68.0),
            GeoEntity::new("BOM", 72.8777, 19.0760, 78.0),
        ]
    }

    fn engine() -> GlobeEngine<MockHost> {
        GlobeEngine::initialize(MockHost::new(Extent::new(32, 24)), &entities(), &config()).unwrap()
    }

    #[test]
    fn initialize_registers_listeners_then_first_frame() {
        let engine = engine();
        assert_eq!(engine.phase(), EnginePhase::Running);
        assert_eq!(engine.scene().markers.len(), 2);
        let calls = engine.host().calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], Call::CreateSurface(Extent::new(32, 24)));
        assert!(matches!(calls[1], Call::AddListener(ListenerKind::PointerMove, _)));
        assert!(matches!(calls[2], Call::AddListener(ListenerKind::Resize, _)));
        assert_eq!(calls[3], Call::RequestFrame(FrameRequest(1)));
    }

    #[test]
    fn unmounted_container_fails_before_listeners() {
        let host = MockHost::new(Extent::new(32, 24));
        *host.extent.borrow_mut() = None;
        let log = host.log.clone();
        let err = GlobeEngine::initialize(host, &entities(), &config()).err();
        assert!(matches!(err, Some(EngineError::NotMounted)));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn surface_failure_fails_before_listeners() {
        let mut host = MockHost::new(Extent::new(32, 24));
        host.fail_surface = true;
        let log = host.log.clone();
        let err = GlobeEngine::initialize(host, &entities(), &config()).err();
        assert!(matches!(
            err,
            Some(EngineError::Surface(RenderError::SurfaceUnavailable(_)))
        ));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn invalid_config_fails_before_surface() {
        let host = MockHost::new(Extent::new(32, 24));
        let log = host.log.clone();
        let mut cfg = config();
        cfg.motion.damping = 0.0;
        let err = GlobeEngine::initialize(host, &entities(), &cfg).err();
        assert!(matches!(err, Some(EngineError::Config(_))));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn frame_ticks_renders_and_rearms() {
        let mut engine = engine();
        assert!(engine.on_frame(FrameRequest(1)).unwrap());
        assert_eq!(engine.state().tick, 1);
        assert_eq!(engine.frames_rendered(), 1);
        let calls = engine.host().calls();
        assert_eq!(
            &calls[calls.len() - 2..],
            &[Call::Render, Call::RequestFrame(FrameRequest(2))]
        );

        // Stale and duplicate tokens do not tick.
        assert!(!engine.on_frame(FrameRequest(1)).unwrap());
        assert_eq!(engine.state().tick, 1);
        assert!(engine.on_frame(FrameRequest(2)).unwrap());
        assert_eq!(engine.state().tick, 2);
    }

    #[test]
    fn pointer_events_write_target_only() {
        let mut engine = engine();
        engine.handle_event(HostEvent::PointerMoved { x: 32.0, y: 12.0 });
        assert!(engine.target().yaw > 0.0);
        assert_eq!(engine.state().rotation.current, Orientation::ZERO);

        engine.on_frame(FrameRequest(1)).unwrap();
        assert!(engine.state().rotation.current.yaw > 0.0);
    }

    #[test]
    fn dispose_tears_down_in_order() {
        let mut engine = engine();
        engine.on_frame(FrameRequest(1)).unwrap();
        let before = engine.host().calls().len();

        engine.dispose();
        let calls = engine.host().calls();
        let teardown = &calls[before..];
        assert_eq!(teardown.len(), 5);
        assert!(matches!(teardown[0], Call::RemoveListener(_)));
        assert!(matches!(teardown[1], Call::RemoveListener(_)));
        assert_eq!(teardown[2], Call::CancelFrame(FrameRequest(2)));
        assert_eq!(teardown[3], Call::Detach);
        assert_eq!(teardown[4], Call::Release);
        assert_eq!(engine.phase(), EnginePhase::Disposed);
        assert!(engine.assets().is_empty());
        assert!(engine.surface().is_none());

        engine.dispose();
        assert_eq!(engine.host().calls().len(), calls.len());
    }

    #[test]
    fn dispose_removes_exactly_the_added_listeners() {
        let mut engine = engine();
        engine.dispose();
        let calls = engine.host().calls();
        let added: BTreeSet<ListenerId> = calls
            .iter()
            .filter_map(|c| match c {
                Call::AddListener(_, id) => Some(*id),
                _ => None,
            })
            .collect();
        let removed: Vec<ListenerId> = calls
            .iter()
            .filter_map(|c| match c {
                Call::RemoveListener(id) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(added.len(), 2);
        assert_eq!(removed.len(), added.len());
        assert_eq!(removed.into_iter().collect::<BTreeSet<_>>(), added);
    }

    #[test]
    fn skipped_frames_tick_but_do_not_count() {
        let mut engine = engine();
        engine.host().skip_frames.set(true);
        assert!(engine.on_frame(FrameRequest(1)).unwrap());
        assert_eq!(engine.state().tick, 1);
        assert_eq!(engine.frames_rendered(), 0);
        assert_eq!(engine.surface().map(|s| s.inner.frames_rendered()), Some(0));

        engine.host().skip_frames.set(false);
        assert!(engine.on_frame(FrameRequest(2)).unwrap());
        assert_eq!(engine.frames_rendered(), 1);
    }

    #[test]
    fn late_events_after_dispose_are_no_ops() {
        let mut engine = engine();
        engine.dispose();
        let target = engine.target();
        let state = *engine.state();
        let calls = engine.host().calls().len();

        engine.handle_event(HostEvent::PointerMoved { x: 1.0, y: 1.0 });
        engine.handle_event(HostEvent::Resized);
        engine.resize();
        assert!(!engine.on_frame(FrameRequest(1)).unwrap());
        assert!(!engine.on_frame(FrameRequest(2)).unwrap());

        assert_eq!(engine.target(), target);
        assert_eq!(engine.state(), &state);
        assert_eq!(engine.host().calls().len(), calls);
    }

    #[test]
    fn resize_reads_container_and_clamps_zero() {
        let mut engine = engine();
        let extent = engine.host().extent.clone();

        *extent.borrow_mut() = Some(Extent::new(64, 0));
        engine.handle_event(HostEvent::Resized);
        assert_eq!(engine.extent(), Extent::new(64, 0));
        assert_eq!(engine.camera().extent(), Extent::new(64, 1));
        assert_eq!(engine.surface().map(|s| s.inner.extent()), Some(Extent::new(64, 1)));
        assert!(engine.camera().aspect.is_finite());

        *extent.borrow_mut() = None;
        engine.resize();
        assert_eq!(engine.extent(), Extent::new(64, 0));
    }

    #[test]
    fn drop_disposes() {
        let engine = engine();
        let log = engine.host().log.clone();
        drop(engine);
        let calls = log.borrow();
        assert_eq!(calls.last(), Some(&Call::Release));
        assert_eq!(
            calls
                .iter()
                .filter(|c| matches!(c, Call::CancelFrame(_)))
                .count(),
            1
        );
    }
}
