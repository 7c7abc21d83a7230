use globeview_assets::AssetStore;
use globeview_common::{ConfigError, Extent, FrameRequest, ListenerId};
use globeview_render::{RenderError, RenderSurface};
use globeview_scene::{Scene, SceneError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("host container is not mounted")]
    NotMounted,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("scene construction failed: {0}")]
    Scene(#[from] SceneError),
    #[error("render surface unavailable: {0}")]
    Surface(#[from] RenderError),
}

/// Host events the engine subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerMove,
    Resize,
}

/// An event delivered by the host to a registered listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// Pointer position in container pixels.
    PointerMoved { x: f64, y: f64 },
    /// The container changed size; the new bounds are read from the host.
    Resized,
}

impl HostEvent {
    pub fn kind(&self) -> ListenerKind {
        match self {
            HostEvent::PointerMoved { .. } => ListenerKind::PointerMove,
            HostEvent::Resized => ListenerKind::Resize,
        }
    }
}

/// The environment an engine is mounted into: a window, an offscreen
/// harness, or a test double.
///
/// Everything the engine acquires from the host is returned to it during
/// teardown: listeners through [`Host::remove_listener`] and the pending
/// frame callback through [`Host::cancel_frame`].
pub trait Host {
    type Surface: RenderSurface;

    /// Current container bounds, or `None` when the container is not mounted.
    fn container_extent(&self) -> Option<Extent>;

    /// Create a render surface for the container and upload `scene` to it.
    fn create_surface(
        &mut self,
        extent: Extent,
        scene: &Scene,
        assets: &AssetStore,
    ) -> Result<Self::Surface, RenderError>;

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);

    /// Schedule one frame callback. The host later calls
    /// [`GlobeEngine::on_frame`](crate::GlobeEngine::on_frame) with the token.
    fn request_frame(&mut self) -> FrameRequest;

    fn cancel_frame(&mut self, frame: FrameRequest);
}
