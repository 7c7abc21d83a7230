use globeview_assets::{AssetError, AssetId, Raster};
use globeview_common::Extent;

use crate::renderer::{FrameView, Renderer};
use crate::software::SoftwareRenderer;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("rendering surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("surface has been detached")]
    Detached,
    #[error("asset {0} not found")]
    MissingAsset(AssetId),
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Outcome of a successful [`RenderSurface::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// The backend dropped the frame (for example after reconfiguring a
    /// lost swapchain). Nothing was drawn.
    Skipped,
}

/// A drawable target owned by the engine for its mounted lifetime.
///
/// Teardown is two explicit steps: [`RenderSurface::detach`] disconnects the
/// surface from its window or container, then
/// [`RenderSurface::release_resources`] frees buffers and textures. Both are
/// idempotent.
pub trait RenderSurface {
    fn resize(&mut self, extent: Extent);

    fn render(&mut self, frame: &FrameView<'_>) -> Result<FrameStatus, RenderError>;

    fn detach(&mut self);

    /// Free backend buffers and textures. Returns how many were released.
    fn release_resources(&mut self) -> usize;
}

/// Headless surface backed by [`SoftwareRenderer`]; keeps the last frame.
#[derive(Debug)]
pub struct OffscreenSurface {
    renderer: SoftwareRenderer,
    extent: Extent,
    attached: bool,
    frame: Option<Raster>,
    frames_rendered: u64,
}

impl OffscreenSurface {
    pub fn new(extent: Extent) -> Self {
        Self {
            renderer: SoftwareRenderer::new(),
            extent: extent.clamped(),
            attached: true,
            frame: None,
            frames_rendered: 0,
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn last_frame(&self) -> Option<&Raster> {
        self.frame.as_ref()
    }

    pub fn take_frame(&mut self) -> Option<Raster> {
        self.frame.take()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl RenderSurface for OffscreenSurface {
    fn resize(&mut self, extent: Extent) {
        self.extent = extent.clamped();
    }

    fn render(&mut self, frame: &FrameView<'_>) -> Result<FrameStatus, RenderError> {
        if !self.attached {
            return Err(RenderError::Detached);
        }
        self.frame = Some(self.renderer.render(frame)?);
        self.frames_rendered += 1;
        Ok(FrameStatus::Presented)
    }

    fn detach(&mut self) {
        self.attached = false;
    }

    fn release_resources(&mut self) -> usize {
        usize::from(self.frame.take().is_some())
    }
}
