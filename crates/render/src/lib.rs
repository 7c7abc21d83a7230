//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers never mutate the scene or the animation state.
//! - A frame is a pure function of [`FrameView`].
//!
//! The [`SoftwareRenderer`] is the reference implementation of the shading
//! contract and the headless fallback; GPU backends implement
//! [`RenderSurface`] without changing consumers.

pub mod camera;
mod renderer;
mod software;
mod surface;

pub use camera::PerspectiveCamera;
pub use renderer::{DebugTextRenderer, FrameView, Renderer};
pub use software::SoftwareRenderer;
pub use surface::{FrameStatus, OffscreenSurface, RenderError, RenderSurface};

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_assets::AssetStore;
    use globeview_common::{EngineConfig, Extent, QualityPreset};
    use globeview_kernel::AnimationState;
    use globeview_scene::build_scene;

    #[test]
    fn offscreen_surface_lifecycle() {
        let mut cfg = EngineConfig::preset(QualityPreset::Lite);
        cfg.stars.count = 10;
        let mut assets = AssetStore::new();
        let scene = build_scene(&[], &cfg, &mut assets).unwrap();
        let mut camera = PerspectiveCamera::new(&cfg.camera, Extent::new(32, 24));
        let state = AnimationState::new();

        let mut surface = OffscreenSurface::new(Extent::new(32, 24));
        surface.resize(Extent::new(40, 0));
        camera.set_extent(Extent::new(40, 0));
        assert_eq!(surface.extent(), Extent::new(40, 1));

        let frame = FrameView {
            scene: &scene,
            assets: &assets,
            state: &state,
            camera: &camera,
        };
        assert_eq!(surface.render(&frame).unwrap(), FrameStatus::Presented);
        assert_eq!(surface.frames_rendered(), 1);
        assert_eq!(surface.last_frame().map(|f| (f.width(), f.height())), Some((40, 1)));

        surface.detach();
        assert!(matches!(surface.render(&frame), Err(RenderError::Detached)));
        assert_eq!(surface.release_resources(), 1);
        assert_eq!(surface.release_resources(), 0);
    }

    #[test]
    fn rendered_frame_exports_as_ppm() {
        let cfg = EngineConfig::preset(QualityPreset::Lite);
        let mut assets = AssetStore::new();
        let scene = build_scene(&[], &cfg, &mut assets).unwrap();
        let camera = PerspectiveCamera::new(&cfg.camera, Extent::new(16, 12));
        let state = AnimationState::new();
        let frame = FrameView {
            scene: &scene,
            assets: &assets,
            state: &state,
            camera: &camera,
        };
        let img = SoftwareRenderer::new().render(&frame).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.ppm");
        img.save_ppm(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 13 + 16 * 12 * 3);
    }
}
