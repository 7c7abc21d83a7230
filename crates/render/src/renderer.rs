use std::fmt::Write as _;

use globeview_assets::AssetStore;
use globeview_common::Extent;
use globeview_kernel::AnimationState;
use globeview_scene::Scene;

use crate::camera::PerspectiveCamera;

/// Everything a renderer reads to draw one frame.
///
/// Renderers never mutate the scene or the animation state; both are owned
/// by the engine.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub scene: &'a Scene,
    pub assets: &'a AssetStore,
    pub state: &'a AnimationState,
    pub camera: &'a PerspectiveCamera,
}

impl FrameView<'_> {
    pub fn extent(&self) -> Extent {
        self.camera.extent()
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, frame: &FrameView<'_>) -> Self::Output;
}

/// Human-readable frame summary. Useful for CLI output, logging and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &FrameView<'_>) -> String {
        let s = frame.state;
        let o = s.globe_orientation();
        let e = frame.extent();
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame (tick={}, time={:.3}s) ===", s.tick, s.time);
        let _ = writeln!(
            out,
            "Globe: yaw={:.4} pitch={:.4} (target yaw={:.4} pitch={:.4}) stars={:.4}",
            o.yaw, o.pitch, s.rotation.target.yaw, s.rotation.target.pitch, s.star_yaw
        );
        let _ = writeln!(out, "Viewport: {}x{} aspect={:.3}", e.width, e.height, frame.camera.aspect);
        let _ = writeln!(
            out,
            "Shells: {}  Stars: {}  Markers: {}",
            frame.scene.shells.len(),
            frame.scene.stars.len(),
            frame.scene.markers.len()
        );
        let pulse = frame.scene.markers.config.pulse;
        for m in &frame.scene.markers.markers {
            let p = s.pulse(m.phase, &pulse);
            let _ = writeln!(
                out,
                "  [{}] tier={} ring scale={:.3} opacity={:.3}",
                m.id, m.tier, p.scale, p.opacity
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::{EngineConfig, GeoEntity, QualityPreset};
    use globeview_scene::build_scene;

    #[test]
    fn debug_renderer_lists_markers() {
        let cfg = EngineConfig::preset(QualityPreset::Lite);
        let mut assets = AssetStore::new();
        let entities = vec![
            GeoEntity::new("BOM", 72.8777, 19.0760, 78.0),
            GeoEntity::new("LHR", -0.45, 51.47, 12.0),
        ];
        let scene = build_scene(&entities, &cfg, &mut assets).unwrap();
        let camera = PerspectiveCamera::new(&cfg.camera, Extent::new(320, 200));
        let state = AnimationState::new();
        let frame = FrameView {
            scene: &scene,
            assets: &assets,
            state: &state,
            camera: &camera,
        };
        let out = DebugTextRenderer::new().render(&frame);
        assert!(out.contains("tick=0"));
        assert!(out.contains("Markers: 2"));
        assert!(out.contains("[BOM] tier=high"));
        assert!(out.contains("[LHR] tier=low"));
        assert!(out.contains("320x200"));
    }
}
