use glam::{Mat4, Vec2, Vec3};
use globeview_common::{CameraConfig, Extent};

/// Fixed perspective camera on +Z looking at the globe center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    extent: Extent,
}

impl PerspectiveCamera {
    pub fn new(cfg: &CameraConfig, extent: Extent) -> Self {
        let extent = extent.clamped();
        Self {
            fov_y: cfg.fov_y_degrees.to_radians(),
            aspect: extent.aspect(),
            near: cfg.near,
            far: cfg.far,
            distance: cfg.distance,
            extent,
        }
    }

    /// Recompute the aspect ratio for a new container size. Zero sides clamp to one pixel.
    pub fn set_extent(&mut self, extent: Extent) {
        self.extent = extent.clamped();
        self.aspect = self.extent.aspect();
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Pixels per world unit at unit distance from the eye.
    pub fn focal_px(&self) -> f32 {
        self.extent.height as f32 * 0.5 / (self.fov_y * 0.5).tan()
    }

    /// World point to pixel coordinates plus eye distance along the view axis.
    /// `None` behind the eye or beyond the far plane.
    pub fn project(&self, p: Vec3) -> Option<(Vec2, f32)> {
        let clip = self.view_projection() * p.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if ndc.z > 1.0 {
            return None;
        }
        let px = (ndc.x + 1.0) * 0.5 * self.extent.width as f32;
        let py = (1.0 - ndc.y) * 0.5 * self.extent.height as f32;
        Some((Vec2::new(px, py), clip.w))
    }

    /// Unit ray through the center of pixel (`x`, `y`).
    pub fn ray(&self, x: u32, y: u32) -> (Vec3, Vec3) {
        let w = self.extent.width as f32;
        let h = self.extent.height as f32;
        let half = (self.fov_y * 0.5).tan();
        let nx = ((x as f32 + 0.5) / w * 2.0 - 1.0) * half * self.aspect;
        let ny = (1.0 - (y as f32 + 0.5) / h * 2.0) * half;
        (self.eye(), Vec3::new(nx, ny, -1.0).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::{EngineConfig, QualityPreset};

    fn camera(extent: Extent) -> PerspectiveCamera {
        PerspectiveCamera::new(&EngineConfig::preset(QualityPreset::Detailed).camera, extent)
    }

    #[test]
    fn center_projects_to_middle() {
        let cam = camera(Extent::new(800, 600));
        let (px, depth) = cam.project(Vec3::ZERO).unwrap();
        assert!((px.x - 400.0).abs() < 1e-3 && (px.y - 300.0).abs() < 1e-3);
        assert!((depth - 2.5).abs() < 1e-4);
        assert!(cam.project(Vec3::new(0.0, 0.0, 3.0)).is_none());
    }

    #[test]
    fn ray_and_projection_agree() {
        let cam = camera(Extent::new(640, 480));
        let (o, d) = cam.ray(100, 50);
        let (px, _) = cam.project(o + d * 2.0).unwrap();
        assert!((px.x - 100.5).abs() < 1e-2);
        assert!((px.y - 50.5).abs() < 1e-2);
    }

    #[test]
    fn zero_size_clamps() {
        let mut cam = camera(Extent::new(800, 600));
        cam.set_extent(Extent::new(0, 0));
        assert_eq!(cam.extent(), Extent::new(1, 1));
        assert_eq!(cam.aspect, 1.0);
        assert!(cam.view_projection().is_finite());
    }
}
