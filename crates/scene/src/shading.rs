//! Pluggable surface shading for the translucent shells.
//!
//! Both shells use the same rim law, `intensity = max(c - dot(N, V), 0)^p`,
//! with different parameters and different rendered faces. `V` is the unit
//! axis pointing from the globe toward the camera.

use glam::Vec3;
use globeview_common::{Color, RimConfig};

/// Which side of a closed shell is rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

/// How a shell's color combines with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    Alpha,
    Additive,
}

/// Camera-facing axis in the globe's view space.
pub const VIEW_AXIS: Vec3 = Vec3::Z;

/// Per-fragment intensity function for a shell surface.
///
/// GPU backends mirror the function in WGSL using [`SurfaceShader::params`];
/// CPU backends call [`SurfaceShader::intensity`] directly.
pub trait SurfaceShader: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Unscaled intensity for a surface normal seen along `view_axis`.
    fn intensity(&self, normal: Vec3, view_axis: Vec3) -> f32;

    fn params(&self) -> &RimConfig;

    fn face(&self) -> Face;

    fn blend(&self) -> Blend {
        Blend::Additive
    }

    fn alpha(&self, normal: Vec3, view_axis: Vec3) -> f32 {
        self.intensity(normal, view_axis) * self.params().alpha_scale
    }

    fn color(&self) -> Color {
        self.params().color
    }
}

fn rim(c: f32, p: f32, normal: Vec3, view_axis: Vec3) -> f32 {
    let n = normal.normalize_or_zero();
    let base = (c - n.dot(view_axis)).max(0.0);
    base.powf(p)
}

/// Outer halo. Drawn from the inside so only the band beyond the limb shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RimGlow {
    params: RimConfig,
}

impl RimGlow {
    pub fn new(params: RimConfig) -> Self {
        Self { params }
    }
}

impl SurfaceShader for RimGlow {
    fn name(&self) -> &'static str {
        "glow"
    }

    fn intensity(&self, normal: Vec3, view_axis: Vec3) -> f32 {
        rim(self.params.c, self.params.p, normal, view_axis)
    }

    fn params(&self) -> &RimConfig {
        &self.params
    }

    fn face(&self) -> Face {
        Face::Back
    }
}

/// Thin haze hugging the surface, strongest toward the limb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmosphere {
    params: RimConfig,
}

impl Atmosphere {
    pub fn new(params: RimConfig) -> Self {
        Self { params }
    }
}

impl SurfaceShader for Atmosphere {
    fn name(&self) -> &'static str {
        "atmosphere"
    }

    fn intensity(&self, normal: Vec3, view_axis: Vec3) -> f32 {
        rim(self.params.c, self.params.p, normal, view_axis)
    }

    fn params(&self) -> &RimConfig {
        &self.params
    }

    fn face(&self) -> Face {
        Face::Front
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::{EngineConfig, QualityPreset};

    fn cfg() -> EngineConfig {
        EngineConfig::preset(QualityPreset::Detailed)
    }

    #[test]
    fn glow_is_zero_facing_camera() {
        let glow = RimGlow::new(cfg().glow);
        assert_eq!(glow.intensity(VIEW_AXIS, VIEW_AXIS), 0.0);
        // Back face seen from the inside: normal points away, strongest.
        let back = glow.intensity(-VIEW_AXIS, VIEW_AXIS);
        assert!((back - 1.4f32.powf(4.0)).abs() < 1e-4);
        assert_eq!(glow.face(), Face::Back);
    }

    #[test]
    fn atmosphere_grows_toward_limb() {
        let atm = Atmosphere::new(cfg().atmosphere);
        let center = atm.intensity(VIEW_AXIS, VIEW_AXIS);
        let limb = atm.intensity(Vec3::X, VIEW_AXIS);
        assert_eq!(center, 0.0);
        assert!((limb - 0.49).abs() < 1e-5);
        assert!((atm.alpha(Vec3::X, VIEW_AXIS) - 0.49 * 0.3).abs() < 1e-5);
        assert_eq!(atm.face(), Face::Front);
    }

    #[test]
    fn negative_base_clamps_to_zero() {
        let mut params = cfg().atmosphere;
        params.p = 2.5;
        let atm = Atmosphere::new(params);
        let v = atm.intensity(VIEW_AXIS, VIEW_AXIS);
        assert!(v.is_finite());
        assert_eq!(v, 0.0);
    }

    #[test]
    fn shaders_are_interchangeable() {
        let shaders: Vec<Box<dyn SurfaceShader>> = vec![
            Box::new(RimGlow::new(cfg().glow)),
            Box::new(Atmosphere::new(cfg().atmosphere)),
        ];
        for s in &shaders {
            let n = Vec3::new(1.0, 0.0, 1.0);
            let a = s.alpha(n, VIEW_AXIS);
            assert!((0.0..=1.0).contains(&a), "{} alpha {a}", s.name());
            assert_eq!(s.blend(), Blend::Additive);
        }
    }
}
