//! Engine configuration and the two named quality presets.
//!
//! There is no `Default` for [`EngineConfig`]: the high-fidelity and the
//! lightweight parameter sets are both legitimate and the host must choose
//! one explicitly (or supply a full YAML document).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("unknown preset {0:?} (expected \"detailed\" or \"lite\")")]
    UnknownPreset(String),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Linear RGB color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::hex(0xffffff);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as f32 / 255.0,
            g: ((rgb >> 8) & 0xff) as f32 / 255.0,
            b: (rgb & 0xff) as f32 / 255.0,
        }
    }

    pub fn scaled(self, k: f32) -> Self {
        Self::rgb(self.r * k, self.g * k, self.b * k)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn with_alpha(self, a: f32) -> [f32; 4] {
        [self.r, self.g, self.b, a]
    }

    pub fn to_rgba8(self, alpha: f32) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(alpha)]
    }
}

/// Named parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    /// High-resolution texture, dense star field, strong rim glow, marker beams.
    Detailed,
    /// Half-resolution texture, sparse stars, softer glow, no beams.
    Lite,
}

impl QualityPreset {
    pub const ALL: [QualityPreset; 2] = [QualityPreset::Detailed, QualityPreset::Lite];

    pub fn name(self) -> &'static str {
        match self {
            QualityPreset::Detailed => "detailed",
            QualityPreset::Lite => "lite",
        }
    }
}

impl std::fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "detailed" => Ok(QualityPreset::Detailed),
            "lite" => Ok(QualityPreset::Lite),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

/// Landmass silhouette drawn into the surface texture.
///
/// Center and radii are normalized to the canvas (x by width, y by height);
/// rotation is in radians, clockwise in image space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmassEllipse {
    pub name: String,
    pub center: [f32; 2],
    pub radii: [f32; 2],
    pub rotation: f32,
}

impl LandmassEllipse {
    const REFERENCE_WIDTH: f32 = 1024.0;
    const REFERENCE_HEIGHT: f32 = 512.0;

    /// Express an ellipse laid out on a 1024x512 reference canvas.
    fn on_reference(name: &str, cx: f32, cy: f32, rx: f32, ry: f32, rotation: f32) -> Self {
        Self {
            name: name.to_string(),
            center: [cx / Self::REFERENCE_WIDTH, cy / Self::REFERENCE_HEIGHT],
            radii: [rx / Self::REFERENCE_WIDTH, ry / Self::REFERENCE_HEIGHT],
            rotation,
        }
    }

    pub fn world() -> Vec<Self> {
        vec![
            Self::on_reference("north_america", 200.0, 150.0, 80.0, 60.0, -0.3),
            Self::on_reference("south_america", 280.0, 320.0, 40.0, 70.0, 0.2),
            Self::on_reference("europe", 520.0, 140.0, 50.0, 35.0, 0.0),
            Self::on_reference("africa", 540.0, 280.0, 55.0, 80.0, 0.0),
            Self::on_reference("asia", 700.0, 160.0, 120.0, 70.0, 0.0),
            Self::on_reference("australia", 820.0, 340.0, 45.0, 35.0, 0.3),
            Self::on_reference("india", 680.0, 250.0, 30.0, 40.0, 0.0),
        ]
    }
}

/// Procedural surface texture parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureConfig {
    pub width: u32,
    pub height: u32,
    /// Distance in pixels between latitude/longitude grid lines.
    pub grid_spacing: u32,
    pub ocean: Color,
    pub land: Color,
    pub outline: Color,
    pub outline_width: f32,
    pub grid: Color,
    pub grid_alpha: f32,
    pub landmasses: Vec<LandmassEllipse>,
}

impl TextureConfig {
    fn with_size(width: u32, height: u32, grid_spacing: u32) -> Self {
        Self {
            width,
            height,
            grid_spacing,
            ocean: Color::hex(0x0a1a2e),
            land: Color::hex(0x1a3a5c),
            outline: Color::hex(0x00d2ff),
            outline_width: 2.0,
            grid: Color::hex(0x00d2ff),
            grid_alpha: 0.15,
            landmasses: LandmassEllipse::world(),
        }
    }
}

/// One point light contributing to the base globe's shading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: [f32; 3],
    pub color: Color,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingConfig {
    pub ambient: Color,
    pub ambient_intensity: f32,
    pub lights: Vec<PointLight>,
}

/// Base textured sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobeConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub lighting: LightingConfig,
}

/// Decorative wireframe shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireframeConfig {
    pub radius: f32,
    pub segments: u32,
    pub opacity: f32,
    pub color: Color,
}

/// Rim-lit shell: `intensity = max(c - dot(N, view), 0)^p`, `alpha = intensity * alpha_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RimConfig {
    pub radius: f32,
    pub segments: u32,
    pub c: f32,
    pub p: f32,
    pub alpha_scale: f32,
    pub color: Color,
}

/// Ring pulse: `scale = 1 + sin(t*k + i) * amplitude`,
/// `opacity = base_opacity + sin(t*k + i) * opacity_spread`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseConfig {
    pub frequency: f64,
    pub amplitude: f64,
    pub base_opacity: f64,
    pub opacity_spread: f64,
}

/// Per-entity marker cluster sizing and radial layering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub dot_radius: f32,
    pub halo_radius: f32,
    pub halo_opacity: f32,
    pub ring_inner: f32,
    pub ring_outer: f32,
    pub ring_segments: u32,
    pub beam_radius: f32,
    pub beam_length: f32,
    pub beam_opacity: f32,
    pub show_beams: bool,
    /// Radial distance of each layer from the sphere center.
    pub dot_offset: f32,
    pub halo_offset: f32,
    pub ring_offset: f32,
    pub beam_offset: f32,
    pub pulse: PulseConfig,
}

/// Background star field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarConfig {
    pub count: u32,
    /// Edge length of the cube the stars are scattered in.
    pub spread: f32,
    pub size: f32,
    pub opacity: f32,
    /// Radians added to the star field's yaw each tick.
    pub rotation_speed: f64,
    pub seed: u64,
}

/// Rotation integration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Fraction of the remaining distance to the target closed per tick.
    pub damping: f64,
    /// Radians of yaw added each tick regardless of input.
    pub auto_rotation: f64,
    pub yaw_sensitivity: f64,
    pub pitch_sensitivity: f64,
    /// Seconds added to the animation clock each tick.
    pub time_step: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub preset: QualityPreset,
    pub texture: TextureConfig,
    pub globe: GlobeConfig,
    pub wireframe: WireframeConfig,
    pub glow: RimConfig,
    pub atmosphere: RimConfig,
    pub markers: MarkerConfig,
    pub stars: StarConfig,
    pub motion: MotionConfig,
    pub camera: CameraConfig,
}

impl EngineConfig {
    pub fn preset(preset: QualityPreset) -> Self {
        match preset {
            QualityPreset::Detailed => Self::detailed(),
            QualityPreset::Lite => Self::lite(),
        }
    }

    fn detailed() -> Self {
        let cyan = Color::hex(0x00d2ff);
        Self {
            preset: QualityPreset::Detailed,
            texture: TextureConfig::with_size(1024, 512, 64),
            globe: GlobeConfig {
                radius: 1.0,
                width_segments: 128,
                height_segments: 128,
                lighting: LightingConfig {
                    ambient: Color::hex(0x334466),
                    ambient_intensity: 0.8,
                    lights: vec![
                        PointLight {
                            position: [3.0, 3.0, 3.0],
                            color: cyan,
                            intensity: 2.0,
                        },
                        PointLight {
                            position: [-3.0, -3.0, 3.0],
                            color: Color::hex(0xa855f7),
                            intensity: 1.0,
                        },
                        PointLight {
                            position: [0.0, 5.0, 0.0],
                            color: Color::WHITE,
                            intensity: 0.5,
                        },
                    ],
                },
            },
            wireframe: WireframeConfig {
                radius: 1.005,
                segments: 32,
                opacity: 0.08,
                color: cyan,
            },
            glow: RimConfig {
                radius: 1.15,
                segments: 64,
                c: 0.4,
                p: 4.0,
                alpha_scale: 0.5,
                color: cyan,
            },
            atmosphere: RimConfig {
                radius: 1.02,
                segments: 64,
                c: 0.7,
                p: 2.0,
                alpha_scale: 0.3,
                color: cyan,
            },
            markers: MarkerConfig {
                dot_radius: 0.04,
                halo_radius: 0.06,
                halo_opacity: 0.3,
                ring_inner: 0.05,
                ring_outer: 0.07,
                ring_segments: 32,
                beam_radius: 0.005,
                beam_length: 0.15,
                beam_opacity: 0.6,
                show_beams: true,
                dot_offset: 1.02,
                halo_offset: 1.025,
                ring_offset: 1.03,
                beam_offset: 1.1,
                pulse: PulseConfig {
                    frequency: 3.0,
                    amplitude: 0.2,
                    base_opacity: 0.5,
                    opacity_spread: 0.3,
                },
            },
            stars: StarConfig {
                count: 3000,
                spread: 30.0,
                size: 0.03,
                opacity: 0.8,
                rotation_speed: 0.0001,
                seed: 0x5eed_57a2,
            },
            motion: MotionConfig {
                damping: 0.02,
                auto_rotation: 0.003,
                yaw_sensitivity: 0.5,
                pitch_sensitivity: 0.3,
                time_step: 0.016,
            },
            camera: CameraConfig {
                fov_y_degrees: 50.0,
                near: 0.1,
                far: 1000.0,
                distance: 2.5,
            },
        }
    }

    fn lite() -> Self {
        let mut cfg = Self::detailed();
        cfg.preset = QualityPreset::Lite;
        cfg.texture = TextureConfig::with_size(512, 256, 64);
        cfg.globe.width_segments = 64;
        cfg.globe.height_segments = 48;
        cfg.globe.lighting.lights.truncate(1);
        cfg.globe.lighting.ambient_intensity = 1.0;
        cfg.wireframe.segments = 24;
        cfg.wireframe.opacity = 0.06;
        cfg.glow = RimConfig {
            radius: 1.12,
            segments: 32,
            c: 0.5,
            p: 3.0,
            alpha_scale: 0.4,
            ..cfg.glow
        };
        cfg.atmosphere = RimConfig {
            segments: 32,
            p: 2.5,
            alpha_scale: 0.25,
            ..cfg.atmosphere
        };
        cfg.markers = MarkerConfig {
            dot_radius: 0.03,
            halo_radius: 0.045,
            ring_inner: 0.04,
            ring_outer: 0.055,
            ring_segments: 24,
            show_beams: false,
            ..cfg.markers
        };
        cfg.stars.count = 1000;
        cfg.stars.size = 0.04;
        cfg
    }

    /// Parse a full configuration document.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject parameter combinations that would divide by zero or never converge.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.texture;
        if t.width == 0 || t.height == 0 {
            return Err(invalid("texture", "width and height must be non-zero"));
        }
        if t.grid_spacing == 0 {
            return Err(invalid("texture.grid_spacing", "must be non-zero"));
        }
        if !(self.globe.radius > 0.0 && self.globe.radius.is_finite()) {
            return Err(invalid("globe.radius", "must be positive"));
        }
        if self.globe.width_segments < 3 || self.globe.height_segments < 2 {
            return Err(invalid("globe", "needs at least 3x2 segments"));
        }
        for (field, rim) in [("glow", &self.glow), ("atmosphere", &self.atmosphere)] {
            if !(rim.radius > self.globe.radius && rim.radius.is_finite()) {
                return Err(invalid(field, "shell radius must exceed the globe radius"));
            }
            if !(rim.p > 0.0 && rim.p.is_finite()) {
                return Err(invalid(field, "exponent p must be positive"));
            }
            if !(rim.c.is_finite() && rim.alpha_scale.is_finite()) {
                return Err(invalid(field, "c and alpha_scale must be finite"));
            }
            if rim.segments < 3 {
                return Err(invalid(field, "needs at least 3 segments"));
            }
        }
        let m = &self.markers;
        if !(m.ring_inner >= 0.0 && m.ring_outer > m.ring_inner && m.ring_outer.is_finite()) {
            return Err(invalid("markers.ring_outer", "must exceed ring_inner"));
        }
        if !(m.dot_offset >= 1.0
            && m.halo_offset >= m.dot_offset
            && m.ring_offset >= m.halo_offset
            && m.beam_offset >= m.ring_offset
            && m.beam_offset.is_finite())
        {
            return Err(invalid(
                "markers",
                "layer offsets must be >= 1 and non-decreasing (dot, halo, ring, beam)",
            ));
        }
        let d = self.motion.damping;
        if !(d > 0.0 && d <= 1.0) {
            return Err(invalid("motion.damping", format!("{d} not in (0, 1]")));
        }
        if !(self.motion.time_step > 0.0 && self.motion.time_step.is_finite()) {
            return Err(invalid("motion.time_step", "must be positive"));
        }
        for (field, v) in [
            ("motion.auto_rotation", self.motion.auto_rotation),
            ("motion.yaw_sensitivity", self.motion.yaw_sensitivity),
            ("motion.pitch_sensitivity", self.motion.pitch_sensitivity),
            ("stars.rotation_speed", self.stars.rotation_speed),
            ("markers.pulse.frequency", m.pulse.frequency),
            ("markers.pulse.amplitude", m.pulse.amplitude),
            ("markers.pulse.base_opacity", m.pulse.base_opacity),
            ("markers.pulse.opacity_spread", m.pulse.opacity_spread),
        ] {
            if !v.is_finite() {
                return Err(invalid(field, format!("{v} is not finite")));
            }
        }
        for (field, v) in [
            ("markers.dot_radius", m.dot_radius),
            ("markers.halo_radius", m.halo_radius),
            ("markers.beam_radius", m.beam_radius),
            ("markers.beam_length", m.beam_length),
            ("stars.size", self.stars.size),
        ] {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(invalid(field, format!("{v} must be finite and non-negative")));
            }
        }
        let c = &self.camera;
        if !(c.fov_y_degrees > 0.0 && c.fov_y_degrees < 180.0) {
            return Err(invalid("camera.fov_y_degrees", "must be in (0, 180)"));
        }
        if !(c.near > 0.0 && c.far > c.near && c.far.is_finite()) {
            return Err(invalid("camera", "requires 0 < near < far"));
        }
        if !(c.distance > self.glow.radius && c.distance < c.far) {
            return Err(invalid("camera.distance", "camera must sit outside the glow shell"));
        }
        if !(self.stars.spread > 0.0 && self.stars.spread.is_finite()) {
            return Err(invalid("stars.spread", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_presets_validate() {
        for p in QualityPreset::ALL {
            let cfg = EngineConfig::preset(p);
            assert_eq!(cfg.preset, p);
            cfg.validate().unwrap();
        }
    }

    #[test]
    fn presets_differ_in_fidelity() {
        let hi = EngineConfig::preset(QualityPreset::Detailed);
        let lo = EngineConfig::preset(QualityPreset::Lite);
        assert!(hi.texture.width > lo.texture.width);
        assert!(hi.stars.count > lo.stars.count);
        assert!(hi.texture.width / hi.texture.grid_spacing > lo.texture.width / lo.texture.grid_spacing);
        assert!(hi.markers.show_beams && !lo.markers.show_beams);
    }

    #[test]
    fn preset_from_str() {
        assert_eq!("Lite".parse::<QualityPreset>().unwrap(), QualityPreset::Lite);
        assert_eq!("detailed".parse::<QualityPreset>().unwrap(), QualityPreset::Detailed);
        assert!(matches!(
            "medium".parse::<QualityPreset>(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn yaml_round_trip_keeps_values() {
        let cfg = EngineConfig::preset(QualityPreset::Lite);
        let yaml = cfg.to_yaml().unwrap();
        let back = EngineConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn rejects_zero_damping_and_empty_texture() {
        let mut cfg = EngineConfig::preset(QualityPreset::Detailed);
        cfg.motion.damping = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { .. })));

        let mut cfg = EngineConfig::preset(QualityPreset::Detailed);
        cfg.texture.height = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_non_finite_parameters() {
        let base = EngineConfig::preset(QualityPreset::Detailed);
        let cases: [(&str, fn(&mut EngineConfig)); 10] = [
            ("time_step", |c| c.motion.time_step = f64::NAN),
            ("glow.p", |c| c.glow.p = f32::NAN),
            ("camera.distance", |c| c.camera.distance = f32::NAN),
            ("ring_inner", |c| c.markers.ring_inner = f32::NAN),
            ("auto_rotation", |c| c.motion.auto_rotation = f64::NAN),
            ("yaw_sensitivity", |c| c.motion.yaw_sensitivity = f64::INFINITY),
            ("star rotation", |c| c.stars.rotation_speed = f64::NAN),
            ("pulse.frequency", |c| c.markers.pulse.frequency = f64::NAN),
            ("pulse.opacity_spread", |c| c.markers.pulse.opacity_spread = f64::NAN),
            ("atmosphere.c", |c| c.atmosphere.c = f32::NAN),
        ];
        for (name, set) in cases {
            let mut cfg = base.clone();
            set(&mut cfg);
            assert!(
                matches!(cfg.validate(), Err(ConfigError::Invalid { .. })),
                "{name} accepted"
            );
        }
    }

    #[test]
    fn yaml_nan_is_rejected() {
        let yaml = EngineConfig::preset(QualityPreset::Lite).to_yaml().unwrap();
        let nan = yaml.replacen("time_step: ", "time_step: .nan #", 1);
        assert_ne!(nan, yaml);
        assert!(matches!(
            EngineConfig::from_yaml_str(&nan),
            Err(ConfigError::Invalid { field: "motion.time_step", .. })
        ));
    }

    #[test]
    fn rejects_inverted_marker_layers() {
        let mut cfg = EngineConfig::preset(QualityPreset::Detailed);
        cfg.markers.ring_offset = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn landmasses_are_normalized() {
        for e in LandmassEllipse::world() {
            assert!(e.center.iter().all(|c| (0.0..=1.0).contains(c)), "{}", e.name);
            assert!(e.radii.iter().all(|r| *r > 0.0 && *r < 0.5), "{}", e.name);
        }
    }

    #[test]
    fn hex_color() {
        let c = Color::hex(0xff8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }
}
