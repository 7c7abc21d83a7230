use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoCoord;

/// Caller-supplied identifier of a plotted entity (ticker symbol, site code, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named point of interest with a 0-100 scalar metric.
///
/// Entities are supplied once when the engine is initialized and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEntity {
    pub id: EntityId,
    #[serde(flatten)]
    pub coordinate: GeoCoord,
    pub metric: f64,
}

impl GeoEntity {
    pub fn new(id: impl Into<String>, longitude: f64, latitude: f64, metric: f64) -> Self {
        Self {
            id: EntityId::new(id),
            coordinate: GeoCoord::new(longitude, latitude),
            metric,
        }
    }
}

/// Handle for a host event listener registered by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Token for one pending per-frame callback, issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameRequest(pub u64);

/// Pixel size of a drawable container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same extent with both sides clamped to at least one pixel.
    pub fn clamped(&self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }

    /// Width over height. A zero height is treated as one pixel.
    pub fn aspect(&self) -> f32 {
        let c = self.clamped();
        c.width as f32 / c.height as f32
    }
}

/// Yaw (about +Y) and pitch (about +X) in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f64,
    pub pitch: f64,
}

impl Orientation {
    pub const ZERO: Self = Self { yaw: 0.0, pitch: 0.0 };

    pub fn new(yaw: f64, pitch: f64) -> Self {
        Self { yaw, pitch }
    }

    /// Rotation applied to the globe group: pitch after yaw (X·Y order).
    pub fn to_quat(&self) -> Quat {
        Quat::from_rotation_x(self.pitch as f32) * Quat::from_rotation_y(self.yaw as f32)
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_id_uniqueness() {
        let a = ListenerId::new();
        let b = ListenerId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn zero_height_extent_has_finite_aspect() {
        let e = Extent::new(800, 0);
        assert!(e.is_empty());
        assert_eq!(e.aspect(), 800.0);
    }

    #[test]
    fn entity_json_uses_flat_coordinates() {
        let json = r#"{"id":"TCS","longitude":72.8,"latitude":19.0,"metric":81}"#;
        let entity: GeoEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.id.as_str(), "TCS");
        assert_eq!(entity.coordinate.longitude, 72.8);
        assert_eq!(entity.metric, 81.0);
    }
}
