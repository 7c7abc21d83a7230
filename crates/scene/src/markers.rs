//! Per-entity marker clusters.
//!
//! Every entity gets a dot, a halo, a pulsing ring and (when enabled) a
//! radial beam, layered at increasing distances from the sphere center.
//! Layer positions are expressed in the globe's local frame; the overlay
//! as a whole shares the globe's rotation.

use glam::{Quat, Vec3};
use globeview_common::{Color, EntityId, GeoEntity, MarkerConfig, Tier, Transform};

use crate::mesh::{self, Mesh};

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerVisual {
    pub id: EntityId,
    pub tier: Tier,
    pub color: Color,
    /// Unit-radius surface point.
    pub surface: Vec3,
    pub dot: Transform,
    pub halo: Transform,
    /// Static pose of the ring; the pulse scale is applied per frame.
    pub ring: Transform,
    pub beam: Option<Transform>,
    /// Pulse phase offset. Neighbouring rings pulse out of step.
    pub phase: f64,
}

/// Shared meshes plus every marker instance.
#[derive(Debug, Clone)]
pub struct MarkerOverlay {
    pub markers: Vec<MarkerVisual>,
    /// Unit sphere scaled per instance for dots and halos.
    pub sphere: Mesh,
    pub ring: Mesh,
    pub beam: Mesh,
    pub config: MarkerConfig,
}

impl MarkerOverlay {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Orientation whose local +Z points from `position` back at the origin.
pub fn look_at_center(position: Vec3) -> Quat {
    let inward = -position.normalize_or_zero();
    if inward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(Vec3::Z, inward)
}

/// Orientation whose local +Y points radially outward through `position`.
pub fn radial(position: Vec3) -> Quat {
    let outward = position.normalize_or_zero();
    if outward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(Vec3::Y, outward)
}

pub fn build_marker(entity: &GeoEntity, index: usize, cfg: &MarkerConfig) -> MarkerVisual {
    let surface = entity.coordinate.to_unit().as_vec3();
    let tier = Tier::classify(entity.metric);

    let dot = Transform::from_translation(surface * cfg.dot_offset).with_uniform_scale(cfg.dot_radius);
    let halo =
        Transform::from_translation(surface * cfg.halo_offset).with_uniform_scale(cfg.halo_radius);
    let ring_pos = surface * cfg.ring_offset;
    let ring = Transform::from_translation(ring_pos).with_rotation(look_at_center(ring_pos));
    let beam = cfg.show_beams.then(|| {
        let p = surface * cfg.beam_offset;
        Transform::from_translation(p).with_rotation(radial(p))
    });

    MarkerVisual {
        id: entity.id.clone(),
        tier,
        color: tier.color(),
        surface,
        dot,
        halo,
        ring,
        beam,
        phase: index as f64,
    }
}

pub fn build_overlay(entities: &[GeoEntity], cfg: &MarkerConfig) -> MarkerOverlay {
    let markers = entities
        .iter()
        .enumerate()
        .map(|(i, e)| build_marker(e, i, cfg))
        .collect();
    MarkerOverlay {
        markers,
        sphere: mesh::uv_sphere(1.0, 16, 16),
        ring: mesh::ring(cfg.ring_inner, cfg.ring_outer, cfg.ring_segments),
        beam: mesh::cylinder(cfg.beam_radius, cfg.beam_length, 8),
        config: *cfg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::{EngineConfig, QualityPreset};

    fn cfg(p: QualityPreset) -> MarkerConfig {
        EngineConfig::preset(p).markers
    }

    #[test]
    fn layers_are_radially_ordered() {
        let e = GeoEntity::new("INFY", 77.59, 12.97, 72.0);
        let m = build_marker(&e, 0, &cfg(QualityPreset::Detailed));
        let r = |t: &Transform| t.position.length();
        assert!((m.surface.length() - 1.0).abs() < 1e-5);
        assert!(r(&m.dot) >= 1.0);
        assert!(r(&m.dot) <= r(&m.halo));
        assert!(r(&m.halo) <= r(&m.ring));
        assert!(r(&m.ring) <= r(m.beam.as_ref().unwrap()));
        assert_eq!(m.tier, Tier::High);
        assert_eq!(m.color, Tier::High.color());
    }

    #[test]
    fn ring_faces_center_and_beam_points_out() {
        let e = GeoEntity::new("X", -40.0, 25.0, 10.0);
        let m = build_marker(&e, 3, &cfg(QualityPreset::Detailed));
        let ring_z = m.ring.rotation * Vec3::Z;
        assert!((ring_z + m.surface).length() < 1e-4);
        let beam = m.beam.unwrap();
        let beam_y = beam.rotation * Vec3::Y;
        assert!((beam_y - m.surface).length() < 1e-4);
        assert_eq!(m.phase, 3.0);
    }

    #[test]
    fn lite_preset_omits_beams() {
        let entities = vec![
            GeoEntity::new("A", 0.0, 0.0, 55.0),
            GeoEntity::new("B", 10.0, 10.0, 20.0),
        ];
        let overlay = build_overlay(&entities, &cfg(QualityPreset::Lite));
        assert_eq!(overlay.len(), 2);
        assert!(overlay.markers.iter().all(|m| m.beam.is_none()));
        assert_eq!(overlay.markers[0].tier, Tier::Mid);
        assert_eq!(overlay.markers[1].tier, Tier::Low);
        assert_eq!(overlay.markers[1].phase, 1.0);
    }

    #[test]
    fn empty_entity_list_is_valid() {
        let overlay = build_overlay(&[], &cfg(QualityPreset::Detailed));
        assert!(overlay.is_empty());
    }
}
