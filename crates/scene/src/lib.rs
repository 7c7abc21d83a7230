//! Scene construction for the globe.
//!
//! Everything here runs once, at initialization: the surface texture is
//! synthesized and registered, the four shells are meshed, every entity is
//! turned into a marker cluster, and the star field is scattered. The result
//! is plain data; nothing in a [`Scene`] changes per frame.
//!
//! # Invariants
//! - Marker layers sit at or above the unit surface, in dot, halo, ring,
//!   beam order.
//! - Marker phases equal the entity's index in the input slice.
//! - Markers and wireframe share the globe's rotation; rim shells do not rotate.

pub mod markers;
pub mod mesh;
pub mod shading;
pub mod shells;
pub mod stars;

pub use markers::{MarkerOverlay, MarkerVisual};
pub use mesh::{LineMesh, Mesh};
pub use shading::{Atmosphere, Blend, Face, RimGlow, SurfaceShader, VIEW_AXIS};
pub use shells::{Shell, ShellGeometry, ShellKind, ShellMaterial};
pub use stars::StarField;

use globeview_assets::{AssetError, AssetId, AssetStore, generate_surface_texture};
use globeview_common::{CameraConfig, ConfigError, EngineConfig, GeoEntity};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Immutable scene description consumed by every renderer.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Shells in draw order.
    pub shells: Vec<Shell>,
    pub markers: MarkerOverlay,
    pub stars: StarField,
    pub texture: AssetId,
    pub camera: CameraConfig,
}

impl Scene {
    pub fn shell(&self, kind: ShellKind) -> Option<&Shell> {
        self.shells.iter().find(|s| s.kind == kind)
    }
}

/// Build the full scene for `entities`, registering the surface texture in `assets`.
pub fn build_scene(
    entities: &[GeoEntity],
    config: &EngineConfig,
    assets: &mut AssetStore,
) -> Result<Scene, SceneError> {
    let _span = tracing::info_span!("build_scene", preset = %config.preset, entities = entities.len())
        .entered();
    config.validate()?;

    let raster = generate_surface_texture(&config.texture)?;
    let texture = assets.register_texture(format!("surface-{}", config.preset), raster);

    let shells = shells::build_shells(config, texture);
    let markers = markers::build_overlay(entities, &config.markers);
    let stars = StarField::generate(&config.stars);

    tracing::info!(
        shells = shells.len(),
        markers = markers.len(),
        stars = stars.len(),
        %texture,
        "scene built"
    );
    Ok(Scene {
        shells,
        markers,
        stars,
        texture,
        camera: config.camera,
    })
}
