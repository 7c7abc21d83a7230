//! Shared vocabulary for the globe engine.
//!
//! # Invariants
//! - Projection is total: every (longitude, latitude) pair maps to a unit vector.
//! - Tier thresholds live in exactly one place ([`Tier::classify`]).
//! - Configuration has no `Default`; hosts pick a [`QualityPreset`] explicitly.

pub mod config;
pub mod geo;
pub mod tier;
pub mod types;

pub use config::{
    CameraConfig, Color, ConfigError, EngineConfig, GlobeConfig, LandmassEllipse,
    LightingConfig, MarkerConfig, MotionConfig, PointLight, PulseConfig, QualityPreset,
    RimConfig, StarConfig, TextureConfig, WireframeConfig,
};
pub use geo::{GeoCoord, project};
pub use tier::Tier;
pub use types::{EntityId, Extent, FrameRequest, GeoEntity, ListenerId, Orientation, Transform};
