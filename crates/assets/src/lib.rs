//! Asset pipeline: procedural surface textures and a content-addressed registry.
//!
//! Assets are identified by content hashes. Renderers consume textures by
//! [`AssetId`], never by file path; nothing here touches the network or
//! reads image files.
//!
//! # Invariants
//! - Texture synthesis is a pure function of [`TextureConfig`](globeview_common::TextureConfig).
//! - Registering identical content twice yields the same id and one entry.

mod raster;
mod texture;

pub use raster::Raster;
pub use texture::generate_surface_texture;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Content-addressed asset ID computed from the asset data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid raster size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("grid spacing must be non-zero")]
    InvalidGrid,
}

/// A registered texture and the name it was registered under.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub name: String,
    pub raster: Arc<Raster>,
}

/// Content-addressed registry of textures shared by the scene and the
/// render backends.
#[derive(Debug, Default)]
pub struct AssetStore {
    textures: BTreeMap<AssetId, TextureAsset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture and return its content id.
    pub fn register_texture(&mut self, name: impl Into<String>, raster: Raster) -> AssetId {
        let id = content_hash(&raster);
        let name = name.into();
        tracing::debug!(%id, %name, width = raster.width(), height = raster.height(), "texture registered");
        self.textures.entry(id).or_insert_with(|| TextureAsset {
            name,
            raster: Arc::new(raster),
        });
        id
    }

    pub fn texture(&self, id: AssetId) -> Option<Arc<Raster>> {
        self.textures.get(&id).map(|t| Arc::clone(&t.raster))
    }

    pub fn texture_name(&self, id: AssetId) -> Option<&str> {
        self.textures.get(&id).map(|t| t.name.as_str())
    }

    /// Number of registered assets.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Drop every registered asset. Returns how many were released.
    pub fn clear(&mut self) -> usize {
        let n = self.textures.len();
        self.textures.clear();
        n
    }
}

fn content_hash(raster: &Raster) -> AssetId {
    let mut hasher = Sha256::new();
    hasher.update(raster.width().to_le_bytes());
    hasher.update(raster.height().to_le_bytes());
    for px in raster.pixels() {
        hasher.update(px);
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    AssetId(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::{Color, EngineConfig, QualityPreset};

    #[test]
    fn content_addressed_dedup() {
        let mut store = AssetStore::new();
        let a = store.register_texture("a", Raster::filled(2, 2, Color::WHITE).unwrap());
        let b = store.register_texture("b", Raster::filled(2, 2, Color::WHITE).unwrap());
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.texture_name(a), Some("a"));
    }

    #[test]
    fn presets_produce_distinct_textures() {
        let mut store = AssetStore::new();
        let ids: Vec<AssetId> = QualityPreset::ALL
            .iter()
            .map(|p| {
                let tex = generate_surface_texture(&EngineConfig::preset(*p).texture).unwrap();
                store.register_texture(p.name(), tex)
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.texture(ids[1]).unwrap().width(), 512);
    }

    #[test]
    fn clear_releases_everything() {
        let mut store = AssetStore::new();
        let id = store.register_texture("t", Raster::filled(1, 1, Color::WHITE).unwrap());
        assert_eq!(store.clear(), 1);
        assert!(store.is_empty());
        assert!(store.texture(id).is_none());
    }
}
