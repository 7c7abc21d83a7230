use glam::Vec3;
use globeview_common::StarConfig;

/// Background point cloud. Rotates slowly about +Y, independent of the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct StarField {
    pub positions: Vec<Vec3>,
    pub size: f32,
    pub opacity: f32,
}

impl StarField {
    /// Scatter `cfg.count` stars uniformly in a cube of edge `cfg.spread`
    /// centered on the origin. Same seed, same sky.
    pub fn generate(cfg: &StarConfig) -> Self {
        let mut state = cfg.seed;
        let mut coord = || (unit(splitmix64(&mut state)) - 0.5) * cfg.spread;
        let positions = (0..cfg.count)
            .map(|_| {
                let x = coord();
                let y = coord();
                let z = coord();
                Vec3::new(x, y, z)
            })
            .collect();
        Self {
            positions,
            size: cfg.size,
            opacity: cfg.opacity,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Top 24 bits as a float in [0, 1).
fn unit(bits: u64) -> f32 {
    (bits >> 40) as f32 / (1u64 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::{EngineConfig, QualityPreset};

    #[test]
    fn stars_fill_the_cube() {
        let cfg = EngineConfig::preset(QualityPreset::Detailed).stars;
        let field = StarField::generate(&cfg);
        assert_eq!(field.len(), 3000);
        let half = cfg.spread / 2.0;
        assert!(field.positions.iter().all(|p| p.abs().max_element() <= half));
        // Spread out rather than clumped at one corner.
        let mean = field.positions.iter().copied().sum::<Vec3>() / field.len() as f32;
        assert!(mean.length() < 1.5);
    }

    #[test]
    fn seed_determines_layout() {
        let mut cfg = EngineConfig::preset(QualityPreset::Lite).stars;
        let a = StarField::generate(&cfg);
        assert_eq!(a, StarField::generate(&cfg));
        cfg.seed += 1;
        assert_ne!(a.positions, StarField::generate(&cfg).positions);
    }
}
