//! Procedural globe surface: ocean fill, landmass ellipses with an outline,
//! and a translucent latitude/longitude grid. No external image is read.

use globeview_common::{LandmassEllipse, TextureConfig};

use crate::{AssetError, Raster};

/// Synthesize the equirectangular surface texture described by `cfg`.
///
/// Deterministic: the same configuration always yields the same pixels.
pub fn generate_surface_texture(cfg: &TextureConfig) -> Result<Raster, AssetError> {
    let _span = tracing::debug_span!("surface_texture", width = cfg.width, height = cfg.height)
        .entered();
    if cfg.grid_spacing == 0 {
        return Err(AssetError::InvalidGrid);
    }

    let mut raster = Raster::filled(cfg.width, cfg.height, cfg.ocean)?;

    // Painter's order: each landmass is filled then outlined before the next.
    for ellipse in &cfg.landmasses {
        paint_landmass(&mut raster, cfg, ellipse);
    }

    paint_grid(&mut raster, cfg);

    tracing::debug!(landmasses = cfg.landmasses.len(), "surface texture synthesized");
    Ok(raster)
}

fn paint_landmass(raster: &mut Raster, cfg: &TextureConfig, ellipse: &LandmassEllipse) {
    let w = cfg.width as f32;
    let h = cfg.height as f32;
    let cx = ellipse.center[0] * w;
    let cy = ellipse.center[1] * h;
    let rx = (ellipse.radii[0] * w).max(0.5);
    let ry = (ellipse.radii[1] * h).max(0.5);
    let half_stroke = cfg.outline_width * 0.5;
    let (sin_r, cos_r) = ellipse.rotation.sin_cos();

    let reach = rx.max(ry) + half_stroke + 1.0;
    let x0 = (cx - reach).floor().max(0.0) as u32;
    let y0 = (cy - reach).floor().max(0.0) as u32;
    let x1 = ((cx + reach).ceil() as u32).min(cfg.width);
    let y1 = ((cy + reach).ceil() as u32).min(cfg.height);

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            // Undo the ellipse rotation.
            let lx = dx * cos_r + dy * sin_r;
            let ly = -dx * sin_r + dy * cos_r;

            let q = ((lx / rx).powi(2) + (ly / ry).powi(2)).sqrt();
            if q <= 1.0 {
                raster.put(x, y, cfg.land.to_rgba8(1.0));
            }

            // First-order distance to the boundary: (q - 1) / |grad q|.
            let grad = ((lx / (rx * rx)).powi(2) + (ly / (ry * ry)).powi(2)).sqrt();
            if q > 0.0 && grad > 0.0 {
                let dist = (q - 1.0) * q / grad;
                if dist.abs() <= half_stroke {
                    raster.put(x, y, cfg.outline.to_rgba8(1.0));
                }
            }
        }
    }
}

fn paint_grid(raster: &mut Raster, cfg: &TextureConfig) {
    let step = cfg.grid_spacing as usize;
    for x in (0..cfg.width).step_by(step) {
        for y in 0..cfg.height {
            raster.blend(x, y, cfg.grid, cfg.grid_alpha);
        }
    }
    for y in (0..cfg.height).step_by(step) {
        for x in 0..cfg.width {
            raster.blend(x, y, cfg.grid, cfg.grid_alpha);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::{EngineConfig, QualityPreset};

    fn detailed() -> TextureConfig {
        EngineConfig::preset(QualityPreset::Detailed).texture
    }

    #[test]
    fn size_follows_config() {
        let lite = EngineConfig::preset(QualityPreset::Lite).texture;
        let t = generate_surface_texture(&lite).unwrap();
        assert_eq!((t.width(), t.height()), (512, 256));
    }

    #[test]
    fn deterministic() {
        let a = generate_surface_texture(&detailed()).unwrap();
        let b = generate_surface_texture(&detailed()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn landmass_center_is_land_and_corner_is_ocean() {
        let cfg = detailed();
        let t = generate_surface_texture(&cfg).unwrap();
        // Africa's center, away from any grid line.
        assert_eq!(t.get(540, 280), Some(cfg.land.to_rgba8(1.0)));
        // Open ocean in the south Pacific, off the grid.
        assert_eq!(t.get(10, 500), Some(cfg.ocean.to_rgba8(1.0)));
    }

    #[test]
    fn outline_surrounds_landmass() {
        let cfg = detailed();
        let t = generate_surface_texture(&cfg).unwrap();
        // Europe spans x = 520 ± 50 at y = 140; its east rim is near x = 570.
        let rim = (566..574).any(|x| t.get(x, 140) == Some(cfg.outline.to_rgba8(1.0)));
        assert!(rim);
    }

    #[test]
    fn grid_lines_tint_ocean() {
        let cfg = detailed();
        let t = generate_surface_texture(&cfg).unwrap();
        let ocean = cfg.ocean.to_rgba8(1.0);
        let on_line = t.get(64, 500).unwrap();
        assert_ne!(on_line, ocean);
        assert_eq!(t.get(65, 500), Some(ocean));
    }

    #[test]
    fn zero_grid_spacing_is_an_error() {
        let mut cfg = detailed();
        cfg.grid_spacing = 0;
        assert!(matches!(
            generate_surface_texture(&cfg),
            Err(AssetError::InvalidGrid)
        ));
    }
}
