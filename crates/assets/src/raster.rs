use std::io::Write;
use std::path::Path;

use globeview_common::Color;

use crate::AssetError;

/// Row-major RGBA8 image, origin at the top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Raster {
    /// Create a raster filled with one opaque color.
    pub fn filled(width: u32, height: u32, color: Color) -> Result<Self, AssetError> {
        Self::filled_rgba(width, height, color.to_rgba8(1.0))
    }

    pub fn filled_rgba(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidSize { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![rgba; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Raw bytes, four per pixel, suitable for a GPU upload.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Overwrite one pixel. Out-of-bounds writes are ignored.
    pub fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = rgba;
        }
    }

    /// Source-over blend of `color` at `alpha` onto one pixel.
    pub fn blend(&mut self, x: u32, y: u32, color: Color, alpha: f32) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let a = alpha.clamp(0.0, 1.0);
        let dst = self.pixels[i];
        let src = color.to_rgba8(1.0);
        let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
        self.pixels[i] = [
            mix(src[0], dst[0]),
            mix(src[1], dst[1]),
            mix(src[2], dst[2]),
            dst[3].max((a * 255.0).round() as u8),
        ];
    }

    /// Additive blend (`dst += color * alpha`), saturating per channel.
    pub fn add(&mut self, x: u32, y: u32, color: Color, alpha: f32) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let a = alpha.max(0.0);
        let dst = self.pixels[i];
        let src = color.to_array();
        let add = |s: f32, d: u8| (d as f32 + s * a * 255.0).round().min(255.0) as u8;
        self.pixels[i] = [add(src[0], dst[0]), add(src[1], dst[1]), add(src[2], dst[2]), dst[3]];
    }

    /// Nearest-texel lookup. `u` wraps around, `v` clamps.
    pub fn sample(&self, u: f64, v: f64) -> [u8; 4] {
        let x = (u.rem_euclid(1.0) * self.width as f64) as u32;
        let y = (v.clamp(0.0, 1.0) * self.height as f64) as u32;
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn sample_color(&self, u: f64, v: f64) -> Color {
        let [r, g, b, _] = self.sample(u, v);
        Color::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Write as binary PPM (P6). Alpha is dropped.
    pub fn write_ppm(&self, mut out: impl Write) -> Result<(), AssetError> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let rgb: Vec<u8> = self.pixels.iter().flat_map(|p| [p[0], p[1], p[2]]).collect();
        out.write_all(&rgb)?;
        Ok(())
    }

    pub fn save_ppm(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write_ppm(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            Raster::filled(0, 4, Color::WHITE),
            Err(AssetError::InvalidSize { .. })
        ));
    }

    #[test]
    fn sample_wraps_u_and_clamps_v() {
        let mut r = Raster::filled_rgba(4, 2, [0, 0, 0, 255]).unwrap();
        r.put(0, 0, [9, 9, 9, 255]);
        r.put(3, 1, [7, 7, 7, 255]);
        assert_eq!(r.sample(1.0, -3.0), [9, 9, 9, 255]);
        assert_eq!(r.sample(-0.01, 2.0), [7, 7, 7, 255]);
    }

    #[test]
    fn blend_and_add() {
        let mut r = Raster::filled_rgba(1, 1, [0, 0, 0, 255]).unwrap();
        r.blend(0, 0, Color::WHITE, 0.5);
        assert_eq!(r.get(0, 0), Some([128, 128, 128, 255]));
        r.add(0, 0, Color::WHITE, 1.0);
        assert_eq!(r.get(0, 0), Some([255, 255, 255, 255]));
        r.put(5, 5, [1, 2, 3, 4]);
        assert_eq!(r.get(5, 5), None);
    }

    #[test]
    fn ppm_export() {
        let r = Raster::filled(3, 2, Color::hex(0x102030)).unwrap();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        r.save_ppm(tmp.path()).unwrap();
        let bytes = std::fs::read(tmp.path()).unwrap();
        let header = b"P6\n3 2\n255\n";
        assert!(bytes.starts_with(header));
        assert_eq!(bytes.len(), header.len() + 3 * 2 * 3);
        assert_eq!(&bytes[header.len()..header.len() + 3], &[0x10, 0x20, 0x30]);
    }
}
