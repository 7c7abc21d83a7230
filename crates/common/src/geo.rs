use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Geographic coordinate in degrees.
///
/// Expected domain is longitude in [-180, 180] and latitude in [-90, 90], but
/// nothing here enforces it: out-of-range values wrap through the trig
/// functions in [`project`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoCoord {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    pub fn to_unit(&self) -> DVec3 {
        project(self.longitude, self.latitude)
    }
}

/// Map (longitude, latitude) in degrees onto the unit sphere.
///
/// +Y is north, longitude 0 lies on +X and longitude grows toward -Z, which
/// matches the equirectangular texture layout `u = (lon + 180) / 360`.
/// Both poles collapse to `(0, ±1, 0)` for any longitude.
#[inline]
pub fn project(longitude: f64, latitude: f64) -> DVec3 {
    let lat_rad = latitude * PI / 180.0;
    let lon_rad = -longitude * PI / 180.0;
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    DVec3::new(cos_lat * lon_rad.cos(), sin_lat, cos_lat * lon_rad.sin())
}

/// Inverse of [`project`] for a point on (or near) the unit sphere.
pub fn unproject(p: DVec3) -> GeoCoord {
    let n = p.normalize_or_zero();
    let latitude = n.y.clamp(-1.0, 1.0).asin().to_degrees();
    let longitude = (-n.z).atan2(n.x).to_degrees();
    GeoCoord::new(longitude, latitude)
}

/// Texture coordinate of a geographic point, origin at the top-left.
pub fn to_uv(coord: GeoCoord) -> (f64, f64) {
    let u = (coord.longitude + 180.0).rem_euclid(360.0) / 360.0;
    let v = ((90.0 - coord.latitude) / 180.0).clamp(0.0, 1.0);
    (u, v)
}
