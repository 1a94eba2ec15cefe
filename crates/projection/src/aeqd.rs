//! Azimuthal Equidistant projection on a sphere.
//!
//! Preserves true distance and direction from the projection center, which
//! makes it the natural map for radar-local Cartesian offsets: a point `x`
//! meters east and `y` meters north of the antenna maps to the geographic
//! position reached by travelling `hypot(x, y)` meters along the great
//! circle with bearing `atan2(x, y)`.

use std::f64::consts::PI;

/// Earth radius used for radar geolocation (meters).
pub const RADAR_EARTH_RADIUS: f64 = 6_370_997.0;

/// Azimuthal Equidistant projection centered at a radar site.
#[derive(Debug, Clone, Copy)]
pub struct AzimuthalEquidistant {
    /// Center longitude in radians
    pub lon0: f64,
    /// Center latitude in radians
    pub lat0: f64,
    /// Sphere radius (meters)
    pub earth_radius: f64,
}

impl AzimuthalEquidistant {
    /// Create a projection centered at (`lon0_deg`, `lat0_deg`) with the
    /// standard radar earth radius.
    pub fn new(lon0_deg: f64, lat0_deg: f64) -> Self {
        Self::with_radius(lon0_deg, lat0_deg, RADAR_EARTH_RADIUS)
    }

    pub fn with_radius(lon0_deg: f64, lat0_deg: f64, earth_radius: f64) -> Self {
        let to_rad = PI / 180.0;
        Self {
            lon0: lon0_deg * to_rad,
            lat0: lat0_deg * to_rad,
            earth_radius,
        }
    }

    /// Convert Cartesian offsets (meters) from the center to geographic
    /// coordinates.
    ///
    /// Returns (lon, lat) in degrees with longitude wrapped to [-180, 180].
    pub fn to_geographic(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;

        let rho = (x * x + y * y).sqrt();
        if rho == 0.0 {
            return (self.lon0 * to_deg, self.lat0 * to_deg);
        }

        let c = rho / self.earth_radius;
        let (sin_c, cos_c) = c.sin_cos();
        let (sin_lat0, cos_lat0) = self.lat0.sin_cos();

        let lat_arg = (cos_c * sin_lat0 + y * sin_c * cos_lat0 / rho).clamp(-1.0, 1.0);
        let lat = lat_arg.asin() * to_deg;

        let x1 = x * sin_c;
        let x2 = rho * cos_lat0 * cos_c - y * sin_lat0 * sin_c;
        let mut lon = self.lon0 * to_deg + x1.atan2(x2) * to_deg;

        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }

        (lon, lat)
    }

    /// Convert geographic coordinates (degrees) to Cartesian offsets in
    /// meters from the center.
    pub fn to_cartesian(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat_deg * to_rad;
        let dlon = lon_deg * to_rad - self.lon0;

        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lat0, cos_lat0) = self.lat0.sin_cos();
        let cos_dlon = dlon.cos();

        let arg = (sin_lat0 * sin_lat + cos_lat0 * cos_lat * cos_dlon).clamp(-1.0, 1.0);
        let c = arg.acos();
        let k = if c == 0.0 { 1.0 } else { c / c.sin() };

        let x = self.earth_radius * k * cos_lat * dlon.sin();
        let y = self.earth_radius * k * (cos_lat0 * sin_lat - sin_lat0 * cos_lat * cos_dlon);
        (x, y)
    }
}
