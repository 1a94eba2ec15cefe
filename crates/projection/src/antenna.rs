//! Radar beam geometry.
//!
//! Places radar gates in a radar-centered Cartesian frame (x east, y north,
//! z up, meters) using the standard 4/3 effective earth radius model for
//! beam refraction. With `edges` enabled the grid describes gate corners
//! rather than gate centers: ranges, azimuths and elevations are each
//! interpolated to midpoints and extrapolated half a step past both ends.

use std::f64::consts::PI;

/// Mean earth radius (meters) before the 4/3 refraction scaling.
const EARTH_RADIUS: f64 = 6_371_000.0;

/// Effective earth radius accounting for standard atmospheric refraction.
const EFFECTIVE_RADIUS: f64 = EARTH_RADIUS * 4.0 / 3.0;

/// Convert antenna coordinates to radar-centered Cartesian coordinates.
///
/// # Arguments
/// * `range_m` - Slant range along the beam (meters)
/// * `azimuth_deg` - Azimuth clockwise from north (degrees)
/// * `elevation_deg` - Elevation above the horizon (degrees)
///
/// Returns (x, y, z) in meters.
pub fn antenna_to_cartesian(range_m: f64, azimuth_deg: f64, elevation_deg: f64) -> (f64, f64, f64) {
    let to_rad = PI / 180.0;
    let theta_e = elevation_deg * to_rad;
    let theta_a = azimuth_deg * to_rad;
    let r = range_m;

    let z = (r * r + EFFECTIVE_RADIUS * EFFECTIVE_RADIUS
        + 2.0 * r * EFFECTIVE_RADIUS * theta_e.sin())
    .sqrt()
        - EFFECTIVE_RADIUS;
    // Arc distance along the surface
    let s = EFFECTIVE_RADIUS * (r * theta_e.cos() / (EFFECTIVE_RADIUS + z)).asin();

    (s * theta_a.sin(), s * theta_a.cos(), z)
}

/// Midpoints between consecutive values, extrapolated half a step past both ends.
fn interpolate_edges(values: &[f64]) -> Vec<f64> {
    match values.len() {
        0 => Vec::new(),
        1 => vec![values[0] - 0.5, values[0] + 0.5],
        n => {
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(values[0] - (values[1] - values[0]) / 2.0);
            edges.extend(values.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(values[n - 1] + (values[n - 1] - values[n - 2]) / 2.0);
            edges
        }
    }
}

/// Gate range edges; never negative.
pub fn interpolate_range_edges(ranges: &[f64]) -> Vec<f64> {
    interpolate_edges(ranges)
        .into_iter()
        .map(|r| r.max(0.0))
        .collect()
}

/// Ray elevation edges.
pub fn interpolate_elevation_edges(elevations: &[f64]) -> Vec<f64> {
    interpolate_edges(elevations)
}

/// Signed smallest difference `b - a` in degrees, in (-180, 180].
fn angle_delta(a: f64, b: f64) -> f64 {
    let d = (b - a).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Ray azimuth edges, interpolated across the 360 -> 0 rollover.
///
/// Results are in [0, 360).
pub fn interpolate_azimuth_edges(azimuths: &[f64]) -> Vec<f64> {
    let n = azimuths.len();
    let edges = match n {
        0 => return Vec::new(),
        1 => vec![azimuths[0] - 0.5, azimuths[0] + 0.5],
        _ => {
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(azimuths[0] - angle_delta(azimuths[0], azimuths[1]) / 2.0);
            edges.extend(
                azimuths
                    .windows(2)
                    .map(|w| w[0] + angle_delta(w[0], w[1]) / 2.0),
            );
            edges.push(azimuths[n - 1] + angle_delta(azimuths[n - 2], azimuths[n - 1]) / 2.0);
            edges
        }
    };
    edges.into_iter().map(|a| a.rem_euclid(360.0)).collect()
}

/// Cartesian coordinates of a sweep's gates, row-major by ray.
#[derive(Debug, Clone, PartialEq)]
pub struct GateGrid {
    /// Number of rows (rays, or ray edges)
    pub rows: usize,
    /// Number of columns (gates, or gate edges)
    pub cols: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl GateGrid {
    /// Build the grid from per-ray angles and per-gate ranges.
    ///
    /// # Arguments
    /// * `ranges` - Gate center ranges (meters)
    /// * `azimuths` - Per-ray azimuths (degrees)
    /// * `elevations` - Per-ray elevations (degrees), same length as `azimuths`
    /// * `edges` - Return gate corners, shaped `(rays + 1) x (gates + 1)`
    pub fn from_antenna(ranges: &[f64], azimuths: &[f64], elevations: &[f64], edges: bool) -> Self {
        let (ranges, azimuths, elevations) = if edges {
            (
                interpolate_range_edges(ranges),
                interpolate_azimuth_edges(azimuths),
                interpolate_elevation_edges(elevations),
            )
        } else {
            (ranges.to_vec(), azimuths.to_vec(), elevations.to_vec())
        };

        let rows = azimuths.len().min(elevations.len());
        let cols = ranges.len();
        let mut x = Vec::with_capacity(rows * cols);
        let mut y = Vec::with_capacity(rows * cols);
        let mut z = Vec::with_capacity(rows * cols);

        for row in 0..rows {
            for &r in &ranges {
                let (gx, gy, gz) = antenna_to_cartesian(r, azimuths[row], elevations[row]);
                x.push(gx);
                y.push(gy);
                z.push(gz);
            }
        }

        Self { rows, cols, x, y, z }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
