//! Extents and corner boxes for sweep footprints.

use serde::{Deserialize, Serialize};

/// A geographic position serialized as a `[lon, lat]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(p: LonLat) -> Self {
        [p.lon, p.lat]
    }
}

/// Axis-aligned extent of a gate grid in radar-local Cartesian kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl CartesianExtent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Extent of paired x/y coordinate slices given in meters.
    ///
    /// Non-finite coordinates are ignored. Returns `None` when no finite
    /// pair exists.
    pub fn from_meters(x: &[f64], y: &[f64]) -> Option<Self> {
        let mut extent: Option<Self> = None;
        for (&xm, &ym) in x.iter().zip(y) {
            if !xm.is_finite() || !ym.is_finite() {
                continue;
            }
            let (xk, yk) = (xm / 1000.0, ym / 1000.0);
            extent = Some(match extent {
                None => Self::new(xk, yk, xk, yk),
                Some(e) => Self::new(e.min_x.min(xk), e.min_y.min(yk), e.max_x.max(xk), e.max_y.max(yk)),
            });
        }
        extent
    }

    /// The four corners in `(min_x, max_y), (max_x, max_y), (max_x, min_y), (min_x, min_y)` order.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.max_y),
            (self.max_x, self.max_y),
            (self.max_x, self.min_y),
            (self.min_x, self.min_y),
        ]
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Geographic bounding box expressed as its four named corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerBox {
    pub nw: LonLat,
    pub ne: LonLat,
    pub se: LonLat,
    pub sw: LonLat,
}

impl CornerBox {
    /// Build the box from the min/max over a set of projected points.
    ///
    /// Corner roles come from the min/max, never from the order of the
    /// input points, so sign flips between hemispheres cannot swap them.
    pub fn enclosing(points: &[LonLat]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_lon, mut max_lon) = (first.lon, first.lon);
        let (mut min_lat, mut max_lat) = (first.lat, first.lat);
        for p in &points[1..] {
            min_lon = min_lon.min(p.lon);
            max_lon = max_lon.max(p.lon);
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
        }

        Some(Self {
            nw: LonLat::new(min_lon, max_lat),
            ne: LonLat::new(max_lon, max_lat),
            se: LonLat::new(max_lon, min_lat),
            sw: LonLat::new(min_lon, min_lat),
        })
    }

    pub fn min_lon(&self) -> f64 {
        self.sw.lon
    }

    pub fn max_lon(&self) -> f64 {
        self.ne.lon
    }

    pub fn min_lat(&self) -> f64 {
        self.sw.lat
    }

    pub fn max_lat(&self) -> f64 {
        self.ne.lat
    }
}
