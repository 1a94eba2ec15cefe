//! Decoded radar volume.
//!
//! The shape mirrors what radar decoding tools emit: per-ray angle arrays
//! for the whole volume, sweep boundaries as start/end ray indices, gate
//! ranges shared by every ray, and named moment fields stored row-major by
//! ray. Missing gates are `null` in JSON and NaN in memory.

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use projection::GateGrid;
use radar_common::{RadarError, RadarResult};

/// A decoded volume (or a single-sweep product).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarVolume {
    #[serde(default)]
    pub site: String,
    /// Antenna latitude (degrees)
    pub latitude: f64,
    /// Antenna longitude (degrees)
    pub longitude: f64,
    /// Antenna altitude (meters)
    #[serde(default)]
    pub altitude: f64,
    /// Per-ray azimuth (degrees)
    pub azimuth: Vec<f64>,
    /// Per-ray elevation (degrees)
    pub elevation: Vec<f64>,
    /// Gate center ranges (meters)
    pub range: Vec<f64>,
    pub sweep_start_ray_index: Vec<usize>,
    /// Inclusive end ray of each sweep
    pub sweep_end_ray_index: Vec<usize>,
    /// Moment name -> values, rays x gates
    #[serde(default)]
    pub fields: HashMap<String, Vec<Option<f32>>>,
}

impl RadarVolume {
    pub fn nsweeps(&self) -> usize {
        self.sweep_start_ray_index.len()
    }

    pub fn nrays(&self) -> usize {
        self.azimuth.len()
    }

    pub fn ngates(&self) -> usize {
        self.range.len()
    }

    /// Check array shapes are consistent.
    pub fn validate(&self) -> RadarResult<()> {
        let rays = self.nrays();
        if self.elevation.len() != rays {
            return Err(RadarError::Decode(format!(
                "{} azimuths but {} elevations",
                rays,
                self.elevation.len()
            )));
        }
        if self.sweep_end_ray_index.len() != self.nsweeps() {
            return Err(RadarError::Decode(
                "sweep start and end index arrays differ in length".to_string(),
            ));
        }
        for (sweep, (&start, &end)) in self
            .sweep_start_ray_index
            .iter()
            .zip(&self.sweep_end_ray_index)
            .enumerate()
        {
            if start > end || end >= rays {
                return Err(RadarError::Decode(format!(
                    "sweep {} rays {}..={} outside 0..{}",
                    sweep, start, end, rays
                )));
            }
        }
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(RadarError::Decode("radar location is not finite".to_string()));
        }
        for (name, values) in &self.fields {
            if values.len() != rays * self.ngates() {
                return Err(RadarError::Decode(format!(
                    "field '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    rays * self.ngates()
                )));
            }
        }
        Ok(())
    }

    /// Ray indices of `sweep`.
    pub fn sweep_rays(&self, sweep: usize) -> RadarResult<Range<usize>> {
        match (
            self.sweep_start_ray_index.get(sweep),
            self.sweep_end_ray_index.get(sweep),
        ) {
            (Some(&start), Some(&end)) if start <= end && end < self.nrays() => Ok(start..end + 1),
            _ => Err(RadarError::Decode(format!("no sweep {}", sweep))),
        }
    }

    /// (elevation, azimuth) of the first ray of `sweep`.
    pub fn first_ray_angles(&self, sweep: usize) -> RadarResult<(f64, f64)> {
        let start = self.sweep_rays(sweep)?.start;
        Ok((self.elevation[start], self.azimuth[start]))
    }

    /// Cartesian gate grid of `sweep`; with `edges`, gate corners.
    pub fn gate_grid(&self, sweep: usize, edges: bool) -> RadarResult<GateGrid> {
        let rays = self.sweep_rays(sweep)?;
        Ok(GateGrid::from_antenna(
            &self.range,
            &self.azimuth[rays.clone()],
            &self.elevation[rays],
            edges,
        ))
    }

    /// Values of `field` for `sweep`, missing gates as NaN.
    pub fn sweep_field(&self, field: &str, sweep: usize) -> RadarResult<Vec<f32>> {
        let values = self
            .fields
            .get(field)
            .ok_or_else(|| RadarError::Decode(format!("volume has no field '{}'", field)))?;
        let rays = self.sweep_rays(sweep)?;
        let gates = self.ngates();

        values
            .get(rays.start * gates..rays.end * gates)
            .map(|slice| slice.iter().map(|v| v.unwrap_or(f32::NAN)).collect())
            .ok_or_else(|| RadarError::Decode(format!("field '{}' too short for sweep {}", field, sweep)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sweep_volume() -> RadarVolume {
        RadarVolume {
            site: "KPDT".to_string(),
            latitude: 45.6906,
            longitude: -118.8529,
            altitude: 462.0,
            azimuth: vec![0.0, 90.0, 180.0, 270.0, 45.0, 135.0, 225.0, 315.0],
            elevation: vec![0.5, 0.5, 0.5, 0.5, 1.5, 1.5, 1.5, 1.5],
            range: vec![1000.0, 2000.0],
            sweep_start_ray_index: vec![0, 4],
            sweep_end_ray_index: vec![3, 7],
            fields: HashMap::from([(
                "reflectivity".to_string(),
                (0..16).map(|i| if i == 9 { None } else { Some(i as f32) }).collect(),
            )]),
        }
    }

    #[test]
    fn test_validate_and_sweeps() {
        let volume = two_sweep_volume();
        volume.validate().unwrap();
        assert_eq!(volume.nsweeps(), 2);
        assert_eq!(volume.sweep_rays(1).unwrap(), 4..8);
        assert_eq!(volume.first_ray_angles(1).unwrap(), (1.5, 45.0));
        assert!(volume.sweep_rays(2).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let mut volume = two_sweep_volume();
        volume.sweep_end_ray_index[1] = 8;
        assert!(volume.validate().is_err());

        let mut volume = two_sweep_volume();
        volume.fields.insert("velocity".to_string(), vec![Some(1.0); 3]);
        assert!(volume.validate().is_err());
    }

    #[test]
    fn test_sweep_field_masks_missing() {
        let volume = two_sweep_volume();
        let values = volume.sweep_field("reflectivity", 1).unwrap();
        assert_eq!(values.len(), 8);
        assert_eq!(values[0], 8.0);
        assert!(values[1].is_nan());
        assert!(volume.sweep_field("velocity", 0).is_err());
    }

    #[test]
    fn test_gate_grid_edges() {
        let grid = two_sweep_volume().gate_grid(0, true).unwrap();
        assert_eq!((grid.rows, grid.cols), (5, 3));
    }

    #[test]
    fn test_deserialize_with_nulls() {
        let json = r#"{
            "latitude": 45.6906, "longitude": -118.8529,
            "azimuth": [0.0, 180.0], "elevation": [0.5, 0.5],
            "range": [1000.0],
            "sweep_start_ray_index": [0], "sweep_end_ray_index": [1],
            "fields": { "reflectivity": [12.5, null] }
        }"#;
        let volume: RadarVolume = serde_json::from_str(json).unwrap();
        volume.validate().unwrap();
        let values = volume.sweep_field("reflectivity", 0).unwrap();
        assert_eq!(values[0], 12.5);
        assert!(values[1].is_nan());
    }
}
