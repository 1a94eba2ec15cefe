//! Sweep indexing and geographic bounding boxes.
//!
//! For every sweep of a volume:
//! - `elevation_index`: 1-based rank of its first-ray elevation among the
//!   file's distinct elevations (equal angles share a rank)
//! - `file_index`: 0-based rank of the sweep ordered by first-ray
//!   (elevation, azimuth), used in artifact names so names do not depend
//!   on store order
//! - bounding box: the min/max x and y of the edge-inclusive gate grid form
//!   four Cartesian corners, each projected through an azimuthal-equidistant
//!   inverse centered on the radar; the box is the min/max of the projected
//!   corners

use rayon::prelude::*;
use tracing::{debug, instrument};

use projection::AzimuthalEquidistant;
use radar_common::{CartesianExtent, CornerBox, LonLat, RadarError, RadarResult, SweepRecord};

use crate::volume::RadarVolume;

/// Folds `-0.0` into `0.0` so `total_cmp` treats them as one angle.
fn unsigned_zero(angle: f64) -> f64 {
    angle + 0.0
}

/// 1-based elevation rank for each sweep.
pub fn elevation_indices(elevations: &[f64]) -> Vec<u32> {
    let mut distinct: Vec<f64> = elevations.iter().copied().map(unsigned_zero).collect();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup_by(|a, b| a.total_cmp(b).is_eq());

    elevations
        .iter()
        .map(|&e| {
            let e = unsigned_zero(e);
            distinct.partition_point(|d| d.total_cmp(&e).is_lt()) as u32 + 1
        })
        .collect()
}

/// 0-based rank of each sweep ordered by (elevation, azimuth, store position).
pub fn file_indices(first_rays: &[(f64, f64)]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..first_rays.len()).collect();
    order.sort_by(|&a, &b| {
        let (ea, aa) = first_rays[a];
        let (eb, ab) = first_rays[b];
        unsigned_zero(ea)
            .total_cmp(&unsigned_zero(eb))
            .then(unsigned_zero(aa).total_cmp(&unsigned_zero(ab)))
            .then(a.cmp(&b))
    });

    let mut ranks = vec![0; first_rays.len()];
    for (rank, sweep) in order.into_iter().enumerate() {
        ranks[sweep] = rank;
    }
    ranks
}

/// Project the four corners of `extent` (km) and take their envelope.
pub fn project_extent(extent: &CartesianExtent, proj: &AzimuthalEquidistant) -> RadarResult<CornerBox> {
    let corners: Vec<LonLat> = extent
        .corners()
        .iter()
        .map(|&(x_km, y_km)| {
            let (lon, lat) = proj.to_geographic(x_km * 1000.0, y_km * 1000.0);
            LonLat::new(lon, lat)
        })
        .collect();

    if corners.iter().any(|c| !c.lon.is_finite() || !c.lat.is_finite()) {
        return Err(RadarError::Projection(format!(
            "non-finite corner projecting extent {:?}",
            extent
        )));
    }

    CornerBox::enclosing(&corners)
        .ok_or_else(|| RadarError::Projection("empty corner set".to_string()))
}

/// One sweep with its record and Cartesian extent.
#[derive(Debug, Clone)]
pub struct GeolocatedSweep {
    /// 0-based sweep number in store order
    pub sweep: usize,
    pub record: SweepRecord,
    /// Extent of the gate-edge grid (km)
    pub extent: CartesianExtent,
}

/// Geolocate every sweep of `volume`.
///
/// # Arguments
/// * `volume` - Decoded, validated volume
/// * `source_file` - Artifact base name of the source file
/// * `product` - Product label used in artifact names
#[instrument(skip(volume), fields(sweeps = volume.nsweeps()))]
pub fn geolocate_volume(
    volume: &RadarVolume,
    source_file: &str,
    product: &str,
) -> RadarResult<Vec<GeolocatedSweep>> {
    let nsweeps = volume.nsweeps();
    let first_rays = (0..nsweeps)
        .map(|s| volume.first_ray_angles(s))
        .collect::<RadarResult<Vec<_>>>()?;

    let elevations: Vec<f64> = first_rays.iter().map(|(e, _)| *e).collect();
    let elevation_ranks = elevation_indices(&elevations);
    let file_ranks = file_indices(&first_rays);
    let proj = AzimuthalEquidistant::new(volume.longitude, volume.latitude);

    let sweeps = (0..nsweeps)
        .into_par_iter()
        .map(|sweep| {
            let grid = volume.gate_grid(sweep, true)?;
            let extent = CartesianExtent::from_meters(&grid.x, &grid.y).ok_or_else(|| {
                RadarError::Projection(format!("sweep {} has no finite gate coordinates", sweep))
            })?;
            let bounding_box = project_extent(&extent, &proj)?;
            let (elevation, azimuth) = first_rays[sweep];

            Ok(GeolocatedSweep {
                sweep,
                extent,
                record: SweepRecord {
                    source_file: source_file.to_string(),
                    product: product.to_string(),
                    original_sweep_number: sweep as u32 + 1,
                    file_index: file_ranks[sweep],
                    elevation_index: elevation_ranks[sweep],
                    elevation_degrees: elevation,
                    azimuth_degrees: azimuth,
                    bounding_box,
                },
            })
        })
        .collect::<RadarResult<Vec<_>>>()?;

    debug!(source = %source_file, count = sweeps.len(), "Geolocated sweeps");
    Ok(sweeps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_elevation_ties_share_index() {
        let ranks = elevation_indices(&[0.5, 0.5, 1.5, 0.9, 1.5, 19.5]);
        assert_eq!(ranks, vec![1, 1, 3, 2, 3, 4]);
    }

    #[test]
    fn test_signed_zero_elevations_share_index() {
        let ranks = elevation_indices(&[-0.0, 0.0, 1.0]);
        assert_eq!(ranks, vec![1, 1, 2]);

        let ranks = elevation_indices(&[1.0, 0.0, -0.0, 0.5]);
        assert_eq!(ranks, vec![3, 1, 1, 2]);
    }

    #[test]
    fn test_file_indices_signed_zero_falls_back_to_azimuth() {
        let ranks = file_indices(&[(0.0, 90.0), (-0.0, 180.0), (-0.0, 45.0)]);
        assert_eq!(ranks, vec![1, 2, 0]);
    }

    #[test]
    fn test_file_indices_sort_by_elevation_then_azimuth() {
        let ranks = file_indices(&[(1.5, 10.0), (0.5, 200.0), (0.5, 100.0), (1.5, 10.0)]);
        assert_eq!(ranks, vec![2, 1, 0, 3]);
    }

    #[test]
    fn test_project_extent_northern_western() {
        let proj = AzimuthalEquidistant::new(-118.8529, 45.6906);
        let extent = CartesianExtent::new(-460.0, -460.0, 460.0, 460.0);
        let bbox = project_extent(&extent, &proj).unwrap();

        assert!(bbox.nw.lon < -118.8529 && bbox.ne.lon > -118.8529);
        assert!(bbox.nw.lat > 45.6906 && bbox.sw.lat < 45.6906);
        assert_eq!(bbox.nw.lon, bbox.sw.lon);
        assert_eq!(bbox.ne.lat, bbox.nw.lat);
        // Northern corners lie 650 km out on the diagonals
        assert_approx_eq!(bbox.max_lat(), 49.6584, 1e-3);
        assert_approx_eq!(bbox.min_lat(), 41.4146, 1e-3);
        // Widest longitude comes from the northern corners
        assert_approx_eq!(bbox.min_lon(), -125.2456, 1e-3);
        assert_approx_eq!(bbox.max_lon(), -112.4602, 1e-3);
    }
}
