//! Plan-position-indicator rasterization of a single sweep.
//!
//! The image covers a radar-centered Cartesian extent (kilometers) with the
//! top row at `max_y`. Each pixel is inverse-mapped to polar coordinates:
//! azimuth from `atan2(x, y)` and slant range from the ground distance,
//! then filled from the nearest ray and gate.

use rayon::prelude::*;

use radar_common::{CartesianExtent, RadarError, RadarResult};

use crate::colormap::Colormap;

/// Default gate spacing assumed for single-gate sweeps (meters).
const DEFAULT_GATE_SPACING: f64 = 250.0;

/// One sweep's polar data, borrowed from the decoded volume.
#[derive(Debug, Clone, Copy)]
pub struct PolarSweep<'a> {
    /// Per-ray azimuth (degrees)
    pub azimuths: &'a [f64],
    /// Per-ray elevation (degrees)
    pub elevations: &'a [f64],
    /// Gate center ranges (meters), ascending
    pub ranges: &'a [f64],
    /// Field values, row-major by ray; NaN marks a missing gate
    pub values: &'a [f32],
}

impl PolarSweep<'_> {
    fn validate(&self) -> RadarResult<()> {
        let rays = self.azimuths.len();
        let gates = self.ranges.len();
        if rays == 0 || gates == 0 {
            return Err(RadarError::Render("sweep has no rays or gates".to_string()));
        }
        if self.values.len() != rays * gates {
            return Err(RadarError::Render(format!(
                "field has {} values, expected {} rays x {} gates",
                self.values.len(),
                rays,
                gates
            )));
        }
        Ok(())
    }

    fn mean_elevation(&self) -> f64 {
        if self.elevations.is_empty() {
            return 0.0;
        }
        self.elevations.iter().sum::<f64>() / self.elevations.len() as f64
    }
}

/// Azimuth lookup over rays in arbitrary store order.
struct RayIndex {
    /// (azimuth, ray) sorted by azimuth
    sorted: Vec<(f64, usize)>,
    tolerance: f64,
}

impl RayIndex {
    fn new(azimuths: &[f64]) -> Self {
        let mut sorted: Vec<(f64, usize)> = azimuths
            .iter()
            .enumerate()
            .map(|(ray, az)| (az.rem_euclid(360.0), ray))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Nominal beam spacing, with slack for uneven rays
        let tolerance = (360.0 / sorted.len() as f64 * 1.5).max(0.5);
        Self { sorted, tolerance }
    }

    fn nearest(&self, azimuth: f64) -> Option<usize> {
        let n = self.sorted.len();
        let i = self.sorted.partition_point(|(az, _)| *az < azimuth);

        // Candidates either side, wrapping at 0/360
        let candidates = [self.sorted[i % n], self.sorted[(i + n - 1) % n]];
        candidates
            .iter()
            .map(|&(az, ray)| {
                let d = (az - azimuth).abs();
                (d.min(360.0 - d), ray)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .filter(|(d, _)| *d <= self.tolerance)
            .map(|(_, ray)| ray)
    }
}

fn nearest_gate(ranges: &[f64], half_spacing: f64, range: f64) -> Option<usize> {
    let first = ranges[0];
    let last = ranges[ranges.len() - 1];
    if range < first - half_spacing || range > last + half_spacing {
        return None;
    }

    let i = ranges.partition_point(|&r| r < range);
    if i == 0 {
        return Some(0);
    }
    if i >= ranges.len() {
        return Some(ranges.len() - 1);
    }
    if (ranges[i] - range) < (range - ranges[i - 1]) {
        Some(i)
    } else {
        Some(i - 1)
    }
}

/// Rasterize `sweep` into RGBA pixels covering `extent`.
///
/// # Arguments
/// * `sweep` - Polar data for one sweep
/// * `extent` - Cartesian extent in kilometers
/// * `width` / `height` - Output size in pixels
/// * `colormap` - Ramp applied to field values
pub fn render_ppi(
    sweep: &PolarSweep<'_>,
    extent: &CartesianExtent,
    width: usize,
    height: usize,
    colormap: &Colormap,
) -> RadarResult<Vec<u8>> {
    sweep.validate()?;
    if width == 0 || height == 0 {
        return Err(RadarError::Render(format!(
            "invalid image size {}x{}",
            width, height
        )));
    }

    let gates = sweep.ranges.len();
    let rays = RayIndex::new(sweep.azimuths);
    let half_spacing = if gates > 1 {
        (sweep.ranges[1] - sweep.ranges[0]).abs() / 2.0
    } else {
        DEFAULT_GATE_SPACING / 2.0
    };
    let cos_elev = sweep.mean_elevation().to_radians().cos().max(1e-6);

    let x_step = extent.width() * 1000.0 / width as f64;
    let y_step = extent.height() * 1000.0 / height as f64;
    let x0 = extent.min_x * 1000.0;
    let y0 = extent.max_y * 1000.0;

    let mut pixels = vec![0u8; width * height * 4];
    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(row, line)| {
            let y = y0 - (row as f64 + 0.5) * y_step;
            for col in 0..width {
                let x = x0 + (col as f64 + 0.5) * x_step;

                let azimuth = x.atan2(y).to_degrees().rem_euclid(360.0);
                let range = x.hypot(y) / cos_elev;

                let value = rays.nearest(azimuth).and_then(|ray| {
                    nearest_gate(sweep.ranges, half_spacing, range)
                        .map(|gate| sweep.values[ray * gates + gate])
                });

                if let Some(value) = value {
                    let color = colormap.color(value);
                    let offset = col * 4;
                    line[offset] = color.r;
                    line[offset + 1] = color.g;
                    line[offset + 2] = color.b;
                    line[offset + 3] = color.a;
                }
            }
        });

    Ok(pixels)
}

/// Render a vertical colourbar: `vmax` at the top, `vmin` at the bottom.
pub fn render_colorbar(colormap: &Colormap, width: usize, height: usize) -> Vec<u8> {
    let mut pixels = vec![0u8; width * height * 4];
    let span = colormap.vmax - colormap.vmin;
    let denom = height.saturating_sub(1).max(1) as f32;

    for (row, line) in pixels.chunks_exact_mut(width * 4).enumerate() {
        let value = colormap.vmax - span * row as f32 / denom;
        let color = colormap.color(value);
        for px in line.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(pixels: &[u8], width: usize, col: usize, row: usize) -> [u8; 4] {
        let i = (row * width + col) * 4;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    }

    #[test]
    fn test_ray_index_wraps() {
        let azimuths: Vec<f64> = (0..360).map(|a| a as f64 + 0.5).collect();
        let index = RayIndex::new(&azimuths);
        assert_eq!(index.nearest(359.9), Some(359));
        assert_eq!(index.nearest(0.1), Some(0));
        assert_eq!(index.nearest(180.4), Some(180));
    }

    #[test]
    fn test_ray_index_gap_is_empty() {
        // Sector scan covering 0..90 only
        let azimuths: Vec<f64> = (0..90).map(|a| a as f64).collect();
        let index = RayIndex::new(&azimuths);
        assert!(index.nearest(45.0).is_some());
        assert!(index.nearest(200.0).is_none());
    }

    #[test]
    fn test_nearest_gate_bounds() {
        let ranges = [1000.0, 2000.0, 3000.0];
        assert_eq!(nearest_gate(&ranges, 500.0, 600.0), Some(0));
        assert_eq!(nearest_gate(&ranges, 500.0, 2400.0), Some(1));
        assert_eq!(nearest_gate(&ranges, 500.0, 2600.0), Some(2));
        assert_eq!(nearest_gate(&ranges, 500.0, 3600.0), None);
        assert_eq!(nearest_gate(&ranges, 500.0, 400.0), None);
    }

    #[test]
    fn test_render_fills_disk_and_leaves_corners_clear() {
        let azimuths: Vec<f64> = (0..360).map(|a| a as f64).collect();
        let elevations = vec![0.5; 360];
        let ranges: Vec<f64> = (0..100).map(|g| 500.0 + g as f64 * 1000.0).collect();
        let values = vec![30.0f32; 360 * 100];
        let sweep = PolarSweep {
            azimuths: &azimuths,
            elevations: &elevations,
            ranges: &ranges,
            values: &values,
        };
        let extent = CartesianExtent::new(-100.0, -100.0, 100.0, 100.0);
        let cmap = Colormap::reflectivity(-20.0, 60.0);

        let pixels = render_ppi(&sweep, &extent, 64, 64, &cmap).unwrap();
        assert_eq!(pixels.len(), 64 * 64 * 4);

        let center = pixel(&pixels, 64, 32, 32);
        let expected = cmap.color(30.0);
        assert_eq!(center, [expected.r, expected.g, expected.b, 255]);

        // Corners lie beyond the last gate
        assert_eq!(pixel(&pixels, 64, 0, 0)[3], 0);
        assert_eq!(pixel(&pixels, 64, 63, 63)[3], 0);
    }

    #[test]
    fn test_render_top_row_is_north() {
        // Only the ray pointing north carries data
        let azimuths: Vec<f64> = (0..360).map(|a| a as f64).collect();
        let elevations = vec![0.5; 360];
        let ranges: Vec<f64> = (0..50).map(|g| 500.0 + g as f64 * 1000.0).collect();
        let mut values = vec![f32::NAN; 360 * 50];
        for gate in 0..50 {
            values[gate] = 50.0;
        }
        let sweep = PolarSweep {
            azimuths: &azimuths,
            elevations: &elevations,
            ranges: &ranges,
            values: &values,
        };
        let extent = CartesianExtent::new(-50.0, -50.0, 50.0, 50.0);
        let cmap = Colormap::reflectivity(-20.0, 60.0);

        // Odd width puts column 25 on x = 0
        let pixels = render_ppi(&sweep, &extent, 51, 51, &cmap).unwrap();
        assert_eq!(pixel(&pixels, 51, 25, 5)[3], 255);
        assert_eq!(pixel(&pixels, 51, 25, 45)[3], 0);
    }

    #[test]
    fn test_render_rejects_mismatched_field() {
        let sweep = PolarSweep {
            azimuths: &[0.0, 1.0],
            elevations: &[0.5, 0.5],
            ranges: &[1000.0],
            values: &[1.0],
        };
        let extent = CartesianExtent::new(-1.0, -1.0, 1.0, 1.0);
        let err = render_ppi(&sweep, &extent, 4, 4, &Colormap::reflectivity(-20.0, 60.0));
        assert!(matches!(err, Err(RadarError::Render(_))));
    }

    #[test]
    fn test_colorbar_runs_top_to_bottom() {
        let cmap = Colormap::reflectivity(-20.0, 60.0);
        let pixels = render_colorbar(&cmap, 4, 100);
        let top = cmap.color(60.0);
        let bottom = cmap.color(-20.0);
        assert_eq!(pixel(&pixels, 4, 0, 0), [top.r, top.g, top.b, top.a]);
        assert_eq!(pixel(&pixels, 4, 3, 99), [bottom.r, bottom.g, bottom.b, bottom.a]);
    }
}
