//! Tests for sweep rendering and PNG encoding.
//!
//! Drives the PPI rasterizer with synthetic sweeps and checks the encoded
//! overlays, including:
//! - Format selection (indexed vs RGBA)
//! - Transparency of missing gates and out-of-range pixels
//! - Colourbar strips

use std::collections::HashSet;

use radar_common::CartesianExtent;
use renderer::png::{encode_overlay, encode_rgba};
use renderer::{render_colorbar, render_ppi, Colormap, PolarSweep};
use test_utils::generators::{constant_field, full_rotation_azimuths, gate_ranges, reflectivity_field};

// ============================================================================
// Helper functions
// ============================================================================

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Pack RGBA bytes into a u32 for color counting
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

fn count_unique_colors(pixels: &[u8]) -> usize {
    let mut unique: HashSet<u32> = HashSet::new();
    for chunk in pixels.chunks_exact(4) {
        unique.insert(pack_color(chunk[0], chunk[1], chunk[2], chunk[3]));
    }
    unique.len()
}

/// IHDR color type of an encoded PNG
fn color_type(png: &[u8]) -> u8 {
    png[25]
}

struct SyntheticSweep {
    azimuths: Vec<f64>,
    elevations: Vec<f64>,
    ranges: Vec<f64>,
    values: Vec<f32>,
}

impl SyntheticSweep {
    fn new(rays: usize, gates: usize, values: Vec<f32>) -> Self {
        Self {
            azimuths: full_rotation_azimuths(rays, 0.25),
            elevations: vec![0.5; rays],
            ranges: gate_ranges(gates, 2125.0, 250.0),
            values,
        }
    }

    fn polar(&self) -> PolarSweep<'_> {
        PolarSweep {
            azimuths: &self.azimuths,
            elevations: &self.elevations,
            ranges: &self.ranges,
            values: &self.values,
        }
    }

    /// Extent reaching just past the last gate, in km
    fn extent(&self) -> CartesianExtent {
        let max_km = (self.ranges[self.ranges.len() - 1] + 125.0) / 1000.0;
        CartesianExtent::new(-max_km, -max_km, max_km, max_km)
    }
}

// ============================================================================
// PPI rendering
// ============================================================================

#[test]
fn test_storm_cell_renders_indexed_png() {
    let sweep = SyntheticSweep::new(360, 400, reflectivity_field(360, 400, 90));
    let cmap = Colormap::reflectivity(-20.0, 60.0);

    let pixels = render_ppi(&sweep.polar(), &sweep.extent(), 256, 256, &cmap).unwrap();
    assert_eq!(pixels.len(), 256 * 256 * 4);

    let png = encode_overlay(&pixels, 256, 256).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
    if count_unique_colors(&pixels) <= 256 {
        assert_eq!(color_type(&png), 3);
    } else {
        assert_eq!(color_type(&png), 6);
    }
}

#[test]
fn test_constant_sweep_is_two_colors() {
    let sweep = SyntheticSweep::new(360, 200, constant_field(360, 200, 35.0));
    let cmap = Colormap::reflectivity(-20.0, 60.0);

    let pixels = render_ppi(&sweep.polar(), &sweep.extent(), 128, 128, &cmap).unwrap();
    // Ramp colour inside the disk, transparent corners outside it
    assert_eq!(count_unique_colors(&pixels), 2);

    let png = encode_overlay(&pixels, 128, 128).unwrap();
    assert_eq!(color_type(&png), 3);
    assert!(png.windows(4).any(|w| w == b"tRNS"));
}

#[test]
fn test_missing_field_is_fully_transparent() {
    let sweep = SyntheticSweep::new(360, 100, constant_field(360, 100, f32::NAN));
    let cmap = Colormap::reflectivity(-20.0, 60.0);

    let pixels = render_ppi(&sweep.polar(), &sweep.extent(), 32, 32, &cmap).unwrap();
    assert!(pixels.chunks_exact(4).all(|px| px[3] == 0));
}

#[test]
fn test_render_zero_size_fails() {
    let sweep = SyntheticSweep::new(360, 10, constant_field(360, 10, 10.0));
    let cmap = Colormap::reflectivity(-20.0, 60.0);
    assert!(render_ppi(&sweep.polar(), &sweep.extent(), 0, 16, &cmap).is_err());
}

// ============================================================================
// Colourbar
// ============================================================================

#[test]
fn test_colorbar_png() {
    let cmap = Colormap::for_field("reflectivity", -20.0, 60.0);
    let pixels = render_colorbar(&cmap, 16, 256);
    assert_eq!(pixels.len(), 16 * 256 * 4);
    assert!(pixels.chunks_exact(4).all(|px| px[3] == 255));

    let png = encode_overlay(&pixels, 16, 256).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
}

// ============================================================================
// Format selection
// ============================================================================

#[test]
fn test_rgba_fallback_many_colors() {
    let mut pixels = Vec::with_capacity(300 * 4);
    for i in 0..300u32 {
        pixels.extend_from_slice(&[(i % 256) as u8, (i / 256) as u8, 7, 255]);
    }

    let png = encode_overlay(&pixels, 300, 1).unwrap();
    assert_eq!(color_type(&png), 6);
}

#[test]
fn test_indexed_smaller_than_rgba_for_overlay() {
    let sweep = SyntheticSweep::new(720, 300, reflectivity_field(720, 300, 200));
    let cmap = Colormap::reflectivity(-20.0, 60.0);
    let pixels = render_ppi(&sweep.polar(), &sweep.extent(), 200, 200, &cmap).unwrap();

    if count_unique_colors(&pixels) <= 256 {
        let indexed = encode_overlay(&pixels, 200, 200).unwrap();
        let rgba = encode_rgba(&pixels, 200, 200).unwrap();
        assert!(
            indexed.len() <= rgba.len(),
            "Indexed PNG ({} bytes) should not exceed RGBA ({} bytes)",
            indexed.len(),
            rgba.len()
        );
    }
}
