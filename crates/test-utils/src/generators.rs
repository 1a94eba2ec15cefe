//! Synthetic radar data generators for testing.
//!
//! Produces ray angles, gate ranges and field values shaped like a real
//! plan-position-indicator scan without needing archived volumes.

/// Evenly spaced azimuths for a full rotation starting at `start_deg`.
///
/// Values wrap into [0, 360).
pub fn full_rotation_azimuths(rays: usize, start_deg: f64) -> Vec<f64> {
    let step = 360.0 / rays as f64;
    (0..rays)
        .map(|i| (start_deg + i as f64 * step).rem_euclid(360.0))
        .collect()
}

/// Gate center ranges in meters.
pub fn gate_ranges(gates: usize, first_gate_m: f64, spacing_m: f64) -> Vec<f64> {
    (0..gates).map(|i| first_gate_m + i as f64 * spacing_m).collect()
}

/// Reflectivity-like field (dBZ) with a storm cell centred on `center_ray`.
///
/// Row-major by ray. Gates beyond the cell fall to a -10 dBZ background and
/// every seventh gate is missing (NaN).
pub fn reflectivity_field(rays: usize, gates: usize, center_ray: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(rays * gates);
    for ray in 0..rays {
        let dray = (ray as f32 - center_ray as f32).abs();
        for gate in 0..gates {
            if gate % 7 == 6 {
                data.push(f32::NAN);
                continue;
            }
            let dgate = (gate as f32 - gates as f32 / 2.0).abs();
            let dist = (dray * dray + dgate * dgate).sqrt();
            data.push((55.0 - dist * 2.0).max(-10.0));
        }
    }
    data
}

/// Constant field of `value`.
pub fn constant_field(rays: usize, gates: usize, value: f32) -> Vec<f32> {
    vec![value; rays * gates]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_rotation_wraps() {
        let az = full_rotation_azimuths(4, 315.0);
        assert_eq!(az, vec![315.0, 45.0, 135.0, 225.0]);
    }

    #[test]
    fn test_gate_ranges() {
        assert_eq!(gate_ranges(3, 2125.0, 250.0), vec![2125.0, 2375.0, 2625.0]);
    }

    #[test]
    fn test_reflectivity_field_shape() {
        let field = reflectivity_field(360, 100, 90);
        assert_eq!(field.len(), 36_000);
        assert!(field.iter().filter(|v| v.is_nan()).count() > 0);
        let max = field.iter().cloned().filter(|v| !v.is_nan()).fold(f32::MIN, f32::max);
        assert!(max <= 55.0);
    }
}
