//! Colour ramps for radar moments.
//!
//! A ramp is a list of colour stops placed at fractions of `[vmin, vmax]`.
//! Values are clamped into that range before lookup; missing values (NaN)
//! map to a fully transparent pixel.

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Parse `#RRGGBB` (leading `#` optional) into an opaque colour.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::new(r, g, b, 255))
    }
}

fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

/// Colour stop at a fraction (0..=1) of the ramp.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub position: f32,
    pub color: Color,
}

// NWS-style reflectivity palette
const REFLECTIVITY_STOPS: &[(f32, &str)] = &[
    (0.00, "#646464"),
    (0.25, "#04e9e7"),
    (0.32, "#019ff4"),
    (0.38, "#0300f4"),
    (0.44, "#02fd02"),
    (0.50, "#01c501"),
    (0.56, "#008e00"),
    (0.63, "#fdf802"),
    (0.69, "#e5bc00"),
    (0.75, "#fd9500"),
    (0.81, "#fd0000"),
    (0.88, "#d40000"),
    (0.94, "#bc0000"),
    (1.00, "#f800fd"),
];

const RAIN_RATE_STOPS: &[(f32, &str)] = &[
    (0.00, "#e1f5fe"),
    (0.20, "#4fc3f7"),
    (0.40, "#1e88e5"),
    (0.60, "#43a047"),
    (0.80, "#fdd835"),
    (1.00, "#e53935"),
];

const CLASSIFICATION_STOPS: &[(f32, &str)] = &[
    (0.00, "#9e9e9e"),
    (0.15, "#8d6e63"),
    (0.30, "#26c6da"),
    (0.45, "#42a5f5"),
    (0.60, "#66bb6a"),
    (0.75, "#ffee58"),
    (0.90, "#ef5350"),
    (1.00, "#ab47bc"),
];

/// A linear colour ramp over `[vmin, vmax]`.
#[derive(Debug, Clone)]
pub struct Colormap {
    pub vmin: f32,
    pub vmax: f32,
    stops: Vec<ColorStop>,
}

impl Colormap {
    /// Build a ramp from `(position, hex colour)` pairs.
    ///
    /// Stops with unparseable colours are dropped; positions are sorted.
    pub fn from_hex_stops(vmin: f32, vmax: f32, stops: &[(f32, &str)]) -> Self {
        let mut stops: Vec<ColorStop> = stops
            .iter()
            .filter_map(|(position, hex)| {
                Color::from_hex(hex).map(|color| ColorStop {
                    position: position.clamp(0.0, 1.0),
                    color,
                })
            })
            .collect();
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { vmin, vmax, stops }
    }

    /// Reflectivity (dBZ).
    pub fn reflectivity(vmin: f32, vmax: f32) -> Self {
        Self::from_hex_stops(vmin, vmax, REFLECTIVITY_STOPS)
    }

    pub fn rain_rate(vmin: f32, vmax: f32) -> Self {
        Self::from_hex_stops(vmin, vmax, RAIN_RATE_STOPS)
    }

    pub fn classification(vmin: f32, vmax: f32) -> Self {
        Self::from_hex_stops(vmin, vmax, CLASSIFICATION_STOPS)
    }

    /// Pick the ramp for a radar field name.
    pub fn for_field(field: &str, vmin: f32, vmax: f32) -> Self {
        match field {
            "radar_estimated_rain_rate" => Self::rain_rate(vmin, vmax),
            "radar_echo_classification" => Self::classification(vmin, vmax),
            _ => Self::reflectivity(vmin, vmax),
        }
    }

    /// Colour for a data value.
    pub fn color(&self, value: f32) -> Color {
        if !value.is_finite() || self.stops.is_empty() {
            return Color::transparent();
        }

        let span = self.vmax - self.vmin;
        let t = if span.abs() < f32::EPSILON {
            0.0
        } else {
            ((value - self.vmin) / span).clamp(0.0, 1.0)
        };

        let upper = self.stops.partition_point(|stop| stop.position < t);
        if upper == 0 {
            return self.stops[0].color;
        }
        if upper >= self.stops.len() {
            return self.stops[self.stops.len() - 1].color;
        }

        let lo = self.stops[upper - 1];
        let hi = self.stops[upper];
        let width = hi.position - lo.position;
        if width <= 0.0 {
            return hi.color;
        }
        interpolate_color(lo.color, hi.color, (t - lo.position) / width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#ff0080"), Some(Color::new(255, 0, 128, 255)));
        assert_eq!(Color::from_hex("04e9e7"), Some(Color::new(4, 233, 231, 255)));
        assert!(Color::from_hex("#fff").is_none());
        assert!(Color::from_hex("#gg0000").is_none());
    }

    #[test]
    fn test_endpoints_and_clamping() {
        let cmap = Colormap::reflectivity(-20.0, 60.0);
        let low = cmap.color(-20.0);
        let high = cmap.color(60.0);
        assert_eq!(low, Color::from_hex("#646464").unwrap());
        assert_eq!(high, Color::from_hex("#f800fd").unwrap());

        // Out-of-range values clamp to the ends of the ramp
        assert_eq!(cmap.color(-45.0), low);
        assert_eq!(cmap.color(75.0), high);
    }

    #[test]
    fn test_missing_is_transparent() {
        let cmap = Colormap::reflectivity(-20.0, 60.0);
        assert_eq!(cmap.color(f32::NAN), Color::transparent());
        assert_eq!(cmap.color(f32::INFINITY).a, 0);
    }

    #[test]
    fn test_interpolates_between_stops() {
        let cmap = Colormap::from_hex_stops(0.0, 10.0, &[(0.0, "#000000"), (1.0, "#c8c8c8")]);
        assert_eq!(cmap.color(5.0), Color::new(100, 100, 100, 255));
    }

    #[test]
    fn test_degenerate_range() {
        let cmap = Colormap::rain_rate(5.0, 5.0);
        assert_eq!(cmap.color(5.0), Color::from_hex("#e1f5fe").unwrap());
    }
}
