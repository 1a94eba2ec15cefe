//! Sweep image rendering.
//!
//! Rendering sits behind [`SweepRenderer`] so the transform stage only deals
//! in PNG bytes. [`PpiRenderer`] rasterizes each sweep over the Cartesian
//! extent of its gate-edge grid, the same extent whose projected corners
//! form the sweep's bounding box, so image and box line up.

use serde::{Deserialize, Serialize};
use tracing::debug;

use radar_common::{RadarError, RadarResult};
use renderer::png::encode_overlay;
use renderer::{render_colorbar, render_ppi, Colormap, PolarSweep};

use crate::config::ProductConfig;
use crate::geolocate::GeolocatedSweep;
use crate::volume::RadarVolume;

/// Produces PNG artifacts for geolocated sweeps.
pub trait SweepRenderer: Send + Sync {
    /// PNG image of one sweep's `product.field`.
    fn render_sweep(
        &self,
        volume: &RadarVolume,
        sweep: &GeolocatedSweep,
        product: &ProductConfig,
    ) -> RadarResult<Vec<u8>>;

    /// PNG colourbar for the product's value range.
    fn render_colorbar(&self, product: &ProductConfig) -> RadarResult<Vec<u8>>;
}

fn default_image_size() -> usize {
    1024
}

fn default_colorbar_width() -> usize {
    48
}

fn default_colorbar_height() -> usize {
    512
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "default_image_size")]
    pub width: usize,
    #[serde(default = "default_image_size")]
    pub height: usize,
    #[serde(default = "default_colorbar_width")]
    pub colorbar_width: usize,
    #[serde(default = "default_colorbar_height")]
    pub colorbar_height: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: default_image_size(),
            height: default_image_size(),
            colorbar_width: default_colorbar_width(),
            colorbar_height: default_colorbar_height(),
        }
    }
}

impl RenderSettings {
    /// Reject zero-sized images.
    pub fn validate(&self) -> RadarResult<()> {
        let sizes = [
            ("width", self.width),
            ("height", self.height),
            ("colorbar_width", self.colorbar_width),
            ("colorbar_height", self.colorbar_height),
        ];
        match sizes.iter().find(|(_, size)| *size == 0) {
            Some((name, _)) => Err(RadarError::Config(format!("render {} must be at least 1", name))),
            None => Ok(()),
        }
    }
}

/// Plan-position-indicator renderer with transparent missing gates.
#[derive(Debug, Clone, Default)]
pub struct PpiRenderer {
    settings: RenderSettings,
}

impl PpiRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}

impl SweepRenderer for PpiRenderer {
    fn render_sweep(
        &self,
        volume: &RadarVolume,
        sweep: &GeolocatedSweep,
        product: &ProductConfig,
    ) -> RadarResult<Vec<u8>> {
        let rays = volume.sweep_rays(sweep.sweep)?;
        let values = volume.sweep_field(&product.field, sweep.sweep)?;
        let polar = PolarSweep {
            azimuths: &volume.azimuth[rays.clone()],
            elevations: &volume.elevation[rays],
            ranges: &volume.range,
            values: &values,
        };

        let colormap = Colormap::for_field(&product.field, product.vmin, product.vmax);
        let (width, height) = (self.settings.width, self.settings.height);
        let pixels = render_ppi(&polar, &sweep.extent, width, height, &colormap)?;

        debug!(
            sweep = sweep.sweep,
            file_index = sweep.record.file_index,
            width,
            height,
            "Rendered sweep"
        );
        encode_overlay(&pixels, width, height)
    }

    fn render_colorbar(&self, product: &ProductConfig) -> RadarResult<Vec<u8>> {
        let colormap = Colormap::for_field(&product.field, product.vmin, product.vmax);
        let (width, height) = (self.settings.colorbar_width, self.settings.colorbar_height);
        if width == 0 || height == 0 {
            return Err(RadarError::Render(format!(
                "invalid colorbar size {}x{}",
                width, height
            )));
        }
        let pixels = render_colorbar(&colormap, width, height);
        encode_overlay(&pixels, width, height)
    }
}
