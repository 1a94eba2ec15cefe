//! Image rendering for radar sweep overlays.
//!
//! - Colour ramps for reflectivity, rain rate and echo classification
//! - PPI rasterization of a polar sweep onto a Cartesian extent
//! - Colourbar strips
//! - PNG encoding (indexed or RGBA)

pub mod colormap;
pub mod png;
pub mod ppi;

pub use colormap::{Color, Colormap};
pub use ppi::{render_colorbar, render_ppi, PolarSweep};
