//! Coordinate transformations for ground-based radar.
//!
//! Implements the geometry from scratch without external dependencies:
//! the 4/3 effective-earth beam model that places gates in radar-centered
//! Cartesian space, and the azimuthal-equidistant projection that maps
//! that space to longitude/latitude.

pub mod aeqd;
pub mod antenna;

pub use aeqd::AzimuthalEquidistant;
pub use antenna::{antenna_to_cartesian, GateGrid};
