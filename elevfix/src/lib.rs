// #![deny(missing_docs)]

//! Ground elevation lookup for GPS tracks.
//!
//! Replaces noisy GPS altitudes with elevations sampled from the
//! CGIAR-CSI SRTM 90m product, a global equal-angle grid split into
//! 5°×5° tiles, and optionally smooths the result along the track's
//! travel distance with a Savitzky-Golay filter that honours the
//! irregular spacing between waypoints.
//!
//! Coordinates are [`geo::Coord`]s with `x` holding the longitude and
//! `y` the latitude, both in degrees.
//!
//! # References
//!
//! 1. [CGIAR-CSI SRTM 90m DEM](https://srtm.csi.cgiar.org/srtmdata)
//! 1. [Esri ASCII raster format](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/esri-ascii-raster-format.htm)
//! 1. [Savitzky-Golay filter](https://en.wikipedia.org/wiki/Savitzky%E2%80%93Golay_filter)

mod asc;
mod dem;
mod distance;
mod error;
mod interp;
mod profile;
mod resolver;
mod sample;
mod savgol;
mod tile;

pub use crate::{
    asc::parse_asc,
    dem::{DemHeader, DemTile, HEADER_LEN},
    distance::{cumulative_distance, distance, EARTH_RADIUS},
    error::{ElevfixError, Result},
    interp::{Plane, Point3D},
    profile::{drop_stationary, elevation_gain, TrackSample, DEFAULT_GAIN_THRESHOLD},
    resolver::{ElevationResolver, ResolverConfig, Smoothing, SRTMPATH_ENV},
    sample::Sample,
    savgol::{savgol, SavitzkyGolay},
    tile::{bounding_box, tile_for, tiles_covering, TileId},
};
pub use geo;

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

/// Bit representation of elevation samples.
pub type Elev = i16;

/// A geographic position, `x` is longitude and `y` is latitude.
pub type Coordinate = geo::Coord<C>;

#[cfg(test)]
fn asc_fixture_dir() -> std::path::PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "..", "data", "asc"]
        .iter()
        .collect()
}
