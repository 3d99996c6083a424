//! Global 5°×5° tiling of the SRTM product.
//!
//! Columns count eastward from the antimeridian starting at 1, rows
//! count southward from the 60°N band starting at 1. Only latitudes in
//! `[-60, 60)` are served.

use crate::{Coordinate, C};
use geo::{coord, BoundingRect, LineString, Rect};
use itertools::iproduct;
use std::fmt;

const TILE_DEG: C = 5.0;
const MIN_LAT: C = -60.0;
const MAX_LAT: C = 60.0;
const MIN_LON: C = -180.0;
const MAX_LON: C = 180.0;

/// Number of tile rows between 60°S and 60°N.
pub const ROWS: u32 = 24;

/// Number of tile columns around the globe.
pub const COLS: u32 = 72;

/// Identifies one tile of the global grid.
///
/// Ordering is row-major (north to south, then west to east) and is
/// the order in which tiles claim coordinates during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId {
    pub row: u32,
    pub col: u32,
}

impl TileId {
    /// File name of this tile in a storage directory, e.g.
    /// `srtm_36_04.bin`.
    pub fn filename(&self, extension: &str) -> String {
        format!("{self}.{extension}")
    }

    /// Nominal geographic extent of this tile.
    pub fn extent(&self) -> Rect<C> {
        let west = MIN_LON + C::from(self.col - 1) * TILE_DEG;
        let north = MAX_LAT - C::from(self.row - 1) * TILE_DEG;
        Rect::new(
            coord! { x: west, y: north - TILE_DEG },
            coord! { x: west + TILE_DEG, y: north },
        )
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "srtm_{:02}_{:02}", self.col, self.row)
    }
}

/// Returns the tile containing `coord`, or `None` if the coordinate
/// is outside the area served by the product.
pub fn tile_for(coord: Coordinate) -> Option<TileId> {
    if !(MIN_LAT..MAX_LAT).contains(&coord.y) || !(MIN_LON..MAX_LON).contains(&coord.x) {
        return None;
    }
    Some(TileId {
        row: row_index(coord.y),
        col: col_index(coord.x),
    })
}

/// Returns every tile intersecting `bbox`, sorted.
///
/// Only the two extreme corners are located; rows and columns are
/// monotonic in latitude and longitude so the rectangle between them
/// is complete. Parts of `bbox` outside the served area are ignored.
pub fn tiles_covering(bbox: Rect<C>) -> Vec<TileId> {
    let (min, max) = (bbox.min(), bbox.max());
    let finite = [min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite());
    if !finite || max.y < MIN_LAT || min.y >= MAX_LAT || max.x < MIN_LON || min.x >= MAX_LON {
        return Vec::new();
    }

    // Top-left is (lat_max, lon_min), bottom-right is (lat_min, lon_max).
    let rows = row_index(max.y)..=row_index(min.y);
    let cols = col_index(min.x)..=col_index(max.x);
    iproduct!(rows, cols)
        .map(|(row, col)| TileId { row, col })
        .collect()
}

/// Returns the smallest rectangle containing all finite `coords`.
///
/// Coordinates with a NaN or infinite component are skipped; `None` if
/// none remain.
pub fn bounding_box(coords: &[Coordinate]) -> Option<Rect<C>> {
    let finite: Vec<Coordinate> = coords
        .iter()
        .copied()
        .filter(|c| c.x.is_finite() && c.y.is_finite())
        .collect();
    LineString::from(finite).bounding_rect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn col_index(lon: C) -> u32 {
    let band = ((lon - MIN_LON) / TILE_DEG)
        .floor()
        .clamp(0.0, C::from(COLS - 1));
    band as u32 + 1
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn row_index(lat: C) -> u32 {
    // Rounding can push latitudes just below 60° into a 25th band.
    let band = ((lat - MIN_LAT) / TILE_DEG)
        .floor()
        .clamp(0.0, C::from(ROWS - 1));
    ROWS - (band as u32 + 1) + 1
}
