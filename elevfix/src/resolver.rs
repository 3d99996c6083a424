//! Batch elevation resolution over a directory of tiles.

use crate::{
    bounding_box, cumulative_distance, tiles_covering, Coordinate, DemTile, ElevfixError, Result,
    SavitzkyGolay, TileId, TrackSample, C,
};
use geo::coord;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::{
    env,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Environment variable naming the tile directory.
pub const SRTMPATH_ENV: &str = "SRTMPATH";

const DEFAULT_EXTENSION: &str = "bin";

/// Savitzky-Golay parameters for the smoothing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Smoothing {
    /// Number of waypoints per fit, odd.
    pub window: usize,
    /// Degree of the fitted polynomial.
    pub degree: usize,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self {
            window: 151,
            degree: 2,
        }
    }
}

/// Where tiles live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    storage_root: PathBuf,
    extension: String,
}

impl ResolverConfig {
    /// Returns a config reading `.bin` tiles from `storage_root`, which
    /// must be an existing directory.
    pub fn new<P: Into<PathBuf>>(storage_root: P) -> Result<Self> {
        let storage_root = storage_root.into();
        if !storage_root.is_dir() {
            return Err(ElevfixError::Config(format!(
                "tile storage {} is not a directory",
                storage_root.display()
            )));
        }
        Ok(Self {
            storage_root,
            extension: DEFAULT_EXTENSION.to_owned(),
        })
    }

    /// Returns a config for the directory named by `$SRTMPATH`.
    pub fn from_env() -> Result<Self> {
        match env::var_os(SRTMPATH_ENV) {
            None => Err(ElevfixError::Config(format!(
                "environment variable {SRTMPATH_ENV} must be set"
            ))),
            Some(root) if root.is_empty() => Err(ElevfixError::Config(format!(
                "environment variable {SRTMPATH_ENV} is empty"
            ))),
            Some(root) => Self::new(root),
        }
    }

    /// Overrides the tile file extension.
    #[must_use]
    pub fn with_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the path where `tile` is expected.
    pub fn tile_path(&self, tile: TileId) -> PathBuf {
        self.storage_root.join(tile.filename(&self.extension))
    }
}

/// Resolves ground elevation for batches of coordinates.
///
/// Tiles are loaded for the duration of one call and dropped before it
/// returns.
#[derive(Debug, Clone)]
pub struct ElevationResolver {
    config: ResolverConfig,
}

impl ElevationResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns the ground elevation of every coordinate, in order.
    ///
    /// Coordinates no tile covers are `None`. Where tiles overlap, the
    /// lowest [`TileId`] wins. With `smoothing` every coordinate must
    /// resolve, and the elevations are smoothed along the track in the
    /// order given.
    pub fn resolve(
        &self,
        coords: &[Coordinate],
        smoothing: Option<Smoothing>,
    ) -> Result<Vec<Option<C>>> {
        if coords.is_empty() {
            return Ok(Vec::new());
        }
        let filter = smoothing.map(smoothing_filter).transpose()?;

        let altitudes = self.sample_tiles(coords)?;
        let resolved = altitudes.iter().filter(|alt| alt.is_some()).count();
        info!("resolved {resolved} of {} coordinates", coords.len());

        match filter {
            None => Ok(altitudes),
            Some(filter) => {
                let smoothed = smooth(coords, &altitudes, filter)?;
                Ok(smoothed.into_iter().map(Some).collect())
            }
        }
    }

    /// [`resolve`](Self::resolve) for parallel latitude and longitude
    /// sequences.
    pub fn resolve_lat_lon(
        &self,
        latitudes: &[C],
        longitudes: &[C],
        smoothing: Option<Smoothing>,
    ) -> Result<Vec<Option<C>>> {
        if latitudes.len() != longitudes.len() {
            return Err(ElevfixError::Config(format!(
                "{} latitudes but {} longitudes",
                latitudes.len(),
                longitudes.len()
            )));
        }
        let coords: Vec<Coordinate> = latitudes
            .iter()
            .zip(longitudes)
            .map(|(&lat, &lon)| coord! { x: lon, y: lat })
            .collect();
        self.resolve(&coords, smoothing)
    }

    /// Returns the elevation profile of a track: each coordinate's
    /// along-track distance and resolved elevation.
    pub fn profile(
        &self,
        coords: &[Coordinate],
        smoothing: Option<Smoothing>,
    ) -> Result<Vec<TrackSample>> {
        let altitudes = self.resolve(coords, smoothing)?;
        Ok(cumulative_distance(coords)
            .into_iter()
            .zip(altitudes)
            .map(|(distance_from_start, altitude)| TrackSample {
                distance_from_start,
                altitude,
            })
            .collect())
    }
}

/// Private API
impl ElevationResolver {
    /// Samples every covering tile, then merges the per-tile results in
    /// ascending tile order, first writer wins.
    fn sample_tiles(&self, coords: &[Coordinate]) -> Result<Vec<Option<C>>> {
        let mut altitudes = vec![None; coords.len()];
        let Some(bbox) = bounding_box(coords) else {
            return Ok(altitudes);
        };
        let tiles = tiles_covering(bbox);
        debug!("{} tiles cover {:?}", tiles.len(), bbox);

        let passes = tiles
            .par_iter()
            .map(|&tile| self.sample_tile(tile, coords))
            .collect::<Result<Vec<_>>>()?;

        for pass in passes.into_iter().flatten() {
            for (slot, candidate) in altitudes.iter_mut().zip(pass) {
                if slot.is_none() {
                    *slot = candidate;
                }
            }
        }
        Ok(altitudes)
    }

    /// Returns `None` if the tile file does not exist.
    fn sample_tile(&self, tile: TileId, coords: &[Coordinate]) -> Result<Option<Vec<Option<C>>>> {
        let path = self.config.tile_path(tile);
        let dem = match DemTile::load(&path) {
            Ok(dem) => dem,
            Err(ElevfixError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                warn!("{tile}: no tile at {}", path.display());
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let altitudes: Vec<Option<C>> = coords
            .iter()
            .map(|&coord| dem.elevation_at(coord))
            .collect();
        debug!(
            "{tile}: covers {} of {} coordinates",
            altitudes.iter().filter(|alt| alt.is_some()).count(),
            coords.len()
        );
        Ok(Some(altitudes))
    }
}

fn smoothing_filter(Smoothing { window, degree }: Smoothing) -> Result<SavitzkyGolay> {
    if window == 0 || window % 2 == 0 {
        return Err(ElevfixError::Config(format!(
            "smoothing window {window} must be a positive odd number"
        )));
    }
    SavitzkyGolay::new(window, degree)
}

fn smooth(coords: &[Coordinate], altitudes: &[Option<C>], filter: SavitzkyGolay) -> Result<Vec<C>> {
    let dense = altitudes
        .iter()
        .enumerate()
        .map(|(index, alt)| alt.ok_or(ElevfixError::UnresolvedAltitude { index }))
        .collect::<Result<Vec<C>>>()?;
    let positions = cumulative_distance(coords);
    filter.apply(&positions, &dense)
}
