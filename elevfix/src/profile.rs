use crate::{distance, Coordinate, C};

/// Altitude changes smaller than this, in meters, are treated as
/// noise by [`elevation_gain`].
pub const DEFAULT_GAIN_THRESHOLD: C = 5.0;

/// One point of an elevation profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    /// Meters travelled from the first point of the track.
    pub distance_from_start: C,
    /// Ground elevation in meters, if any tile covers the point.
    pub altitude: Option<C>,
}

/// Removes every waypoint that lies at zero distance from the next
/// one. GPS devices log such duplicates while stopped.
pub fn drop_stationary(coords: &[Coordinate]) -> Vec<Coordinate> {
    let mut kept: Vec<Coordinate> = coords
        .windows(2)
        .filter(|pair| distance(pair[0], pair[1]) != 0.0)
        .map(|pair| pair[0])
        .collect();
    if let Some(&last) = coords.last() {
        kept.push(last);
    }
    kept
}

/// Returns the total ascent along `altitudes` in meters.
///
/// Each altitude is compared against the last accepted one; it is
/// accepted once it differs by at least `threshold`, and accepted rises
/// add to the gain.
pub fn elevation_gain(altitudes: &[C], threshold: C) -> C {
    let Some((&first, rest)) = altitudes.split_first() else {
        return 0.0;
    };
    let mut gain = 0.0;
    let mut reference = first;
    for &altitude in rest {
        let diff = altitude - reference;
        if diff.abs() >= threshold {
            reference = altitude;
            if diff > 0.0 {
                gain += diff;
            }
        }
    }
    gain
}
