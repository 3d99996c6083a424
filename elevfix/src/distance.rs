//! Along-track distance.
//!
//! Uses the equirectangular approximation, which is accurate for the
//! short hops between consecutive GPS fixes. It is not great-circle
//! distance.

use crate::{Coordinate, C};
use itertools::Itertools;

/// Mean radius of Earth in meters.
pub const EARTH_RADIUS: C = 6_371_000.0;

/// Returns the distance in meters between two coordinates.
pub fn distance(from: Coordinate, to: Coordinate) -> C {
    let (lon1, lat1) = (from.x.to_radians(), from.y.to_radians());
    let (lon2, lat2) = (to.x.to_radians(), to.y.to_radians());
    let x = (lon2 - lon1) * ((lat1 + lat2) / 2.0).cos();
    let y = lat2 - lat1;
    EARTH_RADIUS * (x * x + y * y).sqrt()
}

/// Returns, for each coordinate, the distance travelled from the
/// first one. The first element is always 0.
pub fn cumulative_distance(coords: &[Coordinate]) -> Vec<C> {
    if coords.is_empty() {
        return Vec::new();
    }
    std::iter::once(0.0)
        .chain(
            coords
                .iter()
                .tuple_windows()
                .scan(0.0, |total, (&a, &b)| {
                    *total += distance(a, b);
                    Some(*total)
                }),
        )
        .collect()
}
