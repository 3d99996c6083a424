//! Continuous elevation from discrete tile samples.
//!
//! The query is snapped to its nearest cell (the anchor), one
//! horizontal and one vertical neighbour are picked on the side the
//! query leans towards, and the plane through those three cell
//! centers is evaluated at the query. The result is exact at the
//! anchor and linear inside the triangle. This is not bilinear
//! interpolation.

use crate::{DemTile, C};
use geo::Coord;

/// A point in (longitude, latitude, value) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub x: C,
    pub y: C,
    pub z: C,
}

/// The plane through three points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Plane normal `(A, B, C)`.
    normal: [C; 3],
    /// First of the defining points.
    anchor: Point3D,
}

impl Plane {
    /// Returns the plane through `p1`, `p2` and `p3`, or `None` if it
    /// is vertical, i.e. the points are colinear when seen from above.
    pub fn through(p1: Point3D, p2: Point3D, p3: Point3D) -> Option<Self> {
        let v1 = [p2.x - p1.x, p2.y - p1.y, p2.z - p1.z];
        let v2 = [p3.x - p1.x, p3.y - p1.y, p3.z - p1.z];
        let normal = [
            v1[1] * v2[2] - v1[2] * v2[1],
            v1[2] * v2[0] - v1[0] * v2[2],
            v1[0] * v2[1] - v1[1] * v2[0],
        ];
        if normal[2] == 0.0 || !normal[2].is_finite() {
            return None;
        }
        Some(Self {
            normal,
            anchor: p1,
        })
    }

    /// Returns the normal `(A, B, C)`.
    pub fn normal(&self) -> [C; 3] {
        self.normal
    }

    /// Returns `D` in `A·x + B·y + C·z + D = 0`.
    pub fn offset(&self) -> C {
        let [a, b, c] = self.normal;
        -(a * self.anchor.x + b * self.anchor.y + c * self.anchor.z)
    }

    /// Returns `z` on the plane above `(x, y)`.
    ///
    /// Evaluated relative to the anchor so the anchor's own `z` comes
    /// back bit for bit.
    pub fn z_at(&self, x: C, y: C) -> C {
        let [a, b, c] = self.normal;
        self.anchor.z - (a * (x - self.anchor.x) + b * (y - self.anchor.y)) / c
    }
}

impl DemTile {
    /// Returns the interpolated elevation at `coord`, or `None` if this
    /// tile does not cover it.
    ///
    /// Coverage includes the outer half cell around the edge samples.
    /// A tile with fewer than two columns or rows has no neighbor to
    /// fit a plane through and covers nothing.
    ///
    /// The plane is evaluated as `z0 - (A(x - x0) + B(y - y0)) / C`
    /// around the nearest cell `(x0, y0, z0)` rather than as
    /// `-(Ax + By + D) / C`. Both describe the same plane, but only the
    /// first returns a cell's own sample exactly at its center.
    pub fn elevation_at(&self, coord: Coord<C>) -> Option<C> {
        let (n_cols, n_rows) = self.dimensions();
        if n_cols < 2 || n_rows < 2 {
            return None;
        }

        let extent = self.extent();
        if !(extent.min().x..=extent.max().x).contains(&coord.x)
            || !(extent.min().y..=extent.max().y).contains(&coord.y)
        {
            return None;
        }

        let header = self.header();
        let x_f = (coord.x - header.x_center_ll) / header.cell_size;
        let yl_f = (coord.y - header.y_center_ll) / header.cell_size;
        #[allow(clippy::cast_precision_loss)]
        let y_f = (n_rows - 1) as C - yl_f;

        let x0 = anchor_index(x_f, n_cols);
        let y0 = anchor_index(y_f, n_rows);
        let x1 = neighbor_index(x_f, x0, n_cols);
        let y1 = neighbor_index(y_f, y0, n_rows);

        let point = |xy: (usize, usize)| {
            let center = self.cell_center(xy);
            Point3D {
                x: center.x,
                y: center.y,
                z: C::from(self.get_unchecked(xy)),
            }
        };

        let plane = Plane::through(point((x0, y0)), point((x1, y0)), point((x0, y1)))?;
        Some(plane.z_at(coord.x, coord.y))
    }
}

/// Nearest cell index, ties to even.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn anchor_index(f: C, len: usize) -> usize {
    // The outer half cell of an even-sized axis rounds one past the end.
    f.round_ties_even().clamp(0.0, (len - 1) as C) as usize
}

/// Adjacent index on the side of `f` opposite to the rounding,
/// reflected back inside at either end.
#[allow(clippy::cast_precision_loss)]
fn neighbor_index(f: C, anchor: usize, len: usize) -> usize {
    if f - (anchor as C) < 0.0 {
        if anchor > 0 {
            anchor - 1
        } else {
            anchor + 1
        }
    } else if anchor < len - 1 {
        anchor + 1
    } else {
        anchor - 1
    }
}

#[cfg(test)]
mod tests {
    use super::{anchor_index, neighbor_index, Plane, Point3D};
    use crate::{DemHeader, DemTile, Elev};
    use approx::assert_relative_eq;
    use geo::coord;

    fn tile(cell_size: f64, x_center_ll: f64, y_center_ll: f64, rows: Vec<Vec<Elev>>) -> DemTile {
        #[allow(clippy::cast_possible_truncation)]
        let header = DemHeader {
            n_cols: rows[0].len() as u32,
            n_rows: rows.len() as u32,
            x_center_ll,
            y_center_ll,
            cell_size,
            nodata: -32768,
        };
        DemTile::from_rows(header, rows).unwrap()
    }

    /// NW, NE, SW are 0 and SE is 100, unit cells centered on .5.
    fn corner_tile() -> DemTile {
        tile(1.0, 0.5, 0.5, vec![vec![0, 0], vec![0, 100]])
    }

    fn p(x: f64, y: f64, z: f64) -> Point3D {
        Point3D { x, y, z }
    }

    #[test]
    fn test_plane_through() {
        let plane = Plane::through(p(0.0, 0.0, 1.0), p(1.0, 0.0, 3.0), p(0.0, 1.0, 4.0)).unwrap();
        // z = 1 + 2x + 3y
        assert_relative_eq!(plane.z_at(0.5, 0.5), 3.5);
        assert_relative_eq!(plane.z_at(-1.0, 2.0), 5.0);
        let [a, b, c] = plane.normal();
        assert_relative_eq!(
            -(a * 2.0 + b * 2.0 + plane.offset()) / c,
            plane.z_at(2.0, 2.0)
        );
    }

    #[test]
    fn test_plane_through_colinear_points() {
        assert_eq!(
            Plane::through(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0), p(2.0, 2.0, 5.0)),
            None
        );
    }

    #[test]
    fn test_neighbor_selection() {
        assert_eq!(anchor_index(2.4, 5), 2);
        assert_eq!(neighbor_index(2.4, 2, 5), 3);
        assert_eq!(anchor_index(2.6, 5), 3);
        assert_eq!(neighbor_index(2.6, 3, 5), 2);
        // Reflected at the edges.
        assert_eq!(neighbor_index(-0.3, 0, 5), 1);
        assert_eq!(neighbor_index(4.3, 4, 5), 3);
        // Ties go to the even index.
        assert_eq!(anchor_index(2.5, 5), 2);
        assert_eq!(anchor_index(3.5, 5), 4);
        assert_eq!(anchor_index(-0.5, 5), 0);
        // Outer half cell of an even axis.
        assert_eq!(anchor_index(3.5, 4), 3);
    }

    #[test]
    fn test_flat_tile() {
        let flat = tile(0.1, 10.0, 20.0, vec![vec![100; 5]; 5]);
        for (x, y) in [
            (10.0, 20.0),
            (10.123, 20.377),
            (9.951, 19.951),
            (10.449, 20.449),
            (10.2, 20.0501),
        ] {
            assert_eq!(flat.elevation_at(coord! { x: x, y: y }), Some(100.0));
        }
        assert_eq!(flat.elevation_at(coord! { x: 10.2, y: 19.0 }), None);
        assert_eq!(flat.elevation_at(coord! { x: 10.46, y: 20.2 }), None);
        assert_eq!(flat.elevation_at(coord! { x: f64::NAN, y: 20.2 }), None);
    }

    #[test]
    fn test_exact_at_cell_centers() {
        let rows: Vec<Vec<Elev>> = (0..4)
            .map(|r| (0..6).map(|c| (r * 37 + c * c * 11 - 50) as Elev).collect())
            .collect();
        let tile = tile(1.0 / 1200.0, -2.999_583_333, 43.000_416_667, rows);
        for sample in tile.iter() {
            assert_eq!(
                tile.elevation_at(sample.geo()),
                Some(f64::from(sample.elevation()))
            );
        }
    }

    #[test]
    fn test_planar_surface_is_reproduced() {
        // z = 3·col - 2·row is a plane in (lon, lat).
        let rows: Vec<Vec<Elev>> = (0..5)
            .map(|r| (0..5).map(|c| (3 * c - 2 * r) as Elev).collect())
            .collect();
        let tile = tile(0.5, 1.25, 2.25, rows);
        for (x, y) in [(1.3, 2.3), (2.0, 3.1), (2.99, 4.49), (1.0, 2.0), (3.5, 4.5)] {
            let col = (x - 1.25) / 0.5;
            let row = 4.0 - (y - 2.25) / 0.5;
            let expected = 3.0 * col - 2.0 * row;
            assert_relative_eq!(
                tile.elevation_at(coord! { x: x, y: y }).unwrap(),
                expected,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_triangle_follows_query() {
        let tile = corner_tile();
        // Near SE: anchor SE, neighbours SW and NE.
        assert_relative_eq!(
            tile.elevation_at(coord! { x: 1.4, y: 0.6 }).unwrap(),
            80.0,
            epsilon = 1e-9
        );
        // Near NW every vertex of the triangle is 0, bilinear would give 1.
        assert_eq!(tile.elevation_at(coord! { x: 0.6, y: 1.4 }), Some(0.0));
    }

    #[test]
    fn test_edge_tie_break() {
        let tile = corner_tile();
        // Row position 0.5 rounds to the north row and the column
        // neighbour is reflected west.
        assert_relative_eq!(
            tile.elevation_at(coord! { x: 1.9, y: 1.0 }).unwrap(),
            50.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_single_row_tile_is_indeterminate() {
        let tile = tile(1.0, 0.5, 0.5, vec![vec![1, 2, 3]]);
        assert_eq!(tile.elevation_at(coord! { x: 1.0, y: 0.5 }), None);
    }
}
