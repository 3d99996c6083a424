use crate::{DemTile, Elev, C};
use geo::Coord;

/// One cell of a [`DemTile`].
#[derive(Debug)]
pub struct Sample<'a> {
    /// The parent [`DemTile`] this cell belongs to.
    pub(crate) tile: &'a DemTile,
    /// Index into parent's elevation data corresponding to this cell.
    pub(crate) index: usize,
}

#[allow(clippy::must_use_candidate)]
impl<'a> Sample<'a> {
    /// Sample elevation in meters.
    #[inline]
    pub fn elevation(&self) -> Elev {
        self.tile.get_linear_unchecked(self.index)
    }

    /// True if this cell holds the tile's void marker.
    #[inline]
    pub fn is_nodata(&self) -> bool {
        self.tile.is_nodata(self.elevation())
    }

    /// This sample's offset in the source tile's memory.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// This sample's logical (column, row) location in source tile.
    ///
    /// Note that (0, 0) is the NW corner.
    #[inline]
    pub fn xy(&self) -> (usize, usize) {
        self.tile.linear_to_xy(self.index)
    }

    /// Geographic center of this cell.
    #[inline]
    pub fn geo(&self) -> Coord<C> {
        self.tile.cell_center(self.xy())
    }
}

impl<'a> std::cmp::PartialEq for Sample<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && std::ptr::eq(self.tile, other.tile)
    }
}

impl<'a> std::cmp::Eq for Sample<'a> {}
