//! Binary SRTM tile (`.bin`) format.
//!
//! Little-endian throughout. A fixed 48 byte header of six `f64`s
//!
//! | offset | field         |
//! |--------|---------------|
//! | 0      | `n_cols`      |
//! | 8      | `n_rows`      |
//! | 16     | `x_center_ll` |
//! | 24     | `y_center_ll` |
//! | 32     | `cell_size`   |
//! | 40     | `nodata`      |
//!
//! is followed by `n_rows * n_cols` `i16` samples in row-major order,
//! northernmost row first. Counts and the nodata flag are stored as
//! floats to keep the header fixed-width.

use crate::{Elev, ElevfixError, Result, Sample, C};
use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use geo::{coord, Coord, Rect};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    mem::size_of,
    path::Path,
};

/// Length in bytes of the fixed header.
pub const HEADER_LEN: usize = 6 * size_of::<f64>();

/// Raster metadata of a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemHeader {
    pub n_cols: u32,
    pub n_rows: u32,
    /// Longitude of the center of the SW most sample.
    pub x_center_ll: C,
    /// Latitude of the center of the SW most sample.
    pub y_center_ll: C,
    /// Degrees per sample, both axes.
    pub cell_size: C,
    pub nodata: i32,
}

impl DemHeader {
    /// Number of samples described by this header.
    pub fn len(&self) -> usize {
        self.n_cols as usize * self.n_rows as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the encoded tile in bytes, `None` if it overflows `u64`.
    pub fn encoded_len(&self) -> Option<u64> {
        u64::from(self.n_cols)
            .checked_mul(u64::from(self.n_rows))?
            .checked_mul(size_of::<Elev>() as u64)?
            .checked_add(HEADER_LEN as u64)
    }
}

/// One decoded tile.
#[derive(Debug, Clone, PartialEq)]
pub struct DemTile {
    header: DemHeader,

    /// Elevation samples, row-major, row 0 is the northernmost.
    samples: Box<[Elev]>,
}

impl DemTile {
    /// Returns a tile from a header and its rows, north to south.
    ///
    /// Fails unless there are exactly `n_rows` rows of `n_cols`
    /// samples each.
    pub fn from_rows(header: DemHeader, rows: Vec<Vec<Elev>>) -> Result<Self> {
        validate_header(&header)?;
        if rows.len() != header.n_rows as usize {
            return Err(ElevfixError::MalformedTile(format!(
                "expected {} rows, got {}",
                header.n_rows,
                rows.len()
            )));
        }
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != header.n_cols as usize)
        {
            return Err(ElevfixError::MalformedTile(format!(
                "row {idx} has {} samples, expected {}",
                row.len(),
                header.n_cols
            )));
        }
        let samples = rows.into_iter().flatten().collect();
        Ok(Self { header, samples })
    }

    /// Returns a tile read into memory from the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)?;
        Self::decode(&raw).map_err(|err| match err {
            ElevfixError::MalformedTile(reason) => {
                ElevfixError::MalformedTile(format!("{}: {reason}", path.display()))
            }
            other => other,
        })
    }

    /// Decodes a complete tile from `raw`.
    pub fn decode(mut raw: &[u8]) -> Result<Self> {
        let total_len = raw.len() as u64;
        if raw.len() < HEADER_LEN {
            return Err(ElevfixError::MalformedTile(format!(
                "{total_len} bytes is shorter than the header"
            )));
        }

        let mut fields = [0.0; 6];
        raw.read_f64_into::<LE>(&mut fields)?;
        let [n_cols, n_rows, x_center_ll, y_center_ll, cell_size, nodata] = fields;
        let header = DemHeader {
            n_cols: header_count("n_cols", n_cols)?,
            n_rows: header_count("n_rows", n_rows)?,
            x_center_ll,
            y_center_ll,
            cell_size,
            nodata: header_nodata(nodata)?,
        };
        validate_header(&header)?;

        let expected_len = header.encoded_len().ok_or_else(|| {
            ElevfixError::MalformedTile(format!(
                "{}x{} samples is too large",
                header.n_cols, header.n_rows
            ))
        })?;
        if expected_len != total_len {
            return Err(ElevfixError::MalformedTile(format!(
                "{total_len} bytes does not match {}x{} samples ({expected_len} bytes)",
                header.n_cols, header.n_rows
            )));
        }

        let mut samples = vec![0; header.len()];
        raw.read_i16_into::<LE>(&mut samples)?;

        Ok(Self {
            header,
            samples: samples.into_boxed_slice(),
        })
    }

    /// Writes this tile in the binary format.
    pub fn encode<W: Write>(&self, mut dst: W) -> Result<()> {
        let DemHeader {
            n_cols,
            n_rows,
            x_center_ll,
            y_center_ll,
            cell_size,
            nodata,
        } = self.header;
        for field in [
            C::from(n_cols),
            C::from(n_rows),
            x_center_ll,
            y_center_ll,
            cell_size,
            C::from(nodata),
        ] {
            dst.write_f64::<LE>(field)?;
        }
        for &sample in self.samples.iter() {
            dst.write_i16::<LE>(sample)?;
        }
        Ok(())
    }

    /// Returns this tile encoded in the binary format.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.header.encoded_len().unwrap_or(0) as usize);
        // Writing to a Vec can't fail.
        self.encode(&mut buf).ok();
        buf
    }

    /// Writes this tile to a file at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut dst = BufWriter::new(File::create(path)?);
        self.encode(&mut dst)?;
        dst.flush()?;
        Ok(())
    }

    pub fn header(&self) -> &DemHeader {
        &self.header
    }

    /// Returns this tile's (columns, rows) dimensions.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.header.n_cols as usize, self.header.n_rows as usize)
    }

    /// Returns the number of samples in this tile.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns the sample at (column, row), row 0 being the north edge.
    pub fn get(&self, (col, row): (usize, usize)) -> Option<Elev> {
        let (n_cols, n_rows) = self.dimensions();
        if col < n_cols && row < n_rows {
            Some(self.get_unchecked((col, row)))
        } else {
            None
        }
    }

    /// Returns the sample at (column, row).
    ///
    /// # Panics
    ///
    /// Panics if the location is out of bounds of tile.
    pub fn get_unchecked(&self, (col, row): (usize, usize)) -> Elev {
        self.samples[self.xy_to_linear(col, row)]
    }

    /// Returns the geographic center of the cell at (column, row).
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, (col, row): (usize, usize)) -> Coord<C> {
        let h = &self.header;
        coord! {
            x: h.x_center_ll + col as C * h.cell_size,
            y: h.y_center_ll + (h.n_rows as usize - 1 - row) as C * h.cell_size,
        }
    }

    /// Returns the area covered by this tile's cells, edges included.
    pub fn extent(&self) -> Rect<C> {
        let h = &self.header;
        let west = h.x_center_ll - h.cell_size / 2.0;
        let south = h.y_center_ll - h.cell_size / 2.0;
        Rect::new(
            coord! { x: west, y: south },
            coord! {
                x: west + C::from(h.n_cols) * h.cell_size,
                y: south + C::from(h.n_rows) * h.cell_size,
            },
        )
    }

    /// Returns true if `elev` is this tile's void marker.
    pub fn is_nodata(&self, elev: Elev) -> bool {
        i32::from(elev) == self.header.nodata
    }

    /// Returns an iterator over this tile's cells, north to south.
    pub fn iter(&self) -> impl Iterator<Item = Sample<'_>> + '_ {
        (0..self.len()).map(|index| Sample { tile: self, index })
    }

    /// Returns the lowest valid elevation sample in this tile.
    pub fn min_elevation(&self) -> Option<Elev> {
        self.valid_samples().min()
    }

    /// Returns the highest valid elevation sample in this tile.
    pub fn max_elevation(&self) -> Option<Elev> {
        self.valid_samples().max()
    }
}

/// Private API
impl DemTile {
    fn valid_samples(&self) -> impl Iterator<Item = Elev> + '_ {
        self.samples
            .iter()
            .copied()
            .filter(|&elev| !self.is_nodata(elev))
    }

    pub(crate) fn get_linear_unchecked(&self, index: usize) -> Elev {
        self.samples[index]
    }

    pub(crate) fn linear_to_xy(&self, index: usize) -> (usize, usize) {
        let n_cols = self.header.n_cols as usize;
        (index % n_cols, index / n_cols)
    }

    fn xy_to_linear(&self, col: usize, row: usize) -> usize {
        row * self.header.n_cols as usize + col
    }
}

fn validate_header(header: &DemHeader) -> Result<()> {
    if header.n_cols == 0 || header.n_rows == 0 {
        return Err(ElevfixError::MalformedTile(format!(
            "dimensions {}x{} must be positive",
            header.n_cols, header.n_rows
        )));
    }
    if !(header.cell_size.is_finite() && header.cell_size > 0.0) {
        return Err(ElevfixError::MalformedTile(format!(
            "cell size {} must be positive",
            header.cell_size
        )));
    }
    if !(header.x_center_ll.is_finite() && header.y_center_ll.is_finite()) {
        return Err(ElevfixError::MalformedTile(
            "lower-left center is not finite".to_string(),
        ));
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn header_count(name: &str, value: C) -> Result<u32> {
    if value.fract() != 0.0 || !(1.0..=C::from(u32::MAX)).contains(&value) {
        return Err(ElevfixError::MalformedTile(format!(
            "{name} {value} is not a positive integer"
        )));
    }
    Ok(value as u32)
}

#[allow(clippy::cast_possible_truncation)]
fn header_nodata(value: C) -> Result<i32> {
    if value.fract() != 0.0 || !(C::from(i32::MIN)..=C::from(i32::MAX)).contains(&value) {
        return Err(ElevfixError::MalformedTile(format!(
            "nodata {value} is not an integer"
        )));
    }
    Ok(value as i32)
}
