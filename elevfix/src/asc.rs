//! Esri ASCII raster (`.asc`) reader, the distribution format of the
//! SRTM tiles.
//!
//! ```text
//! ncols        6000
//! nrows        6000
//! xllcorner    -5.0004166
//! yllcorner    39.9995833
//! cellsize     0.00083333
//! NODATA_value -9999
//! 123 124 125 ...
//! ```
//!
//! The header gives the outer corner of the SW cell; [`DemTile`]s
//! store the center, half a cell further in.

use crate::{DemHeader, DemTile, Elev, ElevfixError, Result, C};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

/// Header keys, in the order they must appear.
const HEADER_KEYS: [&str; 6] = [
    "ncols",
    "nrows",
    "xllcorner",
    "yllcorner",
    "cellsize",
    "NODATA_value",
];

/// Parses an ASCII raster into a tile.
pub fn parse_asc<R: BufRead>(src: R) -> Result<DemTile> {
    let mut lines = src.lines();

    let mut values = [""; 6].map(String::from);
    for (key, value) in HEADER_KEYS.iter().zip(values.iter_mut()) {
        let line = lines
            .next()
            .ok_or_else(|| format_err(format!("missing {key} header")))??;
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(found), Some(v), None) if found == *key => *value = v.to_owned(),
            (Some(found), _, _) if found != *key => {
                return Err(format_err(format!("unexpected header {found}, expected {key}")))
            }
            _ => return Err(format_err(format!("malformed {key} header: {line:?}"))),
        }
    }
    let [ncols, nrows, xllcorner, yllcorner, cellsize, nodata] = values;

    let n_cols: u32 = parse_token("ncols", &ncols)?;
    let n_rows: u32 = parse_token("nrows", &nrows)?;
    let xllcorner: C = parse_token("xllcorner", &xllcorner)?;
    let yllcorner: C = parse_token("yllcorner", &yllcorner)?;
    let cell_size: C = parse_token("cellsize", &cellsize)?;
    let nodata: i32 = parse_token("NODATA_value", &nodata)?;

    let header = DemHeader {
        n_cols,
        n_rows,
        x_center_ll: xllcorner + cell_size / 2.0,
        y_center_ll: yllcorner + cell_size / 2.0,
        cell_size,
        nodata,
    };

    let mut rows = Vec::with_capacity((n_rows as usize).min(1 << 16));
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|token| parse_token::<Elev>("sample", token))
            .collect::<Result<Vec<_>>>()?;
        if row.len() != n_cols as usize {
            return Err(format_err(format!(
                "row {} has {} values, ncols is {n_cols}",
                rows.len(),
                row.len()
            )));
        }
        rows.push(row);
    }
    if rows.len() != n_rows as usize {
        return Err(format_err(format!(
            "{} rows, nrows is {n_rows}",
            rows.len()
        )));
    }

    DemTile::from_rows(header, rows)
}

impl DemTile {
    /// Returns a tile parsed from the ASCII raster at `path`.
    pub fn load_asc<P: AsRef<Path>>(path: P) -> Result<Self> {
        parse_asc(BufReader::new(File::open(path)?))
    }
}

fn parse_token<T: FromStr>(name: &str, token: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| format_err(format!("invalid {name} {token:?}")))
}

fn format_err(msg: String) -> ElevfixError {
    ElevfixError::AscFormat(msg)
}

#[cfg(test)]
mod tests {
    use super::parse_asc;
    use crate::{asc_fixture_dir, DemTile, ElevfixError};
    use approx::assert_relative_eq;

    const SMALL: &str = "ncols 3
nrows 2
xllcorner -5.0
yllcorner 40.0
cellsize 0.5
NODATA_value -9999
10 20 30
-9999 50 60
";

    fn parse(src: &str) -> crate::Result<DemTile> {
        parse_asc(src.as_bytes())
    }

    #[test]
    fn test_parse() {
        let tile = parse(SMALL).unwrap();
        let header = tile.header();
        assert_eq!((header.n_cols, header.n_rows), (3, 2));
        assert_relative_eq!(header.x_center_ll, -4.75);
        assert_relative_eq!(header.y_center_ll, 40.25);
        assert_relative_eq!(header.cell_size, 0.5);
        assert_eq!(header.nodata, -9999);
        assert_eq!(tile.get((0, 0)), Some(10));
        assert_eq!(tile.get((0, 1)), Some(-9999));
        assert_eq!(tile.get((2, 1)), Some(60));
    }

    #[test]
    fn test_parse_ignores_blank_lines() {
        let src = format!("{SMALL}\n\n");
        assert!(parse(&src).is_ok());
    }

    #[test]
    fn test_unexpected_header() {
        let src = SMALL.replace("cellsize", "dx");
        let err = parse(&src).unwrap_err();
        assert!(matches!(err, ElevfixError::AscFormat(_)));
        assert!(err.to_string().contains("dx"), "{err}");

        // Keys are positional.
        let src = SMALL.replace("ncols 3\nnrows 2", "nrows 2\nncols 3");
        assert!(matches!(parse(&src), Err(ElevfixError::AscFormat(_))));
    }

    #[test]
    fn test_bad_values() {
        for src in [
            SMALL.replace("ncols 3", "ncols three"),
            SMALL.replace("NODATA_value -9999", "NODATA_value"),
            SMALL.replace("10 20 30", "10 20 x"),
            SMALL.replace("10 20 30", "10 20 40000"),
        ] {
            assert!(
                matches!(parse(&src), Err(ElevfixError::AscFormat(_))),
                "{src}"
            );
        }
    }

    #[test]
    fn test_row_shape() {
        let short_row = SMALL.replace("10 20 30", "10 20");
        assert!(matches!(parse(&short_row), Err(ElevfixError::AscFormat(_))));

        let extra_row = format!("{SMALL}1 2 3\n");
        assert!(matches!(parse(&extra_row), Err(ElevfixError::AscFormat(_))));

        let missing_row = SMALL.replace("-9999 50 60\n", "");
        assert!(matches!(parse(&missing_row), Err(ElevfixError::AscFormat(_))));

        assert!(matches!(parse("ncols 3\n"), Err(ElevfixError::AscFormat(_))));
    }

    #[test]
    fn test_fixture_round_trip() {
        let mut path = asc_fixture_dir();
        path.push("srtm_36_04_clip.asc");
        let tile = DemTile::load_asc(&path).unwrap();
        assert_eq!(tile.dimensions(), (6, 5));
        assert_eq!(tile.header().nodata, -9999);

        let decoded = DemTile::decode(&tile.to_bytes()).unwrap();
        assert_eq!(decoded, tile);
        assert_eq!(
            decoded.iter().map(|s| s.elevation()).collect::<Vec<_>>(),
            tile.iter().map(|s| s.elevation()).collect::<Vec<_>>()
        );
        assert_relative_eq!(decoded.header().x_center_ll, -3.0 + 0.05 / 2.0);
        assert_relative_eq!(decoded.header().y_center_ll, 43.0 + 0.05 / 2.0);
    }
}
