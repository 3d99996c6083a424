use anyhow::{bail, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use elevfix::{
    drop_stationary, elevation_gain, geo::coord, Coordinate, DemTile, ElevationResolver,
    ResolverConfig, Smoothing, DEFAULT_GAIN_THRESHOLD,
};
use log::{debug, info};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
};

/// An SRTM tile and GPS track elevation multitool.
#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: SubCmd,
}

#[derive(Clone, Debug, Subcommand)]
enum SubCmd {
    /// Convert an Esri ASCII '.asc' tile to the binary tile format.
    Convert(ConvertArgs),
    /// Print a tile's header and elevation range.
    Info(InfoArgs),
    /// Look up ground elevation for a list of points.
    Lookup(LookupArgs),
}

#[derive(Args, Clone, Debug)]
struct ConvertArgs {
    /// Source ASCII raster.
    src: Utf8PathBuf,

    /// Optional output file name.
    ///
    /// If not specified, a '.bin' file will be written with the
    /// tile's basename in the tile's dir.
    dest: Option<Utf8PathBuf>,
}

#[derive(Args, Clone, Debug)]
struct InfoArgs {
    /// Binary tile, or ASCII raster if the extension is 'asc'.
    tile: Utf8PathBuf,
}

#[derive(Args, Clone, Debug)]
struct LookupArgs {
    /// Directory of binary tiles.
    #[arg(long, env = "SRTMPATH")]
    storage: Utf8PathBuf,

    /// Skip smoothing and print raw tile elevations.
    #[arg(long)]
    raw: bool,

    /// Smoothing window, in points. Must be odd.
    #[arg(short, long, default_value_t = Smoothing::default().window)]
    window: usize,

    /// Degree of the smoothing polynomial.
    #[arg(short = 'g', long, default_value_t = Smoothing::default().degree)]
    degree: usize,

    /// Keep consecutive duplicate points.
    #[arg(long)]
    keep_stationary: bool,

    /// Print JSON instead of CSV.
    #[arg(long)]
    json: bool,

    /// File of 'lat,lon' lines. Reads stdin if not specified.
    points: Option<Utf8PathBuf>,
}

#[derive(Debug, Serialize)]
struct Row {
    lat: f64,
    lon: f64,
    distance: f64,
    altitude: Option<f64>,
}

fn convert(ConvertArgs { src, dest }: ConvertArgs) -> Result<()> {
    let tile = DemTile::load_asc(&src).with_context(|| format!("reading {src}"))?;
    let out = dest.map_or_else(
        || {
            let mut out = src.clone();
            out.set_extension("bin");
            Ok(out)
        },
        |mut out| {
            if out.is_dir() {
                let name = src
                    .file_name()
                    .with_context(|| format!("{src} has no file name"))?;
                out.push(name);
                out.set_extension("bin");
            }
            Ok::<_, anyhow::Error>(out)
        },
    )?;

    info!("writing to {out}");
    tile.save(&out).with_context(|| format!("writing {out}"))?;
    Ok(())
}

fn load_tile(path: &Utf8Path) -> Result<DemTile> {
    let tile = match path.extension() {
        Some("asc") => DemTile::load_asc(path),
        _ => DemTile::load(path),
    };
    tile.with_context(|| format!("reading {path}"))
}

fn print_info(InfoArgs { tile: path }: InfoArgs) -> Result<()> {
    let tile = load_tile(&path)?;
    let header = tile.header();
    let extent = tile.extent();
    let (min, max) = (tile.min_elevation(), tile.max_elevation());
    println!("file:      {path}");
    println!("size:      {} x {}", header.n_cols, header.n_rows);
    println!("cell size: {}", header.cell_size);
    println!("sw center: {}, {}", header.y_center_ll, header.x_center_ll);
    println!(
        "extent:    lat [{}, {}] lon [{}, {}]",
        extent.min().y,
        extent.max().y,
        extent.min().x,
        extent.max().x
    );
    println!("nodata:    {}", header.nodata);
    match min.zip(max) {
        Some((min, max)) => println!("elevation: [{min}, {max}]"),
        None => println!("elevation: no data"),
    }
    Ok(())
}

/// Parses 'lat,lon' or 'lat lon' lines, ignoring blanks and '#' comments.
fn read_points<R: BufRead>(src: R) -> Result<Vec<Coordinate>> {
    let mut coords = Vec::new();
    for (lineno, line) in src.lines().enumerate() {
        let line = line?;
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        let [lat, lon] = fields[..] else {
            bail!("line {}: expected 'lat,lon', got {line:?}", lineno + 1);
        };
        let lat: f64 = lat
            .parse()
            .with_context(|| format!("line {}: bad latitude {lat:?}", lineno + 1))?;
        let lon: f64 = lon
            .parse()
            .with_context(|| format!("line {}: bad longitude {lon:?}", lineno + 1))?;
        coords.push(coord! { x: lon, y: lat });
    }
    Ok(coords)
}

fn lookup(args: LookupArgs) -> Result<()> {
    let LookupArgs {
        storage,
        raw,
        window,
        degree,
        keep_stationary,
        json,
        points,
    } = args;

    let config = ResolverConfig::new(storage)?;
    let resolver = ElevationResolver::new(config);

    let mut coords = match &points {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {path}"))?;
            read_points(BufReader::new(file))?
        }
        None => read_points(io::stdin().lock())?,
    };
    if !keep_stationary {
        let before = coords.len();
        coords = drop_stationary(&coords);
        debug!("dropped {} stationary points", before - coords.len());
    }

    let smoothing = (!raw).then_some(Smoothing { window, degree });
    let profile = resolver.profile(&coords, smoothing)?;

    let altitudes: Vec<f64> = profile.iter().filter_map(|s| s.altitude).collect();
    info!(
        "elevation gain: {:.1} m",
        elevation_gain(&altitudes, DEFAULT_GAIN_THRESHOLD)
    );

    let rows = coords.iter().zip(&profile).map(|(coord, sample)| Row {
        lat: coord.y,
        lon: coord.x,
        distance: sample.distance_from_start,
        altitude: sample.altitude,
    });

    let mut out = BufWriter::new(io::stdout().lock());
    if json {
        serde_json::to_writer_pretty(&mut out, &rows.collect::<Vec<_>>())?;
        writeln!(out)?;
    } else {
        writeln!(out, "lat,lon,distance,altitude")?;
        for Row {
            lat,
            lon,
            distance,
            altitude,
        } in rows
        {
            let altitude = altitude.map(|a| format!("{a:.2}")).unwrap_or_default();
            writeln!(out, "{lat},{lon},{distance:.2},{altitude}")?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        SubCmd::Convert(args) => convert(args),
        SubCmd::Info(args) => print_info(args),
        SubCmd::Lookup(args) => lookup(args),
    }
}
