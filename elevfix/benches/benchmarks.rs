use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use elevfix::{geo::coord, savgol, Coordinate, DemHeader, DemTile, Elev};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const CELL: f64 = 1.0 / 1200.0;

/// A 600×600 tile of rolling synthetic terrain.
fn synthetic_tile() -> DemTile {
    let n = 600_u32;
    let header = DemHeader {
        n_cols: n,
        n_rows: n,
        x_center_ll: -3.0 + CELL / 2.0,
        y_center_ll: 43.0 + CELL / 2.0,
        cell_size: CELL,
        nodata: -9999,
    };
    let rows = (0..n)
        .map(|row| {
            (0..n)
                .map(|col| {
                    let (x, y) = (f64::from(col) / 40.0, f64::from(row) / 55.0);
                    (400.0 + 150.0 * x.sin() * y.cos()) as Elev
                })
                .collect()
        })
        .collect();
    DemTile::from_rows(header, rows).unwrap()
}

fn synthetic_track(len: usize) -> Vec<Coordinate> {
    (0..len)
        .map(|i| {
            let t = i as f64 / len as f64;
            coord! { x: -2.99 + 0.45 * t, y: 43.01 + 0.4 * t * t }
        })
        .collect()
}

fn elevation_at(c: &mut Criterion) {
    let tile = synthetic_tile();
    let track = synthetic_track(10_000);
    let mut group = c.benchmark_group("elevation_at");
    group.throughput(Throughput::Elements(track.len() as u64));
    group.bench_function("track", |b| {
        b.iter(|| {
            for &coord in &track {
                black_box(tile.elevation_at(black_box(coord)));
            }
        })
    });
    group.finish();
}

fn smoothing(c: &mut Criterion) {
    let positions: Vec<f64> = (0..5_000_u32).map(|i| f64::from(i) * 4.5).collect();
    let values: Vec<f64> = positions
        .iter()
        .enumerate()
        .map(|(i, x)| 300.0 + (x / 250.0).sin() * 40.0 + if i % 2 == 0 { 2.0 } else { -2.0 })
        .collect();
    let mut group = c.benchmark_group("savgol");
    group.throughput(Throughput::Elements(positions.len() as u64));
    for window in [11, 51, 151] {
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |b, &window| {
            b.iter(|| savgol(&positions, &values, window, 2).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, elevation_at, smoothing);
criterion_main!(benches);
