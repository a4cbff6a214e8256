//! Benchmarks for the tailor pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};

use tailor::validation::HsvClassifier;
use tailor::{alpha_over, slice_image, FrameKey, SheetGrid, Validator};

const SKIN: Rgba<u8> = Rgba([210, 170, 150, 255]);

/// A full LPC sheet with every walk-row cell drawn and the rest empty.
fn walk_sheet() -> RgbaImage {
    let grid = SheetGrid::lpc();
    RgbaImage::from_fn(grid.sheet_width(), grid.sheet_height(), |x, y| {
        let row = y / grid.tile_size;
        if (7..=10).contains(&row) {
            Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn half_robe() -> RgbaImage {
    RgbaImage::from_fn(64, 64, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([40, 40, 58, 255])
        } else {
            Rgba([40, 40, 58, 96])
        }
    })
}

// -- Slicing benchmarks --

fn bench_slicing(c: &mut Criterion) {
    let mut group = c.benchmark_group("slicing");

    let grid = SheetGrid::lpc();
    let sheet = walk_sheet();
    let empty = RgbaImage::new(grid.sheet_width(), grid.sheet_height());

    group.bench_function("slice_lpc_walk_rows", |b| {
        b.iter(|| slice_image(black_box(&sheet), &grid))
    });

    group.bench_function("slice_lpc_empty", |b| {
        b.iter(|| slice_image(black_box(&empty), &grid))
    });

    group.finish();
}

// -- Compositing benchmarks --

fn bench_compositing(c: &mut Criterion) {
    let mut group = c.benchmark_group("compositing");

    let body = RgbaImage::from_pixel(64, 64, SKIN);
    let robe = half_robe();

    group.bench_function("alpha_over_frame", |b| {
        b.iter(|| {
            let mut canvas = body.clone();
            alpha_over(&mut canvas, black_box(&robe));
            canvas
        })
    });

    group.finish();
}

// -- Validation benchmarks --

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    let key = FrameKey::new(8, 0);
    let skin = RgbaImage::from_pixel(64, 64, SKIN);
    let robe = half_robe();
    let tones = Validator::default();
    let hsv = Validator::default().with_classifier(HsvClassifier::default());

    group.bench_function("leak_tone_ranges", |b| {
        b.iter(|| tones.check_leaks(black_box(&skin), key))
    });

    group.bench_function("leak_hsv", |b| {
        b.iter(|| hsv.check_leaks(black_box(&skin), key))
    });

    group.bench_function("thinness_ratio", |b| {
        b.iter(|| tones.check_thinness(black_box(&robe), key))
    });

    group.finish();
}

criterion_group!(benches, bench_slicing, bench_compositing, bench_validation);
criterion_main!(benches);
