// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector3;
use rand::Rng;
use shapekit::cluster::KMeans;
use shapekit::descriptor::{compute_descriptor_from_mesh, project, SphericalSampling, SphericalSignal};
use shapekit::io::{read_mesh, write_ply, write_stl};
use shapekit::mesh::shapes;
use shapekit::random::Mt19937;
use shapekit::raster::FillRule;
use shapekit::{rasterize, Encoding, RasterOptions};

fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");
    let sphere = shapes::uv_sphere(1.0, 64);

    for resolution in [16, 32, 64] {
        group.bench_with_input(BenchmarkId::new("solid", resolution), &resolution, |b, &resolution| {
            let options = RasterOptions::default().with_resolution(resolution);
            b.iter(|| rasterize(black_box(&sphere), &options).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("surface", resolution), &resolution, |b, &resolution| {
            let options = RasterOptions::default()
                .with_resolution(resolution)
                .with_fill(FillRule::Surface);
            b.iter(|| rasterize(black_box(&sphere), &options).unwrap());
        });
    }

    group.finish();
}

fn bench_descriptor(c: &mut Criterion) {
    let mut group = c.benchmark_group("descriptor");
    let mesh = shapes::ellipsoid(Vector3::new(2.0, 1.0, 0.5), 32, 64);

    for degree in [4, 8, 16] {
        group.bench_with_input(BenchmarkId::new("mesh", degree), &degree, |b, &degree| {
            b.iter(|| compute_descriptor_from_mesh(black_box(&mesh), degree).unwrap());
        });

        let sampling = SphericalSampling::for_degree(degree).unwrap();
        let signal = SphericalSignal::from_fn(sampling, |d| 1.0 + d.x * d.y - d.z * d.z);
        group.bench_with_input(BenchmarkId::new("project", degree), &degree, |b, &degree| {
            b.iter(|| project(black_box(&signal), degree).unwrap());
        });
    }

    group.finish();
}

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans");
    let mut rng = Mt19937::new(42);
    let points: Vec<Vec<f64>> = (0..10_000)
        .map(|_| (0..8).map(|_| rng.gen::<f64>()).collect())
        .collect();

    for k in [4, 16] {
        group.bench_with_input(BenchmarkId::new("10k_x8", k), &k, |b, &k| {
            b.iter(|| KMeans::new(k).fit(black_box(&points), &mut Mt19937::new(1)).unwrap());
        });
    }

    group.finish();
}

fn bench_io(c: &mut Criterion) {
    let mut group = c.benchmark_group("io");
    let mesh = shapes::uv_sphere(1.0, 128);

    let mut stl = Vec::new();
    write_stl(&mesh, &mut stl, Encoding::Binary).unwrap();
    let mut ply = Vec::new();
    write_ply(&mesh, &mut ply, Encoding::Binary).unwrap();

    group.bench_function("read_binary_stl", |b| b.iter(|| read_mesh(black_box(&stl)).unwrap()));
    group.bench_function("read_binary_ply", |b| b.iter(|| read_mesh(black_box(&ply)).unwrap()));
    group.bench_function("write_binary_stl", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(stl.len());
            write_stl(black_box(&mesh), &mut out, Encoding::Binary).unwrap();
            out
        })
    });

    group.finish();
}

criterion_group!(benches, bench_rasterize, bench_descriptor, bench_kmeans, bench_io);
criterion_main!(benches);
