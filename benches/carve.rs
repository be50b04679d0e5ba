// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use seamvert::{compute_energy, seamcarve, Buffer};

fn synthetic(width: usize, height: usize) -> Buffer<u8> {
    let data: Vec<u8> = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            ((x * 7 + y * 13) % 251) as u8
        })
        .collect();
    Buffer::from_host(&[width, height], data).unwrap()
}

fn bench_energy(c: &mut Criterion) {
    let image = synthetic(256, 256);
    c.bench_function("energy 256x256", |b| {
        b.iter(|| compute_energy(black_box(&image)).unwrap())
    });
}

fn bench_carve(c: &mut Criterion) {
    c.bench_function("carve 128x128 down to 96", |b| {
        b.iter(|| seamcarve(black_box(synthetic(128, 128)), 96).unwrap())
    });
}

criterion_group!(benches, bench_energy, bench_carve);
criterion_main!(benches);
