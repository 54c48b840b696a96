use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridview::*;
use serde_json::json;

fn dataset(size: usize) -> Dataset {
    let rows: Vec<serde_json::Value> = (0..size)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("user_{}", (i * 7919) % size),
                "score": (i * 37) % 1000,
                "active": i % 3 == 0,
            })
        })
        .collect();
    Dataset::from_value(json!({
        "cols": {
            "id": {"type": "number", "unique": true},
            "name": {"type": "string"},
            "score": {"type": "number"},
            "active": {"type": "bool"},
        },
        "rows": rows,
    }))
    .unwrap()
}

fn loaded_grid(size: usize) -> Grid {
    let mut grid = Grid::new(TableOptions::default());
    grid.load_dataset(dataset(size), LoadOptions::default());
    grid
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_dataset");

    for size in [100, 1000, 10000].iter() {
        let data = dataset(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut grid = Grid::new(TableOptions::default());
                grid.load_dataset(black_box(data.clone()), LoadOptions::default());
            });
        });
    }
    group.finish();
}

fn bench_string_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_filter");

    for size in [100, 1000, 10000].iter() {
        let mut grid = loaded_grid(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                grid.set_filter("name", black_box("ser_1")).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_range_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_filter");

    for size in [100, 1000, 10000].iter() {
        let mut grid = loaded_grid(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                grid.set_filter("score", black_box(">=100 <900")).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for size in [100, 1000, 10000].iter() {
        let mut grid = loaded_grid(*size);
        group.bench_with_input(BenchmarkId::new("string", size), size, |b, _| {
            b.iter(|| grid.toggle_sort(black_box("name")).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("number", size), size, |b, _| {
            b.iter(|| grid.toggle_sort(black_box("score")).unwrap());
        });
    }
    group.finish();
}

fn bench_paginate(c: &mut Criterion) {
    let mut group = c.benchmark_group("current_view");

    for size in [1000, 10000].iter() {
        let mut grid = loaded_grid(*size);
        grid.set_page_size(PageSize::Rows(50));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                grid.set_page(black_box(3));
                grid.current_view()
            });
        });
    }
    group.finish();
}

fn bench_select_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_select_all");

    for size in [1000, 10000].iter() {
        let mut grid = loaded_grid(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                grid.toggle_select_all(true).unwrap();
                grid.toggle_select_all(false).unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_load,
    bench_string_filter,
    bench_range_filter,
    bench_sort,
    bench_paginate,
    bench_select_all
);
criterion_main!(benches);
