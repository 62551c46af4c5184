use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ini_dict::{ini, Dictionary};
use std::time::Duration;

// Configuration-shaped workload: a GRID x GRID matrix of composite
// section:key entries, the way a large INI file populates a dictionary.
const GRID: usize = 64;

fn grid_keys() -> Vec<String> {
    let mut keys = Vec::with_capacity(GRID * GRID);
    for i in 0..GRID {
        for j in 0..GRID {
            keys.push(format!("sec{i:08x}:key{j:08x}"));
        }
    }
    keys
}

fn populated() -> Dictionary {
    let mut d = Dictionary::new();
    for i in 0..GRID {
        d.set(&format!("sec{i:08x}"), Some("1")).unwrap();
    }
    for k in grid_keys() {
        d.set(&k, Some("1")).unwrap();
    }
    d
}

fn bench_set_grid(c: &mut Criterion) {
    c.bench_function("dict_set_grid_64x64", |b| {
        let keys = grid_keys();
        b.iter_batched(
            Dictionary::new,
            |mut d| {
                for k in &keys {
                    d.set(k, Some("1")).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("dict_get_hit", |b| {
        let d = populated();
        let keys = grid_keys();
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(d.get_text(k));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("dict_get_miss", |b| {
        let d = populated();
        let mut n = 0u64;
        b.iter(|| {
            n = n.wrapping_add(1);
            let k = format!("absent{n:016x}");
            black_box(d.get_text(&k));
        })
    });
}

fn bench_churn(c: &mut Criterion) {
    c.bench_function("dict_set_unset_churn", |b| {
        let mut d = Dictionary::new();
        let mut n = 0u64;
        b.iter(|| {
            n = n.wrapping_add(1);
            let k = format!("churn{n:016x}");
            d.set(&k, Some("1")).unwrap();
            d.unset(&k);
        })
    });
}

fn bench_dump_ini(c: &mut Criterion) {
    c.bench_function("ini_dump", |b| {
        let d = populated();
        b.iter(|| {
            let mut out = Vec::with_capacity(1 << 20);
            ini::dump_ini(&d, &mut out).unwrap();
            black_box(out)
        })
    });
}

fn bench_read(c: &mut Criterion) {
    c.bench_function("ini_read", |b| {
        let mut text = Vec::new();
        ini::dump_ini(&populated(), &mut text).unwrap();
        b.iter(|| {
            let dict = ini::read(std::io::Cursor::new(text.as_slice()), "bench.ini").unwrap();
            black_box(dict)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_set_grid, bench_get_hit, bench_get_miss, bench_churn, bench_dump_ini, bench_read
}
criterion_main!(benches);
